//! File and directory operations on a live server

use sftp_util::TransferOutcome;
use sftp_util::error::ErrorKind;

use super::fixtures::SftpTestEnvironment;

#[tokio::test]
async fn test_password_login_and_disconnect() {
    skip_if_no_server!();

    let env = SftpTestEnvironment::new();
    let mut session = env.connected_session().await;
    assert!(session.is_connected());

    let cwd = session.working_directory().await.unwrap();
    assert!(cwd.is_some_and(|dir| dir.starts_with('/')));

    session.disconnect().await;
    session.disconnect().await;
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_wrong_password() {
    skip_if_no_server!();

    let env = SftpTestEnvironment::new();
    let mut session = sftp_util::SftpSession::with_config(env.config());
    let wrong = secrecy::SecretString::from("wrongpassword".to_string());

    let err = session
        .connect_to(&env.server.target(), &wrong)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_directory_workflow() {
    skip_if_no_server!();

    let env = SftpTestEnvironment::new();
    let mut session = env.connected_session().await;
    let home = session.working_directory().await.unwrap().unwrap();
    let scratch = format!("{}/{}", home.trim_end_matches('/'), env.remote_scratch());

    session.create_directory(&scratch).await.unwrap();
    session.change_dir(&scratch).await.unwrap();
    assert_eq!(
        session.working_directory().await.unwrap().as_deref(),
        Some(scratch.as_str())
    );
    assert!(session.list_files_in_dir(".").await.unwrap().is_empty());
    assert!(session.list_sub_dirs_in_dir(".").await.unwrap().is_empty());

    session.create_directory("child").await.unwrap();
    assert_eq!(
        session.list_sub_dirs_in_dir(&scratch).await.unwrap(),
        vec!["child"]
    );
    assert!(session.is_remote_directory("child").await.unwrap());
    assert!(!session.is_remote_directory("missing").await.unwrap());

    session.disconnect().await;
}

#[tokio::test]
async fn test_upload_and_download() {
    skip_if_no_server!();

    let env = SftpTestEnvironment::new();
    let mut session = env.connected_session().await;
    let home = session.working_directory().await.unwrap().unwrap();
    let scratch = format!("{}/{}", home.trim_end_matches('/'), env.remote_scratch());
    session.create_directory(&scratch).await.unwrap();
    session.change_dir(&scratch).await.unwrap();

    let local = env.work_dir.path().join("payload.bin");
    let content: Vec<u8> = (0..100_000u32).map(|i| (i % 253) as u8).collect();
    std::fs::write(&local, &content).unwrap();

    let sent = session.upload_file(&local, "payload.bin").await.unwrap();
    assert_eq!(sent, content.len() as u64);
    assert_eq!(
        session.list_files_in_dir(".").await.unwrap(),
        vec!["payload.bin"]
    );

    let copy = env.work_dir.path().join("copy.bin");
    let outcome = session.download_file("payload.bin", &copy).await.unwrap();
    assert_eq!(outcome.bytes(), content.len() as u64);
    assert_eq!(std::fs::read(&copy).unwrap(), content);

    let outcome = session
        .download_file_after_check("payload.bin", &copy)
        .await
        .unwrap();
    assert_eq!(outcome, TransferOutcome::Skipped);

    let missing = env.work_dir.path().join("missing.bin");
    let err = session
        .download_file("no-such-file.bin", &missing)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert!(!missing.exists());

    session.disconnect().await;
}
