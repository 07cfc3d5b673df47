//! Host key handling with an isolated known_hosts file

use sftp_util::error::ErrorKind;

use super::fixtures::SftpTestEnvironment;

#[tokio::test]
async fn test_unknown_host_is_learned() {
    skip_if_no_server!();

    let env = SftpTestEnvironment::new();
    assert!(!env.known_hosts_path.exists());

    let mut session = env.connected_session().await;
    session.disconnect().await;

    let content = std::fs::read_to_string(&env.known_hosts_path).unwrap();
    assert_eq!(content.lines().count(), 1);

    // Second connection verifies against the learned key
    let mut session = env.connected_session().await;
    session.disconnect().await;
    let content = std::fs::read_to_string(&env.known_hosts_path).unwrap();
    assert_eq!(content.lines().count(), 1);
}

#[tokio::test]
async fn test_changed_host_key_is_rejected() {
    skip_if_no_server!();

    let env = SftpTestEnvironment::new();
    let host_pattern = if env.server.port == 22 {
        env.server.host.clone()
    } else {
        format!("[{}]:{}", env.server.host, env.server.port)
    };
    // A key the server does not own
    std::fs::write(
        &env.known_hosts_path,
        format!(
            "{} ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIJdD7y3aLq454yWBdwLWbieU1ebz9/cu7/QEXn9OIeZJ\n",
            host_pattern
        ),
    )
    .unwrap();

    let mut session = sftp_util::SftpSession::with_config(env.config());
    let err = session
        .connect_to(&env.server.target(), &env.server.password())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::HostKey);
    assert!(!session.is_connected());
}
