//! Synchronous wrapper around [`crate::sftp::SftpSession`].
//!
//! Each call blocks the current thread until the remote round-trip
//! completes. The wrapper owns its own tokio runtime, so its operations must
//! not be called from inside another async runtime. Dropping it there is
//! allowed but skips the disconnect handshake.

use std::path::Path;

use secrecy::SecretString;
use tokio::runtime::{Builder, Runtime};

use crate::config::SessionConfig;
use crate::error::SftpError;
use crate::sftp::{
    self, ConnectTarget, Connector, ExistingFilePolicy, RemoteEntry, SshConnector, TransferOutcome,
};

/// Blocking SFTP session
pub struct SftpSession<C: Connector = SshConnector> {
    inner: sftp::SftpSession<C>,
    /// Only `None` once dropping has begun
    runtime: Option<Runtime>,
}

impl SftpSession<SshConnector> {
    pub fn new() -> Result<Self, SftpError> {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Result<Self, SftpError> {
        Self::with_connector(SshConnector, config)
    }
}

impl<C: Connector> SftpSession<C> {
    pub fn with_connector(connector: C, config: SessionConfig) -> Result<Self, SftpError> {
        // One worker keeps the SSH connection serviced (keepalives, window
        // updates) between calls.
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("sftp-util-io")
            .enable_all()
            .build()
            .map_err(|e| SftpError::Configuration(format!("Failed to start runtime: {}", e)))?;

        Ok(Self {
            inner: sftp::SftpSession::with_connector(connector, config),
            runtime: Some(runtime),
        })
    }

    fn parts(&mut self) -> Result<(&Runtime, &mut sftp::SftpSession<C>), SftpError> {
        match self.runtime.as_ref() {
            Some(runtime) => Ok((runtime, &mut self.inner)),
            None => Err(SftpError::Configuration(
                "Runtime has been shut down".to_string(),
            )),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        self.inner.config()
    }

    pub fn target(&self) -> Option<&ConnectTarget> {
        self.inner.target()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    pub fn connect(
        &mut self,
        host: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<(), SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.connect(host, username, password))
    }

    pub fn connect_on_port(
        &mut self,
        host: &str,
        port: u16,
        username: &str,
        password: &SecretString,
    ) -> Result<(), SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.connect_on_port(host, port, username, password))
    }

    pub fn connect_to(
        &mut self,
        target: &ConnectTarget,
        password: &SecretString,
    ) -> Result<(), SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.connect_to(target, password))
    }

    pub fn disconnect(&mut self) {
        if let Ok((runtime, inner)) = self.parts() {
            runtime.block_on(inner.disconnect());
        }
    }

    pub fn list_entries(&mut self, remote_dir: &str) -> Result<Vec<RemoteEntry>, SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.list_entries(remote_dir))
    }

    pub fn list_files_in_dir(&mut self, remote_dir: &str) -> Result<Vec<String>, SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.list_files_in_dir(remote_dir))
    }

    pub fn list_sub_dirs_in_dir(&mut self, remote_dir: &str) -> Result<Vec<String>, SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.list_sub_dirs_in_dir(remote_dir))
    }

    pub fn is_remote_directory(&mut self, path: &str) -> Result<bool, SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.is_remote_directory(path))
    }

    pub fn create_directory(&mut self, dir_name: &str) -> Result<(), SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.create_directory(dir_name))
    }

    pub fn change_dir(&mut self, remote_path: &str) -> Result<(), SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.change_dir(remote_path))
    }

    pub fn working_directory(&mut self) -> Result<Option<String>, SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.working_directory())
    }

    pub fn download_file(
        &mut self,
        remote_path: &str,
        local_path: impl AsRef<Path>,
    ) -> Result<TransferOutcome, SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.download_file(remote_path, local_path))
    }

    pub fn download_file_after_check(
        &mut self,
        remote_path: &str,
        local_path: impl AsRef<Path>,
    ) -> Result<TransferOutcome, SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.download_file_after_check(remote_path, local_path))
    }

    pub fn download_file_with_policy(
        &mut self,
        remote_path: &str,
        local_path: impl AsRef<Path>,
        policy: ExistingFilePolicy,
    ) -> Result<TransferOutcome, SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.download_file_with_policy(remote_path, local_path, policy))
    }

    pub fn upload_file(
        &mut self,
        local_path: impl AsRef<Path>,
        remote_path: &str,
    ) -> Result<u64, SftpError> {
        let (runtime, inner) = self.parts()?;
        runtime.block_on(inner.upload_file(local_path, remote_path))
    }
}

impl<C: Connector> Drop for SftpSession<C> {
    fn drop(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };

        // Neither block_on nor a blocking runtime drop is allowed inside
        // another runtime; the connection is dropped without a disconnect
        // message.
        if tokio::runtime::Handle::try_current().is_ok() {
            runtime.shutdown_background();
            return;
        }

        if self.inner.is_connected() {
            runtime.block_on(self.inner.disconnect());
        }
    }
}
