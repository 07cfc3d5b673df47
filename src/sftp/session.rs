//! SFTP session: connection lifecycle and file operations

use std::path::Path;

use secrecy::SecretString;
use tokio::io::{self, AsyncWriteExt};

use crate::config::SessionConfig;
use crate::error::{RemoteError, SftpError};
use crate::validation;

use super::channel::{Connector, RemoteChannel};
use super::client::SshConnector;
use super::types::{
    ConnectTarget, EntryKind, ExistingFilePolicy, RemoteEntry, TransferOutcome, join_remote,
};

struct Connection<Ch> {
    channel: Ch,
    target: ConnectTarget,
}

/// A single SFTP connection with explicit connect/disconnect lifecycle.
///
/// Every directory and file operation requires a prior successful
/// [`connect`](Self::connect) and fails with [`SftpError::NotConnected`]
/// otherwise. Operations take `&mut self`: a session is meant to be driven by
/// one caller at a time, and callers needing parallelism open separate
/// sessions.
pub struct SftpSession<C: Connector = SshConnector> {
    connector: C,
    config: SessionConfig,
    connection: Option<Connection<C::Channel>>,
}

impl<C: Connector> std::fmt::Debug for SftpSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SftpSession")
            .field("config", &self.config)
            .field("target", &self.target())
            .finish_non_exhaustive()
    }
}

impl SftpSession<SshConnector> {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self::with_connector(SshConnector, config)
    }
}

impl Default for SftpSession<SshConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> SftpSession<C> {
    pub fn with_connector(connector: C, config: SessionConfig) -> Self {
        Self {
            connector,
            config,
            connection: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Target of the current connection, if any
    pub fn target(&self) -> Option<&ConnectTarget> {
        self.connection.as_ref().map(|c| &c.target)
    }

    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|c| c.channel.is_connected())
    }

    /// Connect on the default SSH port.
    pub async fn connect(
        &mut self,
        host: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<(), SftpError> {
        self.connect_to(&ConnectTarget::new(host, username), password)
            .await
    }

    pub async fn connect_on_port(
        &mut self,
        host: &str,
        port: u16,
        username: &str,
        password: &SecretString,
    ) -> Result<(), SftpError> {
        self.connect_to(&ConnectTarget::new(host, username).with_port(port), password)
            .await
    }

    /// Connect to `target`, replacing any existing connection.
    ///
    /// An invalid target is rejected before anything is closed or opened.
    /// Any later error leaves the session disconnected.
    pub async fn connect_to(
        &mut self,
        target: &ConnectTarget,
        password: &SecretString,
    ) -> Result<(), SftpError> {
        validation::validate_hostname(&target.host)?;
        validation::validate_port(target.port)?;
        validation::validate_username(&target.username)?;

        if self.connection.is_some() {
            self.disconnect().await;
        }

        tracing::info!(
            "Connecting to {}@{}:{}",
            target.username,
            target.host,
            target.port
        );

        let channel = self
            .connector
            .connect(target, password, &self.config)
            .await
            .inspect_err(|e| tracing::warn!("Connection to {} failed: {}", target.address(), e))?;

        if !channel.is_connected() {
            if let Err(e) = channel.close().await {
                tracing::debug!("Closing dead channel failed: {}", e);
            }
            return Err(SftpError::ConnectionFailed {
                host: target.host.clone(),
                port: target.port,
                reason: "Channel closed during setup".to_string(),
            });
        }

        self.connection = Some(Connection {
            channel,
            target: target.clone(),
        });
        Ok(())
    }

    /// Close the channel and the SSH session. Never fails; calling it while
    /// disconnected does nothing.
    pub async fn disconnect(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        let target = connection.target;
        if let Err(e) = connection.channel.close().await {
            tracing::debug!("Error while disconnecting from {}: {}", target.address(), e);
        }
        tracing::info!("Disconnected from {}", target.address());
    }

    fn channel(&mut self) -> Result<&mut C::Channel, SftpError> {
        self.connection
            .as_mut()
            .map(|c| &mut c.channel)
            .ok_or(SftpError::NotConnected)
    }

    /// List a directory, classifying each entry with the same predicate as
    /// [`is_remote_directory`](Self::is_remote_directory).
    pub async fn list_entries(&mut self, remote_dir: &str) -> Result<Vec<RemoteEntry>, SftpError> {
        let channel = self.channel()?;

        let names = channel.read_dir(remote_dir).await.map_err(|e| {
            tracing::warn!("Failed to list {}: {}", remote_dir, e);
            SftpError::remote("list", remote_dir, e)
        })?;

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            if name == "." || name == ".." {
                continue;
            }
            let kind = if is_directory(channel, &join_remote(remote_dir, &name)).await {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(RemoteEntry { name, kind });
        }

        Ok(entries)
    }

    /// Names of the non-directory entries of `remote_dir`, in server order.
    pub async fn list_files_in_dir(&mut self, remote_dir: &str) -> Result<Vec<String>, SftpError> {
        let entries = self.list_entries(remote_dir).await?;
        Ok(entries
            .into_iter()
            .filter(|e| !e.is_dir())
            .map(|e| e.name)
            .collect())
    }

    /// Names of the subdirectories of `remote_dir`, in server order.
    pub async fn list_sub_dirs_in_dir(
        &mut self,
        remote_dir: &str,
    ) -> Result<Vec<String>, SftpError> {
        let entries = self.list_entries(remote_dir).await?;
        Ok(entries
            .into_iter()
            .filter(RemoteEntry::is_dir)
            .map(|e| e.name)
            .collect())
    }

    /// Whether `path` is a directory on the server.
    ///
    /// A failed status query (including a missing path) yields `false`, so
    /// this cannot tell "not a directory" apart from "does not exist".
    pub async fn is_remote_directory(&mut self, path: &str) -> Result<bool, SftpError> {
        let channel = self.channel()?;
        Ok(is_directory(channel, path).await)
    }

    pub async fn create_directory(&mut self, dir_name: &str) -> Result<(), SftpError> {
        let channel = self.channel()?;
        channel.create_dir(dir_name).await.map_err(|e| {
            tracing::debug!("mkdir {} failed: {}", dir_name, e);
            SftpError::remote("mkdir", dir_name, e)
        })
    }

    pub async fn change_dir(&mut self, remote_path: &str) -> Result<(), SftpError> {
        let channel = self.channel()?;
        channel.change_dir(remote_path).await.map_err(|e| {
            tracing::debug!("cd {} failed: {}", remote_path, e);
            SftpError::remote("cd", remote_path, e)
        })
    }

    /// Current remote working directory; `None` if the query fails.
    pub async fn working_directory(&mut self) -> Result<Option<String>, SftpError> {
        let channel = self.channel()?;
        match channel.working_directory().await {
            Ok(cwd) => Ok(Some(cwd)),
            Err(e) => {
                tracing::warn!("Failed to query working directory: {}", e);
                Ok(None)
            }
        }
    }

    /// Download `remote_path` into `local_path`, creating or truncating it.
    pub async fn download_file(
        &mut self,
        remote_path: &str,
        local_path: impl AsRef<Path>,
    ) -> Result<TransferOutcome, SftpError> {
        self.download_file_with_policy(remote_path, local_path, ExistingFilePolicy::Overwrite)
            .await
    }

    /// Download unless `local_path` already exists, in which case nothing is
    /// transferred and [`TransferOutcome::Skipped`] is returned. An outdated
    /// local copy is kept as is.
    pub async fn download_file_after_check(
        &mut self,
        remote_path: &str,
        local_path: impl AsRef<Path>,
    ) -> Result<TransferOutcome, SftpError> {
        self.download_file_with_policy(remote_path, local_path, ExistingFilePolicy::Skip)
            .await
    }

    pub async fn download_file_with_policy(
        &mut self,
        remote_path: &str,
        local_path: impl AsRef<Path>,
        policy: ExistingFilePolicy,
    ) -> Result<TransferOutcome, SftpError> {
        let local_path = local_path.as_ref();
        let channel = self.channel()?;

        if policy == ExistingFilePolicy::Skip
            && tokio::fs::try_exists(local_path).await.unwrap_or(false)
        {
            tracing::info!(
                "Skipping download of {}: {} already exists",
                remote_path,
                local_path.display()
            );
            return Ok(TransferOutcome::Skipped);
        }

        let mut remote = match channel.open_read(remote_path).await {
            Ok(remote) => remote,
            Err(e) => {
                let cwd = channel.working_directory().await.ok();
                tracing::warn!(
                    "{} not found in {}: {}",
                    remote_path,
                    cwd.as_deref().unwrap_or("<unknown>"),
                    e
                );
                return Err(SftpError::remote("download", remote_path, e));
            }
        };

        let mut local = tokio::fs::File::create(local_path)
            .await
            .map_err(|e| SftpError::local_io(local_path, e))?;

        let copied = match io::copy(&mut remote, &mut local).await {
            Ok(bytes) => local
                .flush()
                .await
                .map(|_| bytes)
                .map_err(|e| SftpError::local_io(local_path, e)),
            Err(e) => Err(SftpError::remote(
                "download",
                remote_path,
                RemoteError::from(e),
            )),
        };
        drop(local);

        match copied {
            Ok(bytes) => {
                tracing::debug!(
                    "Downloaded {} to {} ({} bytes)",
                    remote_path,
                    local_path.display(),
                    bytes
                );
                Ok(TransferOutcome::Transferred { bytes })
            }
            Err(e) => {
                tracing::warn!("Download of {} failed: {}", remote_path, e);
                if let Err(rm) = tokio::fs::remove_file(local_path).await {
                    tracing::debug!(
                        "Could not remove partial file {}: {}",
                        local_path.display(),
                        rm
                    );
                }
                Err(e)
            }
        }
    }

    /// Upload `local_path` to `remote_path`, creating or truncating the
    /// remote file. Returns the number of bytes sent.
    pub async fn upload_file(
        &mut self,
        local_path: impl AsRef<Path>,
        remote_path: &str,
    ) -> Result<u64, SftpError> {
        let local_path = local_path.as_ref();
        let channel = self.channel()?;

        let mut local = tokio::fs::File::open(local_path)
            .await
            .map_err(|e| SftpError::local_io(local_path, e))?;

        let mut remote = channel.open_write(remote_path).await.map_err(|e| {
            tracing::warn!("Cannot open {} for upload: {}", remote_path, e);
            SftpError::remote("upload", remote_path, e)
        })?;

        let bytes = io::copy(&mut local, &mut remote).await.map_err(|e| {
            tracing::warn!("Upload of {} failed: {}", local_path.display(), e);
            SftpError::remote("upload", remote_path, RemoteError::from(e))
        })?;

        remote
            .shutdown()
            .await
            .map_err(|e| SftpError::remote("upload", remote_path, RemoteError::from(e)))?;

        tracing::debug!(
            "Uploaded {} to {} ({} bytes)",
            local_path.display(),
            remote_path,
            bytes
        );
        Ok(bytes)
    }
}

/// The single directory predicate used for both listings and
/// [`SftpSession::is_remote_directory`].
async fn is_directory<Ch: RemoteChannel>(channel: &mut Ch, path: &str) -> bool {
    match channel.is_dir(path).await {
        Ok(is_dir) => is_dir,
        Err(e) => {
            tracing::debug!("stat {} failed: {}", path, e);
            false
        }
    }
}
