//! russh + russh-sftp implementation of the transport traits

use std::sync::Arc;

use russh::Disconnect;
use russh::client::{self, Config};
use russh_sftp::client::SftpSession as RusshSftpSession;
use russh_sftp::client::fs::File;
use russh_sftp::protocol::OpenFlags;
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::SessionConfig;
use crate::error::{RemoteError, RemoteErrorKind, SftpError};
use crate::security_log;
use crate::ssh::{ClientHandler, HostKeyCheck};

use super::channel::{Connector, RemoteChannel};
use super::types::{ConnectTarget, absolute_remote};

/// Connector that opens SFTP channels over russh
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

impl SshConnector {
    fn ssh_config(config: &SessionConfig) -> Config {
        Config {
            inactivity_timeout: config.inactivity_timeout(),
            keepalive_interval: config.keepalive_interval(),
            keepalive_max: 3,
            ..Default::default()
        }
    }

    async fn establish(
        target: &ConnectTarget,
        password: &SecretString,
        ssh_config: Arc<Config>,
        check: HostKeyCheck,
        stream: TcpStream,
    ) -> Result<SshChannel, SftpError> {
        let handler = ClientHandler::new(target.host.clone(), target.port, check);

        let mut handle = client::connect_stream(ssh_config, stream, handler)
            .await
            .map_err(|e| match e {
                SftpError::Ssh(reason) => SftpError::ConnectionFailed {
                    host: target.host.clone(),
                    port: target.port,
                    reason: format!("SSH handshake failed: {}", reason),
                },
                other => other,
            })?;

        match Self::open_sftp(&mut handle, target, password).await {
            Ok((sftp, cwd)) => {
                security_log::log_sftp_connect(&target.host, target.port, &target.username);
                Ok(SshChannel {
                    sftp,
                    handle,
                    cwd,
                    target: target.clone(),
                })
            }
            Err(e) => {
                // No half-open session may outlive a failed connect
                if let Err(close_err) = handle
                    .disconnect(Disconnect::ByApplication, "", "English")
                    .await
                {
                    tracing::debug!("Disconnect after failed setup: {}", close_err);
                }
                Err(e)
            }
        }
    }

    async fn open_sftp(
        handle: &mut client::Handle<ClientHandler>,
        target: &ConnectTarget,
        password: &SecretString,
    ) -> Result<(RusshSftpSession, String), SftpError> {
        authenticate(handle, target, password).await?;

        let connection_failed = |reason: String| SftpError::ConnectionFailed {
            host: target.host.clone(),
            port: target.port,
            reason,
        };

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| connection_failed(format!("Failed to open channel: {}", e)))?;

        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| connection_failed(format!("Failed to request SFTP subsystem: {}", e)))?;

        let sftp = RusshSftpSession::new(channel.into_stream())
            .await
            .map_err(|e| connection_failed(format!("Failed to initialize SFTP session: {}", e)))?;

        // Servers start the session in the user's home directory
        let cwd = match sftp.canonicalize(".").await {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!("Could not resolve initial directory, using '/': {}", e);
                "/".to_string()
            }
        };

        Ok((sftp, cwd))
    }
}

async fn authenticate(
    handle: &mut client::Handle<ClientHandler>,
    target: &ConnectTarget,
    password: &SecretString,
) -> Result<(), SftpError> {
    let method = "password";
    security_log::log_auth_attempt(&target.host, target.port, &target.username, method);

    let result = match handle
        .authenticate_password(target.username.as_str(), password.expose_secret())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            let reason = format!("Password auth failed: {}", e);
            security_log::log_auth_failure(
                &target.host,
                target.port,
                &target.username,
                method,
                &reason,
            );
            return Err(SftpError::ConnectionFailed {
                host: target.host.clone(),
                port: target.port,
                reason,
            });
        }
    };

    if !result.success() {
        let reason = "Authentication rejected by server";
        security_log::log_auth_failure(&target.host, target.port, &target.username, method, reason);
        return Err(SftpError::AuthenticationFailed {
            username: target.username.clone(),
            reason: reason.to_string(),
        });
    }

    security_log::log_auth_success(&target.host, target.port, &target.username, method);
    Ok(())
}

impl Connector for SshConnector {
    type Channel = SshChannel;

    async fn connect(
        &self,
        target: &ConnectTarget,
        password: &SecretString,
        config: &SessionConfig,
    ) -> Result<SshChannel, SftpError> {
        let check = HostKeyCheck::from_policy(&config.host_key_policy)?;
        let ssh_config = Arc::new(Self::ssh_config(config));
        let connect_timeout = config.connect_timeout();
        let addr = target.address();

        let stream = timeout(connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| SftpError::ConnectionFailed {
                host: target.host.clone(),
                port: target.port,
                reason: format!("Connection timed out after {}s", connect_timeout.as_secs()),
            })?
            .map_err(|e| SftpError::ConnectionFailed {
                host: target.host.clone(),
                port: target.port,
                reason: e.to_string(),
            })?;

        // The handshake, authentication and subsystem setup share one deadline
        match timeout(
            connect_timeout,
            Self::establish(target, password, ssh_config, check, stream),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SftpError::ConnectionFailed {
                host: target.host.clone(),
                port: target.port,
                reason: "SFTP session setup timed out".to_string(),
            }),
        }
    }
}

/// An SFTP channel over an authenticated russh session.
///
/// The SFTP protocol has no server-side working directory, so it is tracked
/// here and every relative path is joined onto it. `..` is left for the
/// server to resolve.
pub struct SshChannel {
    sftp: RusshSftpSession,
    handle: client::Handle<ClientHandler>,
    cwd: String,
    target: ConnectTarget,
}

impl std::fmt::Debug for SshChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshChannel")
            .field("target", &self.target)
            .field("cwd", &self.cwd)
            .finish_non_exhaustive()
    }
}

impl SshChannel {
    fn absolute(&self, path: &str) -> String {
        absolute_remote(&self.cwd, path)
    }
}

impl RemoteChannel for SshChannel {
    type Reader = File;
    type Writer = File;

    fn is_connected(&self) -> bool {
        !self.handle.is_closed()
    }

    async fn read_dir(&mut self, path: &str) -> Result<Vec<String>, RemoteError> {
        let entries = self.sftp.read_dir(self.absolute(path)).await?;
        Ok(entries.map(|entry| entry.file_name()).collect())
    }

    async fn is_dir(&mut self, path: &str) -> Result<bool, RemoteError> {
        let metadata = self.sftp.metadata(self.absolute(path)).await?;
        Ok(metadata.is_dir())
    }

    async fn create_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.sftp.create_dir(self.absolute(path)).await?;
        Ok(())
    }

    async fn change_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        let canonical = self.sftp.canonicalize(self.absolute(path)).await?;
        let metadata = self.sftp.metadata(canonical.clone()).await?;
        if !metadata.is_dir() {
            return Err(RemoteError::failure(format!("{} is not a directory", canonical)));
        }
        self.cwd = canonical;
        Ok(())
    }

    async fn working_directory(&mut self) -> Result<String, RemoteError> {
        Ok(self.cwd.clone())
    }

    async fn open_read(&mut self, path: &str) -> Result<File, RemoteError> {
        Ok(self.sftp.open(self.absolute(path)).await?)
    }

    async fn open_write(&mut self, path: &str) -> Result<File, RemoteError> {
        let file = self
            .sftp
            .open_with_flags(
                self.absolute(path),
                OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
            )
            .await?;
        Ok(file)
    }

    async fn close(self) -> Result<(), RemoteError> {
        let SshChannel {
            sftp,
            handle,
            target,
            ..
        } = self;
        drop(sftp);

        let result = handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| RemoteError::new(RemoteErrorKind::ConnectionLost, e.to_string()));

        security_log::log_sftp_disconnect(&target.host, target.port, &target.username);
        result
    }
}
