//! Transport seam between [`SftpSession`](super::SftpSession) and the
//! library that actually speaks SSH/SFTP.
//!
//! [`SshConnector`](super::SshConnector) is the production implementation;
//! the traits exist so the session state machine does not depend on russh
//! types directly.

use std::future::Future;

use secrecy::SecretString;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::SessionConfig;
use crate::error::{RemoteError, SftpError};

use super::types::ConnectTarget;

/// Opens authenticated SFTP channels.
pub trait Connector: Send + Sync {
    type Channel: RemoteChannel;

    /// Perform the handshake, authenticate, and open the SFTP subsystem.
    fn connect(
        &self,
        target: &ConnectTarget,
        password: &SecretString,
        config: &SessionConfig,
    ) -> impl Future<Output = Result<Self::Channel, SftpError>> + Send;
}

/// An open SFTP channel together with the SSH session carrying it.
///
/// Relative paths are resolved against the channel's working directory,
/// which the channel owns and updates on [`change_dir`](Self::change_dir).
pub trait RemoteChannel: Send {
    type Reader: AsyncRead + Unpin + Send;
    type Writer: AsyncWrite + Unpin + Send;

    /// Whether the underlying connection is still open
    fn is_connected(&self) -> bool;

    /// Raw entry names of a directory, in server order. May include `.` and `..`.
    fn read_dir(
        &mut self,
        path: &str,
    ) -> impl Future<Output = Result<Vec<String>, RemoteError>> + Send;

    /// Remote status of `path` (symlinks followed): `true` for directories
    fn is_dir(&mut self, path: &str) -> impl Future<Output = Result<bool, RemoteError>> + Send;

    fn create_dir(&mut self, path: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn change_dir(&mut self, path: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn working_directory(&mut self) -> impl Future<Output = Result<String, RemoteError>> + Send;

    fn open_read(
        &mut self,
        path: &str,
    ) -> impl Future<Output = Result<Self::Reader, RemoteError>> + Send;

    /// Open for writing, creating or truncating the remote file
    fn open_write(
        &mut self,
        path: &str,
    ) -> impl Future<Output = Result<Self::Writer, RemoteError>> + Send;

    /// Close the SFTP channel and disconnect the SSH session
    fn close(self) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
