use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationError;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write config file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create config directory: {0}")]
    CreateDir(std::io::Error),
}

/// Classification of a failure reported by the remote SFTP server or by the
/// stream carrying a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    NotFound,
    PermissionDenied,
    /// Generic server-side failure (directory not empty, already exists, ...)
    Failure,
    ConnectionLost,
    Unsupported,
    Other,
}

impl std::fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RemoteErrorKind::NotFound => "not found",
            RemoteErrorKind::PermissionDenied => "permission denied",
            RemoteErrorKind::Failure => "failure",
            RemoteErrorKind::ConnectionLost => "connection lost",
            RemoteErrorKind::Unsupported => "unsupported",
            RemoteErrorKind::Other => "error",
        };
        f.write_str(s)
    }
}

/// Error returned by a [`RemoteChannel`](crate::sftp::RemoteChannel) operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Failure, message)
    }
}

impl From<russh_sftp::client::error::Error> for RemoteError {
    fn from(err: russh_sftp::client::error::Error) -> Self {
        use russh_sftp::client::error::Error;
        use russh_sftp::protocol::StatusCode;

        match err {
            Error::Status(status) => {
                let kind = match status.status_code {
                    StatusCode::NoSuchFile => RemoteErrorKind::NotFound,
                    StatusCode::PermissionDenied => RemoteErrorKind::PermissionDenied,
                    StatusCode::NoConnection | StatusCode::ConnectionLost => {
                        RemoteErrorKind::ConnectionLost
                    }
                    StatusCode::OpUnsupported => RemoteErrorKind::Unsupported,
                    StatusCode::Failure => RemoteErrorKind::Failure,
                    _ => RemoteErrorKind::Other,
                };
                let message = if status.error_message.is_empty() {
                    status.status_code.to_string()
                } else {
                    status.error_message
                };
                RemoteError::new(kind, message)
            }
            Error::Timeout => RemoteError::new(RemoteErrorKind::ConnectionLost, "request timed out"),
            Error::IO(msg) => RemoteError::new(RemoteErrorKind::ConnectionLost, msg),
            other => RemoteError::new(RemoteErrorKind::Other, other.to_string()),
        }
    }
}

impl From<std::io::Error> for RemoteError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        let kind = match err.kind() {
            ErrorKind::NotFound => RemoteErrorKind::NotFound,
            ErrorKind::PermissionDenied => RemoteErrorKind::PermissionDenied,
            ErrorKind::BrokenPipe
            | ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionReset
            | ErrorKind::UnexpectedEof => RemoteErrorKind::ConnectionLost,
            _ => RemoteErrorKind::Other,
        };
        RemoteError::new(kind, err.to_string())
    }
}

/// Coarse classification of [`SftpError`] for callers that only need to
/// branch on the category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotConnected,
    Configuration,
    Connection,
    Authentication,
    HostKey,
    Remote,
    LocalIo,
}

/// SFTP session errors
#[derive(Error, Debug)]
pub enum SftpError {
    #[error("Not connected")]
    NotConnected,

    #[error("Invalid connection target: {0}")]
    InvalidTarget(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection failed to {host}:{port}: {reason}")]
    ConnectionFailed {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Authentication failed for '{username}': {reason}")]
    AuthenticationFailed { username: String, reason: String },

    #[error("Host key verification failed: {0}")]
    HostKeyVerification(String),

    #[error("russh error: {0}")]
    Ssh(String),

    #[error("Remote {operation} failed for '{path}': {source}")]
    Remote {
        operation: &'static str,
        path: String,
        source: RemoteError,
    },

    #[error("Local I/O error on '{path}': {source}")]
    LocalIo {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<russh::Error> for SftpError {
    fn from(err: russh::Error) -> Self {
        SftpError::Ssh(err.to_string())
    }
}

impl SftpError {
    pub(crate) fn remote(operation: &'static str, path: &str, source: RemoteError) -> Self {
        SftpError::Remote {
            operation,
            path: path.to_string(),
            source,
        }
    }

    pub(crate) fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SftpError::LocalIo {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SftpError::NotConnected => ErrorKind::NotConnected,
            SftpError::InvalidTarget(_) | SftpError::Configuration(_) => ErrorKind::Configuration,
            SftpError::ConnectionFailed { .. } | SftpError::Ssh(_) => ErrorKind::Connection,
            SftpError::AuthenticationFailed { .. } => ErrorKind::Authentication,
            SftpError::HostKeyVerification(_) => ErrorKind::HostKey,
            SftpError::Remote { .. } => ErrorKind::Remote,
            SftpError::LocalIo { .. } => ErrorKind::LocalIo,
        }
    }

    /// The server-side reason, for [`ErrorKind::Remote`] errors.
    pub fn remote_kind(&self) -> Option<RemoteErrorKind> {
        match self {
            SftpError::Remote { source, .. } => Some(source.kind),
            _ => None,
        }
    }
}
