//! sftp-util library
//!
//! A small SFTP client session over russh: connect with a password, list
//! files and subdirectories, transfer files, create directories, and follow
//! the remote working directory.
//!
//! [`sftp::SftpSession`] is the async API; [`blocking::SftpSession`] wraps it
//! for synchronous callers.

pub mod blocking;
pub mod config;
pub mod error;
pub mod logging;
pub mod security_log;
pub mod sftp;
pub mod ssh;
pub mod validation;

pub use config::{HostKeyPolicy, SessionConfig};
pub use error::{ErrorKind, RemoteError, RemoteErrorKind, SftpError};
pub use sftp::{
    ConnectTarget, EntryKind, ExistingFilePolicy, RemoteEntry, SftpSession, TransferOutcome,
};
