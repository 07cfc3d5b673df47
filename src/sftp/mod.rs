//! SFTP client module
//!
//! Provides the SFTP session, its transport traits, and the russh-backed
//! transport.

pub mod channel;
pub mod client;
pub mod session;
pub mod types;

pub use channel::{Connector, RemoteChannel};
pub use client::{SshChannel, SshConnector};
pub use session::SftpSession;
pub use types::{
    ConnectTarget, DEFAULT_PORT, EntryKind, ExistingFilePolicy, RemoteEntry, TransferOutcome,
};
