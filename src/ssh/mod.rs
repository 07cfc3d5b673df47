//! SSH transport pieces used to establish SFTP connections
//!
//! Provides the russh client handler and host key verification.

pub mod handler;
pub mod known_hosts;

pub use handler::{ClientHandler, HostKeyCheck};
pub use known_hosts::{HostKeyStatus, KnownHostsFile};
