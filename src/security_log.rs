//! Security event logging for audit trails.
//!
//! Structured events for authentication attempts, SFTP connection
//! establishment, and host key decisions. All events use
//! `target: "security"` so they can be filtered separately:
//!
//! ```bash
//! RUST_LOG=security=info
//! ```

use tracing::{info, warn};

/// Log an SSH authentication attempt.
pub fn log_auth_attempt(host: &str, port: u16, username: &str, method: &str) {
    info!(
        target: "security",
        event = "auth_attempt",
        host = %host,
        port = port,
        username = %username,
        method = %method,
        "SSH authentication attempt"
    );
}

/// Log a successful SSH authentication.
pub fn log_auth_success(host: &str, port: u16, username: &str, method: &str) {
    info!(
        target: "security",
        event = "auth_success",
        host = %host,
        port = port,
        username = %username,
        method = %method,
        "SSH authentication succeeded"
    );
}

/// Log a failed SSH authentication attempt.
pub fn log_auth_failure(host: &str, port: u16, username: &str, method: &str, reason: &str) {
    warn!(
        target: "security",
        event = "auth_failure",
        host = %host,
        port = port,
        username = %username,
        method = %method,
        reason = %reason,
        "SSH authentication failed"
    );
}

/// Log an SFTP connection establishment.
pub fn log_sftp_connect(host: &str, port: u16, username: &str) {
    info!(
        target: "security",
        event = "sftp_connect",
        host = %host,
        port = port,
        username = %username,
        "SFTP connection established"
    );
}

/// Log an SFTP connection teardown.
pub fn log_sftp_disconnect(host: &str, port: u16, username: &str) {
    info!(
        target: "security",
        event = "sftp_disconnect",
        host = %host,
        port = port,
        username = %username,
        "SFTP connection closed"
    );
}

/// Log a host key accepted without verification.
pub fn log_host_key_unchecked(host: &str, port: u16, fingerprint: &str, key_type: &str) {
    warn!(
        target: "security",
        event = "host_key_unchecked",
        host = %host,
        port = port,
        fingerprint = %fingerprint,
        key_type = %key_type,
        "Host key accepted WITHOUT verification - server identity not checked"
    );
}

/// Log a previously unknown host key written to known_hosts.
pub fn log_host_key_learned(host: &str, port: u16, fingerprint: &str) {
    info!(
        target: "security",
        event = "host_key_learned",
        host = %host,
        port = port,
        fingerprint = %fingerprint,
        "Learned new host key"
    );
}

/// Log a host key that does not match the stored entry.
pub fn log_host_key_mismatch(host: &str, port: u16, fingerprint: &str, line: usize) {
    warn!(
        target: "security",
        event = "host_key_mismatch",
        host = %host,
        port = port,
        fingerprint = %fingerprint,
        known_hosts_line = line,
        "HOST KEY CHANGED - connection refused"
    );
}
