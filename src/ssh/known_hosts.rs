use std::path::{Path, PathBuf};

use russh::keys::known_hosts::{known_host_keys_path, learn_known_hosts_path};
use russh::keys::{HashAlg, PublicKey};

use crate::config::paths;
use crate::error::SftpError;

/// Outcome of checking a server key against a known_hosts file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyStatus {
    /// Key matches a stored entry
    Known,
    /// No entry for this host existed; the key was appended (TOFU)
    Learned,
    /// Entries exist for this host but none match (potential MITM!)
    Changed { line: usize },
}

/// A known_hosts file used for trust-on-first-use verification
#[derive(Debug, Clone)]
pub struct KnownHostsFile {
    path: PathBuf,
}

impl KnownHostsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the configured path, defaulting to `~/.ssh/known_hosts`.
    pub fn resolve(configured: Option<&Path>) -> Result<Self, SftpError> {
        match configured {
            Some(path) => Ok(Self::new(paths::expand_tilde(&path.to_string_lossy()))),
            None => paths::ssh_known_hosts_file().map(Self::new).ok_or_else(|| {
                SftpError::Configuration(
                    "Could not determine known_hosts path (no home directory)".to_string(),
                )
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the fingerprint of a public key
    pub fn fingerprint(key: &PublicKey) -> String {
        key.fingerprint(HashAlg::Sha256).to_string()
    }

    /// Check `key` for `host:port`, learning it if the host is unknown.
    pub fn verify_or_learn(
        &self,
        host: &str,
        port: u16,
        key: &PublicKey,
    ) -> Result<HostKeyStatus, SftpError> {
        self.ensure_exists()?;

        let known = known_host_keys_path(host, port, &self.path).map_err(|e| {
            SftpError::HostKeyVerification(format!(
                "Failed to read known_hosts {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if known.iter().any(|(_, existing)| existing == key) {
            return Ok(HostKeyStatus::Known);
        }

        if let Some((line, _)) = known.first() {
            return Ok(HostKeyStatus::Changed { line: *line });
        }

        learn_known_hosts_path(host, port, key, &self.path).map_err(|e| {
            SftpError::HostKeyVerification(format!(
                "Failed to write known_hosts {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(HostKeyStatus::Learned)
    }

    fn ensure_exists(&self) -> Result<(), SftpError> {
        if self.path.exists() {
            return Ok(());
        }
        let io_err = |e: std::io::Error| {
            SftpError::Configuration(format!(
                "Failed to create known_hosts {}: {}",
                self.path.display(),
                e
            ))
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        Ok(())
    }
}
