use russh::client::Handler;
use russh::keys::PublicKey;

use crate::config::HostKeyPolicy;
use crate::error::SftpError;
use crate::security_log;

use super::known_hosts::{HostKeyStatus, KnownHostsFile};

/// Host key check resolved from a [`HostKeyPolicy`] before connecting, so
/// that configuration problems surface before any network traffic.
#[derive(Debug, Clone)]
pub enum HostKeyCheck {
    AcceptAny,
    KnownHosts(KnownHostsFile),
}

impl HostKeyCheck {
    pub fn from_policy(policy: &HostKeyPolicy) -> Result<Self, SftpError> {
        match policy {
            HostKeyPolicy::AcceptAny => Ok(HostKeyCheck::AcceptAny),
            HostKeyPolicy::KnownHosts { path } => {
                KnownHostsFile::resolve(path.as_deref()).map(HostKeyCheck::KnownHosts)
            }
        }
    }
}

/// SSH client handler implementation
pub struct ClientHandler {
    host: String,
    port: u16,
    check: HostKeyCheck,
}

impl ClientHandler {
    pub fn new(host: String, port: u16, check: HostKeyCheck) -> Self {
        Self { host, port, check }
    }
}

impl Handler for ClientHandler {
    type Error = SftpError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = KnownHostsFile::fingerprint(server_public_key);

        let file = match &self.check {
            HostKeyCheck::AcceptAny => {
                security_log::log_host_key_unchecked(
                    &self.host,
                    self.port,
                    &fingerprint,
                    server_public_key.algorithm().as_str(),
                );
                return Ok(true);
            }
            HostKeyCheck::KnownHosts(file) => file.clone(),
        };

        let status = tokio::task::spawn_blocking({
            let host = self.host.clone();
            let port = self.port;
            let key = server_public_key.clone();
            move || file.verify_or_learn(&host, port, &key)
        })
        .await
        .map_err(|e| SftpError::HostKeyVerification(format!("Host key check failed: {}", e)))??;

        match status {
            HostKeyStatus::Known => {
                tracing::debug!("Host key verified for {}:{}", self.host, self.port);
                Ok(true)
            }
            HostKeyStatus::Learned => {
                security_log::log_host_key_learned(&self.host, self.port, &fingerprint);
                Ok(true)
            }
            HostKeyStatus::Changed { line } => {
                security_log::log_host_key_mismatch(&self.host, self.port, &fingerprint, line);
                Err(SftpError::HostKeyVerification(format!(
                    "Host key for {}:{} does not match known_hosts line {}",
                    self.host, self.port, line
                )))
            }
        }
    }
}
