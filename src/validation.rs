//! Validation of connection targets.
//!
//! Hostnames, ports, and usernames are checked before any socket is opened so
//! that malformed input surfaces as a configuration error instead of an
//! opaque network failure.

use std::net::IpAddr;

use regex::Regex;
use std::sync::LazyLock;

/// Validation error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

// Pre-compiled regex patterns for validation
static DNS_LABEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$").unwrap());

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9._-]{0,31}$").unwrap());

/// Validate a hostname (DNS name or IP address).
///
/// Accepts IPv4 and IPv6 literals and RFC 1123 host names.
///
/// # Errors
///
/// Returns `ValidationError` if the hostname is empty, too long, or malformed.
pub fn validate_hostname(hostname: &str) -> Result<(), ValidationError> {
    let hostname = hostname.trim();

    if hostname.is_empty() {
        return Err(ValidationError::new("hostname", "Hostname is required"));
    }

    // DNS max is 253 characters
    if hostname.len() > 253 {
        return Err(ValidationError::new(
            "hostname",
            "Hostname exceeds maximum length of 253 characters",
        ));
    }

    if hostname.parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    validate_dns_hostname(hostname)
}

fn validate_dns_hostname(hostname: &str) -> Result<(), ValidationError> {
    for label in hostname.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err(ValidationError::new(
                "hostname",
                "Hostname labels must be 1-63 characters",
            ));
        }

        if !DNS_LABEL_REGEX.is_match(label) {
            return Err(ValidationError::new(
                "hostname",
                format!(
                    "Invalid hostname label '{}': must start and end with alphanumeric, may contain hyphens",
                    label
                ),
            ));
        }
    }

    Ok(())
}

/// Validate a port number.
///
/// # Errors
///
/// Returns `ValidationError` for port 0.
pub fn validate_port(port: u16) -> Result<u16, ValidationError> {
    if port == 0 {
        return Err(ValidationError::new(
            "port",
            "Port must be between 1 and 65535",
        ));
    }
    Ok(port)
}

/// Validate a username for password authentication.
///
/// Unlike an interactive client there is no local-user fallback, so an empty
/// username is rejected. Non-empty usernames follow POSIX conventions with
/// dots allowed, up to 32 characters.
///
/// # Errors
///
/// Returns `ValidationError` if the username is empty or malformed.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::new("username", "Username is required"));
    }

    if username.len() > 32 {
        return Err(ValidationError::new(
            "username",
            "Username exceeds maximum length of 32 characters",
        ));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::new(
            "username",
            "Username must start with letter or underscore, and contain only alphanumeric, dot, underscore, or hyphen",
        ));
    }

    Ok(())
}
