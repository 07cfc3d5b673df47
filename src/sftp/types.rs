//! Types shared by the SFTP session and its transports

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Where to connect and as whom. The password is passed separately so it is
/// never stored alongside the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
}

impl ConnectTarget {
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `host:port` suitable for socket connection
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Whether a remote entry is a directory, as reported by remote status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl RemoteEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// What a download does when the local destination already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingFilePolicy {
    /// Leave the local file untouched and report [`TransferOutcome::Skipped`].
    /// A stale local copy is never refreshed.
    #[default]
    Skip,
    /// Truncate and rewrite the local file
    Overwrite,
}

/// Result of a successful transfer call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Transferred { bytes: u64 },
    Skipped,
}

impl TransferOutcome {
    pub fn bytes(&self) -> u64 {
        match self {
            TransferOutcome::Transferred { bytes } => *bytes,
            TransferOutcome::Skipped => 0,
        }
    }
}

/// Join a remote entry name onto a directory using `/` separators.
pub fn join_remote(dir: &str, name: &str) -> String {
    if name.starts_with('/') {
        return name.to_string();
    }
    if dir.is_empty() || dir == "." {
        return name.to_string();
    }
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Make `path` absolute by joining it onto the working directory `cwd`.
///
/// `..` components are kept as is so the server resolves them against the
/// real directory tree, symlinks included.
pub fn absolute_remote(cwd: &str, path: &str) -> String {
    let cwd = if cwd.is_empty() { "/" } else { cwd };
    match path {
        "" | "." => cwd.to_string(),
        _ if path.starts_with('/') => path.to_string(),
        _ => join_remote(cwd, path),
    }
}

/// Resolve `path` against the working directory `cwd`, normalizing `.` and
/// `..` components lexically. The result is always absolute.
pub fn resolve_remote(cwd: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        join_remote(if cwd.is_empty() { "/" } else { cwd }, path)
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in joined.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    format!("/{}", parts.join("/"))
}
