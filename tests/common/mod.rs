//! Common test utilities
//!
//! An in-memory SFTP server reachable through the [`Connector`] and
//! [`RemoteChannel`] traits, so session behaviour can be tested without an
//! SSH daemon.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};

use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use sftp_util::config::SessionConfig;
use sftp_util::error::{RemoteError, RemoteErrorKind, SftpError};
use sftp_util::sftp::types::resolve_remote;
use sftp_util::sftp::{ConnectTarget, Connector, RemoteChannel};

pub const TEST_USER: &str = "tester";
pub const TEST_PASSWORD: &str = "testpass123";
pub const TEST_HOME: &str = "/home/tester";

pub fn password() -> SecretString {
    SecretString::from(TEST_PASSWORD.to_string())
}

pub fn wrong_password() -> SecretString {
    SecretString::from("wrongpassword".to_string())
}

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
    /// Opening succeeds but reading fails after the content is sent
    Broken(Vec<u8>),
}

/// Shared remote filesystem tree keyed by absolute path
#[derive(Debug, Clone)]
pub struct MemoryFs {
    nodes: Arc<Mutex<BTreeMap<String, Node>>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        let fs = Self {
            nodes: Arc::new(Mutex::new(BTreeMap::new())),
        };
        fs.insert("/", Node::Dir);
        fs.add_dir("/home");
        fs.add_dir(TEST_HOME);
        fs.add_dir("/tmp");
        fs
    }

    fn insert(&self, path: &str, node: Node) {
        self.nodes.lock().unwrap().insert(path.to_string(), node);
    }

    fn get(&self, path: &str) -> Option<Node> {
        self.nodes.lock().unwrap().get(path).cloned()
    }

    pub fn add_dir(&self, path: &str) {
        self.insert(path, Node::Dir);
    }

    pub fn add_file(&self, path: &str, content: &[u8]) {
        self.insert(path, Node::File(content.to_vec()));
    }

    pub fn add_broken_file(&self, path: &str, partial: &[u8]) {
        self.insert(path, Node::Broken(partial.to_vec()));
    }

    pub fn read_file(&self, path: &str) -> Option<Vec<u8>> {
        match self.get(path) {
            Some(Node::File(content)) => Some(content),
            _ => None,
        }
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Node::Dir))
    }

    fn parent_is_dir(&self, path: &str) -> bool {
        let parent = match path.rfind('/') {
            Some(0) => "/",
            Some(idx) => &path[..idx],
            None => return false,
        };
        self.is_dir(parent)
    }

    fn children(&self, dir: &str) -> Vec<String> {
        let prefix = if dir == "/" {
            "/".to_string()
        } else {
            format!("{}/", dir)
        };
        self.nodes
            .lock()
            .unwrap()
            .keys()
            .filter_map(|path| {
                let rest = path.strip_prefix(&prefix)?;
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect()
    }

    fn append(&self, path: &str, data: &[u8]) {
        if let Some(Node::File(content)) = self.nodes.lock().unwrap().get_mut(path) {
            content.extend_from_slice(data);
        }
    }
}

/// Connector handing out [`MemoryChannel`]s for one fixed account
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    pub fs: MemoryFs,
    channels: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
    attempts: Arc<AtomicUsize>,
    /// Hand out channels that already report themselves closed
    dead_channels: bool,
}

impl MemoryConnector {
    pub fn new(fs: MemoryFs) -> Self {
        Self {
            fs,
            channels: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(AtomicUsize::new(0)),
            dead_channels: false,
        }
    }

    pub fn with_dead_channels(mut self) -> Self {
        self.dead_channels = true;
        self
    }

    /// Channels opened and not yet closed
    pub fn open_channels(&self) -> usize {
        self.channels
            .lock()
            .unwrap()
            .iter()
            .filter(|open| open.load(Ordering::SeqCst))
            .count()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for MemoryConnector {
    type Channel = MemoryChannel;

    async fn connect(
        &self,
        target: &ConnectTarget,
        password: &SecretString,
        _config: &SessionConfig,
    ) -> Result<MemoryChannel, SftpError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if target.host == "unreachable.example.com" {
            return Err(SftpError::ConnectionFailed {
                host: target.host.clone(),
                port: target.port,
                reason: "Connection refused".to_string(),
            });
        }

        if target.username != TEST_USER || password.expose_secret() != TEST_PASSWORD {
            return Err(SftpError::AuthenticationFailed {
                username: target.username.clone(),
                reason: "Authentication rejected by server".to_string(),
            });
        }

        let open = Arc::new(AtomicBool::new(!self.dead_channels));
        self.channels.lock().unwrap().push(open.clone());

        Ok(MemoryChannel {
            fs: self.fs.clone(),
            cwd: TEST_HOME.to_string(),
            open,
        })
    }
}

#[derive(Debug)]
pub struct MemoryChannel {
    fs: MemoryFs,
    cwd: String,
    open: Arc<AtomicBool>,
}

impl MemoryChannel {
    fn absolute(&self, path: &str) -> String {
        resolve_remote(&self.cwd, path)
    }
}

impl RemoteChannel for MemoryChannel {
    type Reader = MemoryReader;
    type Writer = MemoryWriter;

    fn is_connected(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn read_dir(&mut self, path: &str) -> Result<Vec<String>, RemoteError> {
        let path = self.absolute(path);
        if !self.fs.is_dir(&path) {
            return Err(RemoteError::not_found(format!("No such directory: {}", path)));
        }
        let mut names = vec![".".to_string(), "..".to_string()];
        names.extend(self.fs.children(&path));
        Ok(names)
    }

    async fn is_dir(&mut self, path: &str) -> Result<bool, RemoteError> {
        match self.fs.get(&self.absolute(path)) {
            Some(Node::Dir) => Ok(true),
            Some(_) => Ok(false),
            None => Err(RemoteError::not_found(path.to_string())),
        }
    }

    async fn create_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        let path = self.absolute(path);
        if self.fs.get(&path).is_some() {
            return Err(RemoteError::failure(format!("{} already exists", path)));
        }
        if !self.fs.parent_is_dir(&path) {
            return Err(RemoteError::not_found(format!("No parent for {}", path)));
        }
        self.fs.add_dir(&path);
        Ok(())
    }

    async fn change_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        let path = self.absolute(path);
        match self.fs.get(&path) {
            Some(Node::Dir) => {
                self.cwd = path;
                Ok(())
            }
            Some(_) => Err(RemoteError::failure(format!("{} is not a directory", path))),
            None => Err(RemoteError::not_found(path)),
        }
    }

    async fn working_directory(&mut self) -> Result<String, RemoteError> {
        Ok(self.cwd.clone())
    }

    async fn open_read(&mut self, path: &str) -> Result<MemoryReader, RemoteError> {
        let path = self.absolute(path);
        match self.fs.get(&path) {
            Some(Node::File(content)) => Ok(MemoryReader {
                data: io::Cursor::new(content),
                fail_at_end: false,
            }),
            Some(Node::Broken(content)) => Ok(MemoryReader {
                data: io::Cursor::new(content),
                fail_at_end: true,
            }),
            Some(Node::Dir) => Err(RemoteError::failure(format!("{} is a directory", path))),
            None => Err(RemoteError::not_found(format!("No such file: {}", path))),
        }
    }

    async fn open_write(&mut self, path: &str) -> Result<MemoryWriter, RemoteError> {
        let path = self.absolute(path);
        if self.fs.is_dir(&path) {
            return Err(RemoteError::failure(format!("{} is a directory", path)));
        }
        if !self.fs.parent_is_dir(&path) {
            return Err(RemoteError::new(
                RemoteErrorKind::NotFound,
                format!("No parent for {}", path),
            ));
        }
        self.fs.add_file(&path, b"");
        Ok(MemoryWriter {
            fs: self.fs.clone(),
            path,
        })
    }

    async fn close(self) -> Result<(), RemoteError> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}

pub struct MemoryReader {
    data: io::Cursor<Vec<u8>>,
    fail_at_end: bool,
}

impl AsyncRead for MemoryReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        let before = buf.filled().len();
        ready!(Pin::new(&mut this.data).poll_read(cx, buf))?;
        if this.fail_at_end && buf.filled().len() == before {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "channel reset by peer",
            )));
        }
        Poll::Ready(Ok(()))
    }
}

pub struct MemoryWriter {
    fs: MemoryFs,
    path: String,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.fs.append(&self.path, buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Session wired to a fresh in-memory server
pub fn memory_session() -> (
    sftp_util::sftp::SftpSession<MemoryConnector>,
    MemoryConnector,
) {
    let connector = MemoryConnector::new(MemoryFs::new());
    let session =
        sftp_util::sftp::SftpSession::with_connector(connector.clone(), SessionConfig::default());
    (session, connector)
}
