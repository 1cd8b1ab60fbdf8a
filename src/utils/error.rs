use crate::ssh::host_key::Fingerprint;
use std::path::PathBuf;
use thiserror::Error;

/// Command-line and validation failures. The messages are shown verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("")]
    Help,

    #[error("{0}")]
    Usage(String),

    #[error("file required")]
    FileRequired,

    #[error("host required")]
    HostRequired,

    #[error("local path required")]
    LocalPathRequired,

    #[error("port required")]
    PortRequired,

    #[error("user required")]
    UserRequired,

    #[error("password required")]
    PasswordRequired,

    #[error("path required")]
    PathRequired,
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Failed to connect to {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SSH handshake with {addr} failed: {source}")]
    Handshake {
        addr: String,
        #[source]
        source: ssh2::Error,
    },

    #[error("Server at {addr} did not offer a host key")]
    NoHostKey { addr: String },

    #[error("Could not verify `{key_type}` host key with fingerprint `{fingerprint}` for `{host}` on port {port}")]
    HostKeyUnverified {
        key_type: String,
        fingerprint: Fingerprint,
        host: String,
        port: u16,
    },

    #[error("Host key fingerprint `{offered}` for `{host}` on port {port} does not match `{expected}`")]
    HostKeyMismatch {
        expected: Fingerprint,
        offered: Fingerprint,
        host: String,
        port: u16,
    },
}

#[derive(Error, Debug)]
pub enum TransferError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Authentication failed for user {username}")]
    AuthenticationFailed { username: String },

    #[error("{}: {source}", .path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SCP transfer of {path} failed: {source}")]
    Scp {
        path: String,
        #[source]
        source: ssh2::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
