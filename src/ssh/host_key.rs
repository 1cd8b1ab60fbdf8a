// 主机密钥校验
use crate::utils::error::ConnectError;
use log::{debug, warn};
use ssh2::{CheckResult, HostKeyType, KnownHostFileKind, Session};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Colon-separated lower-case hex MD5 of a host key blob, e.g. `d4:1d:8c:..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid host key fingerprint: {0}")]
pub struct InvalidFingerprint(String);

impl Fingerprint {
    pub fn of_key(blob: &[u8]) -> Self {
        let digest = md5::compute(blob);
        let hex: Vec<String> = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Fingerprint(hex.join(":"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Fingerprint {
    type Err = InvalidFingerprint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups: Vec<&str> = s.split(':').collect();
        let valid = groups.len() == 16
            && groups
                .iter()
                .all(|g| g.len() == 2 && g.bytes().all(|b| b.is_ascii_hexdigit()));
        if valid {
            Ok(Fingerprint(s.to_ascii_lowercase()))
        } else {
            Err(InvalidFingerprint(s.to_string()))
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the server's host key is trusted for one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// The key must be listed in the local known-hosts files.
    KnownHosts,
    /// Only a key with exactly this fingerprint is accepted.
    Pinned(Fingerprint),
}

/// Read-only view of the OpenSSH known-hosts files.
#[derive(Debug, Clone, Default)]
pub struct KnownHostsStore {
    files: Vec<PathBuf>,
}

impl KnownHostsStore {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    /// `~/.ssh/known_hosts` and `~/.ssh/known_hosts2`.
    pub fn user_default() -> Self {
        let files = match home::home_dir() {
            Some(home) => {
                let ssh_dir = home.join(".ssh");
                vec![ssh_dir.join("known_hosts"), ssh_dir.join("known_hosts2")]
            }
            None => {
                warn!("Cannot determine home directory, known hosts unavailable");
                Vec::new()
            }
        };
        Self { files }
    }

    /// Missing files count as empty; unreadable ones are skipped with a warning.
    pub fn check(&self, session: &Session, host: &str, port: u16, key: &[u8]) -> CheckResult {
        let mut known_hosts = match session.known_hosts() {
            Ok(kh) => kh,
            Err(e) => {
                warn!("Cannot initialise known hosts: {}", e);
                return CheckResult::Failure;
            }
        };

        for file in self.files.iter().filter(|f| f.exists()) {
            match known_hosts.read_file(file, KnownHostFileKind::OpenSSH) {
                Ok(n) => debug!("loaded {} known host(s) from {}", n, file.display()),
                Err(e) => warn!("Skipping known hosts file {}: {}", file.display(), e),
            }
        }

        known_hosts.check_port(host, port, key)
    }
}

/// Checks the key offered during the handshake against `policy`.
pub fn verify(
    session: &Session,
    policy: &HostKeyPolicy,
    store: &KnownHostsStore,
    host: &str,
    port: u16,
) -> Result<(), ConnectError> {
    let (blob, key_type) = session.host_key().ok_or_else(|| ConnectError::NoHostKey {
        addr: format!("{}:{}", host, port),
    })?;
    let key_name = key_type_name(key_type);
    let offered = Fingerprint::of_key(blob);
    debug!("host key {} {}", key_name, offered);

    match policy {
        HostKeyPolicy::KnownHosts => {
            if is_trusted(store.check(session, host, port, blob), host) {
                Ok(())
            } else {
                Err(ConnectError::HostKeyUnverified {
                    key_type: key_name.to_string(),
                    fingerprint: offered,
                    host: host.to_string(),
                    port,
                })
            }
        }
        HostKeyPolicy::Pinned(expected) => check_pinned(expected, offered, host, port),
    }
}

/// Accepts only the pinned fingerprint. Both sides are normalised to lower case.
fn check_pinned(
    expected: &Fingerprint,
    offered: Fingerprint,
    host: &str,
    port: u16,
) -> Result<(), ConnectError> {
    if expected.as_str().eq_ignore_ascii_case(offered.as_str()) {
        return Ok(());
    }
    Err(ConnectError::HostKeyMismatch {
        expected: expected.clone(),
        offered,
        host: host.to_string(),
        port,
    })
}

fn is_trusted(result: CheckResult, host: &str) -> bool {
    match result {
        CheckResult::Match => true,
        CheckResult::Mismatch => {
            warn!("Host key for {} differs from the known hosts record", host);
            false
        }
        CheckResult::NotFound => false,
        CheckResult::Failure => {
            debug!("known hosts lookup for {} failed", host);
            false
        }
    }
}

pub fn key_type_name(key_type: HostKeyType) -> &'static str {
    match key_type {
        HostKeyType::Rsa => "ssh-rsa",
        HostKeyType::Dss => "ssh-dss",
        HostKeyType::Ecdsa256 => "ecdsa-sha2-nistp256",
        HostKeyType::Ecdsa384 => "ecdsa-sha2-nistp384",
        HostKeyType::Ecdsa521 => "ecdsa-sha2-nistp521",
        HostKeyType::Ed25519 => "ssh-ed25519",
        _ => "unknown",
    }
}
