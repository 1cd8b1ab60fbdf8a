// 传输模块入口
pub mod progress;

use crate::config::{Direction, TransferConfig};
use crate::ssh::host_key::{Fingerprint, HostKeyPolicy};
use crate::utils::error::{ConnectError, TransferError};
use log::{debug, trace};
use progress::ProgressTracker;
use std::path::Path;

/// Opens a session to the remote endpoint of a transfer.
pub trait Connector {
    type Session: ScpSession;

    fn connect(
        &self,
        config: &TransferConfig,
        policy: &HostKeyPolicy,
    ) -> Result<Self::Session, ConnectError>;
}

/// A connected session offering the file-copy sub-protocol. Dropping it
/// releases the connection.
pub trait ScpSession {
    fn authenticate(&mut self, username: &str, password: &str) -> Result<(), TransferError>;

    fn upload(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        progress: &ProgressTracker,
    ) -> Result<u64, TransferError>;

    fn download(
        &mut self,
        remote_path: &str,
        local_path: &Path,
        progress: &ProgressTracker,
    ) -> Result<u64, TransferError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub direction: Direction,
    pub bytes: u64,
}

// 连接尝试: 先按 known_hosts 严格校验，失败后仅接受首次看到的指纹
#[derive(Debug)]
enum Attempt {
    Strict,
    Pinned(Fingerprint),
}

impl Attempt {
    fn policy(&self) -> HostKeyPolicy {
        match self {
            Attempt::Strict => HostKeyPolicy::KnownHosts,
            Attempt::Pinned(fp) => HostKeyPolicy::Pinned(fp.clone()),
        }
    }
}

/// Performs exactly one transfer over one session.
pub struct Runner<C> {
    connector: C,
    show_progress: bool,
}

impl<C: Connector> Runner<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            show_progress: false,
        }
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn run(&self, config: &TransferConfig) -> Result<Outcome, TransferError> {
        let mut session = self.open_session(config)?;

        trace!("auth: {}", config.username());
        session.authenticate(config.username(), config.password())?;

        let direction = config.direction();
        let progress = if self.show_progress {
            ProgressTracker::new(&config.to_string())
        } else {
            ProgressTracker::hidden()
        };

        let result = match direction {
            Direction::Download => session.download(
                &config.from().path,
                Path::new(&config.to().path),
                &progress,
            ),
            Direction::Upload => session.upload(
                Path::new(&config.from().path),
                &config.to().path,
                &progress,
            ),
        };

        match &result {
            Ok(_) => progress.finish(),
            Err(e) => progress.finish_with_error(&e.to_string()),
        }

        Ok(Outcome {
            direction,
            bytes: result?,
        })
    }

    fn open_session(&self, config: &TransferConfig) -> Result<C::Session, TransferError> {
        let mut attempt = Attempt::Strict;
        loop {
            match (self.connector.connect(config, &attempt.policy()), attempt) {
                (Ok(session), _) => return Ok(session),
                (Err(ConnectError::HostKeyUnverified { fingerprint, .. }), Attempt::Strict) => {
                    debug!("fingerprint: {}", fingerprint);
                    attempt = Attempt::Pinned(fingerprint);
                }
                (Err(e), _) => return Err(e.into()),
            }
        }
    }
}
