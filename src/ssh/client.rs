// SSH客户端封装
use crate::config::TransferConfig;
use crate::ssh::host_key::{self, HostKeyPolicy, KnownHostsStore};
use crate::transfer::progress::ProgressTracker;
use crate::transfer::{Connector, ScpSession};
use crate::utils::error::{ConnectError, TransferError};
use crate::utils::file;
use log::{debug, trace};
use ssh2::{Channel, Session};
use std::fs::File;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

const BUFFER_SIZE: usize = 32 * 1024;
const MS_PER_SEC: u32 = 1000;

/// Opens ssh2 sessions, trusting host keys through a [`KnownHostsStore`].
pub struct SshConnector {
    known_hosts: KnownHostsStore,
}

impl SshConnector {
    pub fn new(known_hosts: KnownHostsStore) -> Self {
        Self { known_hosts }
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new(KnownHostsStore::user_default())
    }
}

impl Connector for SshConnector {
    type Session = SshClient;

    fn connect(
        &self,
        config: &TransferConfig,
        policy: &HostKeyPolicy,
    ) -> Result<SshClient, ConnectError> {
        let addr = format!("{}:{}", config.host(), config.port());
        debug!("connect: {} timeout: {} sec.", addr, config.connect_timeout());

        let tcp = open_tcp(&addr, config.connect_timeout())?;

        let mut session = Session::new().map_err(|source| ConnectError::Handshake {
            addr: addr.clone(),
            source,
        })?;
        if config.connect_timeout() > 0 {
            session.set_timeout(config.connect_timeout().saturating_mul(MS_PER_SEC));
        }
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|source| ConnectError::Handshake {
            addr: addr.clone(),
            source,
        })?;

        // 握手之后即交给 SshClient，校验失败时由 Drop 断开连接
        let client = SshClient { session, addr };
        host_key::verify(
            &client.session,
            policy,
            &self.known_hosts,
            config.host(),
            config.port(),
        )?;
        Ok(client)
    }
}

fn open_tcp(addr: &str, timeout_secs: u32) -> Result<TcpStream, ConnectError> {
    let io_err = |source: io::Error| ConnectError::Io {
        addr: addr.to_string(),
        source,
    };

    if timeout_secs == 0 {
        return TcpStream::connect(addr).map_err(io_err);
    }

    let timeout = Duration::from_secs(u64::from(timeout_secs));
    let mut last_err = io::Error::new(io::ErrorKind::NotFound, "no address resolved");
    for sock_addr in addr.to_socket_addrs().map_err(io_err)? {
        match TcpStream::connect_timeout(&sock_addr, timeout) {
            Ok(tcp) => return Ok(tcp),
            Err(e) => last_err = e,
        }
    }
    Err(io_err(last_err))
}

/// An authenticated-or-not ssh2 session. Disconnects when dropped.
pub struct SshClient {
    session: Session,
    addr: String,
}

impl ScpSession for SshClient {
    fn authenticate(&mut self, username: &str, password: &str) -> Result<(), TransferError> {
        if let Err(e) = self.session.userauth_password(username, password) {
            debug!("password authentication for {} failed: {}", username, e);
        }

        if !self.session.authenticated() {
            return Err(TransferError::AuthenticationFailed {
                username: username.to_string(),
            });
        }
        Ok(())
    }

    fn upload(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        progress: &ProgressTracker,
    ) -> Result<u64, TransferError> {
        let local_err = |source: io::Error| TransferError::LocalFile {
            path: local_path.to_path_buf(),
            source,
        };
        let mut local_file = File::open(local_path).map_err(local_err)?;
        let metadata = local_file.metadata().map_err(local_err)?;
        let size = metadata.len();
        progress.set_total(size);

        trace!("scp send {} ({} bytes) -> {}", local_path.display(), size, remote_path);
        let mut channel = self
            .session
            .scp_send(Path::new(remote_path), file::scp_mode(&metadata), size, None)
            .map_err(|source| TransferError::Scp {
                path: remote_path.to_string(),
                source,
            })?;

        let transferred = copy_stream(&mut local_file, &mut channel, progress)?;
        close_channel(channel, remote_path)?;
        Ok(transferred)
    }

    fn download(
        &mut self,
        remote_path: &str,
        local_path: &Path,
        progress: &ProgressTracker,
    ) -> Result<u64, TransferError> {
        let (channel, stat) = self
            .session
            .scp_recv(Path::new(remote_path))
            .map_err(|source| TransferError::Scp {
                path: remote_path.to_string(),
                source,
            })?;
        let size = stat.size();
        progress.set_total(size);

        let target = file::download_target(local_path, remote_path);
        trace!("scp recv {} ({} bytes) -> {}", remote_path, size, target.display());

        // 只读取服务端声明的字节数
        let mut bounded = channel.take(size);
        let transferred = receive_file(&mut bounded, &target, progress)?;
        if let Err(e) = close_channel(bounded.into_inner(), remote_path) {
            remove_partial(&target);
            return Err(e);
        }
        Ok(transferred)
    }
}

impl Drop for SshClient {
    fn drop(&mut self) {
        if let Err(e) = self.session.disconnect(None, "closed by client", None) {
            debug!("disconnect from {}: {}", self.addr, e);
        }
    }
}

/// Writes the stream to `target`; a partially written file is removed on error.
fn receive_file<R: Read>(
    reader: &mut R,
    target: &Path,
    progress: &ProgressTracker,
) -> Result<u64, TransferError> {
    let mut local_file = File::create(target).map_err(|source| TransferError::LocalFile {
        path: target.to_path_buf(),
        source,
    })?;

    let result = copy_stream(reader, &mut local_file, progress)
        .and_then(|n| local_file.flush().map(|_| n).map_err(TransferError::from));
    if result.is_err() {
        drop(local_file);
        remove_partial(target);
    }
    result
}

fn remove_partial(target: &Path) {
    if let Err(e) = std::fs::remove_file(target) {
        debug!("cannot remove partial file {}: {}", target.display(), e);
    }
}

fn copy_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    progress: &ProgressTracker,
) -> Result<u64, TransferError> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        writer.write_all(&buffer[..bytes_read])?;
        total += bytes_read as u64;
        progress.add_bytes(bytes_read as u64);
    }

    Ok(total)
}

fn close_channel(mut channel: Channel, remote_path: &str) -> Result<(), TransferError> {
    let scp_err = |source: ssh2::Error| TransferError::Scp {
        path: remote_path.to_string(),
        source,
    };
    channel.send_eof().map_err(scp_err)?;
    channel.wait_eof().map_err(scp_err)?;
    channel.close().map_err(scp_err)?;
    channel.wait_close().map_err(scp_err)?;
    Ok(())
}
