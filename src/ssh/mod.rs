// SSH模块入口
pub mod client;
pub mod host_key;

pub use client::{SshClient, SshConnector};
pub use host_key::{Fingerprint, HostKeyPolicy, KnownHostsStore};
