use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Permission bits announced to the remote side on upload.
#[cfg(unix)]
pub fn scp_mode(metadata: &Metadata) -> i32 {
    use std::os::unix::fs::PermissionsExt;
    (metadata.permissions().mode() & 0o777) as i32
}

#[cfg(not(unix))]
pub fn scp_mode(_metadata: &Metadata) -> i32 {
    0o644
}

/// An existing local directory receives the file under its remote name.
pub fn download_target(local: &Path, remote_path: &str) -> PathBuf {
    if local.is_dir() {
        if let Some(name) = Path::new(remote_path).file_name() {
            return local.join(name);
        }
    }
    local.to_path_buf()
}
