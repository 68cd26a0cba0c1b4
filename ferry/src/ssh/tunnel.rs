//! Transfer tunnel: SFTP sub-channel multiplexed over the transport session

use super::error::{SshError, SshResult};
use crate::paths;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::FileAttributes;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const CHUNK_SIZE: usize = 64 * 1024;

pub(crate) enum TunnelState {
    Closed,
    Open(Tunnel),
}

/// Open SFTP channel, with an optional remembered remote working directory.
///
/// Relative remote paths resolve against the remembered directory when one
/// was set at open time. All transfer failures propagate unchanged; the
/// swallow-and-log policy belongs to the client layer above.
pub struct Tunnel {
    sftp: SftpSession,
    cwd: Option<String>,
}

impl Tunnel {
    pub(crate) fn new(sftp: SftpSession) -> Self {
        Self { sftp, cwd: None }
    }

    /// Remember `dir` as the remote working directory.
    ///
    /// A missing or non-directory path is logged with guidance and left
    /// unset; the tunnel stays usable at the host's default directory.
    pub(crate) async fn enter_dir(&mut self, dir: &str) {
        match self.sftp.metadata(dir.to_string()).await {
            Ok(attrs) if attrs.permissions.is_some_and(|p| p & 0o40000 != 0) => {
                tracing::debug!(dir = %dir, "remote working directory set");
                self.cwd = Some(dir.trim_end_matches('/').to_string());
            }
            Ok(_) => {
                let e = SshError::RemoteDirectory {
                    path: dir.to_string(),
                };
                tracing::warn!(error = %e, "{dir} is not a directory; check the path on the host");
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not enter {dir}; check that it exists on the host");
            }
        }
    }

    /// The remote working directory remembered at open time, if any.
    pub fn current_dir(&self) -> Option<&str> {
        self.cwd.as_deref()
    }

    fn resolve(&self, remote: &str) -> String {
        match &self.cwd {
            Some(cwd) if !remote.starts_with('/') => paths::join_remote(cwd, remote),
            _ => remote.to_string(),
        }
    }

    /// Upload a local file, returning the remote attributes post-transfer.
    pub async fn put_file(&self, local: &Path, remote: &str) -> SshResult<FileAttributes> {
        let remote = self.resolve(remote);

        let mut file = File::open(local).await.map_err(|e| {
            SshError::Transfer(format!("cannot open local file {}: {e}", local.display()))
        })?;

        let mut remote_file = self
            .sftp
            .create(remote.clone())
            .await
            .map_err(|e| SshError::Transfer(format!("failed to create remote file: {e}")))?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut transferred = 0u64;

        loop {
            let n = file.read(&mut buffer).await?;
            if n == 0 {
                break;
            }

            remote_file
                .write_all(&buffer[..n])
                .await
                .map_err(|e| SshError::Transfer(format!("failed to write to remote file: {e}")))?;

            transferred += n as u64;
        }

        remote_file
            .flush()
            .await
            .map_err(|e| SshError::Transfer(format!("failed to flush remote file: {e}")))?;
        remote_file
            .shutdown()
            .await
            .map_err(|e| SshError::Transfer(format!("failed to close remote file: {e}")))?;

        tracing::debug!(
            local = %local.display(),
            remote = %remote,
            size = transferred,
            "file uploaded"
        );

        self.stat(&remote).await
    }

    /// Upload an in-memory payload, returning the remote attributes
    /// post-transfer.
    pub async fn put_bytes(&self, bytes: &[u8], remote: &str) -> SshResult<FileAttributes> {
        let remote = self.resolve(remote);

        let mut remote_file = self
            .sftp
            .create(remote.clone())
            .await
            .map_err(|e| SshError::Transfer(format!("failed to create remote file: {e}")))?;

        remote_file
            .write_all(bytes)
            .await
            .map_err(|e| SshError::Transfer(format!("failed to write to remote file: {e}")))?;
        remote_file
            .flush()
            .await
            .map_err(|e| SshError::Transfer(format!("failed to flush remote file: {e}")))?;
        remote_file
            .shutdown()
            .await
            .map_err(|e| SshError::Transfer(format!("failed to close remote file: {e}")))?;

        tracing::debug!(remote = %remote, size = bytes.len(), "payload uploaded");

        self.stat(&remote).await
    }

    /// Download a remote file, returning the attributes of the remote source.
    pub async fn get_file(&self, remote: &str, local: &Path) -> SshResult<FileAttributes> {
        let remote = self.resolve(remote);

        let attrs = self.stat(&remote).await?;

        let mut remote_file = self
            .sftp
            .open(remote.clone())
            .await
            .map_err(|e| SshError::Transfer(format!("failed to open remote file: {e}")))?;

        let mut local_file = File::create(local).await.map_err(|e| {
            SshError::Transfer(format!("cannot create local file {}: {e}", local.display()))
        })?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut transferred = 0u64;

        loop {
            let n = remote_file
                .read(&mut buffer)
                .await
                .map_err(|e| SshError::Transfer(format!("failed to read remote file: {e}")))?;

            if n == 0 {
                break;
            }

            local_file.write_all(&buffer[..n]).await?;
            transferred += n as u64;
        }

        local_file.flush().await?;

        tracing::debug!(
            remote = %remote,
            local = %local.display(),
            size = transferred,
            "file downloaded"
        );

        Ok(attrs)
    }

    /// Download a remote file into memory.
    pub async fn get_bytes(&self, remote: &str) -> SshResult<Vec<u8>> {
        let remote = self.resolve(remote);

        let mut remote_file = self
            .sftp
            .open(remote.clone())
            .await
            .map_err(|e| SshError::Transfer(format!("failed to open remote file: {e}")))?;

        let mut bytes = Vec::new();
        remote_file
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| SshError::Transfer(format!("failed to read remote file: {e}")))?;

        tracing::debug!(remote = %remote, size = bytes.len(), "payload downloaded");

        Ok(bytes)
    }

    /// Remote attributes for a path.
    pub async fn stat(&self, remote: &str) -> SshResult<FileAttributes> {
        self.sftp
            .metadata(remote.to_string())
            .await
            .map_err(|e| SshError::Transfer(format!("failed to get remote attributes: {e}")))
    }

    /// Dropping the session closes the underlying channel.
    pub(crate) fn shutdown(self) {
        drop(self.sftp);
    }
}
