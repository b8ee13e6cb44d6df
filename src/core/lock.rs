/// Mutual exclusion between monitor invocations
///
/// cron can fire a new `botctl monitor` while the previous one is still in
/// its settle wait. The lock file carries an exclusive advisory lock (fs2)
/// for the lifetime of one invocation. The kernel drops the lock when the
/// process exits, so a crashed monitor never leaves a stale lock behind.

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Holder information written into the lock file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LockInfo {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Monitor already running (PID: {pid}, started: {started_at})")]
    AlreadyRunning { pid: u32, started_at: DateTime<Utc> },

    #[error("Monitor lock {0} is held by another process")]
    Held(PathBuf),

    #[error("Failed to acquire lock: {0}")]
    AcquireFailed(#[source] std::io::Error),

    #[error("Failed to create lock directory: {0}")]
    DirectoryCreationFailed(#[source] std::io::Error),
}

#[derive(Debug)]
pub struct MonitorLock {
    file: File,
    path: PathBuf,
    info: LockInfo,
}

impl MonitorLock {
    /// Take the lock without blocking
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let path = path.as_ref().to_path_buf();

        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(LockError::DirectoryCreationFailed)?;
            }
        }

        // Not truncated on open: the current holder's info must survive a failed attempt
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(LockError::AcquireFailed)?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                return Err(match read_info(&mut file) {
                    Some(info) => LockError::AlreadyRunning {
                        pid: info.pid,
                        started_at: info.started_at,
                    },
                    None => LockError::Held(path),
                });
            }
            return Err(LockError::AcquireFailed(e));
        }

        let info = LockInfo {
            pid: std::process::id(),
            started_at: Utc::now(),
        };

        let json = serde_json::to_string(&info)
            .map_err(|e| LockError::AcquireFailed(std::io::Error::other(e)))?;
        file.set_len(0).map_err(LockError::AcquireFailed)?;
        file.seek(SeekFrom::Start(0)).map_err(LockError::AcquireFailed)?;
        file.write_all(json.as_bytes()).map_err(LockError::AcquireFailed)?;
        file.flush().map_err(LockError::AcquireFailed)?;

        debug!("Monitor lock acquired at {} (PID: {})", path.display(), info.pid);

        Ok(Self { file, path, info })
    }

    pub fn info(&self) -> &LockInfo {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MonitorLock {
    fn drop(&mut self) {
        // The file stays on disk; removing it would let a waiter lock an orphaned inode
        if let Err(e) = self.file.unlock() {
            tracing::error!("Failed to release monitor lock: {}", e);
        } else {
            debug!("Monitor lock released at {}", self.path.display());
        }
    }
}

fn read_info(file: &mut File) -> Option<LockInfo> {
    let mut contents = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut contents).ok()?;
    serde_json::from_str(&contents).ok()
}
