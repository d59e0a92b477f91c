//! Advisory locks on instance directories.
//!
//! A save holds `writelock`, a load holds `readlock`. Both are plain files
//! created exclusively in the instance directory and removed when the guard
//! drops. A write lock cannot be taken while either file exists; a read lock
//! cannot be taken while `writelock` exists.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{CorralError, CorralResult};
use crate::time::{Backoff, Deadline};

/// Name of the write lock file.
pub const WRITE_LOCK_FILE: &str = "writelock";

/// Name of the read lock file.
pub const READ_LOCK_FILE: &str = "readlock";

const INITIAL_BACKOFF: Duration = Duration::from_millis(50);
const MAX_BACKOFF: Duration = Duration::from_millis(500);

/// The two lock flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Read,
    Write,
}

impl LockKind {
    fn file_name(self) -> &'static str {
        match self {
            Self::Read => READ_LOCK_FILE,
            Self::Write => WRITE_LOCK_FILE,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }

    /// Lock files whose presence blocks this kind.
    fn blockers(self) -> &'static [&'static str] {
        match self {
            Self::Read => &[WRITE_LOCK_FILE],
            Self::Write => &[WRITE_LOCK_FILE, READ_LOCK_FILE],
        }
    }
}

/// A held lock. The lock file is removed on drop.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    kind: LockKind,
}

impl InstanceLock {
    /// Acquire a lock in `dir`, retrying with backoff until `timeout` passes.
    pub fn acquire(dir: &Path, kind: LockKind, timeout: Duration) -> CorralResult<Self> {
        let deadline = Deadline::after(timeout);
        let mut backoff = Backoff::new(INITIAL_BACKOFF, MAX_BACKOFF);

        loop {
            if let Some(lock) = Self::try_acquire(dir, kind)? {
                return Ok(lock);
            }
            if !backoff.sleep_within(&deadline) {
                return Err(CorralError::LockAcquireFailed {
                    kind: kind.label(),
                    path: dir.join(kind.file_name()),
                });
            }
        }
    }

    /// Make a single attempt. `Ok(None)` means the lock is held elsewhere.
    pub fn try_acquire(dir: &Path, kind: LockKind) -> CorralResult<Option<Self>> {
        let path = dir.join(kind.file_name());

        if kind == LockKind::Read && dir.join(WRITE_LOCK_FILE).exists() {
            return Ok(None);
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(None),
            Err(e) => return Err(CorralError::io(&path, e)),
        };
        let lock = Self { path, kind };

        // A reader may have slipped in between our check and create.
        let blocked = kind
            .blockers()
            .iter()
            .filter(|name| **name != kind.file_name())
            .any(|name| dir.join(name).exists());
        if blocked {
            return Ok(None);
        }

        let stamp = format!(
            "pid={}\ntime={}\n",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );
        file.write_all(stamp.as_bytes())
            .map_err(|e| CorralError::io(&lock.path, e))?;

        debug!(path = %lock.path.display(), kind = kind.label(), "Lock acquired");
        Ok(Some(lock))
    }

    pub fn kind(&self) -> LockKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to release lock");
            }
        }
    }
}
