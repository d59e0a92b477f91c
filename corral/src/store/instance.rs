//! Durable storage of instance definitions.
//!
//! Each instance lives in its own directory under the store root:
//!
//! ```text
//! <root>/<name>/
//!     internal.json
//!     resources.json
//!     app_conf.json
//!     snapshot/      configuration captured at build time
//!     generated/     configuration generated for the latest launch
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use super::lock::{InstanceLock, LockKind};
use crate::conf::{AggregateConf, ConfTree};
use crate::error::{CorralError, CorralResult};

pub const INTERNAL_FILE: &str = "internal.json";
pub const RESOURCES_FILE: &str = "resources.json";
pub const APP_CONF_FILE: &str = "app_conf.json";
pub const SNAPSHOT_DIR: &str = "snapshot";
pub const GENERATED_DIR: &str = "generated";

/// Default time to wait for an instance lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Store of instance directories under one root.
#[derive(Debug, Clone)]
pub struct InstanceStore {
    root: PathBuf,
    lock_timeout: Duration,
}

impl InstanceStore {
    /// Create a store rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Set how long lock acquisition may wait.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // =========================================================================
    // Paths
    // =========================================================================

    pub fn instance_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn snapshot_dir(&self, name: &str) -> PathBuf {
        self.instance_dir(name).join(SNAPSHOT_DIR)
    }

    pub fn generated_dir(&self, name: &str) -> PathBuf {
        self.instance_dir(name).join(GENERATED_DIR)
    }

    /// True if a durable directory exists for the instance.
    pub fn exists(&self, name: &str) -> bool {
        self.instance_dir(name).is_dir()
    }

    // =========================================================================
    // Lifecycle of the directory
    // =========================================================================

    /// Create the directory layout for a new instance.
    ///
    /// Fails with an instance-exists error if the directory is already there.
    pub fn create_instance_dir(&self, name: &str) -> CorralResult<PathBuf> {
        let dir = self.instance_dir(name);
        if dir.exists() {
            return Err(CorralError::InstanceExists(name.to_string()));
        }
        for path in [&dir, &self.snapshot_dir(name), &self.generated_dir(name)] {
            fs::create_dir_all(path).map_err(|e| CorralError::io(path, e))?;
        }
        debug!(instance = name, dir = %dir.display(), "Instance directory created");
        Ok(dir)
    }

    /// Delete the instance directory. Returns false if it was already absent.
    pub fn destroy(&self, name: &str) -> CorralResult<bool> {
        let dir = self.instance_dir(name);
        if !dir.exists() {
            info!(instance = name, "Application instance already destroyed");
            return Ok(false);
        }
        info!(instance = name, dir = %dir.display(), "Destroying application instance");
        fs::remove_dir_all(&dir).map_err(|e| CorralError::io(&dir, e))?;
        Ok(true)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Persist a definition while holding the write lock.
    ///
    /// Lock failures surface as [`CorralError::LockAcquireFailed`] so callers
    /// can decide whether they are fatal.
    pub fn save(&self, name: &str, definition: &AggregateConf) -> CorralResult<()> {
        let dir = self.instance_dir(name);
        fs::create_dir_all(&dir).map_err(|e| CorralError::io(&dir, e))?;

        let lock = InstanceLock::acquire(&dir, LockKind::Write, self.lock_timeout)?;
        self.save_locked(name, definition, &lock)
    }

    /// Take the write lock on an existing definition for a read-modify-write.
    ///
    /// Hold the returned guard across [`read_unlocked`](Self::read_unlocked)
    /// and [`save_locked`](Self::save_locked).
    pub fn lock_for_update(&self, name: &str) -> CorralResult<InstanceLock> {
        let dir = self.instance_dir(name);
        if !dir.join(INTERNAL_FILE).is_file() {
            return Err(CorralError::UnknownInstance(name.to_string()));
        }
        InstanceLock::acquire(&dir, LockKind::Write, self.lock_timeout)
    }

    /// Persist a definition under a write lock the caller already holds.
    pub fn save_locked(
        &self,
        name: &str,
        definition: &AggregateConf,
        lock: &InstanceLock,
    ) -> CorralResult<()> {
        let dir = self.instance_dir(name);
        if lock.kind() != LockKind::Write || lock.path().parent() != Some(dir.as_path()) {
            return Err(CorralError::Internal(format!(
                "Saving {} requires its write lock, held {}",
                name,
                lock.path().display()
            )));
        }
        write_tree(&dir.join(INTERNAL_FILE), definition.internal()?)?;
        write_tree(&dir.join(RESOURCES_FILE), definition.resources()?)?;
        write_tree(&dir.join(APP_CONF_FILE), definition.app_conf()?)?;

        debug!(instance = name, "Instance definition saved");
        Ok(())
    }

    /// Load the unresolved definition of an instance while holding the read lock.
    pub fn load(&self, name: &str) -> CorralResult<AggregateConf> {
        let dir = self.instance_dir(name);
        if !dir.join(INTERNAL_FILE).is_file() {
            return Err(CorralError::UnknownInstance(name.to_string()));
        }

        let _lock = InstanceLock::acquire(&dir, LockKind::Read, self.lock_timeout).map_err(
            |e| match e {
                CorralError::LockAcquireFailed { .. } => CorralError::BadClusterState(format!(
                    "Application instance {} is locked for reading: {}",
                    name, e
                )),
                other => other,
            },
        )?;

        self.read_unlocked(name)
    }

    /// Read the definition without taking any lock.
    ///
    /// Files are replaced atomically, so each tree is whole, but the three
    /// trees may come from different saves.
    pub fn read_unlocked(&self, name: &str) -> CorralResult<AggregateConf> {
        let dir = self.instance_dir(name);
        if !dir.join(INTERNAL_FILE).is_file() {
            return Err(CorralError::UnknownInstance(name.to_string()));
        }
        let internal = read_tree(name, &dir.join(INTERNAL_FILE))?;
        let resources = read_tree(name, &dir.join(RESOURCES_FILE))?;
        let app_conf = read_tree(name, &dir.join(APP_CONF_FILE))?;

        let mut definition = AggregateConf::from_trees(resources, app_conf, internal);
        definition.name = Some(name.to_string());
        Ok(definition)
    }
}

fn write_tree(path: &Path, tree: &ConfTree) -> CorralResult<()> {
    let json = tree.to_json()?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| CorralError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| CorralError::io(path, e))
}

fn read_tree(name: &str, path: &Path) -> CorralResult<ConfTree> {
    if !path.is_file() {
        return Err(CorralError::UnknownInstance(format!(
            "{} (missing {})",
            name,
            path.display()
        )));
    }
    ConfTree::load(path)
}

/// Recursively copy the contents of `src` into `dst`, creating `dst`.
pub fn copy_dir(src: &Path, dst: &Path) -> CorralResult<u64> {
    fs::create_dir_all(dst).map_err(|e| CorralError::io(dst, e))?;
    let mut copied = 0;
    for entry in fs::read_dir(src).map_err(|e| CorralError::io(src, e))? {
        let entry = entry.map_err(|e| CorralError::io(src, e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if from.is_dir() {
            copied += copy_dir(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| CorralError::io(&from, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}
