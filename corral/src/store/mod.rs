//! Durable instance definitions and their advisory locks.

mod instance;
mod lock;

pub use instance::{
    copy_dir, InstanceStore, APP_CONF_FILE, DEFAULT_LOCK_TIMEOUT, GENERATED_DIR, INTERNAL_FILE,
    RESOURCES_FILE, SNAPSHOT_DIR,
};
pub use lock::{InstanceLock, LockKind, READ_LOCK_FILE, WRITE_LOCK_FILE};
