pub mod file_ops;
pub mod manifest_store;
pub mod workspace_lock;

pub use manifest_store::{ManifestEntry, ManifestStore, ManifestStoreError};
pub use workspace_lock::{LockError, WorkspaceLock};
