use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::common::error::MultiRepoError;
use crate::domain::entities::workspace_config::WorkspaceConfig;

/// Errors from workspace locking
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock
    #[error("workspace at {} is locked by another process", path.display())]
    AlreadyLocked { path: PathBuf },

    #[error("failed to create lock file {}: {source}", path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to acquire lock: {0}")]
    AcquireFailed(#[source] std::io::Error),
}

impl From<LockError> for MultiRepoError {
    fn from(error: LockError) -> Self {
        MultiRepoError::Lock {
            message: error.to_string(),
        }
    }
}

/// Exclusive advisory lock on a workspace root.
///
/// Held by commands that mutate the layout or the manifest; released on drop.
/// Acquisition never blocks.
#[derive(Debug)]
pub struct WorkspaceLock {
    path: PathBuf,
    file: Option<File>,
}

impl WorkspaceLock {
    /// Acquire the lock file at `lock_path`
    pub fn acquire(lock_path: &Path) -> Result<Self, LockError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .map_err(|source| LockError::CreateFailed {
                path: lock_path.to_path_buf(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!("Acquired workspace lock {}", lock_path.display());
                Ok(Self {
                    path: lock_path.to_path_buf(),
                    file: Some(file),
                })
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                Err(LockError::AlreadyLocked {
                    path: lock_path.to_path_buf(),
                })
            }
            Err(e) => Err(LockError::AcquireFailed(e)),
        }
    }

    /// Acquire the lock of the workspace at `workspace_root`
    pub fn acquire_for(
        workspace_root: &Path,
        config: &WorkspaceConfig,
    ) -> Result<Self, LockError> {
        Self::acquire(&config.lock_path(workspace_root))
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release explicitly instead of waiting for drop
    pub fn release(mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock().map_err(LockError::AcquireFailed)?;
        }
        Ok(())
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".multirepo.lock");

        let lock = WorkspaceLock::acquire(&lock_path).unwrap();
        assert!(lock.is_held());
        assert!(lock_path.exists());
        lock.release().unwrap();

        let again = WorkspaceLock::acquire(&lock_path).unwrap();
        assert!(again.is_held());
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".multirepo.lock");

        let _lock = WorkspaceLock::acquire(&lock_path).unwrap();
        let second = WorkspaceLock::acquire(&lock_path);
        assert!(matches!(second, Err(LockError::AlreadyLocked { .. })));
    }

    #[test]
    fn test_drop_releases() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".multirepo.lock");

        {
            let _lock = WorkspaceLock::acquire(&lock_path).unwrap();
        }
        assert!(WorkspaceLock::acquire(&lock_path).is_ok());
    }
}
