use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::common::error::MultiRepoError;

/// Manifest file name in a composite workspace root
pub const DEFAULT_MANIFEST_FILE_NAME: &str = "repositories.json";

/// Directory the original single store is relocated into
pub const DEFAULT_LOCAL_STORE_NAME: &str = "workspace";

/// Advisory lock file held by mutating commands
pub const DEFAULT_LOCK_FILE_NAME: &str = ".multirepo.lock";

/// Version-control metadata directory
pub const VCS_METADATA_DIR: &str = ".git";

const DEFAULT_CLONE_TIMEOUT_SECS: u64 = 300;

/// Workspace layout names and resolver tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct WorkspaceConfig {
    /// Manifest file name at the workspace root
    #[validate(length(min = 1, max = 255))]
    pub manifest_file_name: String,

    /// Name of the local store directory created by migration
    #[validate(length(min = 1, max = 255))]
    pub local_store_name: String,

    /// Name of the workspace lock file
    #[validate(length(min = 1, max = 255))]
    pub lock_file_name: String,

    /// Upper bound for a single clone, in seconds
    #[validate(range(min = 1))]
    pub clone_timeout_secs: u64,

    /// Maximum number of clones running at once (CPU count when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 256))]
    pub parallel_jobs: Option<usize>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            manifest_file_name: DEFAULT_MANIFEST_FILE_NAME.to_string(),
            local_store_name: DEFAULT_LOCAL_STORE_NAME.to_string(),
            lock_file_name: DEFAULT_LOCK_FILE_NAME.to_string(),
            clone_timeout_secs: DEFAULT_CLONE_TIMEOUT_SECS,
            parallel_jobs: None,
        }
    }
}

impl WorkspaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clone_timeout(mut self, clone_timeout_secs: u64) -> Self {
        self.clone_timeout_secs = clone_timeout_secs;
        self
    }

    pub fn with_parallel_jobs(mut self, parallel_jobs: usize) -> Self {
        self.parallel_jobs = Some(parallel_jobs);
        self
    }

    pub fn with_local_store_name(mut self, name: impl Into<String>) -> Self {
        self.local_store_name = name.into();
        self
    }

    pub fn with_manifest_file_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_file_name = name.into();
        self
    }

    /// Validate field ranges
    pub fn check(&self) -> Result<(), MultiRepoError> {
        self.validate()
            .map_err(|e| MultiRepoError::config_error(format!("{}", e)))?;

        let names = [
            &self.manifest_file_name,
            &self.local_store_name,
            &self.lock_file_name,
        ];
        for name in names {
            if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
                return Err(MultiRepoError::config_error(format!(
                    "'{}' must be a plain file name",
                    name
                )));
            }
        }
        if self.local_store_name == self.manifest_file_name {
            return Err(MultiRepoError::config_error(
                "local store name collides with the manifest file name",
            ));
        }

        Ok(())
    }

    /// Effective clone parallelism
    pub fn effective_parallel_jobs(&self) -> usize {
        self.parallel_jobs.unwrap_or_else(num_cpus::get).max(1)
    }

    pub fn manifest_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.manifest_file_name)
    }

    /// Temporary file the manifest is written to before the rename
    pub fn temp_manifest_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(self.temp_manifest_file_name())
    }

    pub fn temp_manifest_file_name(&self) -> String {
        format!(".{}.tmp", self.manifest_file_name)
    }

    pub fn local_store_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.local_store_name)
    }

    pub fn lock_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.lock_file_name)
    }

    /// Root entries that belong to the composite layout itself and are never
    /// relocated or reused as clone targets
    pub fn reserved_names(&self) -> Vec<String> {
        vec![
            self.local_store_name.clone(),
            self.manifest_file_name.clone(),
            self.temp_manifest_file_name(),
            self.lock_file_name.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkspaceConfig::default();
        assert_eq!(config.manifest_file_name, "repositories.json");
        assert_eq!(config.local_store_name, "workspace");
        assert!(config.check().is_ok());
        assert!(config.effective_parallel_jobs() >= 1);
    }

    #[test]
    fn test_paths() {
        let config = WorkspaceConfig::default();
        let root = Path::new("/ws");
        assert_eq!(config.manifest_path(root), PathBuf::from("/ws/repositories.json"));
        assert_eq!(
            config.temp_manifest_path(root),
            PathBuf::from("/ws/.repositories.json.tmp")
        );
        assert_eq!(config.local_store_path(root), PathBuf::from("/ws/workspace"));
        assert!(config
            .reserved_names()
            .contains(&".multirepo.lock".to_string()));
    }

    #[test]
    fn test_invalid_configs() {
        assert!(WorkspaceConfig::default()
            .with_parallel_jobs(0)
            .check()
            .is_err());
        assert!(WorkspaceConfig::default()
            .with_clone_timeout(0)
            .check()
            .is_err());
        assert!(WorkspaceConfig::default()
            .with_local_store_name("a/b")
            .check()
            .is_err());
        assert!(WorkspaceConfig::default()
            .with_local_store_name("repositories.json")
            .check()
            .is_err());
    }
}
