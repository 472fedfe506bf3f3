use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::common::error::MultiRepoError;
use crate::common::result::MultiRepoResult;
use crate::domain::entities::manifest::Manifest;
use crate::domain::entities::store_handle::StoreHandle;
use crate::domain::entities::workspace_config::VCS_METADATA_DIR;
use crate::infrastructure::filesystem::file_ops::{self, MoveFailure};
use crate::infrastructure::filesystem::manifest_store::ManifestStore;
use crate::infrastructure::scm::VersionControl;

/// What a migration run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// `false` when the workspace already was in composite layout
    pub performed: bool,

    /// Local store directory
    pub local_store: PathBuf,

    /// Root entries relocated into the local store
    pub moved: Vec<PathBuf>,

    /// Entries left behind
    pub failures: Vec<MoveFailure>,

    /// Whether leftover version-control metadata was removed from the root
    pub metadata_removed: bool,
}

impl MigrationReport {
    fn skipped(local_store: PathBuf) -> Self {
        Self {
            local_store,
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Turns a single-store workspace into the composite layout
pub struct LayoutMigrator {
    manifest_store: ManifestStore,
    scm: Arc<dyn VersionControl>,
}

impl LayoutMigrator {
    pub fn new(manifest_store: ManifestStore, scm: Arc<dyn VersionControl>) -> Self {
        Self { manifest_store, scm }
    }

    /// Whether `workspace_root` already is a composite workspace
    pub fn is_composite(&self, workspace_root: &Path) -> bool {
        self.manifest_store.exists(workspace_root)
    }

    /// Migrate `workspace_root` unless a manifest already exists.
    ///
    /// Every root entry except the reserved names moves into the local store
    /// directory. Move failures are collected and logged; the manifest, with
    /// the local store first and `initial_stores` after it, is written
    /// regardless. A manifest write failure is returned.
    pub async fn ensure_composite_layout(
        &self,
        workspace_root: &Path,
        initial_stores: Vec<StoreHandle>,
    ) -> MultiRepoResult<MigrationReport> {
        let config = self.manifest_store.config();
        let local_store = config.local_store_path(workspace_root);

        if self.is_composite(workspace_root) {
            tracing::debug!(
                "Workspace {} already in composite layout",
                workspace_root.display()
            );
            return Ok(MigrationReport::skipped(local_store));
        }

        tracing::info!(
            "Migrating {} to composite layout",
            workspace_root.display()
        );

        // An existing directory means an earlier run stopped part way
        tokio::fs::create_dir_all(&local_store).await.map_err(|e| {
            MultiRepoError::filesystem_error_with_source(
                "cannot create local store directory",
                Some(local_store.clone()),
                e,
            )
        })?;

        let mut report = MigrationReport {
            performed: true,
            local_store: local_store.clone(),
            ..MigrationReport::default()
        };

        let reserved = config.reserved_names();
        let mut entries = tokio::fs::read_dir(workspace_root).await.map_err(|e| {
            MultiRepoError::filesystem_error_with_source(
                "cannot list workspace root",
                Some(workspace_root.to_path_buf()),
                e,
            )
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if !reserved.iter().any(|r| name.to_str() == Some(r.as_str())) {
                names.push(name);
            }
        }
        names.sort();

        for name in names {
            let source = workspace_root.join(&name);
            let destination = local_store.join(&name);
            let failures =
                tokio::task::spawn_blocking(move || file_ops::move_entry(&source, &destination))
                    .await
                    .map_err(|e| MultiRepoError::internal_error_with_source("move task failed", e))?;

            if failures.is_empty() {
                report.moved.push(PathBuf::from(&name));
            } else {
                for failure in &failures {
                    tracing::warn!(
                        "Could not move {} into local store: {}",
                        failure.path.display(),
                        failure.message
                    );
                }
                report.failures.extend(failures);
            }
        }

        report.metadata_removed = self.remove_root_metadata(workspace_root, &local_store).await;

        let mut manifest = Manifest::new();
        manifest.push(StoreHandle::local(&local_store))?;
        for store in initial_stores {
            let store = store.rooted_at(workspace_root);
            if manifest.contains_location(store.location()) {
                tracing::debug!(
                    "Skipping initial store {}: location already listed",
                    store.location().display()
                );
                continue;
            }
            manifest.push(store)?;
        }
        self.manifest_store.save(workspace_root, &manifest).await?;

        if report.is_clean() {
            tracing::info!(
                "Migrated {} entries into {}",
                report.moved.len(),
                local_store.display()
            );
        } else {
            let error =
                MultiRepoError::migration_partial_failure(workspace_root, report.failures.len());
            tracing::warn!("{}", error);
        }

        Ok(report)
    }

    /// Drop version-control metadata still sitting in the root. It is only
    /// removed once the local store holds its own copy.
    async fn remove_root_metadata(&self, workspace_root: &Path, local_store: &Path) -> bool {
        if !workspace_root.join(VCS_METADATA_DIR).exists() {
            return false;
        }
        if !self.scm.is_repository(local_store) {
            tracing::warn!(
                "Keeping version-control metadata in {}: local store has none",
                workspace_root.display()
            );
            return false;
        }

        match self.scm.remove_metadata(workspace_root).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "Failed to remove version-control metadata from {}: {}",
                    workspace_root.display(),
                    e
                );
                false
            }
        }
    }
}
