use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::services::aggregate_view::AggregateView;
use crate::application::services::backend_registry::BackendRegistry;
use crate::application::services::layout_migrator::{LayoutMigrator, MigrationReport};
use crate::application::use_cases::resolve_dependencies::{
    derive_location, ResolutionReport, ResolveDependenciesUseCase,
};
use crate::common::error::MultiRepoError;
use crate::common::result::MultiRepoResult;
use crate::domain::entities::backend_state::BackendState;
use crate::domain::entities::manifest::Manifest;
use crate::domain::entities::store_handle::StoreHandle;
use crate::domain::entities::workspace_config::WorkspaceConfig;
use crate::domain::value_objects::remote_ref::RemoteRef;
use crate::infrastructure::filesystem::file_ops;
use crate::infrastructure::filesystem::manifest_store::ManifestStore;
use crate::infrastructure::scm::VersionControl;

/// Result of [`WorkspaceManager::add_stores`]
#[derive(Debug, Clone, Default)]
pub struct AddStoresResult {
    pub migration: MigrationReport,
    /// Handles appended to the manifest
    pub added: Vec<PathBuf>,
    /// Handles dropped because their location or remote was already listed
    pub skipped: Vec<PathBuf>,
    pub resolution: ResolutionReport,
}

/// Entry points for the rest of the application.
///
/// Callers that may run concurrently against one workspace must hold a
/// [`WorkspaceLock`](crate::infrastructure::filesystem::WorkspaceLock)
/// around the mutating calls.
pub struct WorkspaceManager {
    workspace_root: PathBuf,
    config: WorkspaceConfig,
    manifest_store: ManifestStore,
    migrator: LayoutMigrator,
    resolver: ResolveDependenciesUseCase,
    registry: Arc<BackendRegistry>,
}

impl WorkspaceManager {
    /// Open the workspace at `workspace_root` and derive its backend
    pub async fn open(
        workspace_root: impl Into<PathBuf>,
        config: WorkspaceConfig,
        scm: Arc<dyn VersionControl>,
    ) -> MultiRepoResult<Self> {
        config.check()?;
        let workspace_root = workspace_root.into();
        let manifest_store = ManifestStore::with_config(config.clone());
        let registry = BackendRegistry::from_disk(&workspace_root, manifest_store.clone()).await?;

        Ok(Self {
            migrator: LayoutMigrator::new(manifest_store.clone(), Arc::clone(&scm)),
            resolver: ResolveDependenciesUseCase::new(manifest_store.clone(), scm),
            registry: Arc::new(registry),
            manifest_store,
            workspace_root,
            config,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn registry(&self) -> Arc<BackendRegistry> {
        Arc::clone(&self.registry)
    }

    /// Read path over the active backend
    pub fn aggregate_view(&self) -> AggregateView {
        AggregateView::new(self.registry(), self.config.clone())
    }

    /// Stores of the workspace; empty in single-store layout
    pub async fn list_stores(&self) -> MultiRepoResult<Manifest> {
        Ok(self
            .manifest_store
            .load(&self.workspace_root)
            .await?
            .unwrap_or_default())
    }

    pub fn active_backend(&self) -> Arc<BackendState> {
        self.registry.current()
    }

    /// Migrate to the composite layout if needed and switch the backend
    pub async fn migrate(&self) -> MultiRepoResult<MigrationReport> {
        let report = self
            .migrator
            .ensure_composite_layout(&self.workspace_root, Vec::new())
            .await?;
        self.registry.reconfigure(&self.workspace_root).await?;
        Ok(report)
    }

    /// Add stores to the workspace and materialize them with their
    /// transitive dependencies.
    ///
    /// Migrates first when the workspace is still a single store. Handles
    /// whose location or remote is already listed are skipped. A new remote
    /// handle whose location is already occupied on disk fails the call
    /// before the manifest changes.
    pub async fn add_stores(&self, new_handles: Vec<StoreHandle>) -> MultiRepoResult<AddStoresResult> {
        let new_handles: Vec<StoreHandle> = new_handles
            .into_iter()
            .map(|h| h.rooted_at(&self.workspace_root))
            .collect();

        let migration = self
            .migrator
            .ensure_composite_layout(&self.workspace_root, Vec::new())
            .await?;

        let mut manifest = self.list_stores().await?;

        let occupied = new_handles.iter().find(|handle| {
            handle.remote_url().is_some()
                && !manifest.contains_location(handle.location())
                && file_ops::is_occupied(handle.location())
        });
        if let Some(handle) = occupied {
            let error = MultiRepoError::location_occupied(handle.location());
            tracing::warn!("Refusing to add {}: {}", handle.display_name(), error);
            self.registry.reconfigure(&self.workspace_root).await?;
            return Err(error);
        }

        let mut result = AddStoresResult {
            migration,
            ..AddStoresResult::default()
        };

        for handle in new_handles {
            let duplicate = manifest.contains_location(handle.location())
                || handle
                    .remote_url()
                    .is_some_and(|remote| manifest.contains_remote(remote));
            if duplicate {
                tracing::info!("Store {} is already listed", handle.display_name());
                result.skipped.push(handle.location().to_path_buf());
                continue;
            }
            result.added.push(handle.location().to_path_buf());
            manifest.push(handle)?;
        }

        if !result.added.is_empty() {
            self.manifest_store.save(&self.workspace_root, &manifest).await?;
        }

        let (_, resolution) = self
            .resolver
            .resolve_and_materialize(&self.workspace_root, manifest)
            .await?;
        result.resolution = resolution;

        self.registry.reconfigure(&self.workspace_root).await?;
        Ok(result)
    }

    /// Materialize whatever the manifest is missing
    pub async fn resolve(&self) -> MultiRepoResult<(Manifest, ResolutionReport)> {
        let manifest = self.list_stores().await?;
        if manifest.is_empty() {
            return Ok((manifest, ResolutionReport::new()));
        }

        let resolved = self
            .resolver
            .resolve_and_materialize(&self.workspace_root, manifest)
            .await?;
        self.registry.reconfigure(&self.workspace_root).await?;
        Ok(resolved)
    }

    /// Handles for remote references, each placed at a location that is
    /// neither listed nor present on disk
    pub async fn handles_for(&self, remotes: Vec<RemoteRef>) -> MultiRepoResult<Vec<StoreHandle>> {
        let manifest = self.list_stores().await?;
        let mut handles: Vec<StoreHandle> = Vec::new();

        for remote in remotes {
            if let Some(existing) = manifest.find_by_remote(&remote) {
                handles.push(existing.clone());
                continue;
            }
            let planned: Vec<&Path> = handles.iter().map(|h| h.location()).collect();
            let location =
                derive_location(&self.config, &self.workspace_root, &manifest, &remote, &planned);
            handles.push(StoreHandle::remote(location, remote));
        }

        Ok(handles)
    }
}
