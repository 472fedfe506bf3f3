use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::common::error::MultiRepoError;
use crate::common::result::MultiRepoResult;
use crate::domain::entities::backend_state::BackendState;
use crate::infrastructure::filesystem::manifest_store::ManifestStore;

/// Owner of the live [`BackendState`].
///
/// Readers take a snapshot through [`BackendRegistry::current`]; only
/// [`BackendRegistry::reconfigure`] replaces it, and only with a state that
/// was fully built first.
pub struct BackendRegistry {
    state: RwLock<Arc<BackendState>>,
    manifest_store: ManifestStore,
}

impl BackendRegistry {
    pub fn new(initial: BackendState, manifest_store: ManifestStore) -> Self {
        Self {
            state: RwLock::new(Arc::new(initial)),
            manifest_store,
        }
    }

    /// Derive the initial state from the layout on disk
    pub async fn from_disk(
        workspace_root: &Path,
        manifest_store: ManifestStore,
    ) -> MultiRepoResult<Self> {
        let registry = Self::new(BackendState::single(workspace_root), manifest_store);
        registry.reconfigure(workspace_root).await?;
        Ok(registry)
    }

    /// Snapshot of the active state
    pub fn current(&self) -> Arc<BackendState> {
        let guard = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Re-derive the state from disk and install it.
    ///
    /// On failure the previous state stays active and `BackendUnavailable`
    /// is returned.
    pub async fn reconfigure(&self, workspace_root: &Path) -> MultiRepoResult<Arc<BackendState>> {
        let next = match self.build_state(workspace_root).await {
            Ok(state) => Arc::new(state),
            Err(e) => {
                tracing::warn!(
                    "Backend reconfiguration failed, keeping {}: {}",
                    self.current(),
                    e
                );
                return Err(e);
            }
        };

        {
            let mut guard = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            if **guard != *next {
                tracing::info!("Active backend: {}", next);
            }
            *guard = Arc::clone(&next);
        }

        Ok(next)
    }

    async fn build_state(&self, workspace_root: &Path) -> MultiRepoResult<BackendState> {
        if !workspace_root.is_dir() {
            return Err(MultiRepoError::backend_unavailable(format!(
                "workspace root {} is not a directory",
                workspace_root.display()
            )));
        }

        let manifest = self
            .manifest_store
            .load(workspace_root)
            .await
            .map_err(|e| MultiRepoError::backend_unavailable_with_source("cannot read manifest", e))?;

        let Some(manifest) = manifest else {
            return Ok(BackendState::single(workspace_root));
        };

        let Some(local_store) = manifest.local_store() else {
            return Err(MultiRepoError::backend_unavailable("manifest lists no stores"));
        };
        if !local_store.location().is_dir() {
            return Err(MultiRepoError::backend_unavailable(format!(
                "local store {} is missing",
                local_store.location().display()
            )));
        }

        for store in manifest.iter().skip(1) {
            if !store.location().is_dir() {
                tracing::warn!(
                    "Store {} is not materialized; its artifacts are unavailable",
                    store.location().display()
                );
            }
        }

        Ok(BackendState::composite(workspace_root, manifest))
    }
}
