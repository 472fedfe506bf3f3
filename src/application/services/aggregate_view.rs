use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use walkdir::WalkDir;

use super::backend_registry::BackendRegistry;
use crate::common::error::MultiRepoError;
use crate::common::result::MultiRepoResult;
use crate::domain::entities::store_handle::clean_path;
use crate::domain::entities::workspace_config::{WorkspaceConfig, VCS_METADATA_DIR};
use crate::domain::value_objects::artifact_id::ArtifactId;
use crate::infrastructure::filesystem::file_ops;

/// An artifact and the store that serves it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactEntry {
    pub id: ArtifactId,
    pub store_root: PathBuf,
    pub path: PathBuf,
}

/// The same artifact id found in more than one store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionWarning {
    pub id: ArtifactId,
    /// Store whose copy is served
    pub winner: PathBuf,
    /// Store whose copy is hidden
    pub shadowed: PathBuf,
}

/// Union of all artifacts across the active stores
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactListing {
    pub artifacts: Vec<ArtifactEntry>,
    pub collisions: Vec<CollisionWarning>,
}

/// One logical store over whatever backend is active.
///
/// Reads consult the stores in manifest order and the first hit wins.
/// Writes go to the writable store only.
pub struct AggregateView {
    registry: Arc<BackendRegistry>,
    config: WorkspaceConfig,
    warnings: Mutex<Vec<CollisionWarning>>,
}

impl AggregateView {
    pub fn new(registry: Arc<BackendRegistry>, config: WorkspaceConfig) -> Self {
        Self {
            registry,
            config,
            warnings: Mutex::new(Vec::new()),
        }
    }

    /// Every artifact, ordered by id, with the collisions found on the way
    pub async fn list_artifacts(&self) -> MultiRepoResult<ArtifactListing> {
        let state = self.registry.current();
        let roots: Vec<PathBuf> = state.store_roots().into_iter().map(Path::to_path_buf).collect();
        let excluded = self.excluded_top_level();

        let per_store = tokio::task::spawn_blocking(move || {
            roots
                .into_iter()
                .map(|root| {
                    let ids = scan_store(&root, &excluded);
                    (root, ids)
                })
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| MultiRepoError::internal_error_with_source("artifact scan failed", e))?;

        let mut winners: BTreeMap<ArtifactId, ArtifactEntry> = BTreeMap::new();
        let mut collisions = Vec::new();
        for (root, ids) in per_store {
            for id in ids {
                match winners.get(&id) {
                    Some(existing) => collisions.push(CollisionWarning {
                        id: id.clone(),
                        winner: existing.store_root.clone(),
                        shadowed: root.clone(),
                    }),
                    None => {
                        let path = id.resolve(&root);
                        winners.insert(
                            id.clone(),
                            ArtifactEntry {
                                id,
                                store_root: root.clone(),
                                path,
                            },
                        );
                    }
                }
            }
        }

        self.record(&collisions);
        Ok(ArtifactListing {
            artifacts: winners.into_values().collect(),
            collisions,
        })
    }

    /// Locate the copy of `id` that reads are served from
    pub async fn lookup(&self, id: &ArtifactId) -> MultiRepoResult<ArtifactEntry> {
        if self.is_excluded(id) {
            return Err(MultiRepoError::artifact_not_found(id.as_str()));
        }

        let state = self.registry.current();
        let mut found: Option<ArtifactEntry> = None;
        let mut collisions = Vec::new();

        for root in state.store_roots() {
            let path = id.resolve(root);
            if !is_file(&path).await {
                continue;
            }
            match &found {
                Some(winner) => collisions.push(CollisionWarning {
                    id: id.clone(),
                    winner: winner.store_root.clone(),
                    shadowed: root.to_path_buf(),
                }),
                None => {
                    found = Some(ArtifactEntry {
                        id: id.clone(),
                        store_root: root.to_path_buf(),
                        path,
                    })
                }
            }
        }

        self.record(&collisions);
        found.ok_or_else(|| MultiRepoError::artifact_not_found(id.as_str()))
    }

    pub async fn read(&self, id: &ArtifactId) -> MultiRepoResult<Vec<u8>> {
        let entry = self.lookup(id).await?;
        tokio::fs::read(&entry.path).await.map_err(|e| {
            MultiRepoError::filesystem_error_with_source("cannot read artifact", Some(entry.path), e)
        })
    }

    pub async fn exists(&self, id: &ArtifactId) -> bool {
        self.lookup(id).await.is_ok()
    }

    /// Write `content` as `id` into the writable store.
    ///
    /// `target`, when given, must name the writable store; anything else is
    /// rejected with `NotWritable`.
    pub async fn write(
        &self,
        id: &ArtifactId,
        content: Vec<u8>,
        target: Option<&Path>,
    ) -> MultiRepoResult<PathBuf> {
        let state = self.registry.current();
        let writable = state
            .writable_root()
            .map(Path::to_path_buf)
            .ok_or_else(|| MultiRepoError::backend_unavailable("no writable store"))?;

        if let Some(target) = target {
            if clean_path(target) != writable {
                return Err(MultiRepoError::not_writable(target, writable));
            }
        }

        let path = id.resolve(&writable);
        if self.is_excluded(id) {
            return Err(MultiRepoError::not_writable(path, writable));
        }

        let written = path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            file_ops::write_atomically(&path, &content)
        })
        .await
        .map_err(|e| MultiRepoError::internal_error_with_source("artifact write failed", e))?
        .map_err(|e| {
            MultiRepoError::filesystem_error_with_source(
                "cannot write artifact",
                Some(written.clone()),
                e,
            )
        })?;

        tracing::debug!("Wrote artifact {} to {}", id, written.display());
        Ok(written)
    }

    /// Drain the collision warnings gathered so far
    pub fn take_warnings(&self) -> Vec<CollisionWarning> {
        let mut warnings = self.warnings.lock().unwrap_or_else(|p| p.into_inner());
        std::mem::take(&mut *warnings)
    }

    fn record(&self, collisions: &[CollisionWarning]) {
        if collisions.is_empty() {
            return;
        }
        for collision in collisions {
            tracing::warn!(
                "Artifact {} in {} is shadowed by {}",
                collision.id,
                collision.shadowed.display(),
                collision.winner.display()
            );
        }
        let mut warnings = self.warnings.lock().unwrap_or_else(|p| p.into_inner());
        warnings.extend_from_slice(collisions);
    }

    fn excluded_top_level(&self) -> Vec<String> {
        vec![
            VCS_METADATA_DIR.to_string(),
            self.config.manifest_file_name.clone(),
            self.config.temp_manifest_file_name(),
            self.config.lock_file_name.clone(),
        ]
    }

    fn is_excluded(&self, id: &ArtifactId) -> bool {
        let first = id.as_str().split('/').next().unwrap_or_default();
        self.excluded_top_level().iter().any(|name| name == first)
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Artifact ids of every regular file under `root`
fn scan_store(root: &Path, excluded: &[String]) -> Vec<ArtifactId> {
    if !root.is_dir() {
        return Vec::new();
    }

    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() != 1
                || !excluded
                    .iter()
                    .any(|name| entry.file_name().to_str() == Some(name.as_str()))
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            ArtifactId::from_relative_path(relative).ok()
        })
        .collect()
}
