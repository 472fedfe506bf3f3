use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;

use crate::common::error::MultiRepoError;
use crate::domain::entities::manifest::{DeclaredDependency, Manifest};
use crate::domain::entities::store_handle::StoreHandle;
use crate::domain::entities::workspace_config::WorkspaceConfig;
use crate::domain::value_objects::remote_ref::RemoteRef;

/// Manifest store related errors
#[derive(Debug, Error)]
pub enum ManifestStoreError {
    #[error("Manifest file read failed at {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest file write failed at {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing failed in {}: {source}", path.display())]
    JsonParsingFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization failed: {0}")]
    JsonSerializationFailed(#[source] serde_json::Error),

    #[error("Invalid manifest entry in {}: {message}", path.display())]
    InvalidEntry { path: PathBuf, message: String },
}

impl ManifestStoreError {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::ReadFailed { path, .. }
            | Self::WriteFailed { path, .. }
            | Self::JsonParsingFailed { path, .. }
            | Self::InvalidEntry { path, .. } => Some(path),
            Self::JsonSerializationFailed(_) => None,
        }
    }
}

impl From<ManifestStoreError> for MultiRepoError {
    fn from(error: ManifestStoreError) -> Self {
        let path = error.path().map(Path::to_path_buf);
        MultiRepoError::persistence_error_with_source(error.to_string(), path, error)
    }
}

/// One entry of the manifest file.
///
/// Unknown fields are ignored so older readers keep working when fields are
/// added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Store directory, relative to the workspace root
    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Reads and writes the manifest file at a workspace root.
///
/// Nothing is cached: every call goes to disk.
#[derive(Debug, Clone, Default)]
pub struct ManifestStore {
    config: WorkspaceConfig,
}

impl ManifestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WorkspaceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn manifest_path(&self, workspace_root: &Path) -> PathBuf {
        self.config.manifest_path(workspace_root)
    }

    /// Whether `workspace_root` is in composite layout
    pub fn exists(&self, workspace_root: &Path) -> bool {
        self.manifest_path(workspace_root).is_file()
    }

    /// Load the manifest; `None` means the workspace is a single store
    pub async fn load(
        &self,
        workspace_root: &Path,
    ) -> Result<Option<Manifest>, ManifestStoreError> {
        let manifest_path = self.manifest_path(workspace_root);

        let content = match async_fs::read_to_string(&manifest_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ManifestStoreError::ReadFailed {
                    path: manifest_path,
                    source,
                })
            }
        };

        let entries = Self::parse_entries(&manifest_path, &content)?;
        let manifest = Self::entries_to_manifest(&manifest_path, workspace_root, entries)?;
        Ok(Some(manifest))
    }

    /// Persist the manifest by writing a temporary file in the same
    /// directory and renaming it over the target
    pub async fn save(
        &self,
        workspace_root: &Path,
        manifest: &Manifest,
    ) -> Result<(), ManifestStoreError> {
        let manifest_path = self.manifest_path(workspace_root);
        let temp_path = self.config.temp_manifest_path(workspace_root);

        let entries: Vec<ManifestEntry> = manifest
            .iter()
            .map(|store| Self::store_to_entry(workspace_root, store))
            .collect();
        let mut json = serde_json::to_string_pretty(&entries)
            .map_err(ManifestStoreError::JsonSerializationFailed)?;
        json.push('\n');

        if let Err(source) = Self::write_and_sync(&temp_path, json.as_bytes()).await {
            let _ = async_fs::remove_file(&temp_path).await;
            return Err(ManifestStoreError::WriteFailed {
                path: temp_path,
                source,
            });
        }

        if let Err(source) = async_fs::rename(&temp_path, &manifest_path).await {
            let _ = async_fs::remove_file(&temp_path).await;
            return Err(ManifestStoreError::WriteFailed {
                path: manifest_path,
                source,
            });
        }

        tracing::debug!(
            "Persisted manifest with {} stores to {}",
            manifest.len(),
            manifest_path.display()
        );
        Ok(())
    }

    /// Dependencies a store declares in its own manifest-format file.
    ///
    /// Entries without a remote URL, and entries whose URL does not parse,
    /// are skipped.
    pub async fn read_declarations(
        &self,
        store_root: &Path,
    ) -> Result<Vec<DeclaredDependency>, ManifestStoreError> {
        let declaration_path = self.manifest_path(store_root);

        let content = match async_fs::read_to_string(&declaration_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ManifestStoreError::ReadFailed {
                    path: declaration_path,
                    source,
                })
            }
        };

        let entries = Self::parse_entries(&declaration_path, &content)?;
        let mut declarations: Vec<DeclaredDependency> = Vec::new();
        for entry in entries {
            let Some(url) = entry.remote_url else {
                continue;
            };
            match RemoteRef::parse(&url) {
                Ok(reference) => {
                    if !declarations.iter().any(|d| d.reference == reference) {
                        declarations
                            .push(DeclaredDependency::new(reference).with_branch(entry.branch));
                    }
                }
                Err(e) => tracing::warn!(
                    "Ignoring dependency '{}' declared in {}: {}",
                    url,
                    declaration_path.display(),
                    e
                ),
            }
        }

        Ok(declarations)
    }

    async fn write_and_sync(path: &Path, content: &[u8]) -> std::io::Result<()> {
        let mut file = async_fs::File::create(path).await?;
        file.write_all(content).await?;
        file.sync_all().await?;
        Ok(())
    }

    fn parse_entries(path: &Path, content: &str) -> Result<Vec<ManifestEntry>, ManifestStoreError> {
        serde_json::from_str(content).map_err(|source| ManifestStoreError::JsonParsingFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    fn entries_to_manifest(
        manifest_path: &Path,
        workspace_root: &Path,
        entries: Vec<ManifestEntry>,
    ) -> Result<Manifest, ManifestStoreError> {
        let invalid = |message: String| ManifestStoreError::InvalidEntry {
            path: manifest_path.to_path_buf(),
            message,
        };

        let mut manifest = Manifest::new();
        for entry in entries {
            if entry.location.trim().is_empty() {
                return Err(invalid("empty location".to_string()));
            }

            let mut handle = match &entry.remote_url {
                Some(url) => {
                    let remote = RemoteRef::parse(url)
                        .map_err(|e| invalid(format!("remoteUrl '{}': {}", url, e)))?;
                    StoreHandle::remote(&entry.location, remote)
                }
                None => StoreHandle::local(&entry.location),
            };

            let mut dependencies = Vec::new();
            for raw in entry.dependencies.unwrap_or_default() {
                let reference = RemoteRef::parse(&raw)
                    .map_err(|e| invalid(format!("dependency '{}': {}", raw, e)))?;
                dependencies.push(reference);
            }
            handle = handle.with_dependencies(dependencies);

            if let Some(name) = entry.name {
                handle = handle.with_name(name);
            }
            if let Some(branch) = entry.branch {
                handle = handle.with_branch(branch);
            }

            manifest
                .push(handle.rooted_at(workspace_root))
                .map_err(|e| invalid(e.to_string()))?;
        }

        Ok(manifest)
    }

    fn store_to_entry(workspace_root: &Path, store: &StoreHandle) -> ManifestEntry {
        let dependencies: Vec<String> = store
            .dependencies()
            .iter()
            .map(|d| d.as_str().to_string())
            .collect();

        ManifestEntry {
            location: relative_location(workspace_root, store.location()),
            remote_url: store.remote_url().map(|r| r.as_str().to_string()),
            dependencies: if dependencies.is_empty() {
                None
            } else {
                Some(dependencies)
            },
            name: store.name().map(str::to_string),
            branch: store.branch().map(str::to_string),
        }
    }
}

/// `location` relative to `workspace_root`, with `/` separators
fn relative_location(workspace_root: &Path, location: &Path) -> String {
    let Some(relative) = pathdiff::diff_paths(location, workspace_root) else {
        return location.display().to_string();
    };

    let segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();

    if segments.is_empty() {
        ".".to_string()
    } else {
        segments.join("/")
    }
}
