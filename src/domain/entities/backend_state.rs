use std::fmt;
use std::path::{Path, PathBuf};

use super::manifest::Manifest;

/// Which storage backend serves reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendState {
    /// The workspace root is itself the only store
    SingleStore { path: PathBuf },

    /// The workspace root aggregates the stores listed in the manifest
    Composite {
        workspace_root: PathBuf,
        manifest: Manifest,
    },
}

impl BackendState {
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self::SingleStore { path: path.into() }
    }

    pub fn composite(workspace_root: impl Into<PathBuf>, manifest: Manifest) -> Self {
        Self::Composite {
            workspace_root: workspace_root.into(),
            manifest,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite { .. })
    }

    pub fn workspace_root(&self) -> &Path {
        match self {
            Self::SingleStore { path } => path,
            Self::Composite { workspace_root, .. } => workspace_root,
        }
    }

    /// Store roots in read precedence order
    pub fn store_roots(&self) -> Vec<&Path> {
        match self {
            Self::SingleStore { path } => vec![path.as_path()],
            Self::Composite { manifest, .. } => manifest.iter().map(|s| s.location()).collect(),
        }
    }

    /// Root that receives writes
    pub fn writable_root(&self) -> Option<&Path> {
        match self {
            Self::SingleStore { path } => Some(path),
            Self::Composite { manifest, .. } => manifest.local_store().map(|s| s.location()),
        }
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        match self {
            Self::SingleStore { .. } => None,
            Self::Composite { manifest, .. } => Some(manifest),
        }
    }
}

impl fmt::Display for BackendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleStore { path } => write!(f, "single store at {}", path.display()),
            Self::Composite {
                workspace_root,
                manifest,
            } => write!(
                f,
                "composite of {} stores at {}",
                manifest.len(),
                workspace_root.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::store_handle::StoreHandle;

    #[test]
    fn test_single_store_roots() {
        let state = BackendState::single("/ws");
        assert!(!state.is_composite());
        assert_eq!(state.store_roots(), vec![Path::new("/ws")]);
        assert_eq!(state.writable_root(), Some(Path::new("/ws")));
        assert_eq!(state.to_string(), "single store at /ws");
    }

    #[test]
    fn test_composite_roots_follow_manifest_order() {
        let manifest = Manifest::from_stores(vec![
            StoreHandle::local("/ws/workspace"),
            StoreHandle::local("/ws/shared"),
        ])
        .unwrap();
        let state = BackendState::composite("/ws", manifest);

        assert!(state.is_composite());
        assert_eq!(
            state.store_roots(),
            vec![Path::new("/ws/workspace"), Path::new("/ws/shared")]
        );
        assert_eq!(state.writable_root(), Some(Path::new("/ws/workspace")));
        assert_eq!(state.to_string(), "composite of 2 stores at /ws");
    }
}
