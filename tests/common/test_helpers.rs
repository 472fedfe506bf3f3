//! Workspace builders and filesystem snapshots

use multirepo::application::use_cases::WorkspaceManager;
use multirepo::domain::entities::workspace_config::WorkspaceConfig;
use multirepo::infrastructure::scm::VersionControl;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use walkdir::WalkDir;

/// A single-store workspace with a few model files and git metadata
pub fn single_store_workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write_file(root, "servicetemplates/app/ServiceTemplate.tosca", "<app/>");
    write_file(root, "nodetypes/web/NodeType.tosca", "<web/>");
    write_file(root, "README.md", "models");
    write_file(root, ".git/HEAD", "ref: refs/heads/main\n");
    write_file(root, ".git/objects/ab/cdef", "blob");

    temp_dir
}

pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Relative paths of every file under `root`, skipping the given top-level
/// names
pub fn file_set(root: &Path, skip: &[&str]) -> BTreeSet<String> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() != 1
                || !skip
                    .iter()
                    .any(|name| entry.file_name().to_str() == Some(*name))
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

pub fn test_config() -> WorkspaceConfig {
    WorkspaceConfig::default()
        .with_parallel_jobs(4)
        .with_clone_timeout(5)
}

pub async fn open_manager(root: &Path, scm: Arc<dyn VersionControl>) -> WorkspaceManager {
    WorkspaceManager::open(root, test_config(), scm).await.unwrap()
}
