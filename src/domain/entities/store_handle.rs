use std::path::{Component, Path, PathBuf};

use crate::domain::value_objects::remote_ref::RemoteRef;

/// Lexically clean a path: drop `.` components and fold `..` into the parent.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

/// One constituent store of a workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreHandle {
    /// Root directory of the store
    location: PathBuf,

    /// Where the store was (or will be) cloned from; `None` for local-only stores
    remote: Option<RemoteRef>,

    /// Remote references this store declares a dependency on
    dependencies: Vec<RemoteRef>,

    /// Optional display name
    name: Option<String>,

    /// Branch to clone, when not the remote default
    branch: Option<String>,
}

impl StoreHandle {
    /// A store that only exists locally
    pub fn local(location: impl AsRef<Path>) -> Self {
        Self {
            location: clean_path(location.as_ref()),
            remote: None,
            dependencies: Vec::new(),
            name: None,
            branch: None,
        }
    }

    /// A store backed by a remote
    pub fn remote(location: impl AsRef<Path>, remote: RemoteRef) -> Self {
        Self {
            remote: Some(remote),
            ..Self::local(location)
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<RemoteRef>) -> Self {
        self.dependencies = Vec::new();
        for dependency in dependencies {
            self.add_dependency(dependency);
        }
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Rebase a handle whose location is relative onto `root`
    pub fn rooted_at(mut self, root: &Path) -> Self {
        if self.location.is_relative() {
            self.location = clean_path(&root.join(&self.location));
        }
        self
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn remote_url(&self) -> Option<&RemoteRef> {
        self.remote.as_ref()
    }

    pub fn dependencies(&self) -> &[RemoteRef] {
        &self.dependencies
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Local-only stores are never deleted or overwritten by the resolver
    pub fn is_local_only(&self) -> bool {
        self.remote.is_none()
    }

    /// Record a declared dependency; returns `false` when already declared
    pub fn add_dependency(&mut self, dependency: RemoteRef) -> bool {
        if self.dependencies.contains(&dependency) {
            return false;
        }
        self.dependencies.push(dependency);
        true
    }

    /// Whether this store was cloned from `reference`
    pub fn is_backed_by(&self, reference: &RemoteRef) -> bool {
        self.remote.as_ref() == Some(reference)
    }

    /// Name shown to users: explicit name, else the directory name
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.location
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.location.display().to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(Path::new("/ws/./local")), PathBuf::from("/ws/local"));
        assert_eq!(clean_path(Path::new("/ws/a/../b")), PathBuf::from("/ws/b"));
        assert_eq!(clean_path(Path::new("./local")), PathBuf::from("local"));
    }

    #[test]
    fn test_local_handle() {
        let handle = StoreHandle::local("/ws/./workspace");
        assert_eq!(handle.location(), Path::new("/ws/workspace"));
        assert!(handle.is_local_only());
        assert!(handle.dependencies().is_empty());
        assert_eq!(handle.display_name(), "workspace");
    }

    #[test]
    fn test_dependencies_are_deduplicated_by_normalized_url() {
        let mut handle = StoreHandle::local("/ws/workspace").with_dependencies(vec![
            RemoteRef::parse("https://example.com/a.git").unwrap(),
            RemoteRef::parse("https://example.com/a").unwrap(),
        ]);
        assert_eq!(handle.dependencies().len(), 1);
        assert!(!handle.add_dependency(RemoteRef::parse("https://EXAMPLE.com/a/").unwrap()));
        assert!(handle.add_dependency(RemoteRef::parse("https://example.com/b").unwrap()));
        assert_eq!(handle.dependencies().len(), 2);
    }

    #[test]
    fn test_remote_handle() {
        let remote = RemoteRef::parse("git@example.com:team/types.git").unwrap();
        let handle = StoreHandle::remote("types", remote.clone())
            .with_branch("main")
            .with_name("Types")
            .rooted_at(Path::new("/ws"));

        assert_eq!(handle.location(), Path::new("/ws/types"));
        assert!(!handle.is_local_only());
        assert!(handle.is_backed_by(&RemoteRef::parse("ssh://git@example.com/team/types").unwrap()));
        assert_eq!(handle.branch(), Some("main"));
        assert_eq!(handle.display_name(), "Types");
    }
}
