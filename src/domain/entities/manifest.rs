use std::path::Path;

use super::store_handle::{clean_path, StoreHandle};
use crate::common::error::MultiRepoError;
use crate::domain::value_objects::remote_ref::RemoteRef;

/// A dependency declared inside a store, with the branch to clone if given
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub reference: RemoteRef,
    pub branch: Option<String>,
}

impl DeclaredDependency {
    pub fn new(reference: RemoteRef) -> Self {
        Self {
            reference,
            branch: None,
        }
    }

    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }
}

/// Ordered list of the stores that make up a composite workspace.
///
/// Insertion order is clone order; the first entry is the writable local
/// store. Locations are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    stores: Vec<StoreHandle>,
}

impl Manifest {
    pub fn new() -> Self {
        Self { stores: Vec::new() }
    }

    /// Build a manifest, rejecting duplicate locations
    pub fn from_stores(stores: Vec<StoreHandle>) -> Result<Self, MultiRepoError> {
        let mut manifest = Self::new();
        for store in stores {
            manifest.push(store)?;
        }
        Ok(manifest)
    }

    /// Append a store at the end of the manifest
    pub fn push(&mut self, store: StoreHandle) -> Result<(), MultiRepoError> {
        if self.contains_location(store.location()) {
            return Err(MultiRepoError::DuplicateLocation {
                location: store.location().to_path_buf(),
            });
        }
        self.stores.push(store);
        Ok(())
    }

    pub fn stores(&self) -> &[StoreHandle] {
        &self.stores
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StoreHandle> {
        self.stores.iter()
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// The writable store (manifest index 0)
    pub fn local_store(&self) -> Option<&StoreHandle> {
        self.stores.first()
    }

    pub fn contains_location(&self, location: &Path) -> bool {
        self.find_by_location(location).is_some()
    }

    pub fn find_by_location(&self, location: &Path) -> Option<&StoreHandle> {
        let location = clean_path(location);
        self.stores.iter().find(|s| s.location() == location)
    }

    pub fn find_by_location_mut(&mut self, location: &Path) -> Option<&mut StoreHandle> {
        let location = clean_path(location);
        self.stores.iter_mut().find(|s| s.location() == location)
    }

    /// Store cloned from `reference`, compared by normalized URL
    pub fn find_by_remote(&self, reference: &RemoteRef) -> Option<&StoreHandle> {
        self.stores.iter().find(|s| s.is_backed_by(reference))
    }

    pub fn contains_remote(&self, reference: &RemoteRef) -> bool {
        self.find_by_remote(reference).is_some()
    }

    /// Every dependency declared by any store, in manifest order, first
    /// occurrence only
    pub fn declared_dependencies(&self) -> Vec<RemoteRef> {
        let mut seen = Vec::new();
        for dependency in self.stores.iter().flat_map(|s| s.dependencies()) {
            if !seen.contains(dependency) {
                seen.push(dependency.clone());
            }
        }
        seen
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a StoreHandle;
    type IntoIter = std::slice::Iter<'a, StoreHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.stores.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(url: &str) -> RemoteRef {
        RemoteRef::parse(url).unwrap()
    }

    #[test]
    fn test_push_rejects_duplicate_location() {
        let mut manifest = Manifest::new();
        manifest.push(StoreHandle::local("/ws/workspace")).unwrap();

        let result = manifest.push(StoreHandle::local("/ws/./workspace"));
        assert!(matches!(
            result,
            Err(MultiRepoError::DuplicateLocation { .. })
        ));
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_lookup_by_remote_uses_normalized_url() {
        let manifest = Manifest::from_stores(vec![
            StoreHandle::local("/ws/workspace"),
            StoreHandle::remote("/ws/types", remote("https://example.com/types.git")),
        ])
        .unwrap();

        assert!(manifest.contains_remote(&remote("https://example.com/types/")));
        assert!(!manifest.contains_remote(&remote("https://example.com/other")));
        assert_eq!(
            manifest.local_store().map(|s| s.location()),
            Some(Path::new("/ws/workspace"))
        );
    }

    #[test]
    fn test_declared_dependencies_keep_manifest_order() {
        let manifest = Manifest::from_stores(vec![
            StoreHandle::local("/ws/workspace").with_dependencies(vec![remote("repoA"), remote("repoB")]),
            StoreHandle::remote("/ws/repoA", remote("repoA")).with_dependencies(vec![remote("repoB"), remote("repoC")]),
        ])
        .unwrap();

        let names: Vec<_> = manifest
            .declared_dependencies()
            .iter()
            .map(|d| d.normalized().to_string())
            .collect();
        assert_eq!(names, vec!["repoA", "repoB", "repoC"]);
    }
}
