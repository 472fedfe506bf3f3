use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::common::error::MultiRepoError;
use crate::common::result::MultiRepoResult;
use crate::domain::entities::manifest::{DeclaredDependency, Manifest};
use crate::domain::entities::store_handle::StoreHandle;
use crate::domain::entities::workspace_config::WorkspaceConfig;
use crate::domain::value_objects::remote_ref::RemoteRef;
use crate::infrastructure::filesystem::file_ops;
use crate::infrastructure::filesystem::manifest_store::ManifestStore;
use crate::infrastructure::scm::{CloneOptions, VersionControl};

/// What happened to one reference during resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReferenceStatus {
    Cloned { location: PathBuf },
    AlreadyPresent { location: PathBuf },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceOutcome {
    pub reference: String,
    #[serde(flatten)]
    pub status: ReferenceStatus,
}

/// Per-reference results of a resolution pass, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub outcomes: Vec<ReferenceOutcome>,
}

impl ResolutionReport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, reference: &RemoteRef, status: ReferenceStatus) {
        self.outcomes.push(ReferenceOutcome {
            reference: reference.as_str().to_string(),
            status,
        });
    }

    pub fn cloned(&self) -> Vec<&ReferenceOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ReferenceStatus::Cloned { .. }))
            .collect()
    }

    pub fn failed(&self) -> Vec<&ReferenceOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ReferenceStatus::Failed { .. }))
            .collect()
    }

    /// Whether every reachable reference is materialized
    pub fn is_complete(&self) -> bool {
        self.failed().is_empty()
    }
}

/// A clone to run: where it goes and what it comes from
#[derive(Debug, Clone)]
struct CloneJob {
    dependency: DeclaredDependency,
    destination: PathBuf,
}

/// Breadth-first materialization of the transitive dependency closure.
///
/// Clones of one BFS level run concurrently; their results are applied to
/// the manifest one at a time, in queue order, and the manifest is
/// persisted after every append.
pub struct ResolveDependenciesUseCase {
    manifest_store: ManifestStore,
    scm: Arc<dyn VersionControl>,
}

impl ResolveDependenciesUseCase {
    pub fn new(manifest_store: ManifestStore, scm: Arc<dyn VersionControl>) -> Self {
        Self {
            manifest_store,
            scm,
        }
    }

    fn config(&self) -> &WorkspaceConfig {
        self.manifest_store.config()
    }

    /// Clone every store that `manifest` needs but the disk lacks.
    ///
    /// Clone failures end up in the report; manifest persistence failures
    /// abort and are returned.
    pub async fn resolve_and_materialize(
        &self,
        workspace_root: &Path,
        mut manifest: Manifest,
    ) -> MultiRepoResult<(Manifest, ResolutionReport)> {
        let mut report = ResolutionReport::new();

        // Listed stores that stay missing are reported once, not again as
        // someone's dependency
        let mut visited: HashSet<RemoteRef> = self
            .materialize_listed(workspace_root, &mut manifest, &mut report)
            .await?;

        let mut level: Vec<DeclaredDependency> = Vec::new();
        for store in manifest.iter() {
            for dependency in self.declared_by(store).await {
                if !level.iter().any(|d| d.reference == dependency.reference) {
                    level.push(dependency);
                }
            }
        }

        let mut depth = 0usize;
        while !level.is_empty() {
            tracing::debug!("Resolving {} references at depth {}", level.len(), depth);

            let mut jobs: Vec<CloneJob> = Vec::new();
            for dependency in level.drain(..) {
                if !visited.insert(dependency.reference.clone()) {
                    continue;
                }
                if let Some(existing) = manifest.find_by_remote(&dependency.reference) {
                    tracing::debug!(
                        "{} already present at {}",
                        dependency.reference,
                        existing.location().display()
                    );
                    report.push(
                        &dependency.reference,
                        ReferenceStatus::AlreadyPresent {
                            location: existing.location().to_path_buf(),
                        },
                    );
                    continue;
                }

                let planned: Vec<&Path> = jobs.iter().map(|j| j.destination.as_path()).collect();
                let destination = self.derive_location(
                    workspace_root,
                    &manifest,
                    &dependency.reference,
                    &planned,
                );
                jobs.push(CloneJob {
                    dependency,
                    destination,
                });
            }

            let results = self.run_clones(&jobs).await;

            for (job, result) in jobs.into_iter().zip(results) {
                let reference = job.dependency.reference.clone();
                match result {
                    Ok(()) => {
                        let declared = self.read_declarations(&job.destination).await;
                        let mut handle = StoreHandle::remote(&job.destination, reference.clone())
                            .with_dependencies(declared.iter().map(|d| d.reference.clone()).collect());
                        if let Some(branch) = &job.dependency.branch {
                            handle = handle.with_branch(branch.clone());
                        }

                        manifest.push(handle)?;
                        self.manifest_store.save(workspace_root, &manifest).await?;
                        tracing::info!("Cloned {} into {}", reference, job.destination.display());

                        report.push(
                            &reference,
                            ReferenceStatus::Cloned {
                                location: job.destination,
                            },
                        );
                        level.extend(declared);
                    }
                    Err(reason) => {
                        let error = MultiRepoError::clone_failure(reference.as_str(), &reason);
                        tracing::warn!("{}", error);
                        report.push(&reference, ReferenceStatus::Failed { reason });
                    }
                }
            }

            depth += 1;
        }

        Ok((manifest, report))
    }

    /// Clone manifest handles that carry a remote but are missing on disk.
    /// Successful clones pick up the dependencies the store declares.
    ///
    /// Returns the references that failed. Their handles stay listed so the
    /// next pass retries them.
    async fn materialize_listed(
        &self,
        workspace_root: &Path,
        manifest: &mut Manifest,
        report: &mut ResolutionReport,
    ) -> MultiRepoResult<HashSet<RemoteRef>> {
        let jobs: Vec<CloneJob> = manifest
            .iter()
            .filter_map(|store| {
                let remote = store.remote_url()?;
                if file_ops::is_occupied(store.location()) {
                    return None;
                }
                Some(CloneJob {
                    dependency: DeclaredDependency::new(remote.clone())
                        .with_branch(store.branch().map(str::to_string)),
                    destination: store.location().to_path_buf(),
                })
            })
            .collect();

        let mut failed = HashSet::new();
        if jobs.is_empty() {
            return Ok(failed);
        }
        tracing::debug!("Materializing {} listed stores", jobs.len());

        let results = self.run_clones(&jobs).await;
        for (job, result) in jobs.into_iter().zip(results) {
            let reference = job.dependency.reference;
            match result {
                Ok(()) => {
                    let declared = self.read_declarations(&job.destination).await;
                    if let Some(handle) = manifest.find_by_location_mut(&job.destination) {
                        for dependency in declared {
                            handle.add_dependency(dependency.reference);
                        }
                    }
                    self.manifest_store.save(workspace_root, manifest).await?;
                    tracing::info!("Cloned {} into {}", reference, job.destination.display());
                    report.push(
                        &reference,
                        ReferenceStatus::Cloned {
                            location: job.destination,
                        },
                    );
                }
                Err(reason) => {
                    let error = MultiRepoError::clone_failure(reference.as_str(), &reason);
                    tracing::warn!("{}", error);
                    report.push(&reference, ReferenceStatus::Failed { reason });
                    failed.insert(reference);
                }
            }
        }

        Ok(failed)
    }

    /// Run `jobs` concurrently, bounded by the configured job count and
    /// clone timeout. Results come back in job order.
    async fn run_clones(&self, jobs: &[CloneJob]) -> Vec<Result<(), String>> {
        let semaphore = Arc::new(Semaphore::new(self.config().effective_parallel_jobs()));
        let timeout = Duration::from_secs(self.config().clone_timeout_secs);

        let tasks: Vec<_> = jobs
            .iter()
            .cloned()
            .map(|job| {
                let semaphore = Arc::clone(&semaphore);
                let scm = Arc::clone(&self.scm);

                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|e| format!("failed to acquire clone slot: {}", e))?;
                    clone_one(scm.as_ref(), &job, timeout).await
                })
            })
            .collect();

        join_all(tasks)
            .await
            .into_iter()
            .map(|joined| match joined {
                Ok(result) => result,
                Err(e) => Err(format!("clone task failed: {}", e)),
            })
            .collect()
    }

    /// Declared dependencies of a store: its manifest entry, then its own
    /// declaration file
    async fn declared_by(&self, store: &StoreHandle) -> Vec<DeclaredDependency> {
        let mut declared: Vec<DeclaredDependency> = store
            .dependencies()
            .iter()
            .cloned()
            .map(DeclaredDependency::new)
            .collect();

        for dependency in self.read_declarations(store.location()).await {
            if !declared.iter().any(|d| d.reference == dependency.reference) {
                declared.push(dependency);
            }
        }
        declared
    }

    async fn read_declarations(&self, store_root: &Path) -> Vec<DeclaredDependency> {
        match self.manifest_store.read_declarations(store_root).await {
            Ok(declared) => declared,
            Err(e) => {
                tracing::warn!(
                    "Ignoring dependency declarations of {}: {}",
                    store_root.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    fn derive_location(
        &self,
        workspace_root: &Path,
        manifest: &Manifest,
        reference: &RemoteRef,
        planned: &[&Path],
    ) -> PathBuf {
        derive_location(self.config(), workspace_root, manifest, reference, planned)
    }
}

/// Clone directory for `reference`: its derived name, suffixed with `-2`,
/// `-3`, ... while that name is reserved by the layout, listed in the
/// manifest, planned for another clone or already present on disk
pub fn derive_location(
    config: &WorkspaceConfig,
    workspace_root: &Path,
    manifest: &Manifest,
    reference: &RemoteRef,
    planned: &[&Path],
) -> PathBuf {
    let base = reference.directory_name();
    let reserved = config.reserved_names();

    let mut suffix = 1usize;
    loop {
        let name = if suffix == 1 {
            base.clone()
        } else {
            format!("{}-{}", base, suffix)
        };
        let candidate = workspace_root.join(&name);

        let taken = reserved.contains(&name)
            || manifest.contains_location(&candidate)
            || planned.contains(&candidate.as_path())
            || file_ops::is_occupied(&candidate);
        if !taken {
            return candidate;
        }
        suffix += 1;
    }
}

async fn clone_one(
    scm: &dyn VersionControl,
    job: &CloneJob,
    timeout: Duration,
) -> Result<(), String> {
    let destination = &job.destination;

    // Only paths this clone created are ever removed
    if tokio::fs::symlink_metadata(destination).await.is_ok() {
        return Err(format!("{} already exists", destination.display()));
    }

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
    }

    let options = CloneOptions::with_branch(job.dependency.branch.clone());
    let url = job.dependency.reference.as_str();
    let outcome = tokio::time::timeout(timeout, scm.clone_repository(url, destination, &options)).await;

    let reason = match outcome {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(e)) => e.to_string(),
        Err(_) => MultiRepoError::timeout(timeout.as_secs()).to_string(),
    };

    if let Err(e) = remove_blocking(destination.clone()).await {
        tracing::warn!(
            "Failed to remove partial clone {}: {}",
            destination.display(),
            e
        );
    }
    Err(reason)
}

async fn remove_blocking(path: PathBuf) -> std::io::Result<()> {
    tokio::task::spawn_blocking(move || file_ops::remove_path(&path))
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::scm::{MockVersionControl, ScmError};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn remote(url: &str) -> RemoteRef {
        RemoteRef::parse(url).unwrap()
    }

    fn seed(root: &Path, dependencies: Vec<RemoteRef>) -> Manifest {
        fs::create_dir_all(root.join("local")).unwrap();
        Manifest::from_stores(vec![
            StoreHandle::local(root.join("local")).with_dependencies(dependencies)
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_failed_clone_is_reported_and_cleaned_up() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();

        let mut scm = MockVersionControl::new();
        scm.expect_clone_repository().times(1).returning(|_, dest, _| {
            // partial checkout before the failure
            fs::create_dir_all(dest.join(".git")).unwrap();
            Err(ScmError::clone_failed("unreachable host"))
        });

        let use_case = ResolveDependenciesUseCase::new(ManifestStore::new(), Arc::new(scm));
        let (manifest, report) = use_case
            .resolve_and_materialize(&root, seed(&root, vec![remote("repoA")]))
            .await
            .unwrap();

        assert_eq!(manifest.len(), 1);
        assert!(!report.is_complete());
        assert_eq!(report.failed().len(), 1);
        assert!(!root.join("repoA").exists());
    }

    #[tokio::test]
    async fn test_no_dependencies_means_no_clones() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();

        let mut scm = MockVersionControl::new();
        scm.expect_clone_repository().times(0);

        let use_case = ResolveDependenciesUseCase::new(ManifestStore::new(), Arc::new(scm));
        let (manifest, report) = use_case
            .resolve_and_materialize(&root, seed(&root, vec![]))
            .await
            .unwrap();

        assert_eq!(manifest.len(), 1);
        assert!(report.outcomes.is_empty());
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_clone_declares_its_dependencies_and_branch() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();

        let mut scm = MockVersionControl::new();
        scm.expect_clone_repository()
            .returning(|url, dest, options| {
                fs::create_dir_all(dest).unwrap();
                if url == "repoA" {
                    assert_eq!(options.branch.as_deref(), None);
                    fs::write(
                        dest.join("repositories.json"),
                        r#"[{"location": "b", "remoteUrl": "repoB", "branch": "stable"}]"#,
                    )
                    .unwrap();
                } else {
                    assert_eq!(options.branch.as_deref(), Some("stable"));
                }
                Ok(())
            });

        let use_case = ResolveDependenciesUseCase::new(ManifestStore::new(), Arc::new(scm));
        let (manifest, report) = use_case
            .resolve_and_materialize(&root, seed(&root, vec![remote("repoA")]))
            .await
            .unwrap();

        assert_eq!(report.cloned().len(), 2);
        let locations: Vec<PathBuf> = manifest.iter().map(|s| s.location().to_path_buf()).collect();
        assert_eq!(
            locations,
            vec![root.join("local"), root.join("repoA"), root.join("repoB")]
        );
        assert_eq!(manifest.stores()[1].dependencies(), &[remote("repoB")]);
        assert_eq!(manifest.stores()[2].branch(), Some("stable"));

        let persisted = ManifestStore::new().load(&root).await.unwrap().unwrap();
        assert_eq!(persisted, manifest);
    }

    #[tokio::test]
    async fn test_derived_location_skips_taken_names() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        let manifest = Manifest::from_stores(vec![
            StoreHandle::local(root.join("workspace")),
            StoreHandle::local(root.join("repoA")),
        ])
        .unwrap();

        let use_case =
            ResolveDependenciesUseCase::new(ManifestStore::new(), Arc::new(MockVersionControl::new()));
        let planned_path = root.join("repoA-2");
        let location = use_case.derive_location(&root, &manifest, &remote("repoA"), &[&planned_path]);
        assert_eq!(location, root.join("repoA-3"));

        let reserved = use_case.derive_location(&root, &manifest, &remote("workspace"), &[]);
        assert_eq!(reserved, root.join("workspace-2"));
    }

    #[tokio::test]
    async fn test_clone_never_lands_on_an_unlisted_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        fs::create_dir_all(root.join("srv_notes")).unwrap();
        fs::write(root.join("srv_notes/todo.txt"), "mine").unwrap();

        let expected = root.join("srv_notes-2");
        let mut scm = MockVersionControl::new();
        scm.expect_clone_repository()
            .times(1)
            .withf(move |_, dest, _| dest == expected.as_path())
            .returning(|_, dest, _| {
                fs::create_dir_all(dest).unwrap();
                Ok(())
            });

        let use_case = ResolveDependenciesUseCase::new(ManifestStore::new(), Arc::new(scm));
        let (manifest, report) = use_case
            .resolve_and_materialize(&root, seed(&root, vec![remote("/srv/notes")]))
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(manifest.stores()[1].location(), root.join("srv_notes-2"));
        assert_eq!(fs::read_to_string(root.join("srv_notes/todo.txt")).unwrap(), "mine");
    }
}
