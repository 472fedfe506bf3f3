//! Fake services for integration tests
//!
//! `FakeVersionControl` stands in for git: it materializes stores from an
//! in-memory catalogue and records every call.

use async_trait::async_trait;
use multirepo::domain::value_objects::remote_ref::RemoteRef;
use multirepo::infrastructure::scm::{CloneOptions, ScmError, VersionControl};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Contents of one remote in the catalogue
#[derive(Debug, Clone, Default)]
pub struct FakeRemote {
    /// Relative path and content of every file
    pub files: Vec<(String, String)>,
    /// Remote references the store declares in its own `repositories.json`
    pub dependencies: Vec<String>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.push((path.to_string(), content.to_string()));
        self
    }

    pub fn with_dependency(mut self, reference: &str) -> Self {
        self.dependencies.push(reference.to_string());
        self
    }
}

/// A clone request seen by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneCall {
    pub url: String,
    pub branch: Option<String>,
}

#[derive(Default)]
pub struct FakeVersionControl {
    catalogue: Mutex<HashMap<String, FakeRemote>>,
    failing: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<CloneCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn key(url: &str) -> String {
    RemoteRef::parse(url)
        .map(|r| r.normalized().to_string())
        .unwrap_or_else(|_| url.to_string())
}

impl FakeVersionControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a remote
    pub fn with_remote(self, url: &str, remote: FakeRemote) -> Self {
        self.catalogue.lock().unwrap().insert(key(url), remote);
        self
    }

    /// Make clones of `url` fail after leaving a partial checkout behind
    pub fn failing(self, url: &str) -> Self {
        self.failing.lock().unwrap().insert(key(url));
        self
    }

    /// Delay every clone
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<CloneCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clone_count(&self, url: &str) -> usize {
        let wanted = key(url);
        self.calls()
            .iter()
            .filter(|call| key(&call.url) == wanted)
            .count()
    }

    pub fn max_concurrent_clones(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn materialize(&self, url: &str, dest_path: &Path) -> Result<(), ScmError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let normalized = key(url);
        if self.failing.lock().unwrap().contains(&normalized) {
            std::fs::create_dir_all(dest_path.join(".git"))?;
            return Err(ScmError::clone_failed(format!("remote {} refused", url)));
        }

        let remote = self
            .catalogue
            .lock()
            .unwrap()
            .get(&normalized)
            .cloned()
            .ok_or_else(|| ScmError::clone_failed(format!("repository {} not found", url)))?;

        std::fs::create_dir_all(dest_path.join(".git"))?;
        std::fs::write(dest_path.join(".git/HEAD"), "ref: refs/heads/main\n")?;
        for (path, content) in &remote.files {
            let file = dest_path.join(path);
            if let Some(parent) = file.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(file, content)?;
        }

        if !remote.dependencies.is_empty() {
            let entries: Vec<serde_json::Value> = remote
                .dependencies
                .iter()
                .enumerate()
                .map(|(i, dep)| serde_json::json!({ "location": format!("dep{}", i), "remoteUrl": dep }))
                .collect();
            std::fs::write(
                dest_path.join("repositories.json"),
                serde_json::to_string_pretty(&entries).unwrap(),
            )?;
        }

        Ok(())
    }
}

#[async_trait]
impl VersionControl for FakeVersionControl {
    async fn clone_repository(
        &self,
        url: &str,
        dest_path: &Path,
        options: &CloneOptions,
    ) -> Result<(), ScmError> {
        self.calls.lock().unwrap().push(CloneCall {
            url: url.to_string(),
            branch: options.branch.clone(),
        });

        if dest_path.exists() {
            return Err(ScmError::DestinationExists {
                path: dest_path.display().to_string(),
            });
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let result = self.materialize(url, dest_path).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn remove_metadata(&self, path: &Path) -> Result<(), ScmError> {
        let metadata = path.join(".git");
        if metadata.is_dir() {
            std::fs::remove_dir_all(metadata)?;
        }
        Ok(())
    }

    fn is_repository(&self, path: &Path) -> bool {
        path.join(".git").exists()
    }
}
