use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::common::error::MultiRepoError;

/// Artifact identifier errors
#[derive(Debug, Error, PartialEq)]
pub enum ArtifactIdError {
    #[error("Empty artifact id")]
    Empty,

    #[error("Artifact id must be relative: {0}")]
    Absolute(String),

    #[error("Artifact id escapes the store root: {0}")]
    Traversal(String),

    #[error("Artifact id contains an empty segment: {0}")]
    EmptySegment(String),
}

impl From<ArtifactIdError> for MultiRepoError {
    fn from(error: ArtifactIdError) -> Self {
        MultiRepoError::invalid_reference("artifact id", error.to_string())
    }
}

/// Logical identity of an artifact: a `/`-separated path relative to the
/// root of whichever store holds it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn new(value: &str) -> Result<Self, ArtifactIdError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ArtifactIdError::Empty);
        }
        if value.starts_with('/') || value.starts_with('\\') || Path::new(value).is_absolute() {
            return Err(ArtifactIdError::Absolute(value.to_string()));
        }

        let unified = value.replace('\\', "/");
        let mut segments = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" => return Err(ArtifactIdError::EmptySegment(value.to_string())),
                "." => continue,
                ".." => return Err(ArtifactIdError::Traversal(value.to_string())),
                other => segments.push(other),
            }
        }
        if segments.is_empty() {
            return Err(ArtifactIdError::Empty);
        }

        Ok(Self(segments.join("/")))
    }

    /// Build the id of a file found under `store_root`
    pub fn from_relative_path(relative: &Path) -> Result<Self, ArtifactIdError> {
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
                Component::CurDir => continue,
                _ => {
                    return Err(ArtifactIdError::Traversal(
                        relative.display().to_string(),
                    ))
                }
            }
        }
        Self::new(&segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of this artifact inside `store_root`
    pub fn resolve(&self, store_root: &Path) -> PathBuf {
        self.0
            .split('/')
            .fold(store_root.to_path_buf(), |path, segment| path.join(segment))
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = ArtifactIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ArtifactId::new(&value)
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.0
    }
}
