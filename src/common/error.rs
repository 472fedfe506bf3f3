use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MultiRepoError {
    #[error("Manifest persistence failed: {message}")]
    Persistence {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Migration left {failed} entries behind in {workspace_root}")]
    MigrationPartialFailure {
        workspace_root: PathBuf,
        failed: usize,
    },

    #[error("Clone of '{reference}' failed: {message}")]
    CloneFailure { reference: String, message: String },

    #[error("Storage backend unavailable: {message}")]
    BackendUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Store '{target}' is not writable; writes go to {writable}")]
    NotWritable { target: PathBuf, writable: PathBuf },

    #[error("Artifact not found: {id}")]
    ArtifactNotFound { id: String },

    #[error("Invalid reference '{value}': {message}")]
    InvalidReference { value: String, message: String },

    #[error("Duplicate store location: {location}")]
    DuplicateLocation { location: PathBuf },

    #[error("Store location {location} is occupied by an unlisted directory")]
    LocationOccupied { location: PathBuf },

    #[error("File system operation failed: {message}")]
    FileSystem {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Workspace lock error: {message}")]
    Lock { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Operation timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl MultiRepoError {
    pub fn persistence_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Persistence {
            message: message.into(),
            path,
            source: Some(Box::new(source)),
        }
    }

    pub fn migration_partial_failure(workspace_root: impl Into<PathBuf>, failed: usize) -> Self {
        Self::MigrationPartialFailure {
            workspace_root: workspace_root.into(),
            failed,
        }
    }

    pub fn clone_failure(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CloneFailure {
            reference: reference.into(),
            message: message.into(),
        }
    }

    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
            source: None,
        }
    }

    pub fn backend_unavailable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn not_writable(target: impl Into<PathBuf>, writable: impl Into<PathBuf>) -> Self {
        Self::NotWritable {
            target: target.into(),
            writable: writable.into(),
        }
    }

    pub fn artifact_not_found(id: impl Into<String>) -> Self {
        Self::ArtifactNotFound { id: id.into() }
    }

    pub fn invalid_reference(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidReference {
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn filesystem_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            message: message.into(),
            path,
            source: Some(source),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn location_occupied(location: impl Into<PathBuf>) -> Self {
        Self::LocationOccupied {
            location: location.into(),
        }
    }

    pub fn timeout(timeout_secs: u64) -> Self {
        Self::Timeout { timeout_secs }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<std::io::Error> for MultiRepoError {
    fn from(error: std::io::Error) -> Self {
        Self::filesystem_error_with_source("File system operation failed", None, error)
    }
}
