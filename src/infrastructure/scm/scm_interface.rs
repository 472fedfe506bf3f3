use async_trait::async_trait;
use std::path::Path;

use crate::common::error::MultiRepoError;

/// Version-control operations the workspace needs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Clone `url` into `dest_path`, which must not exist yet
    async fn clone_repository(
        &self,
        url: &str,
        dest_path: &Path,
        options: &CloneOptions,
    ) -> Result<(), ScmError>;

    /// Remove version-control metadata from a directory that stops being a
    /// checkout. A directory without metadata is left alone.
    async fn remove_metadata(&self, path: &Path) -> Result<(), ScmError>;

    /// Whether `path` holds version-control metadata
    fn is_repository(&self, path: &Path) -> bool;
}

/// Options for cloning repositories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneOptions {
    /// Branch to check out instead of the remote default
    pub branch: Option<String>,
}

impl CloneOptions {
    pub fn with_branch(branch: Option<String>) -> Self {
        Self { branch }
    }
}

/// Errors that can occur during version-control operations
#[derive(Debug, thiserror::Error)]
pub enum ScmError {
    #[error("Clone operation failed: {message}")]
    CloneFailed { message: String },

    #[error("SCM executable not found: {executable}")]
    ExecutableNotFound { executable: String },

    #[error("Destination already exists: {path}")]
    DestinationExists { path: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Command execution failed: {command}, exit code: {exit_code}, stderr: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ScmError {
    pub fn clone_failed(message: impl Into<String>) -> Self {
        Self::CloneFailed {
            message: message.into(),
        }
    }

    pub fn executable_not_found(executable: impl Into<String>) -> Self {
        Self::ExecutableNotFound {
            executable: executable.into(),
        }
    }

    pub fn command_failed(
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }
}

impl From<ScmError> for MultiRepoError {
    fn from(error: ScmError) -> Self {
        match error {
            ScmError::IoError { source } => {
                MultiRepoError::filesystem_error_with_source("version control I/O failed", None, source)
            }
            other => MultiRepoError::internal_error(other.to_string()),
        }
    }
}
