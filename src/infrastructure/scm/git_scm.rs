use super::scm_interface::{CloneOptions, ScmError, VersionControl};
use crate::domain::entities::workspace_config::VCS_METADATA_DIR;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Git through the `git` executable
#[derive(Debug, Clone)]
pub struct GitScm {
    git_executable: String,
}

impl Default for GitScm {
    fn default() -> Self {
        Self {
            git_executable: "git".to_string(),
        }
    }
}

impl GitScm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom executable path
    pub fn with_executable(executable: impl Into<String>) -> Self {
        Self {
            git_executable: executable.into(),
        }
    }

    /// Check if the git executable is available
    pub async fn check_availability(&self) -> Result<(), ScmError> {
        let output = Command::new(&self.git_executable)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|_| ScmError::executable_not_found(&self.git_executable))?;

        if !output.status.success() {
            return Err(ScmError::executable_not_found(&self.git_executable));
        }

        Ok(())
    }

    async fn execute_git_command(
        &self,
        args: &[&str],
        working_dir: Option<&Path>,
    ) -> Result<std::process::Output, ScmError> {
        let mut cmd = Command::new(&self.git_executable);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // never wait on a credential prompt
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);

        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScmError::executable_not_found(&self.git_executable)
            } else {
                ScmError::from(e)
            }
        })
    }
}

#[async_trait]
impl VersionControl for GitScm {
    async fn clone_repository(
        &self,
        url: &str,
        dest_path: &Path,
        options: &CloneOptions,
    ) -> Result<(), ScmError> {
        if dest_path.exists() {
            return Err(ScmError::DestinationExists {
                path: dest_path.display().to_string(),
            });
        }

        let dest = dest_path.to_str().ok_or_else(|| ScmError::Internal {
            message: "Invalid destination path".to_string(),
        })?;

        let mut args = vec!["clone", "--quiet"];
        if let Some(branch) = &options.branch {
            args.push("--branch");
            args.push(branch);
        }
        args.push("--");
        args.push(url);
        args.push(dest);

        tracing::debug!("Running {} {}", self.git_executable, args.join(" "));
        let output = self.execute_git_command(&args, None).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScmError::command_failed(
                format!("{} clone {}", self.git_executable, url),
                output.status.code().unwrap_or(-1),
                stderr.trim(),
            ));
        }

        Ok(())
    }

    async fn remove_metadata(&self, path: &Path) -> Result<(), ScmError> {
        let metadata = path.join(VCS_METADATA_DIR);
        match tokio::fs::symlink_metadata(&metadata).await {
            Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(&metadata).await?,
            // worktrees and submodules use a `.git` file
            Ok(_) => tokio::fs::remove_file(&metadata).await?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn is_repository(&self, path: &Path) -> bool {
        path.join(VCS_METADATA_DIR).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_remove_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let git_dir = temp_dir.path().join(".git");
        std::fs::create_dir_all(git_dir.join("objects")).unwrap();

        let scm = GitScm::new();
        assert!(scm.is_repository(temp_dir.path()));
        scm.remove_metadata(temp_dir.path()).await.unwrap();
        assert!(!git_dir.exists());
        assert!(!scm.is_repository(temp_dir.path()));

        // idempotent
        scm.remove_metadata(temp_dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_clone_refuses_existing_destination() {
        let temp_dir = TempDir::new().unwrap();
        let scm = GitScm::new();

        let result = scm
            .clone_repository("https://example.com/a.git", temp_dir.path(), &CloneOptions::default())
            .await;
        assert!(matches!(result, Err(ScmError::DestinationExists { .. })));
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let temp_dir = TempDir::new().unwrap();
        let scm = GitScm::with_executable("definitely-not-a-git-binary");

        assert!(matches!(
            scm.check_availability().await,
            Err(ScmError::ExecutableNotFound { .. })
        ));
        let result = scm
            .clone_repository(
                "https://example.com/a.git",
                &temp_dir.path().join("dest"),
                &CloneOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(ScmError::ExecutableNotFound { .. })));
    }
}
