/// Infrastructure layer modules
///
/// Concrete implementations for external system interactions:
/// - Manifest persistence and file relocation
/// - Workspace locking
/// - Version-control access
pub mod filesystem;
pub mod scm;

pub use filesystem::{ManifestStore, WorkspaceLock};
pub use scm::{CloneOptions, GitScm, ScmError, VersionControl};
