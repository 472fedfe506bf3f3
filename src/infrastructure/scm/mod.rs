//! Version-control access.
//!
//! Stores are cloned through the [`VersionControl`] trait so the resolver can
//! run against a fake in tests.

pub mod git_scm;
pub mod scm_interface;

pub use git_scm::GitScm;
pub use scm_interface::{CloneOptions, ScmError, VersionControl};

#[cfg(test)]
pub use scm_interface::MockVersionControl;
