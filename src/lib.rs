//! # multirepo - composite workspace manager
//!
//! `multirepo` manages a workspace of model definitions that lives either in
//! a single version-controlled store or in a composite of several stores
//! linked by declared dependencies.
//!
//! ## Features
//!
//! - **Layout migration**: Turn a single-store workspace into the composite
//!   layout without losing files
//! - **Manifest**: One `repositories.json` at the workspace root lists the
//!   stores, written atomically
//! - **Dependency resolution**: Clone the transitive closure of declared
//!   dependencies, in parallel, tolerating cycles and failed clones
//! - **Aggregate view**: Read every store as one; the earliest store in
//!   manifest order wins and writes go to the local store
//!
//! ## Layout
//!
//! ```text
//! workspace-root/
//!   repositories.json      manifest (composite layout only)
//!   workspace/             local store, always first in the manifest
//!   example.com_team_types/ cloned dependency
//! ```
//!
//! ## Architecture
//!
//! - [`domain`]: Store handles, the manifest, backend state
//! - [`application`]: Migration, resolution, backend registry, aggregate view
//! - [`infrastructure`]: Manifest persistence, locking, version control
//! - [`presentation`]: CLI
//! - [`common`]: Errors and result helpers
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use multirepo::application::use_cases::WorkspaceManager;
//! use multirepo::domain::entities::workspace_config::WorkspaceConfig;
//! use multirepo::domain::value_objects::remote_ref::RemoteRef;
//! use multirepo::infrastructure::scm::GitScm;
//!
//! # async fn example() -> multirepo::Result<()> {
//! let manager = WorkspaceManager::open(".", WorkspaceConfig::default(), Arc::new(GitScm::new())).await?;
//!
//! let types = RemoteRef::parse("https://example.com/team/types.git")?;
//! let handles = manager.handles_for(vec![types]).await?;
//! let result = manager.add_stores(handles).await?;
//!
//! for failed in result.resolution.failed() {
//!     println!("missing: {}", failed.reference);
//! }
//! println!("active backend: {}", manager.active_backend());
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use crate::common::error::MultiRepoError;
pub use crate::common::result::MultiRepoResult as Result;
