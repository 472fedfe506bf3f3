pub mod manage_workspace;
pub mod resolve_dependencies;

pub use manage_workspace::{AddStoresResult, WorkspaceManager};
pub use resolve_dependencies::{
    ReferenceOutcome, ReferenceStatus, ResolutionReport, ResolveDependenciesUseCase,
};
