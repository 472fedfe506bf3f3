pub mod aggregate_view;
pub mod backend_registry;
pub mod layout_migrator;

pub use aggregate_view::{AggregateView, ArtifactEntry, ArtifactListing, CollisionWarning};
pub use backend_registry::BackendRegistry;
pub use layout_migrator::{LayoutMigrator, MigrationReport};
