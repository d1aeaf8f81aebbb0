//! Pipeline services on top of the knowledge store.
//!
//! - [`assemble_context`]: per-component generation context
//! - [`MigrationOrchestrator`]: stages 1-6

mod context;
mod orchestrator;

pub use context::{assemble_context, data_access_entity, MigrationContext, REQUIRED_METADATA_KEYS};
pub use orchestrator::{
    Collaborators, EmitTarget, MigrationOrchestrator, MigrationOutcome, MigrationSummary,
    PipelineSettings, StoreStats,
};
