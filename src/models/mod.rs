//! Domain models shared by the stores, the pipeline and the emitters.
//!
//! Values returned from store queries are immutable snapshots; writing them
//! back requires an explicit store call.

mod component;
mod dependency;
mod kind;
mod log;
mod schema;

pub use component::{component_id, Component, ComponentNode, ComponentSummary, Metadata, SimilarComponent};
pub use dependency::{DependencyDescriptor, DependencyEdge, DEFAULT_STRENGTH, DEPENDS_ON, USES};
pub use kind::ComponentKind;
pub use log::{MigrationLogEntry, MigrationStatus, ReportRow};
pub use schema::{
    ColumnDef, IndexDef, ProcedureParameter, Relationship, StoredProcedure, TableSchema,
};
