//! Store schema migrations with version tracking.
//!
//! Migrations are:
//! - **Idempotent**: `IF NOT EXISTS` everywhere, safe to re-run after a failure
//! - **Forward-only**: no rollback support, add a compensating migration instead
//! - **Version-tracked**: current version stored in the `migrant_schema_version` table
//! - **Transactional**: each migration runs in its own transaction

mod m001_schema;
mod m002_indexes;
mod runner;
mod traits;

pub use m001_schema::M001Schema;
pub use m002_indexes::M002Indexes;
pub use runner::{run_migrations, MigrationResult};
pub use traits::{Migration, Register};

/// Creates the migration register for a store with the given embedding dimension.
pub fn create_register(dimension: usize) -> Register {
    Register::new()
        .register(M001Schema { dimension })
        .register(M002Indexes { dimension })
}
