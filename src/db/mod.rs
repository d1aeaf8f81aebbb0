//! PostgreSQL plumbing shared by the stores and the schema migrations.
//!
//! - [`ConnectionPool`]: bounded pool with scoped acquire and autocommit helpers
//! - [`Row`]: JSON-valued result row with typed extraction
//! - [`PgVector`]: pgvector binary codec

mod pool;
mod row;
mod vector;

pub use pool::{ConnectionPool, PoolTransaction, SqlParam};
pub use row::{parse_pg_row, Row};
pub use vector::PgVector;
