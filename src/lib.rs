//! migrant - legacy codebase migration agent
//!
//! Fetches a legacy source tree, records structural facts in a knowledge store
//! (vector similarity, dependency graph, legacy schema cache, migration log)
//! and generates target-stack code from the assembled context.

pub mod cli;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod generators;
pub mod integrations;
pub mod migrations;
pub mod models;
pub mod parsers;
pub mod services;
pub mod store;
