//! Append-only migration audit records.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ComponentKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MigrationStatus {
    Success,
    Failure,
}

impl MigrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStatus::Success => "SUCCESS",
            MigrationStatus::Failure => "FAILURE",
        }
    }
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(MigrationStatus::Success),
            "FAILURE" => Ok(MigrationStatus::Failure),
            _ => Err(format!("Invalid migration status '{}'", s)),
        }
    }
}

/// One attempted migration. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationLogEntry {
    pub component_id: String,
    pub component_type: ComponentKind,
    pub status: MigrationStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Generated source on success, `[CODE] message` on failure.
    pub output: String,
}

/// Count of log entries for one `(component_type, status)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub component_type: ComponentKind,
    pub status: MigrationStatus,
    pub count: i64,
}
