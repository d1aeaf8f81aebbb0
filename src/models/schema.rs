//! Cached relational definitions from the legacy database.

use serde::{Deserialize, Serialize};

/// A column definition, in ordinal order within its table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    #[serde(default)]
    pub max_length: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

/// A foreign-key style link from one of this table's columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
}

/// A cached table definition keyed by `(schema_name, table_name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub schema_name: String,
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl TableSchema {
    /// Creates a table schema without indexes or relationships.
    pub fn new(schema_name: &str, table_name: &str, columns: Vec<ColumnDef>) -> Self {
        Self {
            schema_name: schema_name.to_string(),
            table_name: table_name.to_string(),
            columns,
            indexes: Vec::new(),
            relationships: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    /// IN, OUT or INOUT.
    pub mode: String,
}

/// A cached stored procedure keyed by `(schema_name, proc_name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProcedure {
    pub schema_name: String,
    pub proc_name: String,
    pub parameters: Vec<ProcedureParameter>,
    pub definition: Option<String>,
}
