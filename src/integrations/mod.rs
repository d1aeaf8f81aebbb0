//! External collaborators consumed by the pipeline.
//!
//! Each collaborator is an object-safe trait so tests can substitute fakes:
//! - [`SourceFetcher`]: repository tree walk and file download ([`BitbucketClient`])
//! - [`LanguageModel`]: embeddings and chat completions ([`LlmClient`])
//! - [`LegacySchemaSource`]: information-schema reader ([`InformationSchemaReader`])

mod bitbucket;
mod legacy_db;
mod llm;
mod source;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use bitbucket::BitbucketClient;
pub use legacy_db::{group_columns, InformationSchemaReader, LegacyColumn};
pub use llm::LlmClient;
pub use source::{fetch_code_files, path_matcher};

use crate::error::AppError;
use crate::models::StoredProcedure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry of a repository tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub path: String,
    pub size: u64,
    pub kind: EntryKind,
}

/// A fetched source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
    pub size: u64,
}

/// Read access to the legacy source repository.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Recursively lists every entry below `path` on `branch`.
    async fn list_tree(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> Result<Vec<SourceEntry>, AppError>;

    /// Downloads one file as text.
    async fn get_file(&self, repo: &str, path: &str, branch: &str) -> Result<String, AppError>;
}

/// Parameters of one chat completion.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    /// Falls back to the client's configured limit.
    pub max_tokens: Option<u32>,
    /// Falls back to the client's configured temperature.
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

/// Completion and embedding endpoint.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;

    /// One vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError>;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError>;
}

/// Read-only view of the legacy relational database.
#[async_trait]
pub trait LegacySchemaSource: Send + Sync {
    /// Base-table columns ordered by schema, table and ordinal position.
    async fn columns(&self) -> Result<Vec<LegacyColumn>, AppError>;

    /// Stored procedures with parameters and definitions.
    async fn procedures(&self) -> Result<Vec<StoredProcedure>, AppError>;
}
