//! Application context: long-lived resources built once from configuration.

use std::sync::Arc;

use crate::config::Config;
use crate::db::ConnectionPool;
use crate::error::AppError;
use crate::integrations::{BitbucketClient, InformationSchemaReader, LegacySchemaSource, LlmClient};
use crate::services::{Collaborators, MigrationOrchestrator, PipelineSettings};
use crate::store::KnowledgeStore;

/// Root application context.
///
/// Owns the connection pool, the knowledge store over it and the external
/// clients. Cheap to clone.
#[derive(Clone)]
pub struct Context {
    pub config: Arc<Config>,
    pub pool: ConnectionPool,
    pub store: KnowledgeStore,
    pub source: Arc<BitbucketClient>,
    pub model: Arc<LlmClient>,
    /// Present when `[legacy_db]` is configured.
    pub legacy_schema: Option<Arc<InformationSchemaReader>>,
}

impl Context {
    /// Builds the context. No connection is opened until first use.
    pub fn from(config: Config) -> Result<Self, AppError> {
        tracing::debug!(
            pool_size = config.postgres.pool_size,
            dimension = config.vector.dimension,
            "Creating knowledge store"
        );
        let pool = ConnectionPool::connect(&config.postgres.uri, config.postgres.pool_size)?;
        let store = KnowledgeStore::postgres(pool.clone(), config.vector.dimension);

        let source = Arc::new(BitbucketClient::new(&config.source));
        let model = Arc::new(LlmClient::new(&config.llm)?);
        let legacy_schema = config
            .legacy_db
            .as_ref()
            .map(|db| Arc::new(InformationSchemaReader::new(db.uri.clone())));

        Ok(Self {
            config: Arc::new(config),
            pool,
            store,
            source,
            model,
            legacy_schema,
        })
    }

    /// The collaborators as the pipeline sees them.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            source: self.source.clone(),
            model: self.model.clone(),
            legacy_schema: self
                .legacy_schema
                .clone()
                .map(|reader| reader as Arc<dyn LegacySchemaSource>),
        }
    }

    /// An orchestrator wired to this context's store and clients.
    pub fn orchestrator(&self) -> MigrationOrchestrator {
        MigrationOrchestrator::new(
            PipelineSettings::from_config(&self.config),
            self.store.clone(),
            self.collaborators(),
        )
    }
}
