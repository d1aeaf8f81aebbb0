//! Six-stage migration pipeline.
//!
//! Stages 1-4 (fetch, extract+store, schema extraction, guideline load) are
//! whole-batch: any error aborts the run. Stage 5 migrates components one by
//! one (or `concurrency` at a time) and isolates failures per component; each
//! attempt appends one row to the migration log. Stage 6 aggregates the log.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, error, info, warn};

use super::context::assemble_context;
use crate::config::{Config, MigrationConfig};
use crate::error::AppError;
use crate::generators::{AngularEmitter, CodeEmitter, GeneratedFile, JavaEmitter};
use crate::integrations::{
    fetch_code_files, group_columns, LanguageModel, LegacySchemaSource, SourceFetcher, SourceFile,
};
use crate::models::{
    component_id, Component, ComponentKind, ComponentNode, DependencyEdge, Metadata,
    MigrationLogEntry, MigrationStatus, ReportRow, USES,
};
use crate::parsers::{parse_guidelines, CSharpExtractor, ExtractedComponent, GuidelineSet, Guidelines};
use crate::store::KnowledgeStore;

/// Texts sent per embedding request.
const EMBED_BATCH_SIZE: usize = 16;

/// Where the pipeline reads from and what it migrates.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub repo: String,
    pub branch: String,
    pub path_pattern: String,
    pub migration: MigrationConfig,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            repo: config.source.repo_slug.clone(),
            branch: config.source.branch.clone(),
            path_pattern: config.source.path_pattern.clone(),
            migration: config.migration.clone(),
        }
    }
}

/// External collaborators the pipeline drives.
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn SourceFetcher>,
    pub model: Arc<dyn LanguageModel>,
    /// Stage 3 is skipped when absent.
    pub legacy_schema: Option<Arc<dyn LegacySchemaSource>>,
}

/// An emitter and the project root its files are written under.
#[derive(Clone)]
pub struct EmitTarget {
    pub emitter: Arc<dyn CodeEmitter>,
    pub root: PathBuf,
}

impl EmitTarget {
    pub fn new(emitter: impl CodeEmitter + 'static, root: impl Into<PathBuf>) -> Self {
        Self {
            emitter: Arc::new(emitter),
            root: root.into(),
        }
    }
}

/// Result of one stage-5 attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    pub component_id: String,
    pub name: String,
    pub kind: ComponentKind,
    pub status: MigrationStatus,
    /// Files written, absolute or relative to the working directory.
    pub files: Vec<PathBuf>,
    /// `[CODE] message` for failures.
    pub error: Option<String>,
}

/// Counts and outcomes of a full run.
#[derive(Debug, Clone, Default)]
pub struct MigrationSummary {
    pub files_fetched: usize,
    pub components_stored: usize,
    pub embeddings_reused: usize,
    pub tables_cached: usize,
    pub procedures_cached: usize,
    pub outcomes: Vec<MigrationOutcome>,
    /// Aggregated migration log, including earlier runs.
    pub report: Vec<ReportRow>,
}

impl MigrationSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == MigrationStatus::Success)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Stage 2 result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub stored: usize,
    pub embeddings_reused: usize,
}

/// Drives the pipeline over one knowledge store.
pub struct MigrationOrchestrator {
    settings: PipelineSettings,
    store: KnowledgeStore,
    collaborators: Collaborators,
    extractor: CSharpExtractor,
    targets: Vec<EmitTarget>,
}

impl MigrationOrchestrator {
    /// Creates an orchestrator emitting Java into the backend project and, when
    /// enabled, Angular into the frontend project.
    pub fn new(settings: PipelineSettings, store: KnowledgeStore, collaborators: Collaborators) -> Self {
        let mut targets = vec![EmitTarget::new(
            JavaEmitter::new(),
            settings.migration.backend.path.clone(),
        )];

        let frontend = &settings.migration.frontend;
        match (&frontend.path, frontend.enabled) {
            (Some(path), true) => targets.push(EmitTarget::new(AngularEmitter::new(), path.clone())),
            (None, true) => warn!("Frontend generation enabled without a frontend path, skipping"),
            _ => {}
        }

        Self {
            settings,
            store,
            collaborators,
            extractor: CSharpExtractor::new(),
            targets,
        }
    }

    /// Replaces the emit targets.
    pub fn with_targets(mut self, targets: Vec<EmitTarget>) -> Self {
        self.targets = targets;
        self
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Runs stages 1 through 6.
    pub async fn run(&self) -> Result<MigrationSummary, AppError> {
        info!("[1/6] Fetching source files");
        let files = self.fetch().await?;

        info!("[2/6] Extracting and storing {} components", files.len());
        let stats = self.extract_and_store(&files).await?;

        info!("[3/6] Extracting legacy schema");
        let (tables_cached, procedures_cached) = self.extract_schema().await?;

        info!("[4/6] Loading guidelines");
        let guidelines = self.load_guidelines().await?;

        info!("[5/6] Migrating components");
        let outcomes = self.migrate_all(&guidelines).await?;

        info!("[6/6] Building report");
        let report = self.report().await?;

        let summary = MigrationSummary {
            files_fetched: files.len(),
            components_stored: stats.stored,
            embeddings_reused: stats.embeddings_reused,
            tables_cached,
            procedures_cached,
            outcomes,
            report,
        };
        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "Migration run complete"
        );
        Ok(summary)
    }

    /// Stage 1.
    pub async fn fetch(&self) -> Result<Vec<SourceFile>, AppError> {
        fetch_code_files(
            self.collaborators.source.as_ref(),
            &self.settings.repo,
            &self.settings.branch,
            &self.settings.path_pattern,
        )
        .await
    }

    /// Stage 2: extracts every file, embeds it, and writes vector rows, graph
    /// nodes and `USES` edges.
    ///
    /// The whole batch is parsed first so dependency names resolve to the id
    /// of the fetched component declaring that class; unknown names get the id
    /// derived from the name itself and stay dangling.
    pub async fn extract_and_store(&self, files: &[SourceFile]) -> Result<StoreStats, AppError> {
        let extracted: Vec<(String, ExtractedComponent)> = files
            .iter()
            .map(|file| (component_id(&file.path), self.extractor.parse(&file.content, &file.path)))
            .collect();

        let mut ids_by_name: HashMap<&str, &str> = HashMap::new();
        for (id, facts) in &extracted {
            ids_by_name.entry(facts.name.as_str()).or_insert(id.as_str());
        }

        let mut components: Vec<Component> = files
            .iter()
            .zip(&extracted)
            .map(|(file, (id, facts))| Component {
                id: id.clone(),
                name: facts.name.clone(),
                kind: facts.kind,
                namespace: facts.namespace.clone(),
                file_path: file.path.clone(),
                code_content: file.content.clone(),
                embedding: Vec::new(),
                metadata: component_metadata(facts),
            })
            .collect();

        let embeddings_reused = self.fill_embeddings(&mut components).await?;

        for ((component, (_, facts)), file) in components.iter().zip(&extracted).zip(files) {
            self.store.vectors.add_code_vector(component).await?;
            self.store
                .graph
                .create_component_node(&ComponentNode {
                    id: component.id.clone(),
                    name: component.name.clone(),
                    kind: component.kind,
                    namespace: component.namespace.clone(),
                    file_path: component.file_path.clone(),
                    metadata: node_metadata(file),
                })
                .await?;

            for name in &facts.dependency_names {
                let to_id = ids_by_name
                    .get(name.as_str())
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| component_id(name));
                let mut edge = DependencyEdge::new(&component.id, to_id, USES);
                edge.metadata.insert("name".into(), JsonValue::String(name.clone()));
                self.store.graph.create_dependency(&edge).await?;
            }
            debug!(
                component = %component.name,
                kind = %component.kind,
                dependencies = facts.dependency_names.len(),
                "Stored component"
            );
        }

        Ok(StoreStats {
            stored: components.len(),
            embeddings_reused,
        })
    }

    /// Sets `embedding` on every component, reusing stored vectors for
    /// unchanged content when enabled. Returns the number reused.
    async fn fill_embeddings(&self, components: &mut [Component]) -> Result<usize, AppError> {
        let dimension = self.store.vectors.dimension();
        let mut pending: Vec<usize> = Vec::new();
        let mut reused = 0;

        for (index, component) in components.iter_mut().enumerate() {
            if self.settings.migration.reuse_embeddings {
                if let Some(stored) = self.store.vectors.get_component_by_id(&component.id).await? {
                    if stored.code_content == component.code_content
                        && stored.embedding.len() == dimension
                    {
                        debug!(component = %component.name, "Content unchanged, reusing embedding");
                        component.embedding = stored.embedding;
                        reused += 1;
                        continue;
                    }
                }
            }
            pending.push(index);
        }

        for chunk in pending.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = chunk
                .iter()
                .map(|&i| components[i].code_content.clone())
                .collect();
            let vectors = self.collaborators.model.embed_batch(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(AppError::Embedding(format!(
                    "requested {} embeddings, received {}",
                    texts.len(),
                    vectors.len()
                )));
            }
            for (&i, vector) in chunk.iter().zip(vectors) {
                components[i].embedding = vector;
            }
        }

        Ok(reused)
    }

    /// Stage 3. Returns `(tables, procedures)` written.
    pub async fn extract_schema(&self) -> Result<(usize, usize), AppError> {
        let Some(source) = &self.collaborators.legacy_schema else {
            warn!("No legacy database configured, skipping schema extraction");
            return Ok((0, 0));
        };

        let tables = group_columns(source.columns().await?);
        for table in &tables {
            self.store.schema.add_table_schema(table).await?;
        }

        let procedures = source.procedures().await?;
        for procedure in &procedures {
            self.store.schema.add_stored_procedure(procedure).await?;
        }

        info!(
            tables = tables.len(),
            procedures = procedures.len(),
            "Cached legacy schema"
        );
        Ok((tables.len(), procedures.len()))
    }

    /// Stage 4. Missing documents yield empty guidelines.
    pub async fn load_guidelines(&self) -> Result<GuidelineSet, AppError> {
        let migration = &self.settings.migration;
        let backend = read_guidelines(
            Some(migration.backend_guideline_path()).as_deref(),
            &migration.guideline_sections,
        )
        .await?;
        let frontend = read_guidelines(
            migration.frontend_guideline_path().as_deref(),
            &migration.guideline_sections,
        )
        .await?;

        info!(
            backend_sections = backend.sections.len(),
            frontend_sections = frontend.sections.len(),
            "Loaded guidelines"
        );
        Ok(GuidelineSet { backend, frontend })
    }

    /// Stage 5 over every stored component of a target kind.
    ///
    /// Only listing the components can fail; per-component errors are logged
    /// as `FAILURE` rows and returned as outcomes.
    pub async fn migrate_all(
        &self,
        guidelines: &GuidelineSet,
    ) -> Result<Vec<MigrationOutcome>, AppError> {
        let summaries = self
            .store
            .vectors
            .list_components(&self.settings.migration.target_kinds)
            .await?;
        info!(count = summaries.len(), "Components selected for migration");

        let models: Vec<String> = summaries
            .iter()
            .filter(|summary| summary.kind == ComponentKind::Model)
            .map(|summary| summary.name.clone())
            .collect();
        let models = models.as_slice();

        let outcomes = stream::iter(summaries)
            .map(|summary| async move {
                self.migrate_one(&summary.id, &summary.name, summary.kind, guidelines, models)
                    .await
            })
            .buffer_unordered(self.settings.migration.concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let failed = outcomes
            .iter()
            .filter(|o| o.status == MigrationStatus::Failure)
            .count();
        if failed > 0 {
            warn!(failed, total = outcomes.len(), "Some components failed to migrate");
        }
        Ok(outcomes)
    }

    /// Migrates the stored component fetched from `path`.
    ///
    /// The component must have been stored by an earlier run. Guidelines are
    /// reloaded; the attempt is logged like any stage-5 item.
    pub async fn migrate_component(&self, path: &str) -> Result<MigrationOutcome, AppError> {
        let id = component_id(path);
        let component = self
            .store
            .vectors
            .get_component_by_id(&id)
            .await?
            .ok_or_else(|| AppError::ComponentNotFound(path.to_string()))?;

        let guidelines = self.load_guidelines().await?;
        let models = self.migrated_models().await?;
        Ok(self
            .migrate_one(&component.id, &component.name, component.kind, &guidelines, &models)
            .await)
    }

    /// Stage 6.
    pub async fn report(&self) -> Result<Vec<ReportRow>, AppError> {
        Ok(self.store.log.report().await?)
    }

    /// Names of the stored models a full run would migrate.
    async fn migrated_models(&self) -> Result<Vec<String>, AppError> {
        if !self.settings.migration.target_kinds.contains(&ComponentKind::Model) {
            return Ok(Vec::new());
        }
        let models = self
            .store
            .vectors
            .list_components(&[ComponentKind::Model])
            .await?;
        Ok(models.into_iter().map(|summary| summary.name).collect())
    }

    async fn migrate_one(
        &self,
        id: &str,
        name: &str,
        kind: ComponentKind,
        guidelines: &GuidelineSet,
        models: &[String],
    ) -> MigrationOutcome {
        info!(component = name, %kind, "Migrating");
        let start_time = Utc::now();
        let result = self.generate_and_write(id, guidelines, models).await;
        let end_time = Utc::now();

        let (status, output, files, error_text) = match result {
            Ok((files, code)) => {
                info!(component = name, files = files.len(), "Migrated");
                (MigrationStatus::Success, code, files, None)
            }
            Err(e) => {
                let text = e.to_log_string();
                error!(component = name, "Migration failed: {}", text);
                (MigrationStatus::Failure, text.clone(), Vec::new(), Some(text))
            }
        };

        let entry = MigrationLogEntry {
            component_id: id.to_string(),
            component_type: kind,
            status,
            start_time,
            end_time,
            output,
        };
        if let Err(e) = self.store.log.append(&entry).await {
            error!(component = name, "Failed to record migration log entry: {}", e);
        }

        MigrationOutcome {
            component_id: id.to_string(),
            name: name.to_string(),
            kind,
            status,
            files,
            error: error_text,
        }
    }

    /// Generates every target's files, then writes them. Returns the written
    /// paths and the generated code as logged.
    async fn generate_and_write(
        &self,
        id: &str,
        guidelines: &GuidelineSet,
        models: &[String],
    ) -> Result<(Vec<PathBuf>, String), AppError> {
        let component = self
            .store
            .vectors
            .get_component_by_id(id)
            .await?
            .ok_or_else(|| AppError::ComponentNotFound(id.to_string()))?;

        let mut context = assemble_context(
            &self.store,
            &component,
            guidelines,
            &self.settings.migration.backend.package_base,
        )
        .await?;
        context.migrated_models = models.to_vec();

        let mut generated: Vec<(PathBuf, GeneratedFile)> = Vec::new();
        for target in &self.targets {
            let files = target.emitter.generate(&component, &context)?;
            debug!(
                component = %component.name,
                target = target.emitter.target(),
                files = files.len(),
                "Generated"
            );
            generated.extend(files.into_iter().map(|file| (target.root.join(&file.path), file)));
        }

        if generated.is_empty() {
            return Err(AppError::Generation(format!(
                "no target produced output for '{}'",
                component.name
            )));
        }

        let mut written = Vec::with_capacity(generated.len());
        let mut code = String::new();
        for (path, file) in &generated {
            write_file(path, &file.contents).await?;
            if !code.is_empty() {
                code.push('\n');
            }
            code.push_str(&format!("// {}\n{}", file.path.display(), file.contents));
            written.push(path.clone());
        }
        Ok((written, code))
    }
}

/// Component metadata as stored: the extractor's lists under fixed keys.
fn component_metadata(facts: &ExtractedComponent) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("methods".into(), json!(facts.methods));
    metadata.insert("properties".into(), json!(facts.properties));
    metadata.insert("dependencies".into(), json!(facts.dependency_names));
    metadata
}

fn node_metadata(file: &SourceFile) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("size".into(), json!(file.size));
    metadata
}

async fn read_guidelines(path: Option<&Path>, sections: &[String]) -> Result<Guidelines, AppError> {
    let Some(path) = path else {
        return Ok(Guidelines::default());
    };
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(parse_guidelines(&content, sections)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Guideline document {} not found", path.display());
            Ok(Guidelines::default())
        }
        Err(e) => Err(e.into()),
    }
}

async fn write_file(path: &Path, contents: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    debug!("Wrote {}", path.display());
    Ok(())
}
