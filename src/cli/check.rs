//! Connectivity self-test.

use std::fmt::Display;

use color_eyre::Result;

use crate::context::Context;
use crate::integrations::{CompletionRequest, LanguageModel, SourceFetcher};

use super::App;

/// Prints one probe line and reports whether it passed.
fn report_probe<T, E: Display>(
    name: &str,
    result: std::result::Result<T, E>,
    detail: impl FnOnce(T) -> String,
) -> bool {
    match result {
        Ok(value) => {
            println!("✓ {} - {}", name, detail(value));
            true
        }
        Err(e) => {
            println!("✗ {} - {}", name, e);
            false
        }
    }
}

impl App {
    /// Probe the source repository, the store, the completion endpoint and
    /// the legacy database. Fails when any probe fails.
    pub async fn run_check(&self) -> Result<()> {
        let config = self.load_config()?;
        let ctx = Context::from(config)?;
        let source = &ctx.config.source;

        println!("Testing connections...");
        println!("{}", "-".repeat(60));

        let mut passed = Vec::new();

        let tree = ctx
            .source
            .list_tree(&source.repo_slug, &source.branch, "")
            .await;
        passed.push(report_probe("Source repository", tree, |entries| {
            format!("found {} entries", entries.len())
        }));

        passed.push(report_probe("Knowledge store", ctx.pool.ping().await, |_| {
            "connected".to_string()
        }));

        let mut ping = CompletionRequest::new("Reply with OK.");
        ping.max_tokens = Some(5);
        passed.push(report_probe("LLM", ctx.model.complete(&ping).await, |_| {
            "connected".to_string()
        }));

        match &ctx.legacy_schema {
            Some(reader) => passed.push(report_probe("Legacy database", reader.ping().await, |_| {
                "connected".to_string()
            })),
            None => println!("- Legacy database - not configured"),
        }

        println!("{}", "-".repeat(60));

        let failed = passed.iter().filter(|ok| !**ok).count();
        if failed > 0 {
            return Err(color_eyre::eyre::eyre!(
                "{} of {} connection checks failed",
                failed,
                passed.len()
            ));
        }
        println!("Connection tests complete");
        Ok(())
    }
}
