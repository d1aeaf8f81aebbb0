//! Bitbucket Cloud 2.0 source client.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;

use crate::config::SourceConfig;
use crate::error::AppError;
use crate::integrations::{EntryKind, SourceEntry, SourceFetcher};

/// One page of a `src` directory listing.
#[derive(Debug, Deserialize)]
struct SrcPage {
    #[serde(default)]
    values: Vec<SrcItem>,
    /// Absolute URL of the next page.
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SrcItem {
    #[serde(rename = "type")]
    item_type: String,
    path: String,
    #[serde(default)]
    size: u64,
}

/// Client for the repository `src` endpoints.
///
/// Sleeps for the configured delay after every request.
pub struct BitbucketClient {
    client: Client,
    base_url: String,
    workspace: String,
    token: String,
    delay: Duration,
}

impl BitbucketClient {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            workspace: config.workspace.clone(),
            token: config.token.clone(),
            delay: Duration::from_millis(config.rate_limit_delay_ms),
        }
    }

    fn src_url(&self, repo: &str, branch: &str, path: &str) -> String {
        format!(
            "{}/repositories/{}/{}/src/{}/{}",
            self.base_url, self.workspace, repo, branch, path
        )
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, AppError> {
        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        tokio::time::sleep(self.delay).await;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "<no body>".into());
            return Err(AppError::Fetch(format!("GET {} failed ({}): {}", url, status, body)));
        }
        Ok(response)
    }
}

#[async_trait]
impl SourceFetcher for BitbucketClient {
    async fn list_tree(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> Result<Vec<SourceEntry>, AppError> {
        let mut entries = Vec::new();
        let mut pending: VecDeque<String> = VecDeque::from([self.src_url(repo, branch, path)]);

        while let Some(url) = pending.pop_front() {
            let page: SrcPage = self.get(&url).await?.json().await?;

            for item in page.values {
                match item.item_type.as_str() {
                    "commit_file" => entries.push(SourceEntry {
                        path: item.path,
                        size: item.size,
                        kind: EntryKind::File,
                    }),
                    "commit_directory" => {
                        pending.push_back(self.src_url(repo, branch, &item.path));
                        entries.push(SourceEntry {
                            path: item.path,
                            size: 0,
                            kind: EntryKind::Dir,
                        });
                    }
                    other => tracing::debug!("Skipping tree item {} ({})", item.path, other),
                }
            }

            if let Some(next) = page.next {
                pending.push_front(next);
            }
        }

        tracing::debug!(repo, branch, entries = entries.len(), "Listed repository tree");
        Ok(entries)
    }

    async fn get_file(&self, repo: &str, path: &str, branch: &str) -> Result<String, AppError> {
        let url = self.src_url(repo, branch, path);
        Ok(self.get(&url).await?.text().await?)
    }
}
