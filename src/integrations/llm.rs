//! OpenAI-compatible completion and embedding client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Certificate, Client};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::config::{AuthType, LlmConfig};
use crate::error::AppError;
use crate::integrations::{CompletionRequest, LanguageModel};

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(300);
const EMBEDDING_TIMEOUT: Duration = Duration::from_secs(60);
const BATCH_EMBEDDING_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// Client for `/chat/completions` and `/embeddings`.
pub struct LlmClient {
    client: Client,
    base_url: String,
    embedding_url: String,
    model: String,
    embedding_model: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmClient {
    /// Builds the HTTP client with auth headers and TLS settings applied.
    pub fn new(config: &LlmConfig) -> Result<Self, AppError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let embedding_url = config
            .embedding_url
            .clone()
            .unwrap_or_else(|| format!("{}/embeddings", base_url));

        let mut builder = Client::builder().default_headers(default_headers(config)?);
        if !config.verify_ssl {
            tracing::warn!("TLS certificate verification disabled for {}", base_url);
            builder = builder.danger_accept_invalid_certs(true);
        } else if let Some(cert_path) = &config.cert_path {
            let pem = std::fs::read(cert_path)?;
            let cert = Certificate::from_pem(&pem)
                .map_err(|e| AppError::Llm(format!("Invalid certificate {}: {}", cert_path.display(), e)))?;
            builder = builder.add_root_certificate(cert);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            embedding_url,
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<T, AppError> {
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "<no body>".into());
            return Err(AppError::Llm(format!("{} returned {}: {}", url, status, error_text)));
        }

        Ok(response.json().await?)
    }
}

fn default_headers(config: &LlmConfig) -> Result<HeaderMap, AppError> {
    let invalid = |e: &dyn std::fmt::Display| AppError::Llm(format!("Invalid header: {}", e));

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    match config.auth_type {
        AuthType::Bearer => {
            let value = HeaderValue::from_str(&format!("Bearer {}", config.token)).map_err(|e| invalid(&e))?;
            headers.insert(AUTHORIZATION, value);
        }
        AuthType::ApiKey => {
            let value = HeaderValue::from_str(&config.token).map_err(|e| invalid(&e))?;
            headers.insert(HeaderName::from_static("api-key"), value);
        }
    }
    for (name, value) in &config.custom_headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(&e))?;
        let value = HeaderValue::from_str(value).map_err(|e| invalid(&e))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Restores input order when the server reports `index`.
fn ordered_embeddings(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
    if data.iter().all(|d| d.index.is_some()) {
        data.sort_by_key(|d| d.index);
    }
    data.into_iter().map(|d| d.embedding).collect()
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let body = json!({ "model": self.embedding_model, "input": text });
        debug!("Requesting embedding for {} chars", text.len());

        let result: EmbeddingResponse = self
            .post_json(&self.embedding_url, &body, EMBEDDING_TIMEOUT)
            .await?;
        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::Embedding("No embedding in response".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({ "model": self.embedding_model, "input": texts });
        debug!("Requesting embeddings for a batch of {} texts", texts.len());

        let result: EmbeddingResponse = self
            .post_json(&self.embedding_url, &body, BATCH_EMBEDDING_TIMEOUT)
            .await?;
        if result.data.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Embedding count mismatch: expected {}, got {}",
                texts.len(),
                result.data.len()
            )));
        }
        Ok(ordered_embeddings(result.data))
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": request.max_tokens.unwrap_or(self.max_tokens),
            "temperature": request.temperature.unwrap_or(self.temperature),
            "stream": false,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let result: ChatResponse = self.post_json(&url, &body, COMPLETION_TIMEOUT).await?;
        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::Llm("No choices in completion response".into()))
    }
}
