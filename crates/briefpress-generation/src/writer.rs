// SPDX-License-Identifier: GPL-3.0-or-later
//! Content generation client. Sends the outline plus harvested research to
//! the LLM writing service and receives the finished article body.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GenerationError, Result};
use briefpress_config::WriterConfig;

const WRITER_API_BASE: &str = "https://api.draftsmith.ai";

#[derive(Debug, Clone, Serialize)]
pub struct DraftRequest {
    pub title: String,
    pub outline: serde_json::Value,
    pub sources: Vec<String>,
    pub quality_level: String,
    pub seo_optimization: bool,
    pub legal_compliance: bool,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftResponse {
    pub body: String,
    pub word_count: u32,
}

pub struct ContentWriter {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ContentWriter {
    pub fn new(config: &WriterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| WRITER_API_BASE.to_string()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn draft_article(&self, mut request: DraftRequest) -> Result<DraftResponse> {
        if request.model.is_empty() {
            request.model = self.model.clone();
        }

        debug!(target: "writer", title = %request.title, model = %request.model, "requesting article draft");

        let mut builder = self
            .client
            .post(format!("{}/v1/drafts", self.base_url))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError {
                service: "writer",
                status: status.as_u16(),
                message,
            });
        }

        let draft: DraftResponse = response.json().await?;
        if draft.body.trim().is_empty() {
            return Err(GenerationError::InvalidResponse {
                service: "writer",
                message: "draft body was empty".to_string(),
            });
        }
        Ok(draft)
    }
}
