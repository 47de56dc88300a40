// SPDX-License-Identifier: GPL-3.0-or-later
//! Image generation client. One request per (post, image type) pair; the
//! pipeline tolerates per-image failures, so errors here stay per-call.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GenerationError, Result};
use briefpress_config::ImageStudioConfig;
use briefpress_domain::ImageType;

const IMAGE_API_BASE: &str = "https://api.imageloom.ai";

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    kind: &'a str,
    style: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
}

pub struct ImageStudio {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ImageStudio {
    pub fn new(config: &ImageStudioConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| IMAGE_API_BASE.to_string()),
            api_key: config.api_key.clone(),
        })
    }

    pub async fn generate(
        &self,
        prompt: &str,
        image_type: ImageType,
        style: &str,
    ) -> Result<GeneratedImage> {
        debug!(target: "images", image_type = %image_type, "requesting image");

        let mut builder = self
            .client
            .post(format!("{}/v1/images", self.base_url))
            .json(&ImageRequest {
                prompt,
                kind: image_type.as_str(),
                style,
            });
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError {
                service: "images",
                status: status.as_u16(),
                message,
            });
        }

        let image: GeneratedImage = response.json().await?;
        if image.url.trim().is_empty() {
            return Err(GenerationError::InvalidResponse {
                service: "images",
                message: "image url was empty".to_string(),
            });
        }
        Ok(image)
    }
}
