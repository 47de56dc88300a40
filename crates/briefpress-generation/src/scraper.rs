// SPDX-License-Identifier: GPL-3.0-or-later
//! Research harvesting client. Talks to the headless-browser scraping
//! service, which returns extracted article text with a per-source trust
//! score.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

use crate::error::{GenerationError, Result};
use briefpress_config::ScraperConfig;

const SCRAPER_API_BASE: &str = "https://api.scrapeforge.io";

#[derive(Debug, Clone, Deserialize)]
pub struct HarvestedSource {
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub trust_score: f64,
}

#[derive(Debug, Deserialize)]
struct HarvestResponse {
    sources: Vec<HarvestedSource>,
}

/// Scraping service client with concurrency limiting and a per-query cache.
pub struct ResearchScraper {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    rate_limiter: Arc<Semaphore>,
    cache: Cache<String, Vec<HarvestedSource>>,
}

impl ResearchScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| SCRAPER_API_BASE.to_string()),
            api_key: config.api_key.clone(),
            rate_limiter: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            cache: Cache::new(1_000),
        })
    }

    /// Harvest up to `limit` sources for a research query. Query results are
    /// cached so a re-run of the same week's research stage does not hit the
    /// scraping service again.
    pub async fn harvest(
        &self,
        query: &str,
        limit: u32,
        use_headless: bool,
    ) -> Result<Vec<HarvestedSource>> {
        let cache_key = format!("{}:{}:{}", query, limit, use_headless);
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(target: "scraper", query, "harvest cache hit");
            return Ok(cached);
        }

        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|_| GenerationError::InvalidResponse {
                service: "scraper",
                message: "rate limiter closed".to_string(),
            })?;

        let mut url =
            Url::parse(&format!("{}/v1/harvest", self.base_url)).map_err(|e| {
                GenerationError::InvalidResponse {
                    service: "scraper",
                    message: e.to_string(),
                }
            })?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("limit", &limit.to_string())
            .append_pair("render", &use_headless.to_string());

        debug!(target: "scraper", query, limit, use_headless, "harvesting sources");

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(target: "scraper", status = status.as_u16(), "harvest request rejected");
            return Err(GenerationError::ApiError {
                service: "scraper",
                status: status.as_u16(),
                message,
            });
        }

        let parsed: HarvestResponse = response.json().await?;
        self.cache.insert(cache_key, parsed.sources.clone());
        Ok(parsed.sources)
    }
}
