// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_max_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://briefpress.db".to_string(),
            pool_max_size: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// When set, `/api/v1` requests must present this key. Unset means stub
    /// mode: everything is allowed through.
    pub api_key: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5180,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Pipeline timing: the fixed epoch the week counter is derived from and the
/// per-stage delays (minutes after cycle start) used when enqueuing a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub epoch: DateTime<Utc>,
    pub stage_offsets_minutes: Vec<i64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            epoch: briefpress_epoch(),
            stage_offsets_minutes: vec![0, 5, 15, 30, 45, 50, 70],
        }
    }
}

/// Project-start Monday. Week 1 begins here.
fn briefpress_epoch() -> DateTime<Utc> {
    "2025-06-02T00:00:00Z"
        .parse()
        .expect("epoch constant is valid RFC 3339")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub max_concurrent_requests: usize,
    pub timeout_seconds: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            max_concurrent_requests: 2,
            timeout_seconds: 45,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: "content-writer-large".to_string(),
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageStudioConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for ImageStudioConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_seconds: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub scraper: ScraperConfig,
    pub writer: WriterConfig,
    pub images: ImageStudioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub telemetry: TelemetryConfig,
    pub scheduler: SchedulerConfig,
    pub generation: GenerationConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: BRIEFPRESS_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("BRIEFPRESS_").split("__"));

    let config: AppConfig = figment.extract()?;
    info!(target: "config", "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_seven_stages() {
        let config = AppConfig::default();
        assert_eq!(config.scheduler.stage_offsets_minutes.len(), 7);
        let offsets = &config.scheduler.stage_offsets_minutes;
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn env_overrides_nested_fields() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("BRIEFPRESS_HTTP__PORT", "9099");
            jail.set_env("BRIEFPRESS_DATABASE__URL", "sqlite://override.db");
            let config = load(None).expect("load config");
            assert_eq!(config.http.port, 9099);
            assert_eq!(config.database.url, "sqlite://override.db");
            Ok(())
        });
    }

    #[test]
    fn epoch_default_is_fixed_monday() {
        let config = AppConfig::default();
        assert_eq!(config.scheduler.epoch.to_rfc3339(), "2025-06-02T00:00:00+00:00");
    }
}
