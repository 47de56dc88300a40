// SPDX-License-Identifier: GPL-3.0-or-later
//! The pipeline core: cycle orchestration, due-job processing, stage
//! handlers, and the cycle status report. Everything here takes the clock as
//! a parameter so tests can drive a cycle through synthetic time.

pub mod handlers;
pub mod orchestrator;
pub mod processor;
pub mod reporter;
pub mod trigger;

use std::sync::Arc;

use briefpress_config::{AppConfig, SchedulerConfig};
use briefpress_generation::{ContentWriter, ImageStudio, ResearchScraper};
use briefpress_realtime::RealtimeHub;
use briefpress_store::{JobRepository, PostRepository, SourceRepository, TriggerLogRepository};
use tracing::info;

pub use handlers::{default_registry, ImageFailure, ImageReport, StageHandler, StageRegistry, StageReport};
pub use orchestrator::{start_cycle, CycleStartReport};
pub use processor::{process_next, ProcessOutcome, ProcessedJob};
pub use reporter::{cycle_status, CycleStatusReport, JobSummary};
pub use trigger::{tick, TickReport};

/// Everything a stage handler or orchestration entry point needs: the stores,
/// the external collaborators, the progress hub, and the pipeline timing.
pub struct PipelineContext {
    pub jobs: Arc<dyn JobRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub sources: Arc<dyn SourceRepository>,
    pub triggers: Arc<dyn TriggerLogRepository>,
    pub scraper: Arc<ResearchScraper>,
    pub writer: Arc<ContentWriter>,
    pub images: Arc<ImageStudio>,
    pub hub: Arc<dyn RealtimeHub>,
    pub scheduler: SchedulerConfig,
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: Arc<PipelineContext>,
    pub registry: Arc<StageRegistry>,
}

impl AppState {
    pub fn new(config: AppConfig, pipeline: Arc<PipelineContext>) -> Self {
        let registry = Arc::new(default_registry());
        Self {
            config,
            pipeline,
            registry,
        }
    }

    pub fn on_start(&self) {
        info!(target: "application", "application state initialized");
    }
}
