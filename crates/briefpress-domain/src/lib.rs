// SPDX-License-Identifier: GPL-3.0-or-later
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Value Objects & IDs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub Uuid);

impl SourceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub Uuid);

impl TriggerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TriggerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// The seven pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    GenerateStrategy,
    ResearchHarvest,
    GenerateOutlines,
    GenerateContent,
    EditorialReview,
    GenerateImages,
    PublishContent,
}

impl JobType {
    /// All stages in pipeline order. `scheduled_at` offsets follow this order.
    pub const ALL: [JobType; 7] = [
        JobType::GenerateStrategy,
        JobType::ResearchHarvest,
        JobType::GenerateOutlines,
        JobType::GenerateContent,
        JobType::EditorialReview,
        JobType::GenerateImages,
        JobType::PublishContent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerateStrategy => "generate_strategy",
            Self::ResearchHarvest => "research_harvest",
            Self::GenerateOutlines => "generate_outlines",
            Self::GenerateContent => "generate_content",
            Self::EditorialReview => "editorial_review",
            Self::GenerateImages => "generate_images",
            Self::PublishContent => "publish_content",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "generate_strategy" => Some(Self::GenerateStrategy),
            "research_harvest" => Some(Self::ResearchHarvest),
            "generate_outlines" => Some(Self::GenerateOutlines),
            "generate_content" => Some(Self::GenerateContent),
            "editorial_review" => Some(Self::EditorialReview),
            "generate_images" => Some(Self::GenerateImages),
            "publish_content" => Some(Self::PublishContent),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Content artifact lifecycle: each stage advances the week's post one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Idea,
    Outline,
    Draft,
    Scheduled,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::Outline => "outline",
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Published => "published",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "idea" => Some(Self::Idea),
            "outline" => Some(Self::Outline),
            "draft" => Some(Self::Draft),
            "scheduled" => Some(Self::Scheduled),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Hero,
    Diagram,
    Social,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Diagram => "diagram",
            Self::Social => "social",
        }
    }
}

impl std::fmt::Display for ImageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerOutcome {
    Started,
    Skipped,
}

impl std::fmt::Display for TriggerOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

// ============================================================================
// Stage Payloads
// ============================================================================

/// Per-stage payload contract. Every variant carries the owning week so a job
/// row is self-describing even when read outside its cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StagePayload {
    GenerateStrategy {
        week_number: i64,
        focus_areas: Vec<String>,
        target_audience: String,
    },
    ResearchHarvest {
        week_number: i64,
        target_sources: u32,
        use_headless: bool,
        quality_threshold: f64,
    },
    GenerateOutlines {
        week_number: i64,
        pillar_count: u32,
        spoke_count: u32,
        word_targets: Vec<u32>,
    },
    GenerateContent {
        week_number: i64,
        quality_level: String,
        seo_optimization: bool,
        legal_compliance: bool,
    },
    EditorialReview {
        week_number: i64,
        compliance_check: bool,
        seo_optimization: bool,
        fact_checking: bool,
    },
    GenerateImages {
        week_number: i64,
        image_types: Vec<ImageType>,
        style_preference: String,
    },
    PublishContent {
        week_number: i64,
        update_sitemap: bool,
        update_rss: bool,
        social_promotion: bool,
    },
}

impl StagePayload {
    /// Default payload for a stage, as enqueued by the cycle orchestrator.
    pub fn default_for(job_type: JobType, week_number: i64) -> Self {
        match job_type {
            JobType::GenerateStrategy => Self::GenerateStrategy {
                week_number,
                focus_areas: vec![
                    "contract review".to_string(),
                    "legal research".to_string(),
                    "compliance automation".to_string(),
                ],
                target_audience: "small law firms".to_string(),
            },
            JobType::ResearchHarvest => Self::ResearchHarvest {
                week_number,
                target_sources: 8,
                use_headless: true,
                quality_threshold: 0.6,
            },
            JobType::GenerateOutlines => Self::GenerateOutlines {
                week_number,
                pillar_count: 1,
                spoke_count: 3,
                word_targets: vec![2500, 1200, 1200, 1200],
            },
            JobType::GenerateContent => Self::GenerateContent {
                week_number,
                quality_level: "premium".to_string(),
                seo_optimization: true,
                legal_compliance: true,
            },
            JobType::EditorialReview => Self::EditorialReview {
                week_number,
                compliance_check: true,
                seo_optimization: true,
                fact_checking: true,
            },
            JobType::GenerateImages => Self::GenerateImages {
                week_number,
                image_types: vec![ImageType::Hero, ImageType::Diagram, ImageType::Social],
                style_preference: "professional".to_string(),
            },
            JobType::PublishContent => Self::PublishContent {
                week_number,
                update_sitemap: true,
                update_rss: true,
                social_promotion: true,
            },
        }
    }

    pub fn week_number(&self) -> i64 {
        match self {
            Self::GenerateStrategy { week_number, .. }
            | Self::ResearchHarvest { week_number, .. }
            | Self::GenerateOutlines { week_number, .. }
            | Self::GenerateContent { week_number, .. }
            | Self::EditorialReview { week_number, .. }
            | Self::GenerateImages { week_number, .. }
            | Self::PublishContent { week_number, .. } => *week_number,
        }
    }

    pub fn job_type(&self) -> JobType {
        match self {
            Self::GenerateStrategy { .. } => JobType::GenerateStrategy,
            Self::ResearchHarvest { .. } => JobType::ResearchHarvest,
            Self::GenerateOutlines { .. } => JobType::GenerateOutlines,
            Self::GenerateContent { .. } => JobType::GenerateContent,
            Self::EditorialReview { .. } => JobType::EditorialReview,
            Self::GenerateImages { .. } => JobType::GenerateImages,
            Self::PublishContent { .. } => JobType::PublishContent,
        }
    }
}

// ============================================================================
// Week Derivation
// ============================================================================

/// Default pipeline epoch: the Monday the first cycle was kicked off.
pub fn default_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap()
}

/// Week number for a wall-clock instant relative to the pipeline epoch.
///
/// Weeks are 1-based: the epoch instant itself falls in week 1. Instants
/// before the epoch clamp to week 1 so a misconfigured clock can never
/// produce a non-positive cycle identifier.
pub fn week_number_of(now: DateTime<Utc>, epoch: DateTime<Utc>) -> i64 {
    let elapsed = now.signed_duration_since(epoch);
    if elapsed < Duration::zero() {
        return 1;
    }
    elapsed.num_seconds() / (7 * 24 * 60 * 60) + 1
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub job_type: JobType,
    pub week_number: i64,
    pub payload: StagePayload,
    pub status: JobStatus,
    pub scheduled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(payload: StagePayload, scheduled_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            job_type: payload.job_type(),
            week_number: payload.week_number(),
            payload,
            status: JobStatus::Pending,
            scheduled_at,
            completed_at: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Pending && self.scheduled_at <= now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub week_number: i64,
    pub title: String,
    pub slug: String,
    pub status: PostStatus,
    pub strategy: Option<serde_json::Value>,
    pub outline: Option<serde_json::Value>,
    pub body: Option<String>,
    pub hero_image_url: Option<String>,
    pub diagram_image_url: Option<String>,
    pub social_image_url: Option<String>,
    pub images_generated: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(week_number: i64, title: impl Into<String>, slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: PostId::new(),
            week_number,
            title: title.into(),
            slug: slug.into(),
            status: PostStatus::Idea,
            strategy: None,
            outline: None,
            body: None,
            hero_image_url: None,
            diagram_image_url: None,
            social_image_url: None,
            images_generated: false,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn image_url(&self, image_type: ImageType) -> Option<&str> {
        match image_type {
            ImageType::Hero => self.hero_image_url.as_deref(),
            ImageType::Diagram => self.diagram_image_url.as_deref(),
            ImageType::Social => self.social_image_url.as_deref(),
        }
    }

    pub fn set_image_url(&mut self, image_type: ImageType, url: impl Into<String>) {
        let url = url.into();
        match image_type {
            ImageType::Hero => self.hero_image_url = Some(url),
            ImageType::Diagram => self.diagram_image_url = Some(url),
            ImageType::Social => self.social_image_url = Some(url),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSource {
    pub id: SourceId,
    pub week_number: i64,
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub trust_score: f64,
    pub harvested_at: DateTime<Utc>,
}

impl ResearchSource {
    pub fn new(
        week_number: i64,
        url: impl Into<String>,
        title: impl Into<String>,
        excerpt: impl Into<String>,
        trust_score: f64,
    ) -> Self {
        Self {
            id: SourceId::new(),
            week_number,
            url: url.into(),
            title: title.into(),
            excerpt: excerpt.into(),
            trust_score,
            harvested_at: Utc::now(),
        }
    }
}

/// Audit row written by the scheduler trigger, one per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub id: TriggerId,
    pub week_number: i64,
    pub source: String,
    pub outcome: TriggerOutcome,
    pub created_at: DateTime<Utc>,
}

impl TriggerRecord {
    pub fn new(week_number: i64, source: impl Into<String>, outcome: TriggerOutcome) -> Self {
        Self {
            id: TriggerId::new(),
            week_number,
            source: source.into(),
            outcome,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Domain Validation
// ============================================================================

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

pub trait Validate {
    fn validate(&self) -> Result<(), Vec<ValidationError>>;
}

impl Validate for Post {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(ValidationError {
                field: "title",
                message: "title cannot be empty".into(),
            });
        }
        if self.slug.trim().is_empty() {
            errors.push(ValidationError {
                field: "slug",
                message: "slug cannot be empty".into(),
            });
        }
        if self.week_number < 1 {
            errors.push(ValidationError {
                field: "week_number",
                message: "week number must be >= 1".into(),
            });
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Validate for ResearchSource {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.url.trim().is_empty() {
            errors.push(ValidationError {
                field: "url",
                message: "url cannot be empty".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.trust_score) {
            errors.push(ValidationError {
                field: "trust_score",
                message: "trust score must be within 0.0..=1.0".into(),
            });
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// Domain Events (lightweight scaffolding)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DomainEvent<TPayload> {
    pub name: &'static str,
    pub occurred_at: DateTime<Utc>,
    pub payload: TPayload,
}

impl<TPayload> DomainEvent<TPayload> {
    pub fn new(name: &'static str, payload: TPayload) -> Self {
        Self {
            name,
            occurred_at: Utc::now(),
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTransitionPayload {
    pub job_id: JobId,
    pub job_type: JobType,
    pub week_number: i64,
    pub status: JobStatus,
}

pub type JobTransitioned = DomainEvent<JobTransitionPayload>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostPublishedPayload {
    pub post_id: PostId,
    pub week_number: i64,
    pub slug: String,
}

pub type PostPublished = DomainEvent<PostPublishedPayload>;

// ============================================================================
// Tests
// ============================================================================
