// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::Result;
use briefpress_domain::{
    Job, JobId, Post, PostId, PostStatus, ResearchSource, TriggerRecord,
};
use chrono::{DateTime, Utc};

// ============================================================================
// Repository Traits
// ============================================================================

/// Job store. Jobs are inserted in bulk per cycle, mutated only through the
/// claim/terminal transitions below, and never deleted.
#[async_trait::async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a full cycle of jobs atomically. Either every row lands or none
    /// does; a partially-enqueued cycle is never observable.
    async fn insert_cycle(&self, jobs: &[Job]) -> Result<()>;

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>>;

    /// The earliest pending job whose `scheduled_at` has passed.
    async fn next_due(&self, now: DateTime<Utc>) -> Result<Option<Job>>;

    /// Atomic conditional claim: flips `pending` to `in_progress` only if the
    /// row is still pending. Returns false when another processor won the
    /// race; the caller must then treat the queue as empty.
    async fn try_claim(&self, id: JobId, now: DateTime<Utc>) -> Result<bool>;

    async fn mark_completed(&self, id: JobId, completed_at: DateTime<Utc>) -> Result<()>;

    async fn mark_failed(
        &self,
        id: JobId,
        error: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn list_by_week(&self, week_number: i64) -> Result<Vec<Job>>;

    /// Idempotency probe used by the scheduler trigger.
    async fn week_has_jobs(&self, week_number: i64) -> Result<bool>;
}

/// Content store. One post per week is created by the strategy stage and
/// advanced through its lifecycle by the later stages.
#[async_trait::async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: Post) -> Result<Post>;
    async fn get_by_id(&self, id: PostId) -> Result<Option<Post>>;
    async fn get_by_week_and_status(
        &self,
        week_number: i64,
        status: PostStatus,
    ) -> Result<Option<Post>>;
    async fn list_by_week(&self, week_number: i64) -> Result<Vec<Post>>;
    /// Posts awaiting imagery: `scheduled` and not yet flagged.
    async fn list_needing_images(&self, week_number: i64) -> Result<Vec<Post>>;
    async fn update(&self, post: Post) -> Result<Post>;
}

#[async_trait::async_trait]
pub trait SourceRepository: Send + Sync {
    async fn create(&self, source: ResearchSource) -> Result<ResearchSource>;
    async fn list_by_week(&self, week_number: i64) -> Result<Vec<ResearchSource>>;
}

/// Append-only audit log of scheduler trigger invocations.
#[async_trait::async_trait]
pub trait TriggerLogRepository: Send + Sync {
    async fn record(&self, record: TriggerRecord) -> Result<TriggerRecord>;
    async fn list_by_week(&self, week_number: i64) -> Result<Vec<TriggerRecord>>;
}
