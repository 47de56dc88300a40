// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::{anyhow, Result};
use briefpress_domain::{
    Job, JobId, JobStatus, JobType, Post, PostId, PostStatus, ResearchSource, SourceId,
    StagePayload, TriggerId, TriggerOutcome, TriggerRecord,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::Row;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::repositories::{JobRepository, PostRepository, SourceRepository, TriggerLogRepository};

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

fn parse_dt(s: String) -> Result<DateTime<Utc>> {
    // Try RFC3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Fallback to SQLite default CURRENT_TIMESTAMP format: "YYYY-MM-DD HH:MM:SS"
    let ndt = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
}

fn parse_dt_opt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.map(parse_dt).transpose()
}

fn parse_job_status(s: &str) -> Result<JobStatus> {
    JobStatus::parse_str(s).ok_or_else(|| anyhow!("unknown job status: {}", s))
}

fn parse_job_type(s: &str) -> Result<JobType> {
    JobType::parse_str(s).ok_or_else(|| anyhow!("unknown job type: {}", s))
}

fn parse_post_status(s: &str) -> Result<PostStatus> {
    PostStatus::parse_str(s).ok_or_else(|| anyhow!("unknown post status: {}", s))
}

fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<Job> {
    let id_str: String = row.try_get("id")?;
    let job_type_str: String = row.try_get("job_type")?;
    let week_number: i64 = row.try_get("week_number")?;
    let payload_str: String = row.try_get("payload")?;
    let status_str: String = row.try_get("status")?;
    let scheduled_at_s: String = row.try_get("scheduled_at")?;
    let completed_at_s: Option<String> = row.try_get("completed_at")?;
    let error: Option<String> = row.try_get("error")?;
    let created_at_s: String = row.try_get("created_at")?;
    let updated_at_s: String = row.try_get("updated_at")?;

    let payload: StagePayload = serde_json::from_str(&payload_str)?;

    Ok(Job {
        id: JobId::from_uuid(Uuid::parse_str(&id_str)?),
        job_type: parse_job_type(&job_type_str)?,
        week_number,
        payload,
        status: parse_job_status(&status_str)?,
        scheduled_at: parse_dt(scheduled_at_s)?,
        completed_at: parse_dt_opt(completed_at_s)?,
        error,
        created_at: parse_dt(created_at_s)?,
        updated_at: parse_dt(updated_at_s)?,
    })
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let id_str: String = row.try_get("id")?;
    let week_number: i64 = row.try_get("week_number")?;
    let title: String = row.try_get("title")?;
    let slug: String = row.try_get("slug")?;
    let status_str: String = row.try_get("status")?;
    let strategy_str: Option<String> = row.try_get("strategy")?;
    let outline_str: Option<String> = row.try_get("outline")?;
    let body: Option<String> = row.try_get("body")?;
    let hero_image_url: Option<String> = row.try_get("hero_image_url")?;
    let diagram_image_url: Option<String> = row.try_get("diagram_image_url")?;
    let social_image_url: Option<String> = row.try_get("social_image_url")?;
    let images_generated: bool = row.try_get("images_generated")?;
    let published_at_s: Option<String> = row.try_get("published_at")?;
    let created_at_s: String = row.try_get("created_at")?;
    let updated_at_s: String = row.try_get("updated_at")?;

    Ok(Post {
        id: PostId::from_uuid(Uuid::parse_str(&id_str)?),
        week_number,
        title,
        slug,
        status: parse_post_status(&status_str)?,
        strategy: strategy_str.map(|s| serde_json::from_str(&s)).transpose()?,
        outline: outline_str.map(|s| serde_json::from_str(&s)).transpose()?,
        body,
        hero_image_url,
        diagram_image_url,
        social_image_url,
        images_generated,
        published_at: parse_dt_opt(published_at_s)?,
        created_at: parse_dt(created_at_s)?,
        updated_at: parse_dt(updated_at_s)?,
    })
}

fn row_to_source(row: &sqlx::sqlite::SqliteRow) -> Result<ResearchSource> {
    let id_str: String = row.try_get("id")?;
    let week_number: i64 = row.try_get("week_number")?;
    let url: String = row.try_get("url")?;
    let title: String = row.try_get("title")?;
    let excerpt: String = row.try_get("excerpt")?;
    let trust_score: f64 = row.try_get("trust_score")?;
    let harvested_at_s: String = row.try_get("harvested_at")?;

    Ok(ResearchSource {
        id: SourceId::from_uuid(Uuid::parse_str(&id_str)?),
        week_number,
        url,
        title,
        excerpt,
        trust_score,
        harvested_at: parse_dt(harvested_at_s)?,
    })
}

fn row_to_trigger(row: &sqlx::sqlite::SqliteRow) -> Result<TriggerRecord> {
    let id_str: String = row.try_get("id")?;
    let week_number: i64 = row.try_get("week_number")?;
    let source: String = row.try_get("source")?;
    let outcome_str: String = row.try_get("outcome")?;
    let created_at_s: String = row.try_get("created_at")?;

    let outcome = match outcome_str.as_str() {
        "started" => TriggerOutcome::Started,
        "skipped" => TriggerOutcome::Skipped,
        other => return Err(anyhow!("unknown trigger outcome: {}", other)),
    };

    Ok(TriggerRecord {
        id: TriggerId::from_uuid(Uuid::parse_str(&id_str)?),
        week_number,
        source,
        outcome,
        created_at: parse_dt(created_at_s)?,
    })
}

// ============================================================================

/// SQLx-backed Job repository
pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl JobRepository for SqliteJobRepository {
    async fn insert_cycle(&self, jobs: &[Job]) -> Result<()> {
        debug!(target: "repository", count = jobs.len(), "inserting cycle jobs");
        let q = r#"
            INSERT INTO jobs (
                id, job_type, week_number, payload, status,
                scheduled_at, completed_at, error, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        let mut tx = self.pool.begin().await?;
        for job in jobs {
            sqlx::query(q)
                .bind(job.id.to_string())
                .bind(job.job_type.as_str())
                .bind(job.week_number)
                .bind(serde_json::to_string(&job.payload)?)
                .bind(job.status.as_str())
                .bind(job.scheduled_at.to_rfc3339())
                .bind(job.completed_at.map(|dt| dt.to_rfc3339()))
                .bind(job.error.clone())
                .bind(job.created_at.to_rfc3339())
                .bind(job.updated_at.to_rfc3339())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>> {
        debug!(target: "repository", job_id = %id, "fetching job by id");
        let row = sqlx::query("SELECT * FROM jobs WHERE id = ? LIMIT 1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_job(&r)).transpose()
    }

    async fn next_due(&self, now: DateTime<Utc>) -> Result<Option<Job>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM jobs
            WHERE status = 'pending' AND scheduled_at <= ?
            ORDER BY scheduled_at ASC
            LIMIT 1
            "#,
        )
        .bind(now.to_rfc3339())
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| row_to_job(&r)).transpose()
    }

    async fn try_claim(&self, id: JobId, now: DateTime<Utc>) -> Result<bool> {
        // Conditional update is the claim itself; a concurrent processor that
        // already flipped the row leaves rows_affected at zero.
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'in_progress', updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        let claimed = result.rows_affected() == 1;
        debug!(target: "repository", job_id = %id, claimed, "claim attempt");
        Ok(claimed)
    }

    async fn mark_completed(&self, id: JobId, completed_at: DateTime<Utc>) -> Result<()> {
        debug!(target: "repository", job_id = %id, "marking job completed");
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'completed', completed_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(completed_at.to_rfc3339())
        .bind(completed_at.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: JobId,
        error: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        debug!(target: "repository", job_id = %id, error, "marking job failed");
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'failed', error = ?, completed_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(error)
        .bind(completed_at.to_rfc3339())
        .bind(completed_at.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_by_week(&self, week_number: i64) -> Result<Vec<Job>> {
        debug!(target: "repository", week_number, "listing jobs by week");
        let rows = sqlx::query("SELECT * FROM jobs WHERE week_number = ? ORDER BY scheduled_at")
            .bind(week_number)
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(row_to_job(&r)?);
        }
        Ok(out)
    }

    async fn week_has_jobs(&self, week_number: i64) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM jobs WHERE week_number = ? LIMIT 1")
            .bind(week_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

// ============================================================================

/// SQLx-backed Post repository
pub struct SqlitePostRepository {
    pool: SqlitePool,
}

impl SqlitePostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PostRepository for SqlitePostRepository {
    async fn create(&self, post: Post) -> Result<Post> {
        debug!(target: "repository", post_id = %post.id, "creating post");
        let q = r#"
            INSERT INTO posts (
                id, week_number, title, slug, status, strategy, outline, body,
                hero_image_url, diagram_image_url, social_image_url,
                images_generated, published_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(q)
            .bind(post.id.to_string())
            .bind(post.week_number)
            .bind(post.title.clone())
            .bind(post.slug.clone())
            .bind(post.status.as_str())
            .bind(post.strategy.as_ref().map(|v| v.to_string()))
            .bind(post.outline.as_ref().map(|v| v.to_string()))
            .bind(post.body.clone())
            .bind(post.hero_image_url.clone())
            .bind(post.diagram_image_url.clone())
            .bind(post.social_image_url.clone())
            .bind(post.images_generated)
            .bind(post.published_at.map(|dt| dt.to_rfc3339()))
            .bind(post.created_at.to_rfc3339())
            .bind(post.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(post)
    }

    async fn get_by_id(&self, id: PostId) -> Result<Option<Post>> {
        debug!(target: "repository", post_id = %id, "fetching post by id");
        let row = sqlx::query("SELECT * FROM posts WHERE id = ? LIMIT 1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_post(&r)).transpose()
    }

    async fn get_by_week_and_status(
        &self,
        week_number: i64,
        status: PostStatus,
    ) -> Result<Option<Post>> {
        debug!(target: "repository", week_number, status = %status, "fetching post by week and status");
        let row = sqlx::query(
            "SELECT * FROM posts WHERE week_number = ? AND status = ? ORDER BY created_at LIMIT 1",
        )
        .bind(week_number)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| row_to_post(&r)).transpose()
    }

    async fn list_by_week(&self, week_number: i64) -> Result<Vec<Post>> {
        debug!(target: "repository", week_number, "listing posts by week");
        let rows = sqlx::query("SELECT * FROM posts WHERE week_number = ? ORDER BY created_at")
            .bind(week_number)
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(row_to_post(&r)?);
        }
        Ok(out)
    }

    async fn list_needing_images(&self, week_number: i64) -> Result<Vec<Post>> {
        debug!(target: "repository", week_number, "listing posts needing images");
        let rows = sqlx::query(
            r#"
            SELECT * FROM posts
            WHERE week_number = ? AND status = 'scheduled' AND images_generated = 0
            ORDER BY created_at
            "#,
        )
        .bind(week_number)
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(row_to_post(&r)?);
        }
        Ok(out)
    }

    async fn update(&self, post: Post) -> Result<Post> {
        debug!(target: "repository", post_id = %post.id, "updating post");
        let q = r#"
            UPDATE posts SET
                title = ?,
                slug = ?,
                status = ?,
                strategy = ?,
                outline = ?,
                body = ?,
                hero_image_url = ?,
                diagram_image_url = ?,
                social_image_url = ?,
                images_generated = ?,
                published_at = ?,
                updated_at = ?
            WHERE id = ?
        "#;
        sqlx::query(q)
            .bind(post.title.clone())
            .bind(post.slug.clone())
            .bind(post.status.as_str())
            .bind(post.strategy.as_ref().map(|v| v.to_string()))
            .bind(post.outline.as_ref().map(|v| v.to_string()))
            .bind(post.body.clone())
            .bind(post.hero_image_url.clone())
            .bind(post.diagram_image_url.clone())
            .bind(post.social_image_url.clone())
            .bind(post.images_generated)
            .bind(post.published_at.map(|dt| dt.to_rfc3339()))
            .bind(post.updated_at.to_rfc3339())
            .bind(post.id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(post)
    }
}

// ============================================================================

/// SQLx-backed research source repository
pub struct SqliteSourceRepository {
    pool: SqlitePool,
}

impl SqliteSourceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SourceRepository for SqliteSourceRepository {
    async fn create(&self, source: ResearchSource) -> Result<ResearchSource> {
        debug!(target: "repository", source_id = %source.id, "creating research source");
        let q = r#"
            INSERT INTO research_sources (
                id, week_number, url, title, excerpt, trust_score, harvested_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#;
        sqlx::query(q)
            .bind(source.id.to_string())
            .bind(source.week_number)
            .bind(source.url.clone())
            .bind(source.title.clone())
            .bind(source.excerpt.clone())
            .bind(source.trust_score)
            .bind(source.harvested_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(source)
    }

    async fn list_by_week(&self, week_number: i64) -> Result<Vec<ResearchSource>> {
        debug!(target: "repository", week_number, "listing sources by week");
        let rows =
            sqlx::query("SELECT * FROM research_sources WHERE week_number = ? ORDER BY harvested_at")
                .bind(week_number)
                .fetch_all(&self.pool)
                .await?;
        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(row_to_source(&r)?);
        }
        Ok(out)
    }
}

// ============================================================================

/// SQLx-backed trigger log repository
pub struct SqliteTriggerLogRepository {
    pool: SqlitePool,
}

impl SqliteTriggerLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TriggerLogRepository for SqliteTriggerLogRepository {
    async fn record(&self, record: TriggerRecord) -> Result<TriggerRecord> {
        debug!(target: "repository", week_number = record.week_number, outcome = %record.outcome, "recording trigger");
        let q = r#"
            INSERT INTO cycle_triggers (id, week_number, source, outcome, created_at)
            VALUES (?, ?, ?, ?, ?)
        "#;
        sqlx::query(q)
            .bind(record.id.to_string())
            .bind(record.week_number)
            .bind(record.source.clone())
            .bind(record.outcome.to_string())
            .bind(record.created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list_by_week(&self, week_number: i64) -> Result<Vec<TriggerRecord>> {
        let rows =
            sqlx::query("SELECT * FROM cycle_triggers WHERE week_number = ? ORDER BY created_at")
                .bind(week_number)
                .fetch_all(&self.pool)
                .await?;
        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(row_to_trigger(&r)?);
        }
        Ok(out)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("connect in-memory sqlite");

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .expect("migrate");
        pool
    }

    fn cycle_jobs(week: i64, start: DateTime<Utc>) -> Vec<Job> {
        JobType::ALL
            .iter()
            .enumerate()
            .map(|(i, jt)| {
                Job::new(
                    StagePayload::default_for(*jt, week),
                    start + Duration::minutes(i as i64 * 10),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn insert_cycle_and_list_round_trip() {
        let pool = setup_pool().await;
        let repo = SqliteJobRepository::new(pool);
        let start = Utc::now();

        repo.insert_cycle(&cycle_jobs(3, start)).await.expect("insert");

        let jobs = repo.list_by_week(3).await.expect("list");
        assert_eq!(jobs.len(), 7);
        assert!(jobs.iter().all(|j| j.week_number == 3));
        assert!(jobs.iter().all(|j| j.status == JobStatus::Pending));
        assert!(jobs.windows(2).all(|w| w[0].scheduled_at < w[1].scheduled_at));

        assert!(repo.week_has_jobs(3).await.expect("probe"));
        assert!(!repo.week_has_jobs(4).await.expect("probe"));
    }

    #[tokio::test]
    async fn next_due_honors_schedule_and_order() {
        let pool = setup_pool().await;
        let repo = SqliteJobRepository::new(pool);
        let start = Utc::now();

        repo.insert_cycle(&cycle_jobs(1, start)).await.expect("insert");

        // Nothing due before the first offset has passed
        let none = repo
            .next_due(start - Duration::seconds(1))
            .await
            .expect("query");
        assert!(none.is_none());

        // With two stages due, the earliest one wins
        let due = repo
            .next_due(start + Duration::minutes(11))
            .await
            .expect("query")
            .expect("job due");
        assert_eq!(due.job_type, JobType::GenerateStrategy);
    }

    #[tokio::test]
    async fn claim_succeeds_exactly_once() {
        let pool = setup_pool().await;
        let repo = SqliteJobRepository::new(pool);
        let start = Utc::now();

        repo.insert_cycle(&cycle_jobs(2, start)).await.expect("insert");
        let job = repo.next_due(start).await.expect("query").expect("due");

        assert!(repo.try_claim(job.id, start).await.expect("first claim"));
        assert!(!repo.try_claim(job.id, start).await.expect("second claim"));

        let reloaded = repo.get_by_id(job.id).await.expect("get").expect("exists");
        assert_eq!(reloaded.status, JobStatus::InProgress);

        // A claimed job no longer surfaces as due
        let next = repo.next_due(start).await.expect("query");
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn terminal_transitions_stamp_completed_at() {
        let pool = setup_pool().await;
        let repo = SqliteJobRepository::new(pool);
        let start = Utc::now();

        repo.insert_cycle(&cycle_jobs(5, start)).await.expect("insert");
        let jobs = repo.list_by_week(5).await.expect("list");
        let first = &jobs[0];
        let second = &jobs[1];
        let done_at = start + Duration::minutes(2);

        repo.try_claim(first.id, start).await.expect("claim");
        repo.mark_completed(first.id, done_at).await.expect("complete");
        let completed = repo.get_by_id(first.id).await.expect("get").expect("exists");
        assert_eq!(completed.status, JobStatus::Completed);
        assert_eq!(
            completed.completed_at.expect("stamped").timestamp(),
            done_at.timestamp()
        );
        assert!(completed.error.is_none());

        repo.try_claim(second.id, start).await.expect("claim");
        repo.mark_failed(second.id, "no idea post for week 5", done_at)
            .await
            .expect("fail");
        let failed = repo.get_by_id(second.id).await.expect("get").expect("exists");
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("no idea post for week 5"));
        assert!(failed.completed_at.is_some());
    }

    #[tokio::test]
    async fn post_create_update_round_trip() {
        let pool = setup_pool().await;
        let repo = SqlitePostRepository::new(pool);

        let mut post = Post::new(4, "AI for Small Firms", "ai-for-small-firms");
        post.strategy = Some(serde_json::json!({"pillar": "AI contract review"}));
        let id = post.id;

        repo.create(post).await.expect("create");

        let mut fetched = repo
            .get_by_week_and_status(4, PostStatus::Idea)
            .await
            .expect("query")
            .expect("post exists");
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.strategy.as_ref().unwrap()["pillar"], "AI contract review");

        fetched.status = PostStatus::Outline;
        fetched.outline = Some(serde_json::json!({"sections": ["intro", "body"]}));
        repo.update(fetched).await.expect("update");

        assert!(repo
            .get_by_week_and_status(4, PostStatus::Idea)
            .await
            .expect("query")
            .is_none());
        let outlined = repo
            .get_by_week_and_status(4, PostStatus::Outline)
            .await
            .expect("query")
            .expect("post advanced");
        assert_eq!(outlined.outline.as_ref().unwrap()["sections"][0], "intro");
    }

    #[tokio::test]
    async fn needing_images_filters_status_and_flag() {
        let pool = setup_pool().await;
        let repo = SqlitePostRepository::new(pool);

        let mut scheduled = Post::new(6, "Scheduled", "scheduled");
        scheduled.status = PostStatus::Scheduled;
        let mut flagged = Post::new(6, "Already Done", "already-done");
        flagged.status = PostStatus::Scheduled;
        flagged.images_generated = true;
        let draft = Post::new(6, "Still Draft", "still-draft");

        let scheduled_id = scheduled.id;
        repo.create(scheduled).await.expect("create");
        repo.create(flagged).await.expect("create");
        repo.create(draft).await.expect("create");

        let needing = repo.list_needing_images(6).await.expect("list");
        assert_eq!(needing.len(), 1);
        assert_eq!(needing[0].id, scheduled_id);
    }

    #[tokio::test]
    async fn source_and_trigger_round_trips() {
        let pool = setup_pool().await;
        let sources = SqliteSourceRepository::new(pool.clone());
        let triggers = SqliteTriggerLogRepository::new(pool);

        sources
            .create(ResearchSource::new(
                9,
                "https://example.com/ruling",
                "Court ruling on AI evidence",
                "The court held that...",
                0.85,
            ))
            .await
            .expect("create source");

        let listed = sources.list_by_week(9).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert!((listed[0].trust_score - 0.85).abs() < f64::EPSILON);

        triggers
            .record(TriggerRecord::new(9, "cron", TriggerOutcome::Started))
            .await
            .expect("record");
        triggers
            .record(TriggerRecord::new(9, "backup", TriggerOutcome::Skipped))
            .await
            .expect("record");

        let log = triggers.list_by_week(9).await.expect("list");
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].outcome, TriggerOutcome::Started);
        assert_eq!(log[1].source, "backup");
    }
}
