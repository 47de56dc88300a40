//! End-to-end tests for the pipeline core: cycle orchestration, claim and
//! dispatch, status reporting, and the trigger's idempotency guard. Stores
//! run on in-memory SQLite; the generation services are wiremock servers.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use briefpress_config::{ImageStudioConfig, SchedulerConfig, ScraperConfig, WriterConfig};
use briefpress_domain::{
    Job, JobStatus, JobType, Post, PostStatus, StagePayload, TriggerOutcome,
};
use briefpress_generation::{ContentWriter, ImageStudio, ResearchScraper};
use briefpress_pipeline::{
    cycle_status, default_registry, process_next, start_cycle, tick, PipelineContext,
    ProcessOutcome, StageReport,
};
use briefpress_realtime::NoopRealtimeHub;
use briefpress_store::{
    JobRepository, PostRepository, SourceRepository, SqliteJobRepository, SqlitePostRepository,
    SqliteSourceRepository, SqliteTriggerLogRepository, TriggerLogRepository,
};

async fn harness(server: &MockServer) -> PipelineContext {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("migrate");

    let scraper = ResearchScraper::new(&ScraperConfig {
        base_url: Some(server.uri()),
        api_key: None,
        max_concurrent_requests: 2,
        timeout_seconds: 5,
    })
    .expect("scraper client");
    let writer = ContentWriter::new(&WriterConfig {
        base_url: Some(server.uri()),
        api_key: None,
        model: "content-writer-large".to_string(),
        timeout_seconds: 5,
    })
    .expect("writer client");
    let images = ImageStudio::new(&ImageStudioConfig {
        base_url: Some(server.uri()),
        api_key: None,
        timeout_seconds: 5,
    })
    .expect("image client");

    PipelineContext {
        jobs: Arc::new(SqliteJobRepository::new(pool.clone())),
        posts: Arc::new(SqlitePostRepository::new(pool.clone())),
        sources: Arc::new(SqliteSourceRepository::new(pool.clone())),
        triggers: Arc::new(SqliteTriggerLogRepository::new(pool)),
        scraper: Arc::new(scraper),
        writer: Arc::new(writer),
        images: Arc::new(images),
        hub: Arc::new(NoopRealtimeHub),
        scheduler: SchedulerConfig::default(),
    }
}

fn cycle_start(ctx: &PipelineContext) -> DateTime<Utc> {
    ctx.scheduler.epoch + Duration::weeks(9)
}

async fn mount_harvest(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/harvest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sources": [
                {"url": "https://example.com/a", "title": "ABA guidance", "excerpt": "The bar association...", "trust_score": 0.9},
                {"url": "https://example.com/b", "title": "Case study", "excerpt": "A mid-size firm...", "trust_score": 0.7},
                {"url": "https://example.com/c", "title": "Vendor blog", "excerpt": "Our product...", "trust_score": 0.4}
            ]
        })))
        .mount(server)
        .await;
}

async fn mount_drafts(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/drafts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "body": "Law firms evaluating AI tooling should begin with...",
            "word_count": 2430
        })))
        .mount(server)
        .await;
}

async fn mount_images_all_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "url": "https://cdn.imageloom.ai/ok.png"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn start_cycle_creates_seven_ordered_jobs() {
    let server = MockServer::start().await;
    let ctx = harness(&server).await;
    let now = cycle_start(&ctx);

    let report = start_cycle(&ctx, 10, now).await.expect("start cycle");
    assert_eq!(report.week_number, 10);
    assert_eq!(report.jobs.len(), 7);
    assert_eq!(report.estimated_completion, now + Duration::minutes(70));

    let jobs = ctx.jobs.list_by_week(10).await.expect("list");
    assert_eq!(jobs.len(), 7);
    assert!(jobs.iter().all(|j| j.week_number == 10));
    assert!(jobs.iter().all(|j| j.payload.week_number() == 10));
    assert!(jobs.windows(2).all(|w| w[0].scheduled_at < w[1].scheduled_at));

    let order: Vec<JobType> = jobs.iter().map(|j| j.job_type).collect();
    assert_eq!(order, JobType::ALL.to_vec());
}

#[tokio::test]
async fn fresh_cycle_reports_seven_pending() {
    let server = MockServer::start().await;
    let ctx = harness(&server).await;
    let now = cycle_start(&ctx);

    start_cycle(&ctx, 5, now).await.expect("start cycle");

    let status = cycle_status(&ctx, 5).await.expect("status");
    assert_eq!(status.total, 7);
    assert_eq!(status.pending, 7);
    assert_eq!(status.completed, 0);
    assert_eq!(status.in_progress, 0);
    assert_eq!(status.failed, 0);
    assert_eq!(status.progress_percentage, 0);
    assert_eq!(
        status.completed + status.in_progress + status.pending + status.failed,
        status.total
    );
}

#[tokio::test]
async fn empty_week_reports_zero_without_error() {
    let server = MockServer::start().await;
    let ctx = harness(&server).await;

    let status = cycle_status(&ctx, 99).await.expect("status");
    assert_eq!(status.total, 0);
    assert_eq!(status.progress_percentage, 0);
    assert!(status.jobs.is_empty());
}

#[tokio::test]
async fn tick_is_idempotent_within_a_week() {
    let server = MockServer::start().await;
    let ctx = harness(&server).await;
    // 10 days past the epoch lands in week 2
    let now = ctx.scheduler.epoch + Duration::days(10);

    let first = tick(&ctx, "cron", now).await.expect("first tick");
    assert_eq!(first.week_number, 2);
    assert!(!first.skipped);
    assert!(first.cycle.is_some());

    let second = tick(&ctx, "backup", now + Duration::hours(1))
        .await
        .expect("second tick");
    assert_eq!(second.week_number, 2);
    assert!(second.skipped);
    assert!(second.cycle.is_none());

    let jobs = ctx.jobs.list_by_week(2).await.expect("list");
    assert_eq!(jobs.len(), 7);

    let log = ctx.triggers.list_by_week(2).await.expect("trigger log");
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].outcome, TriggerOutcome::Started);
    assert_eq!(log[0].source, "cron");
    assert_eq!(log[1].outcome, TriggerOutcome::Skipped);
    assert_eq!(log[1].source, "backup");
}

#[tokio::test]
async fn process_next_with_nothing_due_mutates_nothing() {
    let server = MockServer::start().await;
    let ctx = harness(&server).await;
    let registry = default_registry();
    let now = cycle_start(&ctx);

    start_cycle(&ctx, 3, now).await.expect("start cycle");

    // One second before the first stage becomes claimable
    let outcome = process_next(&ctx, &registry, now - Duration::seconds(1))
        .await
        .expect("process");
    assert!(matches!(outcome, ProcessOutcome::NoJobsReady));

    let status = cycle_status(&ctx, 3).await.expect("status");
    assert_eq!(status.pending, 7);
    assert!(ctx.posts.list_by_week(3).await.expect("posts").is_empty());
}

#[tokio::test]
async fn strategy_stage_creates_single_idea_post() {
    let server = MockServer::start().await;
    let ctx = harness(&server).await;
    let registry = default_registry();
    let now = cycle_start(&ctx);

    start_cycle(&ctx, 4, now).await.expect("start cycle");

    let outcome = process_next(&ctx, &registry, now).await.expect("process");
    let ProcessOutcome::Processed(processed) = outcome else {
        panic!("expected a processed job");
    };
    assert!(processed.success);
    assert_eq!(processed.job_type, JobType::GenerateStrategy);
    assert!(matches!(processed.report, Some(StageReport::Strategy { .. })));

    let posts = ctx.posts.list_by_week(4).await.expect("posts");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].status, PostStatus::Idea);
    assert!(posts[0].strategy.is_some());

    let status = cycle_status(&ctx, 4).await.expect("status");
    assert_eq!(status.completed, 1);
    assert_eq!(status.pending, 6);
    assert_eq!(status.progress_percentage, 14);
}

#[tokio::test]
async fn missing_precondition_fails_job_but_not_call() {
    let server = MockServer::start().await;
    let ctx = harness(&server).await;
    let registry = default_registry();
    let now = cycle_start(&ctx);

    // An outlines job with no strategy artifact behind it
    let job = Job::new(
        StagePayload::default_for(JobType::GenerateOutlines, 8),
        now,
    );
    let job_id = job.id;
    ctx.jobs.insert_cycle(&[job]).await.expect("insert");

    let outcome = process_next(&ctx, &registry, now).await.expect("process");
    let ProcessOutcome::Processed(processed) = outcome else {
        panic!("expected a processed job");
    };
    assert!(!processed.success);
    assert!(processed
        .error
        .as_deref()
        .expect("error recorded")
        .contains("no strategy artifact"));

    let failed = ctx
        .jobs
        .get_by_id(job_id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(failed.status, JobStatus::Failed);
    assert!(failed.completed_at.is_some());
    assert!(failed.error.is_some());

    let status = cycle_status(&ctx, 8).await.expect("status");
    assert_eq!(status.failed, 1);
}

#[tokio::test]
async fn concurrent_processors_claim_exactly_once() {
    let server = MockServer::start().await;
    let ctx = harness(&server).await;
    let registry = default_registry();
    let now = cycle_start(&ctx);

    let job = Job::new(StagePayload::default_for(JobType::GenerateStrategy, 6), now);
    ctx.jobs.insert_cycle(&[job]).await.expect("insert");

    let (a, b) = tokio::join!(
        process_next(&ctx, &registry, now),
        process_next(&ctx, &registry, now)
    );
    let outcomes = [a.expect("first"), b.expect("second")];

    let processed = outcomes
        .iter()
        .filter(|o| matches!(o, ProcessOutcome::Processed(_)))
        .count();
    let idle = outcomes
        .iter()
        .filter(|o| matches!(o, ProcessOutcome::NoJobsReady))
        .count();
    assert_eq!(processed, 1, "exactly one processor may win the claim");
    assert_eq!(idle, 1);
}

#[tokio::test]
async fn image_stage_tolerates_partial_failure() {
    let server = MockServer::start().await;
    // Hero and social render, the diagram endpoint is down
    Mock::given(method("POST"))
        .and(path("/v1/images"))
        .and(body_partial_json(serde_json::json!({"kind": "diagram"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("render farm down"))
        .mount(&server)
        .await;
    mount_images_all_ok(&server).await;

    let ctx = harness(&server).await;
    let registry = default_registry();
    let now = cycle_start(&ctx);

    let mut post = Post::new(7, "AI Contract Review for Firms", "ai-contract-review-week-7");
    post.status = PostStatus::Scheduled;
    let post_id = post.id;
    ctx.posts.create(post).await.expect("create post");

    let job = Job::new(StagePayload::default_for(JobType::GenerateImages, 7), now);
    ctx.jobs.insert_cycle(&[job]).await.expect("insert");

    let outcome = process_next(&ctx, &registry, now).await.expect("process");
    let ProcessOutcome::Processed(processed) = outcome else {
        panic!("expected a processed job");
    };
    assert!(processed.success, "partial image failure must not fail the job");

    let Some(StageReport::Images(report)) = processed.report else {
        panic!("expected an image report");
    };
    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].image_type.as_str(), "diagram");

    let post = ctx
        .posts
        .get_by_id(post_id)
        .await
        .expect("get")
        .expect("exists");
    assert!(post.images_generated);
    assert!(post.hero_image_url.is_some());
    assert!(post.social_image_url.is_some());
    assert!(post.diagram_image_url.is_none());
}

#[tokio::test]
async fn full_cycle_runs_to_published() {
    let server = MockServer::start().await;
    mount_harvest(&server).await;
    mount_drafts(&server).await;
    mount_images_all_ok(&server).await;

    let ctx = harness(&server).await;
    let registry = default_registry();
    let start = cycle_start(&ctx);

    let report = tick(&ctx, "cron", start).await.expect("tick");
    assert!(!report.skipped);
    let week = report.week_number;

    let offsets = ctx.scheduler.stage_offsets_minutes.clone();
    for offset in &offsets {
        let now = start + Duration::minutes(*offset) + Duration::seconds(30);
        let outcome = process_next(&ctx, &registry, now).await.expect("process");
        let ProcessOutcome::Processed(processed) = outcome else {
            panic!("expected a job at offset {offset}");
        };
        assert!(
            processed.success,
            "stage {} failed: {:?}",
            processed.job_type, processed.error
        );
    }

    let status = cycle_status(&ctx, week).await.expect("status");
    assert_eq!(status.completed, 7);
    assert_eq!(status.progress_percentage, 100);

    let post = ctx
        .posts
        .get_by_week_and_status(week, PostStatus::Published)
        .await
        .expect("query")
        .expect("published post");
    assert!(post.published_at.is_some());
    assert!(post.body.is_some());
    assert!(post.images_generated);
    assert!(post.hero_image_url.is_some());

    // Low-trust source was discarded during harvest
    let sources = ctx.sources.list_by_week(week).await.expect("sources");
    assert_eq!(sources.len(), 2);
    assert!(sources.iter().all(|s| s.trust_score >= 0.6));
}
