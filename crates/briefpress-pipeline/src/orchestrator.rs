// SPDX-License-Identifier: GPL-3.0-or-later
//! Cycle orchestration: turn a week number into the seven staggered jobs
//! that make up one run of the content pipeline.

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

use briefpress_domain::{Job, JobId, JobType, StagePayload};

use crate::PipelineContext;

#[derive(Debug, Clone, Serialize)]
pub struct CycleStartReport {
    pub week_number: i64,
    pub jobs: Vec<(JobType, JobId)>,
    pub estimated_completion: DateTime<Utc>,
}

/// Enqueue one full cycle for `week_number`, stamping each stage's
/// `scheduled_at` with its configured offset from `now`. The seven inserts
/// are a single transaction, so a store failure never leaves a partial
/// cycle behind.
///
/// Not idempotent: calling this twice for the same week creates a duplicate
/// cycle. The scheduler trigger is the guard; direct callers bypass it
/// knowingly.
pub async fn start_cycle(
    ctx: &PipelineContext,
    week_number: i64,
    now: DateTime<Utc>,
) -> Result<CycleStartReport> {
    if week_number < 1 {
        bail!("week number must be >= 1, got {week_number}");
    }

    let offsets = &ctx.scheduler.stage_offsets_minutes;
    if offsets.len() != JobType::ALL.len() {
        bail!(
            "scheduler config has {} stage offsets, pipeline has {} stages",
            offsets.len(),
            JobType::ALL.len()
        );
    }

    let jobs: Vec<Job> = JobType::ALL
        .iter()
        .zip(offsets.iter())
        .map(|(job_type, offset)| {
            Job::new(
                StagePayload::default_for(*job_type, week_number),
                now + Duration::minutes(*offset),
            )
        })
        .collect();

    ctx.jobs.insert_cycle(&jobs).await?;

    let estimated_completion = now + Duration::minutes(*offsets.last().unwrap_or(&0));
    let job_ids: Vec<(JobType, JobId)> = jobs.iter().map(|j| (j.job_type, j.id)).collect();

    info!(
        target: "orchestrator",
        week_number,
        jobs_created = job_ids.len(),
        estimated_completion = %estimated_completion,
        "weekly cycle enqueued"
    );

    Ok(CycleStartReport {
        week_number,
        jobs: job_ids,
        estimated_completion,
    })
}
