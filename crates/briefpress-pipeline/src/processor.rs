// SPDX-License-Identifier: GPL-3.0-or-later
//! The due-job processor: claim at most one job, execute its stage handler,
//! record the outcome. Invoked repeatedly by an external timer; every
//! invocation is self-contained.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use briefpress_domain::{
    DomainEvent, JobId, JobStatus, JobTransitionPayload, JobType,
};

use crate::handlers::{StageRegistry, StageReport};
use crate::PipelineContext;

#[derive(Debug, Serialize)]
pub struct ProcessedJob {
    pub job_id: JobId,
    pub job_type: JobType,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<StageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProcessOutcome {
    NoJobsReady,
    Processed(ProcessedJob),
}

/// Claim and execute the earliest due pending job.
///
/// Handler failures are absorbed into the job record (`failed` +
/// `completed_at` + message) rather than propagated; the call only errors
/// when the store itself does. Losing the claim race is reported as
/// `NoJobsReady`, the same as an empty queue.
pub async fn process_next(
    ctx: &PipelineContext,
    registry: &StageRegistry,
    now: DateTime<Utc>,
) -> Result<ProcessOutcome> {
    let Some(job) = ctx.jobs.next_due(now).await? else {
        debug!(target: "processor", "no jobs ready for processing");
        return Ok(ProcessOutcome::NoJobsReady);
    };

    if !ctx.jobs.try_claim(job.id, now).await? {
        debug!(target: "processor", job_id = %job.id, "lost claim race, treating queue as empty");
        return Ok(ProcessOutcome::NoJobsReady);
    }

    info!(
        target: "processor",
        job_id = %job.id,
        job_type = %job.job_type,
        week_number = job.week_number,
        "executing job"
    );

    let Some(handler) = registry.get(job.job_type) else {
        let message = format!("no handler registered for job type {}", job.job_type);
        ctx.jobs.mark_failed(job.id, &message, now).await?;
        broadcast_transition(ctx, &job.id, job.job_type, job.week_number, JobStatus::Failed).await;
        return Ok(ProcessOutcome::Processed(ProcessedJob {
            job_id: job.id,
            job_type: job.job_type,
            success: false,
            report: None,
            error: Some(message),
        }));
    };

    match handler.run(ctx, &job.payload, now).await {
        Ok(report) => {
            ctx.jobs.mark_completed(job.id, now).await?;
            info!(
                target: "processor",
                job_id = %job.id,
                job_type = %job.job_type,
                "job completed successfully"
            );
            broadcast_transition(ctx, &job.id, job.job_type, job.week_number, JobStatus::Completed)
                .await;
            Ok(ProcessOutcome::Processed(ProcessedJob {
                job_id: job.id,
                job_type: job.job_type,
                success: true,
                report: Some(report),
                error: None,
            }))
        }
        Err(err) => {
            let message = format!("{err:#}");
            error!(
                target: "processor",
                job_id = %job.id,
                job_type = %job.job_type,
                error = %message,
                "job failed"
            );
            ctx.jobs.mark_failed(job.id, &message, now).await?;
            broadcast_transition(ctx, &job.id, job.job_type, job.week_number, JobStatus::Failed)
                .await;
            Ok(ProcessOutcome::Processed(ProcessedJob {
                job_id: job.id,
                job_type: job.job_type,
                success: false,
                report: None,
                error: Some(message),
            }))
        }
    }
}

async fn broadcast_transition(
    ctx: &PipelineContext,
    job_id: &JobId,
    job_type: JobType,
    week_number: i64,
    status: JobStatus,
) {
    let event = DomainEvent::new(
        "job.transitioned",
        JobTransitionPayload {
            job_id: *job_id,
            job_type,
            week_number,
            status,
        },
    );
    match serde_json::to_string(&event) {
        Ok(payload) => ctx.hub.broadcast("jobs", &payload).await,
        Err(err) => debug!(target: "processor", error = %err, "failed to serialize transition event"),
    }
}
