// SPDX-License-Identifier: GPL-3.0-or-later
//! Read-only cycle progress aggregation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use briefpress_domain::{JobId, JobStatus, JobType};

use crate::PipelineContext;

#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub job_type: JobType,
    pub status: JobStatus,
    pub scheduled_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleStatusReport {
    pub week_number: i64,
    pub total: u32,
    pub completed: u32,
    pub in_progress: u32,
    pub pending: u32,
    pub failed: u32,
    pub progress_percentage: u32,
    pub jobs: Vec<JobSummary>,
}

/// Group the week's jobs by status. A week with no jobs yet reports zero
/// totals and zero percent rather than erroring.
pub async fn cycle_status(ctx: &PipelineContext, week_number: i64) -> Result<CycleStatusReport> {
    let jobs = ctx.jobs.list_by_week(week_number).await?;

    let mut completed = 0u32;
    let mut in_progress = 0u32;
    let mut pending = 0u32;
    let mut failed = 0u32;
    for job in &jobs {
        match job.status {
            JobStatus::Completed => completed += 1,
            JobStatus::InProgress => in_progress += 1,
            JobStatus::Pending => pending += 1,
            JobStatus::Failed => failed += 1,
        }
    }

    let total = jobs.len() as u32;
    let progress_percentage = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };

    let summaries = jobs
        .into_iter()
        .map(|job| JobSummary {
            id: job.id,
            job_type: job.job_type,
            status: job.status,
            scheduled_at: job.scheduled_at,
            completed_at: job.completed_at,
            error: job.error,
        })
        .collect();

    Ok(CycleStatusReport {
        week_number,
        total,
        completed,
        in_progress,
        pending,
        failed,
        progress_percentage,
        jobs: summaries,
    })
}
