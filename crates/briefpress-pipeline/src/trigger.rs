// SPDX-License-Identifier: GPL-3.0-or-later
//! The idempotent cycle-start entry point, invoked by external periodic
//! triggers (the weekly cron plus a backup at a different offset). The
//! existence check here is the de-facto idempotency guard for the whole
//! cycle-start flow.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use briefpress_domain::{week_number_of, TriggerOutcome, TriggerRecord};

use crate::orchestrator::{start_cycle, CycleStartReport};
use crate::PipelineContext;

#[derive(Debug, Serialize)]
pub struct TickReport {
    pub week_number: i64,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<CycleStartReport>,
}

/// Compute the current week from the configured epoch and start its cycle
/// unless one already exists. Every invocation is recorded in the trigger
/// log, skipped or not.
pub async fn tick(ctx: &PipelineContext, source: &str, now: DateTime<Utc>) -> Result<TickReport> {
    let week_number = week_number_of(now, ctx.scheduler.epoch);

    if ctx.jobs.week_has_jobs(week_number).await? {
        info!(target: "trigger", week_number, source, "cycle already enqueued, skipping");
        ctx.triggers
            .record(TriggerRecord::new(week_number, source, TriggerOutcome::Skipped))
            .await?;
        return Ok(TickReport {
            week_number,
            skipped: true,
            cycle: None,
        });
    }

    let report = start_cycle(ctx, week_number, now).await?;
    ctx.triggers
        .record(TriggerRecord::new(week_number, source, TriggerOutcome::Started))
        .await?;

    info!(target: "trigger", week_number, source, "weekly cycle started");

    Ok(TickReport {
        week_number,
        skipped: false,
        cycle: Some(report),
    })
}
