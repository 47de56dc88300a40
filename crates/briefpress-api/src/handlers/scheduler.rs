// SPDX-License-Identifier: GPL-3.0-or-later
//! Entry points for the external timers: the weekly scheduler tick and the
//! high-frequency processor poll.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use briefpress_pipeline::{process_next, tick, AppState, ProcessOutcome};

use super::cycle::ErrorResponse;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TickRequest {
    /// Which timer fired: "cron" (default) or "backup".
    pub source: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TickResponse {
    pub success: bool,
    pub week_number: i64,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs_created: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<String>,
}

/// Weekly trigger: compute the current week and start its cycle at most once.
#[utoipa::path(
    post,
    path = "/api/v1/scheduler-tick",
    request_body = TickRequest,
    responses(
        (status = 200, description = "Tick handled", body = TickResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "pipeline"
)]
pub async fn scheduler_tick_endpoint(
    State(state): State<AppState>,
    request: Option<Json<TickRequest>>,
) -> impl IntoResponse {
    let source = request
        .and_then(|Json(r)| r.source)
        .unwrap_or_else(|| "cron".to_string());

    match tick(&state.pipeline, &source, Utc::now()).await {
        Ok(report) => (
            StatusCode::OK,
            Json(TickResponse {
                success: true,
                week_number: report.week_number,
                skipped: report.skipped,
                jobs_created: report.cycle.as_ref().map(|c| c.jobs.len() as u32),
                estimated_completion: report
                    .cycle
                    .as_ref()
                    .map(|c| c.estimated_completion.to_rfc3339()),
            }),
        )
            .into_response(),
        Err(err) => {
            error!(target: "api", error = %format!("{err:#}"), "scheduler tick failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("{err:#}"),
                }),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProcessNextResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Processor poll: claim and execute at most one due job. A handler failure
/// is reported in the body, never as an HTTP error.
#[utoipa::path(
    post,
    path = "/api/v1/process-next",
    responses(
        (status = 200, description = "One job processed, or nothing ready", body = ProcessNextResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "pipeline"
)]
pub async fn process_next_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    match process_next(&state.pipeline, &state.registry, Utc::now()).await {
        Ok(ProcessOutcome::NoJobsReady) => (
            StatusCode::OK,
            Json(ProcessNextResponse {
                job_id: None,
                job_type: None,
                success: None,
                result: None,
                error: None,
                message: Some("No jobs ready for processing".to_string()),
            }),
        )
            .into_response(),
        Ok(ProcessOutcome::Processed(processed)) => {
            let result = processed
                .report
                .as_ref()
                .and_then(|r| serde_json::to_value(r).ok());
            (
                StatusCode::OK,
                Json(ProcessNextResponse {
                    job_id: Some(processed.job_id.to_string()),
                    job_type: Some(processed.job_type.to_string()),
                    success: Some(processed.success),
                    result,
                    error: processed.error,
                    message: None,
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!(target: "api", error = %format!("{err:#}"), "process-next failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("{err:#}"),
                }),
            )
                .into_response()
        }
    }
}
