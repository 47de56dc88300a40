// SPDX-License-Identifier: GPL-3.0-or-later
//! The `/cycle` endpoint: action-dispatched cycle start and status queries,
//! matching the wire contract the website's automation scripts consume.

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use briefpress_pipeline::{cycle_status, start_cycle, AppState, CycleStatusReport};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CycleRequest {
    pub action: String,
    pub week_number: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartCycleResponse {
    pub success: bool,
    pub jobs_created: u32,
    pub estimated_completion: String,
    /// Stage name to job id
    pub jobs: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobSummaryDto {
    pub id: String,
    pub job_type: String,
    pub status: String,
    pub scheduled_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CycleStatusDto {
    pub success: bool,
    pub status: CycleStatusBody,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CycleStatusBody {
    pub total_jobs: u32,
    pub completed: u32,
    pub in_progress: u32,
    pub pending: u32,
    pub failed: u32,
    pub progress_percentage: u32,
    pub jobs: Vec<JobSummaryDto>,
}

impl From<CycleStatusReport> for CycleStatusDto {
    fn from(report: CycleStatusReport) -> Self {
        Self {
            success: true,
            status: CycleStatusBody {
                total_jobs: report.total,
                completed: report.completed,
                in_progress: report.in_progress,
                pending: report.pending,
                failed: report.failed,
                progress_percentage: report.progress_percentage,
                jobs: report
                    .jobs
                    .into_iter()
                    .map(|job| JobSummaryDto {
                        id: job.id.to_string(),
                        job_type: job.job_type.to_string(),
                        status: job.status.to_string(),
                        scheduled_at: job.scheduled_at.to_rfc3339(),
                        completed_at: job.completed_at.map(|dt| dt.to_rfc3339()),
                        error: job.error,
                    })
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Start a weekly cycle or query its status.
#[utoipa::path(
    post,
    path = "/api/v1/cycle",
    request_body = CycleRequest,
    responses(
        (status = 200, description = "Action completed", body = StartCycleResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "pipeline"
)]
pub async fn cycle_endpoint(
    State(state): State<AppState>,
    Json(request): Json<CycleRequest>,
) -> impl IntoResponse {
    let Some(week_number) = request.week_number else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "week_number is required".to_string(),
            }),
        )
            .into_response();
    };

    match request.action.as_str() {
        "start_weekly_cycle" => {
            match start_cycle(&state.pipeline, week_number, Utc::now()).await {
                Ok(report) => {
                    let jobs: BTreeMap<String, String> = report
                        .jobs
                        .iter()
                        .map(|(job_type, id)| (job_type.to_string(), id.to_string()))
                        .collect();
                    (
                        StatusCode::OK,
                        Json(StartCycleResponse {
                            success: true,
                            jobs_created: jobs.len() as u32,
                            estimated_completion: report.estimated_completion.to_rfc3339(),
                            jobs,
                        }),
                    )
                        .into_response()
                }
                Err(err) => {
                    error!(target: "api", error = %format!("{err:#}"), "start_weekly_cycle failed");
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
        "get_cycle_status" => match cycle_status(&state.pipeline, week_number).await {
            Ok(report) => (StatusCode::OK, Json(CycleStatusDto::from(report))).into_response(),
            Err(err) => {
                error!(target: "api", error = %format!("{err:#}"), "get_cycle_status failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: format!("{err:#}"),
                    }),
                )
                    .into_response()
            }
        },
        other => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("unknown action: {other}"),
            }),
        )
            .into_response(),
    }
}
