// SPDX-License-Identifier: GPL-3.0-or-later
pub mod handlers;
pub mod middleware;

use axum::{middleware as axum_middleware, routing::get, routing::post, Json, Router};
use briefpress_pipeline::AppState;
use handlers::cycle::{
    cycle_endpoint, CycleRequest, CycleStatusBody, CycleStatusDto, ErrorResponse, JobSummaryDto,
    StartCycleResponse, __path_cycle_endpoint,
};
use handlers::scheduler::{
    process_next_endpoint, scheduler_tick_endpoint, ProcessNextResponse, TickRequest,
    TickResponse, __path_process_next_endpoint, __path_scheduler_tick_endpoint,
};
use middleware::auth::auth_middleware;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Serialize, utoipa::ToSchema)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
#[allow(dead_code)]
async fn health() -> Json<HealthResponse> {
    health_handler().await
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        cycle_endpoint,
        scheduler_tick_endpoint,
        process_next_endpoint,
    ),
    components(
        schemas(
            HealthResponse,
            CycleRequest,
            StartCycleResponse,
            CycleStatusDto,
            CycleStatusBody,
            JobSummaryDto,
            TickRequest,
            TickResponse,
            ProcessNextResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "pipeline", description = "Weekly content pipeline endpoints")
    ),
    info(
        title = "Briefpress API",
        version = "0.1.0",
        description = "Weekly content pipeline scheduler for the Briefpress site",
    )
)]
struct ApiDoc;

pub fn router(state: AppState) -> Router {
    info!(target: "api", "building router");

    let api_v1 = Router::new()
        .route("/cycle", post(cycle_endpoint))
        .route("/scheduler-tick", post(scheduler_tick_endpoint))
        .route("/process-next", post(process_next_endpoint))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let openapi = ApiDoc::openapi();

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", api_v1)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", openapi))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
