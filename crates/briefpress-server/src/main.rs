// SPDX-License-Identifier: GPL-3.0-or-later
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::serve;
use briefpress_api::router;
use briefpress_config::load as load_config;
use briefpress_generation::{ContentWriter, ImageStudio, ResearchScraper};
use briefpress_pipeline::{AppState, PipelineContext};
use briefpress_realtime::NoopRealtimeHub;
use briefpress_store::{
    init_database, SqliteJobRepository, SqlitePostRepository, SqliteSourceRepository,
    SqliteTriggerLogRepository,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config(None)?;
    let pool = init_database(&config).await?;

    let pipeline = PipelineContext {
        jobs: Arc::new(SqliteJobRepository::new(pool.clone())),
        posts: Arc::new(SqlitePostRepository::new(pool.clone())),
        sources: Arc::new(SqliteSourceRepository::new(pool.clone())),
        triggers: Arc::new(SqliteTriggerLogRepository::new(pool)),
        scraper: Arc::new(ResearchScraper::new(&config.generation.scraper)?),
        writer: Arc::new(ContentWriter::new(&config.generation.writer)?),
        images: Arc::new(ImageStudio::new(&config.generation.images)?),
        hub: Arc::new(NoopRealtimeHub),
        scheduler: config.scheduler.clone(),
    };

    let state = AppState::new(config.clone(), Arc::new(pipeline));
    state.on_start();

    let listener = TcpListener::bind(bind_addr(&config.http)).await?;
    let addr = listener.local_addr()?;
    info!(target: "server", "listening on {}", addr);

    serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing() {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn bind_addr(http: &briefpress_config::HttpConfig) -> SocketAddr {
    let addr = format!("{}:{}", http.host, http.port);
    addr.parse().expect("valid listen address")
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let mut interrupt = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
        .expect("install SIGINT handler");

    #[cfg(unix)]
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("install SIGTERM handler");

    #[cfg(unix)]
    tokio::select! {
        _ = interrupt.recv() => {},
        _ = terminate.recv() => {},
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("ctrl_c handler");
    }

    info!(target: "server", "shutdown signal received");
}
