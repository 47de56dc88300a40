// SPDX-License-Identifier: GPL-3.0-or-later
use tracing::info;

/// Outbound push channel for pipeline progress. The job processor broadcasts
/// every terminal job transition so dashboards can follow a cycle live.
#[async_trait::async_trait]
pub trait RealtimeHub: Send + Sync + 'static {
    async fn broadcast(&self, channel: &str, payload: &str);
}

pub struct NoopRealtimeHub;

#[async_trait::async_trait]
impl RealtimeHub for NoopRealtimeHub {
    async fn broadcast(&self, channel: &str, payload: &str) {
        info!(target: "realtime", %channel, %payload, "noop realtime broadcast");
    }
}
