//! Scheduled cache refresh.

use crate::{ConfigCacheService, RoleCacheService};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::error;

/// Spawn the background job that re-validates both cache services.
///
/// The first refresh runs immediately, then repeats every `interval`. Runs as
/// its own task so a slow store round-trip never blocks event handling.
pub fn spawn_refresh_job(
    config: Arc<ConfigCacheService>,
    roles: Arc<RoleCacheService>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(error) = config.refresh().await {
                error!(%error, "Config cache refresh failed");
            }
            if let Err(error) = roles.refresh().await {
                error!(%error, "Reaction-role cache refresh failed");
            }
        }
    })
}
