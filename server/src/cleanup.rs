use std::{sync::Arc, time::Duration};

use rocket::{
    Build, Rocket,
    fairing::{Fairing, Info, Kind},
};
use tokio::time;
use tracing::{debug, info, warn};

use crate::registry::SessionRegistry;

pub async fn start_cleanup_task(
    registry: Arc<SessionRegistry>,
    interval: Duration,
    inactive_timeout: Duration,
    finished_timeout: Duration,
) {
    let mut ticker = time::interval(interval.max(Duration::from_secs(1)));

    info!(
        "Started session cleanup task: checking every {}s, inactive timeout: {}s, finished timeout: {}s",
        interval.as_secs(),
        inactive_timeout.as_secs(),
        finished_timeout.as_secs()
    );

    loop {
        ticker.tick().await;
        let removed = registry.evict_stale(inactive_timeout, finished_timeout);
        if removed > 0 {
            info!("Cleaned up {} stale sessions", removed);
        } else {
            debug!("No stale sessions, {} live", registry.len());
        }
    }
}

/// Spawns [`start_cleanup_task`] once rocket has its managed registry.
pub struct CleanupFairing {
    pub interval: Duration,
    pub inactive_timeout: Duration,
    pub finished_timeout: Duration,
}

#[rocket::async_trait]
impl Fairing for CleanupFairing {
    fn info(&self) -> Info {
        Info {
            name: "Session Cleanup Task",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        if let Some(registry) = rocket.state::<Arc<SessionRegistry>>() {
            info!("Starting cleanup task for session management");
            let registry = registry.clone();
            let (interval, inactive, finished) =
                (self.interval, self.inactive_timeout, self.finished_timeout);
            tokio::spawn(async move {
                start_cleanup_task(registry, interval, inactive, finished).await;
            });
        } else {
            warn!("Failed to get session registry for cleanup task");
        }
        Ok(rocket)
    }
}
