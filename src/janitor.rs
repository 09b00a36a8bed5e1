use std::sync::Arc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::lookup::LookupService;
use crate::metrics::CACHE_SIZE;

// Periodic sweep of expired cache entries and elapsed rate windows
pub async fn janitor(service: Arc<LookupService>, sweep_interval: Duration) {
    let mut interval = interval(sweep_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval = ?sweep_interval, "janitor started");

    loop {
        interval.tick().await;
        let (evicted, pruned) = sweep(&service);
        if evicted > 0 || pruned > 0 {
            debug!(evicted, pruned, "janitor sweep");
        }
    }
}

pub fn sweep(service: &LookupService) -> (usize, usize) {
    let evicted = service.cache().sweep_expired();
    let pruned = service.limiter().prune_stale();
    CACHE_SIZE.set(service.cache().len() as f64);
    (evicted, pruned)
}
