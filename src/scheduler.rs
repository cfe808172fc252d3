//! Periodic in-process refresh.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::pipeline::RefreshPipeline;

/// Runs `refresh_all` every `period`, first tick one period after start.
/// A refresh that overruns its slot skips the missed ticks.
pub fn spawn_refresh_scheduler(pipeline: Arc<RefreshPipeline>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!("Refresh scheduler started, every {}s", period.as_secs());

        loop {
            interval.tick().await;
            let report = pipeline.refresh_all().await;
            tracing::info!(
                "Scheduled refresh wrote {} records with {} failure(s)",
                report.total_records(),
                report.failures()
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::snapshot::SnapshotCache;
    use crate::store::{InfluencerStore, MemoryStore};
    use crate::youtube::YouTubeClient;

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_refreshes_on_interval() {
        let store = Arc::new(MemoryStore::new());
        let youtube = YouTubeClient::new("http://127.0.0.1:9").unwrap();
        let pipeline = Arc::new(RefreshPipeline::new(
            store.clone(),
            store.clone(),
            youtube,
            EventBus::default(),
            SnapshotCache::default(),
            Some(3),
        ));

        let handle = spawn_refresh_scheduler(pipeline, Duration::from_secs(60));
        tokio::task::yield_now().await;
        assert_eq!(store.count().await.unwrap(), 0);

        tokio::time::sleep(Duration::from_secs(61)).await;
        let mut count = 0;
        for _ in 0..50 {
            count = store.count().await.unwrap();
            if count == 500 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(count, 500);

        handle.abort();
    }
}
