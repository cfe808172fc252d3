//! Cached, immutable snapshot of the record set read by the listing endpoints.
//!
//! Writers call [`SnapshotCache::invalidate`] after every successful write,
//! before returning. A load that raced with a write never stays cached.

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::AppError;
use crate::models::Influencer;
use crate::store::InfluencerStore;

pub type Snapshot = Arc<Vec<Influencer>>;

#[derive(Clone)]
pub struct SnapshotCache {
    cache: Cache<(), Snapshot>,
    /// Bumped on every invalidation.
    generation: Arc<AtomicU64>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current snapshot, re-pulled from the store when missing or expired.
    pub async fn get_or_load(&self, store: &dyn InfluencerStore) -> Result<Snapshot, AppError> {
        if let Some(snapshot) = self.cache.get(&()).await {
            return Ok(snapshot);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let snapshot: Snapshot = Arc::new(store.list_all().await?);
        tracing::debug!("Loaded snapshot of {} influencers", snapshot.len());

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Store changed during load; not caching snapshot");
            return Ok(snapshot);
        }
        self.cache.insert((), Arc::clone(&snapshot)).await;

        // An invalidation between the check and the insert must still win
        if self.generation.load(Ordering::SeqCst) != generation {
            self.cache.invalidate(&()).await;
        }
        Ok(snapshot)
    }

    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(&()).await;
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewInfluencer, Platform};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use tokio::sync::{Notify, Semaphore};
    use uuid::Uuid;

    fn record(handle: &str) -> NewInfluencer {
        NewInfluencer {
            name: handle.to_string(),
            handle: handle.to_string(),
            followers: 10,
            image_url: String::new(),
            category: "music".to_string(),
            platform: Platform::Tiktok,
            country: "UK".to_string(),
            region: "Europe".to_string(),
            description: String::new(),
            rank: 1,
        }
    }

    #[tokio::test]
    async fn test_snapshot_is_cached_until_invalidated() {
        let store = MemoryStore::new();
        let cache = SnapshotCache::default();

        store.upsert_batch(&[record("@one")]).await.unwrap();
        assert_eq!(cache.get_or_load(&store).await.unwrap().len(), 1);

        store.upsert_batch(&[record("@two")]).await.unwrap();
        assert_eq!(cache.get_or_load(&store).await.unwrap().len(), 1);

        cache.invalidate().await;
        assert_eq!(cache.get_or_load(&store).await.unwrap().len(), 2);
    }

    /// Store whose `list_all` reads its records, then waits for a permit.
    struct GatedStore {
        inner: MemoryStore,
        entered: Notify,
        gate: Semaphore,
    }

    impl GatedStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                entered: Notify::new(),
                gate: Semaphore::new(0),
            }
        }
    }

    #[async_trait]
    impl InfluencerStore for GatedStore {
        async fn list_all(&self) -> Result<Vec<Influencer>, AppError> {
            let records = self.inner.list_all().await?;
            self.entered.notify_one();
            self.gate.acquire().await.unwrap().forget();
            Ok(records)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Influencer>, AppError> {
            self.inner.find_by_id(id).await
        }

        async fn count(&self) -> Result<i64, AppError> {
            self.inner.count().await
        }

        async fn upsert_batch(&self, records: &[NewInfluencer]) -> Result<u64, AppError> {
            self.inner.upsert_batch(records).await
        }

        async fn replace_platform(
            &self,
            platform: Platform,
            records: &[NewInfluencer],
        ) -> Result<u64, AppError> {
            self.inner.replace_platform(platform, records).await
        }
    }

    #[tokio::test]
    async fn test_load_racing_a_write_is_not_cached() {
        let store = Arc::new(GatedStore::new());
        let cache = SnapshotCache::default();

        let loader = {
            let (store, cache) = (store.clone(), cache.clone());
            tokio::spawn(async move { cache.get_or_load(store.as_ref()).await.unwrap().len() })
        };

        // The loader has read the empty set; a write lands before it finishes
        store.entered.notified().await;
        store.upsert_batch(&[record("@late")]).await.unwrap();
        cache.invalidate().await;
        store.gate.add_permits(1);
        assert_eq!(loader.await.unwrap(), 0);

        store.gate.add_permits(1);
        assert_eq!(cache.get_or_load(store.as_ref()).await.unwrap().len(), 1);
    }
}
