//! Refresh pipeline: fetch a batch per platform and write it to the store.
//!
//! Platforms are independent. Fetches run concurrently; a platform whose
//! write fails is reported and skipped without touching the others. YouTube is
//! the only platform with a live source, and any problem on that path
//! (missing key, upstream error, open circuit) degrades to mock data.
//! A successful write drops the cached snapshot before it is announced.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::errors::{AppError, ResultExt};
use crate::events::{ChangeEvent, ChangeKind, EventBus};
use crate::mock_data::{generate_mock_influencers, mock_categories};
use crate::models::{NewInfluencer, Platform};
use crate::snapshot::SnapshotCache;
use crate::store::{CredentialStore, InfluencerStore};
use crate::youtube::{channels_to_influencers, YouTubeClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Mock,
}

/// How a platform's batch is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistStrategy {
    /// Insert or update on (platform, handle).
    Upsert,
    /// Delete the platform's records, then insert the batch.
    Replace,
}

impl PersistStrategy {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Youtube => PersistStrategy::Replace,
            _ => PersistStrategy::Upsert,
        }
    }

    fn change_kind(self) -> ChangeKind {
        match self {
            PersistStrategy::Upsert => ChangeKind::Upsert,
            PersistStrategy::Replace => ChangeKind::Replace,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedBatch {
    pub records: Vec<NewInfluencer>,
    pub source: DataSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformOutcome {
    pub platform: Platform,
    pub source: DataSource,
    pub strategy: PersistStrategy,
    /// Records written; 0 when the write failed.
    pub count: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub platforms: Vec<PlatformOutcome>,
}

impl RefreshReport {
    pub fn failures(&self) -> usize {
        self.platforms.iter().filter(|p| p.error.is_some()).count()
    }

    pub fn total_records(&self) -> u64 {
        self.platforms.iter().map(|p| p.count).sum()
    }

    pub fn outcome(&self, platform: Platform) -> Option<&PlatformOutcome> {
        self.platforms.iter().find(|p| p.platform == platform)
    }
}

pub struct RefreshPipeline {
    store: Arc<dyn InfluencerStore>,
    credentials: Arc<dyn CredentialStore>,
    youtube: YouTubeClient,
    events: EventBus,
    snapshot: SnapshotCache,
    rng: Mutex<StdRng>,
}

impl RefreshPipeline {
    /// `seed` fixes the mock generator for reproducible batches.
    pub fn new(
        store: Arc<dyn InfluencerStore>,
        credentials: Arc<dyn CredentialStore>,
        youtube: YouTubeClient,
        events: EventBus,
        snapshot: SnapshotCache,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            store,
            credentials,
            youtube,
            events,
            snapshot,
            rng: Mutex::new(rng),
        }
    }

    /// Refreshes every platform, isolating failures per platform.
    pub async fn refresh_all(&self) -> RefreshReport {
        let started_at = Utc::now();
        tracing::info!("Starting to update all platforms");

        let batches = join_all(
            Platform::ALL
                .into_iter()
                .map(|platform| async move { (platform, self.fetch_batch(platform).await) }),
        )
        .await;

        let mut platforms = Vec::with_capacity(batches.len());
        for (platform, batch) in batches {
            let strategy = PersistStrategy::for_platform(platform);
            let outcome = match self.persist(platform, strategy, &batch.records).await {
                Ok(count) => {
                    tracing::info!("Successfully updated {} {} influencers", count, platform);
                    PlatformOutcome {
                        platform,
                        source: batch.source,
                        strategy,
                        count,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to update {}: {}", platform, e);
                    PlatformOutcome {
                        platform,
                        source: batch.source,
                        strategy,
                        count: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            platforms.push(outcome);
        }

        let report = RefreshReport {
            started_at,
            finished_at: Utc::now(),
            platforms,
        };
        tracing::info!(
            "Completed updating all platforms: {} records, {} failure(s)",
            report.total_records(),
            report.failures()
        );
        report
    }

    /// Refreshes one platform. Store errors are returned to the caller.
    pub async fn refresh_platform(&self, platform: Platform) -> Result<PlatformOutcome, AppError> {
        tracing::info!("Starting {} influencer update", platform);

        let batch = self.fetch_batch(platform).await;
        let strategy = PersistStrategy::for_platform(platform);
        let count = self.persist(platform, strategy, &batch.records).await?;

        tracing::info!("Successfully updated {} {} influencers", count, platform);
        Ok(PlatformOutcome {
            platform,
            source: batch.source,
            strategy,
            count,
            error: None,
        })
    }

    async fn fetch_batch(&self, platform: Platform) -> FetchedBatch {
        tracing::info!("Fetching top {} influencers", platform);
        match platform {
            Platform::Youtube => self.fetch_youtube().await,
            _ => self.mock_batch(platform),
        }
    }

    async fn fetch_youtube(&self) -> FetchedBatch {
        let api_key = match self.credentials.api_key(Platform::Youtube).await {
            Ok(Some(key)) if !key.trim().is_empty() => key,
            Ok(_) => {
                tracing::info!("No YouTube API key found, using mock data");
                return self.mock_batch(Platform::Youtube);
            }
            Err(e) => {
                tracing::warn!("YouTube credential lookup failed, using mock data: {}", e);
                return self.mock_batch(Platform::Youtube);
            }
        };

        tracing::info!("YouTube API key found, attempting to fetch real data");
        match self.youtube.fetch_popular_channels(&api_key).await {
            Ok(channels) if !channels.is_empty() => FetchedBatch {
                records: channels_to_influencers(&channels),
                source: DataSource::Live,
            },
            Ok(_) => {
                tracing::warn!("YouTube API returned no channels, falling back to mock data");
                self.mock_batch(Platform::Youtube)
            }
            Err(e) => {
                tracing::error!("Error with YouTube API, falling back to mock data: {}", e);
                self.mock_batch(Platform::Youtube)
            }
        }
    }

    fn mock_batch(&self, platform: Platform) -> FetchedBatch {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        FetchedBatch {
            records: generate_mock_influencers(platform, mock_categories(platform), &mut *rng),
            source: DataSource::Mock,
        }
    }

    async fn persist(
        &self,
        platform: Platform,
        strategy: PersistStrategy,
        records: &[NewInfluencer],
    ) -> Result<u64, AppError> {
        tracing::debug!(
            "Persisting {} {} influencers ({:?})",
            records.len(),
            platform,
            strategy
        );

        let count = match strategy {
            PersistStrategy::Upsert => self.store.upsert_batch(records).await,
            PersistStrategy::Replace => self.store.replace_platform(platform, records).await,
        }
        .with_context(|| format!("persisting {} influencers", platform))?;

        self.snapshot.invalidate().await;
        self.events
            .publish(ChangeEvent::new(Some(platform), strategy.change_kind(), count));
        Ok(count)
    }
}
