//! Built-in starter list used to fill an empty directory.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::events::{ChangeEvent, ChangeKind, EventBus};
use crate::models::{NewInfluencer, Platform};
use crate::snapshot::SnapshotCache;
use crate::store::InfluencerStore;

const SEED_JSON: &str = include_str!("../data/seed_influencers.json");

#[derive(Debug, Deserialize)]
struct SeedEntry {
    name: String,
    handle: String,
    followers: i64,
    image_url: String,
    category: String,
    platform: Platform,
    country: String,
    region: String,
    description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    /// Whether the seed list was written.
    pub seeded: bool,
    /// Records inserted, or records already present when skipped.
    pub count: u64,
}

/// The starter list, ranked in file order.
pub fn seed_influencers() -> Result<Vec<NewInfluencer>, AppError> {
    let entries: Vec<SeedEntry> = serde_json::from_str(SEED_JSON)
        .map_err(|e| AppError::InternalError(format!("Invalid seed data: {}", e)))?;

    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(index, e)| NewInfluencer {
            name: e.name,
            handle: e.handle,
            followers: e.followers,
            image_url: e.image_url,
            category: e.category,
            platform: e.platform,
            country: e.country,
            region: e.region,
            description: e.description,
            rank: index as i32 + 1,
        })
        .collect())
}

/// Writes the starter list when the store holds no records; otherwise a no-op.
pub async fn seed_if_empty(
    store: &dyn InfluencerStore,
    snapshot: &SnapshotCache,
    events: &EventBus,
) -> Result<SeedOutcome, AppError> {
    let existing = store.count().await?;
    if existing > 0 {
        tracing::info!("Store already holds {} influencers; skipping seed", existing);
        return Ok(SeedOutcome {
            seeded: false,
            count: existing as u64,
        });
    }

    let records = seed_influencers()?;
    let count = store.upsert_batch(&records).await?;
    tracing::info!("Seeded {} influencers", count);
    snapshot.invalidate().await;
    events.publish(ChangeEvent::new(None, ChangeKind::Seed, count));

    Ok(SeedOutcome {
        seeded: true,
        count,
    })
}
