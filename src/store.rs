//! Record store: influencer table and platform credentials.
//!
//! Implemented by [`PgStore`] (Postgres) and [`MemoryStore`] (local runs and
//! tests). Both keep the same contract: `list_all` is ordered by rank,
//! `upsert_batch` is keyed on (platform, handle), and `replace_platform`
//! swaps a platform's whole set atomically.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::{AppError, ResultExt};
use crate::models::{Influencer, NewInfluencer, Platform};

#[async_trait]
pub trait InfluencerStore: Send + Sync {
    /// Every record, ordered by rank.
    async fn list_all(&self) -> Result<Vec<Influencer>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Influencer>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    /// Inserts or updates records keyed on (platform, handle).
    async fn upsert_batch(&self, records: &[NewInfluencer]) -> Result<u64, AppError>;

    /// Deletes every record of `platform`, then inserts `records`.
    async fn replace_platform(
        &self,
        platform: Platform,
        records: &[NewInfluencer],
    ) -> Result<u64, AppError>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// API key for a platform, `None` when none is stored.
    async fn api_key(&self, platform: Platform) -> Result<Option<String>, AppError>;

    async fn set_api_key(&self, platform: Platform, api_key: &str) -> Result<(), AppError>;
}

const SELECT_INFLUENCERS: &str = "SELECT id, name, handle, followers, image_url, category, platform, \
     country, region, description, rank, last_updated FROM influencers";

// ============ Postgres ============

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn insert_query<'a>(records: &'a [NewInfluencer]) -> QueryBuilder<'a, Postgres> {
        let now = Utc::now();
        let mut qb = QueryBuilder::new(
            "INSERT INTO influencers (id, name, handle, followers, image_url, category, \
             platform, country, region, description, rank, last_updated) ",
        );
        qb.push_values(records, |mut row, r| {
            row.push_bind(Uuid::new_v4())
                .push_bind(&r.name)
                .push_bind(&r.handle)
                .push_bind(r.followers)
                .push_bind(&r.image_url)
                .push_bind(&r.category)
                .push_bind(r.platform.as_str())
                .push_bind(&r.country)
                .push_bind(&r.region)
                .push_bind(&r.description)
                .push_bind(r.rank)
                .push_bind(now);
        });
        qb
    }
}

#[async_trait]
impl InfluencerStore for PgStore {
    async fn list_all(&self) -> Result<Vec<Influencer>, AppError> {
        let records = sqlx::query_as::<_, Influencer>(&format!(
            "{} ORDER BY rank ASC, platform ASC, handle ASC",
            SELECT_INFLUENCERS
        ))
        .fetch_all(&self.pool)
        .await
        .context("listing influencers")?;

        Ok(records)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Influencer>, AppError> {
        let record =
            sqlx::query_as::<_, Influencer>(&format!("{} WHERE id = $1", SELECT_INFLUENCERS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(record)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM influencers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn upsert_batch(&self, records: &[NewInfluencer]) -> Result<u64, AppError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut qb = Self::insert_query(records);
        qb.push(
            " ON CONFLICT (platform, handle) DO UPDATE SET \
                 name         = EXCLUDED.name, \
                 followers    = EXCLUDED.followers, \
                 image_url    = EXCLUDED.image_url, \
                 category     = EXCLUDED.category, \
                 country      = EXCLUDED.country, \
                 region       = EXCLUDED.region, \
                 description  = EXCLUDED.description, \
                 rank         = EXCLUDED.rank, \
                 last_updated = EXCLUDED.last_updated",
        );

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .context("upserting influencers")?;

        Ok(result.rows_affected())
    }

    async fn replace_platform(
        &self,
        platform: Platform,
        records: &[NewInfluencer],
    ) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM influencers WHERE platform = $1")
            .bind(platform.as_str())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("deleting {} influencers", platform))?;
        tracing::debug!("Deleted {} {} influencers", deleted.rows_affected(), platform);

        let inserted = if records.is_empty() {
            0
        } else {
            Self::insert_query(records)
                .build()
                .execute(&mut *tx)
                .await
                .with_context(|| format!("inserting {} influencers", platform))?
                .rows_affected()
        };

        tx.commit().await?;
        Ok(inserted)
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn api_key(&self, platform: Platform) -> Result<Option<String>, AppError> {
        let key: Option<(Option<String>,)> =
            sqlx::query_as("SELECT api_key FROM platform_credentials WHERE platform = $1")
                .bind(platform.as_str())
                .fetch_optional(&self.pool)
                .await
                .context("looking up platform credential")?;

        Ok(key.and_then(|(k,)| k))
    }

    async fn set_api_key(&self, platform: Platform, api_key: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO platform_credentials (platform, api_key) VALUES ($1, $2) \
             ON CONFLICT (platform) DO UPDATE SET api_key = EXCLUDED.api_key",
        )
        .bind(platform.as_str())
        .bind(api_key)
        .execute(&self.pool)
        .await
        .context("storing platform credential")?;

        Ok(())
    }
}

// ============ In-memory ============

/// Store used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Influencer>>,
    credentials: RwLock<HashMap<Platform, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InfluencerStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Influencer>, AppError> {
        let mut records = self.records.read().await.clone();
        records.sort_by(|a, b| {
            a.rank
                .cmp(&b.rank)
                .then_with(|| a.platform.as_str().cmp(b.platform.as_str()))
                .then_with(|| a.handle.cmp(&b.handle))
        });
        Ok(records)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Influencer>, AppError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.records.read().await.len() as i64)
    }

    async fn upsert_batch(&self, records: &[NewInfluencer]) -> Result<u64, AppError> {
        let now = Utc::now();
        let mut stored = self.records.write().await;

        for record in records {
            match stored
                .iter_mut()
                .find(|r| r.platform == record.platform && r.handle == record.handle)
            {
                Some(existing) => {
                    *existing = record.clone().into_influencer(existing.id, now);
                }
                None => stored.push(record.clone().into_influencer(Uuid::new_v4(), now)),
            }
        }

        Ok(records.len() as u64)
    }

    async fn replace_platform(
        &self,
        platform: Platform,
        records: &[NewInfluencer],
    ) -> Result<u64, AppError> {
        let now = Utc::now();
        let mut stored = self.records.write().await;

        stored.retain(|r| r.platform != platform);
        stored.extend(
            records
                .iter()
                .cloned()
                .map(|r| r.into_influencer(Uuid::new_v4(), now)),
        );

        Ok(records.len() as u64)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn api_key(&self, platform: Platform) -> Result<Option<String>, AppError> {
        Ok(self.credentials.read().await.get(&platform).cloned())
    }

    async fn set_api_key(&self, platform: Platform, api_key: &str) -> Result<(), AppError> {
        self.credentials
            .write()
            .await
            .insert(platform, api_key.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(platform: Platform, handle: &str, rank: i32) -> NewInfluencer {
        NewInfluencer {
            name: handle.trim_start_matches('@').to_string(),
            handle: handle.to_string(),
            followers: 1_000,
            image_url: "https://img".to_string(),
            category: "sports".to_string(),
            platform,
            country: "USA".to_string(),
            region: "North America".to_string(),
            description: String::new(),
            rank,
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_identity_per_platform_handle() {
        let store = MemoryStore::new();
        store
            .upsert_batch(&[record(Platform::Instagram, "@a", 1)])
            .await
            .unwrap();
        let first = store.list_all().await.unwrap()[0].clone();

        let mut updated = record(Platform::Instagram, "@a", 5);
        updated.followers = 9_999;
        store.upsert_batch(&[updated]).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[0].followers, 9_999);
        assert_eq!(all[0].rank, 5);
    }

    #[tokio::test]
    async fn test_same_handle_on_other_platform_is_distinct() {
        let store = MemoryStore::new();
        store
            .upsert_batch(&[
                record(Platform::Instagram, "@a", 1),
                record(Platform::Twitter, "@a", 1),
            ])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_replace_platform_leaves_other_platforms() {
        let store = MemoryStore::new();
        store
            .upsert_batch(&[
                record(Platform::Youtube, "@old", 1),
                record(Platform::Tiktok, "@keep", 1),
            ])
            .await
            .unwrap();

        store
            .replace_platform(
                Platform::Youtube,
                &[record(Platform::Youtube, "@new1", 1), record(Platform::Youtube, "@new2", 2)],
            )
            .await
            .unwrap();

        let handles: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.handle)
            .collect();
        assert_eq!(handles.len(), 3);
        assert!(handles.contains(&"@keep".to_string()));
        assert!(!handles.contains(&"@old".to_string()));
    }

    #[tokio::test]
    async fn test_list_all_orders_by_rank() {
        let store = MemoryStore::new();
        store
            .upsert_batch(&[
                record(Platform::Twitter, "@third", 3),
                record(Platform::Twitter, "@first", 1),
                record(Platform::Twitter, "@second", 2),
            ])
            .await
            .unwrap();

        let ranks: Vec<i32> = store.list_all().await.unwrap().iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_credentials_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.api_key(Platform::Youtube).await.unwrap(), None);

        store.set_api_key(Platform::Youtube, "secret").await.unwrap();
        assert_eq!(
            store.api_key(Platform::Youtube).await.unwrap(),
            Some("secret".to_string())
        );
    }
}
