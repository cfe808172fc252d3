//! YouTube Data API client and channel → influencer mapping.

use failsafe::futures::CircuitBreaker as _;
use futures::future::try_join_all;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::circuit_breaker::{create_api_circuit_breaker, ApiCircuitBreaker};
use crate::errors::AppError;
use crate::models::{NewInfluencer, Platform, DEFAULT_IMAGE_URL, UNKNOWN};
use crate::regions::region_for_country;

pub const DEFAULT_YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Channels tracked by the live refresh.
pub const POPULAR_CHANNEL_IDS: [&str; 10] = [
    "UCX6OQ3DkcsbYNE6H8uQQuVA", // MrBeast
    "UCq-Fj5jknLsUf-MWSy4_brA", // T-Series
    "UC-lHJZR3Gqxm24_Vd_AJ5Yw", // PewDiePie
    "UCJ5v_MCY6GNUBTO8-D3XoAg", // Cocomelon
    "UCbCmjCuTUZos6Inko4u57UQ", // SET India
    "UCK8sQmJBp8GCxrOtXWBpyEA", // Google
    "UC_x5XG1OV2P6uZZ5FSM9Ttw", // YouTube
    "UCpEhnqL0y41EpW2TvWAHD7Q", // Dude Perfect
    "UCY30JRSgfhYXA6i6xX1erWg", // WWE
    "UCWJ2lWNubArHWmf3FIHbfcQ", // NBA
];

const DESCRIPTION_LIMIT: usize = 200;

/// Ordered category → keyword table; the first category with a hit wins.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "gaming",
        &["gaming", "game", "playthrough", "gameplay", "xbox", "playstation", "nintendo", "fortnite", "minecraft"],
    ),
    (
        "music",
        &["music", "song", "singer", "band", "concert", "album", "rap", "hip hop", "rock", "pop"],
    ),
    (
        "education",
        &["education", "learn", "tutorial", "course", "study", "university", "college", "school", "academic"],
    ),
    (
        "entertainment",
        &["entertainment", "comedy", "funny", "humor", "sketch", "vlog", "challenge", "prank"],
    ),
    (
        "howto",
        &["how to", "diy", "tutorial", "guide", "tips", "tricks", "advice", "instructional"],
    ),
    (
        "sports",
        &["sports", "fitness", "workout", "exercise", "gym", "athlete", "football", "basketball", "soccer"],
    ),
    (
        "technology",
        &["tech", "technology", "gadget", "review", "unboxing", "smartphone", "computer", "coding", "programming"],
    ),
    (
        "fashion",
        &["fashion", "style", "clothing", "outfit", "beauty", "makeup", "cosmetics", "hairstyle"],
    ),
    (
        "food",
        &["food", "cooking", "recipe", "chef", "baking", "cuisine", "meal", "restaurant", "kitchen"],
    ),
    (
        "travel",
        &["travel", "adventure", "destination", "tourism", "vacation", "journey", "trip", "vlog"],
    ),
];

// ============ API Models ============

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<YouTubeChannel>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeChannel {
    pub id: String,
    pub snippet: ChannelSnippet,
    #[serde(default)]
    pub statistics: ChannelStatistics,
    #[serde(default)]
    pub branding_settings: Option<BrandingSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// Counts arrive as decimal strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    pub subscriber_count: Option<String>,
    pub view_count: Option<String>,
    pub video_count: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandingSettings {
    pub channel: Option<BrandingChannel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandingChannel {
    pub country: Option<String>,
}

impl YouTubeChannel {
    /// Branding country, then profile country, then `"Unknown"`.
    pub fn country(&self) -> String {
        self.branding_settings
            .as_ref()
            .and_then(|b| b.channel.as_ref())
            .and_then(|c| c.country.as_deref())
            .or(self.snippet.country.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string()
    }

    pub fn subscriber_count(&self) -> i64 {
        parse_count(self.statistics.subscriber_count.as_deref())
    }

    pub fn image_url(&self) -> String {
        let thumbs = &self.snippet.thumbnails;
        thumbs
            .high
            .as_ref()
            .or(thumbs.medium.as_ref())
            .or(thumbs.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string())
    }
}

// ============ Mapping ============

/// Infers a category from a channel description; `entertainment` when nothing matches.
pub fn determine_category(description: &str) -> &'static str {
    let description = description.to_lowercase();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| description.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or("entertainment")
}

/// Parses an API count string, 0 when absent or malformed.
pub fn parse_count(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|n| n.max(0))
        .unwrap_or(0)
}

/// `@` followed by the lower-cased title with all whitespace removed.
pub fn handle_from_title(title: &str) -> String {
    let compact: String = title.split_whitespace().collect();
    format!("@{}", compact.to_lowercase())
}

fn truncate_description(description: &str) -> String {
    let head: String = description.chars().take(DESCRIPTION_LIMIT).collect();
    format!("{}...", head)
}

/// Converts fetched channels into a ranked refresh batch.
///
/// Titles that collapse to the same handle keep only the first channel, and
/// ranks stay dense over what remains.
pub fn channels_to_influencers(channels: &[YouTubeChannel]) -> Vec<NewInfluencer> {
    let mut seen = HashSet::new();

    channels
        .iter()
        .map(|channel| (handle_from_title(&channel.snippet.title), channel))
        .filter(|(handle, channel)| {
            let fresh = seen.insert(handle.clone());
            if !fresh {
                tracing::debug!("Dropping channel {} with duplicate handle {}", channel.id, handle);
            }
            fresh
        })
        .enumerate()
        .map(|(index, (handle, channel))| {
            let country = channel.country();
            let region = region_for_country(&country).to_string();

            NewInfluencer {
                name: channel.snippet.title.clone(),
                handle,
                followers: channel.subscriber_count(),
                image_url: channel.image_url(),
                category: determine_category(&channel.snippet.description).to_string(),
                platform: Platform::Youtube,
                country,
                region,
                description: truncate_description(&channel.snippet.description),
                rank: index as i32 + 1,
            }
        })
        .collect()
}

// ============ Client ============

/// Client for the YouTube Data API v3 `channels` endpoint.
#[derive(Clone)]
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    breaker: ApiCircuitBreaker,
}

impl YouTubeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create YouTube client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            breaker: create_api_circuit_breaker(),
        })
    }

    /// Fetches the tracked channels concurrently.
    ///
    /// Any single failure fails the whole fetch. Calls are rejected without
    /// touching the network while the circuit breaker is open.
    pub async fn fetch_popular_channels(
        &self,
        api_key: &str,
    ) -> Result<Vec<YouTubeChannel>, AppError> {
        self.fetch_channels(api_key, &POPULAR_CHANNEL_IDS).await
    }

    pub async fn fetch_channels(
        &self,
        api_key: &str,
        channel_ids: &[&str],
    ) -> Result<Vec<YouTubeChannel>, AppError> {
        tracing::info!("Fetching {} YouTube channels", channel_ids.len());

        let requests = channel_ids.iter().map(|id| self.fetch_channel(api_key, id));

        let result = self.breaker.call(try_join_all(requests)).await;
        let responses = match result {
            Ok(responses) => responses,
            Err(failsafe::Error::Inner(e)) => return Err(e),
            Err(failsafe::Error::Rejected) => {
                tracing::warn!("YouTube circuit breaker is open; skipping live fetch");
                return Err(AppError::ExternalApiError(
                    "YouTube API circuit breaker open".to_string(),
                ));
            }
        };

        let channels: Vec<YouTubeChannel> =
            responses.into_iter().flat_map(|r| r.items).collect();

        tracing::info!("Successfully fetched {} YouTube channels", channels.len());
        Ok(channels)
    }

    async fn fetch_channel(
        &self,
        api_key: &str,
        channel_id: &str,
    ) -> Result<ChannelListResponse, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/channels", self.base_url),
            &[
                ("part", "snippet,statistics,brandingSettings"),
                ("id", channel_id),
                ("key", api_key),
            ],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        // Never log the key
        tracing::debug!(
            "YouTube API URL: {}/channels?id={}&key=[REDACTED]",
            self.base_url,
            channel_id
        );

        let response =
            self.client.get(url).send().await.map_err(|e| {
                AppError::ExternalApiError(format!("YouTube API request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("YouTube API returned error {}: {}", status, error_text);
            return Err(AppError::ExternalApiError(format!(
                "YouTube API error: {}",
                status
            )));
        }

        response.json::<ChannelListResponse>().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse YouTube API response: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn channel(value: serde_json::Value) -> YouTubeChannel {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_determine_category_first_match_wins() {
        assert_eq!(determine_category("Daily Minecraft gameplay"), "gaming");
        // "tutorial" is listed under education before howto
        assert_eq!(determine_category("Woodworking TUTORIAL videos"), "education");
        assert_eq!(determine_category("Budget DIY fixes"), "howto");
        assert_eq!(determine_category("Street food around Asia"), "food");
    }

    #[test]
    fn test_determine_category_defaults_to_entertainment() {
        assert_eq!(determine_category(""), "entertainment");
        assert_eq!(determine_category("Quiet corner of the internet"), "entertainment");
    }

    #[test]
    fn test_parse_count_defaults_to_zero() {
        assert_eq!(parse_count(Some("1234")), 1234);
        assert_eq!(parse_count(Some("12k")), 0);
        assert_eq!(parse_count(Some("-5")), 0);
        assert_eq!(parse_count(None), 0);
    }

    #[test]
    fn test_handle_from_title() {
        assert_eq!(handle_from_title("Dude Perfect"), "@dudeperfect");
        assert_eq!(handle_from_title("  T-Series  Music "), "@t-seriesmusic");
    }

    #[test]
    fn test_country_fallback_chain() {
        let branded = channel(json!({
            "id": "a",
            "snippet": {"title": "A", "country": "US"},
            "brandingSettings": {"channel": {"country": "GB"}}
        }));
        assert_eq!(branded.country(), "GB");

        let profile_only = channel(json!({
            "id": "b",
            "snippet": {"title": "B", "country": "IN"},
            "brandingSettings": {"channel": {}}
        }));
        assert_eq!(profile_only.country(), "IN");

        let none = channel(json!({"id": "c", "snippet": {"title": "C"}}));
        assert_eq!(none.country(), "Unknown");
    }

    #[test]
    fn test_channels_to_influencers_mapping() {
        let channels = vec![
            channel(json!({
                "id": "UCX6OQ3DkcsbYNE6H8uQQuVA",
                "snippet": {
                    "title": "Mr Beast",
                    "description": "Crazy challenge videos",
                    "thumbnails": {"high": {"url": "https://img/high.jpg"}}
                },
                "statistics": {"subscriberCount": "250000000", "viewCount": "1", "videoCount": "2"},
                "brandingSettings": {"channel": {"country": "US"}}
            })),
            channel(json!({
                "id": "UC2",
                "snippet": {"title": "Nowhere", "description": "x".repeat(250)},
                "statistics": {"subscriberCount": "hidden"}
            })),
        ];

        let records = channels_to_influencers(&channels);

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.handle, "@mrbeast");
        assert_eq!(first.followers, 250_000_000);
        assert_eq!(first.category, "entertainment");
        assert_eq!(first.country, "US");
        assert_eq!(first.region, "North America");
        assert_eq!(first.image_url, "https://img/high.jpg");
        assert_eq!(first.description, "Crazy challenge videos...");
        assert_eq!(first.rank, 1);
        assert_eq!(first.platform, Platform::Youtube);

        let second = &records[1];
        assert_eq!(second.followers, 0);
        assert_eq!(second.country, "Unknown");
        assert_eq!(second.region, "Unknown");
        assert_eq!(second.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(second.description.chars().count(), 203);
        assert_eq!(second.rank, 2);
    }

    #[test]
    fn test_channels_with_colliding_handles_keep_first() {
        let channels = vec![
            channel(json!({"id": "UC1", "snippet": {"title": "Dude Perfect", "description": ""}})),
            channel(json!({"id": "UC2", "snippet": {"title": "dude  PERFECT", "description": ""}})),
            channel(json!({"id": "UC3", "snippet": {"title": "MrBeast", "description": ""}})),
        ];

        let records = channels_to_influencers(&channels);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Dude Perfect");
        assert_eq!(records[0].rank, 1);
        assert_eq!(records[1].handle, "@mrbeast");
        assert_eq!(records[1].rank, 2);
    }
}
