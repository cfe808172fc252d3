use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Placeholder avatar used when a source provides no image.
pub const DEFAULT_IMAGE_URL: &str = "https://i.pravatar.cc/300";

/// Country/region value used when a source provides none or it cannot be mapped.
pub const UNKNOWN: &str = "Unknown";

/// Wire value of the wildcard selector.
pub const ALL: &str = "all";

// ============ Platforms ============

/// Social platforms tracked by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Twitter,
    Youtube,
    Tiktok,
    Facebook,
}

impl Platform {
    /// Every supported platform, in refresh order.
    pub const ALL: [Platform; 5] = [
        Platform::Instagram,
        Platform::Twitter,
        Platform::Youtube,
        Platform::Tiktok,
        Platform::Facebook,
    ];

    /// Lower-case identifier used in the store and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Facebook => "facebook",
        }
    }

    /// Human-readable label for filter menus.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::Twitter => "Twitter",
            Platform::Youtube => "YouTube",
            Platform::Tiktok => "TikTok",
            Platform::Facebook => "Facebook",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string does not name a supported platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePlatformError(pub String);

impl fmt::Display for ParsePlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown platform '{}'", self.0)
    }
}

impl std::error::Error for ParsePlatformError {}

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "twitter" => Ok(Platform::Twitter),
            "youtube" => Ok(Platform::Youtube),
            "tiktok" => Ok(Platform::Tiktok),
            "facebook" => Ok(Platform::Facebook),
            _ => Err(ParsePlatformError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = ParsePlatformError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============ Database Models ============

/// One tracked personality's social-media profile snapshot.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Influencer {
    /// Stable identifier assigned by the store.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Platform-unique handle, e.g. `@mrbeast`.
    pub handle: String,
    /// Follower (or subscriber) count.
    pub followers: i64,
    /// Profile image URL.
    pub image_url: String,
    /// Open-ended category such as `sports` or `gaming`.
    pub category: String,
    /// Platform the handle belongs to.
    #[sqlx(try_from = "String")]
    pub platform: Platform,
    /// Country, free text or ISO code.
    pub country: String,
    /// Region derived from the country.
    pub region: String,
    /// Short biography.
    pub description: String,
    /// Position within the refresh batch, 1-based.
    pub rank: i32,
    /// When the refresh batch that produced this record was written.
    pub last_updated: DateTime<Utc>,
}

/// A record as produced by a data source, before the store stamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInfluencer {
    pub name: String,
    pub handle: String,
    pub followers: i64,
    pub image_url: String,
    pub category: String,
    pub platform: Platform,
    pub country: String,
    pub region: String,
    pub description: String,
    pub rank: i32,
}

impl NewInfluencer {
    /// Materialises the record with a fresh id and timestamp.
    pub fn into_influencer(self, id: Uuid, last_updated: DateTime<Utc>) -> Influencer {
        Influencer {
            id,
            name: self.name,
            handle: self.handle,
            followers: self.followers,
            image_url: self.image_url,
            category: self.category,
            platform: self.platform,
            country: self.country,
            region: self.region,
            description: self.description,
            rank: self.rank,
            last_updated,
        }
    }
}

// ============ Selectors & Filters ============

/// A filter dimension value: either the wildcard or one concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selector<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(expected) => expected == value,
        }
    }
}

impl Selector<String> {
    /// Absent, blank, or `all` (any case) is the wildcard.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None => Selector::All,
            Some(v) if v.is_empty() || v.eq_ignore_ascii_case(ALL) => Selector::All,
            Some(v) => Selector::Only(v.to_string()),
        }
    }
}

impl Selector<Platform> {
    pub fn parse(raw: Option<&str>) -> Result<Self, ParsePlatformError> {
        match Selector::<String>::parse(raw) {
            Selector::All => Ok(Selector::All),
            Selector::Only(v) => Ok(Selector::Only(v.parse()?)),
        }
    }
}

impl<T: Serialize> Serialize for Selector<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selector::All => serializer.serialize_str(ALL),
            Selector::Only(v) => v.serialize(serializer),
        }
    }
}

/// The four independent selectors of the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InfluencerFilters {
    pub category: Selector<String>,
    pub platform: Selector<Platform>,
    pub country: Selector<String>,
    pub region: Selector<String>,
}

impl InfluencerFilters {
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Selector::Only(category.into());
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Selector::Only(platform);
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Selector::Only(country.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Selector::Only(region.into());
        self
    }

    /// True when every selector is the wildcard.
    pub fn is_unfiltered(&self) -> bool {
        *self == InfluencerFilters::default()
    }
}

// ============ Request/Response Models ============

/// Raw query parameters of `GET /api/v1/influencers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    pub category: Option<String>,
    pub platform: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
}

impl TryFrom<FilterQuery> for InfluencerFilters {
    type Error = ParsePlatformError;

    fn try_from(query: FilterQuery) -> Result<Self, Self::Error> {
        Ok(InfluencerFilters {
            category: Selector::<String>::parse(query.category.as_deref()),
            platform: Selector::<Platform>::parse(query.platform.as_deref())?,
            country: Selector::<String>::parse(query.country.as_deref()),
            region: Selector::<String>::parse(query.region.as_deref()),
        })
    }
}

/// Query parameters of `GET /api/v1/influencers/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// A record as rendered by the listing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct InfluencerView {
    #[serde(flatten)]
    pub influencer: Influencer,
    /// Compact follower count, e.g. `243.0M`.
    pub followers_display: String,
}

impl From<Influencer> for InfluencerView {
    fn from(influencer: Influencer) -> Self {
        let followers_display = crate::filter::format_follower_count(influencer.followers);
        Self {
            influencer,
            followers_display,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InfluencerListResponse {
    pub count: usize,
    pub filters: InfluencerFilters,
    pub influencers: Vec<InfluencerView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub count: usize,
    pub influencers: Vec<InfluencerView>,
}

/// One entry of a filter menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Selector values a client can offer, each list headed by its `all` option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub categories: Vec<FilterOption>,
    pub platforms: Vec<FilterOption>,
    pub countries: Vec<FilterOption>,
    pub regions: Vec<FilterOption>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse_is_case_insensitive() {
        assert_eq!("YouTube".parse::<Platform>().unwrap(), Platform::Youtube);
        assert_eq!(" tiktok ".parse::<Platform>().unwrap(), Platform::Tiktok);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_round_trips_through_as_str() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_selector_parse_wildcards() {
        assert_eq!(Selector::<String>::parse(None), Selector::All);
        assert_eq!(Selector::<String>::parse(Some("")), Selector::All);
        assert_eq!(Selector::<String>::parse(Some("ALL")), Selector::All);
        assert_eq!(
            Selector::<String>::parse(Some("sports")),
            Selector::Only("sports".to_string())
        );
    }

    #[test]
    fn test_filter_query_rejects_unknown_platform() {
        let query = FilterQuery {
            platform: Some("friendster".to_string()),
            ..Default::default()
        };
        assert!(InfluencerFilters::try_from(query).is_err());
    }

    #[test]
    fn test_filters_unfiltered_only_when_every_selector_is_all() {
        let query = FilterQuery {
            category: Some("All".to_string()),
            platform: Some("all".to_string()),
            country: None,
            region: Some(String::new()),
        };
        assert!(InfluencerFilters::try_from(query).unwrap().is_unfiltered());

        assert!(!InfluencerFilters::default().with_region("Asia").is_unfiltered());
        assert!(!InfluencerFilters::default()
            .with_platform(Platform::Tiktok)
            .is_unfiltered());
    }

    #[test]
    fn test_filters_serialize_wildcard_as_all() {
        let filters = InfluencerFilters::default().with_platform(Platform::Youtube);
        let json = serde_json::to_value(&filters).unwrap();

        assert_eq!(json["category"], "all");
        assert_eq!(json["platform"], "youtube");
    }
}
