//! Synthetic influencer batches for platforms without a live data source.

use rand::Rng;

use crate::models::{NewInfluencer, Platform};

/// Records per mock refresh batch.
pub const MOCK_BATCH_SIZE: usize = 100;

pub const MIN_MOCK_FOLLOWERS: i64 = 500_000;
pub const MAX_MOCK_FOLLOWERS: i64 = 100_500_000;

pub const MOCK_REGIONS: [&str; 6] = [
    "North America",
    "Europe",
    "Asia",
    "South America",
    "Africa",
    "Oceania",
];

pub const MOCK_COUNTRIES: [&str; 10] = [
    "USA",
    "UK",
    "China",
    "India",
    "Brazil",
    "Australia",
    "Japan",
    "Germany",
    "France",
    "Canada",
];

/// Plausible categories for each platform's mock creators.
pub fn mock_categories(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Instagram => &["entertainment", "sports", "fashion", "technology", "music"],
        Platform::Twitter => &["politics", "news", "technology", "sports", "entertainment"],
        Platform::Youtube => &["gaming", "education", "entertainment", "music", "howto"],
        Platform::Tiktok => &["dance", "comedy", "lifestyle", "food", "fitness"],
        Platform::Facebook => &["business", "news", "entertainment", "community", "education"],
    }
}

/// Generates a full batch of [`MOCK_BATCH_SIZE`] records for `platform`.
///
/// Categories are drawn uniformly from `categories` (falling back to
/// `entertainment` when empty); regions and countries are drawn independently
/// from the fixed sets above. Pass a seeded RNG for a reproducible batch.
pub fn generate_mock_influencers<R: Rng>(
    platform: Platform,
    categories: &[&str],
    rng: &mut R,
) -> Vec<NewInfluencer> {
    let categories: &[&str] = if categories.is_empty() {
        &["entertainment"]
    } else {
        categories
    };
    let display_name = capitalize(platform.as_str());

    (1..=MOCK_BATCH_SIZE)
        .map(|rank| {
            let category = categories[rng.random_range(0..categories.len())];
            let region = MOCK_REGIONS[rng.random_range(0..MOCK_REGIONS.len())];
            let country = MOCK_COUNTRIES[rng.random_range(0..MOCK_COUNTRIES.len())];
            let followers = rng.random_range(MIN_MOCK_FOLLOWERS..MAX_MOCK_FOLLOWERS);

            NewInfluencer {
                name: format!("{} Star {}", display_name, rank),
                handle: format!("@{}user{}", platform.as_str(), rank),
                followers,
                image_url: format!("https://i.pravatar.cc/300?img={}", (rank - 1) % 70 + 1),
                category: category.to_string(),
                platform,
                country: country.to_string(),
                region: region.to_string(),
                description: format!(
                    "Top {} creator on {} with a large following from {}.",
                    category, platform, country
                ),
                rank: rank as i32,
            }
        })
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_batch_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let batch =
            generate_mock_influencers(Platform::Tiktok, mock_categories(Platform::Tiktok), &mut rng);

        assert_eq!(batch.len(), MOCK_BATCH_SIZE);
        let ranks: Vec<i32> = batch.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (1..=100).collect::<Vec<i32>>());

        let handles: HashSet<&str> = batch.iter().map(|r| r.handle.as_str()).collect();
        assert_eq!(handles.len(), MOCK_BATCH_SIZE);
    }

    #[test]
    fn test_name_handle_and_description_format() {
        let mut rng = StdRng::seed_from_u64(1);
        let batch = generate_mock_influencers(Platform::Youtube, &["gaming"], &mut rng);
        let third = &batch[2];

        assert_eq!(third.name, "Youtube Star 3");
        assert_eq!(third.handle, "@youtubeuser3");
        assert_eq!(third.category, "gaming");
        assert_eq!(third.image_url, "https://i.pravatar.cc/300?img=3");
        assert_eq!(
            third.description,
            format!(
                "Top gaming creator on youtube with a large following from {}.",
                third.country
            )
        );
        assert_eq!(batch[70].image_url, "https://i.pravatar.cc/300?img=1");
    }

    #[test]
    fn test_values_come_from_fixed_sets() {
        let mut rng = StdRng::seed_from_u64(99);
        let categories = mock_categories(Platform::Facebook);
        let batch = generate_mock_influencers(Platform::Facebook, categories, &mut rng);

        for record in &batch {
            assert!(categories.contains(&record.category.as_str()));
            assert!(MOCK_REGIONS.contains(&record.region.as_str()));
            assert!(MOCK_COUNTRIES.contains(&record.country.as_str()));
            assert!((MIN_MOCK_FOLLOWERS..=MAX_MOCK_FOLLOWERS).contains(&record.followers));
            assert_eq!(record.platform, Platform::Facebook);
        }
    }

    #[test]
    fn test_same_seed_same_batch() {
        let a = generate_mock_influencers(
            Platform::Instagram,
            mock_categories(Platform::Instagram),
            &mut StdRng::seed_from_u64(42),
        );
        let b = generate_mock_influencers(
            Platform::Instagram,
            mock_categories(Platform::Instagram),
            &mut StdRng::seed_from_u64(42),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_category_list_falls_back() {
        let mut rng = StdRng::seed_from_u64(3);
        let batch = generate_mock_influencers(Platform::Twitter, &[], &mut rng);
        assert!(batch.iter().all(|r| r.category == "entertainment"));
    }
}
