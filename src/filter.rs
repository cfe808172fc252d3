//! Filter and search over an in-memory snapshot of records.
//!
//! Everything here is a pure function of its inputs. An empty result is a
//! normal answer, not an error.

use std::collections::BTreeSet;

use crate::models::{FilterOption, FilterOptions, Influencer, InfluencerFilters, Platform};

/// Records matching every non-wildcard selector, in input order.
pub fn filter_influencers(records: &[Influencer], filters: &InfluencerFilters) -> Vec<Influencer> {
    if filters.is_unfiltered() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|r| matches_filters(r, filters))
        .cloned()
        .collect()
}

pub fn matches_filters(record: &Influencer, filters: &InfluencerFilters) -> bool {
    filters.category.matches(&record.category)
        && filters.platform.matches(&record.platform)
        && filters.country.matches(&record.country)
        && filters.region.matches(&record.region)
}

/// Case-insensitive substring search over name, category, country and platform.
///
/// A blank query returns nothing rather than everything. Otherwise the query
/// is matched as given, surrounding whitespace included.
pub fn search_influencers(records: &[Influencer], query: &str) -> Vec<Influencer> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let query = query.to_lowercase();

    records
        .iter()
        .filter(|r| {
            r.name.to_lowercase().contains(&query)
                || r.category.to_lowercase().contains(&query)
                || r.country.to_lowercase().contains(&query)
                || r.platform.as_str().contains(&query)
        })
        .cloned()
        .collect()
}

/// Selector values offered for the given snapshot.
pub fn filter_options(records: &[Influencer]) -> FilterOptions {
    let categories: BTreeSet<&str> = records.iter().map(|r| r.category.as_str()).collect();
    let countries: BTreeSet<&str> = records.iter().map(|r| r.country.as_str()).collect();
    let regions: BTreeSet<&str> = records.iter().map(|r| r.region.as_str()).collect();

    FilterOptions {
        categories: with_all(
            "All Categories",
            categories
                .into_iter()
                .map(|c| FilterOption::new(c, capitalize(c))),
        ),
        platforms: with_all(
            "All Platforms",
            Platform::ALL
                .iter()
                .map(|p| FilterOption::new(p.as_str(), p.label())),
        ),
        countries: with_all(
            "All Countries",
            countries.into_iter().map(|c| FilterOption::new(c, c)),
        ),
        regions: with_all(
            "All Regions",
            regions.into_iter().map(|r| FilterOption::new(r, r)),
        ),
    }
}

fn with_all(label: &str, rest: impl Iterator<Item = FilterOption>) -> Vec<FilterOption> {
    std::iter::once(FilterOption::new(crate::models::ALL, label))
        .chain(rest)
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Compact follower count: `1.2B`, `3.4M`, `5.6K`, or the plain number.
pub fn format_follower_count(count: i64) -> String {
    let n = count as f64;
    if count >= 1_000_000_000 {
        format!("{:.1}B", n / 1_000_000_000.0)
    } else if count >= 1_000_000 {
        format!("{:.1}M", n / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", n / 1_000.0)
    } else {
        count.to_string()
    }
}
