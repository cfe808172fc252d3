//! Static country → region lookup.

use crate::models::UNKNOWN;

/// Countries the directory knows how to place, as ISO codes and common names.
const REGION_TABLE: &[(&str, &str)] = &[
    // North America
    ("US", "North America"),
    ("USA", "North America"),
    ("UNITED STATES", "North America"),
    ("CA", "North America"),
    ("CANADA", "North America"),
    ("MX", "North America"),
    ("MEXICO", "North America"),
    // Europe
    ("GB", "Europe"),
    ("UK", "Europe"),
    ("UNITED KINGDOM", "Europe"),
    ("DE", "Europe"),
    ("GERMANY", "Europe"),
    ("FR", "Europe"),
    ("FRANCE", "Europe"),
    ("IT", "Europe"),
    ("ITALY", "Europe"),
    ("ES", "Europe"),
    ("SPAIN", "Europe"),
    ("PT", "Europe"),
    ("PORTUGAL", "Europe"),
    // Asia
    ("JP", "Asia"),
    ("JAPAN", "Asia"),
    ("KR", "Asia"),
    ("KOREA", "Asia"),
    ("SOUTH KOREA", "Asia"),
    ("CN", "Asia"),
    ("CHINA", "Asia"),
    ("IN", "Asia"),
    ("INDIA", "Asia"),
    // Oceania
    ("AU", "Oceania"),
    ("AUSTRALIA", "Oceania"),
    ("NZ", "Oceania"),
    ("NEW ZEALAND", "Oceania"),
    // South America
    ("BR", "South America"),
    ("BRAZIL", "South America"),
    ("AR", "South America"),
    ("ARGENTINA", "South America"),
    // Africa
    ("ZA", "Africa"),
    ("SOUTH AFRICA", "Africa"),
    ("NG", "Africa"),
    ("NIGERIA", "Africa"),
    ("EG", "Africa"),
    ("EGYPT", "Africa"),
];

/// Region for a country code or name; `"Unknown"` when unmapped.
pub fn region_for_country(country: &str) -> &'static str {
    let key = country.trim().to_uppercase();
    if key.is_empty() {
        return UNKNOWN;
    }

    REGION_TABLE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, region)| *region)
        .unwrap_or(UNKNOWN)
}
