use serde::Deserialize;

use crate::youtube::DEFAULT_YOUTUBE_API_BASE_URL;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Postgres URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub port: u16,
    pub youtube_api_base_url: String,
    /// Stored as the YouTube credential at startup when set.
    pub youtube_api_key: Option<String>,
    /// Background refresh period; no scheduler runs when absent.
    pub refresh_interval_secs: Option<u64>,
    /// Fixes the mock generator for reproducible batches.
    pub mock_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: match std::env::var("DATABASE_URL").or_else(|_| std::env::var("DB_URL")) {
                Ok(url) if url.trim().is_empty() => None,
                Ok(url) => {
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Some(url)
                }
                Err(_) => None,
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            youtube_api_base_url: std::env::var("YOUTUBE_API_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("YOUTUBE_API_BASE_URL must start with http:// or https://");
                    }
                    Ok(url.trim_end_matches('/').to_string())
                })
                .transpose()?
                .unwrap_or_else(|| DEFAULT_YOUTUBE_API_BASE_URL.to_string()),
            youtube_api_key: std::env::var("YOUTUBE_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            refresh_interval_secs: optional_number("REFRESH_INTERVAL_SECS")?
                .map(|secs| {
                    if secs == 0 {
                        anyhow::bail!("REFRESH_INTERVAL_SECS must be greater than 0");
                    }
                    Ok(secs)
                })
                .transpose()?,
            mock_seed: optional_number("MOCK_SEED")?,
        };

        tracing::info!("Configuration loaded successfully");
        match config.database_url {
            Some(ref url) => tracing::debug!("Database URL scheme: {}", database_url_scheme(url)),
            None => tracing::info!("No DATABASE_URL set, records will be kept in memory"),
        }
        tracing::debug!("YouTube API base URL: {}", config.youtube_api_base_url);
        if config.youtube_api_key.is_some() {
            tracing::info!("YouTube API key configured");
        }
        if let Some(secs) = config.refresh_interval_secs {
            tracing::debug!("Refresh interval: {}s", secs);
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

fn optional_number(name: &str) -> anyhow::Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer", name)),
        Err(_) => Ok(None),
    }
}

/// The part of a connection URL before `://`, so credentials never reach the logs.
fn database_url_scheme(url: &str) -> &str {
    url.split_once("://")
        .map(|(scheme, _)| scheme)
        .unwrap_or("unknown")
}
