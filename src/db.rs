use sqlx::{postgres::PgPoolOptions, PgPool};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS influencers (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        handle TEXT NOT NULL,
        followers BIGINT NOT NULL DEFAULT 0,
        image_url TEXT NOT NULL,
        category TEXT NOT NULL,
        platform TEXT NOT NULL,
        country TEXT NOT NULL,
        region TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        rank INTEGER NOT NULL,
        last_updated TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (platform, handle)
    )",
    "CREATE INDEX IF NOT EXISTS influencers_rank_idx ON influencers (rank)",
    "CREATE TABLE IF NOT EXISTS platform_credentials (
        platform TEXT PRIMARY KEY,
        api_key TEXT NOT NULL
    )",
];

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        tracing::debug!("Schema ensured ({} statements)", SCHEMA.len());

        Ok(Self { pool })
    }
}
