use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use famepedia_api::config::Config;
use famepedia_api::db::Database;
use famepedia_api::handlers::{self, AppState};
use famepedia_api::models::Platform;
use famepedia_api::scheduler::spawn_refresh_scheduler;
use famepedia_api::store::{CredentialStore, InfluencerStore, MemoryStore, PgStore};

/// Main entry point for the application.
///
/// Loads configuration, picks the record store (Postgres when a database URL
/// is configured, in-memory otherwise), wires the refresh pipeline and the
/// snapshot cache, then serves the HTTP API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "famepedia_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (store, credentials): (Arc<dyn InfluencerStore>, Arc<dyn CredentialStore>) =
        match config.database_url {
            Some(ref url) => {
                let db = Database::new(url).await?;
                tracing::info!("Database connection pool established");
                let store = Arc::new(PgStore::new(db.pool));
                (store.clone() as Arc<dyn InfluencerStore>, store as Arc<dyn CredentialStore>)
            }
            None => {
                tracing::warn!("Running with the in-memory store, records are lost on restart");
                let store = Arc::new(MemoryStore::new());
                (store.clone() as Arc<dyn InfluencerStore>, store as Arc<dyn CredentialStore>)
            }
        };

    if let Some(ref key) = config.youtube_api_key {
        credentials.set_api_key(Platform::Youtube, key).await?;
        tracing::info!("YouTube credential stored");
    }

    let app_state = Arc::new(AppState::new(config.clone(), store, credentials)?);

    tracing::info!("Snapshot cache initialized (60s TTL, invalidated on write)");

    if let Some(secs) = config.refresh_interval_secs {
        spawn_refresh_scheduler(Arc::clone(&app_state.pipeline), Duration::from_secs(secs));
    }

    // 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let protected_routes = handlers::api_routes().layer(
        ServiceBuilder::new()
            .layer(RequestBodyLimitLayer::new(1024 * 1024))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
