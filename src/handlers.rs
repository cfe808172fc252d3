use crate::config::Config;
use crate::errors::AppError;
use crate::events::{ChangeEvent, EventBus};
use crate::filter;
use crate::models::*;
use crate::pipeline::RefreshPipeline;
use crate::seed::{self, SeedOutcome};
use crate::snapshot::SnapshotCache;
use crate::store::{CredentialStore, InfluencerStore};
use crate::youtube::YouTubeClient;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn InfluencerStore>,
    pub pipeline: Arc<RefreshPipeline>,
    /// Rank-ordered record set read by the listing endpoints.
    pub snapshot: SnapshotCache,
    pub events: EventBus,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn InfluencerStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, AppError> {
        let events = EventBus::default();
        let snapshot = SnapshotCache::default();
        let youtube = YouTubeClient::new(config.youtube_api_base_url.clone())?;
        let pipeline = RefreshPipeline::new(
            Arc::clone(&store),
            credentials,
            youtube,
            events.clone(),
            snapshot.clone(),
            config.mock_seed,
        );

        Ok(Self {
            config,
            store,
            pipeline: Arc::new(pipeline),
            snapshot,
            events,
        })
    }
}

/// Routes under `/api/v1`, without rate limiting.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/influencers", get(list_influencers))
        .route("/api/v1/influencers/search", get(search_influencers))
        .route("/api/v1/influencers/filters", get(filter_options))
        .route("/api/v1/influencers/events", get(influencer_events))
        .route("/api/v1/influencers/:id", get(get_influencer))
        .route("/api/v1/refresh", post(refresh_all))
        .route("/api/v1/refresh/:platform", post(refresh_platform))
        .route("/api/v1/seed", post(seed_influencers))
}

/// Health route plus [`api_routes`], bound to `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(api_routes())
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "famepedia-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/v1/influencers
///
/// Each of `category`, `platform`, `country` and `region` narrows the listing;
/// an absent or `all` value leaves that dimension open. An unknown platform is
/// rejected with 400.
pub async fn list_influencers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterQuery>,
) -> Result<Json<InfluencerListResponse>, AppError> {
    tracing::info!("GET /influencers - params: {:?}", params);

    let filters = InfluencerFilters::try_from(params)?;
    let snapshot = state.snapshot.get_or_load(state.store.as_ref()).await?;
    let influencers: Vec<InfluencerView> = filter::filter_influencers(&snapshot, &filters)
        .into_iter()
        .map(InfluencerView::from)
        .collect();

    tracing::debug!("{} of {} influencers match", influencers.len(), snapshot.len());
    Ok(Json(InfluencerListResponse {
        count: influencers.len(),
        filters,
        influencers,
    }))
}

/// GET /api/v1/influencers/search?q=
pub async fn search_influencers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    tracing::info!("GET /influencers/search - q: {:?}", params.q);

    let snapshot = state.snapshot.get_or_load(state.store.as_ref()).await?;
    let influencers: Vec<InfluencerView> = filter::search_influencers(&snapshot, &params.q)
        .into_iter()
        .map(InfluencerView::from)
        .collect();

    Ok(Json(SearchResponse {
        query: params.q.clone(),
        count: influencers.len(),
        influencers,
    }))
}

/// GET /api/v1/influencers/filters
pub async fn filter_options(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FilterOptions>, AppError> {
    let snapshot = state.snapshot.get_or_load(state.store.as_ref()).await?;
    Ok(Json(filter::filter_options(&snapshot)))
}

/// GET /api/v1/influencers/:id
pub async fn get_influencer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<InfluencerView>, AppError> {
    tracing::info!("GET /influencers/{}", id);

    let influencer = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Influencer with id {} not found", id)))?;

    Ok(Json(InfluencerView::from(influencer)))
}

/// GET /api/v1/influencers/events
///
/// Server-Sent Events, one `change` event per store write. A client that falls
/// behind skips the events it missed.
pub async fn influencer_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();
    tracing::debug!("Change event subscriber connected");

    Sse::new(change_stream(rx)).keep_alive(KeepAlive::default())
}

/// Maps bus messages to `change` events. Skips past a lag and ends when the
/// bus is dropped.
fn change_stream(
    rx: broadcast::Receiver<ChangeEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(change) => {
                    let event = Event::default()
                        .event("change")
                        .json_data(&change)
                        .unwrap_or_else(|_| Event::default().event("change"));
                    return Some((Ok(event), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

/// POST /api/v1/refresh
///
/// Always answers 200; per-platform failures are listed in the report.
pub async fn refresh_all(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    tracing::info!("POST /refresh");

    let report = state.pipeline.refresh_all().await;
    let message = match report.failures() {
        0 => "Updated influencers for all platforms".to_string(),
        n => format!("Updated influencers with {} platform failure(s)", n),
    };

    Json(json!({
        "success": true,
        "message": message,
        "report": report
    }))
}

/// POST /api/v1/refresh/:platform
pub async fn refresh_platform(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
) -> Result<Response, AppError> {
    let platform: Platform = platform.parse()?;
    tracing::info!("POST /refresh/{}", platform);

    let response = match state.pipeline.refresh_platform(platform).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": format!("Updated {} {} influencers", outcome.count, platform),
                "platform": outcome.platform,
                "count": outcome.count,
                "source": outcome.source,
                "strategy": outcome.strategy
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error in {} refresh: {}", platform, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": e.to_string()
                })),
            )
                .into_response()
        }
    };

    Ok(response)
}

/// POST /api/v1/seed
pub async fn seed_influencers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeedOutcome>, AppError> {
    tracing::info!("POST /seed");
    let outcome = seed::seed_if_empty(state.store.as_ref(), &state.snapshot, &state.events).await?;
    Ok(Json(outcome))
}
