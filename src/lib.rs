//! Famepedia API Library
//!
//! Directory of top social-media personalities: a record store, a refresh
//! pipeline that fills it per platform (YouTube live data, mock batches
//! elsewhere), and the filter/search engine behind the listing endpoints.
//!
//! # Modules
//!
//! - `circuit_breaker`: Circuit breaker for the YouTube client.
//! - `config`: Configuration management.
//! - `db`: Database pool and schema.
//! - `errors`: Error handling types.
//! - `events`: Store change notifications.
//! - `filter`: Filter, search and filter-option logic.
//! - `handlers`: HTTP request handlers and routes.
//! - `mock_data`: Mock influencer batches.
//! - `models`: Core data models.
//! - `pipeline`: Per-platform refresh pipeline.
//! - `regions`: Country to region mapping.
//! - `scheduler`: Periodic background refresh.
//! - `seed`: Built-in starter list.
//! - `snapshot`: Cached record snapshot.
//! - `store`: Postgres and in-memory record stores.
//! - `youtube`: YouTube Data API client and channel mapping.

pub mod circuit_breaker;
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod filter;
pub mod handlers;
pub mod mock_data;
pub mod models;
pub mod pipeline;
pub mod regions;
pub mod scheduler;
pub mod seed;
pub mod snapshot;
pub mod store;
pub mod youtube;
