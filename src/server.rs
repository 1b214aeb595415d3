//! HTTP surface.
//!
//! | route        | response                                     |
//! |--------------|----------------------------------------------|
//! | `/`          | HTML listing of the current window           |
//! | `/atom.xml`  | Atom document, `application/atom+xml`        |
//! | `/health`    | JSON liveness and collection summary         |
//!
//! Handlers only ever read the collection and never fail: with a degraded
//! source the worst a client sees is a stale or empty page.

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::collection::ItemCollection;
use crate::present::{atom, html, FeedMeta, RenderStats};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub collection: Arc<ItemCollection>,
    pub feed: Arc<FeedMeta>,
    pub stats: Arc<RenderStats>,
}

impl AppState {
    pub fn new(collection: Arc<ItemCollection>, feed: FeedMeta) -> Self {
        Self {
            collection,
            feed: Arc::new(feed),
            stats: Arc::new(RenderStats::default()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/atom.xml", get(atom_feed))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /
async fn index(State(state): State<AppState>) -> Html<String> {
    Html(html::render_page(&state.collection.snapshot(), &state.feed))
}

/// GET /atom.xml
async fn atom_feed(State(state): State<AppState>) -> impl IntoResponse {
    let (items, last_modified) = state.collection.snapshot_with_last_modified();
    let body = atom::render_feed(&items, last_modified, &state.feed, &state.stats);
    ([(header::CONTENT_TYPE, atom::CONTENT_TYPE)], body)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    items: usize,
    capacity: usize,
    newest_id: String,
    last_modified: String,
    timestamp_fallbacks: u64,
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        items: state.collection.len(),
        capacity: state.collection.capacity(),
        newest_id: state.collection.newest_id(),
        last_modified: state.collection.last_modified().to_rfc3339(),
        timestamp_fallbacks: state.stats.timestamp_fallbacks(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
