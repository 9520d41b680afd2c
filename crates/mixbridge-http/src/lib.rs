//! HTTP REST API facade for mixbridge.
//!
//! A thin axum layer over the core: handlers validate a request,
//! call into the discovery/mapper/selection components, and map the
//! core's error taxonomy onto status codes. All interesting behavior
//! lives in `mixbridge-core`.
//!
//! # Usage
//!
//! ```ignore
//! use mixbridge_http::{start_server, AppState};
//!
//! let state = Arc::new(AppState { /* core components */ });
//! tokio::spawn(async move {
//!     start_server(state, "0.0.0.0:8000").await
//! });
//! ```

mod models;
mod routes;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use mixbridge_core::{
    Config, DiscoveryOrchestrator, FeedbackStore, ParamMapper, SelectionTracker, SurfaceClient,
};

pub use models::*;

/// Shared application state for HTTP handlers.
pub struct AppState {
    /// Outbound command client.
    pub surface: SurfaceClient,
    /// Aggregated feedback state (written by the listener).
    pub store: FeedbackStore,
    /// Discovery orchestrator over surface + store.
    pub discovery: DiscoveryOrchestrator,
    /// Parameter name mapping cache.
    pub mapper: ParamMapper,
    /// Selection state machine.
    pub selection: SelectionTracker,
    /// Effective configuration.
    pub config: Config,
}

/// Build the router and serve it on the given address until the
/// server task is dropped or the listener fails.
pub async fn start_server(state: Arc<AppState>, addr: &str) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("HTTP API listening on {}", addr);
    axum::serve(listener, app).await
}

/// The full route table (public for tests).
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Service
        .route("/", get(routes::service_banner))
        .route("/health", get(routes::health))
        // Strips
        .route("/strips", get(routes::strips::list_strips))
        .route("/strips/refresh", post(routes::strips::refresh_strips))
        .route("/strips/:ssid", get(routes::strips::get_strip))
        .route("/strips/:ssid/gain", post(routes::strips::set_gain))
        .route("/strips/:ssid/fader", post(routes::strips::set_fader))
        .route("/strips/:ssid/mute", post(routes::strips::set_mute))
        .route("/strips/:ssid/solo", post(routes::strips::set_solo))
        .route("/strips/:ssid/pan", post(routes::strips::set_pan))
        // Plugins & parameters
        .route("/tracks/:track/plugins", get(routes::plugins::list_plugins))
        .route(
            "/tracks/:track/plugins/:plugin/activate",
            post(routes::plugins::activate_plugin),
        )
        .route(
            "/tracks/:track/plugins/:plugin/parameters",
            get(routes::plugins::list_parameters),
        )
        .route(
            "/tracks/:track/plugins/:plugin/parameters/names",
            get(routes::plugins::parameter_names),
        )
        .route(
            "/tracks/:track/plugins/:plugin/parameters/:name",
            post(routes::plugins::set_parameter),
        )
        .route(
            "/tracks/:track/plugins/:plugin/parameters/:name/suggestions",
            get(routes::plugins::parameter_suggestions),
        )
        // Parameter cache
        .route("/params/cache", delete(routes::plugins::clear_cache))
        .route("/params/cache/:track", delete(routes::plugins::clear_track_cache))
        .route(
            "/params/cache/:track/:plugin",
            delete(routes::plugins::clear_plugin_cache),
        )
        // Selection
        .route("/selection", get(routes::selection::get_selection))
        .route("/selection", delete(routes::selection::clear_selection))
        .route("/selection/strip", post(routes::selection::select_strip))
        .route("/selection/expand", post(routes::selection::expand_strip))
        .route("/selection/plugin", post(routes::selection::select_plugin))
        .route(
            "/selection/plugin/activate",
            post(routes::selection::activate_plugin),
        )
        // Transport & session
        .route("/transport/play", post(routes::transport::play))
        .route("/transport/stop", post(routes::transport::stop))
        .route("/transport/loop", post(routes::transport::toggle_loop))
        .route("/transport/speed", post(routes::transport::set_speed))
        .route("/session/save", post(routes::transport::save_session))
        .route("/session/snapshot", post(routes::transport::snapshot_session))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
