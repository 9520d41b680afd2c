//! Transport and session endpoint handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    models::{Ack, SnapshotRequest, SpeedRequest},
    routes::{reject, Rejection},
    AppState,
};

/// POST /transport/play - Start the transport
pub async fn play(State(state): State<Arc<AppState>>) -> Result<Json<Ack>, Rejection> {
    state.surface.transport_play().map_err(reject)?;
    Ok(Json(Ack::ok()))
}

/// POST /transport/stop - Stop the transport
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<Json<Ack>, Rejection> {
    state.surface.transport_stop().map_err(reject)?;
    Ok(Json(Ack::ok()))
}

/// POST /transport/loop - Toggle loop playback
pub async fn toggle_loop(State(state): State<Arc<AppState>>) -> Result<Json<Ack>, Rejection> {
    state.surface.loop_toggle().map_err(reject)?;
    Ok(Json(Ack::ok()))
}

/// POST /transport/speed - Set the transport speed
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeedRequest>,
) -> Result<Json<Ack>, Rejection> {
    state.surface.set_transport_speed(req.speed).map_err(reject)?;
    Ok(Json(Ack::ok()))
}

/// POST /session/save - Save the session
pub async fn save_session(State(state): State<Arc<AppState>>) -> Result<Json<Ack>, Rejection> {
    state.surface.save_session().map_err(reject)?;
    Ok(Json(Ack::ok()))
}

/// POST /session/snapshot - Take a session snapshot
pub async fn snapshot_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SnapshotRequest>,
) -> Result<Json<Ack>, Rejection> {
    state
        .surface
        .snapshot_session(req.switch_to_new)
        .map_err(reject)?;
    Ok(Json(Ack::ok()))
}
