//! Selection endpoint handlers.
//!
//! Every mutation goes out to the surface first; the local tracker is
//! only updated once the command was accepted for transmission.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use mixbridge_core::{SelectionState, Ssid};

use crate::{
    models::{
        ActivateRequest, ErrorResponse, ExpandRequest, Selection, SelectPluginRequest,
        SelectStripRequest,
    },
    routes::{reject, Rejection},
    AppState,
};

/// Convert internal SelectionState to API Selection model
fn selection_to_api(s: &SelectionState) -> Selection {
    Selection {
        strip_id: s.strip_id.map(|id| id.as_i32()),
        plugin_id: s.plugin_id,
        mode: s.mode.as_str().to_string(),
        expanded: s.expanded,
        valid: s.is_valid(),
    }
}

/// GET /selection - Current selection snapshot
pub async fn get_selection(State(state): State<Arc<AppState>>) -> Json<Selection> {
    Json(selection_to_api(&state.selection.snapshot()))
}

/// DELETE /selection - Reset to the initial state
pub async fn clear_selection(State(state): State<Arc<AppState>>) -> StatusCode {
    state.selection.clear();
    StatusCode::NO_CONTENT
}

/// POST /selection/strip - GUI-select a strip
pub async fn select_strip(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectStripRequest>,
) -> Result<Json<Selection>, Rejection> {
    let ssid = Ssid::new(req.ssid);
    state.surface.select_strip(ssid).map_err(reject)?;
    let new = state.selection.select_strip(ssid).map_err(reject)?;
    Ok(Json(selection_to_api(&new)))
}

/// POST /selection/expand - Locally expand a strip, or revert
pub async fn expand_strip(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExpandRequest>,
) -> Result<Json<Selection>, Rejection> {
    let ssid = Ssid::new(req.ssid);
    state
        .surface
        .expand_strip(ssid, req.expanded)
        .map_err(reject)?;
    let new = state
        .selection
        .expand_strip(ssid, req.expanded)
        .map_err(reject)?;
    Ok(Json(selection_to_api(&new)))
}

/// POST /selection/plugin - Select a plugin by absolute id or delta
pub async fn select_plugin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectPluginRequest>,
) -> Result<Json<Selection>, Rejection> {
    let snapshot = state.selection.snapshot();
    let no_strip = || {
        (
            StatusCode::CONFLICT,
            Json(ErrorResponse::conflict("no strip selected")),
        )
    };
    let new = match (req.id, req.delta) {
        (Some(id), None) => {
            let target = req
                .ssid
                .map(Ssid::new)
                .or(snapshot.strip_id)
                .ok_or_else(no_strip)?;
            // Selecting the strip resets the plugin page to the head
            // of the chain; the delta then walks to the position.
            state.surface.select_strip(target).map_err(reject)?;
            state
                .surface
                .select_plugin_delta(id as i32)
                .map_err(reject)?;
            state
                .selection
                .select_plugin(id, Some(target))
                .map_err(reject)?
        }
        (None, Some(delta)) => {
            if snapshot.strip_id.is_none() {
                return Err(no_strip());
            }
            state.surface.select_plugin_delta(delta).map_err(reject)?;
            state.selection.select_plugin_delta(delta).map_err(reject)?
        }
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(
                    "exactly one of 'id' or 'delta' must be given",
                )),
            ));
        }
    };
    Ok(Json(selection_to_api(&new)))
}

/// POST /selection/plugin/activate - Activate or bypass the selected plugin
pub async fn activate_plugin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ActivateRequest>,
) -> Result<Json<Selection>, Rejection> {
    let snapshot = state.selection.snapshot();
    if !snapshot.is_valid() {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::conflict("no strip selected")),
        ));
    }
    state.surface.plugin_activate(req.active).map_err(reject)?;
    Ok(Json(selection_to_api(&snapshot)))
}
