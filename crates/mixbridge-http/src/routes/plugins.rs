//! Plugin and parameter endpoint handlers.
//!
//! Tracks are addressed by 1-based logical index (Nth audio/MIDI
//! strip), plugins by 0-based chain position, parameters by name via
//! the mapper cache.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use mixbridge_core::{Error, PluginInfo, PluginParameter, RealValue};

use crate::{
    models::{
        Ack, ActivateRequest, ErrorResponse, Parameter, ParameterSet, ParameterSetResult, Plugin,
        Suggestions,
    },
    routes::{blocking, reject, Rejection},
    AppState,
};

/// Convert internal PluginInfo to API Plugin model
fn plugin_to_api(p: &PluginInfo) -> Plugin {
    Plugin {
        id: p.id,
        name: p.name.clone(),
        kind: p.kind().as_str().to_string(),
        enabled: p.enabled,
        parameter_count: p.parameters.len(),
    }
}

/// Convert internal PluginParameter to API Parameter model
fn parameter_to_api(p: &PluginParameter) -> Parameter {
    Parameter {
        id: p.id,
        name: p.name.clone(),
        value: p.value,
        real_value: p.real_value(),
        display: p.format_value(),
        unit: p.kind.unit_label().to_string(),
        kind: p.kind.as_str().to_string(),
        min: p.min,
        max: p.max,
        controllable: p.controllable,
    }
}

fn to_real_value(req: &ParameterSet) -> RealValue {
    RealValue {
        db: req.db,
        hz: req.hz,
        ratio: req.ratio,
        percent: req.percent,
        ms: req.ms,
        sec: req.sec,
        q: req.q,
        value: req.value,
    }
}

/// A parameter miss answers 404 with up to 5 likely alternatives.
fn parameter_not_found(
    state: &AppState,
    track: usize,
    plugin: usize,
    name: &str,
    err: Error,
) -> Rejection {
    let suggestions = state.mapper.suggest(track, plugin, name).unwrap_or_default();
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::not_found(&err.to_string()).with_suggestions(suggestions)),
    )
}

/// GET /tracks/:track/plugins - Discover the plugin chain on a track
pub async fn list_plugins(
    State(state): State<Arc<AppState>>,
    Path(track): Path<usize>,
) -> Result<Json<Vec<Plugin>>, Rejection> {
    let st = Arc::clone(&state);
    let plugins =
        blocking(move || st.discovery.discover_plugins(track, st.discovery.default_timeout()))
            .await?;
    Ok(Json(plugins.iter().map(plugin_to_api).collect()))
}

/// POST /tracks/:track/plugins/:plugin/activate - Activate or bypass
pub async fn activate_plugin(
    State(state): State<Arc<AppState>>,
    Path((track, plugin)): Path<(usize, usize)>,
    Json(req): Json<ActivateRequest>,
) -> Result<Json<Ack>, Rejection> {
    let st = Arc::clone(&state);
    blocking(move || {
        st.discovery.ensure_strips(st.discovery.default_timeout())?;
        let ssid = st.discovery.resolve_track(track)?;
        st.surface.select_strip(ssid)?;
        st.surface.select_plugin_delta(plugin as i32)?;
        st.surface.plugin_activate(req.active)
    })
    .await?;
    Ok(Json(Ack::ok()))
}

/// GET /tracks/:track/plugins/:plugin/parameters - Discover parameters
pub async fn list_parameters(
    State(state): State<Arc<AppState>>,
    Path((track, plugin)): Path<(usize, usize)>,
) -> Result<Json<Vec<Parameter>>, Rejection> {
    let st = Arc::clone(&state);
    let params = blocking(move || {
        st.discovery
            .discover_plugin_parameters(track, plugin, st.discovery.default_timeout())
    })
    .await?;
    Ok(Json(params.iter().map(parameter_to_api).collect()))
}

/// GET /tracks/:track/plugins/:plugin/parameters/names - Cached names
pub async fn parameter_names(
    State(state): State<Arc<AppState>>,
    Path((track, plugin)): Path<(usize, usize)>,
) -> Result<Json<Vec<String>>, Rejection> {
    let st = Arc::clone(&state);
    let names = blocking(move || st.mapper.list_parameter_names(track, plugin)).await?;
    Ok(Json(names))
}

/// POST /tracks/:track/plugins/:plugin/parameters/:name - Smart set
///
/// Resolves the name through the mapper, converts the unit-keyed body
/// to the normalized range, selects the plugin, sends the value, and
/// updates the cached snapshot.
pub async fn set_parameter(
    State(state): State<Arc<AppState>>,
    Path((track, plugin, name)): Path<(usize, usize, String)>,
    Json(req): Json<ParameterSet>,
) -> Result<Json<ParameterSetResult>, Rejection> {
    let st = Arc::clone(&state);
    let lookup_name = name.clone();
    let info = tokio::task::spawn_blocking(move || {
        st.mapper.parameter_info(track, plugin, &lookup_name)
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::internal(&format!("task panicked: {}", e))),
        )
    })?;
    let info = match info {
        Ok(info) => info,
        Err(err @ Error::NotFound(_)) => {
            return Err(parameter_not_found(&state, track, plugin, &name, err));
        }
        Err(err) => return Err(reject(err)),
    };

    if !info.controllable {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::invalid_value(&format!(
                "parameter '{}' is not controllable",
                info.name
            ))),
        ));
    }

    let normalized = to_real_value(&req).to_normalized(info.kind).map_err(reject)?;

    let st = Arc::clone(&state);
    let param_id = info.id;
    blocking(move || {
        let ssid = st.discovery.resolve_track(track)?;
        st.surface.select_strip(ssid)?;
        st.surface.select_plugin_delta(plugin as i32)?;
        st.surface.plugin_parameter(param_id, normalized as f32)
    })
    .await?;

    state
        .mapper
        .update_value(track, plugin, &name, normalized)
        .map_err(reject)?;

    let updated = state
        .mapper
        .parameter_info(track, plugin, &name)
        .map_err(reject)?;
    Ok(Json(ParameterSetResult {
        name: updated.name.clone(),
        id: updated.id,
        value: updated.value,
        display: updated.format_value(),
    }))
}

/// GET /tracks/:track/plugins/:plugin/parameters/:name/suggestions
pub async fn parameter_suggestions(
    State(state): State<Arc<AppState>>,
    Path((track, plugin, name)): Path<(usize, usize, String)>,
) -> Result<Json<Suggestions>, Rejection> {
    let st = Arc::clone(&state);
    let input = name.clone();
    let suggestions = blocking(move || st.mapper.suggest(track, plugin, &input)).await?;
    Ok(Json(Suggestions {
        input: name,
        suggestions,
    }))
}

/// DELETE /params/cache - Drop every cached mapping
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> StatusCode {
    state.mapper.clear_all();
    StatusCode::NO_CONTENT
}

/// DELETE /params/cache/:track - Drop one track's cached mappings
pub async fn clear_track_cache(
    State(state): State<Arc<AppState>>,
    Path(track): Path<usize>,
) -> StatusCode {
    state.mapper.clear_track(track);
    StatusCode::NO_CONTENT
}

/// DELETE /params/cache/:track/:plugin - Drop one plugin's cached mapping
pub async fn clear_plugin_cache(
    State(state): State<Arc<AppState>>,
    Path((track, plugin)): Path<(usize, usize)>,
) -> StatusCode {
    state.mapper.clear_plugin(track, plugin);
    StatusCode::NO_CONTENT
}
