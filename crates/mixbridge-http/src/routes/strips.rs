//! Strip endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use mixbridge_core::{Ssid, StripInfo, StripSummary};

use crate::{
    models::{Ack, BoolSet, ErrorResponse, Strip, StripDetail, ValueSet},
    routes::{blocking, reject, Rejection},
    AppState,
};

/// Convert internal StripSummary to API Strip model
fn strip_to_api(s: &StripSummary) -> Strip {
    Strip {
        ssid: s.id.as_i32(),
        name: s.name.clone(),
        muted: s.muted,
        soloed: s.soloed,
    }
}

/// Convert internal StripInfo to API StripDetail model
fn detail_to_api(s: &StripInfo) -> StripDetail {
    StripDetail {
        ssid: s.id.as_i32(),
        kind: s.kind.as_str().to_string(),
        name: s.name.clone(),
        inputs: s.inputs,
        outputs: s.outputs,
        muted: s.muted,
        soloed: s.soloed,
    }
}

/// GET /strips - List all known strips (runs discovery on first use)
pub async fn list_strips(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Strip>>, Rejection> {
    let st = Arc::clone(&state);
    let summaries = blocking(move || {
        st.discovery.ensure_strips(st.discovery.default_timeout())?;
        Ok(st.store.all_strip_summaries())
    })
    .await?;
    Ok(Json(summaries.iter().map(strip_to_api).collect()))
}

/// POST /strips/refresh - Re-run setup + enumeration from scratch
pub async fn refresh_strips(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Strip>>, Rejection> {
    let st = Arc::clone(&state);
    let summaries =
        blocking(move || st.discovery.refresh_strips(st.discovery.default_timeout())).await?;
    Ok(Json(summaries.iter().map(strip_to_api).collect()))
}

/// GET /strips/:ssid - Full details for one strip
pub async fn get_strip(
    State(state): State<Arc<AppState>>,
    Path(ssid): Path<i32>,
) -> Result<Json<StripDetail>, Rejection> {
    let st = Arc::clone(&state);
    let details = blocking(move || {
        st.discovery.ensure_strips(st.discovery.default_timeout())?;
        Ok(st.store.strip_details(Ssid::new(ssid)))
    })
    .await?;

    match details {
        Some(s) => Ok(Json(detail_to_api(&s))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found(&format!("strip {} not found", ssid))),
        )),
    }
}

/// POST /strips/:ssid/gain - Set strip gain in dB
pub async fn set_gain(
    State(state): State<Arc<AppState>>,
    Path(ssid): Path<i32>,
    Json(req): Json<ValueSet>,
) -> Result<Json<Ack>, Rejection> {
    state
        .surface
        .strip_gain(Ssid::new(ssid), req.value)
        .map_err(reject)?;
    Ok(Json(Ack::ok()))
}

/// POST /strips/:ssid/fader - Set strip fader position (0..1)
pub async fn set_fader(
    State(state): State<Arc<AppState>>,
    Path(ssid): Path<i32>,
    Json(req): Json<ValueSet>,
) -> Result<Json<Ack>, Rejection> {
    state
        .surface
        .strip_fader(Ssid::new(ssid), req.value)
        .map_err(reject)?;
    Ok(Json(Ack::ok()))
}

/// POST /strips/:ssid/mute - Set strip mute state
pub async fn set_mute(
    State(state): State<Arc<AppState>>,
    Path(ssid): Path<i32>,
    Json(req): Json<BoolSet>,
) -> Result<Json<Ack>, Rejection> {
    state
        .surface
        .strip_mute(Ssid::new(ssid), req.state)
        .map_err(reject)?;
    Ok(Json(Ack::ok()))
}

/// POST /strips/:ssid/solo - Set strip solo state
pub async fn set_solo(
    State(state): State<Arc<AppState>>,
    Path(ssid): Path<i32>,
    Json(req): Json<BoolSet>,
) -> Result<Json<Ack>, Rejection> {
    state
        .surface
        .strip_solo(Ssid::new(ssid), req.state)
        .map_err(reject)?;
    Ok(Json(Ack::ok()))
}

/// POST /strips/:ssid/pan - Set stereo pan position (0..1, 0.5 = center)
pub async fn set_pan(
    State(state): State<Arc<AppState>>,
    Path(ssid): Path<i32>,
    Json(req): Json<ValueSet>,
) -> Result<Json<Ack>, Rejection> {
    state
        .surface
        .strip_pan(Ssid::new(ssid), req.value)
        .map_err(reject)?;
    Ok(Json(Ack::ok()))
}
