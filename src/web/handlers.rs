//! HTTP handlers for the light endpoints.

use crate::light::LightController;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub light: Arc<LightController>,
    pub strict_json: bool,
}

impl AppState {
    pub fn new(light: Arc<LightController>) -> Self {
        Self {
            light,
            strict_json: false,
        }
    }

    pub fn with_strict_json(mut self, strict_json: bool) -> Self {
        self.strict_json = strict_json;
        self
    }
}

/// Body of `GET /light/intensity`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntensityResponse {
    #[serde(rename = "Value")]
    pub value: u8,
}

/// Body of `POST /light/power`.
///
/// Any well-formed JSON object is a command: a missing or `null` `On`
/// means off, and the field name matches in any case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PowerRequest {
    #[serde(
        rename = "On",
        alias = "on",
        alias = "ON",
        alias = "oN",
        default,
        deserialize_with = "null_as_off"
    )]
    pub on: bool,
}

fn null_as_off<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Body of `GET /light/power`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PowerResponse {
    #[serde(rename = "On")]
    pub on: bool,
}

/// Plain-text greeting at `/`.
pub async fn home() -> &'static str {
    crate::GREETING
}

/// Read the light sensor.
pub async fn get_intensity(
    State(state): State<AppState>,
) -> Result<Json<IntensityResponse>, StatusCode> {
    match state.light.intensity() {
        Ok(intensity) => Ok(Json(IntensityResponse { value: intensity.0 })),
        Err(e) => {
            error!("Failed to read intensity: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Report the last commanded power state.
pub async fn get_power(State(state): State<AppState>) -> Json<PowerResponse> {
    Json(PowerResponse {
        on: state.light.power().await,
    })
}

/// Switch the light on or off.
///
/// Bodies that are not JSON, or carry a non-boolean `On`, leave the state
/// alone and still answer 200 so that existing clients keep working; strict
/// mode answers 400 instead.
pub async fn set_power(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let request: PowerRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Ignoring malformed power request: {}", e);
            return if state.strict_json {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::OK
            };
        }
    };

    match state.light.set_power(request.on).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            error!("Failed to set power: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
