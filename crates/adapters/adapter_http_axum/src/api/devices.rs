//! JSON REST handlers for device notifications.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use gasguard_app::ports::{CallerRegistry, ShadowClient};
use gasguard_domain::gas::GasLevelState;
use gasguard_domain::id::DeviceId;
use gasguard_domain::shadow::DesiredPatch;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for a gas level notification.
#[derive(Debug, Deserialize)]
pub struct GasLevelRequest {
    pub state: GasLevelState,
}

/// Body returned when a protective state was written.
#[derive(Debug, Serialize)]
pub struct AlarmResponseBody {
    pub device: DeviceId,
    pub patch: DesiredPatch,
}

/// Possible responses from the gas level endpoint.
pub enum GasLevelResponse {
    Applied(Json<AlarmResponseBody>),
    NoContent,
}

impl IntoResponse for GasLevelResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Applied(json) => json.into_response(),
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `POST /api/devices/{device_id}/gas-level`
pub async fn gas_level<I, S>(
    State(state): State<AppState<I, S>>,
    Path(device_id): Path<String>,
    Json(req): Json<GasLevelRequest>,
) -> Result<GasLevelResponse, ApiError>
where
    I: CallerRegistry + 'static,
    S: ShadowClient + 'static,
{
    let device = DeviceId::from_str(&device_id)?;
    match state.alarm.respond(&device, req.state).await? {
        Some(patch) => Ok(GasLevelResponse::Applied(Json(AlarmResponseBody {
            device,
            patch,
        }))),
        None => Ok(GasLevelResponse::NoContent),
    }
}
