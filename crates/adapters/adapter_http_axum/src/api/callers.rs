//! JSON REST handlers acting on behalf of a caller.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use gasguard_app::ports::{CallerRegistry, ShadowClient};
use gasguard_domain::command::{Command, CommandResult};
use gasguard_domain::error::{GasGuardError, NotRegisteredError};
use gasguard_domain::id::{CallerId, DeviceId};
use gasguard_domain::registration::Registration;

use crate::error::ApiError;
use crate::state::AppState;

/// Response of the dispatch endpoint. The body is always the
/// [`CommandResult`]; only the status varies.
pub enum DispatchResponse {
    Ok(Json<CommandResult>),
    Forbidden(Json<CommandResult>),
    Unavailable(Json<CommandResult>),
}

impl From<CommandResult> for DispatchResponse {
    fn from(result: CommandResult) -> Self {
        match result {
            CommandResult::Failed(kind) if kind.is_retryable() => Self::Unavailable(Json(result)),
            CommandResult::Failed(_) => Self::Forbidden(Json(result)),
            other => Self::Ok(Json(other)),
        }
    }
}

impl IntoResponse for DispatchResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
            Self::Forbidden(json) => (StatusCode::FORBIDDEN, json).into_response(),
            Self::Unavailable(json) => (StatusCode::SERVICE_UNAVAILABLE, json).into_response(),
        }
    }
}

/// Body of the devices endpoint.
#[derive(Debug, Serialize)]
pub struct CallerDevices {
    pub caller: CallerId,
    /// Registration order; commands go to the first one.
    pub devices: Vec<DeviceId>,
}

/// Possible responses from the devices endpoint.
pub enum DevicesResponse {
    Ok(Json<CallerDevices>),
}

impl IntoResponse for DevicesResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Body of the caller status endpoint.
#[derive(Debug, Serialize)]
pub struct CallerStatus {
    pub caller: CallerId,
    pub registered: bool,
}

/// Possible responses from the caller status endpoint.
pub enum StatusResponse {
    Ok(Json<CallerStatus>),
}

impl IntoResponse for StatusResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the register endpoint.
pub enum RegisterResponse {
    Ok(Json<Registration>),
}

impl IntoResponse for RegisterResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the unregister endpoint.
pub enum UnregisterResponse {
    NoContent,
}

impl IntoResponse for UnregisterResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/callers/{caller_id}`
pub async fn status<I, S>(
    State(state): State<AppState<I, S>>,
    Path(caller_id): Path<String>,
) -> Result<StatusResponse, ApiError>
where
    I: CallerRegistry + 'static,
    S: ShadowClient + 'static,
{
    let caller = CallerId::from_str(&caller_id)?;
    let registered = state.dispatcher.is_registered(&caller).await?;
    Ok(StatusResponse::Ok(Json(CallerStatus { caller, registered })))
}

/// `POST /api/callers/{caller_id}/commands`
pub async fn dispatch<I, S>(
    State(state): State<AppState<I, S>>,
    Path(caller_id): Path<String>,
    Json(command): Json<Command>,
) -> Result<DispatchResponse, ApiError>
where
    I: CallerRegistry + 'static,
    S: ShadowClient + 'static,
{
    let caller = CallerId::from_str(&caller_id)?;
    let result = state.dispatcher.dispatch(&caller, command).await;
    Ok(DispatchResponse::from(result))
}

/// `GET /api/callers/{caller_id}/devices`
pub async fn devices<I, S>(
    State(state): State<AppState<I, S>>,
    Path(caller_id): Path<String>,
) -> Result<DevicesResponse, ApiError>
where
    I: CallerRegistry + 'static,
    S: ShadowClient + 'static,
{
    let caller = CallerId::from_str(&caller_id)?;
    let devices = state.dispatcher.registered_devices(&caller).await?;
    if devices.is_empty() {
        return Err(GasGuardError::from(NotRegisteredError { caller }).into());
    }
    Ok(DevicesResponse::Ok(Json(CallerDevices { caller, devices })))
}

/// `POST /api/callers/{caller_id}/devices/{device_id}`
pub async fn register<I, S>(
    State(state): State<AppState<I, S>>,
    Path((caller_id, device_id)): Path<(String, String)>,
) -> Result<RegisterResponse, ApiError>
where
    I: CallerRegistry + 'static,
    S: ShadowClient + 'static,
{
    let caller = CallerId::from_str(&caller_id)?;
    let device = DeviceId::from_str(&device_id)?;
    let registration = state.registrations.register(&caller, &device).await?;
    Ok(RegisterResponse::Ok(Json(registration)))
}

/// `DELETE /api/callers/{caller_id}/devices/{device_id}`
pub async fn unregister<I, S>(
    State(state): State<AppState<I, S>>,
    Path((caller_id, device_id)): Path<(String, String)>,
) -> Result<UnregisterResponse, ApiError>
where
    I: CallerRegistry + 'static,
    S: ShadowClient + 'static,
{
    let caller = CallerId::from_str(&caller_id)?;
    let device = DeviceId::from_str(&device_id)?;
    state.registrations.unregister(&caller, &device).await?;
    Ok(UnregisterResponse::NoContent)
}
