//! JSON payloads exchanged on the shadow topics.
//!
//! Devices report their gas classification with the firmware's own
//! vocabulary (`seguro`, `precaucion`, `emergencia`, `error`); English names
//! are accepted too. A faulted sensor (`error`, or a negative ppm) decodes as
//! "not reported".

use serde::{Deserialize, Serialize};

use gasguard_domain::actuator::{FanState, ValveState};
use gasguard_domain::gas::{GasLevelState, Ppm};
use gasguard_domain::shadow::{DesiredPatch, DesiredState, ReportedState, Shadow};
use gasguard_domain::time::from_epoch_secs;

use crate::error::MqttError;

/// Body of a `get` request.
#[derive(Debug, Serialize)]
pub struct GetRequest<'a> {
    #[serde(rename = "clientToken")]
    pub client_token: &'a str,
}

/// Body of an `update` request writing `desired` only.
#[derive(Debug, Serialize)]
pub struct UpdateRequest<'a> {
    pub state: DesiredEnvelope<'a>,
    #[serde(rename = "clientToken")]
    pub client_token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct DesiredEnvelope<'a> {
    pub desired: &'a DesiredPatch,
}

impl<'a> UpdateRequest<'a> {
    #[must_use]
    pub fn new(patch: &'a DesiredPatch, client_token: &'a str) -> Self {
        Self {
            state: DesiredEnvelope { desired: patch },
            client_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "clientToken")]
    client_token: Option<String>,
}

/// Body published on a `…/rejected` topic.
#[derive(Debug, Deserialize)]
pub struct Rejection {
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

impl From<Rejection> for MqttError {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected {
            code: rejection.code,
            message: rejection.message,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ShadowDocument {
    #[serde(default)]
    state: Option<WireState>,
    #[serde(default)]
    version: Option<u64>,
    #[serde(default)]
    timestamp: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct WireState {
    #[serde(default)]
    reported: Option<WireReported>,
    #[serde(default)]
    desired: Option<DesiredState>,
}

#[derive(Debug, Default, Deserialize)]
struct WireReported {
    #[serde(default)]
    gas_level_ppm: Option<i64>,
    #[serde(default)]
    gas_level_state: Option<String>,
    #[serde(default)]
    valve_state: Option<ValveState>,
    #[serde(default)]
    fan_state: Option<FanState>,
}

/// Extract the correlation token of a response.
///
/// # Errors
///
/// Returns [`MqttError::PayloadParse`] when the payload is not a JSON object.
pub fn client_token(payload: &[u8]) -> Result<Option<String>, MqttError> {
    let envelope: Envelope = serde_json::from_slice(payload).map_err(MqttError::PayloadParse)?;
    Ok(envelope.client_token)
}

/// Decode the body of a `…/rejected` response.
///
/// # Errors
///
/// Returns [`MqttError::PayloadParse`] when the body has no numeric `code`.
pub fn rejection(payload: &[u8]) -> Result<Rejection, MqttError> {
    serde_json::from_slice(payload).map_err(MqttError::PayloadParse)
}

/// Decode a `get/accepted` document into a [`Shadow`].
///
/// # Errors
///
/// Returns [`MqttError::PayloadParse`] for invalid JSON or unknown actuator
/// values, and [`MqttError::Malformed`] for an unknown gas classification or
/// an out-of-range ppm.
pub fn decode_shadow(payload: &[u8]) -> Result<Shadow, MqttError> {
    let document: ShadowDocument =
        serde_json::from_slice(payload).map_err(MqttError::PayloadParse)?;
    let state = document.state.unwrap_or_default();
    let reported = state.reported.unwrap_or_default();

    Ok(Shadow {
        reported: ReportedState {
            gas_level_ppm: reported.gas_level_ppm.map(decode_ppm).transpose()?.flatten(),
            gas_level_state: reported
                .gas_level_state
                .as_deref()
                .map(decode_gas_state)
                .transpose()?
                .flatten(),
            valve_state: reported.valve_state,
            fan_state: reported.fan_state,
        },
        desired: state.desired.unwrap_or_default(),
        version: document.version,
        updated_at: document.timestamp.and_then(from_epoch_secs),
    })
}

fn decode_ppm(raw: i64) -> Result<Option<Ppm>, MqttError> {
    if raw < 0 {
        return Ok(None);
    }
    u32::try_from(raw)
        .map(|value| Some(Ppm::new(value)))
        .map_err(|_| MqttError::Malformed(format!("gas level {raw} ppm out of range")))
}

fn decode_gas_state(raw: &str) -> Result<Option<GasLevelState>, MqttError> {
    match raw.trim().to_lowercase().as_str() {
        "seguro" => Ok(Some(GasLevelState::Safe)),
        "precaucion" | "precaución" => Ok(Some(GasLevelState::Caution)),
        "emergencia" => Ok(Some(GasLevelState::Danger)),
        "error" => Ok(None),
        other => other
            .parse()
            .map(Some)
            .map_err(|_| MqttError::Malformed(format!("unknown gas level state {raw:?}"))),
    }
}
