//! Commands a caller can issue and the outcomes they produce.
//!
//! A [`Command`] arrives already classified (the natural-language layer is
//! not part of this system). Every command yields exactly one
//! [`CommandResult`]; infrastructure failures are folded into
//! [`CommandResult::Failed`] instead of escaping as errors.

use serde::{Deserialize, Serialize};

use crate::actuator::{FanState, PowerState, ValveState};
use crate::gas::{GasLevelState, GasReading, Ppm};
use crate::shadow::{DesiredPatch, Shadow};
use crate::threshold::{ThresholdKind, ThresholdViolation};

/// A structured request against the caller's device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum Command {
    OpenValve,
    CloseValve,
    FanOn,
    FanOff,
    SetSafeThreshold(u32),
    SetWarningThreshold(u32),
    QueryValve,
    QueryFan,
    QueryGas,
    QuerySafeThreshold,
    QueryWarningThreshold,
}

/// How the dispatcher must treat a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// Changes an actuator; gated on the reported gas level. Carries the
    /// one-field patch to write when allowed.
    Actuator(DesiredPatch),
    /// Changes a threshold; validated for range, then ordering.
    SetThreshold { kind: ThresholdKind, value: u32 },
    /// Reads one field of the shadow; never gated, never writes.
    Query(QueryTarget),
}

impl Command {
    /// Stable snake-case name, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenValve => "open_valve",
            Self::CloseValve => "close_valve",
            Self::FanOn => "fan_on",
            Self::FanOff => "fan_off",
            Self::SetSafeThreshold(_) => "set_safe_threshold",
            Self::SetWarningThreshold(_) => "set_warning_threshold",
            Self::QueryValve => "query_valve",
            Self::QueryFan => "query_fan",
            Self::QueryGas => "query_gas",
            Self::QuerySafeThreshold => "query_safe_threshold",
            Self::QueryWarningThreshold => "query_warning_threshold",
        }
    }

    #[must_use]
    pub fn class(&self) -> CommandClass {
        match *self {
            Self::OpenValve => CommandClass::Actuator(DesiredPatch::valve(ValveState::Open)),
            Self::CloseValve => CommandClass::Actuator(DesiredPatch::valve(ValveState::Closed)),
            Self::FanOn => CommandClass::Actuator(DesiredPatch::fan(PowerState::On)),
            Self::FanOff => CommandClass::Actuator(DesiredPatch::fan(PowerState::Off)),
            Self::SetSafeThreshold(value) => CommandClass::SetThreshold {
                kind: ThresholdKind::Safe,
                value,
            },
            Self::SetWarningThreshold(value) => CommandClass::SetThreshold {
                kind: ThresholdKind::Warning,
                value,
            },
            Self::QueryValve => CommandClass::Query(QueryTarget::Valve),
            Self::QueryFan => CommandClass::Query(QueryTarget::Fan),
            Self::QueryGas => CommandClass::Query(QueryTarget::Gas),
            Self::QuerySafeThreshold => CommandClass::Query(QueryTarget::SafeThreshold),
            Self::QueryWarningThreshold => CommandClass::Query(QueryTarget::WarningThreshold),
        }
    }
}

/// The shadow field a query command reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTarget {
    Valve,
    Fan,
    Gas,
    SafeThreshold,
    WarningThreshold,
}

impl QueryTarget {
    /// Read the target field: actuator and gas values from `reported`,
    /// thresholds from `desired`. Missing fields read as [`QueryValue::Unset`].
    #[must_use]
    pub fn read(self, shadow: &Shadow) -> QueryValue {
        let value = match self {
            Self::Valve => shadow.reported.valve_state.map(QueryValue::Valve),
            Self::Fan => shadow.reported.fan_state.map(QueryValue::Fan),
            Self::Gas => shadow.reported.gas_reading().map(QueryValue::Gas),
            Self::SafeThreshold => shadow.desired.safe_threshold.map(QueryValue::SafeThreshold),
            Self::WarningThreshold => shadow
                .desired
                .warning_threshold
                .map(QueryValue::WarningThreshold),
        };
        value.unwrap_or(QueryValue::Unset)
    }
}

/// The value returned by a query command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum QueryValue {
    Valve(ValveState),
    Fan(FanState),
    Gas(GasReading),
    SafeThreshold(Ppm),
    WarningThreshold(Ppm),
    /// The field was never reported or never set.
    Unset,
}

/// Why a well-formed command was refused by policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The device last reported a hazardous gas level.
    #[error("gas level is {0}")]
    UnsafeGasLevel(GasLevelState),

    /// The device has not reported a usable gas classification.
    #[error("gas level has not been reported")]
    GasLevelUnreported,

    /// The proposed threshold is outside its accepted range.
    #[error("value must be between {min} and {max} ppm")]
    OutOfRange { min: Ppm, max: Ppm },

    /// The proposed threshold would break `safe < warning`; carries the
    /// other threshold's current value.
    #[error("value conflicts with the other threshold, currently {0} ppm")]
    ThresholdOrderingViolation(Ppm),
}

impl From<ThresholdViolation> for RejectionReason {
    fn from(violation: ThresholdViolation) -> Self {
        match violation {
            ThresholdViolation::OutOfRange { min, max } => Self::OutOfRange { min, max },
            ThresholdViolation::Ordering { current } => Self::ThresholdOrderingViolation(current),
        }
    }
}

/// Infrastructure failure surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No device is bound to the caller. Permanent.
    NotAuthorized,
    /// The shadow (or identity) service failed. The caller may retry.
    ShadowUnavailable,
}

impl FailureKind {
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::ShadowUnavailable)
    }
}

/// Outcome of dispatching one [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum CommandResult {
    /// The patch that was written to `desired`.
    Applied(DesiredPatch),
    Rejected(RejectionReason),
    Queried(QueryValue),
    Failed(FailureKind),
}
