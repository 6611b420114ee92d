//! Device shadow — the service-held document pairing what the device last
//! reported with what callers last asked for.
//!
//! `reported` is written only by the device; this system reads it.
//! `desired` is written only through partial [`DesiredPatch`]es: fields left
//! out of a patch keep their current value.

use serde::{Deserialize, Serialize};

use crate::actuator::{BuzzerState, FanState, ValveState};
use crate::gas::{GasLevelState, GasReading, Ppm};
use crate::time::Timestamp;

/// Values last confirmed by the device. Every field may be missing: a
/// freshly provisioned device has reported nothing, and a faulted sensor
/// reports no concentration or classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedState {
    pub gas_level_ppm: Option<Ppm>,
    pub gas_level_state: Option<GasLevelState>,
    pub valve_state: Option<ValveState>,
    pub fan_state: Option<FanState>,
}

impl ReportedState {
    /// Concentration and classification, if either was reported.
    #[must_use]
    pub fn gas_reading(&self) -> Option<GasReading> {
        if self.gas_level_ppm.is_none() && self.gas_level_state.is_none() {
            return None;
        }
        Some(GasReading {
            ppm: self.gas_level_ppm,
            state: self.gas_level_state,
        })
    }
}

/// Values most recently requested for the device. Absence means "never set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    pub valve_state: Option<ValveState>,
    pub fan_state: Option<FanState>,
    pub buzzer_state: Option<BuzzerState>,
    pub safe_threshold: Option<Ppm>,
    pub warning_threshold: Option<Ppm>,
}

impl DesiredState {
    /// Overwrite the fields present in `patch`, leaving the others untouched.
    pub fn apply(&mut self, patch: &DesiredPatch) {
        if let Some(valve) = patch.valve_state {
            self.valve_state = Some(valve);
        }
        if let Some(fan) = patch.fan_state {
            self.fan_state = Some(fan);
        }
        if let Some(buzzer) = patch.buzzer_state {
            self.buzzer_state = Some(buzzer);
        }
        if let Some(safe) = patch.safe_threshold {
            self.safe_threshold = Some(safe);
        }
        if let Some(warning) = patch.warning_threshold {
            self.warning_threshold = Some(warning);
        }
    }
}

/// A partial update of [`DesiredState`]. Only `Some` fields are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valve_state: Option<ValveState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_state: Option<FanState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buzzer_state: Option<BuzzerState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_threshold: Option<Ppm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_threshold: Option<Ppm>,
}

impl DesiredPatch {
    #[must_use]
    pub fn valve(state: ValveState) -> Self {
        Self {
            valve_state: Some(state),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn fan(state: FanState) -> Self {
        Self {
            fan_state: Some(state),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn buzzer(state: BuzzerState) -> Self {
        Self {
            buzzer_state: Some(state),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn safe_threshold(value: Ppm) -> Self {
        Self {
            safe_threshold: Some(value),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn warning_threshold(value: Ppm) -> Self {
        Self {
            warning_threshold: Some(value),
            ..Self::default()
        }
    }

    /// Combine two patches; fields set in `other` win.
    #[must_use]
    pub fn and(mut self, other: Self) -> Self {
        self.valve_state = other.valve_state.or(self.valve_state);
        self.fan_state = other.fan_state.or(self.fan_state);
        self.buzzer_state = other.buzzer_state.or(self.buzzer_state);
        self.safe_threshold = other.safe_threshold.or(self.safe_threshold);
        self.warning_threshold = other.warning_threshold.or(self.warning_threshold);
        self
    }

    /// Number of fields this patch writes.
    #[must_use]
    pub fn field_count(&self) -> usize {
        [
            self.valve_state.is_some(),
            self.fan_state.is_some(),
            self.buzzer_state.is_some(),
            self.safe_threshold.is_some(),
            self.warning_threshold.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }
}

/// The reconciled state document of one device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shadow {
    pub reported: ReportedState,
    pub desired: DesiredState,
    /// Document version, incremented by the service on every write.
    pub version: Option<u64>,
    /// When the service last wrote the document.
    pub updated_at: Option<Timestamp>,
}

impl Shadow {
    /// Create a builder for constructing a [`Shadow`].
    #[must_use]
    pub fn builder() -> ShadowBuilder {
        ShadowBuilder::default()
    }
}

/// Step-by-step builder for [`Shadow`].
#[derive(Debug, Default)]
pub struct ShadowBuilder {
    shadow: Shadow,
}

impl ShadowBuilder {
    #[must_use]
    pub fn gas_level(mut self, ppm: u32, state: GasLevelState) -> Self {
        self.shadow.reported.gas_level_ppm = Some(Ppm::new(ppm));
        self.shadow.reported.gas_level_state = Some(state);
        self
    }

    #[must_use]
    pub fn gas_level_state(mut self, state: GasLevelState) -> Self {
        self.shadow.reported.gas_level_state = Some(state);
        self
    }

    #[must_use]
    pub fn reported_valve(mut self, state: ValveState) -> Self {
        self.shadow.reported.valve_state = Some(state);
        self
    }

    #[must_use]
    pub fn reported_fan(mut self, state: FanState) -> Self {
        self.shadow.reported.fan_state = Some(state);
        self
    }

    #[must_use]
    pub fn safe_threshold(mut self, value: u32) -> Self {
        self.shadow.desired.safe_threshold = Some(Ppm::new(value));
        self
    }

    #[must_use]
    pub fn warning_threshold(mut self, value: u32) -> Self {
        self.shadow.desired.warning_threshold = Some(Ppm::new(value));
        self
    }

    #[must_use]
    pub fn version(mut self, version: u64) -> Self {
        self.shadow.version = Some(version);
        self
    }

    #[must_use]
    pub fn build(self) -> Shadow {
        self.shadow
    }
}
