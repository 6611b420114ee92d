//! Virtual shadow service configuration.

use serde::Deserialize;

use gasguard_domain::actuator::{FanState, ValveState};
use gasguard_domain::error::ValidationError;
use gasguard_domain::gas::{GasLevelState, Ppm};
use gasguard_domain::id::DeviceId;
use gasguard_domain::shadow::{DesiredState, ReportedState, Shadow};
use gasguard_domain::threshold::{ThresholdKind, validate_ordering, validate_range};

/// Simulated devices to seed at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    pub devices: Vec<VirtualDeviceConfig>,
}

/// Initial shadow of one simulated gas monitor.
#[derive(Debug, Clone, Deserialize)]
pub struct VirtualDeviceConfig {
    /// Thing name of the simulated device.
    pub thing_name: String,
    #[serde(default)]
    pub gas_level_ppm: Option<u32>,
    #[serde(default)]
    pub gas_level_state: Option<GasLevelState>,
    #[serde(default)]
    pub valve_state: Option<ValveState>,
    #[serde(default)]
    pub fan_state: Option<FanState>,
    #[serde(default)]
    pub safe_threshold: Option<u32>,
    #[serde(default)]
    pub warning_threshold: Option<u32>,
}

impl VirtualDeviceConfig {
    /// Build the device id and its initial shadow.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] when `thing_name` is blank and
    /// [`ValidationError::Threshold`] when a seeded threshold is out of range
    /// or not strictly below its sibling.
    pub fn to_shadow(&self) -> Result<(DeviceId, Shadow), ValidationError> {
        let id = DeviceId::new(self.thing_name.clone())?;
        let desired = self.desired_thresholds()?;
        let shadow = Shadow {
            reported: ReportedState {
                gas_level_ppm: self.gas_level_ppm.map(Ppm::new),
                gas_level_state: self.gas_level_state,
                valve_state: self.valve_state,
                fan_state: self.fan_state,
            },
            desired,
            version: Some(1),
            updated_at: None,
        };
        Ok((id, shadow))
    }

    fn desired_thresholds(&self) -> Result<DesiredState, ValidationError> {
        let checked = |kind: ThresholdKind, value: Option<u32>| {
            value
                .map(|v| validate_range(v, kind.bounds()))
                .transpose()
                .map_err(|violation| ValidationError::Threshold { kind, violation })
        };
        let desired = DesiredState {
            safe_threshold: checked(ThresholdKind::Safe, self.safe_threshold)?,
            warning_threshold: checked(ThresholdKind::Warning, self.warning_threshold)?,
            ..DesiredState::default()
        };

        if let Some(safe) = desired.safe_threshold {
            validate_ordering(ThresholdKind::Safe, safe, &desired).map_err(|violation| {
                ValidationError::Threshold {
                    kind: ThresholdKind::Safe,
                    violation,
                }
            })?;
        }
        Ok(desired)
    }
}
