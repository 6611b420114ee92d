//! Safety policy: the actuator gate and the automatic alarm response.

use crate::actuator::{PowerState, ValveState};
use crate::command::RejectionReason;
use crate::gas::GasLevelState;
use crate::shadow::DesiredPatch;

/// Decide whether an actuator command may be written, given the device's
/// last reported gas classification.
///
/// Only `Safe` and `Caution` pass. A missing classification (never reported,
/// or a faulted sensor) is refused as well.
///
/// # Errors
///
/// Returns [`RejectionReason::UnsafeGasLevel`] for `Danger` and
/// [`RejectionReason::GasLevelUnreported`] when nothing was reported.
pub fn gate_actuator(reported: Option<GasLevelState>) -> Result<(), RejectionReason> {
    match reported {
        Some(state) if state.permits_actuation() => Ok(()),
        Some(state) => Err(RejectionReason::UnsafeGasLevel(state)),
        None => Err(RejectionReason::GasLevelUnreported),
    }
}

/// Protective desired state to write when the device reports `state`.
///
/// | level   | patch                                   |
/// |---------|-----------------------------------------|
/// | safe    | none                                    |
/// | caution | valve closed                            |
/// | danger  | valve closed, buzzer on, fan on         |
#[must_use]
pub fn alarm_response(state: GasLevelState) -> Option<DesiredPatch> {
    match state {
        GasLevelState::Safe => None,
        GasLevelState::Caution => Some(DesiredPatch::valve(ValveState::Closed)),
        GasLevelState::Danger => Some(
            DesiredPatch::valve(ValveState::Closed)
                .and(DesiredPatch::buzzer(PowerState::On))
                .and(DesiredPatch::fan(PowerState::On)),
        ),
    }
}
