//! Threshold validation for the configurable safe / warning levels.
//!
//! Validation happens in two explicit steps:
//!
//! 1. [`validate_range`] — pure bounds check on the proposed value alone.
//! 2. [`validate_ordering`] — compares the proposal with the *current*
//!    sibling threshold taken from the shadow's `desired` state.
//!
//! Unset thresholds fall back to [`DEFAULT_SAFE_THRESHOLD`] and
//! [`DEFAULT_WARNING_THRESHOLD`]. Both defaults sit just outside the
//! accepted ranges, so an unset sibling never blocks a value at its own
//! boundary.

use serde::{Deserialize, Serialize};

use crate::gas::Ppm;
use crate::shadow::DesiredState;

/// Inclusive bounds for a threshold value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdBounds {
    pub min: Ppm,
    pub max: Ppm,
}

impl ThresholdBounds {
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self {
            min: Ppm::new(min),
            max: Ppm::new(max),
        }
    }

    #[must_use]
    pub fn contains(&self, value: u32) -> bool {
        (self.min.get()..=self.max.get()).contains(&value)
    }
}

pub const SAFE_THRESHOLD_BOUNDS: ThresholdBounds = ThresholdBounds::new(51, 199);
pub const WARNING_THRESHOLD_BOUNDS: ThresholdBounds = ThresholdBounds::new(151, 999);
pub const DEFAULT_SAFE_THRESHOLD: Ppm = Ppm::new(50);
pub const DEFAULT_WARNING_THRESHOLD: Ppm = Ppm::new(1000);

/// Which of the two thresholds a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKind {
    Safe,
    Warning,
}

impl std::fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => f.write_str("safe"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

impl ThresholdKind {
    #[must_use]
    pub const fn bounds(self) -> ThresholdBounds {
        match self {
            Self::Safe => SAFE_THRESHOLD_BOUNDS,
            Self::Warning => WARNING_THRESHOLD_BOUNDS,
        }
    }
}

/// Why a proposed threshold was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ThresholdViolation {
    #[error("value must be between {min} and {max} ppm")]
    OutOfRange { min: Ppm, max: Ppm },

    /// The proposal would break `safe < warning`; carries the sibling's
    /// current (possibly defaulted) value.
    #[error("value conflicts with the other threshold, currently {current} ppm")]
    Ordering { current: Ppm },
}

/// The effective (safe, warning) pair, with defaults filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub safe: Ppm,
    pub warning: Ppm,
}

impl ThresholdPair {
    /// Read both thresholds from `desired`, defaulting the unset ones.
    #[must_use]
    pub fn effective(desired: &DesiredState) -> Self {
        Self {
            safe: desired.safe_threshold.unwrap_or(DEFAULT_SAFE_THRESHOLD),
            warning: desired.warning_threshold.unwrap_or(DEFAULT_WARNING_THRESHOLD),
        }
    }

    /// Check that replacing the `kind` threshold with `proposed` keeps
    /// `safe < warning`.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdViolation::Ordering`] with the sibling's current value.
    pub fn check_proposal(&self, kind: ThresholdKind, proposed: Ppm) -> Result<(), ThresholdViolation> {
        match kind {
            ThresholdKind::Safe if proposed >= self.warning => Err(ThresholdViolation::Ordering {
                current: self.warning,
            }),
            ThresholdKind::Warning if proposed <= self.safe => Err(ThresholdViolation::Ordering {
                current: self.safe,
            }),
            _ => Ok(()),
        }
    }
}

/// Step one: bounds check, no shadow required.
///
/// # Errors
///
/// Returns [`ThresholdViolation::OutOfRange`] when `value` falls outside `bounds`.
pub fn validate_range(value: u32, bounds: ThresholdBounds) -> Result<Ppm, ThresholdViolation> {
    if bounds.contains(value) {
        Ok(Ppm::new(value))
    } else {
        Err(ThresholdViolation::OutOfRange {
            min: bounds.min,
            max: bounds.max,
        })
    }
}

/// Step two: ordering check against the current desired thresholds.
///
/// # Errors
///
/// Returns [`ThresholdViolation::Ordering`] when the proposal would make
/// `safe >= warning`.
pub fn validate_ordering(
    kind: ThresholdKind,
    proposed: Ppm,
    desired: &DesiredState,
) -> Result<(), ThresholdViolation> {
    ThresholdPair::effective(desired).check_proposal(kind, proposed)
}
