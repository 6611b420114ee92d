//! Gas concentration and classification reported by the monitor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A gas concentration or threshold in parts per million.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ppm(u32);

impl Ppm {
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for Ppm {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Ppm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Classification the device derives from its own thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasLevelState {
    Safe,
    Caution,
    Danger,
}

impl GasLevelState {
    /// Whether remote actuator commands may proceed at this level.
    #[must_use]
    pub fn permits_actuation(self) -> bool {
        matches!(self, Self::Safe | Self::Caution)
    }
}

impl fmt::Display for GasLevelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => f.write_str("safe"),
            Self::Caution => f.write_str("caution"),
            Self::Danger => f.write_str("danger"),
        }
    }
}

impl FromStr for GasLevelState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "safe" => Ok(Self::Safe),
            "caution" => Ok(Self::Caution),
            "danger" => Ok(Self::Danger),
            other => Err(ValidationError::UnknownVariant {
                kind: "gas level state",
                value: other.to_string(),
            }),
        }
    }
}

/// Concentration and classification read together from `reported`.
/// Either half may be missing on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasReading {
    pub ppm: Option<Ppm>,
    pub state: Option<GasLevelState>,
}
