//! Virtual adapter error types.

use gasguard_domain::error::GasGuardError;
use gasguard_domain::id::DeviceId;

/// Errors specific to the virtual shadow service.
#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    /// No shadow exists for the device.
    #[error("no shadow exists for thing {0}")]
    UnknownDevice(DeviceId),

    /// The simulated service was switched offline.
    #[error("virtual shadow service is offline")]
    Offline,
}

impl From<VirtualError> for GasGuardError {
    fn from(err: VirtualError) -> Self {
        Self::ShadowUnavailable(Box::new(err))
    }
}
