//! Gas alarm service — writes the protective desired state when a device
//! reports a new gas level.
//!
//! This runs on behalf of the platform, not of a caller: it is neither
//! gated nor limited to one field.

use gasguard_domain::error::GasGuardError;
use gasguard_domain::gas::GasLevelState;
use gasguard_domain::id::DeviceId;
use gasguard_domain::safety::alarm_response;
use gasguard_domain::shadow::DesiredPatch;

use crate::ports::ShadowClient;

/// Applies the alarm response table to a device's shadow.
pub struct GasAlarmService<S> {
    shadow: S,
}

impl<S: ShadowClient> GasAlarmService<S> {
    /// Create a new service backed by the given shadow adapter.
    pub fn new(shadow: S) -> Self {
        Self { shadow }
    }

    /// React to `device` reporting `state`.
    ///
    /// Returns the patch that was written, or `None` when the level needs
    /// no intervention.
    ///
    /// # Errors
    ///
    /// Returns [`GasGuardError::ShadowUnavailable`] when the patch could not
    /// be written.
    #[tracing::instrument(skip(self), fields(device = %device, state = %state))]
    pub async fn respond(
        &self,
        device: &DeviceId,
        state: GasLevelState,
    ) -> Result<Option<DesiredPatch>, GasGuardError> {
        let Some(patch) = alarm_response(state) else {
            tracing::debug!("gas level safe, no response needed");
            return Ok(None);
        };

        self.shadow.patch_desired(device, &patch).await?;
        tracing::warn!(?patch, "protective state written");
        Ok(Some(patch))
    }
}
