//! Registration service — binds devices to callers and removes bindings.

use gasguard_domain::error::{GasGuardError, NotRegisteredError};
use gasguard_domain::id::{CallerId, DeviceId};
use gasguard_domain::registration::Registration;

use crate::ports::CallerRegistry;

/// Manages caller → device bindings.
pub struct RegistrationService<R> {
    registry: R,
}

impl<R: CallerRegistry> RegistrationService<R> {
    /// Create a new service backed by the given registry.
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    /// Bind `device` to `caller`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the registry's error.
    #[tracing::instrument(skip(self))]
    pub async fn register(
        &self,
        caller: &CallerId,
        device: &DeviceId,
    ) -> Result<Registration, GasGuardError> {
        self.registry.register(caller, device).await
    }

    /// Remove the binding between `caller` and `device`.
    ///
    /// # Errors
    ///
    /// Returns [`GasGuardError::NotRegistered`] when no such binding exists,
    /// or the registry's error.
    #[tracing::instrument(skip(self))]
    pub async fn unregister(
        &self,
        caller: &CallerId,
        device: &DeviceId,
    ) -> Result<(), GasGuardError> {
        if self.registry.unregister(caller, device).await? {
            tracing::info!("device unregistered");
            Ok(())
        } else {
            Err(NotRegisteredError {
                caller: caller.clone(),
            }
            .into())
        }
    }
}
