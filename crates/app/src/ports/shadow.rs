//! Shadow port — access to the device shadow service.

use std::future::Future;
use std::sync::Arc;

use gasguard_domain::error::GasGuardError;
use gasguard_domain::id::DeviceId;
use gasguard_domain::shadow::{DesiredPatch, Shadow};

/// Reads device shadows and writes partial desired-state updates.
///
/// Implementations must bound every call with a timeout and report
/// transport failures, expiries, missing documents and undecodable payloads
/// as [`GasGuardError::ShadowUnavailable`].
///
/// There is no compare-and-swap: a patch is applied last-write-wins on top
/// of whatever `desired` holds when the service receives it.
pub trait ShadowClient: Send + Sync {
    /// Fetch the current shadow of `device`.
    fn get_shadow(
        &self,
        device: &DeviceId,
    ) -> impl Future<Output = Result<Shadow, GasGuardError>> + Send;

    /// Write the fields present in `patch` into `desired`, leaving the rest
    /// untouched. An empty patch succeeds without effect.
    fn patch_desired(
        &self,
        device: &DeviceId,
        patch: &DesiredPatch,
    ) -> impl Future<Output = Result<(), GasGuardError>> + Send;
}

impl<T: ShadowClient> ShadowClient for Arc<T> {
    fn get_shadow(
        &self,
        device: &DeviceId,
    ) -> impl Future<Output = Result<Shadow, GasGuardError>> + Send {
        (**self).get_shadow(device)
    }

    fn patch_desired(
        &self,
        device: &DeviceId,
        patch: &DesiredPatch,
    ) -> impl Future<Output = Result<(), GasGuardError>> + Send {
        (**self).patch_desired(device, patch)
    }
}
