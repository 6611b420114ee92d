//! Identity ports — which devices a caller may command, and how bindings
//! are added or removed.

use std::future::Future;
use std::sync::Arc;

use gasguard_domain::error::{GasGuardError, NotRegisteredError};
use gasguard_domain::id::{CallerId, DeviceId};
use gasguard_domain::registration::Registration;

/// Maps a caller to the devices registered to it.
///
/// A caller with several devices always commands the **first** one in
/// registration order; [`resolve`](Self::resolve) encodes that policy so
/// adapters only have to return an ordered list.
pub trait IdentityResolver: Send + Sync {
    /// All devices registered to `caller`, oldest registration first.
    /// An unknown caller yields an empty list, not an error.
    fn registered_devices(
        &self,
        caller: &CallerId,
    ) -> impl Future<Output = Result<Vec<DeviceId>, GasGuardError>> + Send;

    /// The single device commands from `caller` are routed to.
    ///
    /// # Errors
    ///
    /// Returns [`GasGuardError::NotRegistered`] when the caller has no
    /// device, or the adapter's infrastructure error.
    fn resolve(
        &self,
        caller: &CallerId,
    ) -> impl Future<Output = Result<DeviceId, GasGuardError>> + Send {
        async move {
            self.registered_devices(caller)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    NotRegisteredError {
                        caller: caller.clone(),
                    }
                    .into()
                })
        }
    }
}

impl<T: IdentityResolver> IdentityResolver for Arc<T> {
    fn registered_devices(
        &self,
        caller: &CallerId,
    ) -> impl Future<Output = Result<Vec<DeviceId>, GasGuardError>> + Send {
        (**self).registered_devices(caller)
    }

    fn resolve(
        &self,
        caller: &CallerId,
    ) -> impl Future<Output = Result<DeviceId, GasGuardError>> + Send {
        (**self).resolve(caller)
    }
}

/// Writable side of the identity store.
pub trait CallerRegistry: IdentityResolver {
    /// Bind `device` to `caller` after any device already registered.
    /// Registering an existing binding again returns it unchanged.
    fn register(
        &self,
        caller: &CallerId,
        device: &DeviceId,
    ) -> impl Future<Output = Result<Registration, GasGuardError>> + Send;

    /// Remove the binding; returns whether one existed.
    fn unregister(
        &self,
        caller: &CallerId,
        device: &DeviceId,
    ) -> impl Future<Output = Result<bool, GasGuardError>> + Send;
}

impl<T: CallerRegistry> CallerRegistry for Arc<T> {
    fn register(
        &self,
        caller: &CallerId,
        device: &DeviceId,
    ) -> impl Future<Output = Result<Registration, GasGuardError>> + Send {
        (**self).register(caller, device)
    }

    fn unregister(
        &self,
        caller: &CallerId,
        device: &DeviceId,
    ) -> impl Future<Output = Result<bool, GasGuardError>> + Send {
        (**self).unregister(caller, device)
    }
}
