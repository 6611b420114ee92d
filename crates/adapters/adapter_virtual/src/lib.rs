//! # gasguard-adapter-virtual
//!
//! Virtual/demo shadow service that keeps simulated gas monitor shadows in
//! memory, for testing and demonstration without a broker.
//!
//! ## Behaviour
//!
//! | Call | Effect |
//! |------|--------|
//! | `get_shadow` | Returns a clone of the stored shadow |
//! | `patch_desired` | Merges the patch into `desired`, bumps `version` |
//! | [`VirtualShadowService::report`] | Replaces `reported`, as the device would |
//! | [`VirtualShadowService::set_offline`] | Makes every call fail as unavailable |
//!
//! Unknown devices and the offline switch both surface as
//! [`GasGuardError::ShadowUnavailable`].
//!
//! ## Dependency rule
//!
//! Depends on `gasguard-app` (port traits) and `gasguard-domain` only.

pub mod config;
pub mod error;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use gasguard_app::ports::ShadowClient;
use gasguard_domain::error::{GasGuardError, ValidationError};
use gasguard_domain::id::DeviceId;
use gasguard_domain::shadow::{DesiredPatch, ReportedState, Shadow};
use gasguard_domain::time::now;

pub use config::{VirtualConfig, VirtualDeviceConfig};
pub use error::VirtualError;

/// In-memory stand-in for the device shadow service.
#[derive(Debug, Default)]
pub struct VirtualShadowService {
    shadows: Mutex<HashMap<DeviceId, Shadow>>,
    offline: AtomicBool,
}

impl VirtualShadowService {
    /// Build a service seeded with the configured devices.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a configured thing name is blank or
    /// a seeded threshold pair is invalid.
    pub fn from_config(config: &VirtualConfig) -> Result<Self, ValidationError> {
        let service = Self::default();
        for device in &config.devices {
            let (id, shadow) = device.to_shadow()?;
            tracing::debug!(device = %id, "seeding virtual shadow");
            service.insert(id, shadow);
        }
        Ok(service)
    }

    /// Store `shadow` for `device`, replacing any previous document.
    pub fn insert(&self, device: DeviceId, shadow: Shadow) {
        self.lock().insert(device, shadow);
    }

    /// Replace the reported state of `device`, creating the shadow if needed.
    pub fn report(&self, device: &DeviceId, reported: ReportedState) {
        let mut shadows = self.lock();
        let shadow = shadows.entry(device.clone()).or_default();
        shadow.reported = reported;
        touch(shadow);
    }

    /// Switch the simulated service on or off.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Current document for `device`, bypassing the offline switch.
    #[must_use]
    pub fn snapshot(&self, device: &DeviceId) -> Option<Shadow> {
        self.lock().get(device).cloned()
    }

    /// Thing names currently held, sorted.
    #[must_use]
    pub fn devices(&self) -> Vec<DeviceId> {
        let mut devices: Vec<_> = self.lock().keys().cloned().collect();
        devices.sort();
        devices
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DeviceId, Shadow>> {
        self.shadows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> Result<(), VirtualError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(VirtualError::Offline);
        }
        Ok(())
    }
}

fn touch(shadow: &mut Shadow) {
    shadow.version = Some(shadow.version.map_or(1, |v| v + 1));
    shadow.updated_at = Some(now());
}

impl ShadowClient for VirtualShadowService {
    #[tracing::instrument(skip(self), fields(device = %device))]
    async fn get_shadow(&self, device: &DeviceId) -> Result<Shadow, GasGuardError> {
        self.ensure_online()?;
        self.snapshot(device)
            .ok_or_else(|| VirtualError::UnknownDevice(device.clone()).into())
    }

    #[tracing::instrument(skip(self), fields(device = %device))]
    async fn patch_desired(
        &self,
        device: &DeviceId,
        patch: &DesiredPatch,
    ) -> Result<(), GasGuardError> {
        self.ensure_online()?;
        let mut shadows = self.lock();
        let shadow = shadows
            .get_mut(device)
            .ok_or_else(|| VirtualError::UnknownDevice(device.clone()))?;
        if patch.is_empty() {
            return Ok(());
        }
        shadow.desired.apply(patch);
        touch(shadow);
        tracing::debug!(version = ?shadow.version, "desired state patched");
        Ok(())
    }
}
