//! Shared application state for axum handlers.

use std::sync::Arc;

use gasguard_app::ports::{CallerRegistry, ShadowClient};
use gasguard_app::services::command_dispatcher::CommandDispatcher;
use gasguard_app::services::gas_alarm_service::GasAlarmService;
use gasguard_app::services::registration_service::RegistrationService;

/// Application state shared across all axum handlers.
///
/// Generic over the caller registry and shadow client to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<I, S> {
    /// Command use-case: resolve, gate, patch.
    pub dispatcher: Arc<CommandDispatcher<I, S>>,
    /// Registration use-case: bind and unbind devices.
    pub registrations: Arc<RegistrationService<I>>,
    /// Alarm use-case: protective state on a new gas level.
    pub alarm: Arc<GasAlarmService<S>>,
}

impl<I, S> Clone for AppState<I, S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            registrations: Arc::clone(&self.registrations),
            alarm: Arc::clone(&self.alarm),
        }
    }
}

impl<I, S> AppState<I, S>
where
    I: CallerRegistry + 'static,
    S: ShadowClient + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(
        dispatcher: CommandDispatcher<I, S>,
        registrations: RegistrationService<I>,
        alarm: GasAlarmService<S>,
    ) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            registrations: Arc::new(registrations),
            alarm: Arc::new(alarm),
        }
    }
}
