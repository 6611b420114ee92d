//! Command dispatcher — the single entry point for caller commands.
//!
//! Each call to [`CommandDispatcher::dispatch`] is independent and runs
//! these steps strictly in sequence:
//!
//! 1. resolve the caller to one device
//! 2. range-check threshold values (no IO)
//! 3. fetch the device shadow
//! 4. gate actuator commands / order-check thresholds / read queried field
//! 5. patch `desired` with exactly one field when allowed
//!
//! The fetch and the patch are not atomic. A concurrent writer landing
//! between them is overwritten field-by-field (last write wins).

use gasguard_domain::command::{Command, CommandClass, CommandResult, FailureKind, QueryTarget};
use gasguard_domain::error::GasGuardError;
use gasguard_domain::id::{CallerId, DeviceId};
use gasguard_domain::safety::gate_actuator;
use gasguard_domain::shadow::{DesiredPatch, Shadow};
use gasguard_domain::threshold::{ThresholdKind, validate_ordering, validate_range};

use crate::ports::{IdentityResolver, ShadowClient};

/// Routes caller commands to the caller's device shadow.
pub struct CommandDispatcher<I, S> {
    identity: I,
    shadow: S,
}

impl<I: IdentityResolver, S: ShadowClient> CommandDispatcher<I, S> {
    /// Create a dispatcher over the given identity and shadow adapters.
    pub fn new(identity: I, shadow: S) -> Self {
        Self { identity, shadow }
    }

    /// Execute `command` on behalf of `caller`.
    ///
    /// Never fails: infrastructure problems come back as
    /// [`CommandResult::Failed`], policy refusals as
    /// [`CommandResult::Rejected`].
    #[tracing::instrument(
        skip(self),
        fields(caller = %caller, command = command.name(), device = tracing::field::Empty)
    )]
    pub async fn dispatch(&self, caller: &CallerId, command: Command) -> CommandResult {
        let device = match self.identity.resolve(caller).await {
            Ok(device) => device,
            Err(GasGuardError::NotRegistered(_)) => {
                tracing::info!("caller has no registered device");
                return CommandResult::Failed(FailureKind::NotAuthorized);
            }
            Err(err) => {
                tracing::warn!(error = %err, "identity lookup failed");
                return CommandResult::Failed(FailureKind::ShadowUnavailable);
            }
        };
        tracing::Span::current().record("device", tracing::field::display(&device));

        match command.class() {
            CommandClass::Actuator(patch) => self.actuate(&device, patch).await,
            CommandClass::SetThreshold { kind, value } => {
                self.set_threshold(&device, kind, value).await
            }
            CommandClass::Query(target) => self.query(&device, target).await,
        }
    }

    /// Devices registered to `caller`, in registration order.
    ///
    /// # Errors
    ///
    /// Returns the identity adapter's error.
    #[tracing::instrument(skip(self))]
    pub async fn registered_devices(
        &self,
        caller: &CallerId,
    ) -> Result<Vec<DeviceId>, GasGuardError> {
        self.identity.registered_devices(caller).await
    }

    /// Whether `caller` has at least one device, checked when a session
    /// starts.
    ///
    /// # Errors
    ///
    /// Returns the identity adapter's error.
    #[tracing::instrument(skip(self))]
    pub async fn is_registered(&self, caller: &CallerId) -> Result<bool, GasGuardError> {
        let devices = self.identity.registered_devices(caller).await?;
        Ok(!devices.is_empty())
    }

    async fn actuate(&self, device: &DeviceId, patch: DesiredPatch) -> CommandResult {
        let shadow = match self.fetch(device).await {
            Ok(shadow) => shadow,
            Err(failed) => return failed,
        };

        if let Err(reason) = gate_actuator(shadow.reported.gas_level_state) {
            tracing::info!(%reason, "actuator command rejected");
            return CommandResult::Rejected(reason);
        }

        self.write(device, patch).await
    }

    async fn set_threshold(
        &self,
        device: &DeviceId,
        kind: ThresholdKind,
        value: u32,
    ) -> CommandResult {
        let proposed = match validate_range(value, kind.bounds()) {
            Ok(proposed) => proposed,
            Err(violation) => {
                tracing::info!(%violation, value, "threshold out of range");
                return CommandResult::Rejected(violation.into());
            }
        };

        let shadow = match self.fetch(device).await {
            Ok(shadow) => shadow,
            Err(failed) => return failed,
        };

        if let Err(violation) = validate_ordering(kind, proposed, &shadow.desired) {
            tracing::info!(%violation, value, "threshold ordering violated");
            return CommandResult::Rejected(violation.into());
        }

        let patch = match kind {
            ThresholdKind::Safe => DesiredPatch::safe_threshold(proposed),
            ThresholdKind::Warning => DesiredPatch::warning_threshold(proposed),
        };
        self.write(device, patch).await
    }

    async fn query(&self, device: &DeviceId, target: QueryTarget) -> CommandResult {
        match self.fetch(device).await {
            Ok(shadow) => CommandResult::Queried(target.read(&shadow)),
            Err(failed) => failed,
        }
    }

    async fn fetch(&self, device: &DeviceId) -> Result<Shadow, CommandResult> {
        self.shadow.get_shadow(device).await.map_err(|err| {
            tracing::warn!(error = %err, "failed to fetch device shadow");
            CommandResult::Failed(FailureKind::ShadowUnavailable)
        })
    }

    async fn write(&self, device: &DeviceId, patch: DesiredPatch) -> CommandResult {
        match self.shadow.patch_desired(device, &patch).await {
            Ok(()) => {
                tracing::info!(?patch, "desired state patched");
                CommandResult::Applied(patch)
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to patch desired state");
                CommandResult::Failed(FailureKind::ShadowUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gasguard_domain::actuator::{PowerState, ValveState};
    use gasguard_domain::command::{QueryValue, RejectionReason};
    use gasguard_domain::gas::{GasLevelState, GasReading, Ppm};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct InMemoryRegistry {
        devices: HashMap<CallerId, Vec<DeviceId>>,
        offline: bool,
    }

    impl IdentityResolver for InMemoryRegistry {
        async fn registered_devices(
            &self,
            caller: &CallerId,
        ) -> Result<Vec<DeviceId>, GasGuardError> {
            if self.offline {
                return Err(GasGuardError::Storage("identity store offline".into()));
            }
            Ok(self.devices.get(caller).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct RecordingShadow {
        shadows: Mutex<HashMap<DeviceId, Shadow>>,
        patches: Mutex<Vec<(DeviceId, DesiredPatch)>>,
        gets: AtomicUsize,
        fail_get: bool,
        fail_patch: bool,
    }

    impl RecordingShadow {
        fn patches(&self) -> Vec<(DeviceId, DesiredPatch)> {
            self.patches.lock().unwrap().clone()
        }
    }

    impl ShadowClient for RecordingShadow {
        async fn get_shadow(&self, device: &DeviceId) -> Result<Shadow, GasGuardError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            if self.fail_get {
                return Err(GasGuardError::ShadowUnavailable("timed out".into()));
            }
            self.shadows
                .lock()
                .unwrap()
                .get(device)
                .cloned()
                .ok_or_else(|| GasGuardError::ShadowUnavailable("no shadow".into()))
        }

        async fn patch_desired(
            &self,
            device: &DeviceId,
            patch: &DesiredPatch,
        ) -> Result<(), GasGuardError> {
            if self.fail_patch {
                return Err(GasGuardError::ShadowUnavailable("connection reset".into()));
            }
            self.patches.lock().unwrap().push((device.clone(), *patch));
            if let Some(shadow) = self.shadows.lock().unwrap().get_mut(device) {
                shadow.desired.apply(patch);
            }
            Ok(())
        }
    }

    fn caller() -> CallerId {
        CallerId::new("amzn1.ask.account.alice").unwrap()
    }

    fn kitchen() -> DeviceId {
        DeviceId::new("gas-monitor-kitchen").unwrap()
    }

    fn make_dispatcher(shadow: Shadow) -> CommandDispatcher<InMemoryRegistry, RecordingShadow> {
        make_dispatcher_with(shadow, RecordingShadow::default())
    }

    fn make_dispatcher_with(
        shadow: Shadow,
        client: RecordingShadow,
    ) -> CommandDispatcher<InMemoryRegistry, RecordingShadow> {
        let mut registry = InMemoryRegistry::default();
        registry.devices.insert(caller(), vec![kitchen()]);
        client.shadows.lock().unwrap().insert(kitchen(), shadow);
        CommandDispatcher::new(registry, client)
    }

    fn safe_shadow() -> Shadow {
        Shadow::builder().gas_level(20, GasLevelState::Safe).build()
    }

    #[tokio::test]
    async fn should_fail_not_authorized_when_caller_has_no_device() {
        let dispatcher =
            CommandDispatcher::new(InMemoryRegistry::default(), RecordingShadow::default());

        let result = dispatcher.dispatch(&caller(), Command::OpenValve).await;

        assert_eq!(result, CommandResult::Failed(FailureKind::NotAuthorized));
        assert_eq!(dispatcher.shadow.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_fail_shadow_unavailable_when_identity_store_is_down() {
        let registry = InMemoryRegistry {
            offline: true,
            ..InMemoryRegistry::default()
        };
        let dispatcher = CommandDispatcher::new(registry, RecordingShadow::default());

        let result = dispatcher.dispatch(&caller(), Command::QueryGas).await;

        assert_eq!(result, CommandResult::Failed(FailureKind::ShadowUnavailable));
    }

    #[tokio::test]
    async fn should_reject_fan_on_without_patch_when_danger() {
        let shadow = Shadow::builder().gas_level(1500, GasLevelState::Danger).build();
        let dispatcher = make_dispatcher(shadow);

        let result = dispatcher.dispatch(&caller(), Command::FanOn).await;

        assert_eq!(
            result,
            CommandResult::Rejected(RejectionReason::UnsafeGasLevel(GasLevelState::Danger))
        );
        assert!(dispatcher.shadow.patches().is_empty());
    }

    #[tokio::test]
    async fn should_patch_only_valve_when_closing_in_safe_state() {
        let dispatcher = make_dispatcher(safe_shadow());

        let result = dispatcher.dispatch(&caller(), Command::CloseValve).await;

        let expected = DesiredPatch::valve(ValveState::Closed);
        assert_eq!(result, CommandResult::Applied(expected));
        assert_eq!(dispatcher.shadow.patches(), vec![(kitchen(), expected)]);
    }

    #[tokio::test]
    async fn should_allow_actuators_when_caution() {
        let shadow = Shadow::builder().gas_level(120, GasLevelState::Caution).build();
        let dispatcher = make_dispatcher(shadow);

        let result = dispatcher.dispatch(&caller(), Command::FanOff).await;

        assert_eq!(result, CommandResult::Applied(DesiredPatch::fan(PowerState::Off)));
    }

    #[tokio::test]
    async fn should_reject_actuator_when_gas_level_unreported() {
        let dispatcher = make_dispatcher(Shadow::default());

        let result = dispatcher.dispatch(&caller(), Command::OpenValve).await;

        assert_eq!(result, CommandResult::Rejected(RejectionReason::GasLevelUnreported));
        assert!(dispatcher.shadow.patches().is_empty());
    }

    #[tokio::test]
    async fn should_yield_same_delta_when_command_repeated() {
        let dispatcher = make_dispatcher(safe_shadow());

        let first = dispatcher.dispatch(&caller(), Command::OpenValve).await;
        let second = dispatcher.dispatch(&caller(), Command::OpenValve).await;

        assert_eq!(first, second);
        assert_eq!(first, CommandResult::Applied(DesiredPatch::valve(ValveState::Open)));
    }

    #[tokio::test]
    async fn should_compare_safe_threshold_against_default_warning() {
        let dispatcher = make_dispatcher(safe_shadow());

        let result = dispatcher.dispatch(&caller(), Command::SetSafeThreshold(150)).await;

        let expected = DesiredPatch::safe_threshold(Ppm::new(150));
        assert_eq!(result, CommandResult::Applied(expected));
        assert_eq!(dispatcher.shadow.patches(), vec![(kitchen(), expected)]);
    }

    #[tokio::test]
    async fn should_reject_warning_below_current_safe_without_patch() {
        let shadow = Shadow::builder().safe_threshold(180).build();
        let dispatcher = make_dispatcher(shadow);

        let result = dispatcher.dispatch(&caller(), Command::SetWarningThreshold(170)).await;

        assert_eq!(
            result,
            CommandResult::Rejected(RejectionReason::ThresholdOrderingViolation(Ppm::new(180)))
        );
        assert!(dispatcher.shadow.patches().is_empty());
    }

    #[tokio::test]
    async fn should_reject_out_of_range_before_fetching_shadow() {
        let dispatcher = make_dispatcher(safe_shadow());

        let result = dispatcher.dispatch(&caller(), Command::SetWarningThreshold(1000)).await;

        assert_eq!(
            result,
            CommandResult::Rejected(RejectionReason::OutOfRange {
                min: Ppm::new(151),
                max: Ppm::new(999),
            })
        );
        assert_eq!(dispatcher.shadow.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_not_gate_thresholds_on_gas_level() {
        let shadow = Shadow::builder().gas_level(1500, GasLevelState::Danger).build();
        let dispatcher = make_dispatcher(shadow);

        let result = dispatcher.dispatch(&caller(), Command::SetWarningThreshold(600)).await;

        assert_eq!(
            result,
            CommandResult::Applied(DesiredPatch::warning_threshold(Ppm::new(600)))
        );
    }

    #[tokio::test]
    async fn should_query_gas_reading_without_patching() {
        let shadow = Shadow::builder().gas_level(85, GasLevelState::Caution).build();
        let dispatcher = make_dispatcher(shadow);

        let result = dispatcher.dispatch(&caller(), Command::QueryGas).await;

        assert_eq!(
            result,
            CommandResult::Queried(QueryValue::Gas(GasReading {
                ppm: Some(Ppm::new(85)),
                state: Some(GasLevelState::Caution),
            }))
        );
        assert!(dispatcher.shadow.patches().is_empty());
    }

    #[tokio::test]
    async fn should_answer_queries_even_when_danger() {
        let shadow = Shadow::builder()
            .gas_level(1500, GasLevelState::Danger)
            .reported_valve(ValveState::Closed)
            .build();
        let dispatcher = make_dispatcher(shadow);

        let result = dispatcher.dispatch(&caller(), Command::QueryValve).await;

        assert_eq!(result, CommandResult::Queried(QueryValue::Valve(ValveState::Closed)));
    }

    #[tokio::test]
    async fn should_query_unset_when_threshold_never_written() {
        let dispatcher = make_dispatcher(safe_shadow());

        let result = dispatcher.dispatch(&caller(), Command::QueryWarningThreshold).await;

        assert_eq!(result, CommandResult::Queried(QueryValue::Unset));
    }

    #[tokio::test]
    async fn should_fail_shadow_unavailable_when_fetch_fails() {
        let client = RecordingShadow {
            fail_get: true,
            ..RecordingShadow::default()
        };
        let dispatcher = make_dispatcher_with(safe_shadow(), client);

        let result = dispatcher.dispatch(&caller(), Command::QueryFan).await;

        assert_eq!(result, CommandResult::Failed(FailureKind::ShadowUnavailable));
    }

    #[tokio::test]
    async fn should_fail_shadow_unavailable_when_patch_fails() {
        let client = RecordingShadow {
            fail_patch: true,
            ..RecordingShadow::default()
        };
        let dispatcher = make_dispatcher_with(safe_shadow(), client);

        let result = dispatcher.dispatch(&caller(), Command::OpenValve).await;

        assert_eq!(result, CommandResult::Failed(FailureKind::ShadowUnavailable));
    }

    #[tokio::test]
    async fn should_route_to_first_registered_device() {
        let garage = DeviceId::new("gas-monitor-garage").unwrap();
        let mut registry = InMemoryRegistry::default();
        registry.devices.insert(caller(), vec![kitchen(), garage.clone()]);
        let client = RecordingShadow::default();
        client.shadows.lock().unwrap().insert(kitchen(), safe_shadow());
        client.shadows.lock().unwrap().insert(garage, safe_shadow());
        let dispatcher = CommandDispatcher::new(registry, client);

        dispatcher.dispatch(&caller(), Command::FanOn).await;

        let patches = dispatcher.shadow.patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].0, kitchen());
    }

    #[tokio::test]
    async fn should_see_previous_threshold_write_on_next_command() {
        let dispatcher = make_dispatcher(safe_shadow());

        dispatcher.dispatch(&caller(), Command::SetSafeThreshold(190)).await;
        let result = dispatcher.dispatch(&caller(), Command::SetWarningThreshold(160)).await;

        assert_eq!(
            result,
            CommandResult::Rejected(RejectionReason::ThresholdOrderingViolation(Ppm::new(190)))
        );
    }

    #[tokio::test]
    async fn should_list_registered_devices() {
        let dispatcher = make_dispatcher(safe_shadow());
        let stranger = CallerId::new("amzn1.ask.account.bob").unwrap();

        assert!(dispatcher.registered_devices(&stranger).await.unwrap().is_empty());
        assert_eq!(
            dispatcher.registered_devices(&caller()).await.unwrap(),
            vec![kitchen()]
        );
    }

    #[tokio::test]
    async fn should_report_registration_status() {
        let dispatcher = make_dispatcher(safe_shadow());
        let stranger = CallerId::new("amzn1.ask.account.bob").unwrap();

        assert!(dispatcher.is_registered(&caller()).await.unwrap());
        assert!(!dispatcher.is_registered(&stranger).await.unwrap());
    }

    #[tokio::test]
    async fn should_propagate_identity_failure_from_registration_check() {
        let registry = InMemoryRegistry {
            offline: true,
            ..InMemoryRegistry::default()
        };
        let dispatcher = CommandDispatcher::new(registry, RecordingShadow::default());

        let result = dispatcher.is_registered(&caller()).await;

        assert!(matches!(result, Err(GasGuardError::Storage(_))));
    }

    #[tokio::test]
    async fn should_query_gas_classification_without_concentration() {
        let shadow = Shadow::builder()
            .gas_level_state(GasLevelState::Safe)
            .build();
        let dispatcher = make_dispatcher(shadow);

        let result = dispatcher.dispatch(&caller(), Command::QueryGas).await;

        assert_eq!(
            result,
            CommandResult::Queried(QueryValue::Gas(GasReading {
                ppm: None,
                state: Some(GasLevelState::Safe),
            }))
        );
    }
}
