//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use gasguard_app::ports::{CallerRegistry, ShadowClient};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api` and includes a [`TraceLayer`] that logs
/// each HTTP request/response at the `DEBUG` level using the `tracing`
/// ecosystem.
pub fn build<I, S>(state: AppState<I, S>) -> Router
where
    I: CallerRegistry + 'static,
    S: ShadowClient + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use gasguard_app::services::command_dispatcher::CommandDispatcher;
    use gasguard_app::ports::IdentityResolver;
    use gasguard_app::services::gas_alarm_service::GasAlarmService;
    use gasguard_app::services::registration_service::RegistrationService;
    use gasguard_domain::actuator::ValveState;
    use gasguard_domain::error::GasGuardError;
    use gasguard_domain::gas::GasLevelState;
    use gasguard_domain::id::{CallerId, DeviceId};
    use gasguard_domain::registration::Registration;
    use gasguard_domain::shadow::{DesiredPatch, Shadow};
    use gasguard_domain::time::from_epoch_secs;
    use std::sync::Arc;

    use super::*;

    #[derive(Default)]
    struct StubRegistry {
        devices: Mutex<HashMap<CallerId, Vec<DeviceId>>>,
    }

    impl IdentityResolver for StubRegistry {
        async fn registered_devices(
            &self,
            caller: &CallerId,
        ) -> Result<Vec<DeviceId>, GasGuardError> {
            Ok(self
                .devices
                .lock()
                .unwrap()
                .get(caller)
                .cloned()
                .unwrap_or_default())
        }
    }

    impl CallerRegistry for StubRegistry {
        async fn register(
            &self,
            caller: &CallerId,
            device: &DeviceId,
        ) -> Result<Registration, GasGuardError> {
            let mut devices = self.devices.lock().unwrap();
            let list = devices.entry(caller.clone()).or_default();
            let position = list.iter().position(|d| d == device).unwrap_or_else(|| {
                list.push(device.clone());
                list.len() - 1
            });
            Ok(Registration {
                caller: caller.clone(),
                device: device.clone(),
                position: u32::try_from(position).unwrap(),
                registered_at: from_epoch_secs(1_700_000_000).unwrap(),
            })
        }

        async fn unregister(
            &self,
            caller: &CallerId,
            device: &DeviceId,
        ) -> Result<bool, GasGuardError> {
            let mut devices = self.devices.lock().unwrap();
            let Some(list) = devices.get_mut(caller) else {
                return Ok(false);
            };
            let before = list.len();
            list.retain(|d| d != device);
            Ok(list.len() < before)
        }
    }

    #[derive(Default)]
    struct StubShadow {
        shadows: Mutex<HashMap<DeviceId, Shadow>>,
        offline: AtomicBool,
    }

    impl ShadowClient for StubShadow {
        async fn get_shadow(&self, device: &DeviceId) -> Result<Shadow, GasGuardError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(GasGuardError::ShadowUnavailable("offline".into()));
            }
            self.shadows
                .lock()
                .unwrap()
                .get(device)
                .cloned()
                .ok_or_else(|| GasGuardError::ShadowUnavailable("no such thing".into()))
        }

        async fn patch_desired(
            &self,
            device: &DeviceId,
            patch: &DesiredPatch,
        ) -> Result<(), GasGuardError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(GasGuardError::ShadowUnavailable("offline".into()));
            }
            let mut shadows = self.shadows.lock().unwrap();
            shadows.entry(device.clone()).or_default().desired.apply(patch);
            Ok(())
        }
    }

    fn kitchen() -> DeviceId {
        DeviceId::new("kitchen").unwrap()
    }

    fn test_app(gas: GasLevelState) -> (Router, Arc<StubShadow>) {
        let (app, shadow, _) = test_app_with_registry(gas);
        (app, shadow)
    }

    fn test_app_with_registry(
        gas: GasLevelState,
    ) -> (Router, Arc<StubShadow>, Arc<StubRegistry>) {
        let registry = Arc::new(StubRegistry::default());
        registry
            .devices
            .lock()
            .unwrap()
            .insert(CallerId::new("alice").unwrap(), vec![kitchen()]);

        let shadow = Arc::new(StubShadow::default());
        shadow.shadows.lock().unwrap().insert(
            kitchen(),
            Shadow::builder().gas_level(40, gas).build(),
        );

        let state = AppState::new(
            CommandDispatcher::new(Arc::clone(&registry), Arc::clone(&shadow)),
            RegistrationService::new(Arc::clone(&registry)),
            GasAlarmService::new(Arc::clone(&shadow)),
        );
        (build(state), shadow, registry)
    }

    fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn empty(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let (app, _) = test_app(GasLevelState::Safe);

        let response = app.oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_apply_actuator_command_when_safe() {
        let (app, shadow) = test_app(GasLevelState::Safe);

        let response = app
            .oneshot(post_json(
                "/api/callers/alice/commands",
                &serde_json::json!({"command": "close_valve"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"outcome": "applied", "detail": {"valve_state": "closed"}})
        );
        let shadows = shadow.shadows.lock().unwrap();
        assert_eq!(
            shadows[&kitchen()].desired.valve_state,
            Some(ValveState::Closed)
        );
    }

    #[tokio::test]
    async fn should_return_rejection_with_ok_status_when_danger() {
        let (app, _) = test_app(GasLevelState::Danger);

        let response = app
            .oneshot(post_json(
                "/api/callers/alice/commands",
                &serde_json::json!({"command": "fan_off"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["outcome"], "rejected");
        assert_eq!(body["detail"]["reason"], "unsafe_gas_level");
    }

    #[tokio::test]
    async fn should_return_forbidden_for_unregistered_caller() {
        let (app, _) = test_app(GasLevelState::Safe);

        let response = app
            .oneshot(post_json(
                "/api/callers/mallory/commands",
                &serde_json::json!({"command": "open_valve"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"outcome": "failed", "detail": "not_authorized"})
        );
    }

    #[tokio::test]
    async fn should_return_unavailable_when_shadow_offline() {
        let (app, shadow) = test_app(GasLevelState::Safe);
        shadow.offline.store(true, Ordering::SeqCst);

        let response = app
            .oneshot(post_json(
                "/api/callers/alice/commands",
                &serde_json::json!({"command": "query_gas"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn should_reject_blank_caller_id() {
        let (app, _) = test_app(GasLevelState::Safe);

        let response = app
            .oneshot(post_json(
                "/api/callers/%20/commands",
                &serde_json::json!({"command": "query_valve"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_list_registered_devices() {
        let (app, _) = test_app(GasLevelState::Safe);

        let response = app.oneshot(get("/api/callers/alice/devices")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"caller": "alice", "devices": ["kitchen"]})
        );
    }

    #[tokio::test]
    async fn should_return_not_found_when_caller_has_no_device() {
        let (app, _) = test_app(GasLevelState::Safe);

        let response = app.oneshot(get("/api/callers/bob/devices")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_report_caller_registration_status() {
        let (app, _) = test_app(GasLevelState::Safe);

        let response = app.clone().oneshot(get("/api/callers/alice")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"caller": "alice", "registered": true})
        );

        let response = app.oneshot(get("/api/callers/bob")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"caller": "bob", "registered": false})
        );
    }

    #[tokio::test]
    async fn should_register_device_after_existing_ones() {
        let (app, _, registry) = test_app_with_registry(GasLevelState::Safe);

        let response = app
            .oneshot(empty("POST", "/api/callers/alice/devices/garage"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["device"], "garage");
        assert_eq!(body["position"], 1);
        let devices = registry
            .registered_devices(&CallerId::new("alice").unwrap())
            .await
            .unwrap();
        assert_eq!(devices, vec![kitchen(), DeviceId::new("garage").unwrap()]);
    }

    #[tokio::test]
    async fn should_unregister_device() {
        let (app, _, registry) = test_app_with_registry(GasLevelState::Safe);

        let response = app
            .oneshot(empty("DELETE", "/api/callers/alice/devices/kitchen"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(
            registry
                .registered_devices(&CallerId::new("alice").unwrap())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn should_return_not_found_when_unregistering_unknown_binding() {
        let (app, _) = test_app(GasLevelState::Safe);

        let response = app
            .oneshot(empty("DELETE", "/api/callers/alice/devices/garage"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_return_no_content_when_gas_level_safe() {
        let (app, _) = test_app(GasLevelState::Safe);

        let response = app
            .oneshot(post_json(
                "/api/devices/kitchen/gas-level",
                &serde_json::json!({"state": "safe"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn should_return_protective_patch_when_danger_reported() {
        let (app, shadow) = test_app(GasLevelState::Safe);

        let response = app
            .oneshot(post_json(
                "/api/devices/kitchen/gas-level",
                &serde_json::json!({"state": "danger"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({
                "device": "kitchen",
                "patch": {"valve_state": "closed", "fan_state": "on", "buzzer_state": "on"}
            })
        );
        let shadows = shadow.shadows.lock().unwrap();
        assert_eq!(
            shadows[&kitchen()].desired.valve_state,
            Some(ValveState::Closed)
        );
    }

    #[tokio::test]
    async fn should_return_unavailable_when_alarm_cannot_be_written() {
        let (app, shadow) = test_app(GasLevelState::Safe);
        shadow.offline.store(true, Ordering::SeqCst);

        let response = app
            .oneshot(post_json(
                "/api/devices/kitchen/gas-level",
                &serde_json::json!({"state": "caution"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
