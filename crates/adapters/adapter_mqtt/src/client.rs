//! Shadow client over a single MQTT session.
//!
//! [`MqttShadowClient`] publishes requests; [`ShadowEventLoop`] drives the
//! connection and hands each response to the request waiting on its
//! `clientToken`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use tokio::sync::oneshot;
use uuid::Uuid;

use gasguard_app::ports::ShadowClient;
use gasguard_domain::error::GasGuardError;
use gasguard_domain::id::DeviceId;
use gasguard_domain::shadow::{DesiredPatch, Shadow};

use crate::config::{MqttConfig, TlsConfig};
use crate::error::MqttError;
use crate::payload::{self, GetRequest, UpdateRequest};
use crate::topics::{self, Operation, Verdict};

const CHANNEL_CAPACITY: usize = 64;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

type Reply = Result<Vec<u8>, MqttError>;
type Pending = Arc<Mutex<HashMap<String, oneshot::Sender<Reply>>>>;

fn lock(pending: &Pending) -> MutexGuard<'_, HashMap<String, oneshot::Sender<Reply>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Publishes shadow requests and waits for their correlated responses.
pub struct MqttShadowClient {
    client: AsyncClient,
    pending: Pending,
    connected: Arc<AtomicBool>,
    request_timeout: Duration,
}

/// Drives the MQTT connection. Must be polled with [`run`](Self::run) for
/// any request to complete.
pub struct ShadowEventLoop {
    event_loop: EventLoop,
    client: AsyncClient,
    pending: Pending,
    connected: Arc<AtomicBool>,
}

impl MqttShadowClient {
    /// Create a client and its event loop from configuration.
    ///
    /// Nothing is sent until the event loop runs.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Certificate`] when a configured TLS file cannot
    /// be read.
    pub fn new(config: &MqttConfig) -> Result<(Self, ShadowEventLoop), MqttError> {
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(config.keep_alive());

        if let Some(tls) = &config.tls {
            options.set_transport(Transport::tls_with_config(tls_configuration(tls)?));
        }

        let (client, event_loop) = AsyncClient::new(options, CHANNEL_CAPACITY);
        let pending = Pending::default();
        let connected = Arc::new(AtomicBool::new(false));

        let shadow_client = Self {
            client: client.clone(),
            pending: Arc::clone(&pending),
            connected: Arc::clone(&connected),
            request_timeout: config.request_timeout(),
        };
        let event_loop = ShadowEventLoop {
            event_loop,
            client,
            pending,
            connected,
        };
        Ok((shadow_client, event_loop))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn request(&self, topic: String, token: String, body: Vec<u8>) -> Reply {
        if !self.is_connected() {
            return Err(MqttError::NotConnected);
        }

        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(token.clone(), tx);

        let result = match tokio::time::timeout(self.request_timeout, self.exchange(topic, body, rx))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(MqttError::Timeout(self.request_timeout)),
        };
        if result.is_err() {
            lock(&self.pending).remove(&token);
        }
        result
    }

    async fn exchange(
        &self,
        topic: String,
        body: Vec<u8>,
        rx: oneshot::Receiver<Reply>,
    ) -> Reply {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, body)
            .await
            .map_err(MqttError::Client)?;
        match rx.await {
            Ok(reply) => reply,
            Err(_) => Err(MqttError::ConnectionClosed),
        }
    }
}

impl ShadowClient for MqttShadowClient {
    #[tracing::instrument(skip(self), fields(device = %device))]
    async fn get_shadow(&self, device: &DeviceId) -> Result<Shadow, GasGuardError> {
        let token = Uuid::new_v4().to_string();
        let body = serde_json::to_vec(&GetRequest {
            client_token: &token,
        })
        .map_err(MqttError::PayloadParse)?;

        let document = self
            .request(topics::request(device, Operation::Get), token, body)
            .await?;
        payload::decode_shadow(&document).map_err(GasGuardError::from)
    }

    #[tracing::instrument(skip(self, patch), fields(device = %device))]
    async fn patch_desired(
        &self,
        device: &DeviceId,
        patch: &DesiredPatch,
    ) -> Result<(), GasGuardError> {
        if patch.is_empty() {
            return Ok(());
        }

        let token = Uuid::new_v4().to_string();
        let body = serde_json::to_vec(&UpdateRequest::new(patch, &token))
            .map_err(MqttError::PayloadParse)?;

        self.request(topics::request(device, Operation::Update), token, body)
            .await?;
        tracing::debug!(?patch, "desired state updated");
        Ok(())
    }
}

impl ShadowEventLoop {
    /// Poll the connection forever.
    ///
    /// Every connection acknowledgement renews the response subscriptions.
    /// A connection error fails all outstanding requests and retries after
    /// an exponential backoff.
    pub async fn run(mut self) {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    backoff = INITIAL_BACKOFF;
                    self.subscribe();
                    self.connected.store(true, Ordering::Release);
                    tracing::info!("connected to MQTT broker");
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.route(&publish.topic, &publish.payload);
                }
                Ok(_) => {}
                Err(err) => {
                    self.connected.store(false, Ordering::Release);
                    let dropped = {
                        let mut pending = lock(&self.pending);
                        let count = pending.len();
                        pending.clear();
                        count
                    };
                    tracing::warn!(error = %err, dropped, retry_in = ?backoff, "MQTT connection error");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    }

    fn subscribe(&self) {
        for filter in topics::response_filters() {
            if let Err(err) = self.client.try_subscribe(filter.as_str(), QoS::AtLeastOnce) {
                tracing::warn!(%filter, error = %err, "unable to subscribe");
            }
        }
    }

    /// Deliver a response to the request waiting on its client token.
    fn route(&self, topic: &str, payload: &[u8]) {
        let Some(response) = topics::parse_response(topic) else {
            tracing::trace!(%topic, "ignoring message");
            return;
        };

        let token = match payload::client_token(payload) {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::debug!(%topic, "response without client token");
                return;
            }
            Err(err) => {
                tracing::warn!(%topic, error = %err, "undecodable shadow response");
                return;
            }
        };

        let Some(sender) = lock(&self.pending).remove(&token) else {
            tracing::debug!(%topic, %token, "no request waiting for response");
            return;
        };

        let reply = match response.verdict {
            Verdict::Accepted => Ok(payload.to_vec()),
            Verdict::Rejected => Err(match payload::rejection(payload) {
                Ok(rejection) => rejection.into(),
                Err(err) => err,
            }),
        };
        if sender.send(reply).is_err() {
            tracing::debug!(thing = response.thing, "requester gave up before the response");
        }
    }
}

fn tls_configuration(tls: &TlsConfig) -> Result<TlsConfiguration, MqttError> {
    Ok(TlsConfiguration::Simple {
        ca: read_pem(&tls.ca_path)?,
        alpn: None,
        client_auth: Some((read_pem(&tls.cert_path)?, read_pem(&tls.key_path)?)),
    })
}

fn read_pem(path: &Path) -> Result<Vec<u8>, MqttError> {
    std::fs::read(path).map_err(|source| MqttError::Certificate {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gasguard_domain::actuator::ValveState;
    use gasguard_domain::gas::GasLevelState;

    fn client_with_timeout(timeout_ms: u64) -> (MqttShadowClient, ShadowEventLoop) {
        MqttShadowClient::new(&MqttConfig {
            request_timeout_ms: timeout_ms,
            ..MqttConfig::default()
        })
        .unwrap()
    }

    fn kitchen() -> DeviceId {
        DeviceId::new("kitchen").unwrap()
    }

    async fn wait_for_pending_token(pending: &Pending) -> String {
        loop {
            if let Some(token) = lock(pending).keys().next().cloned() {
                return token;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn should_fail_fast_when_not_connected() {
        let (client, _event_loop) = client_with_timeout(1_000);
        let result = client.get_shadow(&kitchen()).await;
        assert!(matches!(result, Err(GasGuardError::ShadowUnavailable(_))));
    }

    #[tokio::test]
    async fn should_accept_empty_patch_without_connection() {
        let (client, _event_loop) = client_with_timeout(1_000);
        let result = client
            .patch_desired(&kitchen(), &DesiredPatch::default())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn should_time_out_and_forget_unanswered_request() {
        let (client, _event_loop) = client_with_timeout(20);
        client.connected.store(true, Ordering::Release);

        let result = client
            .patch_desired(&kitchen(), &DesiredPatch::valve(ValveState::Closed))
            .await;

        assert!(matches!(result, Err(GasGuardError::ShadowUnavailable(_))));
        assert!(lock(&client.pending).is_empty());
    }

    #[tokio::test]
    async fn should_deliver_accepted_document_to_waiting_request() {
        let (client, event_loop) = client_with_timeout(5_000);
        client.connected.store(true, Ordering::Release);
        let client = Arc::new(client);

        let request = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.get_shadow(&kitchen()).await }
        });

        let token = wait_for_pending_token(&event_loop.pending).await;
        let body = serde_json::json!({
            "state": {"reported": {"gas_level_ppm": 120, "gas_level_state": "precaucion"}},
            "version": 4,
            "clientToken": token,
        });
        event_loop.route(
            "$aws/things/kitchen/shadow/get/accepted",
            body.to_string().as_bytes(),
        );

        let shadow = request.await.unwrap().unwrap();
        assert_eq!(shadow.reported.gas_level_state, Some(GasLevelState::Caution));
        assert_eq!(shadow.version, Some(4));
    }

    #[tokio::test]
    async fn should_surface_rejection_as_unavailable() {
        let (client, event_loop) = client_with_timeout(5_000);
        client.connected.store(true, Ordering::Release);
        let client = Arc::new(client);

        let request = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.get_shadow(&kitchen()).await }
        });

        let token = wait_for_pending_token(&event_loop.pending).await;
        let body = serde_json::json!({
            "code": 404,
            "message": "No shadow exists with name: 'kitchen'",
            "clientToken": token,
        });
        event_loop.route(
            "$aws/things/kitchen/shadow/get/rejected",
            body.to_string().as_bytes(),
        );

        let result = request.await.unwrap();
        assert!(matches!(result, Err(GasGuardError::ShadowUnavailable(_))));
    }

    #[test]
    fn should_ignore_response_for_unknown_token() {
        let (_client, event_loop) = client_with_timeout(1_000);
        event_loop.route(
            "$aws/things/kitchen/shadow/update/accepted",
            br#"{"clientToken":"someone-else"}"#,
        );
        assert!(lock(&event_loop.pending).is_empty());
    }

    #[test]
    fn should_report_missing_certificate_file() {
        let config = MqttConfig {
            tls: Some(TlsConfig {
                ca_path: "/nonexistent/ca.pem".into(),
                cert_path: "/nonexistent/cert.pem".into(),
                key_path: "/nonexistent/key.pem".into(),
            }),
            ..MqttConfig::default()
        };
        let result = MqttShadowClient::new(&config);
        assert!(matches!(result, Err(MqttError::Certificate { .. })));
    }
}
