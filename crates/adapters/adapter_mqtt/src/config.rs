//! MQTT shadow transport configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration for the MQTT shadow client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// How long a shadow request may wait for its response, in milliseconds.
    pub request_timeout_ms: u64,
    /// Mutual TLS material. Plain TCP when absent.
    pub tls: Option<TlsConfig>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "gasguard".to_string(),
            keep_alive_secs: 30,
            request_timeout_ms: 5_000,
            tls: None,
        }
    }
}

impl MqttConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(u64::from(self.keep_alive_secs))
    }
}

/// PEM files for mutual TLS with the broker.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Certificate authority used to verify the broker.
    pub ca_path: PathBuf,
    /// Client certificate presented to the broker.
    pub cert_path: PathBuf,
    /// Private key of the client certificate.
    pub key_path: PathBuf,
}
