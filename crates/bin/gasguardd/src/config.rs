//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `gasguard.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use gasguard_adapter_mqtt::MqttConfig;
use gasguard_adapter_virtual::VirtualConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Caller registry settings.
    pub identity: IdentityConfig,
    /// Shadow backend selection.
    pub shadow: ShadowConfig,
    /// MQTT broker settings, used by the `mqtt` backend.
    pub mqtt: MqttConfig,
    /// Simulated devices, used by the `virtual` backend.
    #[serde(rename = "virtual")]
    pub virtual_devices: VirtualConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Caller registry configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// `SQLite` connection URL or file path.
    pub database_url: String,
    /// How long a lookup may wait for a pooled connection, in seconds.
    pub acquire_timeout_secs: u64,
    /// Bindings registered at startup, in order.
    pub registrations: Vec<RegistrationConfig>,
}

/// One caller → device binding to register at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    pub caller: String,
    pub device: String,
}

/// Shadow backend configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub backend: ShadowBackend,
}

/// Where device shadows live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowBackend {
    /// Real devices behind an MQTT broker.
    Mqtt,
    /// In-memory simulated devices.
    #[default]
    Virtual,
}

impl FromStr for ShadowBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mqtt" => Ok(Self::Mqtt),
            "virtual" => Ok(Self::Virtual),
            other => Err(ConfigError::Validation(format!(
                "unknown shadow backend {other:?}, expected \"mqtt\" or \"virtual\""
            ))),
        }
    }
}

impl Config {
    /// Load configuration from `gasguard.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("gasguard.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = var("GASGUARD_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("GASGUARD_PORT") {
            self.server.port = parse_port("GASGUARD_PORT", &val)?;
        }
        if let Some(val) = var("GASGUARD_BIND") {
            let (host, port) = val.rsplit_once(':').ok_or_else(|| {
                ConfigError::Validation(format!("GASGUARD_BIND must be host:port, got {val:?}"))
            })?;
            self.server.port = parse_port("GASGUARD_BIND", port)?;
            self.server.host = host.to_string();
        }
        if let Some(val) = var("GASGUARD_DATABASE_URL") {
            self.identity.database_url = val;
        }
        if let Some(val) = var("GASGUARD_SHADOW_BACKEND") {
            self.shadow.backend = val.parse()?;
        }
        if let Some(val) = var("GASGUARD_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Some(val) = var("GASGUARD_MQTT_PORT") {
            self.mqtt.broker_port = parse_port("GASGUARD_MQTT_PORT", &val)?;
        }
        if let Some(val) = var("GASGUARD_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.identity.acquire_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "identity acquire timeout must be non-zero".to_string(),
            ));
        }
        if self.shadow.backend == ShadowBackend::Mqtt {
            self.validate_mqtt()?;
        }
        Ok(())
    }

    fn validate_mqtt(&self) -> Result<(), ConfigError> {
        let mqtt = &self.mqtt;
        if mqtt.broker_port == 0 {
            return Err(ConfigError::Validation(
                "mqtt broker port must be non-zero".to_string(),
            ));
        }
        if mqtt.request_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "mqtt request timeout must be non-zero".to_string(),
            ));
        }
        if mqtt.keep_alive_secs < 5 {
            return Err(ConfigError::Validation(
                "mqtt keep-alive must be at least 5 seconds".to_string(),
            ));
        }
        if let Some(tls) = &mqtt.tls {
            let paths = [&tls.ca_path, &tls.cert_path, &tls.key_path];
            if paths.iter().any(|path| path.as_os_str().is_empty()) {
                return Err(ConfigError::Validation(
                    "mqtt tls requires ca_path, cert_path and key_path together".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl IdentityConfig {
    #[must_use]
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "gasguardd=info,gasguard=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:gasguard.db?mode=rwc".to_string(),
            acquire_timeout_secs: 5,
            registrations: Vec::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

fn parse_port(name: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{name} has invalid port {value:?}")))
}
