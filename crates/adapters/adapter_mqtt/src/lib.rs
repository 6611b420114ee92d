//! # gasguard-adapter-mqtt
//!
//! MQTT adapter — reaches device shadows over the shadow topic protocol.
//!
//! ## Responsibilities
//! - Connect to the broker, optionally with mutual TLS
//! - Publish `get` / `update` requests on `$aws/things/{thing}/shadow/…`
//! - Correlate `accepted` / `rejected` responses by `clientToken`
//! - Bound every request with a timeout
//! - Translate firmware payloads into domain [`Shadow`](gasguard_domain::shadow::Shadow)s
//!
//! ## Dependency rule
//! Same as other adapters: depends on `gasguard-app` and `gasguard-domain`.

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod topics;

pub use client::{MqttShadowClient, ShadowEventLoop};
pub use config::{MqttConfig, TlsConfig};
pub use error::MqttError;
