//! MQTT adapter error types.

use std::path::PathBuf;
use std::time::Duration;

use gasguard_domain::error::GasGuardError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// No broker session is established.
    #[error("MQTT client not connected")]
    NotConnected,

    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// A shadow response could not be decoded.
    #[error("failed to parse MQTT payload")]
    PayloadParse(#[source] serde_json::Error),

    /// A shadow document decoded but held an impossible value.
    #[error("malformed shadow document: {0}")]
    Malformed(String),

    /// No response arrived in time.
    #[error("shadow request timed out after {0:?}")]
    Timeout(Duration),

    /// The shadow service refused the request.
    #[error("shadow request rejected ({code}): {message}")]
    Rejected { code: u16, message: String },

    /// The connection dropped while the request was outstanding.
    #[error("connection closed before the shadow responded")]
    ConnectionClosed,

    /// A TLS file could not be read.
    #[error("unable to read {path}")]
    Certificate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MqttError {
    /// Convert into a [`GasGuardError::ShadowUnavailable`] for propagation
    /// across port boundaries.
    pub fn into_domain(self) -> GasGuardError {
        GasGuardError::ShadowUnavailable(Box::new(self))
    }
}

impl From<MqttError> for GasGuardError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
