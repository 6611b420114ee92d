//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`GasGuardError`] at the port boundary via `#[from]` or an explicit
//! `From` impl. Policy outcomes (a rejected command) are **not** errors;
//! they are modelled as [`CommandResult`](crate::command::CommandResult)
//! variants.

use crate::id::CallerId;
use crate::threshold::{ThresholdKind, ThresholdViolation};

/// Boxed source error carried by infrastructure variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type shared by the domain, application and adapter layers.
#[derive(Debug, thiserror::Error)]
pub enum GasGuardError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The caller has no registered device.
    #[error("caller is not registered")]
    NotRegistered(#[from] NotRegisteredError),

    /// The shadow service could not be reached, rejected the request, timed
    /// out, or returned a document that could not be understood.
    #[error("device shadow unavailable")]
    ShadowUnavailable(#[source] BoxError),

    /// The identity store failed.
    #[error("storage error")]
    Storage(#[source] BoxError),
}

impl GasGuardError {
    /// Whether retrying the same request later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ShadowUnavailable(_) | Self::Storage(_))
    }
}

/// Invariant violations detected while building domain values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An identifier was empty or only whitespace.
    #[error("{kind} must not be empty")]
    EmptyId {
        /// Which identifier kind was empty.
        kind: &'static str,
    },

    /// A textual value did not match any known variant.
    #[error("unknown {kind} value {value:?}")]
    UnknownVariant {
        /// Which enumeration was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// A threshold supplied outside a command breaks its range or the
    /// `safe < warning` ordering.
    #[error("{kind} threshold: {violation}")]
    Threshold {
        kind: ThresholdKind,
        violation: ThresholdViolation,
    },
}

/// No device is bound to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no device registered for caller {caller}")]
pub struct NotRegisteredError {
    pub caller: CallerId,
}
