//! # gasguard-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `IdentityResolver` — caller → registered devices
//!   - `CallerRegistry` — add and remove caller → device bindings
//!   - `ShadowClient` — fetch a device shadow, patch its desired state
//! - Define **driving/inbound** use-case structs:
//!   - `CommandDispatcher` — resolve, fetch, gate/validate, patch
//!   - `GasAlarmService` — write the protective state for a new gas level
//!   - `RegistrationService` — bind and unbind devices
//! - Orchestrate domain policy without knowing *how* the shadow service or
//!   identity store are reached
//!
//! ## Dependency rule
//! Depends on `gasguard-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
