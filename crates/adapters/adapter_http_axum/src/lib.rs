//! # gasguard-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Accept already-classified [`Command`](gasguard_domain::command::Command)s
//!   on behalf of a caller and return the
//!   [`CommandResult`](gasguard_domain::command::CommandResult) as JSON
//! - Accept gas level notifications from the device pipeline and trigger
//!   the protective alarm response
//! - Check, list, add and remove the devices registered to a caller
//! - Map application results into HTTP status codes
//!
//! ## Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `GET`  | `/health` | liveness probe |
//! | `GET`  | `/api/callers/{caller_id}` | whether the caller has a device |
//! | `POST` | `/api/callers/{caller_id}/commands` | dispatch one command |
//! | `GET`  | `/api/callers/{caller_id}/devices` | registered devices, first is commanded |
//! | `POST` | `/api/callers/{caller_id}/devices/{device_id}` | register a device |
//! | `DELETE` | `/api/callers/{caller_id}/devices/{device_id}` | unregister a device |
//! | `POST` | `/api/devices/{device_id}/gas-level` | alarm response |
//!
//! ## Dependency rule
//! Depends on `gasguard-app` (for port traits and services) and `gasguard-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
