//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod callers;
#[allow(clippy::missing_errors_doc)]
pub mod devices;

use axum::Router;
use axum::routing::{get, post};

use gasguard_app::ports::{CallerRegistry, ShadowClient};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<I, S>() -> Router<AppState<I, S>>
where
    I: CallerRegistry + 'static,
    S: ShadowClient + 'static,
{
    Router::new()
        // Callers
        .route("/callers/{caller_id}", get(callers::status::<I, S>))
        .route(
            "/callers/{caller_id}/commands",
            post(callers::dispatch::<I, S>),
        )
        .route(
            "/callers/{caller_id}/devices",
            get(callers::devices::<I, S>),
        )
        .route(
            "/callers/{caller_id}/devices/{device_id}",
            post(callers::register::<I, S>).delete(callers::unregister::<I, S>),
        )
        // Devices
        .route(
            "/devices/{device_id}/gas-level",
            post(devices::gas_level::<I, S>),
        )
}
