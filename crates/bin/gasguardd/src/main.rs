//! # gasguardd — gasguard daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise `tracing` with the configured filter
//! - Open the `SQLite` caller registry, run migrations, register seed bindings
//! - Construct the shadow backend (MQTT or virtual) once for the process
//! - Construct application services, injecting adapters via port traits
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::error::Error;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use gasguard_adapter_http_axum::router;
use gasguard_adapter_http_axum::state::AppState;
use gasguard_adapter_mqtt::MqttShadowClient;
use gasguard_adapter_storage_sqlite_sqlx::{Config as StorageConfig, SqliteCallerRegistry};
use gasguard_adapter_virtual::VirtualShadowService;
use gasguard_app::ports::{CallerRegistry, ShadowClient};
use gasguard_app::services::command_dispatcher::CommandDispatcher;
use gasguard_app::services::gas_alarm_service::GasAlarmService;
use gasguard_app::services::registration_service::RegistrationService;
use gasguard_domain::id::{CallerId, DeviceId};

use crate::config::{Config, ShadowBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Identity
    let db = StorageConfig::new(
        config.identity.database_url.clone(),
        config.identity.acquire_timeout(),
    )
    .build()
    .await?;
    let registry = SqliteCallerRegistry::new(db.pool().clone());
    for registration in &config.identity.registrations {
        let caller = CallerId::new(registration.caller.as_str())?;
        let device = DeviceId::new(registration.device.as_str())?;
        registry.register(&caller, &device).await?;
    }

    // Shadow
    match config.shadow.backend {
        ShadowBackend::Virtual => {
            let shadow = VirtualShadowService::from_config(&config.virtual_devices)?;
            tracing::info!(devices = shadow.devices().len(), "using virtual shadow backend");
            serve(&config, registry, Arc::new(shadow)).await
        }
        ShadowBackend::Mqtt => {
            let (client, event_loop) = MqttShadowClient::new(&config.mqtt)?;
            tracing::info!(
                broker = %config.mqtt.broker_host,
                port = config.mqtt.broker_port,
                tls = config.mqtt.tls.is_some(),
                "using mqtt shadow backend"
            );
            tokio::spawn(event_loop.run());
            serve(&config, registry, Arc::new(client)).await
        }
    }
}

async fn serve<I, S>(config: &Config, registry: I, shadow: Arc<S>) -> Result<(), Box<dyn Error>>
where
    I: CallerRegistry + Clone + 'static,
    S: ShadowClient + 'static,
{
    let state = AppState::new(
        CommandDispatcher::new(registry.clone(), Arc::clone(&shadow)),
        RegistrationService::new(registry),
        GasAlarmService::new(shadow),
    );
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "gasguardd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("gasguardd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
