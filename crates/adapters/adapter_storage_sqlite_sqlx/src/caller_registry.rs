//! `SQLite` implementation of [`IdentityResolver`] and [`CallerRegistry`].
//!
//! Each row binds one caller to one device. `position` records the order in
//! which a caller's devices were registered; the first one is the device
//! commands are routed to.

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use gasguard_app::ports::{CallerRegistry, IdentityResolver};
use gasguard_domain::error::GasGuardError;
use gasguard_domain::id::{CallerId, DeviceId};
use gasguard_domain::registration::Registration;
use gasguard_domain::time::now;

use crate::error::StorageError;

/// Wrapper for converting database rows into a [`Registration`].
struct Wrapper(Registration);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let caller: String = row.try_get("caller_id")?;
        let device: String = row.try_get("device_id")?;
        let position: i64 = row.try_get("position")?;
        let registered_at: String = row.try_get("registered_at")?;

        let caller = CallerId::from_str(&caller).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let device = DeviceId::from_str(&device).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let position =
            u32::try_from(position).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let registered_at = chrono::DateTime::parse_from_rfc3339(&registered_at)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();

        Ok(Self(Registration {
            caller,
            device,
            position,
            registered_at,
        }))
    }
}

const INSERT: &str = r"
    INSERT OR IGNORE INTO caller_devices (caller_id, device_id, position, registered_at)
    SELECT ?, ?, COALESCE(MAX(position) + 1, 0), ?
    FROM caller_devices
    WHERE caller_id = ?
";
const SELECT_ONE: &str = "SELECT * FROM caller_devices WHERE caller_id = ? AND device_id = ?";
const SELECT_DEVICES_BY_CALLER: &str = r"
    SELECT device_id FROM caller_devices
    WHERE caller_id = ?
    ORDER BY position ASC, registered_at ASC, rowid ASC
";
const DELETE_ONE: &str = "DELETE FROM caller_devices WHERE caller_id = ? AND device_id = ?";

/// `SQLite`-backed caller registry.
#[derive(Debug, Clone)]
pub struct SqliteCallerRegistry {
    pool: SqlitePool,
}

impl SqliteCallerRegistry {
    /// Create a new registry using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl IdentityResolver for SqliteCallerRegistry {
    async fn registered_devices(&self, caller: &CallerId) -> Result<Vec<DeviceId>, GasGuardError> {
        let rows: Vec<(String,)> = sqlx::query_as(SELECT_DEVICES_BY_CALLER)
            .bind(caller.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        rows.into_iter()
            .map(|(device,)| DeviceId::new(device).map_err(GasGuardError::from))
            .collect()
    }
}

impl CallerRegistry for SqliteCallerRegistry {
    #[tracing::instrument(skip(self), fields(caller = %caller, device = %device))]
    async fn register(
        &self,
        caller: &CallerId,
        device: &DeviceId,
    ) -> Result<Registration, GasGuardError> {
        let inserted = sqlx::query(INSERT)
            .bind(caller.as_str())
            .bind(device.as_str())
            .bind(now().to_rfc3339())
            .bind(caller.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?
            .rows_affected();

        let Wrapper(registration) = sqlx::query_as(SELECT_ONE)
            .bind(caller.as_str())
            .bind(device.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if inserted > 0 {
            tracing::info!(position = registration.position, "device registered");
        }
        Ok(registration)
    }

    #[tracing::instrument(skip(self), fields(caller = %caller, device = %device))]
    async fn unregister(&self, caller: &CallerId, device: &DeviceId) -> Result<bool, GasGuardError> {
        let deleted = sqlx::query(DELETE_ONE)
            .bind(caller.as_str())
            .bind(device.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?
            .rows_affected();

        Ok(deleted > 0)
    }
}
