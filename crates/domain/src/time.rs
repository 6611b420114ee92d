//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for shadow metadata and registration times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Convert a Unix epoch in seconds into a [`Timestamp`].
///
/// Returns `None` when the value is outside the representable range.
#[must_use]
pub fn from_epoch_secs(secs: i64) -> Option<Timestamp> {
    DateTime::from_timestamp(secs, 0)
}
