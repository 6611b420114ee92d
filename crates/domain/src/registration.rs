//! Caller → device bindings.

use serde::{Deserialize, Serialize};

use crate::id::{CallerId, DeviceId};
use crate::time::Timestamp;

/// One caller → device binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub caller: CallerId,
    pub device: DeviceId,
    /// Zero-based registration order within the caller. Commands go to the
    /// lowest position.
    pub position: u32,
    pub registered_at: Timestamp,
}
