//! Transport-facing types shared between the scheduler and channels.

use serde::{Deserialize, Serialize};

/// A delivery destination as reported by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetInfo {
    /// Opaque chat identifier (e.g. `1234-5678@g.us` for a group).
    pub id: String,
    /// Human-readable chat name.
    pub name: String,
    /// Whether this is a group chat.
    #[serde(default)]
    pub is_group: bool,
}
