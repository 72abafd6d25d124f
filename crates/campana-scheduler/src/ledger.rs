//! The sent-log ledger — durable idempotency state.
//!
//! A JSON object mapping dedup key → delivery record, pretty-printed so an
//! operator can inspect (or prune) it by hand. Loaded fully at each tick;
//! every commit rewrites the whole file via write-temp-then-rename so a
//! crash mid-write never leaves a truncated log. Deleting the file only
//! risks re-notification, never corruption of the schedule.

use campana_core::error::{CampanaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Proof that a reminder fired for one session. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    /// When the reminder was sent, `"YYYY-MM-DD HH:MM"` civil time.
    pub sent_at: String,
    /// Session start the reminder was for.
    pub target_at: String,
    pub subject: String,
    pub teacher: String,
}

/// In-memory view of the sent log, bound to its backing file.
pub struct Ledger {
    path: PathBuf,
    entries: BTreeMap<String, DeliveryRecord>,
}

impl Ledger {
    /// Load the ledger. An absent file is an empty ledger; an unreadable or
    /// corrupt one is treated as empty with a warning — the service accepts
    /// the re-notification risk over crashing.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                    tracing::warn!("⚠️ Corrupt sent log {} — starting empty: {e}", path.display());
                    BTreeMap::new()
                }),
                Err(e) => {
                    tracing::warn!("⚠️ Cannot read sent log {}: {e}", path.display());
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        Self { path, entries }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&DeliveryRecord> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a delivery and durably rewrite the backing file.
    pub fn commit(&mut self, key: String, record: DeliveryRecord) -> Result<()> {
        self.entries.insert(key, record);
        self.save()
    }

    /// Atomic whole-file rewrite: temp sibling, then rename over the target.
    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| CampanaError::Ledger(format!("create dir failed: {e}")))?;
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| CampanaError::Ledger(format!("serialize failed: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)
            .map_err(|e| CampanaError::Ledger(format!("write failed: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| CampanaError::Ledger(format!("rename failed: {e}")))?;
        tracing::debug!("💾 Sent log saved ({} entries)", self.entries.len());
        Ok(())
    }
}
