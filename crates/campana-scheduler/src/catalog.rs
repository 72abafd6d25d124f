//! The event catalog — the schedule of class sessions.
//!
//! Backing resource is a JSON array, one object per session:
//! `{"date": "2024-05-01", "start": "09:05", "subject": "Math", "teacher": "Ana"}`.
//! Read-only input; the engine never writes it.

use campana_core::error::{CampanaError, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One schedulable class session. Immutable once loaded; identity for
/// dedup purposes is the full (date, start, subject, teacher) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// ISO calendar date in the configured zone.
    pub date: NaiveDate,
    /// Start time of day, minute precision.
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    pub subject: String,
    pub teacher: String,
}

/// `"HH:MM"` (de)serialization for session start times.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(time: &NaiveTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(de)?;
        NaiveTime::parse_from_str(&s, "%H:%M")
            .map_err(|_| D::Error::custom(format!("invalid start time '{s}', expected HH:MM")))
    }
}

/// File-backed catalog loader.
pub struct EventCatalog {
    path: PathBuf,
}

impl EventCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the full schedule, in file order.
    pub fn load(&self) -> Result<Vec<Event>> {
        if !self.path.exists() {
            return Err(CampanaError::CatalogMissing(
                self.path.display().to_string(),
            ));
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| CampanaError::CatalogMalformed(format!("read failed: {e}")))?;
        let events: Vec<Event> = serde_json::from_str(&raw)
            .map_err(|e| CampanaError::CatalogMalformed(e.to_string()))?;
        Ok(events)
    }
}
