//! Timezone-aware civil time.
//!
//! All matching happens on calendar date + minute-of-day in the configured
//! IANA zone. Arithmetic is done on absolute instants and re-rendered in the
//! zone afterwards, so DST transitions come out right — a fixed UTC offset
//! would silently drift by an hour twice a year in zones that observe DST.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

/// A wall-clock reading in the configured zone, truncated to the minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilTime {
    pub date: NaiveDate,
    /// Minute precision — seconds and nanoseconds are zero.
    pub time: NaiveTime,
    pub hour: u32,
}

impl CivilTime {
    /// `"YYYY-MM-DD HH:MM"` — the stamp format used in ledger records.
    pub fn stamp(&self) -> String {
        format!(
            "{} {}",
            self.date.format("%Y-%m-%d"),
            self.time.format("%H:%M")
        )
    }
}

/// Wall clock bound to one IANA zone.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    tz: Tz,
}

impl Clock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Current absolute instant.
    pub fn now_instant(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Render an instant as civil time in the configured zone,
    /// seconds truncated (not rounded).
    pub fn civil(&self, instant: DateTime<Utc>) -> CivilTime {
        let local = instant.with_timezone(&self.tz);
        let t = local.time();
        let time = t
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(t);
        CivilTime {
            date: local.date_naive(),
            time,
            hour: local.hour(),
        }
    }

    /// `base + delta` in absolute time, re-rendered in the zone.
    pub fn plus_minutes(&self, base: DateTime<Utc>, delta: i64) -> CivilTime {
        self.civil(base + Duration::minutes(delta))
    }

    /// Current civil time.
    pub fn now_civil(&self) -> CivilTime {
        self.civil(self.now_instant())
    }
}
