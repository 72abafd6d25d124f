//! # Campana Scheduler
//!
//! The reminder engine: once per minute, match sessions starting exactly
//! `lead_minutes` from now and push a notice to every configured chat,
//! exactly once per session.
//!
//! ## Architecture
//! ```text
//! ReminderEngine (minute-aligned loop)
//!   ├── Clock: civil time in the configured IANA zone (DST-correct)
//!   ├── EventCatalog: schedule.json → Vec<Event>
//!   ├── Ledger: sent_log.json — dedup keys, atomic rewrite
//!   ├── find_due: target = now + lead → exact date+time match, minus sent
//!   └── Dispatcher: render → sequential fan-out per recipient → commit
//!                     (per-recipient failures isolated, fire-once commit)
//! ```

pub mod catalog;
pub mod clock;
pub mod dispatch;
pub mod engine;
pub mod ledger;
pub mod matcher;
pub mod message;

pub use catalog::{Event, EventCatalog};
pub use clock::{CivilTime, Clock};
pub use dispatch::Dispatcher;
pub use engine::{ReminderEngine, TickReport};
pub use ledger::{DeliveryRecord, Ledger};
pub use matcher::{DueEvent, dedup_key, find_due};
