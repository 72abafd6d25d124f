//! The reminder engine — one tick per minute, aligned to the zone's clock.
//!
//! Every tick loads the schedule and sent log fresh from disk, so edits to
//! schedule.json take effect on the next minute without a restart. A tick
//! runs to completion before the next is considered; ticks never overlap.

use std::path::PathBuf;

use campana_core::config::CampanaConfig;
use campana_core::error::Result;
use campana_core::traits::Notifier;
use chrono::{DateTime, Duration, Timelike, Utc};

use crate::catalog::EventCatalog;
use crate::clock::Clock;
use crate::dispatch::Dispatcher;
use crate::ledger::Ledger;
use crate::matcher;

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Sessions matching the target minute and not yet in the sent log.
    pub matched: usize,
    /// Sessions committed to the sent log this tick.
    pub dispatched: usize,
}

pub struct ReminderEngine {
    clock: Clock,
    catalog: EventCatalog,
    ledger_path: PathBuf,
    dispatcher: Dispatcher,
    lead_minutes: i64,
}

impl ReminderEngine {
    pub fn new(
        clock: Clock,
        catalog: EventCatalog,
        ledger_path: PathBuf,
        dispatcher: Dispatcher,
        lead_minutes: i64,
    ) -> Self {
        Self {
            clock,
            catalog,
            ledger_path,
            dispatcher,
            lead_minutes,
        }
    }

    /// Build the engine from validated configuration.
    pub fn from_config(config: &CampanaConfig) -> Result<Self> {
        let clock = Clock::new(config.tz()?);
        Ok(Self::new(
            clock,
            EventCatalog::new(config.schedule_path()),
            config.ledger_path(),
            Dispatcher::new(
                config.recipients(),
                config.send_delay_ms,
                config.message.clone(),
            ),
            i64::from(config.lead_minutes),
        ))
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Run one evaluation cycle at the current wall clock.
    pub async fn tick(&self, notifier: &dyn Notifier) -> TickReport {
        self.tick_at(self.clock.now_instant(), notifier).await
    }

    /// Run one evaluation cycle as of `instant`. Separated from `tick` so
    /// tests control the clock.
    pub async fn tick_at(&self, instant: DateTime<Utc>, notifier: &dyn Notifier) -> TickReport {
        // Soft-skip: one bad edit of the schedule must not kill the service.
        let schedule = match self.catalog.load() {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("⚠️ Schedule unavailable this tick: {e}");
                Vec::new()
            }
        };

        let mut ledger = Ledger::open(&self.ledger_path);
        let now = self.clock.civil(instant);
        let target = self.clock.plus_minutes(instant, self.lead_minutes);

        let due = matcher::find_due(&target, &schedule, &ledger);
        if due.is_empty() {
            return TickReport {
                matched: 0,
                dispatched: 0,
            };
        }

        let dispatched = self
            .dispatcher
            .dispatch_all(&due, &now, &target, notifier, &mut ledger)
            .await;

        TickReport {
            matched: due.len(),
            dispatched,
        }
    }
}

/// Sleep until the next whole minute of the wall clock.
async fn sleep_to_next_minute(clock: &Clock) {
    let now = clock.now_instant();
    let next = (now + Duration::minutes(1))
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now + Duration::minutes(1));
    let wait = (next - now)
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(60));
    tokio::time::sleep(wait).await;
}

/// Drive the engine until ctrl-c, then disconnect the transport.
///
/// Ticks are serialized: a slow dispatch simply delays the next minute
/// check. Any tick failure is contained inside `tick` and logged; nothing
/// terminates the loop except the shutdown signal.
pub async fn run(engine: &ReminderEngine, notifier: &mut dyn Notifier) {
    tracing::info!("⏱️ Checking every minute (lead {} min)...", engine.lead_minutes);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("🛑 Shutdown requested");
                break;
            }
            _ = sleep_to_next_minute(&engine.clock) => {
                let report = engine.tick(notifier).await;
                if report.matched > 0 {
                    tracing::info!(
                        "📣 Tick: {} due, {} recorded",
                        report.matched,
                        report.dispatched
                    );
                }
            }
        }
    }

    // Best-effort: an in-flight tick was already completed by the select arm.
    if let Err(e) = notifier.disconnect().await {
        tracing::warn!("⚠️ Disconnect failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campana_core::config::MessageConfig;
    use campana_core::error::Result;
    use campana_core::types::TargetInfo;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }
        async fn connect(&mut self) -> Result<()> {
            Ok(())
        }
        async fn disconnect(&mut self) -> Result<()> {
            Ok(())
        }
        fn is_ready(&self) -> bool {
            true
        }
        async fn list_targets(&self) -> Result<Vec<TargetInfo>> {
            Ok(Vec::new())
        }
        async fn resolve_target(&self, id: &str) -> Result<TargetInfo> {
            Ok(TargetInfo {
                id: id.to_string(),
                name: id.to_string(),
                is_group: true,
            })
        }
        async fn send_message(&self, target_id: &str, _text: &str) -> Result<()> {
            self.sent.lock().unwrap().push(target_id.to_string());
            Ok(())
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("campana-test-engine").join(name);
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).ok();
        dir
    }

    fn engine_at(dir: &PathBuf) -> ReminderEngine {
        ReminderEngine::new(
            Clock::new(chrono_tz::America::Bogota),
            EventCatalog::new(dir.join("schedule.json")),
            dir.join("sent_log.json"),
            Dispatcher::new(vec!["g1@g.us".into()], 0, MessageConfig::default()),
            5,
        )
    }

    #[tokio::test]
    async fn test_scenario_match_then_idempotent_rerun() {
        let dir = scratch_dir("scenario");
        std::fs::write(
            dir.join("schedule.json"),
            r#"[{"date": "2024-05-01", "start": "09:05", "subject": "Math", "teacher": "Ana"}]"#,
        )
        .unwrap();

        // 2024-05-01 09:00 in Bogota (UTC-5) = 14:00 UTC; lead 5 → target 09:05
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
        let engine = engine_at(&dir);
        let notifier = RecordingNotifier::new();

        let report = engine.tick_at(instant, &notifier).await;
        assert_eq!(report.matched, 1);
        assert_eq!(report.dispatched, 1);
        assert_eq!(*notifier.sent.lock().unwrap(), vec!["g1@g.us"]);

        let ledger = Ledger::open(dir.join("sent_log.json"));
        assert!(ledger.contains("2024-05-01 09:05|Math|Ana"));

        // Simulated re-run at the same minute: nothing fires again.
        let rerun = engine.tick_at(instant, &notifier).await;
        assert_eq!(rerun.matched, 0);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_off_by_one_minute_never_matches() {
        let dir = scratch_dir("offbyone");
        std::fs::write(
            dir.join("schedule.json"),
            r#"[{"date": "2024-05-01", "start": "09:05", "subject": "Math", "teacher": "Ana"}]"#,
        )
        .unwrap();
        let engine = engine_at(&dir);
        let notifier = RecordingNotifier::new();

        // 08:59 local → target 09:04; 09:01 local → target 09:06
        for minute in [59u32, 1] {
            let hour = if minute == 59 { 13 } else { 14 };
            let instant = Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap();
            let report = engine.tick_at(instant, &notifier).await;
            assert_eq!(report.matched, 0);
        }
        assert!(!dir.join("sent_log.json").exists());
    }

    #[tokio::test]
    async fn test_empty_catalog_writes_nothing() {
        let dir = scratch_dir("emptycat");
        std::fs::write(dir.join("schedule.json"), "[]").unwrap();
        let engine = engine_at(&dir);
        let notifier = RecordingNotifier::new();

        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
        let report = engine.tick_at(instant, &notifier).await;
        assert_eq!(report.matched, 0);
        assert!(!dir.join("sent_log.json").exists());
    }

    #[tokio::test]
    async fn test_missing_catalog_soft_skips() {
        let dir = scratch_dir("missingcat");
        let engine = engine_at(&dir);
        let notifier = RecordingNotifier::new();

        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
        let report = engine.tick_at(instant, &notifier).await;
        assert_eq!(report.matched, 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_catalog_soft_skips() {
        let dir = scratch_dir("badcat");
        std::fs::write(dir.join("schedule.json"), "{{ nope").unwrap();
        let engine = engine_at(&dir);
        let notifier = RecordingNotifier::new();

        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
        let report = engine.tick_at(instant, &notifier).await;
        assert_eq!(report.matched, 0);
    }

    #[tokio::test]
    async fn test_two_sessions_same_minute_both_fire() {
        let dir = scratch_dir("twosessions");
        std::fs::write(
            dir.join("schedule.json"),
            r#"[
                {"date": "2024-05-01", "start": "09:05", "subject": "Math", "teacher": "Ana"},
                {"date": "2024-05-01", "start": "09:05", "subject": "Law", "teacher": "Luis"}
            ]"#,
        )
        .unwrap();
        let engine = engine_at(&dir);
        let notifier = RecordingNotifier::new();

        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
        let report = engine.tick_at(instant, &notifier).await;
        assert_eq!(report.matched, 2);
        assert_eq!(report.dispatched, 2);

        let ledger = Ledger::open(dir.join("sent_log.json"));
        assert_eq!(ledger.len(), 2);
    }
}
