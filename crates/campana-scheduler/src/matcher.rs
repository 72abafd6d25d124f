//! Lead-time matching: which sessions start exactly at the target minute,
//! minus those already in the sent log.

use crate::catalog::Event;
use crate::clock::CivilTime;
use crate::ledger::Ledger;

/// A session due for a reminder, paired with its dedup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueEvent {
    pub event: Event,
    pub key: String,
}

/// Deterministic dedup key: `"YYYY-MM-DD HH:MM|subject|teacher"` of the
/// target minute. Two sessions sharing all four identity fields collide —
/// the catalog carries no per-session id, so this is the finest identity
/// available.
pub fn dedup_key(target: &CivilTime, subject: &str, teacher: &str) -> String {
    format!("{}|{}|{}", target.stamp(), subject, teacher)
}

/// Filter the catalog for sessions starting exactly at `target`, excluding
/// keys already in the ledger. Exact equality at minute granularity — a
/// session falling between two tick boundaries is missed, accepted for a
/// once-per-minute cadence. Returns matches in catalog order.
pub fn find_due(target: &CivilTime, catalog: &[Event], ledger: &Ledger) -> Vec<DueEvent> {
    catalog
        .iter()
        .filter(|e| e.date == target.date && e.start == target.time)
        .map(|e| DueEvent {
            key: dedup_key(target, &e.subject, &e.teacher),
            event: e.clone(),
        })
        .filter(|due| !ledger.contains(&due.key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::DeliveryRecord;
    use chrono::{NaiveDate, NaiveTime};
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("campana-test-matcher");
        std::fs::create_dir_all(&dir).ok();
        let path = dir.join(name);
        std::fs::remove_file(&path).ok();
        path
    }

    fn civil(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> CivilTime {
        CivilTime {
            date: NaiveDate::from_ymd_opt(y, mo, d).unwrap(),
            time: NaiveTime::from_hms_opt(h, mi, 0).unwrap(),
            hour: h,
        }
    }

    fn event(date: (i32, u32, u32), h: u32, mi: u32, subject: &str, teacher: &str) -> Event {
        Event {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            start: NaiveTime::from_hms_opt(h, mi, 0).unwrap(),
            subject: subject.into(),
            teacher: teacher.into(),
        }
    }

    #[test]
    fn test_key_format() {
        let target = civil(2024, 5, 1, 9, 5);
        assert_eq!(
            dedup_key(&target, "Math", "Ana"),
            "2024-05-01 09:05|Math|Ana"
        );
    }

    #[test]
    fn test_exact_minute_match_only() {
        let catalog = vec![
            event((2024, 5, 1), 9, 4, "Early", "Ana"),
            event((2024, 5, 1), 9, 5, "OnTime", "Ana"),
            event((2024, 5, 1), 9, 6, "Late", "Ana"),
            event((2024, 5, 2), 9, 5, "WrongDay", "Ana"),
        ];
        let ledger = Ledger::open(scratch("exact.json"));
        let due = find_due(&civil(2024, 5, 1, 9, 5), &catalog, &ledger);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].event.subject, "OnTime");
    }

    #[test]
    fn test_ledger_entries_excluded() {
        let catalog = vec![
            event((2024, 5, 1), 9, 5, "Math", "Ana"),
            event((2024, 5, 1), 9, 5, "Law", "Luis"),
        ];
        let target = civil(2024, 5, 1, 9, 5);
        let mut ledger = Ledger::open(scratch("excluded.json"));
        ledger
            .commit(
                dedup_key(&target, "Math", "Ana"),
                DeliveryRecord {
                    sent_at: "2024-05-01 09:00".into(),
                    target_at: "2024-05-01 09:05".into(),
                    subject: "Math".into(),
                    teacher: "Ana".into(),
                },
            )
            .unwrap();

        let due = find_due(&target, &catalog, &ledger);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].event.subject, "Law");
    }

    #[test]
    fn test_idempotent_after_commit() {
        let catalog = vec![event((2024, 5, 1), 9, 5, "Math", "Ana")];
        let target = civil(2024, 5, 1, 9, 5);
        let mut ledger = Ledger::open(scratch("idem.json"));

        let first = find_due(&target, &catalog, &ledger);
        assert_eq!(first.len(), 1);
        ledger
            .commit(
                first[0].key.clone(),
                DeliveryRecord {
                    sent_at: "2024-05-01 09:00".into(),
                    target_at: "2024-05-01 09:05".into(),
                    subject: "Math".into(),
                    teacher: "Ana".into(),
                },
            )
            .unwrap();

        let second = find_due(&target, &catalog, &ledger);
        assert!(second.is_empty());
    }

    #[test]
    fn test_identical_sessions_collide_on_key() {
        // Known ambiguity: no per-session id, so twins share one key and
        // only one reminder fires. Asserting current behavior.
        let catalog = vec![
            event((2024, 5, 1), 9, 5, "Math", "Ana"),
            event((2024, 5, 1), 9, 5, "Math", "Ana"),
        ];
        let ledger = Ledger::open(scratch("collide.json"));
        let due = find_due(&civil(2024, 5, 1, 9, 5), &catalog, &ledger);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].key, due[1].key);
    }

    #[test]
    fn test_catalog_order_preserved() {
        let catalog = vec![
            event((2024, 5, 1), 9, 5, "Zeta", "Ana"),
            event((2024, 5, 1), 9, 5, "Alpha", "Luis"),
        ];
        let ledger = Ledger::open(scratch("order.json"));
        let due = find_due(&civil(2024, 5, 1, 9, 5), &catalog, &ledger);
        let subjects: Vec<_> = due.iter().map(|d| d.event.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_empty_catalog_yields_nothing() {
        let ledger = Ledger::open(scratch("empty.json"));
        assert!(find_due(&civil(2024, 5, 1, 9, 5), &[], &ledger).is_empty());
    }
}
