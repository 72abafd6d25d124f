//! Reminder dispatch — fans one message out to every configured recipient.
//!
//! Recipients are visited sequentially with a fixed pause between sends
//! (the transport rate-limits), and each failure is isolated: one broken
//! chat never blocks the others. After the pass the session is committed to
//! the sent log regardless of delivery outcome — fire-once, not
//! deliver-once.

use std::time::Duration;

use campana_core::config::MessageConfig;
use campana_core::traits::Notifier;
use tokio::time::sleep;

use crate::clock::CivilTime;
use crate::ledger::{DeliveryRecord, Ledger};
use crate::matcher::DueEvent;
use crate::message;

pub struct Dispatcher {
    recipients: Vec<String>,
    send_delay: Duration,
    message: MessageConfig,
}

impl Dispatcher {
    pub fn new(recipients: Vec<String>, send_delay_ms: u64, message: MessageConfig) -> Self {
        Self {
            recipients,
            send_delay: Duration::from_millis(send_delay_ms),
            message,
        }
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Deliver every due session and commit it to the ledger.
    /// Returns the number of sessions committed.
    pub async fn dispatch_all(
        &self,
        due: &[DueEvent],
        now: &CivilTime,
        target: &CivilTime,
        notifier: &dyn Notifier,
        ledger: &mut Ledger,
    ) -> usize {
        if due.is_empty() {
            return 0;
        }
        if self.recipients.is_empty() {
            tracing::warn!("⚠️ No recipients configured — {} due reminder(s) go nowhere", due.len());
        }

        let mut committed = 0;
        for item in due {
            let text = message::render(&item.event, now, &self.message);
            tracing::info!(
                "🚀 Sending reminder: {} | {} | {}",
                target.stamp(),
                item.event.subject,
                item.event.teacher
            );

            for (i, recipient) in self.recipients.iter().enumerate() {
                self.send_one(notifier, recipient, &text).await;
                if i + 1 < self.recipients.len() {
                    sleep(self.send_delay).await;
                }
            }

            let record = DeliveryRecord {
                sent_at: now.stamp(),
                target_at: target.stamp(),
                subject: item.event.subject.clone(),
                teacher: item.event.teacher.clone(),
            };
            match ledger.commit(item.key.clone(), record) {
                Ok(()) => {
                    committed += 1;
                    tracing::info!("✅ Reminder recorded: {}", item.key);
                }
                Err(e) => {
                    // Not retried this tick; the key stays absent, so the
                    // session is matched again on the next tick.
                    tracing::error!("❌ Sent-log write failed for {}: {e}", item.key);
                }
            }
        }
        committed
    }

    /// One recipient, failure contained.
    async fn send_one(&self, notifier: &dyn Notifier, recipient: &str, text: &str) {
        match notifier.resolve_target(recipient).await {
            Ok(info) => tracing::debug!("📌 Target: \"{}\" ({})", info.name, recipient),
            Err(e) => tracing::warn!("⚠️ Could not resolve {recipient}: {e}"),
        }
        if let Err(e) = notifier.send_message(recipient, text).await {
            tracing::warn!("❌ Send to {recipient} failed: {e}");
        }
    }
}
