//! The notifier capability — the seam between the reminder engine and
//! whatever actually transmits messages. The engine never talks to a
//! transport directly; tests substitute a fake.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::TargetInfo;

/// An outbound messaging capability.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs ("whatsapp", "mock", ...).
    fn name(&self) -> &str;

    /// Establish the transport session.
    async fn connect(&mut self) -> Result<()>;

    /// Tear the session down (best-effort, called on shutdown).
    async fn disconnect(&mut self) -> Result<()>;

    /// Whether the transport is ready to send.
    fn is_ready(&self) -> bool;

    /// List every chat visible to the account.
    async fn list_targets(&self) -> Result<Vec<TargetInfo>>;

    /// Resolve a chat id to its info. Errors if the id is unknown.
    async fn resolve_target(&self, id: &str) -> Result<TargetInfo>;

    /// Send a text message to a chat.
    async fn send_message(&self, target_id: &str, text: &str) -> Result<()>;
}
