//! Transport connection lifecycle, modeled as an explicit state machine.
//!
//! The messaging session moves through
//! `Disconnected → Pairing → Authenticated → Ready` and may drop back to
//! `Disconnected` from anywhere. The reminder engine only cares about
//! `Ready`; the other states exist so startup logs tell the operator what
//! the session is waiting on (e.g. a QR scan on the gateway side).

use std::fmt;

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session, or the session was lost.
    Disconnected,
    /// Gateway is waiting for the account to be linked (QR scan).
    Pairing,
    /// Linked, but the session is still syncing.
    Authenticated,
    /// Fully usable — sends are allowed.
    Ready,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Pairing => "pairing",
            ConnectionState::Authenticated => "authenticated",
            ConnectionState::Ready => "ready",
        };
        f.write_str(s)
    }
}

type ChangeHook = Box<dyn Fn(ConnectionState, ConnectionState) + Send + Sync>;

/// Tracks the current session state and fires a hook on every transition.
pub struct ConnectionTracker {
    state: ConnectionState,
    on_change: Option<ChangeHook>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            on_change: None,
        }
    }

    /// Register a transition hook (old state, new state).
    pub fn set_on_change<F>(&mut self, f: F)
    where
        F: Fn(ConnectionState, ConnectionState) + Send + Sync + 'static,
    {
        self.on_change = Some(Box::new(f));
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    /// Move to a new state. No-op when the state is unchanged.
    pub fn transition(&mut self, next: ConnectionState) {
        if next == self.state {
            return;
        }
        let prev = self.state;
        self.state = next;
        tracing::info!("🔌 Session state: {prev} → {next}");
        if let Some(hook) = &self.on_change {
            hook(prev, next);
        }
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}
