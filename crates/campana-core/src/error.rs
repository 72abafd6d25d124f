//! Error taxonomy. Only `Config` is ever fatal, and only at startup —
//! everything else is contained at the tick boundary and logged.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CampanaError>;

#[derive(Debug, Error)]
pub enum CampanaError {
    /// Invalid or unusable configuration. Aborts startup.
    #[error("config error: {0}")]
    Config(String),

    /// The schedule file does not exist.
    #[error("schedule not found: {0}")]
    CatalogMissing(String),

    /// The schedule file exists but is not a valid event array.
    #[error("schedule malformed: {0}")]
    CatalogMalformed(String),

    /// Sent-log read or write failure.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// Transport failure talking to the messaging gateway.
    #[error("channel error: {0}")]
    Channel(String),

    /// The gateway session is not paired / authenticated.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
