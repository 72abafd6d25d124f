//! Campana configuration system.
//!
//! TOML file at `~/.campana/config.toml`; every field has a default so a
//! partial (or absent) file still loads.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CampanaError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampanaConfig {
    /// IANA timezone the schedule is written in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Minutes of advance notice before a session starts.
    #[serde(default = "default_lead_minutes")]
    pub lead_minutes: u32,
    /// Chat ids reminders are delivered to.
    #[serde(default)]
    pub recipients: Vec<String>,
    /// Path to the schedule file (JSON array of sessions).
    #[serde(default = "default_schedule_path")]
    pub schedule_path: String,
    /// Path to the sent-log file (owned exclusively by this process).
    #[serde(default = "default_ledger_path")]
    pub ledger_path: String,
    /// Pause between sends to consecutive recipients.
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,
    #[serde(default)]
    pub message: MessageConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

fn default_timezone() -> String { "America/Bogota".into() }
fn default_lead_minutes() -> u32 { 5 }
fn default_schedule_path() -> String { "schedule.json".into() }
fn default_ledger_path() -> String { "sent_log.json".into() }
fn default_send_delay_ms() -> u64 { 1200 }

impl Default for CampanaConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            lead_minutes: default_lead_minutes(),
            recipients: Vec::new(),
            schedule_path: default_schedule_path(),
            ledger_path: default_ledger_path(),
            send_delay_ms: default_send_delay_ms(),
            message: MessageConfig::default(),
            channel: ChannelConfig::default(),
        }
    }
}

impl CampanaConfig {
    /// Load config from the default path (~/.campana/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CampanaError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| CampanaError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| CampanaError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".campana")
            .join("config.toml")
    }

    /// Get the Campana home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".campana")
    }

    /// Enforce the fatal startup rules. Non-fatal conditions (e.g. an empty
    /// recipient list) only warn — the service still runs.
    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        if !(1..=60).contains(&self.lead_minutes) {
            return Err(CampanaError::Config(format!(
                "lead_minutes must be between 1 and 60, got {}",
                self.lead_minutes
            )));
        }
        if self.recipients().is_empty() {
            tracing::warn!("⚠️ No recipients configured — reminders will not be delivered anywhere");
        }
        Ok(())
    }

    /// Parse the configured timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| CampanaError::Config(format!("Unknown timezone: {}", self.timezone)))
    }

    /// Recipient chat ids, trimmed and de-duplicated preserving order.
    pub fn recipients(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.recipients
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.clone()))
            .collect()
    }

    /// Schedule path with `~` expanded.
    pub fn schedule_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.schedule_path).to_string())
    }

    /// Ledger path with `~` expanded.
    pub fn ledger_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.ledger_path).to_string())
    }
}

/// Reminder message content knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageConfig {
    /// Who the reminder addresses, in the greeting line.
    #[serde(default = "default_audience")]
    pub audience: String,
    /// Link appended to every reminder.
    #[serde(default = "default_class_link")]
    pub class_link: String,
}

fn default_audience() -> String { "FUTUROS SUBINTENDENTES".into() }
fn default_class_link() -> String {
    "https://asesoriasacademicasnaslybeltran.q10.com/".into()
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            audience: default_audience(),
            class_link: default_class_link(),
        }
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// WhatsApp gateway channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    /// Base URL of the WhatsApp HTTP gateway.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Gateway session name.
    #[serde(default = "default_session")]
    pub session: String,
    /// Gateway API key (sent as X-Api-Key).
    #[serde(default)]
    pub api_key: String,
    /// Per-request timeout, seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn bool_true() -> bool { true }
fn default_api_url() -> String { "http://127.0.0.1:3001".into() }
fn default_session() -> String { "default".into() }
fn default_timeout_secs() -> u64 { 30 }

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_api_url(),
            session: default_session(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
