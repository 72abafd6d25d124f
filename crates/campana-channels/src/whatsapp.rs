//! WhatsApp HTTP gateway channel.
//!
//! Talks to a self-hosted WhatsApp Web gateway (WAHA-style REST API) that
//! holds the linked session. QR pairing happens on the gateway side; this
//! client only reports the session state and sends text messages.

use async_trait::async_trait;
use campana_core::config::WhatsAppConfig;
use campana_core::error::{CampanaError, Result};
use campana_core::traits::Notifier;
use campana_core::types::TargetInfo;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;

use crate::connection::{ConnectionState, ConnectionTracker};

/// Session status payload from `GET /api/sessions/{session}`.
#[derive(Debug, Deserialize)]
struct SessionStatus {
    #[serde(default)]
    status: String,
}

/// Chat entry from `GET /api/{session}/chats`.
#[derive(Debug, Deserialize)]
struct ChatInfo {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "isGroup")]
    is_group: Option<bool>,
}

/// Map a gateway session status onto the connection lifecycle.
fn state_from_status(status: &str) -> ConnectionState {
    match status {
        "WORKING" => ConnectionState::Ready,
        "SCAN_QR_CODE" => ConnectionState::Pairing,
        "STARTING" => ConnectionState::Authenticated,
        _ => ConnectionState::Disconnected,
    }
}

fn target_from_chat(chat: ChatInfo) -> TargetInfo {
    // Group ids end in @g.us; fall back to that when the gateway omits the flag.
    let is_group = chat.is_group.unwrap_or_else(|| chat.id.ends_with("@g.us"));
    TargetInfo {
        name: chat.name.unwrap_or_else(|| chat.id.clone()),
        id: chat.id,
        is_group,
    }
}

/// WhatsApp gateway client implementing the `Notifier` capability.
pub struct WhatsAppGateway {
    config: WhatsAppConfig,
    client: reqwest::Client,
    tracker: Mutex<ConnectionTracker>,
}

impl WhatsAppGateway {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            tracker: Mutex::new(ConnectionTracker::new()),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.get(url).timeout(self.timeout());
        if !self.config.api_key.is_empty() {
            req = req.header("X-Api-Key", &self.config.api_key);
        }
        req
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.post(url).timeout(self.timeout());
        if !self.config.api_key.is_empty() {
            req = req.header("X-Api-Key", &self.config.api_key);
        }
        req
    }

    /// Probe the gateway session and update the tracked state.
    pub async fn refresh_state(&self) -> Result<ConnectionState> {
        let url = self.api_url(&format!("api/sessions/{}", self.config.session));
        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| CampanaError::Channel(format!("Gateway status request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CampanaError::Channel(format!(
                "Gateway status error {status}: {body}"
            )));
        }

        let payload: SessionStatus = response
            .json()
            .await
            .map_err(|e| CampanaError::Channel(format!("Invalid gateway status: {e}")))?;

        let state = state_from_status(&payload.status);
        self.tracker.lock().unwrap().transition(state);
        Ok(state)
    }

    async fn fetch_chats(&self) -> Result<Vec<ChatInfo>> {
        let url = self.api_url(&format!("api/{}/chats", self.config.session));
        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| CampanaError::Channel(format!("Chat list request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CampanaError::Channel(format!(
                "Chat list error {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CampanaError::Channel(format!("Invalid chat list: {e}")))
    }
}

#[async_trait]
impl Notifier for WhatsAppGateway {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn connect(&mut self) -> Result<()> {
        if !self.config.enabled {
            return Err(CampanaError::Config("WhatsApp channel is disabled".into()));
        }
        if self.config.api_url.is_empty() {
            return Err(CampanaError::Config(
                "WhatsApp gateway api_url not configured".into(),
            ));
        }

        match self.refresh_state().await? {
            ConnectionState::Ready => {
                tracing::info!(
                    "WhatsApp gateway: session '{}' ready at {}",
                    self.config.session,
                    self.config.api_url
                );
                Ok(())
            }
            ConnectionState::Pairing => Err(CampanaError::AuthFailed(
                "Session not linked — scan the QR code on the gateway".into(),
            )),
            ConnectionState::Authenticated => Err(CampanaError::AuthFailed(
                "Session linked but still starting — retry shortly".into(),
            )),
            ConnectionState::Disconnected => Err(CampanaError::Channel(format!(
                "Gateway session '{}' is stopped",
                self.config.session
            ))),
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.tracker
            .lock()
            .unwrap()
            .transition(ConnectionState::Disconnected);
        tracing::info!("WhatsApp gateway: disconnected");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.tracker.lock().unwrap().is_ready()
    }

    async fn list_targets(&self) -> Result<Vec<TargetInfo>> {
        let chats = self.fetch_chats().await?;
        Ok(chats.into_iter().map(target_from_chat).collect())
    }

    async fn resolve_target(&self, id: &str) -> Result<TargetInfo> {
        let chats = self.fetch_chats().await?;
        chats
            .into_iter()
            .find(|c| c.id == id)
            .map(target_from_chat)
            .ok_or_else(|| CampanaError::Channel(format!("Unknown chat id: {id}")))
    }

    async fn send_message(&self, target_id: &str, text: &str) -> Result<()> {
        // A session that came up after startup is picked up here.
        if !self.is_ready() {
            self.refresh_state().await?;
        }
        if !self.is_ready() {
            return Err(CampanaError::AuthFailed(format!(
                "Session '{}' not ready",
                self.config.session
            )));
        }

        let url = self.api_url("api/sendText");
        let body = serde_json::json!({
            "session": self.config.session,
            "chatId": target_id,
            "text": text,
        });

        let response = self
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CampanaError::Channel(format!("sendText failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CampanaError::Channel(format!(
                "sendText error {status}: {error_text}"
            )));
        }

        tracing::debug!("WhatsApp message sent → {target_id}");
        Ok(())
    }
}
