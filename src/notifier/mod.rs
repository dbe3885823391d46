use crate::config::NotifierConfig;
use crate::db::models::{Alert, AlertStatus};
use crate::error::Error;
use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use serde_json::json;
use std::sync::Arc;

/// Outbound sink for escalation notifications.
///
/// Invoked with the shaped alert record, only on the transition into
/// `escalated`. Dispatch happens off the request path; failures are logged
/// by the caller and never surfaced to the client.
#[async_trait]
pub trait EscalationNotifier: Send + Sync {
    async fn notify_escalation(&self, alert: &Alert) -> Result<()>;
}

/// True when an update moved the alert into `escalated` from any other
/// status. Re-submitting `escalated` over `escalated` does not count.
pub fn is_escalation_transition(prior: AlertStatus, next: AlertStatus) -> bool {
    next == AlertStatus::Escalated && prior != AlertStatus::Escalated
}

/// Telegram implementation of the escalation sink.
pub struct TelegramNotifier {
    http: reqwest::Client,
    token: String,
    chat_id: String,
    web_base: String,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String, web_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            chat_id,
            web_base,
        }
    }

    fn message_text(alert: &Alert) -> String {
        format!(
            "Escalated incident {}\n\nType: {}\nWeapon: {}\nConfidence: {:.2}\nTime: {}",
            alert.id, alert.kind, alert.weapon, alert.confidence, alert.timestamp
        )
    }

    fn incident_url(&self, alert: &Alert) -> String {
        format!("{}/incident/{}", self.web_base.trim_end_matches('/'), alert.id)
    }
}

#[async_trait]
impl EscalationNotifier for TelegramNotifier {
    async fn notify_escalation(&self, alert: &Alert) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let body = json!({
            "chat_id": self.chat_id,
            "text": Self::message_text(alert),
            "reply_markup": {
                "inline_keyboard": [[
                    { "text": "Open in dashboard", "url": self.incident_url(alert) }
                ]]
            },
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Notification(format!("Telegram request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(
                Error::Notification(format!("Telegram responded with {}", response.status()))
                    .into(),
            );
        }

        Ok(())
    }
}

/// Build the configured notifier, if any. Without a bot token escalations
/// are only logged.
pub fn create_notifier(config: &NotifierConfig) -> Option<Arc<dyn EscalationNotifier>> {
    match (&config.telegram_token, &config.telegram_chat_id) {
        (Some(token), Some(chat_id)) if !token.is_empty() && !chat_id.is_empty() => {
            info!("Telegram escalation notifier enabled");
            Some(Arc::new(TelegramNotifier::new(
                token.clone(),
                chat_id.clone(),
                config.web_base.clone(),
            )))
        }
        (Some(_), _) => {
            warn!("Telegram notifier configuration incomplete, escalations will only be logged");
            None
        }
        _ => {
            info!("Escalation notifier not configured");
            None
        }
    }
}
