use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::config::DeliveryConfig;
use crate::domains::message::{MessageComponent, UserId};
use crate::error::{ForwardBotError, Result};
use crate::interfaces::delivery::MessageSender;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    target: &'a UserId,
    message: &'a [MessageComponent],
}

/// Posts outbound messages as JSON to the bot platform's send endpoint.
pub struct HttpMessageSender {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpMessageSender {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim().to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    pub fn from_config(config: &DeliveryConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ForwardBotError::Config("missing delivery url".to_string()))?;
        let mut sender = Self::new(url);
        sender.token = config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        if let Some(timeout) = config.timeout_seconds {
            sender.timeout = Duration::from_secs(timeout.max(1));
        }
        Ok(sender)
    }
}

#[async_trait]
impl MessageSender for HttpMessageSender {
    async fn send_message(&self, target: &UserId, parts: Vec<MessageComponent>) -> Result<()> {
        let mut req = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&SendMessageRequest {
                target,
                message: &parts,
            });
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ForwardBotError::Delivery(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ForwardBotError::Delivery(format!(
                "send_message returned {status}: {body}"
            )));
        }
        Ok(())
    }
}

/// Used when no delivery endpoint is configured.
pub struct LogMessageSender;

#[async_trait]
impl MessageSender for LogMessageSender {
    async fn send_message(&self, target: &UserId, parts: Vec<MessageComponent>) -> Result<()> {
        for part in parts {
            match part {
                MessageComponent::Plain { text } => {
                    info!(target_id = %target, "outbound message:\n{text}")
                }
            }
        }
        Ok(())
    }
}
