use std::sync::Arc;

use tracing::info;

use crate::domains::message::UserId;
use crate::error::Result;
use crate::relay::state::RelayState;

pub const ENABLE_COMMAND: &str = "enable_forward";
pub const DISABLE_COMMAND: &str = "disable_forward";
pub const STATUS_COMMAND: &str = "status_forward";

pub const DISABLED_REPLY: &str = "Forwarding disabled.";
pub const UNAUTHORIZED_REPLY: &str =
    "You are not the current forward target, so you cannot disable forwarding.";
pub const INACTIVE_REPLY: &str = "Forwarding is not currently enabled.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisableOutcome {
    Disabled,
    Unauthorized,
}

impl DisableOutcome {
    pub fn reply(&self) -> &'static str {
        match self {
            DisableOutcome::Disabled => DISABLED_REPLY,
            DisableOutcome::Unauthorized => UNAUTHORIZED_REPLY,
        }
    }
}

pub struct CommandHandlers {
    state: Arc<RelayState>,
}

impl CommandHandlers {
    pub fn new(state: Arc<RelayState>) -> Self {
        Self { state }
    }

    /// Any caller becomes the forward target, replacing whoever held it.
    pub async fn enable(&self, sender_id: &UserId, sender_name: &str) -> Result<String> {
        match self.state.set(sender_id.clone()).await? {
            Some(previous) if previous != *sender_id => {
                info!(target_id = %sender_id, previous = %previous, "forward target reassigned")
            }
            _ => info!(target_id = %sender_id, "forwarding enabled"),
        }
        Ok(format!(
            "Forwarding enabled, all messages will be forwarded to you, {sender_name}."
        ))
    }

    pub async fn disable(&self, sender_id: &UserId) -> Result<String> {
        let outcome = self.try_disable(sender_id).await?;
        Ok(outcome.reply().to_string())
    }

    pub async fn try_disable(&self, sender_id: &UserId) -> Result<DisableOutcome> {
        if !self.state.clear_if(sender_id).await? {
            info!(sender_id = %sender_id, "disable refused for non-target sender");
            return Ok(DisableOutcome::Unauthorized);
        }
        info!(sender_id = %sender_id, "forwarding disabled");
        Ok(DisableOutcome::Disabled)
    }

    pub async fn status(&self) -> String {
        match self.state.get().await {
            Some(target) => format!("Forwarding is enabled, target user ID: {target}"),
            None => INACTIVE_REPLY.to_string(),
        }
    }
}
