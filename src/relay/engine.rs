use std::sync::Arc;

use time::macros::format_description;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domains::message::{InboundMessage, OutboundEnvelope, UserId};
use crate::error::{ForwardBotError, Result};
use crate::interfaces::clock::{Clock, SystemClock};
use crate::interfaces::delivery::MessageSender;
use crate::relay::state::RelayState;

#[derive(Debug)]
pub enum RelayOutcome {
    Disabled,
    OwnMessage,
    Dispatched {
        target: UserId,
        envelope: OutboundEnvelope,
        delivery: JoinHandle<()>,
    },
}

impl RelayOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, RelayOutcome::Dispatched { .. })
    }
}

pub struct RelayEngine {
    state: Arc<RelayState>,
    sender: Arc<dyn MessageSender>,
    clock: Arc<dyn Clock>,
}

impl RelayEngine {
    pub fn new(state: Arc<RelayState>, sender: Arc<dyn MessageSender>) -> Self {
        Self::with_clock(state, sender, Arc::new(SystemClock))
    }

    pub fn with_clock(
        state: Arc<RelayState>,
        sender: Arc<dyn MessageSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state,
            sender,
            clock,
        }
    }

    /// Relays `message` to the forward target, if there is one and it did not
    /// send the message itself. Delivery runs on a detached task; its result
    /// never reaches the relay state.
    pub async fn on_message(&self, message: &InboundMessage) -> Result<RelayOutcome> {
        let Some(target) = self.state.get().await else {
            return Ok(RelayOutcome::Disabled);
        };
        if message.sender_id == target {
            return Ok(RelayOutcome::OwnMessage);
        }

        let envelope = build_envelope(message, self.clock.now())?;
        let parts = envelope.clone().into_components();
        let sender = self.sender.clone();
        let recipient = target.clone();
        debug!(target_id = %target, sender_id = %message.sender_id, "relaying message");
        let delivery = tokio::spawn(async move {
            if let Err(err) = sender.send_message(&recipient, parts).await {
                warn!(target_id = %recipient, error = %err, "relay delivery failed");
            }
        });

        Ok(RelayOutcome::Dispatched {
            target,
            envelope,
            delivery,
        })
    }
}

pub fn origin_label(message: &InboundMessage) -> String {
    match message.group() {
        Some(group) => format!("Group ID: {group}, Sender: {}", message.sender_name),
        None => format!("Private, Sender: {}", message.sender_name),
    }
}

pub fn format_timestamp(at: OffsetDateTime) -> Result<String> {
    at.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .map_err(|e| ForwardBotError::Runtime(e.to_string()))
}

pub fn build_envelope(message: &InboundMessage, at: OffsetDateTime) -> Result<OutboundEnvelope> {
    Ok(OutboundEnvelope {
        timestamp: format_timestamp(at)?,
        origin: origin_label(message),
        body: message.text.clone(),
    })
}
