use std::sync::Arc;

use async_trait::async_trait;

use crate::domains::message::InboundMessage;
use crate::error::Result;
use crate::interfaces::clock::Clock;
use crate::interfaces::delivery::MessageSender;
use crate::interfaces::plugins::{CommandSpec, Plugin, PluginMetadata};
use crate::relay::commands::{DISABLE_COMMAND, ENABLE_COMMAND, STATUS_COMMAND};
use crate::relay::{CommandHandlers, RelayEngine, RelayState};

static METADATA: PluginMetadata = PluginMetadata {
    name: "forward_plugin",
    author: "w33d",
    description: "Forwards every received message to one designated user",
    version: "1.0.0",
    repository: "https://github.com/Last-emo-boy/forward-bot",
};

static COMMANDS: [CommandSpec; 3] = [
    CommandSpec {
        keyword: ENABLE_COMMAND,
        help: "Forward all messages the bot receives to you.",
    },
    CommandSpec {
        keyword: DISABLE_COMMAND,
        help: "Stop forwarding. Only the current forward target may do this.",
    },
    CommandSpec {
        keyword: STATUS_COMMAND,
        help: "Show whether forwarding is enabled and the target user ID.",
    },
];

pub struct ForwardPlugin {
    state: Arc<RelayState>,
    commands: CommandHandlers,
    engine: RelayEngine,
}

impl ForwardPlugin {
    pub fn new(state: Arc<RelayState>, sender: Arc<dyn MessageSender>) -> Self {
        Self {
            commands: CommandHandlers::new(state.clone()),
            engine: RelayEngine::new(state.clone(), sender),
            state,
        }
    }

    pub fn with_clock(
        state: Arc<RelayState>,
        sender: Arc<dyn MessageSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            commands: CommandHandlers::new(state.clone()),
            engine: RelayEngine::with_clock(state.clone(), sender, clock),
            state,
        }
    }

    pub fn state(&self) -> &Arc<RelayState> {
        &self.state
    }

    pub fn engine(&self) -> &RelayEngine {
        &self.engine
    }
}

#[async_trait]
impl Plugin for ForwardPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &METADATA
    }

    fn commands(&self) -> &[CommandSpec] {
        &COMMANDS
    }

    async fn handle_command(
        &self,
        keyword: &str,
        message: &InboundMessage,
    ) -> Result<Option<String>> {
        let reply = match keyword {
            ENABLE_COMMAND => {
                self.commands
                    .enable(&message.sender_id, &message.sender_name)
                    .await?
            }
            DISABLE_COMMAND => self.commands.disable(&message.sender_id).await?,
            STATUS_COMMAND => self.commands.status().await,
            _ => return Ok(None),
        };
        Ok(Some(reply))
    }

    async fn on_message(&self, message: &InboundMessage) -> Result<()> {
        self.engine.on_message(message).await?;
        Ok(())
    }
}
