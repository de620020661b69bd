use async_trait::async_trait;
use serde::Serialize;

use crate::domains::message::InboundMessage;
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct PluginMetadata {
    pub name: &'static str,
    pub author: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub repository: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CommandSpec {
    pub keyword: &'static str,
    pub help: &'static str,
}

#[async_trait]
pub trait Plugin: Send + Sync {
    fn metadata(&self) -> &PluginMetadata;

    fn name(&self) -> &str {
        self.metadata().name
    }

    fn description(&self) -> &str {
        self.metadata().description
    }

    fn commands(&self) -> &[CommandSpec];

    /// Runs one of the keywords listed by `commands`. Returns the reply for
    /// the invoking context, or `None` if the keyword is not handled here.
    async fn handle_command(&self, keyword: &str, message: &InboundMessage)
        -> Result<Option<String>>;

    /// Sees every inbound message, commands included.
    async fn on_message(&self, message: &InboundMessage) -> Result<()>;
}
