use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::domains::message::InboundMessage;
use crate::error::Result;
use crate::interfaces::plugins::Plugin;

pub const DEFAULT_COMMAND_PREFIX: &str = "/";

/// Routes inbound messages to registered plugins: command keywords go to the
/// plugin that declared them, and every message goes to every listener.
pub struct PluginHost {
    command_prefix: String,
    plugins: Vec<Arc<dyn Plugin>>,
    command_owners: HashMap<String, usize>,
}

impl Default for PluginHost {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_PREFIX)
    }
}

impl PluginHost {
    pub fn new(command_prefix: &str) -> Self {
        Self {
            command_prefix: command_prefix.to_string(),
            plugins: Vec::new(),
            command_owners: HashMap::new(),
        }
    }

    pub fn register_plugin(&mut self, plugin: Arc<dyn Plugin>) -> bool {
        if self.get_plugin(plugin.name()).is_some() {
            warn!(plugin = plugin.name(), "plugin already registered");
            return false;
        }
        if let Some(taken) = plugin
            .commands()
            .iter()
            .find(|command| self.command_owners.contains_key(command.keyword))
        {
            warn!(
                plugin = plugin.name(),
                command = taken.keyword,
                "command keyword already registered"
            );
            return false;
        }

        let index = self.plugins.len();
        for command in plugin.commands() {
            self.command_owners.insert(command.keyword.to_string(), index);
        }
        debug!(plugin = plugin.name(), "plugin registered");
        self.plugins.push(plugin);
        true
    }

    pub fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins
            .iter()
            .find(|plugin| plugin.name() == name)
            .cloned()
    }

    pub fn list_plugins(&self) -> Vec<Value> {
        self.plugins
            .iter()
            .map(|plugin| {
                let metadata = plugin.metadata();
                serde_json::json!({
                    "name": metadata.name,
                    "author": metadata.author,
                    "description": metadata.description,
                    "version": metadata.version,
                    "repository": metadata.repository,
                    "commands": plugin.commands(),
                })
            })
            .collect()
    }

    /// The command keyword of `text`, if it starts with the prefix.
    pub fn parse_command<'a>(&self, text: &'a str) -> Option<&'a str> {
        let rest = text.trim_start().strip_prefix(self.command_prefix.as_str())?;
        rest.split_whitespace().next()
    }

    /// Runs the matching command handler, then every listener. Returns the
    /// replies for the invoking context.
    pub async fn dispatch(&self, message: &InboundMessage) -> Result<Vec<String>> {
        let mut replies = Vec::new();

        if let Some(keyword) = self.parse_command(&message.text) {
            match self.command_owners.get(keyword) {
                Some(&index) => {
                    let plugin = &self.plugins[index];
                    if let Some(reply) = plugin.handle_command(keyword, message).await? {
                        replies.push(reply);
                    }
                }
                None => debug!(keyword, "no plugin handles command"),
            }
        }

        for plugin in &self.plugins {
            plugin.on_message(message).await?;
        }

        Ok(replies)
    }
}
