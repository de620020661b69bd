pub mod config;
pub mod config_store;
pub mod daemon;
pub mod db;
pub mod domains;
pub mod error;
pub mod interfaces;
pub mod plugins;
pub mod relay;
pub mod services;

pub use crate::config::Config;
pub use crate::domains::message::{InboundMessage, MessageComponent, UserId};
pub use crate::error::{ForwardBotError, Result};
pub use crate::plugins::forward::ForwardPlugin;
pub use crate::relay::{CommandHandlers, RelayEngine, RelayOutcome, RelayState};
