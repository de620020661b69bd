use async_trait::async_trait;

use crate::domains::message::{MessageComponent, UserId};
use crate::error::Result;

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, target: &UserId, parts: Vec<MessageComponent>) -> Result<()>;
}
