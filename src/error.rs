use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForwardBotError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("delivery error: {0}")]
    Delivery(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl ForwardBotError {
    /// A failed flush of the configuration store leaves no safe way to keep
    /// relaying; callers must stop instead of retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ForwardBotError::Persistence(_))
    }
}

pub type Result<T> = std::result::Result<T, ForwardBotError>;
