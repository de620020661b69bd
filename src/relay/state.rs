use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::domains::message::UserId;
use crate::error::{ForwardBotError, Result};
use crate::interfaces::store::ConfigStore;

pub const FORWARD_TARGET_KEY: &str = "forward_target";

/// The single forward target, shared by the command handlers and the engine.
///
/// Writers hold the lock across the store flush, so readers only ever see
/// values that are already durable.
pub struct RelayState {
    target: RwLock<Option<UserId>>,
    store: Arc<dyn ConfigStore>,
}

impl RelayState {
    pub fn load(store: Arc<dyn ConfigStore>) -> Result<Self> {
        let target = match store.get(FORWARD_TARGET_KEY)? {
            Some(value) => target_from_value(&value)?,
            None => {
                store.set(FORWARD_TARGET_KEY, Value::Null)?;
                None
            }
        };
        if let Some(target) = &target {
            info!(target_id = %target, "loaded forward target");
        }
        Ok(Self {
            target: RwLock::new(target),
            store,
        })
    }

    pub async fn get(&self) -> Option<UserId> {
        self.target.read().await.clone()
    }

    /// Stores `id` as the target and returns the one it replaced.
    pub async fn set(&self, id: UserId) -> Result<Option<UserId>> {
        let mut guard = self.target.write().await;
        self.write_through(Value::String(id.as_str().to_string()), guard.clone())
            .await?;
        debug!(target_id = %id, "forward target set");
        Ok(guard.replace(id))
    }

    pub async fn clear(&self) -> Result<()> {
        let mut guard = self.target.write().await;
        self.write_through(Value::Null, guard.clone()).await?;
        debug!("forward target cleared");
        *guard = None;
        Ok(())
    }

    /// Clears the target only if it is currently `id`. The comparison and
    /// the write happen under one write guard.
    pub async fn clear_if(&self, id: &UserId) -> Result<bool> {
        let mut guard = self.target.write().await;
        if guard.as_ref() != Some(id) {
            return Ok(false);
        }
        self.write_through(Value::Null, guard.clone()).await?;
        debug!(target_id = %id, "forward target cleared");
        *guard = None;
        Ok(true)
    }

    /// Stages `value` and flushes the store on the blocking pool. On a failed
    /// flush the staged value goes back to `previous`.
    async fn write_through(&self, value: Value, previous: Option<UserId>) -> Result<()> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || flush(store.as_ref(), value, previous))
            .await
            .map_err(|e| ForwardBotError::Persistence(e.to_string()))?
    }
}

fn flush(store: &dyn ConfigStore, value: Value, previous: Option<UserId>) -> Result<()> {
    store.set(FORWARD_TARGET_KEY, value)?;
    let err = match store.persist() {
        Ok(()) => return Ok(()),
        Err(ForwardBotError::Persistence(msg)) => msg,
        Err(other) => other.to_string(),
    };
    let previous = previous
        .map(|id| Value::String(id.as_str().to_string()))
        .unwrap_or(Value::Null);
    if let Err(restore) = store.set(FORWARD_TARGET_KEY, previous) {
        error!(error = %restore, "failed to restore staged forward target");
        return Err(ForwardBotError::Persistence(format!(
            "{err}; restoring staged value also failed: {restore}"
        )));
    }
    Err(ForwardBotError::Persistence(err))
}

fn target_from_value(value: &Value) -> Result<Option<UserId>> {
    match value {
        Value::Null => Ok(None),
        Value::String(raw) => Ok(UserId::parse(raw)),
        Value::Number(num) => Ok(UserId::parse(&num.to_string())),
        other => Err(ForwardBotError::Config(format!(
            "invalid {FORWARD_TARGET_KEY} value: {other}"
        ))),
    }
}
