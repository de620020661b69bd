use serde_json::Value;

use crate::error::Result;

/// Mapping-like plugin configuration with an explicit flush.
///
/// `set` only stages a value; nothing is durable until `persist` returns `Ok`.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
    fn persist(&self) -> Result<()>;
}
