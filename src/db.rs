use std::env;

use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;

use crate::error::{ForwardBotError, Result};

pub fn get_sqlcipher_key() -> Option<String> {
    env::var("FORWARD_BOT_DB_KEY")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn apply_sqlcipher_key_sync(conn: &mut SqliteConnection) -> Result<()> {
    let Some(key) = get_sqlcipher_key() else {
        return Ok(());
    };
    diesel::RunQueryDsl::execute(
        diesel::sql_query("PRAGMA key = ?1").bind::<Text, _>(key),
        conn,
    )
    .map_err(|e| ForwardBotError::Runtime(e.to_string()))?;
    Ok(())
}
