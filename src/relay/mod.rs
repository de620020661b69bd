pub mod commands;
pub mod engine;
pub mod state;

pub use commands::CommandHandlers;
pub use engine::{RelayEngine, RelayOutcome};
pub use state::RelayState;
