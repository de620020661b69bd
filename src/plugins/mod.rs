pub mod forward;
pub mod manager;
