pub mod clock;
pub mod delivery;
pub mod plugins;
pub mod store;
