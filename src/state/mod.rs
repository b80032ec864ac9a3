pub mod channel_registry;
pub mod scaling;
pub mod session;
pub mod theme;
