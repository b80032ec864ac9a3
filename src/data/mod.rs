pub mod buffer;
pub mod channel_type;
pub mod loader;
