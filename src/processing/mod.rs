pub mod downsampling;
pub mod hover;
pub mod statistics;
