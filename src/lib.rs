//! Stacked multi-channel time-series viewer core.
//!
//! A [`state::session::TimeSeriesSession`] owns the channel registry, the
//! amplitude/spacing state, the loaded [`data::buffer::SignalBuffer`] and the
//! [`render::orchestrator::RedrawOrchestrator`] that keeps the rendered
//! [`render::figure::Figure`] in sync. UI code talks to it through
//! [`state::session::UiEvent`]s only.

pub mod config;
pub mod data;
pub mod error;
pub mod processing;
pub mod render;
pub mod state;
pub mod ui;

pub use config::ViewerConfig;
pub use error::{Result, StackError};
pub use state::session::{TimeSeriesSession, UiEvent};
