pub mod figure;
pub mod orchestrator;
pub mod plot_interaction;
pub mod resampler;
pub mod trace_builder;
