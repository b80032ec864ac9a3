pub mod channel_panel;
pub mod chart_panel;
