use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StackError};
use crate::processing::downsampling::Reduction;
use crate::state::channel_registry::FilterPolicy;

/// Which rendering backend a session drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Reduce point counts per view window, keep full-resolution data for inspection.
    Resampled,
    /// Hand every sample to the output surface.
    Direct,
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Resampled
    }
}

/// Viewer and session settings. Every field has a default, so a config file
/// only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub amplitude_min: f64,
    pub amplitude_max: f64,
    pub amplitude_default: f64,
    /// Multiplier applied to the largest channel std to get the trace spacing.
    pub step_factor: f64,
    /// Upper bound on points handed to the output surface per trace.
    pub max_display_points: usize,
    pub reduction: Reduction,
    pub backend: BackendKind,
    pub filter_policy: FilterPolicy,
    pub figure_width: u32,
    pub figure_height: u32,
    /// Horizontal pixel shift of the channel-name annotations (negative = left of the axis).
    pub annotation_x_shift: f32,
    pub tick_len: f32,
    pub template: String,
    pub show_legend: bool,
    /// Used when a recording carries no time column.
    pub default_sample_rate: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            amplitude_min: 1.0,
            amplitude_max: 10.0,
            amplitude_default: 1.0,
            step_factor: 10.0,
            max_display_points: 1000,
            reduction: Reduction::default(),
            backend: BackendKind::default(),
            filter_policy: FilterPolicy::default(),
            figure_width: 1000,
            figure_height: 800,
            annotation_x_shift: -70.0,
            tick_len: 3.0,
            template: "plotly_white".to_string(),
            show_legend: true,
            default_sample_rate: 256.0,
        }
    }
}

impl ViewerConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| StackError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: ViewerConfig = serde_json::from_str(&json)
            .map_err(|e| StackError::Config(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        tracing::info!("Loaded viewer config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.amplitude_min > 0.0 && self.amplitude_min <= self.amplitude_max) {
            return Err(StackError::Config(format!(
                "amplitude bounds [{}, {}] must be positive and ordered",
                self.amplitude_min, self.amplitude_max
            )));
        }
        if self.amplitude_default < self.amplitude_min || self.amplitude_default > self.amplitude_max {
            return Err(StackError::Config(format!(
                "default amplitude {} outside [{}, {}]",
                self.amplitude_default, self.amplitude_min, self.amplitude_max
            )));
        }
        if !(self.step_factor.is_finite() && self.step_factor > 0.0) {
            return Err(StackError::Config("step_factor must be positive".to_string()));
        }
        if self.max_display_points < 3 {
            return Err(StackError::Config("max_display_points must be at least 3".to_string()));
        }
        if !(self.default_sample_rate.is_finite() && self.default_sample_rate > 0.0) {
            return Err(StackError::Config("default_sample_rate must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_and_scaling_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.amplitude_min, 1.0);
        assert_eq!(config.amplitude_max, 10.0);
        assert_eq!(config.step_factor, 10.0);
        assert_eq!(config.figure_width, 1000);
        assert_eq!(config.figure_height, 800);
        assert_eq!(config.annotation_x_shift, -70.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{"amplitude_max": 20.0, "reduction": "lttb", "backend": "direct"}"#)
                .unwrap();
        assert_eq!(config.amplitude_max, 20.0);
        assert_eq!(config.amplitude_min, 1.0);
        assert_eq!(config.reduction, Reduction::Lttb);
        assert_eq!(config.backend, BackendKind::Direct);
        assert_eq!(config.filter_policy, FilterPolicy::Intersect);
    }

    #[test]
    fn rejects_inverted_amplitude_bounds() {
        let config = ViewerConfig {
            amplitude_min: 5.0,
            amplitude_max: 2.0,
            amplitude_default: 3.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StackError::Config(_))));
    }
}
