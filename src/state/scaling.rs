use crate::config::ViewerConfig;
use crate::error::{Result, StackError};
use crate::processing::statistics;

/// Amplitude and trace-spacing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingState {
    amplitude: f64,
    default_amplitude: f64,
    min: f64,
    max: f64,
    step_factor: f64,
    vertical_step: f64,
}

impl Default for ScalingState {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            default_amplitude: 1.0,
            min: 1.0,
            max: 10.0,
            step_factor: 10.0,
            vertical_step: 0.0,
        }
    }
}

impl ScalingState {
    /// Scaling with custom amplitude bounds; amplitude starts at `min`.
    pub fn with_bounds(min: f64, max: f64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(StackError::Range { value: min, min: f64::MIN_POSITIVE, max });
        }
        Ok(Self {
            amplitude: min,
            default_amplitude: min,
            min,
            max,
            ..Default::default()
        })
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            amplitude: config.amplitude_default,
            default_amplitude: config.amplitude_default,
            min: config.amplitude_min,
            max: config.amplitude_max,
            step_factor: config.step_factor,
            vertical_step: 0.0,
        }
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn vertical_step(&self) -> f64 {
        self.vertical_step
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Slider increment: whole steps when both bounds are integers, otherwise
    /// continuous so every value in range stays reachable.
    pub fn slider_step(&self) -> Option<f64> {
        (self.min.fract() == 0.0 && self.max.fract() == 0.0).then_some(1.0)
    }

    /// Validate `value` against the bounds before touching state.
    pub fn check_amplitude(&self, value: f64) -> Result<()> {
        if !value.is_finite() || value < self.min || value > self.max {
            return Err(StackError::Range {
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn set_amplitude(&mut self, value: f64) -> Result<()> {
        self.check_amplitude(value)?;
        self.amplitude = value;
        Ok(())
    }

    /// `step_factor x max(std)` over the plotted channels. An empty subset
    /// gives 0, meaning there is nothing to draw.
    pub fn recompute_vertical_step(&mut self, plotted: &[&[f64]]) -> f64 {
        let max_std = plotted
            .iter()
            .filter_map(|series| statistics::std_dev(series))
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));
        self.vertical_step = max_std.map_or(0.0, |s| self.step_factor * s);
        self.vertical_step
    }

    /// Back to the default amplitude with no spacing, as after a dataset load.
    pub fn reset(&mut self) {
        self.amplitude = self.default_amplitude;
        self.vertical_step = 0.0;
    }
}
