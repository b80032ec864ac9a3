use std::sync::Arc;

use serde::Serialize;

use crate::data::buffer::SignalBuffer;
use crate::error::{Result, StackError};
use crate::state::scaling::ScalingState;

/// One channel, ready to be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceDescriptor {
    pub name: String,
    /// Row in the signal buffer.
    pub channel_index: usize,
    /// Resting height of the trace: `position x vertical_step`.
    pub offset: f64,
    /// Full-resolution raw samples (shared with the buffer).
    pub raw: Arc<[f64]>,
    /// `raw x amplitude + offset`.
    pub y: Arc<[f64]>,
}

impl TraceDescriptor {
    /// y-series for another amplitude, same offset.
    pub fn rescaled(&self, amplitude: f64) -> Arc<[f64]> {
        scale_series(&self.raw, amplitude, self.offset)
    }
}

/// Channel-name label placed at the left edge of the plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    /// Paper coordinate, 0 = left edge of the plot area.
    pub x: f64,
    pub y: f64,
    pub text: String,
    /// Pixel shift applied after placement (negative = outside the plot).
    pub x_shift: f32,
    pub show_arrow: bool,
}

/// Everything a redraw produces from one selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraceSet {
    /// Draw order: bottom trace first.
    pub traces: Vec<TraceDescriptor>,
    pub annotations: Vec<Annotation>,
    pub ticks: Vec<f64>,
    /// Top-to-bottom legend entries (declaration order of the selection).
    pub legend_order: Vec<String>,
    pub vertical_step: f64,
}

impl TraceSet {
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}

pub fn scale_series(raw: &[f64], amplitude: f64, offset: f64) -> Arc<[f64]> {
    raw.iter().map(|v| v * amplitude + offset).collect()
}

/// Stack the selected channels.
///
/// `selection` is in declaration order. The draw order is its reverse, so the
/// first selected channel sits on top at the highest offset. The legend is
/// reversed once more and reads in declaration order.
pub fn build_traces(
    buffer: &SignalBuffer,
    names: &[String],
    selection: &[usize],
    scaling: &ScalingState,
    annotation_x_shift: f32,
) -> Result<TraceSet> {
    let step = scaling.vertical_step();
    let amplitude = scaling.amplitude();

    let draw_order: Vec<usize> = selection.iter().rev().copied().collect();

    let mut set = TraceSet {
        vertical_step: step,
        ..Default::default()
    };

    for (position, &idx) in draw_order.iter().enumerate() {
        let raw = buffer.row(idx).ok_or_else(|| {
            StackError::InvalidState(format!(
                "channel index {idx} outside buffer with {} rows",
                buffer.row_count()
            ))
        })?;
        let name = names.get(idx).cloned().ok_or_else(|| {
            StackError::InvalidState(format!("no channel name for index {idx}"))
        })?;
        let offset = position as f64 * step;

        set.annotations.push(Annotation {
            x: 0.0,
            y: offset,
            text: name.clone(),
            x_shift: annotation_x_shift,
            show_arrow: false,
        });
        set.ticks.push(offset);
        set.traces.push(TraceDescriptor {
            name,
            channel_index: idx,
            offset,
            raw: Arc::clone(raw),
            y: scale_series(raw, amplitude, offset),
        });
    }

    set.legend_order = set.traces.iter().rev().map(|t| t.name.clone()).collect();
    Ok(set)
}
