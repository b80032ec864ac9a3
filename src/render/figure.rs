use std::sync::Arc;

use serde::Serialize;

use crate::config::ViewerConfig;
use crate::error::Result;
use crate::render::trace_builder::{Annotation, TraceSet};
use crate::state::theme::color_for_index;

/// One rendered line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub channel_index: usize,
    /// Shared time axis.
    pub x: Arc<[f64]>,
    /// Displayed values (`raw x amplitude + offset`).
    pub y: Arc<[f64]>,
    /// Raw samples, shown on hover instead of the displayed value.
    pub customdata: Arc<[f64]>,
    pub hovertemplate: String,
    pub offset: f64,
    pub visible: bool,
    pub color: [u8; 4],
    pub line_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceOrder {
    Normal,
    Reversed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub traceorder: TraceOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YAxis {
    pub fixedrange: bool,
    pub showticklabels: bool,
    pub ticks: String,
    pub ticklen: f32,
    pub tickvals: Vec<f64>,
}

/// A figure-level button that restyles every trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestyleButton {
    pub label: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub template: String,
    pub showlegend: bool,
    pub legend: Legend,
    pub annotations: Vec<Annotation>,
    pub yaxis: YAxis,
    pub buttons: Vec<RestyleButton>,
    /// Legend entries top to bottom.
    #[serde(skip)]
    pub legend_order: Vec<String>,
    #[serde(skip)]
    pub vertical_step: f64,
}

/// The rendered chart: traces plus layout. Replaced wholesale on every full
/// redraw; only the y-series and trace visibility are ever restyled in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    /// An empty figure carrying the configured layout defaults.
    pub fn cleared(config: &ViewerConfig) -> Self {
        Self {
            data: Vec::new(),
            layout: Layout {
                width: config.figure_width,
                height: config.figure_height,
                template: config.template.clone(),
                showlegend: config.show_legend,
                // Traces go bottom to top, the legend lists top to bottom.
                legend: Legend {
                    traceorder: TraceOrder::Reversed,
                },
                annotations: Vec::new(),
                yaxis: YAxis {
                    fixedrange: false,
                    showticklabels: false,
                    ticks: "outside".to_string(),
                    ticklen: config.tick_len,
                    tickvals: Vec::new(),
                },
                buttons: vec![
                    RestyleButton {
                        label: "Show All".to_string(),
                        visible: true,
                    },
                    RestyleButton {
                        label: "Hide All".to_string(),
                        visible: false,
                    },
                ],
                legend_order: Vec::new(),
                vertical_step: 0.0,
            },
        }
    }

    pub fn from_trace_set(set: TraceSet, times: &Arc<[f64]>, config: &ViewerConfig) -> Self {
        let mut figure = Self::cleared(config);
        figure.data = set
            .traces
            .into_iter()
            .map(|t| Trace {
                color: color_for_index(t.channel_index),
                name: t.name,
                channel_index: t.channel_index,
                x: Arc::clone(times),
                y: t.y,
                customdata: t.raw,
                hovertemplate: "%{customdata}".to_string(),
                offset: t.offset,
                visible: true,
                line_width: 1.0,
            })
            .collect();
        figure.layout.annotations = set.annotations;
        figure.layout.yaxis.tickvals = set.ticks;
        figure.layout.legend_order = set.legend_order;
        figure.layout.vertical_step = set.vertical_step;
        figure
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn tick_positions(&self) -> &[f64] {
        &self.layout.yaxis.tickvals
    }

    pub fn legend_order(&self) -> &[String] {
        &self.layout.legend_order
    }

    pub fn trace_by_name(&self, name: &str) -> Option<&Trace> {
        self.data.iter().find(|t| t.name == name)
    }

    /// Y extent of the visible traces.
    pub fn y_extent(&self) -> Option<(f64, f64)> {
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for trace in self.data.iter().filter(|t| t.visible) {
            for &v in trace.y.iter().filter(|v| v.is_finite()) {
                y_min = y_min.min(v);
                y_max = y_max.max(v);
            }
        }
        if y_min.is_finite() && y_max.is_finite() {
            Some((y_min, y_max))
        } else {
            None
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
