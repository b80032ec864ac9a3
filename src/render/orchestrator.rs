use std::sync::Arc;

use crate::config::ViewerConfig;
use crate::data::buffer::SignalBuffer;
use crate::error::{Result, StackError};
use crate::render::figure::Figure;
use crate::render::resampler::{RenderingBackend, ResamplingPort};
use crate::render::trace_builder::{build_traces, TraceSet};
use crate::state::channel_registry::ChannelRegistry;
use crate::state::scaling::ScalingState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawPhase {
    Idle,
    Building,
    Rendering,
}

/// What handling one event did to the rendered figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawOutcome {
    /// State changed but no trace was rebuilt or rescaled.
    StateOnly,
    FullRedraw,
    /// Only the y-series were rewritten.
    PartialRedraw,
    /// Full redraw with an empty selection.
    Cleared,
}

/// Owns the rendered figure (through the backend) and decides how it gets
/// replaced. A full redraw rebuilds everything from the current selection;
/// an amplitude change reuses the rendered trace set and only restyles y.
#[derive(Debug)]
pub struct RedrawOrchestrator {
    backend: RenderingBackend,
    phase: RedrawPhase,
    /// Trace set behind the current figure. `None` until the first full redraw.
    rendered: Option<TraceSet>,
    full_redraws: u64,
    partial_redraws: u64,
}

impl RedrawOrchestrator {
    pub fn new(backend: RenderingBackend) -> Self {
        Self {
            backend,
            phase: RedrawPhase::Idle,
            rendered: None,
            full_redraws: 0,
            partial_redraws: 0,
        }
    }

    fn begin(&mut self) -> Result<()> {
        if self.phase != RedrawPhase::Idle {
            return Err(StackError::InvalidState(format!(
                "redraw requested while {:?}",
                self.phase
            )));
        }
        self.phase = RedrawPhase::Building;
        Ok(())
    }

    /// Rebuild the figure from the registry's current selection.
    ///
    /// The vertical step is recomputed over the plotted subset only. The new
    /// scaling is committed together with the figure, so a failure leaves both
    /// the figure and `scaling` as they were.
    pub fn full_redraw(
        &mut self,
        registry: &ChannelRegistry,
        scaling: &mut ScalingState,
        buffer: &SignalBuffer,
        config: &ViewerConfig,
    ) -> Result<RedrawOutcome> {
        self.begin()?;
        let result = self.rebuild(registry, scaling, buffer, config);
        self.phase = RedrawPhase::Idle;
        result
    }

    fn rebuild(
        &mut self,
        registry: &ChannelRegistry,
        scaling: &mut ScalingState,
        buffer: &SignalBuffer,
        config: &ViewerConfig,
    ) -> Result<RedrawOutcome> {
        let selection = registry.current_selection();

        let mut next_scaling = scaling.clone();
        let mut plotted: Vec<&[f64]> = Vec::with_capacity(selection.len());
        for &idx in &selection {
            let row = buffer.row(idx).ok_or_else(|| {
                StackError::InvalidState(format!(
                    "channel index {idx} outside buffer with {} rows",
                    buffer.row_count()
                ))
            })?;
            plotted.push(&row[..]);
        }
        next_scaling.recompute_vertical_step(&plotted);

        let names = registry.names();
        let set = build_traces(buffer, &names, &selection, &next_scaling, config.annotation_x_shift)?;

        self.phase = RedrawPhase::Rendering;
        self.backend.register();
        let figure = if set.is_empty() {
            Figure::cleared(config)
        } else {
            Figure::from_trace_set(set.clone(), buffer.times(), config)
        };
        self.backend.replace_figure(figure);

        *scaling = next_scaling;
        self.full_redraws += 1;
        let outcome = if set.is_empty() {
            tracing::info!("Cleared figure (empty selection)");
            RedrawOutcome::Cleared
        } else {
            tracing::info!(
                "Full redraw: {} traces, vertical step {:.4}, amplitude {}",
                set.traces.len(),
                set.vertical_step,
                scaling.amplitude()
            );
            RedrawOutcome::FullRedraw
        };
        self.rendered = Some(set);
        Ok(outcome)
    }

    /// Rewrite every rendered trace's y-series for `amplitude`. Offsets and
    /// the vertical step are left alone.
    pub fn rescale(&mut self, amplitude: f64) -> Result<RedrawOutcome> {
        self.begin()?;
        let result = self.restyle(amplitude);
        self.phase = RedrawPhase::Idle;
        result
    }

    fn restyle(&mut self, amplitude: f64) -> Result<RedrawOutcome> {
        let rendered = self
            .rendered
            .as_mut()
            .ok_or_else(|| StackError::InvalidState("no figure rendered yet".to_string()))?;

        let ys: Vec<Arc<[f64]>> = rendered.traces.iter().map(|t| t.rescaled(amplitude)).collect();

        self.phase = RedrawPhase::Rendering;
        self.backend.restyle_y(ys.clone())?;
        for (trace, y) in rendered.traces.iter_mut().zip(ys) {
            trace.y = y;
        }
        self.partial_redraws += 1;
        tracing::debug!(
            "Partial redraw: {} traces rescaled to amplitude {}",
            rendered.traces.len(),
            amplitude
        );
        Ok(RedrawOutcome::PartialRedraw)
    }

    /// Show All / Hide All. Touches trace visibility only.
    pub fn set_all_visible(&mut self, visible: bool) {
        self.backend.set_all_visible(visible);
    }

    /// Drop the rendered figure, as on a dataset change.
    pub fn reset(&mut self, config: &ViewerConfig) {
        self.backend.replace_figure(Figure::cleared(config));
        self.rendered = None;
    }

    pub fn has_rendered(&self) -> bool {
        self.rendered.is_some()
    }

    pub fn rendered_traces(&self) -> Option<&TraceSet> {
        self.rendered.as_ref()
    }

    /// Channel indices of the rendered traces, in declaration order.
    pub fn rendered_selection(&self) -> Vec<usize> {
        self.rendered
            .as_ref()
            .map(|set| set.traces.iter().rev().map(|t| t.channel_index).collect())
            .unwrap_or_default()
    }

    pub fn figure(&self) -> &Figure {
        self.backend.figure()
    }

    pub fn backend(&self) -> &RenderingBackend {
        &self.backend
    }

    pub fn phase(&self) -> RedrawPhase {
        self.phase
    }

    pub fn full_redraws(&self) -> u64 {
        self.full_redraws
    }

    pub fn partial_redraws(&self) -> u64 {
        self.partial_redraws
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ChannelRegistry, ScalingState, SignalBuffer, ViewerConfig) {
        let buffer = SignalBuffer::new(
            vec![
                vec![1.0, -1.0, 1.0, -1.0],
                vec![2.0, -2.0, 2.0, -2.0],
                vec![0.5, -0.5, 0.5, -0.5],
            ],
            4.0,
            0.0,
        )
        .unwrap();
        let mut registry = ChannelRegistry::default();
        registry
            .initialize(vec!["Cz".into(), "Pz".into(), "Oz".into()], None, Some(3))
            .unwrap();
        let config = ViewerConfig::default();
        (registry, ScalingState::from_config(&config), buffer, config)
    }

    fn figure_y(orch: &RedrawOrchestrator, trace: usize) -> Vec<f64> {
        orch.figure().data[trace].y.to_vec()
    }

    fn orchestrator(config: &ViewerConfig) -> RedrawOrchestrator {
        RedrawOrchestrator::new(RenderingBackend::from_config(config))
    }

    #[test]
    fn full_redraw_then_partial_rescale() {
        let (registry, mut scaling, buffer, config) = setup();
        let mut orch = orchestrator(&config);
        assert!(!orch.has_rendered());

        let outcome = orch.full_redraw(&registry, &mut scaling, &buffer, &config).unwrap();
        assert_eq!(outcome, RedrawOutcome::FullRedraw);
        assert_eq!(scaling.vertical_step(), 20.0);
        assert_eq!(orch.figure().tick_positions(), &[0.0, 20.0, 40.0]);

        let offsets: Vec<f64> = orch.figure().data.iter().map(|t| t.offset).collect();
        assert_eq!(orch.rescale(4.0).unwrap(), RedrawOutcome::PartialRedraw);
        let figure = orch.figure();
        assert_eq!(figure.tick_positions(), &[0.0, 20.0, 40.0]);
        for (trace, offset) in figure.data.iter().zip(offsets) {
            assert_eq!(trace.offset, offset);
            for (y, raw) in trace.y.iter().zip(trace.customdata.iter()) {
                assert_eq!(*y, raw * 4.0 + offset);
            }
        }
        assert_eq!(orch.full_redraws(), 1);
        assert_eq!(orch.partial_redraws(), 1);
        assert_eq!(orch.phase(), RedrawPhase::Idle);
        assert_eq!(orch.rendered_selection(), vec![0, 1, 2]);
        let rendered = orch.rendered_traces().unwrap();
        assert_eq!(&rendered.traces[0].y[..], &figure_y(&orch, 0)[..]);
    }

    #[test]
    fn rescale_without_figure_is_invalid() {
        let (_, _, _, config) = setup();
        let mut orch = orchestrator(&config);
        assert!(matches!(orch.rescale(2.0), Err(StackError::InvalidState(_))));
        assert_eq!(orch.phase(), RedrawPhase::Idle);
        assert_eq!(orch.partial_redraws(), 0);
    }

    #[test]
    fn empty_selection_clears() {
        let (mut registry, mut scaling, buffer, config) = setup();
        let mut orch = orchestrator(&config);
        orch.full_redraw(&registry, &mut scaling, &buffer, &config).unwrap();
        registry.deselect_all();
        let outcome = orch.full_redraw(&registry, &mut scaling, &buffer, &config).unwrap();
        assert_eq!(outcome, RedrawOutcome::Cleared);
        assert!(orch.figure().is_empty());
        assert!(orch.figure().layout.annotations.is_empty());
        assert!(orch.figure().tick_positions().is_empty());
        assert_eq!(scaling.vertical_step(), 0.0);
    }

    #[test]
    fn failed_redraw_keeps_previous_figure() {
        let (registry, mut scaling, buffer, config) = setup();
        let mut orch = orchestrator(&config);
        orch.full_redraw(&registry, &mut scaling, &buffer, &config).unwrap();
        let before = orch.figure().clone();

        let short = SignalBuffer::new(vec![vec![5.0, -5.0]], 4.0, 0.0).unwrap();
        let err = orch.full_redraw(&registry, &mut scaling, &short, &config).unwrap_err();
        assert!(matches!(err, StackError::InvalidState(_)));
        assert_eq!(orch.figure(), &before);
        assert_eq!(scaling.vertical_step(), 20.0);
        assert_eq!(orch.full_redraws(), 1);
        assert_eq!(orch.phase(), RedrawPhase::Idle);
    }
}
