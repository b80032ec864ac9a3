use std::sync::Arc;

use crate::config::ViewerConfig;
use crate::data::buffer::{DataSource, SignalBuffer};
use crate::error::{Result, StackError};
use crate::render::figure::Figure;
use crate::render::orchestrator::{RedrawOrchestrator, RedrawOutcome};
use crate::render::resampler::RenderingBackend;
use crate::state::channel_registry::ChannelRegistry;
use crate::state::scaling::ScalingState;

/// Everything a UI control can ask of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    ChannelToggled { name: String, visible: bool },
    SubmitSelection,
    SelectAll,
    DeselectAll,
    AmplitudeChanged(f64),
    DimensionFilterChanged(Option<String>),
    ShowAllTraces,
    HideAllTraces,
}

/// One viewer session: channel state, scaling, the loaded buffer and the
/// orchestrator that owns the rendered figure.
///
/// All mutation goes through [`TimeSeriesSession::handle_event`] or
/// [`TimeSeriesSession::load_dataset`]. Toggles and select/deselect only touch
/// the registry; submit, filter changes and dataset loads redraw fully;
/// amplitude changes restyle the rendered traces.
#[derive(Debug)]
pub struct TimeSeriesSession {
    config: ViewerConfig,
    registry: ChannelRegistry,
    scaling: ScalingState,
    buffer: Option<Arc<SignalBuffer>>,
    orchestrator: RedrawOrchestrator,
}

impl Default for TimeSeriesSession {
    fn default() -> Self {
        let config = ViewerConfig::default();
        Self {
            registry: ChannelRegistry::new(config.filter_policy),
            scaling: ScalingState::from_config(&config),
            buffer: None,
            orchestrator: RedrawOrchestrator::new(RenderingBackend::from_config(&config)),
            config,
        }
    }
}

impl TimeSeriesSession {
    pub fn new(config: ViewerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: ChannelRegistry::new(config.filter_policy),
            scaling: ScalingState::from_config(&config),
            buffer: None,
            orchestrator: RedrawOrchestrator::new(RenderingBackend::from_config(&config)),
            config,
        })
    }

    /// Replace the recording. Registry, scaling and figure are reset, then
    /// every channel is drawn. On error the previous dataset stays loaded.
    pub fn load_dataset(&mut self, source: &dyn DataSource) -> Result<RedrawOutcome> {
        let buffer = SignalBuffer::from_source(source)?;
        let mut registry = ChannelRegistry::new(self.config.filter_policy);
        registry.initialize(source.channel_names(), source.channel_tags(), Some(buffer.row_count()))?;

        tracing::info!(
            "Loading dataset: {} channels, {} samples at {} Hz",
            buffer.row_count(),
            buffer.sample_count(),
            buffer.sample_rate()
        );

        self.registry = registry;
        self.scaling.reset();
        self.orchestrator.reset(&self.config);
        self.buffer = Some(Arc::new(buffer));
        self.redraw()
    }

    /// Single entry point for UI-originated changes.
    pub fn handle_event(&mut self, event: UiEvent) -> Result<RedrawOutcome> {
        tracing::debug!("Handling {:?}", event);
        match event {
            UiEvent::ChannelToggled { name, visible } => {
                self.registry.set_visible(&name, visible)?;
                Ok(RedrawOutcome::StateOnly)
            }
            UiEvent::SubmitSelection => self.redraw(),
            UiEvent::SelectAll => {
                self.registry.select_all();
                Ok(RedrawOutcome::StateOnly)
            }
            UiEvent::DeselectAll => {
                self.registry.deselect_all();
                Ok(RedrawOutcome::StateOnly)
            }
            UiEvent::AmplitudeChanged(value) => self.change_amplitude(value),
            UiEvent::DimensionFilterChanged(tag) => {
                self.require_buffer()?;
                self.registry.filter_by_dimension(tag.as_deref());
                self.redraw()
            }
            UiEvent::ShowAllTraces => {
                self.orchestrator.set_all_visible(true);
                Ok(RedrawOutcome::StateOnly)
            }
            UiEvent::HideAllTraces => {
                self.orchestrator.set_all_visible(false);
                Ok(RedrawOutcome::StateOnly)
            }
        }
    }

    fn require_buffer(&self) -> Result<Arc<SignalBuffer>> {
        self.buffer
            .clone()
            .ok_or_else(|| StackError::InvalidState("no dataset loaded".to_string()))
    }

    fn redraw(&mut self) -> Result<RedrawOutcome> {
        let buffer = self.require_buffer()?;
        self.orchestrator
            .full_redraw(&self.registry, &mut self.scaling, &buffer, &self.config)
            .map_err(|e| {
                tracing::error!("Redraw failed: {}", e);
                e
            })
    }

    fn change_amplitude(&mut self, value: f64) -> Result<RedrawOutcome> {
        self.scaling.check_amplitude(value)?;
        self.require_buffer()?;

        let previous = self.scaling.amplitude();
        self.scaling.set_amplitude(value)?;
        let result = if self.orchestrator.has_rendered() {
            self.orchestrator.rescale(value)
        } else {
            self.redraw()
        };
        if result.is_err() {
            self.scaling.set_amplitude(previous)?;
        }
        result
    }

    pub fn rendered_figure(&self) -> &Figure {
        self.orchestrator.figure()
    }

    pub fn current_tick_positions(&self) -> &[f64] {
        self.rendered_figure().tick_positions()
    }

    pub fn current_legend_order(&self) -> &[String] {
        self.rendered_figure().legend_order()
    }

    /// The rendered figure as JSON (traces with raw customdata, plus layout).
    pub fn figure_json(&self) -> Result<String> {
        self.rendered_figure().to_json()
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn scaling(&self) -> &ScalingState {
        &self.scaling
    }

    pub fn buffer(&self) -> Option<&SignalBuffer> {
        self.buffer.as_deref()
    }

    pub fn orchestrator(&self) -> &RedrawOrchestrator {
        &self.orchestrator
    }

    pub fn backend(&self) -> &RenderingBackend {
        self.orchestrator.backend()
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::buffer::InMemoryRecording;

    fn recording() -> InMemoryRecording {
        let buffer = SignalBuffer::new(
            vec![vec![1.0, -1.0, 1.0, -1.0], vec![0.5, -0.5, 0.5, -0.5]],
            2.0,
            0.0,
        )
        .unwrap();
        InMemoryRecording::new(vec!["Cz".into(), "Oz".into()], None, buffer)
    }

    #[test]
    fn load_draws_every_channel() {
        let mut session = TimeSeriesSession::default();
        assert_eq!(session.load_dataset(&recording()).unwrap(), RedrawOutcome::FullRedraw);
        assert_eq!(session.current_legend_order(), &["Cz", "Oz"]);
        assert_eq!(session.current_tick_positions(), &[0.0, 10.0]);
    }

    #[test]
    fn events_before_load() {
        let mut session = TimeSeriesSession::default();
        for event in [
            UiEvent::SubmitSelection,
            UiEvent::AmplitudeChanged(2.0),
            UiEvent::DimensionFilterChanged(Some("eeg".into())),
        ] {
            assert!(matches!(session.handle_event(event), Err(StackError::InvalidState(_))));
        }
        assert_eq!(session.scaling().amplitude(), 1.0);
        assert!(matches!(
            session.handle_event(UiEvent::ChannelToggled { name: "Cz".into(), visible: false }),
            Err(StackError::UnknownChannel(_))
        ));
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut session = TimeSeriesSession::default();
        session.load_dataset(&recording()).unwrap();
        let mut bad = recording();
        bad.names = vec!["Cz".into()];
        assert!(session.load_dataset(&bad).is_err());
        assert_eq!(session.registry().len(), 2);
        assert_eq!(session.rendered_figure().data.len(), 2);
    }

    #[test]
    fn reload_resets_amplitude() {
        let mut session = TimeSeriesSession::default();
        session.load_dataset(&recording()).unwrap();
        session.handle_event(UiEvent::AmplitudeChanged(5.0)).unwrap();
        session.load_dataset(&recording()).unwrap();
        assert_eq!(session.scaling().amplitude(), 1.0);
    }
}
