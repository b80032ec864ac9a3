use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{BackendKind, ViewerConfig};
use crate::error::{Result, StackError};
use crate::processing::downsampling::{self, ReducedSeries, Reduction};
use crate::render::figure::Figure;

/// Process-wide switch for adaptive resampling. Set once, never cleared.
static RESAMPLER_REGISTERED: AtomicBool = AtomicBool::new(false);

/// Enable adaptive resampling for the whole process. Returns `true` only for
/// the call that performed the registration; later calls are no-ops.
pub fn register_resampler() -> bool {
    let first = RESAMPLER_REGISTERED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok();
    if first {
        tracing::info!("Adaptive resampling registered");
    }
    first
}

pub fn is_resampler_registered() -> bool {
    RESAMPLER_REGISTERED.load(Ordering::Acquire)
}

/// Visible time range of the output surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewWindow {
    pub x_min: f64,
    pub x_max: f64,
}

impl ViewWindow {
    pub fn new(x_min: f64, x_max: f64) -> Self {
        Self { x_min, x_max }
    }

    /// The whole time axis.
    pub fn everything() -> Self {
        Self {
            x_min: f64::NEG_INFINITY,
            x_max: f64::INFINITY,
        }
    }
}

/// What a hover over one sample reveals.
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub trace: usize,
    pub name: String,
    pub sample: usize,
    pub time: f64,
    /// Original sample value from the recording.
    pub raw: f64,
    /// Value as drawn (scaled and offset).
    pub displayed: f64,
}

/// The contract between the redraw logic and whatever puts points on screen.
pub trait ResamplingPort {
    /// Enable the backend's rendering mode. Safe to call on every redraw.
    fn register(&mut self) -> bool;

    /// Swap in a new figure in one step, dropping the old one.
    fn replace_figure(&mut self, figure: Figure);

    fn figure(&self) -> &Figure;

    /// Rewrite every trace's y-series in place. `ys` must match the current
    /// trace count and each trace's length.
    fn restyle_y(&mut self, ys: Vec<Arc<[f64]>>) -> Result<()>;

    /// Figure-level visibility restyle (Show All / Hide All).
    fn set_all_visible(&mut self, visible: bool);

    /// Points of one trace to draw for the given window.
    fn visible_points(&self, trace: usize, window: &ViewWindow) -> Option<ReducedSeries>;

    /// Full-resolution sample behind a displayed point.
    fn inspect(&self, trace: usize, sample: usize) -> Option<Inspection> {
        let t = self.figure().data.get(trace)?;
        Some(Inspection {
            trace,
            name: t.name.clone(),
            sample,
            time: *t.x.get(sample)?,
            raw: *t.customdata.get(sample)?,
            displayed: *t.y.get(sample)?,
        })
    }

    /// Full-resolution sample nearest to time `x`.
    fn inspect_at(&self, trace: usize, x: f64) -> Option<Inspection> {
        let times = &self.figure().data.get(trace)?.x;
        if times.is_empty() {
            return None;
        }
        let right = times.partition_point(|&t| t < x).min(times.len() - 1);
        let sample = if right > 0 && (x - times[right - 1]).abs() <= (times[right] - x).abs() {
            right - 1
        } else {
            right
        };
        self.inspect(trace, sample)
    }
}

fn check_restyle(figure: &Figure, ys: &[Arc<[f64]>]) -> Result<()> {
    if ys.len() != figure.data.len() {
        return Err(StackError::InvalidState(format!(
            "restyle with {} series for {} traces",
            ys.len(),
            figure.data.len()
        )));
    }
    if let Some((t, y)) = figure.data.iter().zip(ys).find(|(t, y)| t.y.len() != y.len()) {
        return Err(StackError::InvalidState(format!(
            "restyle of {:?} with {} samples, trace has {}",
            t.name,
            y.len(),
            t.y.len()
        )));
    }
    Ok(())
}

fn apply_restyle(figure: &mut Figure, ys: Vec<Arc<[f64]>>) {
    for (trace, y) in figure.data.iter_mut().zip(ys) {
        trace.y = y;
    }
}

/// Reduces every trace to at most `max_points` per view window while the
/// figure keeps the full-resolution series for inspection. Until the
/// process-wide registration has happened, views come back unreduced.
#[derive(Debug, Clone)]
pub struct AdaptiveResampler {
    figure: Figure,
    reduction: Reduction,
    max_points: usize,
}

impl AdaptiveResampler {
    pub fn new(figure: Figure, reduction: Reduction, max_points: usize) -> Self {
        Self {
            figure,
            reduction,
            max_points: max_points.max(3),
        }
    }

    pub fn reduction(&self) -> Reduction {
        self.reduction
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }
}

impl ResamplingPort for AdaptiveResampler {
    fn register(&mut self) -> bool {
        register_resampler()
    }

    fn replace_figure(&mut self, figure: Figure) {
        self.figure = figure;
    }

    fn figure(&self) -> &Figure {
        &self.figure
    }

    fn restyle_y(&mut self, ys: Vec<Arc<[f64]>>) -> Result<()> {
        check_restyle(&self.figure, &ys)?;
        apply_restyle(&mut self.figure, ys);
        Ok(())
    }

    fn set_all_visible(&mut self, visible: bool) {
        for trace in &mut self.figure.data {
            trace.visible = visible;
        }
    }

    fn visible_points(&self, trace: usize, window: &ViewWindow) -> Option<ReducedSeries> {
        let t = self.figure.data.get(trace)?;
        if !is_resampler_registered() {
            return Some(downsampling::window_for_view(&t.x, &t.y, window.x_min, window.x_max));
        }
        Some(downsampling::downsample_for_view(
            &t.x,
            &t.y,
            window.x_min,
            window.x_max,
            self.max_points,
            self.reduction,
        ))
    }
}

/// Hands every sample in the window to the output surface.
#[derive(Debug, Clone)]
pub struct DirectRenderer {
    figure: Figure,
}

impl DirectRenderer {
    pub fn new(figure: Figure) -> Self {
        Self { figure }
    }
}

impl ResamplingPort for DirectRenderer {
    fn register(&mut self) -> bool {
        false
    }

    fn replace_figure(&mut self, figure: Figure) {
        self.figure = figure;
    }

    fn figure(&self) -> &Figure {
        &self.figure
    }

    fn restyle_y(&mut self, ys: Vec<Arc<[f64]>>) -> Result<()> {
        check_restyle(&self.figure, &ys)?;
        apply_restyle(&mut self.figure, ys);
        Ok(())
    }

    fn set_all_visible(&mut self, visible: bool) {
        for trace in &mut self.figure.data {
            trace.visible = visible;
        }
    }

    fn visible_points(&self, trace: usize, window: &ViewWindow) -> Option<ReducedSeries> {
        let t = self.figure.data.get(trace)?;
        Some(downsampling::window_for_view(&t.x, &t.y, window.x_min, window.x_max))
    }
}

/// The backend a session renders through. Each variant carries only what it needs.
#[derive(Debug, Clone)]
pub enum RenderingBackend {
    Resampled(AdaptiveResampler),
    Direct(DirectRenderer),
}

impl RenderingBackend {
    pub fn from_config(config: &ViewerConfig) -> Self {
        let figure = Figure::cleared(config);
        match config.backend {
            BackendKind::Resampled => RenderingBackend::Resampled(AdaptiveResampler::new(
                figure,
                config.reduction,
                config.max_display_points,
            )),
            BackendKind::Direct => RenderingBackend::Direct(DirectRenderer::new(figure)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            RenderingBackend::Resampled(_) => BackendKind::Resampled,
            RenderingBackend::Direct(_) => BackendKind::Direct,
        }
    }

    fn port(&self) -> &dyn ResamplingPort {
        match self {
            RenderingBackend::Resampled(r) => r,
            RenderingBackend::Direct(d) => d,
        }
    }

    fn port_mut(&mut self) -> &mut dyn ResamplingPort {
        match self {
            RenderingBackend::Resampled(r) => r,
            RenderingBackend::Direct(d) => d,
        }
    }
}

impl ResamplingPort for RenderingBackend {
    fn register(&mut self) -> bool {
        self.port_mut().register()
    }

    fn replace_figure(&mut self, figure: Figure) {
        self.port_mut().replace_figure(figure)
    }

    fn figure(&self) -> &Figure {
        self.port().figure()
    }

    fn restyle_y(&mut self, ys: Vec<Arc<[f64]>>) -> Result<()> {
        self.port_mut().restyle_y(ys)
    }

    fn set_all_visible(&mut self, visible: bool) {
        self.port_mut().set_all_visible(visible)
    }

    fn visible_points(&self, trace: usize, window: &ViewWindow) -> Option<ReducedSeries> {
        self.port().visible_points(trace, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::trace_builder::{TraceDescriptor, TraceSet};

    fn long_figure(n: usize) -> Figure {
        let times: Arc<[f64]> = (0..n).map(|i| i as f64 / 100.0).collect();
        let raw: Arc<[f64]> = (0..n).map(|i| ((i * 7919) % 101) as f64 - 50.0).collect();
        let y: Arc<[f64]> = raw.iter().map(|v| v * 2.0 + 30.0).collect();
        let set = TraceSet {
            traces: vec![TraceDescriptor {
                name: "Cz".into(),
                channel_index: 0,
                offset: 30.0,
                raw,
                y,
            }],
            ..Default::default()
        };
        Figure::from_trace_set(set, &times, &ViewerConfig::default())
    }

    #[test]
    fn registration_is_idempotent() {
        register_resampler();
        assert!(is_resampler_registered());
        assert!(!register_resampler());
        let mut backend = RenderingBackend::from_config(&ViewerConfig::default());
        assert!(!backend.register());
        assert!(is_resampler_registered());
    }

    #[test]
    fn reduced_view_inspects_raw_values() {
        let mut backend = AdaptiveResampler::new(Figure::cleared(&ViewerConfig::default()), Reduction::MinMax, 100);
        backend.replace_figure(long_figure(50_000));
        backend.register();
        assert!(is_resampler_registered());
        let reduced = backend.visible_points(0, &ViewWindow::everything()).unwrap();
        assert!(reduced.len() <= 100);

        let raw = &backend.figure().data[0].customdata;
        for &i in &reduced.indices {
            let hit = backend.inspect(0, i).unwrap();
            assert_eq!(hit.raw, raw[i]);
            assert_eq!(hit.displayed, raw[i] * 2.0 + 30.0);
        }
    }

    #[test]
    fn inspect_at_picks_nearest_sample() {
        let backend = DirectRenderer::new(long_figure(10));
        let hit = backend.inspect_at(0, 0.034).unwrap();
        assert_eq!(hit.sample, 3);
        let hit = backend.inspect_at(0, 0.036).unwrap();
        assert_eq!(hit.sample, 4);
        assert_eq!(backend.inspect_at(0, 99.0).unwrap().sample, 9);
        assert!(backend.inspect_at(1, 0.0).is_none());
    }

    #[test]
    fn direct_renderer_keeps_every_sample() {
        let backend = DirectRenderer::new(long_figure(5000));
        let pts = backend.visible_points(0, &ViewWindow::new(10.0, 20.0)).unwrap();
        assert_eq!(pts.len(), 1003);
    }

    #[test]
    fn restyle_rejects_mismatched_lengths() {
        let mut backend = DirectRenderer::new(long_figure(10));
        let before = backend.figure().clone();
        let err = backend.restyle_y(vec![Arc::from(vec![0.0; 3])]).unwrap_err();
        assert!(matches!(err, StackError::InvalidState(_)));
        assert_eq!(backend.figure(), &before);
        assert!(backend.restyle_y(Vec::new()).is_err());
    }

    #[test]
    fn show_hide_all_restyles_visibility() {
        let mut backend = RenderingBackend::from_config(&ViewerConfig::default());
        backend.replace_figure(long_figure(10));
        backend.set_all_visible(false);
        assert!(backend.figure().data.iter().all(|t| !t.visible));
        backend.set_all_visible(true);
        assert!(backend.figure().data.iter().all(|t| t.visible));
    }
}
