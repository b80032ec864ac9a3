use crate::render::figure::Figure;
use crate::render::resampler::ViewWindow;

/// Pan/zoom state of the chart area, in data coordinates.
#[derive(Debug, Clone)]
pub struct PlotViewState {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// Refit to the figure on the next frame.
    pub auto_fit: bool,
}

impl Default for PlotViewState {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
            auto_fit: true,
        }
    }
}

impl PlotViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The x range handed to the resampling backend.
    pub fn window(&self) -> ViewWindow {
        ViewWindow::new(self.x_min, self.x_max)
    }

    /// Fit to the whole recording on x and to the stack on y.
    ///
    /// The y range reaches half a vertical step below the bottom trace and
    /// above the top one, or the data extent if that is wider.
    pub fn fit_to_figure(&mut self, figure: &Figure) {
        let Some(first) = figure.data.first() else {
            return;
        };
        let (Some(&x_min), Some(&x_max)) = (first.x.first(), first.x.last()) else {
            return;
        };

        let ticks = figure.tick_positions();
        let half_step = figure.layout.vertical_step * 0.5;
        let mut y_min = ticks.first().map_or(f64::INFINITY, |t| t - half_step);
        let mut y_max = ticks.last().map_or(f64::NEG_INFINITY, |t| t + half_step);
        if let Some((lo, hi)) = figure.y_extent() {
            y_min = y_min.min(lo);
            y_max = y_max.max(hi);
        }
        if !y_min.is_finite() || !y_max.is_finite() {
            return;
        }

        let y_pad = (y_max - y_min) * 0.02;
        let y_pad = if y_pad.abs() < 1e-15 { 0.5 } else { y_pad };
        let x_pad = if (x_max - x_min).abs() < 1e-15 { 0.5 } else { 0.0 };

        self.x_min = x_min - x_pad;
        self.x_max = x_max + x_pad;
        self.y_min = y_min - y_pad;
        self.y_max = y_max + y_pad;
    }

    /// Drag pans, scroll zooms around the pointer, double-click refits.
    /// Holding Shift while scrolling zooms the time axis only.
    pub fn handle_input(&mut self, response: &egui::Response, rect: egui::Rect) {
        if response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_delta();
            let dx = -(delta.x as f64) * (self.x_max - self.x_min) / rect.width() as f64;
            let dy = (delta.y as f64) * (self.y_max - self.y_min) / rect.height() as f64;
            self.x_min += dx;
            self.x_max += dx;
            self.y_min += dy;
            self.y_max += dy;
            self.auto_fit = false;
        }

        let (scroll_delta, shift) = response.ctx.input(|i| {
            let delta = if response.hovered() {
                // Shift turns vertical wheel motion into horizontal on some platforms.
                i.smooth_scroll_delta.y + i.smooth_scroll_delta.x
            } else {
                0.0
            };
            (delta, i.modifiers.shift)
        });

        if scroll_delta.abs() > 0.0 {
            let zoom_factor = (1.0 - (scroll_delta as f64) * 0.001).clamp(0.5, 2.0);
            if let Some(mouse_pos) = response.hover_pos() {
                let (cx, cy) = self.screen_to_data(mouse_pos, rect);
                self.x_min = cx + (self.x_min - cx) * zoom_factor;
                self.x_max = cx + (self.x_max - cx) * zoom_factor;
                if !shift {
                    self.y_min = cy + (self.y_min - cy) * zoom_factor;
                    self.y_max = cy + (self.y_max - cy) * zoom_factor;
                }
            }
            self.auto_fit = false;
        }

        if response.double_clicked() {
            self.auto_fit = true;
        }
    }

    pub fn screen_to_data(&self, pos: egui::Pos2, rect: egui::Rect) -> (f64, f64) {
        let t_x = (pos.x - rect.left()) as f64 / rect.width() as f64;
        let t_y = 1.0 - (pos.y - rect.top()) as f64 / rect.height() as f64;
        (
            self.x_min + t_x * (self.x_max - self.x_min),
            self.y_min + t_y * (self.y_max - self.y_min),
        )
    }

    pub fn data_to_screen(&self, x: f64, y: f64, rect: egui::Rect) -> egui::Pos2 {
        let t_x = (x - self.x_min) / (self.x_max - self.x_min);
        let t_y = 1.0 - (y - self.y_min) / (self.y_max - self.y_min);
        egui::Pos2::new(
            rect.left() + (t_x as f32) * rect.width(),
            rect.top() + (t_y as f32) * rect.height(),
        )
    }

    pub fn y_to_screen(&self, y: f64, rect: egui::Rect) -> f32 {
        let t_y = 1.0 - (y - self.y_min) / (self.y_max - self.y_min);
        rect.top() + (t_y as f32) * rect.height()
    }
}

/// Nice grid line positions for an axis range, as (value, is_major) pairs.
pub fn compute_grid_lines(min: f64, max: f64) -> Vec<(f64, bool)> {
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return Vec::new();
    }

    let raw_step = range / 8.0;
    let order = 10f64.powf(raw_step.log10().floor());
    let normalized = raw_step / order;

    let nice_step = if normalized <= 1.0 {
        order
    } else if normalized <= 2.0 {
        2.0 * order
    } else if normalized <= 5.0 {
        5.0 * order
    } else {
        10.0 * order
    };
    let minor_step = nice_step / 5.0;

    let start = (min / minor_step).floor() as i64;
    let end = (max / minor_step).ceil() as i64;

    (start..=end)
        .map(|i| i as f64 * minor_step)
        .filter(|&val| val >= min && val <= max)
        .map(|val| {
            let is_major = ((val / nice_step).round() * nice_step - val).abs() < nice_step * 0.01;
            (val, is_major)
        })
        .collect()
}

/// Time-axis tick label.
pub fn format_tick_value(val: f64) -> String {
    if val.abs() >= 1e6 || (val != 0.0 && val.abs() < 1e-3) {
        format!("{val:.2e}")
    } else if val == 0.0 {
        "0".to_string()
    } else {
        let s = format!("{val:.6}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ViewerConfig;
    use crate::render::trace_builder::{TraceDescriptor, TraceSet};

    #[test]
    fn fit_covers_the_stack() {
        let times: Arc<[f64]> = Arc::from(vec![0.0, 1.0, 2.0]);
        let trace = |name: &str, offset: f64| TraceDescriptor {
            name: name.into(),
            channel_index: 0,
            offset,
            raw: Arc::from(vec![0.0, 1.0, -1.0]),
            y: Arc::from(vec![offset, offset + 1.0, offset - 1.0]),
        };
        let set = TraceSet {
            traces: vec![trace("Oz", 0.0), trace("Cz", 10.0)],
            ticks: vec![0.0, 10.0],
            vertical_step: 10.0,
            ..Default::default()
        };
        let figure = Figure::from_trace_set(set, &times, &ViewerConfig::default());

        let mut view = PlotViewState::new();
        view.fit_to_figure(&figure);
        assert_eq!((view.x_min, view.x_max), (0.0, 2.0));
        assert!(view.y_min < -5.0 + 1e-9 && view.y_min > -6.0);
        assert!(view.y_max > 15.0 - 1e-9 && view.y_max < 16.0);
        assert_eq!(view.window(), ViewWindow::new(0.0, 2.0));
    }

    #[test]
    fn fit_ignores_empty_figure() {
        let mut view = PlotViewState::new();
        view.fit_to_figure(&Figure::cleared(&ViewerConfig::default()));
        assert_eq!((view.x_min, view.x_max), (0.0, 1.0));
    }

    #[test]
    fn screen_round_trip() {
        let view = PlotViewState {
            x_min: 0.0,
            x_max: 10.0,
            y_min: -5.0,
            y_max: 5.0,
            auto_fit: false,
        };
        let rect = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(100.0, 100.0));
        let p = view.data_to_screen(5.0, 0.0, rect);
        assert_eq!(p, egui::pos2(50.0, 50.0));
        let (x, y) = view.screen_to_data(p, rect);
        assert!((x - 5.0).abs() < 1e-9 && y.abs() < 1e-9);
    }

    #[test]
    fn grid_and_labels() {
        let lines = compute_grid_lines(0.0, 10.0);
        assert!(lines.iter().any(|&(v, major)| v == 0.0 && major));
        assert!(compute_grid_lines(1.0, 1.0).is_empty());
        assert_eq!(format_tick_value(2.5), "2.5");
        assert_eq!(format_tick_value(0.0), "0");
        assert_eq!(format_tick_value(3.0), "3");
    }
}
