use crate::processing::hover::{self, HoverTree};
use crate::render::figure::Figure;
use crate::render::plot_interaction::{self, PlotViewState};
use crate::render::resampler::{RenderingBackend, ResamplingPort};
use crate::state::session::{TimeSeriesSession, UiEvent};
use crate::state::theme::{color32, Theme};

/// Normalized distance under which the pointer counts as hovering a point.
const HOVER_RADIUS: f64 = 0.03;

fn toolbar_btn(ui: &mut egui::Ui, label: &str) -> egui::Response {
    ui.add(egui::Button::new(label).min_size(egui::vec2(0.0, 26.0)))
}

/// The stacked chart: toolbar, traces, channel labels, legend and hover
/// readout. Returns the figure-level event the user triggered, if any.
pub fn show_chart_panel(
    session: &TimeSeriesSession,
    view: &mut PlotViewState,
    ui: &mut egui::Ui,
    theme: &Theme,
) -> Option<UiEvent> {
    let mut event = None;

    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(10))
        .corner_radius(egui::CornerRadius::same(8))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;
                if toolbar_btn(ui, "Show All").on_hover_text("Show every trace").clicked() {
                    event = Some(UiEvent::ShowAllTraces);
                }
                if toolbar_btn(ui, "Hide All").on_hover_text("Hide every trace").clicked() {
                    event = Some(UiEvent::HideAllTraces);
                }
                ui.separator();
                if toolbar_btn(ui, "Reset View").on_hover_text("Fit the whole recording").clicked() {
                    view.auto_fit = true;
                }
                let figure = session.rendered_figure();
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(format!(
                            "{} traces | step {} | amplitude x{}",
                            figure.data.len(),
                            plot_interaction::format_tick_value(figure.layout.vertical_step),
                            plot_interaction::format_tick_value(session.scaling().amplitude()),
                        ))
                        .weak(),
                    );
                });
            });
            ui.add_space(4.0);
            draw_chart(session, view, ui, theme);
        });

    event
}

fn draw_chart(session: &TimeSeriesSession, view: &mut PlotViewState, ui: &mut egui::Ui, theme: &Theme) {
    let figure = session.rendered_figure();
    if figure.is_empty() {
        ui.add_space(40.0);
        ui.vertical_centered(|ui| {
            if session.buffer().is_none() {
                ui.label(egui::RichText::new("No recording loaded").strong().size(16.0));
                ui.add_space(6.0);
                ui.label(egui::RichText::new("Open a CSV file or drag-and-drop one onto the window.").weak());
            } else {
                ui.label(egui::RichText::new("No channels selected").strong().size(16.0));
            }
        });
        ui.add_space(40.0);
        return;
    }

    if view.auto_fit {
        view.fit_to_figure(figure);
        view.auto_fit = false;
    }

    let left_margin = (-figure.layout.annotations.first().map_or(-70.0, |a| a.x_shift)).max(0.0) + 40.0;
    let bottom_margin = 40.0_f32;
    let top_margin = 10.0_f32;
    let right_margin = 20.0_f32;

    let size = ui.available_size();
    let total_rect = ui.allocate_space(egui::vec2(size.x, size.y.max(200.0))).1;
    let plot_rect = egui::Rect::from_min_max(
        egui::pos2(total_rect.left() + left_margin, total_rect.top() + top_margin),
        egui::pos2(total_rect.right() - right_margin, total_rect.bottom() - bottom_margin),
    );

    let response = ui.interact(plot_rect, ui.id().with("stacked_chart"), egui::Sense::click_and_drag());
    view.handle_input(&response, plot_rect);

    let painter = ui.painter_at(total_rect);
    let plot_painter = painter.with_clip_rect(plot_rect);
    painter.rect_filled(plot_rect, 0.0, theme.plot_bg());

    draw_grid(&plot_painter, view, plot_rect, theme);
    let trees = draw_traces(&plot_painter, session.backend(), view, plot_rect);
    draw_axes(&painter, figure, view, plot_rect, total_rect);
    if figure.layout.showlegend {
        draw_legend(&painter, figure, plot_rect);
    }
    if let Some(pos) = response.hover_pos() {
        draw_hover(&painter, session.backend(), &trees, view, plot_rect, pos);
    }
}

fn draw_grid(painter: &egui::Painter, view: &PlotViewState, plot_rect: egui::Rect, theme: &Theme) {
    let grid = theme.grid_color();
    for (x, is_major) in plot_interaction::compute_grid_lines(view.x_min, view.x_max) {
        let sx = view.data_to_screen(x, view.y_min, plot_rect).x;
        let stroke = if is_major {
            egui::Stroke::new(1.0, grid)
        } else {
            egui::Stroke::new(0.5, grid.gamma_multiply(0.5))
        };
        painter.vline(sx, plot_rect.y_range(), stroke);
    }
}

/// Paint every visible trace from the backend's reduced points. Returns one
/// hover index per painted trace.
fn draw_traces(
    painter: &egui::Painter,
    backend: &RenderingBackend,
    view: &PlotViewState,
    plot_rect: egui::Rect,
) -> Vec<HoverTree> {
    let window = view.window();
    let x_span = view.x_max - view.x_min;
    let y_span = view.y_max - view.y_min;
    let mut trees = Vec::new();

    for (i, trace) in backend.figure().data.iter().enumerate() {
        if !trace.visible {
            continue;
        }
        let Some(points) = backend.visible_points(i, &window) else {
            continue;
        };
        let screen: Vec<egui::Pos2> = points
            .x
            .iter()
            .zip(points.y.iter())
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(&x, &y)| view.data_to_screen(x, y, plot_rect))
            .collect();
        if screen.len() >= 2 {
            painter.add(egui::Shape::line(
                screen,
                egui::Stroke::new(trace.line_width, color32(trace.color)),
            ));
        }
        trees.push(HoverTree::build(i, &points.x, &points.y, &points.indices, x_span, y_span));
    }
    trees
}

fn draw_axes(
    painter: &egui::Painter,
    figure: &Figure,
    view: &PlotViewState,
    plot_rect: egui::Rect,
    total_rect: egui::Rect,
) {
    let text_color = painter.ctx().style().visuals.text_color();
    let dim_color = text_color.gamma_multiply(0.6);

    painter.rect_stroke(plot_rect, 0.0, egui::Stroke::new(1.0, dim_color), egui::StrokeKind::Outside);

    for (x, is_major) in plot_interaction::compute_grid_lines(view.x_min, view.x_max) {
        if !is_major {
            continue;
        }
        let sx = view.data_to_screen(x, view.y_min, plot_rect).x;
        painter.text(
            egui::pos2(sx, plot_rect.bottom() + 4.0),
            egui::Align2::CENTER_TOP,
            plot_interaction::format_tick_value(x),
            egui::FontId::proportional(10.0),
            dim_color,
        );
    }
    painter.text(
        egui::pos2(plot_rect.center().x, total_rect.bottom() - 4.0),
        egui::Align2::CENTER_BOTTOM,
        "Time (s)",
        egui::FontId::proportional(12.0),
        text_color,
    );

    // Outside ticks, no labels: the channel names stand in for them.
    let tick_len = figure.layout.yaxis.ticklen;
    for &tick in figure.tick_positions() {
        let sy = view.y_to_screen(tick, plot_rect);
        if sy < plot_rect.top() || sy > plot_rect.bottom() {
            continue;
        }
        painter.hline(
            (plot_rect.left() - tick_len)..=plot_rect.left(),
            sy,
            egui::Stroke::new(1.0, dim_color),
        );
    }

    for annotation in &figure.layout.annotations {
        let sy = view.y_to_screen(annotation.y, plot_rect);
        if sy < plot_rect.top() || sy > plot_rect.bottom() {
            continue;
        }
        let sx = plot_rect.left() + plot_rect.width() * annotation.x as f32 + annotation.x_shift;
        painter.text(
            egui::pos2(sx, sy),
            egui::Align2::CENTER_CENTER,
            &annotation.text,
            egui::FontId::proportional(11.0),
            text_color,
        );
    }
}

fn draw_legend(painter: &egui::Painter, figure: &Figure, plot_rect: egui::Rect) {
    let entries: Vec<_> = figure
        .legend_order()
        .iter()
        .filter_map(|name| figure.trace_by_name(name))
        .collect();
    if entries.is_empty() {
        return;
    }

    let text_color = painter.ctx().style().visuals.text_color();
    let bg_color = painter.ctx().style().visuals.window_fill;
    let font = egui::FontId::proportional(11.0);
    let x = plot_rect.right() - 8.0;
    let mut y = plot_rect.top() + 8.0;

    let max_width = entries
        .iter()
        .map(|t| painter.layout_no_wrap(t.name.clone(), font.clone(), text_color).rect.width())
        .fold(0.0_f32, f32::max);
    let legend_width = max_width + 24.0;
    let legend_rect = egui::Rect::from_min_size(
        egui::pos2(x - legend_width - 4.0, y - 4.0),
        egui::vec2(legend_width + 8.0, entries.len() as f32 * 16.0 + 8.0),
    );
    painter.rect_filled(legend_rect, 4.0, bg_color.gamma_multiply(0.85));
    painter.rect_stroke(
        legend_rect,
        4.0,
        egui::Stroke::new(0.5, text_color.gamma_multiply(0.3)),
        egui::StrokeKind::Outside,
    );

    for trace in entries {
        let (swatch, label) = if trace.visible {
            (color32(trace.color), text_color)
        } else {
            (color32(trace.color).gamma_multiply(0.25), text_color.gamma_multiply(0.4))
        };
        painter.rect_filled(
            egui::Rect::from_min_size(egui::pos2(x - legend_width, y), egui::vec2(12.0, 12.0)),
            2.0,
            swatch,
        );
        painter.text(
            egui::pos2(x - legend_width + 16.0, y + 6.0),
            egui::Align2::LEFT_CENTER,
            &trace.name,
            font.clone(),
            label,
        );
        y += 16.0;
    }
}

/// Highlight the nearest displayed point and show the raw sample behind it.
fn draw_hover(
    painter: &egui::Painter,
    backend: &RenderingBackend,
    trees: &[HoverTree],
    view: &PlotViewState,
    plot_rect: egui::Rect,
    mouse_pos: egui::Pos2,
) {
    let (qx, qy) = view.screen_to_data(mouse_pos, plot_rect);
    let Some(hit) = hover::nearest_across(trees, qx, qy) else {
        return;
    };
    if hit.distance > HOVER_RADIUS {
        return;
    }
    let Some(inspection) = backend.inspect(hit.trace, hit.sample) else {
        return;
    };
    let color = backend
        .figure()
        .data
        .get(hit.trace)
        .map_or(egui::Color32::WHITE, |t| color32(t.color));

    let pos = view.data_to_screen(inspection.time, inspection.displayed, plot_rect);
    painter.circle_filled(pos, 5.0, color);
    painter.circle_stroke(pos, 5.0, egui::Stroke::new(1.0, egui::Color32::WHITE));

    let text = format!(
        "{}: t={:.3}, value={}",
        inspection.name,
        inspection.time,
        plot_interaction::format_tick_value(inspection.raw)
    );
    let font = egui::FontId::proportional(11.0);
    let text_color = painter.ctx().style().visuals.text_color();
    let galley = painter.layout_no_wrap(text.clone(), font.clone(), text_color);
    let tooltip_pos = egui::pos2(pos.x + 10.0, pos.y - galley.rect.height() - 8.0);
    let bg_rect = egui::Rect::from_min_size(
        egui::pos2(tooltip_pos.x - 4.0, tooltip_pos.y - 2.0),
        egui::vec2(galley.rect.width() + 8.0, galley.rect.height() + 4.0),
    );
    let bg_color = painter.ctx().style().visuals.window_fill;
    painter.rect_filled(bg_rect, 3.0, bg_color.gamma_multiply(0.9));
    painter.rect_stroke(bg_rect, 3.0, egui::Stroke::new(0.5, color), egui::StrokeKind::Outside);
    painter.text(tooltip_pos, egui::Align2::LEFT_TOP, text, font, color);
}
