use crate::processing::statistics::SeriesStats;
use crate::state::session::{TimeSeriesSession, UiEvent};
use crate::state::theme::{color32, color_for_index};

/// Channel picker: dimension filter, select/deselect all, one checkbox per
/// channel and the submit button. Checkbox changes only emit toggles; nothing
/// is redrawn until "Submit selection" is pressed.
pub fn show_channel_panel(ui: &mut egui::Ui, session: &TimeSeriesSession) -> Vec<UiEvent> {
    let mut events = Vec::new();
    let registry = session.registry();

    ui.label(egui::RichText::new("Channels").strong());
    ui.label(
        egui::RichText::new(format!(
            "{} of {} selected",
            registry.current_selection().len(),
            registry.len()
        ))
        .weak(),
    );
    ui.add_space(6.0);

    let tags = registry.tags();
    if !tags.is_empty() {
        ui.label("Dimension");
        let current = registry.active_filter().map(str::to_string);
        let mut chosen = current.clone();
        egui::ComboBox::from_id_salt("dimension_filter")
            .selected_text(current.clone().unwrap_or_else(|| "All".to_string()))
            .width(160.0)
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut chosen, None, "All");
                for tag in &tags {
                    ui.selectable_value(&mut chosen, Some(tag.clone()), tag);
                }
            });
        if chosen != current {
            events.push(UiEvent::DimensionFilterChanged(chosen));
        }
        ui.add_space(6.0);
    }

    ui.horizontal(|ui| {
        if ui.button("Select all").clicked() {
            events.push(UiEvent::SelectAll);
        }
        if ui.button("Deselect all").clicked() {
            events.push(UiEvent::DeselectAll);
        }
    });
    ui.add_space(4.0);

    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(8))
        .show(ui, |ui| {
            egui::ScrollArea::vertical()
                .max_height((ui.available_height() - 60.0).max(120.0))
                .show(ui, |ui| {
                    for ch in registry.channels() {
                        let mut visible = ch.visible;
                        let passes = registry
                            .active_filter()
                            .map_or(true, |f| ch.tag.as_deref() == Some(f));
                        ui.horizontal(|ui| {
                            let (swatch, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                            ui.painter().rect_filled(swatch, 2.0, color32(color_for_index(ch.index)));

                            let text = match &ch.tag {
                                Some(tag) => format!("{} ({tag})", ch.name),
                                None => ch.name.clone(),
                            };
                            let text = if passes {
                                egui::RichText::new(text)
                            } else {
                                egui::RichText::new(text).weak()
                            };
                            let response = ui.checkbox(&mut visible, text).on_hover_ui(|ui| {
                                let stats = session
                                    .buffer()
                                    .and_then(|b| b.row(ch.index))
                                    .and_then(|row| SeriesStats::compute(row));
                                match stats {
                                    Some(stats) => ui.label(stats.report(&ch.name)),
                                    None => ui.label(format!("{}: no finite samples", ch.name)),
                                };
                            });
                            if response.changed() {
                                events.push(UiEvent::ChannelToggled {
                                    name: ch.name.clone(),
                                    visible,
                                });
                            }
                        });
                    }
                });
        });

    ui.add_space(8.0);
    let submit = egui::Button::new(egui::RichText::new("Submit selection").strong())
        .min_size(egui::vec2(160.0, 30.0));
    if ui.add_enabled(session.buffer().is_some(), submit).clicked() {
        events.push(UiEvent::SubmitSelection);
    }

    events
}
