use egui::{Color32, Visuals};
use serde::{Deserialize, Serialize};

/// Trace colors, cycled by channel index.
pub const COLOR_PALETTE: [[u8; 4]; 10] = [
    [31, 119, 180, 255],  // Blue
    [255, 127, 14, 255],  // Orange
    [44, 160, 44, 255],   // Green
    [214, 39, 40, 255],   // Red
    [148, 103, 189, 255], // Purple
    [140, 86, 75, 255],   // Brown
    [227, 119, 194, 255], // Pink
    [127, 127, 127, 255], // Gray
    [188, 189, 34, 255],  // Olive
    [23, 190, 207, 255],  // Cyan
];

pub fn color_for_index(index: usize) -> [u8; 4] {
    COLOR_PALETTE[index % COLOR_PALETTE.len()]
}

pub fn color32(c: [u8; 4]) -> Color32 {
    Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn visuals(&self) -> Visuals {
        match self {
            Theme::Dark => Visuals::dark(),
            Theme::Light => Visuals::light(),
        }
    }

    pub fn plot_bg(&self) -> Color32 {
        match self {
            Theme::Dark => Color32::from_rgb(20, 20, 20),
            Theme::Light => Color32::from_rgb(255, 255, 255),
        }
    }

    pub fn grid_color(&self) -> Color32 {
        match self {
            Theme::Dark => Color32::from_rgba_premultiplied(100, 100, 100, 60),
            Theme::Light => Color32::from_rgba_premultiplied(180, 180, 180, 80),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Dark => "Dark",
            Theme::Light => "Light",
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        // The reference figure template is white.
        Theme::Light
    }
}
