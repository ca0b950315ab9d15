/// Theme system: Light and Dark color sets for the viewer chrome
///
/// The canvas itself is painted on a neutral backdrop in both themes so
/// raster gray levels read the same regardless of the chrome.

use crate::input::InteractionMode;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AppTheme {
    Light,
    Dark,
}

impl AppTheme {
    pub fn label(&self) -> &'static str {
        match self {
            AppTheme::Light => "☀ Light",
            AppTheme::Dark => "🌙 Dark",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            AppTheme::Light => AppTheme::Dark,
            AppTheme::Dark => AppTheme::Light,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub panel_fill: egui::Color32,
    pub window_fill: egui::Color32,
    pub faint_bg: egui::Color32,

    pub widget_inactive_bg: egui::Color32,
    pub widget_hovered_stroke: egui::Color32,
    pub widget_active_bg: egui::Color32,

    pub selection_bg: egui::Color32,
    pub selection_stroke: egui::Color32,

    pub text_secondary: egui::Color32,
    pub text_muted: egui::Color32,

    pub accent: egui::Color32,
    pub warning: egui::Color32,

    pub canvas_bg: egui::Color32,
    pub histogram_line: egui::Color32,

    pub status_bar_bg: egui::Color32,
    pub status_text: egui::Color32,

    pub is_dark: bool,
}

impl ThemeColors {
    pub fn from_theme(theme: AppTheme) -> Self {
        match theme {
            AppTheme::Light => Self::light(),
            AppTheme::Dark => Self::dark(),
        }
    }

    fn light() -> Self {
        Self {
            panel_fill: egui::Color32::from_rgb(0xF7, 0xF7, 0xF8),
            window_fill: egui::Color32::from_rgb(0xFF, 0xFF, 0xFF),
            faint_bg: egui::Color32::from_rgb(0xF0, 0xF1, 0xF3),

            widget_inactive_bg: egui::Color32::from_rgb(0xE3, 0xE5, 0xE8),
            widget_hovered_stroke: egui::Color32::from_rgb(0x5B, 0x9B, 0xD5),
            widget_active_bg: egui::Color32::from_rgb(0x3B, 0x7D, 0xC0),

            selection_bg: egui::Color32::from_rgba_premultiplied(0x3B, 0x7D, 0xC0, 0x40),
            selection_stroke: egui::Color32::from_rgb(0x3B, 0x7D, 0xC0),

            text_secondary: egui::Color32::from_rgb(0x44, 0x48, 0x52),
            text_muted: egui::Color32::from_rgb(0x88, 0x8C, 0x94),

            accent: egui::Color32::from_rgb(0x3B, 0x7D, 0xC0),
            warning: egui::Color32::from_rgb(0xB8, 0x8B, 0x00),

            canvas_bg: egui::Color32::from_gray(0x40),
            histogram_line: egui::Color32::from_rgb(0x1A, 0x47, 0x80),

            status_bar_bg: egui::Color32::from_rgb(0xF0, 0xF1, 0xF3),
            status_text: egui::Color32::from_rgb(0x44, 0x48, 0x52),

            is_dark: false,
        }
    }

    fn dark() -> Self {
        Self {
            panel_fill: egui::Color32::from_rgb(0x1B, 0x1D, 0x22),
            window_fill: egui::Color32::from_rgb(0x22, 0x25, 0x2B),
            faint_bg: egui::Color32::from_rgb(0x26, 0x29, 0x30),

            widget_inactive_bg: egui::Color32::from_rgb(0x2E, 0x32, 0x3A),
            widget_hovered_stroke: egui::Color32::from_rgb(0x6C, 0xB4, 0xF0),
            widget_active_bg: egui::Color32::from_rgb(0x2F, 0x6F, 0xB0),

            selection_bg: egui::Color32::from_rgba_premultiplied(0x2F, 0x6F, 0xB0, 0x50),
            selection_stroke: egui::Color32::from_rgb(0x6C, 0xB4, 0xF0),

            text_secondary: egui::Color32::from_rgb(0xB8, 0xBC, 0xC6),
            text_muted: egui::Color32::from_rgb(0x7A, 0x7E, 0x88),

            accent: egui::Color32::from_rgb(0x6C, 0xB4, 0xF0),
            warning: egui::Color32::from_rgb(0xFF, 0xC8, 0x40),

            canvas_bg: egui::Color32::from_gray(0x28),
            histogram_line: egui::Color32::from_rgb(0x6C, 0xB4, 0xF0),

            status_bar_bg: egui::Color32::from_rgb(0x16, 0x18, 0x1C),
            status_text: egui::Color32::from_rgb(0xB8, 0xBC, 0xC6),

            is_dark: true,
        }
    }
}

pub fn apply_theme(ctx: &egui::Context, theme: AppTheme) {
    let c = ThemeColors::from_theme(theme);

    let mut visuals = if c.is_dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };

    visuals.panel_fill = c.panel_fill;
    visuals.window_fill = c.window_fill;
    visuals.faint_bg_color = c.faint_bg;

    visuals.widgets.noninteractive.corner_radius = egui::CornerRadius::same(3);
    visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, c.text_secondary);

    visuals.widgets.inactive.bg_fill = c.widget_inactive_bg;
    visuals.widgets.inactive.corner_radius = egui::CornerRadius::same(4);

    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, c.widget_hovered_stroke);
    visuals.widgets.active.bg_fill = c.widget_active_bg;

    visuals.selection.bg_fill = c.selection_bg;
    visuals.selection.stroke = egui::Stroke::new(1.5, c.selection_stroke);

    ctx.set_visuals(visuals);
}

/// Badge for the status bar: (name, hint, color) while a mode is active
pub fn mode_label(
    mode: InteractionMode,
    draw_armed: bool,
) -> Option<(&'static str, &'static str, egui::Color32)> {
    match mode {
        InteractionMode::Drawing => Some((
            "✏ EDIT",
            "Release to commit · Esc to cancel",
            egui::Color32::from_rgb(0x00, 0xAA, 0x55),
        )),
        InteractionMode::Panning => Some((
            "✋ PAN",
            "Drag to move the view",
            egui::Color32::from_rgb(0x88, 0x88, 0xCC),
        )),
        InteractionMode::Adjusting => Some((
            "◐ ADJUST",
            "Levels recomputed from the source",
            egui::Color32::from_rgb(0xCC, 0x88, 0x00),
        )),
        InteractionMode::Idle if draw_armed => Some((
            "▭ DRAW TAG",
            "Drag a rectangle · Esc to cancel",
            egui::Color32::from_rgb(0xFF, 0x44, 0x44),
        )),
        InteractionMode::Idle => None,
    }
}
