/// Layer panel: image info, layer list, adjustment sliders and histogram

use egui_plot::{Line, Plot, PlotPoints};

use crate::gui::theme::ThemeColors;
use crate::pipeline::adjustment::{AdjustField, AdjustmentParams, BRIGHTNESS_RANGE, CONTRAST_RANGE};
use crate::scene::layers::LayerKind;
use crate::viewer::{Viewer, ViewerAction};

/// Slider values mirrored from the viewer each frame
#[derive(Debug, Clone)]
pub struct LayerPanelState {
    pub params: AdjustmentParams,
    pub show_histogram: bool,
    pub log_scale_histogram: bool,
}

impl Default for LayerPanelState {
    fn default() -> Self {
        Self {
            params: AdjustmentParams::default(),
            show_histogram: true,
            log_scale_histogram: false,
        }
    }
}

/// Actions triggered by the layer panel
#[derive(Debug, Clone, PartialEq)]
pub enum LayerPanelAction {
    SetSelection(Vec<LayerKind>),
    CreateLogLayer,
    ClearLogLayer,
    BeginAdjust,
    Adjust(AdjustField),
    EndAdjust,
    ResetAdjustment,
}

impl From<LayerPanelAction> for ViewerAction {
    fn from(action: LayerPanelAction) -> Self {
        match action {
            LayerPanelAction::SetSelection(kinds) => ViewerAction::SetLayerSelection(kinds),
            LayerPanelAction::CreateLogLayer => ViewerAction::CreateLogLayer,
            LayerPanelAction::ClearLogLayer => ViewerAction::ClearLogLayer,
            LayerPanelAction::BeginAdjust => ViewerAction::BeginAdjust,
            LayerPanelAction::Adjust(field) => ViewerAction::Adjust(field),
            LayerPanelAction::EndAdjust => ViewerAction::EndAdjust,
            LayerPanelAction::ResetAdjustment => ViewerAction::ResetAdjustment,
        }
    }
}

/// Render the left panel; a single slider drag can emit several actions
pub fn show_layer_panel(
    ui: &mut egui::Ui,
    state: &mut LayerPanelState,
    viewer: &Viewer,
    colors: &ThemeColors,
) -> Vec<LayerPanelAction> {
    let mut actions = Vec::new();
    state.params = *viewer.params();

    ui.vertical_centered(|ui| {
        ui.heading("🗂 Layers");
    });
    ui.separator();

    let Some(info) = viewer.info() else {
        ui.add_space(12.0);
        ui.label(
            egui::RichText::new("Open an image to begin.")
                .size(12.5)
                .color(colors.text_muted),
        );
        ui.add_space(4.0);
        ui.label(
            egui::RichText::new("Drag & drop or File → Open")
                .size(12.0)
                .color(colors.text_muted),
        );
        return actions;
    };

    ui.label(egui::RichText::new(&info.file_name).strong());
    ui.label(
        egui::RichText::new(info.summary())
            .size(11.5)
            .color(colors.text_secondary),
    );
    ui.add_space(6.0);

    // Layer list: Base is always drawn and not listed
    let layers = viewer.layers();
    if layers.available().is_empty() {
        ui.label(
            egui::RichText::new("No overlay layers yet")
                .size(11.5)
                .color(colors.text_muted),
        );
    }
    let mut selection_changed = false;
    let mut selection: Vec<LayerKind> = layers.selected().collect();
    for &kind in layers.available() {
        let mut on = layers.is_selected(kind);
        let label = match kind {
            LayerKind::Log => "📈 Log transfer",
            LayerKind::Tag => "▭ Tags",
            LayerKind::Base => "🖼 Base",
        };
        if ui.checkbox(&mut on, label).changed() {
            selection_changed = true;
            if on {
                selection.push(kind);
            } else {
                selection.retain(|k| *k != kind);
            }
        }
    }
    if selection_changed {
        actions.push(LayerPanelAction::SetSelection(selection));
    }

    ui.horizontal(|ui| {
        if viewer.log_layer().exists() {
            if ui.button("✖ Clear log layer").clicked() {
                actions.push(LayerPanelAction::ClearLogLayer);
            }
        } else if ui.button("📈 Create log layer").clicked() {
            actions.push(LayerPanelAction::CreateLogLayer);
        }
    });

    ui.add_space(8.0);
    ui.separator();

    egui::CollapsingHeader::new("◐ Adjustments")
        .default_open(true)
        .show(ui, |ui| {
            ui.label(
                egui::RichText::new(format!("Target: {} layer", viewer.adjust_target()))
                    .size(11.5)
                    .color(colors.text_secondary),
            );
            let p = &mut state.params;

            let r = ui.add(
                egui::Slider::new(&mut p.brightness, BRIGHTNESS_RANGE.0..=BRIGHTNESS_RANGE.1)
                    .text("Brightness"),
            );
            slider_actions(&r, AdjustField::Brightness(p.brightness), &mut actions);

            let r = ui.add(
                egui::Slider::new(&mut p.contrast, CONTRAST_RANGE.0..=CONTRAST_RANGE.1)
                    .text("Contrast")
                    .fixed_decimals(2),
            );
            slider_actions(&r, AdjustField::Contrast(p.contrast), &mut actions);

            let r = ui.add(
                egui::Slider::new(&mut p.black_point, 0.0..=1.0)
                    .text("Black point")
                    .fixed_decimals(3),
            );
            slider_actions(&r, AdjustField::BlackPoint(p.black_point), &mut actions);

            let r = ui.add(
                egui::Slider::new(&mut p.white_point, 0.0..=1.0)
                    .text("White point")
                    .fixed_decimals(3),
            );
            slider_actions(&r, AdjustField::WhitePoint(p.white_point), &mut actions);

            if ui
                .add_enabled(!p.is_default(), egui::Button::new("🔄 Reset"))
                .clicked()
            {
                actions.push(LayerPanelAction::ResetAdjustment);
            }
        });

    if let Some(hist) = viewer.histogram() {
        egui::CollapsingHeader::new("📊 Histogram")
            .default_open(state.show_histogram)
            .show(ui, |ui| {
                ui.checkbox(&mut state.log_scale_histogram, "Log counts");
                show_histogram(ui, hist, state.log_scale_histogram, colors);
            });
    }

    actions
}

/// Drag start/stop brackets the live updates; a click or keyboard change
/// is a complete adjustment on its own.
fn slider_actions(r: &egui::Response, field: AdjustField, actions: &mut Vec<LayerPanelAction>) {
    if r.drag_started() {
        actions.push(LayerPanelAction::BeginAdjust);
    }
    if r.changed() {
        let standalone = !r.dragged() && !r.drag_stopped();
        if standalone {
            actions.push(LayerPanelAction::BeginAdjust);
        }
        actions.push(LayerPanelAction::Adjust(field));
        if standalone {
            actions.push(LayerPanelAction::EndAdjust);
        }
    }
    if r.drag_stopped() {
        actions.push(LayerPanelAction::EndAdjust);
    }
}

fn show_histogram(ui: &mut egui::Ui, hist: &[u32; 256], log_counts: bool, colors: &ThemeColors) {
    let points: PlotPoints = hist
        .iter()
        .enumerate()
        .map(|(level, &count)| {
            let y = if log_counts {
                (count as f64).ln_1p()
            } else {
                count as f64
            };
            [level as f64, y]
        })
        .collect();
    let line = Line::new(points)
        .name("Display levels")
        .color(colors.histogram_line)
        .width(1.0);

    Plot::new("level_histogram")
        .height(120.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show_axes([true, false])
        .include_x(0.0)
        .include_x(255.0)
        .include_y(0.0)
        .show(ui, |plot_ui| {
            plot_ui.line(line);
        });
}
