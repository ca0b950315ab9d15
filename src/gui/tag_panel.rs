/// Tag panel: right sidebar listing tags with rename and persistence buttons

use crate::gui::theme::ThemeColors;
use crate::viewer::Viewer;

#[derive(Debug, Clone, Default)]
pub struct TagPanelState {
    /// Tag whose label is being edited, with the draft text
    pub editing: Option<(u32, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TagPanelAction {
    None,
    Select(Option<u32>),
    Rename(u32, String),
    Draw,
    DeleteSelected,
    ClearAll,
    Save,
    Load,
}

pub fn show_tag_panel(
    ui: &mut egui::Ui,
    state: &mut TagPanelState,
    viewer: &Viewer,
    colors: &ThemeColors,
) -> TagPanelAction {
    let mut action = TagPanelAction::None;
    let tags = viewer.tags();

    ui.vertical_centered(|ui| {
        ui.heading("🏷 Tags");
    });
    ui.separator();

    let has_image = viewer.has_image();
    ui.horizontal_wrapped(|ui| {
        ui.add_enabled_ui(has_image, |ui| {
            let draw = ui.add(egui::Button::new("▭ Draw").selected(tags.is_draw_mode()));
            if draw.on_hover_text("Drag a rectangle on the image (T)").clicked() {
                action = TagPanelAction::Draw;
            }
            if ui
                .add_enabled(tags.selected_id().is_some(), egui::Button::new("🗑 Delete"))
                .clicked()
            {
                action = TagPanelAction::DeleteSelected;
            }
            if ui
                .add_enabled(!tags.is_empty(), egui::Button::new("✖ Clear"))
                .clicked()
            {
                action = TagPanelAction::ClearAll;
            }
        });
    });
    ui.horizontal(|ui| {
        ui.add_enabled_ui(has_image, |ui| {
            if ui.button("💾 Save…").clicked() {
                action = TagPanelAction::Save;
            }
            if ui.button("📂 Load…").clicked() {
                action = TagPanelAction::Load;
            }
        });
    });

    let dirty = if tags.is_dirty() { "  ● unsaved" } else { "" };
    ui.label(
        egui::RichText::new(format!("{} tag(s){}", tags.len(), dirty))
            .size(11.5)
            .color(if tags.is_dirty() {
                colors.warning
            } else {
                colors.text_secondary
            }),
    );
    if !tags.is_visible() && !tags.is_empty() {
        ui.label(
            egui::RichText::new("Tag layer hidden")
                .size(11.0)
                .color(colors.text_muted),
        );
    }
    ui.separator();

    let selected = tags.selected_id();
    egui::ScrollArea::vertical()
        .id_salt("tag_list")
        .show(ui, |ui| {
            for tag in tags.iter() {
                let editing_this = matches!(&state.editing, Some((id, _)) if *id == tag.id);
                if editing_this {
                    let mut commit = false;
                    let mut cancel = false;
                    if let Some((_, draft)) = state.editing.as_mut() {
                        let r = ui.text_edit_singleline(draft);
                        r.request_focus();
                        if r.lost_focus() {
                            if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                                cancel = true;
                            } else {
                                commit = true;
                            }
                        }
                    }
                    if commit {
                        if let Some((id, draft)) = state.editing.take() {
                            action = TagPanelAction::Rename(id, draft);
                        }
                    } else if cancel {
                        state.editing = None;
                    }
                    continue;
                }

                let b = &tag.bounds;
                let text = format!(
                    "{}  ({:.0}, {:.0}) {:.0}×{:.0}",
                    tag.label, b.x, b.y, b.width, b.height
                );
                let r = ui.selectable_label(selected == Some(tag.id), text);
                if r.clicked() {
                    let next = if selected == Some(tag.id) {
                        None
                    } else {
                        Some(tag.id)
                    };
                    action = TagPanelAction::Select(next);
                }
                if r.double_clicked() {
                    state.editing = Some((tag.id, tag.label.clone()));
                }
                r.on_hover_text("Double-click to rename");
            }
        });

    action
}
