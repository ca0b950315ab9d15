/// Toolbar: top menu bar with file, tag, layer and view actions

use std::path::PathBuf;

use crate::scene::layers::LayerKind;

/// Actions that can be triggered from the toolbar
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    None,
    OpenFile,
    SaveTags,
    LoadTags,
    ExportView,
    ExportLog,
    DrawTag,
    DeleteTag,
    ClearTags,
    CreateLogLayer,
    ClearLogLayer,
    ToggleLayer(LayerKind),
    ZoomIn,
    ZoomOut,
    ResetView,
    ToggleLogWindow,
    ThemeToggle,
    ShowAbout,
}

/// Render the toolbar and return any triggered action
pub fn show_toolbar(ctx: &egui::Context, theme_label: &str, has_image: bool) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("📁 File", |ui| {
                if ui.button("📂 Open Image…  Ctrl+O").clicked() {
                    action = ToolbarAction::OpenFile;
                    ui.close_menu();
                }
                ui.separator();
                if ui
                    .add_enabled(has_image, egui::Button::new("💾 Save Tags…"))
                    .clicked()
                {
                    action = ToolbarAction::SaveTags;
                    ui.close_menu();
                }
                if ui
                    .add_enabled(has_image, egui::Button::new("📂 Load Tags…"))
                    .clicked()
                {
                    action = ToolbarAction::LoadTags;
                    ui.close_menu();
                }
                ui.separator();
                if ui
                    .add_enabled(has_image, egui::Button::new("🖼 Export View…"))
                    .clicked()
                {
                    action = ToolbarAction::ExportView;
                    ui.close_menu();
                }
                if ui.button("📋 Export Session Log…").clicked() {
                    action = ToolbarAction::ExportLog;
                    ui.close_menu();
                }
            });

            ui.menu_button("🏷 Tags", |ui| {
                ui.add_enabled_ui(has_image, |ui| {
                    if ui.button("▭ Draw Tag  T").clicked() {
                        action = ToolbarAction::DrawTag;
                        ui.close_menu();
                    }
                    if ui.button("🗑 Delete Selected  Del").clicked() {
                        action = ToolbarAction::DeleteTag;
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("✖ Clear All Tags").clicked() {
                        action = ToolbarAction::ClearTags;
                        ui.close_menu();
                    }
                });
            });

            ui.menu_button("🗂 Layers", |ui| {
                ui.add_enabled_ui(has_image, |ui| {
                    if ui.button("📈 Create Log-Transfer Layer").clicked() {
                        action = ToolbarAction::CreateLogLayer;
                        ui.close_menu();
                    }
                    if ui.button("✖ Clear Log-Transfer Layer").clicked() {
                        action = ToolbarAction::ClearLogLayer;
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("👁 Toggle Log Layer").clicked() {
                        action = ToolbarAction::ToggleLayer(LayerKind::Log);
                        ui.close_menu();
                    }
                    if ui.button("👁 Toggle Tag Layer").clicked() {
                        action = ToolbarAction::ToggleLayer(LayerKind::Tag);
                        ui.close_menu();
                    }
                });
            });

            ui.menu_button("🔍 View", |ui| {
                if ui.button("🔍+ Zoom In  Ctrl+=").clicked() {
                    action = ToolbarAction::ZoomIn;
                    ui.close_menu();
                }
                if ui.button("🔍− Zoom Out  Ctrl+-").clicked() {
                    action = ToolbarAction::ZoomOut;
                    ui.close_menu();
                }
                if ui.button("🔄 Fit to Window  Ctrl+0").clicked() {
                    action = ToolbarAction::ResetView;
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("📋 Session Log").clicked() {
                    action = ToolbarAction::ToggleLogWindow;
                    ui.close_menu();
                }
                if ui.button(format!("🎨 Theme: {}", theme_label)).clicked() {
                    action = ToolbarAction::ThemeToggle;
                    ui.close_menu();
                }
            });

            ui.menu_button("❓ Help", |ui| {
                if ui.button("ℹ About").clicked() {
                    action = ToolbarAction::ShowAbout;
                    ui.close_menu();
                }
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add(
                        egui::Button::new(egui::RichText::new(theme_label).size(12.0))
                            .corner_radius(12.0),
                    )
                    .clicked()
                {
                    action = ToolbarAction::ThemeToggle;
                }
                ui.separator();
                ui.label(
                    egui::RichText::new("TIF Viewer")
                        .color(egui::Color32::from_rgb(0x70, 0x75, 0x80))
                        .size(12.0),
                );
            });
        });
    });

    action
}

pub fn open_image_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open Raster Image")
        .add_filter("TIFF Image", &["tif", "tiff"])
        .add_filter("Other Images", &["png", "jpg", "jpeg", "bmp"])
        .add_filter("All Files", &["*"])
        .pick_file()
}

pub fn save_tags_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Save Tags")
        .set_file_name("tags.json")
        .add_filter("JSON", &["json"])
        .save_file()
}

pub fn load_tags_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Load Tags")
        .add_filter("JSON", &["json"])
        .add_filter("All Files", &["*"])
        .pick_file()
}

pub fn export_view_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export View")
        .add_filter("PNG Image", &["png"])
        .save_file()
}

/// Text or JSON, picked by the chosen extension
pub fn save_log_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export Session Log")
        .add_filter("Text File", &["txt"])
        .add_filter("JSON", &["json"])
        .save_file()
}
