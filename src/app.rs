/// Main application state and eframe::App implementation
///
/// The shell owns the panels and native dialogs; every state change goes
/// through `Viewer::run` so failures surface in the status bar.

use std::path::PathBuf;
use std::time::Duration;

use eframe::egui;

use crate::gui::canvas::{self, CanvasState};
use crate::gui::layer_panel::{self, LayerPanelState};
use crate::gui::status_bar::StatusBar;
use crate::gui::tag_panel::{self, TagPanelAction, TagPanelState};
use crate::gui::theme::{self, AppTheme, ThemeColors};
use crate::gui::toolbar::{self, ToolbarAction};
use crate::viewer::{Viewer, ViewerAction};

const IDLE_STATUS: &str = "Ready: open a TIF image to begin";

pub struct TifViewerApp {
    viewer: Viewer,
    status: StatusBar,

    canvas_state: CanvasState,
    layer_panel_state: LayerPanelState,
    tag_panel_state: TagPanelState,

    show_log_window: bool,
    show_about: bool,
    current_theme: AppTheme,
    theme_colors: ThemeColors,

    dropped_files: Vec<PathBuf>,
    /// Last viewport size pushed to the viewer
    viewport: (f64, f64),
}

impl TifViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let default_theme = AppTheme::Dark;
        theme::apply_theme(&cc.egui_ctx, default_theme);

        let ppi = cc.egui_ctx.pixels_per_point();
        let base_size = if ppi > 1.5 { 14.0 } else { 13.0 };
        let mut style = (*cc.egui_ctx.style()).clone();
        style.text_styles.insert(
            egui::TextStyle::Body,
            egui::FontId::new(base_size, egui::FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            egui::FontId::new(base_size, egui::FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Heading,
            egui::FontId::new(base_size * 1.25, egui::FontFamily::Proportional),
        );
        style.spacing.item_spacing = egui::vec2(8.0, 5.0);
        style.spacing.button_padding = egui::vec2(8.0, 4.0);
        cc.egui_ctx.set_style(style);

        Self {
            viewer: Viewer::new(),
            status: StatusBar::new(),
            canvas_state: CanvasState::new(),
            layer_panel_state: LayerPanelState::default(),
            tag_panel_state: TagPanelState::default(),
            show_log_window: false,
            show_about: false,
            current_theme: default_theme,
            theme_colors: ThemeColors::from_theme(default_theme),
            dropped_files: Vec::new(),
            viewport: (0.0, 0.0),
        }
    }

    fn run(&mut self, action: ViewerAction) {
        self.viewer.run(action, &mut self.status);
    }

    fn open(&mut self, path: PathBuf) {
        log::info!("Opening {}", path.display());
        self.tag_panel_state = TagPanelState::default();
        self.run(ViewerAction::Open(path));
    }

    fn handle_toolbar_action(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::None => {}
            ToolbarAction::OpenFile => {
                if let Some(path) = toolbar::open_image_dialog() {
                    self.open(path);
                }
            }
            ToolbarAction::SaveTags => {
                if let Some(path) = toolbar::save_tags_dialog() {
                    self.run(ViewerAction::SaveTags(path));
                }
            }
            ToolbarAction::LoadTags => {
                if let Some(path) = toolbar::load_tags_dialog() {
                    self.run(ViewerAction::LoadTags(path));
                }
            }
            ToolbarAction::ExportView => {
                if let Some(path) = toolbar::export_view_dialog() {
                    self.run(ViewerAction::ExportView(path));
                }
            }
            ToolbarAction::ExportLog => {
                if let Some(path) = toolbar::save_log_dialog() {
                    self.run(ViewerAction::ExportActivity(path));
                }
            }
            ToolbarAction::DrawTag => self.run(ViewerAction::StartDrawTag),
            ToolbarAction::DeleteTag => self.run(ViewerAction::DeleteSelectedTag),
            ToolbarAction::ClearTags => self.run(ViewerAction::ClearTags),
            ToolbarAction::CreateLogLayer => self.run(ViewerAction::CreateLogLayer),
            ToolbarAction::ClearLogLayer => self.run(ViewerAction::ClearLogLayer),
            ToolbarAction::ToggleLayer(kind) => self.run(ViewerAction::ToggleLayer(kind)),
            ToolbarAction::ZoomIn => self.run(ViewerAction::ZoomIn),
            ToolbarAction::ZoomOut => self.run(ViewerAction::ZoomOut),
            ToolbarAction::ResetView => self.run(ViewerAction::ResetView),
            ToolbarAction::ToggleLogWindow => self.show_log_window = !self.show_log_window,
            ToolbarAction::ThemeToggle => {
                self.current_theme = self.current_theme.next();
                self.theme_colors = ThemeColors::from_theme(self.current_theme);
                log::info!("Theme: {}", self.current_theme.label());
            }
            ToolbarAction::ShowAbout => self.show_about = true,
        }
    }

    fn handle_tag_panel_action(&mut self, action: TagPanelAction) {
        match action {
            TagPanelAction::None => {}
            TagPanelAction::Select(id) => self.run(ViewerAction::SelectTag(id)),
            TagPanelAction::Rename(id, label) => self.run(ViewerAction::RenameTag(id, label)),
            TagPanelAction::Draw => self.run(ViewerAction::StartDrawTag),
            TagPanelAction::DeleteSelected => self.run(ViewerAction::DeleteSelectedTag),
            TagPanelAction::ClearAll => self.run(ViewerAction::ClearTags),
            TagPanelAction::Save => self.handle_toolbar_action(ToolbarAction::SaveTags),
            TagPanelAction::Load => self.handle_toolbar_action(ToolbarAction::LoadTags),
        }
    }

    fn shortcuts(&mut self, ctx: &egui::Context) -> ToolbarAction {
        if ctx.wants_keyboard_input() {
            return ToolbarAction::None;
        }
        ctx.input(|i| {
            if !(i.modifiers.ctrl || i.modifiers.command) {
                return ToolbarAction::None;
            }
            if i.key_pressed(egui::Key::O) {
                ToolbarAction::OpenFile
            } else if i.key_pressed(egui::Key::Equals) || i.key_pressed(egui::Key::Plus) {
                ToolbarAction::ZoomIn
            } else if i.key_pressed(egui::Key::Minus) {
                ToolbarAction::ZoomOut
            } else if i.key_pressed(egui::Key::Num0) {
                ToolbarAction::ResetView
            } else {
                ToolbarAction::None
            }
        })
    }
}

impl eframe::App for TifViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        theme::apply_theme(ctx, self.current_theme);

        // Handle drag-and-drop
        ctx.input(|i| {
            for file in &i.raw.dropped_files {
                if let Some(path) = &file.path {
                    self.dropped_files.push(path.clone());
                }
            }
        });
        if let Some(path) = self.dropped_files.pop() {
            self.dropped_files.clear();
            self.open(path);
        }

        // ── Toolbar ──
        let toolbar_action =
            toolbar::show_toolbar(ctx, self.current_theme.label(), self.viewer.has_image());
        self.handle_toolbar_action(toolbar_action);

        // ── Status Bar ──
        let tc = self.theme_colors.clone();
        let mode_badge = theme::mode_label(self.viewer.mode(), self.viewer.tags().is_draw_mode());
        let message = self.status.current().unwrap_or(IDLE_STATUS).to_string();
        let activity_count = self.viewer.activity().len();

        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                egui::Frame::new()
                    .fill(tc.status_bar_bg)
                    .inner_margin(egui::Margin::symmetric(12, 4)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if let Some((mode_name, mode_hint, mode_color)) = mode_badge {
                        let badge = egui::Button::new(
                            egui::RichText::new(mode_name)
                                .size(11.5)
                                .strong()
                                .color(mode_color),
                        )
                        .fill(mode_color.linear_multiply(0.2))
                        .stroke(egui::Stroke::new(1.0, mode_color))
                        .corner_radius(10.0);
                        ui.add(badge);
                        ui.label(
                            egui::RichText::new(mode_hint)
                                .size(11.0)
                                .italics()
                                .color(mode_color.linear_multiply(0.7)),
                        );
                        ui.separator();
                    }
                    ui.label(egui::RichText::new(message).size(11.5).color(tc.status_text));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("📋 Log").clicked() {
                            self.show_log_window = !self.show_log_window;
                        }
                        ui.label(
                            egui::RichText::new(format!("{} actions", activity_count))
                                .size(11.0)
                                .color(tc.text_muted),
                        );
                        if self.viewer.has_image() {
                            ui.separator();
                            ui.label(
                                egui::RichText::new(format!(
                                    "{:.0}%",
                                    self.viewer.view().scale() * 100.0
                                ))
                                .size(11.0)
                                .color(tc.text_muted),
                            );
                        }
                    });
                });
            });

        // ── Left Panel: Layers & Adjustments ──
        let mut layer_actions = Vec::new();
        egui::SidePanel::left("layer_panel")
            .resizable(true)
            .default_width(260.0)
            .min_width(200.0)
            .max_width(400.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        layer_actions = layer_panel::show_layer_panel(
                            ui,
                            &mut self.layer_panel_state,
                            &self.viewer,
                            &tc,
                        );
                    });
            });
        for action in layer_actions {
            self.run(action.into());
        }

        // ── Right Panel: Tags ──
        let mut tag_action = TagPanelAction::None;
        egui::SidePanel::right("tag_panel")
            .resizable(true)
            .default_width(240.0)
            .min_width(180.0)
            .show(ctx, |ui| {
                tag_action =
                    tag_panel::show_tag_panel(ui, &mut self.tag_panel_state, &self.viewer, &tc);
            });
        self.handle_tag_panel_action(tag_action);

        // ── Central Panel: Canvas ──
        let output = egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(tc.canvas_bg))
            .show(ctx, |ui| {
                canvas::show_canvas(ui, &self.viewer, &mut self.canvas_state, &tc)
            })
            .inner;
        if output.viewport != self.viewport {
            self.viewport = output.viewport;
            self.viewer.set_viewport(output.viewport.0, output.viewport.1);
        }
        for event in output.events.into_iter().chain(canvas::read_keys(ctx)) {
            self.run(ViewerAction::Input(event));
        }

        // ── Log Window ──
        if self.show_log_window {
            let mut export = false;
            egui::Window::new("📋 Session Log")
                .open(&mut self.show_log_window)
                .default_size([600.0, 400.0])
                .resizable(true)
                .show(ctx, |ui| {
                    if ui.button("💾 Export…").clicked() {
                        export = true;
                    }
                    ui.separator();
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.style_mut().override_font_id = Some(egui::FontId::monospace(12.0));
                        ui.label(self.viewer.activity().to_text());
                    });
                });
            if export {
                self.handle_toolbar_action(ToolbarAction::ExportLog);
            }
        }

        // ── About Dialog ──
        if self.show_about {
            egui::Window::new("About")
                .open(&mut self.show_about)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.heading("🖼 TIF Viewer");
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(10.0);
                    ui.label("Built with Rust + egui");
                    ui.add_space(10.0);
                    ui.label("• Multi-band TIFF loading");
                    ui.label("• Log-transfer overlay layer");
                    ui.label("• Rectangular tags with JSON persistence");
                    ui.label("• Live brightness / contrast / levels");
                });
        }

        let shortcut = self.shortcuts(ctx);
        self.handle_toolbar_action(shortcut);

        // Keep the status message timer ticking
        if self.status.current().is_some() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}
