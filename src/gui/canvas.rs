/// Canvas: paints the retained scene and turns pointer input into viewer events

use std::collections::HashMap;

use crate::geometry::{Point, Rect};
use crate::gui::theme::ThemeColors;
use crate::input::{InputEvent, InteractionMode, KeyInput, PointerButton};
use crate::scene::surface::{ItemId, ItemKind};
use crate::scene::view::ViewTransform;
use crate::tagging::TagState;
use crate::viewer::Viewer;

/// GPU textures for the scene's image items, re-uploaded on revision change
#[derive(Default)]
pub struct CanvasState {
    textures: HashMap<ItemId, (u64, egui::TextureHandle)>,
    pub show_hud: bool,
}

impl CanvasState {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            show_hud: true,
        }
    }

    fn texture(
        &mut self,
        ctx: &egui::Context,
        id: ItemId,
        revision: u64,
        image: &crate::data::raster::DisplayBuffer,
    ) -> egui::TextureId {
        if let Some((rev, handle)) = self.textures.get_mut(&id) {
            if *rev != revision {
                handle.set(to_color_image(image), egui::TextureOptions::NEAREST);
                *rev = revision;
            }
            return handle.id();
        }
        let handle = ctx.load_texture(
            format!("scene-item-{}", id),
            to_color_image(image),
            egui::TextureOptions::NEAREST,
        );
        let tex = handle.id();
        self.textures.insert(id, (revision, handle));
        tex
    }

    /// Drop textures whose items left the scene
    fn prune(&mut self, live: &[ItemId]) {
        self.textures.retain(|id, _| live.contains(id));
    }
}

/// What the canvas produced this frame
pub struct CanvasOutput {
    pub events: Vec<InputEvent>,
    pub viewport: (f64, f64),
}

fn to_color_image(image: &crate::data::raster::DisplayBuffer) -> egui::ColorImage {
    let size = [image.width, image.height];
    if image.is_rgb() {
        egui::ColorImage::from_rgb(size, &image.data)
    } else {
        egui::ColorImage::from_gray(size, &image.data)
    }
}

fn to_screen(t: &ViewTransform, origin: egui::Pos2, r: &Rect) -> egui::Rect {
    let v = t.rect_to_viewport(r);
    egui::Rect::from_min_size(
        origin + egui::vec2(v.x as f32, v.y as f32),
        egui::vec2(v.width as f32, v.height as f32),
    )
}

fn local(origin: egui::Pos2, p: egui::Pos2) -> Point {
    Point::new((p.x - origin.x) as f64, (p.y - origin.y) as f64)
}

pub fn show_canvas(
    ui: &mut egui::Ui,
    viewer: &Viewer,
    state: &mut CanvasState,
    colors: &ThemeColors,
) -> CanvasOutput {
    let (response, painter) =
        ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
    let rect = response.rect;
    let painter = painter.with_clip_rect(rect);
    painter.rect_filled(rect, 0.0, colors.canvas_bg);

    let viewport = (rect.width() as f64, rect.height() as f64);
    let mut events = Vec::new();

    if !viewer.has_image() {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "Open a TIF image or drop one here",
            egui::FontId::proportional(16.0),
            colors.text_muted,
        );
        state.prune(&[]);
        return CanvasOutput { events, viewport };
    }

    let transform = *viewer.view().transform();
    let items = viewer.scene().items_by_z();
    let live: Vec<ItemId> = items.iter().map(|(id, _)| *id).collect();

    for (id, item) in items {
        if !item.visible {
            continue;
        }
        let screen = to_screen(&transform, rect.min, &item.bounds());
        if !screen.intersects(rect) {
            continue;
        }
        match &item.kind {
            ItemKind::Image {
                image, revision, ..
            } => {
                let tex = state.texture(ui.ctx(), id, *revision, image);
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                painter.image(tex, screen, uv, egui::Color32::WHITE);
            }
            ItemKind::Rect { pen, .. } => {
                painter.rect_stroke(screen, 0.0, pen.stroke(), egui::StrokeKind::Middle);
            }
        }
    }
    state.prune(&live);

    if state.show_hud {
        paint_hud(&painter, viewer, rect, colors);
    }

    // Pointer
    let (primary_pressed, middle_pressed, primary_released, middle_released, pointer, delta) =
        ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.button_pressed(egui::PointerButton::Middle),
                i.pointer.primary_released(),
                i.pointer.button_released(egui::PointerButton::Middle),
                i.pointer.interact_pos(),
                i.pointer.delta(),
            )
        });
    let mode = viewer.mode();
    let gesture = matches!(mode, InteractionMode::Drawing | InteractionMode::Panning);

    if let Some(pos) = pointer {
        let p = local(rect.min, pos);
        if response.hovered() {
            if primary_pressed {
                events.push(InputEvent::Press {
                    pos: p,
                    button: PointerButton::Primary,
                });
            } else if middle_pressed {
                events.push(InputEvent::Press {
                    pos: p,
                    button: PointerButton::Middle,
                });
            }
        }
        if delta != egui::Vec2::ZERO && (gesture || response.hovered()) {
            events.push(InputEvent::Move { pos: p });
        }
        if gesture && (primary_released || middle_released) {
            let button = if primary_released {
                PointerButton::Primary
            } else {
                PointerButton::Middle
            };
            events.push(InputEvent::Release { pos: p, button });
        }
    }

    // Wheel: ctrl+scroll arrives as a zoom factor, plain scroll as a delta
    if response.hovered() {
        let (scroll, zoom) = ui.input(|i| (i.smooth_scroll_delta, i.zoom_delta()));
        let pos = ui
            .input(|i| i.pointer.hover_pos())
            .map(|h| local(rect.min, h))
            .unwrap_or_else(|| Point::new(viewport.0 / 2.0, viewport.1 / 2.0));
        if zoom != 1.0 {
            events.push(InputEvent::Wheel {
                dx: 0.0,
                dy: if zoom > 1.0 { 1.0 } else { -1.0 },
                pos,
                zoom_modifier: true,
            });
        } else if scroll != egui::Vec2::ZERO {
            events.push(InputEvent::Wheel {
                dx: scroll.x as f64,
                dy: scroll.y as f64,
                pos,
                zoom_modifier: false,
            });
        }
    }

    if response.hovered() || gesture {
        let hover = ui.input(|i| i.pointer.hover_pos()).map(|h| local(rect.min, h));
        ui.ctx().set_cursor_icon(cursor_for(viewer, mode, hover));
    }

    CanvasOutput { events, viewport }
}

fn cursor_for(viewer: &Viewer, mode: InteractionMode, hover: Option<Point>) -> egui::CursorIcon {
    match viewer.tags().state() {
        TagState::Drawing { .. } => return egui::CursorIcon::Crosshair,
        TagState::Moving { .. } => return egui::CursorIcon::Grabbing,
        TagState::Resizing { handle, .. } => {
            return if handle.is_main_diagonal() {
                egui::CursorIcon::ResizeNwSe
            } else {
                egui::CursorIcon::ResizeNeSw
            }
        }
        _ => {}
    }
    if mode == InteractionMode::Panning {
        return egui::CursorIcon::Grabbing;
    }
    if viewer.tags().is_draw_mode() {
        return egui::CursorIcon::Crosshair;
    }
    let scene = hover.map(|p| viewer.view().transform().to_scene(p));
    match scene.and_then(|p| viewer.tags().hover_handle(p)) {
        Some(h) if h.is_main_diagonal() => egui::CursorIcon::ResizeNwSe,
        Some(_) => egui::CursorIcon::ResizeNeSw,
        None => egui::CursorIcon::Default,
    }
}

/// Zoom readout pinned to the overlay's top-left corner
fn paint_hud(painter: &egui::Painter, viewer: &Viewer, rect: egui::Rect, colors: &ThemeColors) {
    let view = viewer.view();
    let overlay = view.overlay().rect();
    let anchor = to_screen(view.transform(), rect.min, &overlay).min + egui::vec2(8.0, 8.0);
    let text = format!(
        "{:.0}%  ·  {:.0}×{:.0} px visible",
        view.scale() * 100.0,
        overlay.width,
        overlay.height
    );
    let galley = painter.layout_no_wrap(text, egui::FontId::monospace(11.0), colors.status_text);
    let bg = egui::Rect::from_min_size(anchor, galley.size()).expand(4.0);
    painter.rect_filled(bg, 3.0, colors.status_bar_bg.gamma_multiply(0.85));
    painter.galley(anchor, galley, colors.status_text);
}

/// Canvas keyboard shortcuts, skipped while a text field has focus
pub fn read_keys(ctx: &egui::Context) -> Vec<InputEvent> {
    if ctx.wants_keyboard_input() {
        return Vec::new();
    }
    ctx.input(|i| {
        let mut keys = Vec::new();
        if i.key_pressed(egui::Key::Escape) {
            keys.push(InputEvent::Key(KeyInput::Escape));
        }
        if i.key_pressed(egui::Key::Delete) {
            keys.push(InputEvent::Key(KeyInput::Delete));
        }
        if i.key_pressed(egui::Key::T) && !i.modifiers.command {
            keys.push(InputEvent::Key(KeyInput::DrawTag));
        }
        keys
    })
}
