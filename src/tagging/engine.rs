/// Tag annotation engine
///
/// Owns the tag collection and the gesture state machine:
///
/// ```text
/// Idle ──press (draw mode)──▶ Drawing ──release──▶ Idle (+ new tag)
/// Idle ──press on tag──▶ Moving ──release──▶ Selected
/// Selected ──press on handle──▶ Resizing ──release──▶ Selected
/// Selected ──press inside──▶ Moving ──release──▶ Selected
/// any ──press on empty space / deselect──▶ Idle
/// ```
///
/// Visual rectangles live on the render surface and are derived from the
/// collection; they are recreated from scratch on load.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use egui::Color32;

use super::tag::{self, Handle, Tag, HANDLE_SIZE_PX};
use crate::data::tag_file::{with_default_extension, TagFile};
use crate::error::ViewerError;
use crate::geometry::{Point, Rect};
use crate::scene::layers::LayerTarget;
use crate::scene::surface::{ItemId, Pen, RenderSurface, Z_PREVIEW, Z_TAGS};
use crate::scene::view::ViewFocus;

pub const DEFAULT_PEN: Pen = Pen::new(Color32::RED, 2.0);
pub const SELECTED_PEN: Pen = Pen::new(Color32::GREEN, 2.0);
pub const HANDLE_PEN: Pen = Pen::new(Color32::BLACK, 1.0);
pub const PREVIEW_PEN: Pen = Pen::new(Color32::YELLOW, 1.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TagState {
    Idle,
    Drawing {
        anchor: Point,
        current: Point,
    },
    Selected(u32),
    Resizing {
        id: u32,
        handle: Handle,
        original: Rect,
        press: Point,
    },
    Moving {
        id: u32,
        original: Rect,
        press: Point,
    },
}

impl TagState {
    /// Tag currently highlighted, if any
    pub fn selected_id(&self) -> Option<u32> {
        match *self {
            TagState::Selected(id)
            | TagState::Resizing { id, .. }
            | TagState::Moving { id, .. } => Some(id),
            TagState::Idle | TagState::Drawing { .. } => None,
        }
    }

    /// A pointer gesture is in progress
    pub fn is_gesture(&self) -> bool {
        matches!(
            self,
            TagState::Drawing { .. } | TagState::Resizing { .. } | TagState::Moving { .. }
        )
    }
}

/// What a gesture ended up doing, for status and activity reporting
#[derive(Debug, Clone, PartialEq)]
pub enum TagEvent {
    None,
    Created(u32),
    Moved(u32),
    Resized(u32),
    Cancelled,
    Deselected,
    /// A rectangle was drawn but every id has been handed out
    IdsExhausted,
}

#[derive(Debug)]
pub struct TagEngine {
    tags: BTreeMap<u32, Tag>,
    items: HashMap<u32, ItemId>,
    handles: Vec<ItemId>,
    preview: Option<ItemId>,
    state: TagState,
    draw_mode: bool,
    /// None once u32::MAX has been assigned; ids are never reused
    next_id: Option<u32>,
    dirty: bool,
    visible: bool,
    /// Handle edge in scene units (HANDLE_SIZE_PX / view scale)
    handle_size: f64,
}

impl Default for TagEngine {
    fn default() -> Self {
        Self {
            tags: BTreeMap::new(),
            items: HashMap::new(),
            handles: Vec::new(),
            preview: None,
            state: TagState::Idle,
            draw_mode: false,
            next_id: Some(1),
            dirty: false,
            visible: true,
            handle_size: HANDLE_SIZE_PX,
        }
    }
}

impl TagEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TagState {
        &self.state
    }

    pub fn selected_id(&self) -> Option<u32> {
        self.state.selected_id()
    }

    pub fn get(&self, id: u32) -> Option<&Tag> {
        self.tags.get(&id)
    }

    /// Tags in id order
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_draw_mode(&self) -> bool {
        self.draw_mode
    }

    pub fn handle_size(&self) -> f64 {
        self.handle_size
    }

    pub fn item_for(&self, id: u32) -> Option<ItemId> {
        self.items.get(&id).copied()
    }

    // ------------------------------------------------------------------
    // Gestures
    // ------------------------------------------------------------------

    /// Arm draw mode; the next press starts a rectangle.
    pub fn start_drawing(&mut self, surface: &mut dyn RenderSurface) {
        self.select(None, surface);
        self.draw_mode = true;
        log::debug!("Tag draw mode armed");
    }

    /// Pointer press in scene coordinates. Returns false when the press
    /// landed on empty space and should fall through to panning.
    pub fn press(&mut self, p: Point, surface: &mut dyn RenderSurface) -> bool {
        if self.draw_mode {
            self.select(None, surface);
            let item = surface.add_rect(Rect::new(p.x, p.y, 0.0, 0.0), PREVIEW_PEN, Z_PREVIEW);
            self.preview = Some(item);
            self.state = TagState::Drawing { anchor: p, current: p };
            log::debug!("Drawing from ({:.1}, {:.1})", p.x, p.y);
            return true;
        }
        if !self.visible {
            self.select(None, surface);
            return false;
        }

        if let TagState::Selected(id) = self.state {
            if let Some(bounds) = self.tags.get(&id).map(|t| t.bounds) {
                if let Some(handle) = tag::hit_handle(&bounds, p, self.handle_size) {
                    self.state = TagState::Resizing {
                        id,
                        handle,
                        original: bounds,
                        press: p,
                    };
                    log::debug!("Resizing tag {} from {:?}", id, handle);
                    return true;
                }
                if bounds.contains(p) {
                    self.state = TagState::Moving {
                        id,
                        original: bounds,
                        press: p,
                    };
                    return true;
                }
            }
        }

        // Topmost tag under the pointer: highest id is drawn last
        let hit = self
            .tags
            .values()
            .rev()
            .find(|t| t.bounds.contains(p))
            .map(|t| (t.id, t.bounds));
        match hit {
            Some((id, bounds)) => {
                self.select(Some(id), surface);
                self.state = TagState::Moving {
                    id,
                    original: bounds,
                    press: p,
                };
                true
            }
            None => {
                self.select(None, surface);
                false
            }
        }
    }

    /// Pointer drag in scene coordinates. Returns whether a gesture consumed it.
    pub fn move_to(&mut self, p: Point, surface: &mut dyn RenderSurface) -> bool {
        match self.state {
            TagState::Drawing { anchor, .. } => {
                self.state = TagState::Drawing { anchor, current: p };
                if let Some(item) = self.preview {
                    surface.set_rect(item, Rect::from_corners(anchor, p));
                }
                true
            }
            TagState::Resizing {
                id,
                handle,
                original,
                press,
            } => {
                let (dx, dy) = p.delta_from(press);
                if let Some(current) = self.tags.get(&id).map(|t| t.bounds) {
                    let next = tag::resize(&original, &current, handle, dx, dy);
                    self.set_bounds(id, next, surface);
                }
                true
            }
            TagState::Moving { id, original, press } => {
                let (dx, dy) = p.delta_from(press);
                self.set_bounds(id, original.translated(dx, dy), surface);
                true
            }
            TagState::Idle | TagState::Selected(_) => false,
        }
    }

    /// Pointer release in scene coordinates; commits the current gesture.
    pub fn release(&mut self, p: Point, surface: &mut dyn RenderSurface) -> TagEvent {
        self.move_to(p, surface);
        match self.state {
            TagState::Drawing { anchor, current } => {
                self.remove_preview(surface);
                self.state = TagState::Idle;
                let rect = Rect::from_corners(anchor, current);
                if rect.area() > 0.0 {
                    self.draw_mode = false;
                    match self.create(rect, surface) {
                        Some(id) => TagEvent::Created(id),
                        None => TagEvent::IdsExhausted,
                    }
                } else {
                    TagEvent::None
                }
            }
            TagState::Resizing { id, original, .. } => {
                self.state = TagState::Selected(id);
                if self.tags.get(&id).map(|t| t.bounds) != Some(original) {
                    self.dirty = true;
                    log::info!("Tag {} resized", id);
                    TagEvent::Resized(id)
                } else {
                    TagEvent::None
                }
            }
            TagState::Moving { id, original, .. } => {
                self.state = TagState::Selected(id);
                if self.tags.get(&id).map(|t| t.bounds) != Some(original) {
                    self.dirty = true;
                    log::info!("Tag {} moved", id);
                    TagEvent::Moved(id)
                } else {
                    TagEvent::None
                }
            }
            TagState::Idle | TagState::Selected(_) => TagEvent::None,
        }
    }

    /// Escape: abort a drawing, undo an in-flight resize or move, or drop
    /// the selection.
    pub fn cancel(&mut self, surface: &mut dyn RenderSurface) -> TagEvent {
        match self.state {
            TagState::Drawing { .. } => {
                self.remove_preview(surface);
                self.state = TagState::Idle;
                self.draw_mode = false;
                TagEvent::Cancelled
            }
            TagState::Resizing { id, original, .. } | TagState::Moving { id, original, .. } => {
                self.set_bounds(id, original, surface);
                self.state = TagState::Selected(id);
                TagEvent::Cancelled
            }
            TagState::Selected(_) => {
                self.select(None, surface);
                TagEvent::Deselected
            }
            TagState::Idle if self.draw_mode => {
                self.draw_mode = false;
                TagEvent::Cancelled
            }
            TagState::Idle => TagEvent::None,
        }
    }

    /// Handle under `p` on the selected tag, for cursor feedback
    pub fn hover_handle(&self, p: Point) -> Option<Handle> {
        if !self.visible {
            return None;
        }
        match self.state {
            TagState::Selected(id) => self
                .tags
                .get(&id)
                .and_then(|t| tag::hit_handle(&t.bounds, p, self.handle_size)),
            TagState::Resizing { handle, .. } => Some(handle),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Collection operations
    // ------------------------------------------------------------------

    /// Selection coming from the tag list: highlight, center the view on
    /// the tag, clear everything else. `None` deselects all.
    pub fn select_from_list(
        &mut self,
        id: Option<u32>,
        surface: &mut dyn RenderSurface,
        focus: &mut dyn ViewFocus,
    ) {
        let id = id.filter(|id| self.tags.contains_key(id));
        self.select(id, surface);
        if let Some(tag) = id.and_then(|id| self.tags.get(&id)) {
            focus.center_on(tag.bounds.center());
        }
    }

    pub fn delete_selected(&mut self, surface: &mut dyn RenderSurface) -> Result<Tag, ViewerError> {
        let id = self
            .selected_id()
            .ok_or_else(|| ViewerError::empty("No tag selected to delete"))?;
        self.select(None, surface);
        let tag = self
            .tags
            .remove(&id)
            .ok_or_else(|| ViewerError::empty("No tag selected to delete"))?;
        if let Some(item) = self.items.remove(&id) {
            surface.remove_item(item);
        }
        self.dirty = true;
        log::info!("Deleted tag {} ({})", id, tag.label);
        Ok(tag)
    }

    /// Returns true when the label actually changed
    pub fn rename(&mut self, id: u32, label: &str) -> Result<bool, ViewerError> {
        let tag = self
            .tags
            .get_mut(&id)
            .ok_or_else(|| ViewerError::empty("No such tag to rename"))?;
        let label = label.trim();
        if label.is_empty() || tag.label == label {
            return Ok(false);
        }
        log::info!("Renamed tag {}: {} → {}", id, tag.label, label);
        tag.label = label.to_string();
        self.dirty = true;
        Ok(true)
    }

    /// Remove every tag; returns how many were removed
    pub fn clear(&mut self, surface: &mut dyn RenderSurface) -> usize {
        self.remove_preview(surface);
        self.remove_handles(surface);
        for (_, item) in self.items.drain() {
            surface.remove_item(item);
        }
        let removed = self.tags.len();
        self.tags.clear();
        self.state = TagState::Idle;
        self.draw_mode = false;
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Forget everything including the dirty flag, for a freshly opened image.
    /// The surface is assumed to have been cleared by the caller.
    pub fn reset(&mut self) {
        *self = Self {
            handle_size: self.handle_size,
            ..Self::default()
        };
    }

    pub fn set_visible(&mut self, visible: bool, surface: &mut dyn RenderSurface) {
        self.visible = visible;
        for item in self.items.values().chain(self.handles.iter()) {
            surface.set_visible(*item, visible);
        }
        if !visible && !self.state.is_gesture() {
            self.select(None, surface);
        }
    }

    /// Keep handles a constant on-screen size as the view scale changes
    pub fn set_view_scale(&mut self, scale: f64, surface: &mut dyn RenderSurface) {
        if scale <= 0.0 {
            return;
        }
        let size = HANDLE_SIZE_PX / scale;
        if (size - self.handle_size).abs() > f64::EPSILON {
            self.handle_size = size;
            self.sync_handles(surface);
        }
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write every tag to `path` (".json" appended when missing).
    /// Returns the path actually written.
    pub fn save(&mut self, path: &Path) -> Result<PathBuf, ViewerError> {
        if self.tags.is_empty() {
            return Err(ViewerError::empty("No tags to save"));
        }
        let path = with_default_extension(path);
        let mut file = TagFile::new();
        for tag in self.tags.values() {
            file.insert(tag.id, tag.to_record());
        }
        file.write(&path)?;
        self.dirty = false;
        log::info!("Saved {} tag(s) to {}", file.len(), path.display());
        Ok(path)
    }

    /// Replace the collection with the contents of `path`.
    ///
    /// Existing tags are cleared before the file is read; if reading fails
    /// they stay cleared and no partial set is inserted.
    pub fn load(&mut self, path: &Path, surface: &mut dyn RenderSurface) -> Result<usize, ViewerError> {
        self.clear(surface);
        let file = TagFile::read(path)?;

        for (id, record) in &file.tags {
            let tag = Tag::from_record(*id, record);
            self.add_visual(&tag, surface);
            self.tags.insert(tag.id, tag);
        }
        if let Some(&max) = file.tags.keys().max() {
            self.next_id = match (self.next_id, max.checked_add(1)) {
                (Some(next), Some(after_max)) => Some(next.max(after_max)),
                _ => None,
            };
            if self.next_id.is_none() {
                log::warn!("Loaded tag id {} exhausts the id space", max);
            }
        }
        self.dirty = false;
        log::info!("Loaded {} tag(s) from {}", file.len(), path.display());
        Ok(file.len())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// None when no unused id is left
    fn create(&mut self, bounds: Rect, surface: &mut dyn RenderSurface) -> Option<u32> {
        let id = self.next_id?;
        self.next_id = id.checked_add(1);
        let tag = Tag::new(id, bounds);
        self.add_visual(&tag, surface);
        log::info!(
            "Created {} at ({:.1}, {:.1}, {:.1}, {:.1})",
            tag.label,
            bounds.x,
            bounds.y,
            bounds.width,
            bounds.height
        );
        self.tags.insert(id, tag);
        self.dirty = true;
        Some(id)
    }

    fn add_visual(&mut self, tag: &Tag, surface: &mut dyn RenderSurface) {
        let item = surface.add_rect(tag.bounds, DEFAULT_PEN, Z_TAGS);
        surface.set_visible(item, self.visible);
        self.items.insert(tag.id, item);
    }

    fn set_bounds(&mut self, id: u32, bounds: Rect, surface: &mut dyn RenderSurface) {
        if let Some(tag) = self.tags.get_mut(&id) {
            tag.bounds = bounds;
            if let Some(item) = self.items.get(&id) {
                surface.set_rect(*item, bounds);
            }
            self.sync_handles(surface);
        }
    }

    fn select(&mut self, id: Option<u32>, surface: &mut dyn RenderSurface) {
        for (tag_id, item) in &self.items {
            let pen = if Some(*tag_id) == id {
                SELECTED_PEN
            } else {
                DEFAULT_PEN
            };
            surface.set_pen(*item, pen);
        }
        self.state = match id {
            Some(id) => TagState::Selected(id),
            None => TagState::Idle,
        };
        self.sync_handles(surface);
    }

    /// Recreate the four handle squares for the selected tag
    fn sync_handles(&mut self, surface: &mut dyn RenderSurface) {
        let bounds = self
            .selected_id()
            .and_then(|id| self.tags.get(&id))
            .map(|t| t.bounds);
        match bounds {
            Some(bounds) => {
                let rects = tag::handle_rects(&bounds, self.handle_size);
                if self.handles.len() != rects.len() {
                    self.remove_handles(surface);
                    for (_, rect) in rects {
                        let item = surface.add_rect(rect, HANDLE_PEN, Z_PREVIEW);
                        surface.set_visible(item, self.visible);
                        self.handles.push(item);
                    }
                } else {
                    for (item, (_, rect)) in self.handles.iter().zip(rects) {
                        surface.set_rect(*item, rect);
                    }
                }
            }
            None => self.remove_handles(surface),
        }
    }

    fn remove_handles(&mut self, surface: &mut dyn RenderSurface) {
        for item in self.handles.drain(..) {
            surface.remove_item(item);
        }
    }

    fn remove_preview(&mut self, surface: &mut dyn RenderSurface) {
        if let Some(item) = self.preview.take() {
            surface.remove_item(item);
        }
    }
}

impl LayerTarget for TagEngine {
    fn set_layer_visible(&mut self, visible: bool, surface: &mut dyn RenderSurface) {
        self.set_visible(visible, surface);
    }
}
