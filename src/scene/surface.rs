/// Retained scene model
///
/// Engines talk to the scene only through `RenderSurface`; the canvas reads
/// the concrete `Scene` back out to paint it. Items are ordered by z, then
/// by insertion.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::raster::DisplayBuffer;
use crate::geometry::{Point, Rect};

pub type ItemId = u64;

/// Z-order of the three layers, bottom to top
pub const Z_BASE: i32 = 0;
pub const Z_LOG: i32 = 1;
pub const Z_TAGS: i32 = 2;
pub const Z_PREVIEW: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    pub color: egui::Color32,
    pub width: f32,
}

impl Pen {
    pub const fn new(color: egui::Color32, width: f32) -> Self {
        Self { color, width }
    }

    pub fn stroke(&self) -> egui::Stroke {
        egui::Stroke::new(self.width, self.color)
    }
}

#[derive(Debug, Clone)]
pub enum ItemKind {
    Image {
        image: Arc<DisplayBuffer>,
        origin: Point,
        /// Bumped on every replacement so texture caches know to re-upload
        revision: u64,
    },
    Rect {
        rect: Rect,
        pen: Pen,
    },
}

#[derive(Debug, Clone)]
pub struct SceneItem {
    pub kind: ItemKind,
    pub z: i32,
    pub visible: bool,
}

impl SceneItem {
    /// Scene-space extent of the item
    pub fn bounds(&self) -> Rect {
        match &self.kind {
            ItemKind::Image { image, origin, .. } => Rect::new(
                origin.x,
                origin.y,
                image.width as f64,
                image.height as f64,
            ),
            ItemKind::Rect { rect, .. } => *rect,
        }
    }
}

/// What the engines may do to the rendering surface
pub trait RenderSurface {
    fn add_image(&mut self, image: Arc<DisplayBuffer>, origin: Point, z: i32) -> ItemId;
    fn replace_image(&mut self, id: ItemId, image: Arc<DisplayBuffer>);
    fn add_rect(&mut self, rect: Rect, pen: Pen, z: i32) -> ItemId;
    fn set_rect(&mut self, id: ItemId, rect: Rect);
    fn set_pen(&mut self, id: ItemId, pen: Pen);
    fn set_visible(&mut self, id: ItemId, visible: bool);
    fn remove_item(&mut self, id: ItemId);
}

#[derive(Debug, Default)]
pub struct Scene {
    items: BTreeMap<ItemId, SceneItem>,
    next_id: ItemId,
    next_revision: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ItemId) -> Option<&SceneItem> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in paint order
    pub fn items_by_z(&self) -> Vec<(ItemId, &SceneItem)> {
        let mut items: Vec<(ItemId, &SceneItem)> =
            self.items.iter().map(|(id, item)| (*id, item)).collect();
        items.sort_by_key(|(id, item)| (item.z, *id));
        items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn insert(&mut self, kind: ItemKind, z: i32) -> ItemId {
        self.next_id += 1;
        let id = self.next_id;
        self.items.insert(
            id,
            SceneItem {
                kind,
                z,
                visible: true,
            },
        );
        id
    }

    fn revision(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }
}

impl RenderSurface for Scene {
    fn add_image(&mut self, image: Arc<DisplayBuffer>, origin: Point, z: i32) -> ItemId {
        let revision = self.revision();
        self.insert(
            ItemKind::Image {
                image,
                origin,
                revision,
            },
            z,
        )
    }

    fn replace_image(&mut self, id: ItemId, new_image: Arc<DisplayBuffer>) {
        let rev = self.revision();
        if let Some(ItemKind::Image {
            image, revision, ..
        }) = self.items.get_mut(&id).map(|i| &mut i.kind)
        {
            *image = new_image;
            *revision = rev;
        }
    }

    fn add_rect(&mut self, rect: Rect, pen: Pen, z: i32) -> ItemId {
        self.insert(ItemKind::Rect { rect, pen }, z)
    }

    fn set_rect(&mut self, id: ItemId, new_rect: Rect) {
        if let Some(ItemKind::Rect { rect, .. }) = self.items.get_mut(&id).map(|i| &mut i.kind) {
            *rect = new_rect;
        }
    }

    fn set_pen(&mut self, id: ItemId, new_pen: Pen) {
        if let Some(ItemKind::Rect { pen, .. }) = self.items.get_mut(&id).map(|i| &mut i.kind) {
            *pen = new_pen;
        }
    }

    fn set_visible(&mut self, id: ItemId, visible: bool) {
        if let Some(item) = self.items.get_mut(&id) {
            item.visible = visible;
        }
    }

    fn remove_item(&mut self, id: ItemId) {
        self.items.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_order_follows_z_then_insertion() {
        let mut scene = Scene::new();
        let pen = Pen::new(egui::Color32::RED, 2.0);
        let tag = scene.add_rect(Rect::new(0.0, 0.0, 1.0, 1.0), pen, Z_TAGS);
        let base = scene.add_image(Arc::new(DisplayBuffer::zeros(2, 2, 1)), Point::default(), Z_BASE);
        let log = scene.add_image(Arc::new(DisplayBuffer::zeros(2, 2, 1)), Point::default(), Z_LOG);
        let order: Vec<ItemId> = scene.items_by_z().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![base, log, tag]);
    }

    #[test]
    fn test_replace_image_bumps_revision() {
        let mut scene = Scene::new();
        let id = scene.add_image(Arc::new(DisplayBuffer::zeros(1, 1, 1)), Point::default(), Z_BASE);
        let before = match &scene.get(id).unwrap().kind {
            ItemKind::Image { revision, .. } => *revision,
            _ => unreachable!(),
        };
        scene.replace_image(id, Arc::new(DisplayBuffer::new(1, 1, 1, vec![9])));
        match &scene.get(id).unwrap().kind {
            ItemKind::Image { revision, image, .. } => {
                assert!(*revision > before);
                assert_eq!(image.data, vec![9]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_mutations_ignore_wrong_kind_and_removed_items() {
        let mut scene = Scene::new();
        let img = scene.add_image(Arc::new(DisplayBuffer::zeros(1, 1, 1)), Point::default(), Z_BASE);
        scene.set_rect(img, Rect::new(5.0, 5.0, 5.0, 5.0));
        assert_eq!(scene.get(img).unwrap().bounds(), Rect::new(0.0, 0.0, 1.0, 1.0));
        scene.remove_item(img);
        scene.set_visible(img, false);
        assert!(scene.is_empty());
    }
}
