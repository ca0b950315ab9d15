/// View/zoom controller: scene ↔ viewport transform, zoom, pan and fit
///
/// Viewport coordinates are pixels relative to the canvas' top-left corner.
/// `viewport = scene * scale + offset`.

use crate::geometry::{Point, Rect};

pub const ZOOM_STEP: f64 = 1.2;
pub const WHEEL_ZOOM_STEP: f64 = 1.15;
pub const MIN_SCALE: f64 = 0.01;
pub const MAX_SCALE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub offset: Point,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Point::default(),
        }
    }
}

impl ViewTransform {
    pub fn to_viewport(&self, p: Point) -> Point {
        Point::new(
            p.x * self.scale + self.offset.x,
            p.y * self.scale + self.offset.y,
        )
    }

    pub fn to_scene(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset.x) / self.scale,
            (p.y - self.offset.y) / self.scale,
        )
    }

    pub fn rect_to_viewport(&self, r: &Rect) -> Rect {
        let tl = self.to_viewport(Point::new(r.x, r.y));
        Rect::new(tl.x, tl.y, r.width * self.scale, r.height * self.scale)
    }

    /// Scene-space length of `pixels` viewport pixels
    pub fn scene_length(&self, pixels: f64) -> f64 {
        pixels / self.scale
    }
}

/// On-scene placement of the overlay drawn on top of the base image
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverlayGeometry {
    pub center: Point,
    pub width: f64,
    pub height: f64,
}

impl OverlayGeometry {
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.center.x - self.width / 2.0,
            self.center.y - self.height / 2.0,
            self.width,
            self.height,
        )
    }
}

/// Something that can bring a scene point into view
pub trait ViewFocus {
    fn center_on(&mut self, p: Point);
}

#[derive(Debug, Clone, Default)]
pub struct ViewController {
    transform: ViewTransform,
    viewport_width: f64,
    viewport_height: f64,
    content: Option<Rect>,
    /// A fit was requested before the viewport size was known
    fit_pending: bool,
    overlay: OverlayGeometry,
}

impl ViewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self) -> &ViewTransform {
        &self.transform
    }

    pub fn scale(&self) -> f64 {
        self.transform.scale
    }

    pub fn overlay(&self) -> &OverlayGeometry {
        &self.overlay
    }

    pub fn viewport_size(&self) -> (f64, f64) {
        (self.viewport_width, self.viewport_height)
    }

    /// Called every frame with the canvas size; re-syncs the overlay when it
    /// changes and performs any fit that was waiting for a real size.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let changed = width != self.viewport_width || height != self.viewport_height;
        self.viewport_width = width;
        self.viewport_height = height;
        if self.fit_pending {
            self.reset_view();
        } else if changed {
            self.sync_overlay();
        }
    }

    /// Register the base image extent; the next opportunity fits it.
    pub fn set_content(&mut self, rect: Option<Rect>) {
        self.content = rect;
        self.fit_pending = rect.is_some();
        if self.fit_pending && self.viewport_width > 0.0 {
            self.reset_view();
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom_about(ZOOM_STEP, self.viewport_center());
    }

    pub fn zoom_out(&mut self) {
        self.zoom_about(1.0 / ZOOM_STEP, self.viewport_center());
    }

    /// Wheel zoom about the pointer. Only engaged while the zoom modifier is
    /// held; returns false when the caller should scroll instead.
    pub fn wheel_zoom(&mut self, wheel_delta: f64, pointer: Point, modifier_held: bool) -> bool {
        if !modifier_held || wheel_delta == 0.0 {
            return false;
        }
        let factor = if wheel_delta > 0.0 {
            WHEEL_ZOOM_STEP
        } else {
            1.0 / WHEEL_ZOOM_STEP
        };
        self.zoom_about(factor, pointer);
        true
    }

    /// Scale by `factor` keeping the scene point under `anchor` fixed
    pub fn zoom_about(&mut self, factor: f64, anchor: Point) {
        let scene_anchor = self.transform.to_scene(anchor);
        let scale = (self.transform.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.transform.scale = scale;
        self.transform.offset = Point::new(
            anchor.x - scene_anchor.x * scale,
            anchor.y - scene_anchor.y * scale,
        );
        log::debug!("View scale {:.3}", scale);
        self.sync_overlay();
    }

    /// Translate by a viewport-pixel delta
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.transform.offset = self.transform.offset.offset(dx, dy);
        self.sync_overlay();
    }

    /// Fit the base image into the viewport, preserving aspect ratio
    pub fn reset_view(&mut self) {
        let Some(content) = self.content else {
            return;
        };
        if self.viewport_width <= 0.0 || content.width <= 0.0 || content.height <= 0.0 {
            self.fit_pending = true;
            return;
        }
        self.fit_pending = false;
        let scale = (self.viewport_width / content.width)
            .min(self.viewport_height / content.height)
            .clamp(MIN_SCALE, MAX_SCALE);
        self.transform.scale = scale;
        self.center_on(content.center());
    }

    /// Scene rectangle currently visible in the viewport
    pub fn visible_scene_rect(&self) -> Rect {
        let tl = self.transform.to_scene(Point::new(0.0, 0.0));
        let br = self
            .transform
            .to_scene(Point::new(self.viewport_width, self.viewport_height));
        Rect::from_corners(tl, br)
    }

    /// Overlay follows the visible rect: centered on it, same size
    pub fn sync_overlay(&mut self) {
        let visible = self.visible_scene_rect();
        self.overlay = OverlayGeometry {
            center: visible.center(),
            width: visible.width,
            height: visible.height,
        };
    }

    fn viewport_center(&self) -> Point {
        Point::new(self.viewport_width / 2.0, self.viewport_height / 2.0)
    }
}

impl ViewFocus for ViewController {
    fn center_on(&mut self, p: Point) {
        let c = self.viewport_center();
        self.transform.offset = Point::new(
            c.x - p.x * self.transform.scale,
            c.y - p.y * self.transform.scale,
        );
        self.sync_overlay();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn view_800x600() -> ViewController {
        let mut view = ViewController::new();
        view.set_viewport(800.0, 600.0);
        view
    }

    #[test]
    fn test_reset_view_fits_preserving_aspect() {
        let mut view = view_800x600();
        view.set_content(Some(Rect::new(0.0, 0.0, 400.0, 100.0)));
        assert!(close(view.scale(), 2.0));
        let visible = view.visible_scene_rect();
        assert!(close(visible.center().x, 200.0));
        assert!(close(visible.center().y, 50.0));
    }

    #[test]
    fn test_fit_waits_for_viewport() {
        let mut view = ViewController::new();
        view.set_content(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert!(close(view.scale(), 1.0));
        view.set_viewport(200.0, 400.0);
        assert!(close(view.scale(), 2.0));
    }

    #[test]
    fn test_zoom_in_keeps_center_fixed() {
        let mut view = view_800x600();
        view.set_content(Some(Rect::new(0.0, 0.0, 800.0, 600.0)));
        let before = view.visible_scene_rect().center();
        view.zoom_in();
        assert!(close(view.scale(), ZOOM_STEP));
        let after = view.visible_scene_rect().center();
        assert!(close(before.x, after.x) && close(before.y, after.y));
        view.zoom_out();
        assert!(close(view.scale(), 1.0));
    }

    #[test]
    fn test_wheel_zoom_requires_modifier_and_anchors_pointer() {
        let mut view = view_800x600();
        let pointer = Point::new(100.0, 50.0);
        assert!(!view.wheel_zoom(1.0, pointer, false));
        assert!(close(view.scale(), 1.0));

        let under = view.transform().to_scene(pointer);
        assert!(view.wheel_zoom(1.0, pointer, true));
        assert!(close(view.scale(), WHEEL_ZOOM_STEP));
        let still_under = view.transform().to_scene(pointer);
        assert!(close(under.x, still_under.x) && close(under.y, still_under.y));

        assert!(view.wheel_zoom(-3.0, pointer, true));
        assert!(close(view.scale(), 1.0));
    }

    #[test]
    fn test_overlay_tracks_every_transform_change() {
        let mut view = view_800x600();
        view.sync_overlay();
        assert_eq!(view.overlay().rect(), Rect::new(0.0, 0.0, 800.0, 600.0));

        view.pan(-100.0, 0.0);
        assert!(close(view.overlay().center.x, 500.0));

        view.zoom_about(2.0, Point::new(0.0, 0.0));
        let overlay = view.overlay();
        assert!(close(overlay.width, 400.0) && close(overlay.height, 300.0));
        assert_eq!(overlay.rect(), view.visible_scene_rect());

        view.set_viewport(400.0, 300.0);
        assert!(close(view.overlay().width, 200.0));
    }

    #[test]
    fn test_scale_is_clamped() {
        let mut view = view_800x600();
        for _ in 0..100 {
            view.zoom_in();
        }
        assert!(close(view.scale(), MAX_SCALE));
    }

    #[test]
    fn test_center_on() {
        let mut view = view_800x600();
        view.center_on(Point::new(1000.0, 1000.0));
        let c = view.visible_scene_rect().center();
        assert!(close(c.x, 1000.0) && close(c.y, 1000.0));
    }
}
