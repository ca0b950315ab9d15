/// Log-transfer engine
///
/// Compresses the dynamic range of a raster with `c * ln(1 + x)` so that
/// faint detail in high-contrast imagery (raw sensor counts, radar
/// backscatter) becomes visible. The result is a separate overlay layer,
/// hidden until the user selects it.

use std::sync::Arc;

use crate::data::raster::{DisplayBuffer, RasterBuffer};
use crate::geometry::{Point, Rect};
use crate::scene::layers::LayerTarget;
use crate::scene::surface::{ItemId, RenderSurface, Z_LOG};

/// Below this maximum the image is treated as empty
pub const EPSILON: f64 = 1e-10;
/// Maxima above this are rescaled before taking the log
pub const RESCALE_THRESHOLD: f64 = 1e10;
pub const RESCALE_TARGET: f64 = 1000.0;

/// Log-compress `buffer` into 8-bit display samples of the same shape.
/// Returns the buffer and its scene rectangle.
pub fn compute_log_layer(buffer: &RasterBuffer) -> (DisplayBuffer, Rect) {
    let rect = Rect::new(0.0, 0.0, buffer.width as f64, buffer.height as f64);

    // Non-finite samples are narrowed individually and never set the scale
    let mut max = buffer.max().map_or(f64::NEG_INFINITY, |m| m as f64);
    if !(max > EPSILON) {
        return (
            DisplayBuffer::zeros(buffer.width, buffer.height, buffer.channels),
            rect,
        );
    }

    let mut rescale = 1.0;
    if max > RESCALE_THRESHOLD {
        rescale = RESCALE_TARGET / max;
        max = RESCALE_TARGET;
    }
    let c = 255.0 / (1.0 + max + EPSILON).ln();

    let data = buffer
        .data
        .iter()
        .map(|&v| {
            let x = v as f64 * rescale;
            let y = if x > 0.0 { c * x.ln_1p() } else { 0.0 };
            narrow(y)
        })
        .collect();

    (
        DisplayBuffer::new(buffer.width, buffer.height, buffer.channels, data),
        rect,
    )
}

/// NaN → 0, +∞ → 255, −∞ → 0, then clip and truncate to u8
fn narrow(v: f64) -> u8 {
    let v = if v.is_nan() {
        0.0
    } else if v == f64::INFINITY {
        255.0
    } else if v == f64::NEG_INFINITY {
        0.0
    } else {
        v
    };
    v.clamp(0.0, 255.0) as u8
}

/// The Log layer: its computed source, its scene item and its visibility
#[derive(Debug, Default)]
pub struct LogLayer {
    /// Log-compressed samples; adjustments targeting this layer start here
    source: Option<Arc<RasterBuffer>>,
    display: Option<Arc<DisplayBuffer>>,
    item: Option<ItemId>,
    visible: bool,
}

impl LogLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self) -> bool {
        self.item.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn source(&self) -> Option<&RasterBuffer> {
        self.source.as_deref()
    }

    pub fn source_shared(&self) -> Option<Arc<RasterBuffer>> {
        self.source.clone()
    }

    pub fn display(&self) -> Option<&Arc<DisplayBuffer>> {
        self.display.as_ref()
    }

    /// Compute the layer from `original` and add it, hidden, above the base.
    /// Any previous log layer is discarded first.
    pub fn create(&mut self, original: &RasterBuffer, surface: &mut dyn RenderSurface) -> Rect {
        self.clear(surface);
        let (display, rect) = compute_log_layer(original);
        let display = Arc::new(display);
        let item = surface.add_image(display.clone(), Point::new(rect.x, rect.y), Z_LOG);
        surface.set_visible(item, self.visible);

        self.source = Some(Arc::new(RasterBuffer::from_display(&display)));
        self.display = Some(display);
        self.item = Some(item);
        log::info!(
            "Log layer created ({}×{}, {} channel(s))",
            original.width,
            original.height,
            original.channels
        );
        rect
    }

    /// Swap in an adjusted rendering of the log source
    pub fn replace_display(&mut self, display: Arc<DisplayBuffer>, surface: &mut dyn RenderSurface) {
        if let Some(item) = self.item {
            surface.replace_image(item, display.clone());
            self.display = Some(display);
        }
    }

    pub fn set_visible(&mut self, visible: bool, surface: &mut dyn RenderSurface) {
        if let Some(item) = self.item {
            self.visible = visible;
            surface.set_visible(item, visible);
        }
    }

    /// Flip visibility; no-op without a layer. Returns the new state.
    pub fn toggle_visibility(&mut self, surface: &mut dyn RenderSurface) -> bool {
        let next = !self.visible;
        self.set_visible(next, surface);
        self.visible
    }

    /// Discard the layer and reset visibility
    pub fn clear(&mut self, surface: &mut dyn RenderSurface) {
        if let Some(item) = self.item.take() {
            surface.remove_item(item);
        }
        self.source = None;
        self.display = None;
        self.visible = false;
    }
}

impl LayerTarget for LogLayer {
    fn set_layer_visible(&mut self, visible: bool, surface: &mut dyn RenderSurface) {
        self.set_visible(visible, surface);
    }
}
