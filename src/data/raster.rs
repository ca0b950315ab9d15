use std::sync::Arc;

/// Numeric raster samples, row-major and channel-interleaved.
///
/// Samples are kept as `f32` so that 16-bit, 32-bit and floating point
/// sources survive without being squeezed into 8 bits.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<f32>,
}

impl RasterBuffer {
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width * height * channels);
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Single-channel buffer filled with one value
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self::new(width, height, 1, vec![value; width * height])
    }

    /// Interleave up to three bands of equal size into one buffer.
    pub fn from_bands(width: usize, height: usize, bands: &[&[f32]]) -> Self {
        let channels = bands.len();
        let mut data = Vec::with_capacity(width * height * channels);
        for i in 0..width * height {
            for band in bands {
                data.push(band[i]);
            }
        }
        Self::new(width, height, channels, data)
    }

    /// Widen an 8-bit display buffer back into sample space
    pub fn from_display(display: &DisplayBuffer) -> Self {
        Self::new(
            display.width,
            display.height,
            display.channels,
            display.data.iter().map(|&v| v as f32).collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// (min, max) over all finite samples, or None for an empty buffer
    pub fn range(&self) -> Option<(f32, f32)> {
        let mut iter = self.data.iter().copied().filter(|v| v.is_finite());
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    pub fn max(&self) -> Option<f32> {
        self.range().map(|(_, hi)| hi)
    }
}

/// 8-bit displayable pixels (gray or RGB), ready for the graphics toolkit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<u8>,
}

impl DisplayBuffer {
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width * height * channels);
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    pub fn zeros(width: usize, height: usize, channels: usize) -> Self {
        Self::new(width, height, channels, vec![0; width * height * channels])
    }

    pub fn is_rgb(&self) -> bool {
        self.channels == 3
    }
}

/// Descriptive summary of the loaded raster, shown in the layer panel
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    pub file_name: String,
    pub band_count: usize,
    pub width: usize,
    pub height: usize,
    pub sample_type: String,
}

impl RasterInfo {
    pub fn summary(&self) -> String {
        format!(
            "File: {}\nBands: {}\nSize: {} × {}\nSamples: {}",
            self.file_name, self.band_count, self.width, self.height, self.sample_type
        )
    }
}

/// Holds the immutable original raster and the buffer currently on screen.
#[derive(Debug, Default)]
pub struct RasterStore {
    original: Option<Arc<RasterBuffer>>,
    displayed: Option<Arc<DisplayBuffer>>,
}

impl RasterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the source buffer. Nothing else happens here; rendering is
    /// the caller's business.
    pub fn set_original(&mut self, buffer: RasterBuffer) {
        self.original = Some(Arc::new(buffer));
    }

    pub fn original(&self) -> Option<&RasterBuffer> {
        self.original.as_deref()
    }

    /// Shared handle to the original, for callers that must keep it while
    /// mutating other state
    pub fn original_shared(&self) -> Option<Arc<RasterBuffer>> {
        self.original.clone()
    }

    pub fn set_displayed(&mut self, display: Arc<DisplayBuffer>) {
        self.displayed = Some(display);
    }

    pub fn displayed(&self) -> Option<&Arc<DisplayBuffer>> {
        self.displayed.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.original.is_some()
    }

    pub fn clear(&mut self) {
        self.original = None;
        self.displayed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bands_interleaves() {
        let r = [1.0, 2.0];
        let g = [10.0, 20.0];
        let b = [100.0, 200.0];
        let buf = RasterBuffer::from_bands(2, 1, &[&r, &g, &b]);
        assert_eq!(buf.channels, 3);
        assert_eq!(buf.data, vec![1.0, 10.0, 100.0, 2.0, 20.0, 200.0]);
    }

    #[test]
    fn test_range_skips_non_finite() {
        let buf = RasterBuffer::new(3, 1, 1, vec![f32::NAN, 4.0, -2.0]);
        assert_eq!(buf.range(), Some((-2.0, 4.0)));
        assert_eq!(RasterBuffer::new(0, 0, 1, Vec::new()).range(), None);
    }

    #[test]
    fn test_store_keeps_original_untouched() {
        let mut store = RasterStore::new();
        assert!(!store.has_image());
        store.set_original(RasterBuffer::filled(2, 2, 7.0));
        assert!(store.displayed().is_none());
        store.set_displayed(Arc::new(DisplayBuffer::zeros(2, 2, 1)));
        assert_eq!(store.original().map(|b| b.data.clone()), Some(vec![7.0; 4]));
        store.clear();
        assert!(store.original().is_none());
    }
}
