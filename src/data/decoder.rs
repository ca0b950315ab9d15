/// Raster decoding: TIFF through the `tiff` crate, everything else through `image`
///
/// The decoder hands back whole bands as `f32` samples without any scaling,
/// so high bit-depth and floating point data reach the pipelines untouched.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::raster::{RasterBuffer, RasterInfo};
use crate::error::ViewerError;

/// A decoded raster, split into bands
#[derive(Debug, Clone)]
pub struct DecodedRaster {
    pub width: usize,
    pub height: usize,
    pub sample_type: String,
    bands: Vec<Vec<f32>>,
}

impl DecodedRaster {
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Band samples by zero-based index
    pub fn read_band(&self, index: usize) -> Option<&[f32]> {
        self.bands.get(index).map(|b| b.as_slice())
    }

    /// Bands 1-3 as RGB when at least three exist, otherwise band 1 alone
    pub fn to_buffer(&self) -> RasterBuffer {
        let take = if self.bands.len() >= 3 { 3 } else { 1 };
        let bands: Vec<&[f32]> = self.bands[..take].iter().map(|b| b.as_slice()).collect();
        RasterBuffer::from_bands(self.width, self.height, &bands)
    }

    pub fn info(&self, path: &Path) -> RasterInfo {
        RasterInfo {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            band_count: self.band_count(),
            width: self.width,
            height: self.height,
            sample_type: self.sample_type.clone(),
        }
    }
}

/// Open any supported raster file
pub fn open_raster(path: &Path) -> Result<DecodedRaster, ViewerError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let decoded = match ext.as_str() {
        "tif" | "tiff" => decode_tiff(path)?,
        _ => decode_with_image(path)?,
    };

    if decoded.width == 0 || decoded.height == 0 || decoded.bands.is_empty() {
        return Err(ViewerError::load(path, "image has no pixels"));
    }
    log::debug!(
        "Decoded {}: {}×{} with {} band(s) of {}",
        path.display(),
        decoded.width,
        decoded.height,
        decoded.band_count(),
        decoded.sample_type
    );
    Ok(decoded)
}

fn decode_tiff(path: &Path) -> Result<DecodedRaster, ViewerError> {
    use tiff::decoder::{Decoder, DecodingResult, Limits};

    let file = File::open(path).map_err(|e| ViewerError::load(path, e))?;

    // Large scans and mosaics routinely exceed the default limits
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1024 * 1024 * 1024;
    limits.ifd_value_size = 1024 * 1024 * 1024;
    limits.intermediate_buffer_size = 1024 * 1024 * 1024;

    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| ViewerError::load(path, format!("not a readable TIFF: {}", e)))?
        .with_limits(limits);

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| ViewerError::load(path, e))?;
    let color_type = decoder
        .colortype()
        .map_err(|e| ViewerError::load(path, e))?;
    let samples_per_pixel = match color_type {
        tiff::ColorType::Gray(_) => 1,
        tiff::ColorType::GrayA(_) => 2,
        tiff::ColorType::RGB(_) => 3,
        tiff::ColorType::RGBA(_) => 4,
        tiff::ColorType::Multiband { num_samples, .. } => num_samples as usize,
        other => {
            return Err(ViewerError::load(
                path,
                format!("unsupported TIFF color type {:?}", other),
            ))
        }
    };

    let image = decoder
        .read_image()
        .map_err(|e| ViewerError::load(path, e))?;

    let (width, height) = (width as usize, height as usize);
    let split = |samples: Vec<f32>, kind: &str| {
        split_bands(samples, width, height, samples_per_pixel)
            .map(|bands| DecodedRaster {
                width,
                height,
                sample_type: kind.to_string(),
                bands,
            })
            .ok_or_else(|| ViewerError::load(path, "TIFF sample count does not match its size"))
    };

    match image {
        DecodingResult::U8(buf) => split(widen(&buf), "uint8"),
        DecodingResult::U16(buf) => split(widen(&buf), "uint16"),
        DecodingResult::U32(buf) => split(widen(&buf), "uint32"),
        DecodingResult::U64(buf) => split(widen(&buf), "uint64"),
        DecodingResult::I8(buf) => split(widen(&buf), "int8"),
        DecodingResult::I16(buf) => split(widen(&buf), "int16"),
        DecodingResult::I32(buf) => split(widen(&buf), "int32"),
        DecodingResult::I64(buf) => split(widen(&buf), "int64"),
        DecodingResult::F32(buf) => split(buf, "float32"),
        DecodingResult::F64(buf) => split(widen(&buf), "float64"),
        #[allow(unreachable_patterns)]
        _ => Err(ViewerError::load(path, "unsupported TIFF sample format")),
    }
}

fn decode_with_image(path: &Path) -> Result<DecodedRaster, ViewerError> {
    use image::ColorType;

    let img = image::open(path).map_err(|e| ViewerError::load(path, e))?;
    let (width, height) = (img.width() as usize, img.height() as usize);

    let (samples, channels, kind) = match img.color() {
        ColorType::L8 | ColorType::La8 => (widen(img.to_luma8().as_raw()), 1, "uint8"),
        ColorType::L16 | ColorType::La16 => (widen(img.to_luma16().as_raw()), 1, "uint16"),
        ColorType::Rgb16 | ColorType::Rgba16 => (widen(img.to_rgb16().as_raw()), 3, "uint16"),
        ColorType::Rgb32F | ColorType::Rgba32F => (img.to_rgb32f().into_raw(), 3, "float32"),
        _ => (widen(img.to_rgb8().as_raw()), 3, "uint8"),
    };

    let bands = split_bands(samples, width, height, channels)
        .ok_or_else(|| ViewerError::load(path, "decoded sample count does not match its size"))?;
    Ok(DecodedRaster {
        width,
        height,
        sample_type: kind.to_string(),
        bands,
    })
}

/// Lossless-enough widening of any numeric sample to f32
trait Sample: Copy {
    fn to_f32(self) -> f32;
}

macro_rules! impl_sample {
    ($($t:ty),*) => {
        $(impl Sample for $t {
            #[inline]
            fn to_f32(self) -> f32 {
                self as f32
            }
        })*
    };
}

impl_sample!(u8, u16, u32, u64, i8, i16, i32, i64, f64);

fn widen<T: Sample>(buf: &[T]) -> Vec<f32> {
    buf.iter().map(|&v| v.to_f32()).collect()
}

/// De-interleave chunky samples into one Vec per band
fn split_bands(
    samples: Vec<f32>,
    width: usize,
    height: usize,
    samples_per_pixel: usize,
) -> Option<Vec<Vec<f32>>> {
    let pixels = width * height;
    if samples_per_pixel == 0 || samples.len() != pixels * samples_per_pixel {
        return None;
    }
    if samples_per_pixel == 1 {
        return Some(vec![samples]);
    }
    let mut bands = vec![Vec::with_capacity(pixels); samples_per_pixel];
    for pixel in samples.chunks_exact(samples_per_pixel) {
        for (band, &value) in bands.iter_mut().zip(pixel) {
            band.push(value);
        }
    }
    Some(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiff::encoder::{colortype, TiffEncoder};

    fn write_gray16(path: &Path, width: u32, height: u32, data: &[u16]) {
        let file = File::create(path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        encoder
            .write_image::<colortype::Gray16>(width, height, data)
            .unwrap();
    }

    #[test]
    fn test_decode_gray16_keeps_full_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.tif");
        write_gray16(&path, 3, 2, &[0, 1000, 2000, 30000, 40000, 65535]);

        let raster = open_raster(&path).unwrap();
        assert_eq!(raster.band_count(), 1);
        assert_eq!((raster.width, raster.height), (3, 2));
        assert_eq!(raster.sample_type, "uint16");
        assert_eq!(raster.read_band(0).unwrap()[5], 65535.0);

        let buffer = raster.to_buffer();
        assert_eq!(buffer.channels, 1);
        assert_eq!(buffer.max(), Some(65535.0));
    }

    #[test]
    fn test_decode_rgb_tiff_uses_three_bands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.tiff");
        let file = File::create(&path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        encoder
            .write_image::<colortype::RGB8>(2, 1, &[1, 2, 3, 4, 5, 6])
            .unwrap();

        let raster = open_raster(&path).unwrap();
        assert_eq!(raster.band_count(), 3);
        assert_eq!(raster.read_band(1).unwrap(), &[2.0, 5.0]);
        let buffer = raster.to_buffer();
        assert_eq!(buffer.channels, 3);
        assert_eq!(buffer.data, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_corrupt_file_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.tif");
        std::fs::write(&path, b"II*\0garbage").unwrap();
        match open_raster(&path) {
            Err(ViewerError::LoadFailure { .. }) => {}
            other => panic!("expected LoadFailure, got {:?}", other.map(|r| r.band_count())),
        }
    }

    #[test]
    fn test_missing_file_is_load_failure() {
        let err = open_raster(Path::new("/nonexistent/scene.tif")).unwrap_err();
        assert!(matches!(err, ViewerError::LoadFailure { .. }));
    }

    #[test]
    fn test_split_bands_rejects_mismatch() {
        assert!(split_bands(vec![1.0; 5], 2, 1, 3).is_none());
        let bands = split_bands(vec![1.0, 2.0, 3.0, 4.0], 2, 1, 2).unwrap();
        assert_eq!(bands, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }
}
