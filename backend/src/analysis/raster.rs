//! RGB raster input and image decoding

use image::imageops::FilterType;
use ndarray::Array3;

use super::error::{PipelineError, PipelineResult};

/// Default longest side, in pixels, that an image is analysed at
pub const DEFAULT_MAX_DIMENSION: u32 = 128;

/// An H×W×3 raster with channel values in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct RasterRgb {
    data: Array3<f32>,
}

impl RasterRgb {
    /// Wrap an H×W×3 array. Values are clamped to [0, 1]; non-finite values become 0.
    pub fn from_array(mut data: Array3<f32>) -> PipelineResult<Self> {
        let (height, width, channels) = data.dim();
        if channels != 3 {
            return Err(PipelineError::InvalidImage(format!(
                "expected 3 colour channels, got {}",
                channels
            )));
        }
        if height == 0 || width == 0 {
            return Err(PipelineError::InvalidImage(
                "image has zero-sized dimensions".to_string(),
            ));
        }
        data.mapv_inplace(|v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 });
        Ok(Self { data })
    }

    /// Build from interleaved 8-bit RGB samples in row-major order
    pub fn from_rgb8(width: u32, height: u32, pixels: &[u8]) -> PipelineResult<Self> {
        let (w, h) = (width as usize, height as usize);
        if pixels.len() != w * h * 3 {
            return Err(PipelineError::InvalidImage(format!(
                "expected {} RGB samples for {}x{} image, got {}",
                w * h * 3,
                width,
                height,
                pixels.len()
            )));
        }
        let values = pixels.iter().map(|&p| p as f32 / 255.0).collect();
        let data = Array3::from_shape_vec((h, w, 3), values)
            .map_err(|e| PipelineError::InvalidImage(e.to_string()))?;
        Self::from_array(data)
    }

    /// A raster where every pixel has the same 8-bit colour
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> PipelineResult<Self> {
        let pixels: Vec<u8> = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::from_rgb8(width, height, &pixels)
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    /// `[red, green, blue]` of one pixel
    pub fn pixel(&self, row: usize, col: usize) -> [f32; 3] {
        [
            self.data[[row, col, 0]],
            self.data[[row, col, 1]],
            self.data[[row, col, 2]],
        ]
    }
}

/// Decode encoded image bytes (jpeg, png, tiff, bmp, ...) into a raster.
///
/// Images whose longest side exceeds `max_dimension` are downsampled with
/// aspect ratio preserved, which bounds the size of the spectral cube.
pub fn decode_image(bytes: &[u8], max_dimension: u32) -> PipelineResult<RasterRgb> {
    if bytes.is_empty() {
        return Err(PipelineError::InvalidImage("image payload is empty".to_string()));
    }

    let image = image::load_from_memory(bytes)
        .map_err(|e| PipelineError::InvalidImage(format!("cannot decode image: {}", e)))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(PipelineError::InvalidImage(
            "image has zero-sized dimensions".to_string(),
        ));
    }

    let limit = max_dimension.max(1);
    let image = if image.width() > limit || image.height() > limit {
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            limit,
            "Downsampling image for analysis"
        );
        image.resize(limit, limit, FilterType::Triangle)
    } else {
        image
    };

    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    RasterRgb::from_rgb8(width, height, rgb.as_raw())
}
