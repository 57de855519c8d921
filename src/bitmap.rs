//! Captured bitmaps and vertical slice encoding.
//!
//! A [`Bitmap`] is the opaque product of a block capture: RGBA pixels plus
//! integer dimensions. The engine never mutates one; it only reads vertical
//! ranges out of it. PNG is used for the placed images because it is
//! lossless: JPEG artefacts on rendered text and chart hairlines are exactly
//! the kind of degradation a print export must not introduce.
//!
//! Page sinks consume images as `data:image/png;base64,…` URLs, the common
//! denominator across document writers.

use crate::error::ExportError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, RgbaImage};
use std::io::Cursor as IoCursor;
use tracing::debug;

/// A rasterised block: RGBA pixels at the capture's device-pixel density.
///
/// Owned by the rasterizer until handed to the slice engine; read-only from
/// then on.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pixels: RgbaImage,
}

impl Bitmap {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width_px(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height_px(&self) -> u32 {
        self.pixels.height()
    }

    /// True when either dimension is zero and nothing can be placed.
    pub fn is_empty(&self) -> bool {
        self.width_px() == 0 || self.height_px() == 0
    }

    /// Encode the whole bitmap as a PNG data URL.
    pub fn to_data_url(&self) -> Result<String, ExportError> {
        self.slice_data_url(0, self.height_px())
    }

    /// Encode the vertical pixel range `[y, y+height)` as a PNG data URL.
    ///
    /// The range is clamped to the bitmap; callers are expected to have
    /// validated it beforehand, so clamping is a belt check, not an API.
    ///
    /// # Errors
    /// [`ExportError::SliceEncodeFailed`] when the clamped range is empty or
    /// PNG encoding fails.
    pub fn slice_data_url(&self, y: u32, height: u32) -> Result<String, ExportError> {
        let encode_err = |detail: String| ExportError::SliceEncodeFailed {
            y_px: y,
            height_px: height,
            width_px: self.width_px(),
            bitmap_height_px: self.height_px(),
            detail,
        };

        let y = y.min(self.height_px());
        let height = height.min(self.height_px() - y);
        if self.width_px() == 0 || height == 0 {
            return Err(encode_err("empty slice".into()));
        }

        let slice = image::imageops::crop_imm(&self.pixels, 0, y, self.width_px(), height);
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(slice.to_image())
            .write_to(&mut IoCursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| encode_err(e.to_string()))?;

        let b64 = STANDARD.encode(&buf);
        debug!(
            "Encoded slice [{}, {}) of {}x{} → {} bytes base64",
            y,
            y + height,
            self.width_px(),
            self.height_px(),
            b64.len()
        );
        Ok(format!("data:image/png;base64,{b64}"))
    }
}

impl From<RgbaImage> for Bitmap {
    fn from(pixels: RgbaImage) -> Self {
        Self::new(pixels)
    }
}
