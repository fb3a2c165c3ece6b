//! Image re-encoding for embedding.
//!
//! Every embedded picture is written as PNG. JPEG payloads are decoded
//! first, raw sample buffers are wrapped directly.

use std::io::Cursor;
use std::str::FromStr;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{ImageData, ImageEncoding};

/// Caps the pixel size of embedded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl ImageQuality {
    /// Largest accepted width or height in pixels.
    pub fn max_dimension(self) -> u32 {
        match self {
            ImageQuality::Low => 800,
            ImageQuality::Medium => 1600,
            ImageQuality::High => 4096,
        }
    }
}

impl FromStr for ImageQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(ImageQuality::Low),
            "medium" => Ok(ImageQuality::Medium),
            "high" => Ok(ImageQuality::High),
            other => Err(Error::InvalidArgument(format!(
                "unknown image quality '{}' (expected low, medium or high)",
                other
            ))),
        }
    }
}

/// A PNG ready to embed.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Source size when the image was downscaled
    pub downscaled_from: Option<(u32, u32)>,
}

/// Re-encode `data` as PNG within the quality cap.
///
/// The error string says why the payload cannot be embedded; the caller
/// turns it into a fidelity note.
pub fn encode_image(data: &ImageData, quality: ImageQuality) -> std::result::Result<EncodedImage, String> {
    if data.width == 0 || data.height == 0 {
        return Err("image has no pixels".to_string());
    }

    let decoded = match &data.encoding {
        ImageEncoding::Jpeg => image::load_from_memory_with_format(&data.bytes, ImageFormat::Jpeg)
            .map_err(|e| format!("JPEG payload cannot be decoded: {}", e))?,
        ImageEncoding::Raw { components: 1 } => {
            GrayImage::from_raw(data.width, data.height, data.bytes.to_vec())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| "gray sample buffer does not match the image size".to_string())?
        }
        ImageEncoding::Raw { components: 3 } => {
            RgbImage::from_raw(data.width, data.height, data.bytes.to_vec())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| "RGB sample buffer does not match the image size".to_string())?
        }
        ImageEncoding::Raw { components } => {
            return Err(format!("{} samples per pixel are not supported", components))
        }
        ImageEncoding::Opaque { filter } => {
            return Err(format!("{} payload cannot be re-encoded", filter))
        }
    };

    let cap = quality.max_dimension();
    let (width, height) = (decoded.width(), decoded.height());
    let (image, downscaled_from) = if width > cap || height > cap {
        let resized = decoded.resize(cap, cap, FilterType::Triangle);
        log::debug!(
            "image downscaled from {}x{} to {}x{}",
            width,
            height,
            resized.width(),
            resized.height()
        );
        (resized, Some((width, height)))
    } else {
        (decoded, None)
    };

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| format!("PNG encoding failed: {}", e))?;

    Ok(EncodedImage {
        png,
        width: image.width(),
        height: image.height(),
        downscaled_from,
    })
}
