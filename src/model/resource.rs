//! Image payloads referenced by image primitives and image nodes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// How the image bytes are encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageEncoding {
    /// A complete JPEG file (`DCTDecode`)
    Jpeg,
    /// Decoded 8-bit samples, `components` per pixel (1 = gray, 3 = RGB)
    Raw { components: u8 },
    /// A filter the converter cannot re-encode (JPX, JBIG2, CCITT, ...)
    Opaque { filter: String },
}

/// An immutable, shareable image payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    pub encoding: ImageEncoding,
    /// Payload bytes, shared between the page and the flow document. Never
    /// part of a JSON dump; reading one back yields an empty payload.
    #[serde(skip, default = "empty_payload")]
    pub bytes: Arc<[u8]>,
}

fn empty_payload() -> Arc<[u8]> {
    Arc::from(Vec::new())
}

impl ImageData {
    pub fn jpeg(width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            width,
            height,
            encoding: ImageEncoding::Jpeg,
            bytes: Arc::from(bytes),
        }
    }

    pub fn raw(width: u32, height: u32, components: u8, bytes: Vec<u8>) -> Self {
        Self {
            width,
            height,
            encoding: ImageEncoding::Raw { components },
            bytes: Arc::from(bytes),
        }
    }

    pub fn opaque(width: u32, height: u32, filter: impl Into<String>) -> Self {
        Self {
            width,
            height,
            encoding: ImageEncoding::Opaque {
                filter: filter.into(),
            },
            bytes: empty_payload(),
        }
    }

    /// Size of the payload in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload can be re-encoded for the output document.
    pub fn is_encodable(&self) -> bool {
        match &self.encoding {
            ImageEncoding::Jpeg => !self.bytes.is_empty(),
            ImageEncoding::Raw { components } => {
                matches!(components, 1 | 3)
                    && self.bytes.len()
                        == self.width as usize * self.height as usize * *components as usize
            }
            ImageEncoding::Opaque { .. } => false,
        }
    }

    /// MIME type of the payload as stored.
    pub fn mime_type(&self) -> &'static str {
        match self.encoding {
            ImageEncoding::Jpeg => "image/jpeg",
            ImageEncoding::Raw { .. } => "application/octet-stream",
            ImageEncoding::Opaque { .. } => "application/octet-stream",
        }
    }
}
