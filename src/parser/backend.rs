//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the object-level operations the
//! content interpreter needs, isolating the concrete PDF library (lopdf)
//! from primitive extraction.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::model::{Color, ColorSpaceKind, FontDescriptor, ImageData, Matrix};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Where resource names are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceScope {
    Page(PageId),
    /// A form XObject with its own resource dictionary
    Form(ObjectId),
}

/// Page box and rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// `[x0, y0, x1, y1]` in default user space
    pub media_box: [f32; 4],
    /// Clockwise display rotation: 0, 90, 180 or 270
    pub rotation: u16,
}

impl PageGeometry {
    pub fn width(&self) -> f32 {
        (self.media_box[2] - self.media_box[0]).abs()
    }

    pub fn height(&self) -> f32 {
        (self.media_box[3] - self.media_box[1]).abs()
    }

    /// Width and height as displayed, after rotation.
    pub fn displayed_size(&self) -> (f32, f32) {
        match self.rotation {
            90 | 270 => (self.height(), self.width()),
            _ => (self.width(), self.height()),
        }
    }

    /// Transform from user space to top-left-origin display space.
    pub fn to_display(&self) -> Matrix {
        let (w, h) = (self.width(), self.height());
        let flip = match self.rotation {
            90 => Matrix::new(0.0, 1.0, 1.0, 0.0, 0.0, 0.0),
            180 => Matrix::new(-1.0, 0.0, 0.0, 1.0, w, 0.0),
            270 => Matrix::new(0.0, -1.0, -1.0, 0.0, h, w),
            _ => Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, h),
        };
        Matrix::translate(
            -self.media_box[0].min(self.media_box[2]),
            -self.media_box[1].min(self.media_box[3]),
        )
        .multiply(&flip)
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            media_box: [0.0, 0.0, 612.0, 792.0],
            rotation: 0,
        }
    }
}

/// Font information returned by the backend.
#[derive(Debug, Clone, Default)]
pub struct BackendFontInfo {
    /// Font resource name (key in the font dictionary).
    pub name: Vec<u8>,
    /// Base font name (e.g., "Helvetica-Bold").
    pub base_font: Option<String>,
    /// `/Subtype` (Type1, TrueType, Type0, Type3)
    pub subtype: String,
    pub descriptor: Option<FontDescriptor>,
    /// First character code covered by `widths`
    pub first_char: u32,
    /// Glyph widths in thousandths of an em
    pub widths: Vec<f32>,
    /// Width for codes outside `widths`; 0 when the font gives none
    pub default_width: f32,
    /// Two-byte character codes (Type0)
    pub composite: bool,
}

/// A resolved color space.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpaceInfo {
    pub kind: ColorSpaceKind,
    pub components: usize,
}

impl ColorSpaceInfo {
    pub fn new(kind: ColorSpaceKind, components: usize) -> Self {
        Self { kind, components }
    }

    /// Convert operand components to sRGB.
    pub fn to_color(&self, values: &[f32]) -> Color {
        match (&self.kind, values) {
            (ColorSpaceKind::DeviceGray, [g, ..]) => Color::from_gray(*g),
            (ColorSpaceKind::DeviceRgb, [r, g, b, ..]) => Color::from_rgb(*r, *g, *b),
            (ColorSpaceKind::DeviceCmyk, [c, m, y, k, ..]) => Color::from_cmyk(*c, *m, *y, *k),
            (ColorSpaceKind::Unsupported(name), [tint])
                if name == "Separation" || name == "DeviceN" =>
            {
                Color::from_gray(1.0 - tint)
            }
            (_, [g]) => Color::from_gray(*g),
            (_, [r, g, b]) => Color::from_rgb(*r, *g, *b),
            (_, [c, m, y, k]) => Color::from_cmyk(*c, *m, *y, *k),
            _ => Color::BLACK,
        }
    }
}

/// An XObject referenced by `Do`.
#[derive(Debug, Clone)]
pub enum XObject {
    Image(ImageData),
    /// Image present but not decoded (image extraction disabled)
    SkippedImage,
    Form {
        id: ObjectId,
        content: Vec<u8>,
        matrix: Matrix,
    },
    Other(String),
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            PdfValue::Integer(i) => Some(*i as f32),
            PdfValue::Real(r) => Some(*r),
            _ => None,
        }
    }
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    pub fn new(operator: &str, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.to_string(),
            operands,
        }
    }

    /// Numeric operand at `i`, if present.
    pub fn number(&self, i: usize) -> Option<f32> {
        self.operands.get(i).and_then(PdfValue::as_number)
    }

    /// All numeric operands, in order.
    pub fn numbers(&self) -> Vec<f32> {
        self.operands.iter().filter_map(PdfValue::as_number).collect()
    }
}

/// Abstract interface for PDF document access.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Page box and rotation, with inheritance resolved.
    fn page_geometry(&self, page: PageId) -> Result<PageGeometry>;

    /// Fonts declared in a resource scope.
    fn fonts(&self, scope: ResourceScope) -> Result<Vec<BackendFontInfo>>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the font's encoding.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, scope: ResourceScope, font_name: &[u8], bytes: &[u8]) -> String;

    /// Resolve a color space name (device name or resource entry).
    fn color_space(&self, scope: ResourceScope, name: &[u8]) -> ColorSpaceInfo;

    /// Resolve an XObject by resource name.
    fn xobject(&self, scope: ResourceScope, name: &[u8], decode_images: bool) -> Option<XObject>;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// LopdfBackend: the lopdf-backed reader
// ---------------------------------------------------------------------------

const MAX_INHERIT_DEPTH: usize = 32;

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Ok(Self { doc })
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self { doc })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Check if the document is (still) encrypted after loading.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Follow references until a direct object is reached.
    fn resolve<'a>(&'a self, mut obj: &'a Object) -> Option<&'a Object> {
        for _ in 0..MAX_INHERIT_DEPTH {
            match obj {
                Object::Reference(id) => obj = self.doc.get_object(*id).ok()?,
                other => return Some(other),
            }
        }
        None
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(obj)? {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    fn resolve_number(&self, obj: &Object) -> Option<f32> {
        match self.resolve(obj)? {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Look up a page attribute, walking up the `/Parent` chain.
    fn inherited<'a>(&'a self, page: PageId, key: &[u8]) -> Option<&'a Object> {
        let mut dict = self.doc.get_dictionary(page).ok()?;
        for _ in 0..MAX_INHERIT_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            let parent = dict.get(b"Parent").ok()?;
            dict = self.resolve_dict(parent)?;
        }
        None
    }

    fn resources(&self, scope: ResourceScope) -> Option<&Dictionary> {
        match scope {
            ResourceScope::Page(page) => self.resolve_dict(self.inherited(page, b"Resources")?),
            ResourceScope::Form(id) => {
                let stream = self.doc.get_object(id).ok()?.as_stream().ok()?;
                self.resolve_dict(stream.dict.get(b"Resources").ok()?)
            }
        }
    }

    fn resource_entry(&self, scope: ResourceScope, category: &[u8], name: &[u8]) -> Option<&Object> {
        let category = self.resolve_dict(self.resources(scope)?.get(category).ok()?)?;
        category.get(name).ok()
    }

    fn font_dict(&self, scope: ResourceScope, name: &[u8]) -> Option<&Dictionary> {
        self.resolve_dict(self.resource_entry(scope, b"Font", name)?)
    }

    fn font_info(&self, name: &[u8], dict: &Dictionary) -> BackendFontInfo {
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string());
        let subtype = dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_default();
        let composite = subtype == "Type0";

        // Composite fonts keep metrics on their descendant CIDFont.
        let metrics_dict = if composite {
            dict.get(b"DescendantFonts")
                .ok()
                .and_then(|o| self.resolve(o))
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .and_then(|o| self.resolve_dict(o))
                .unwrap_or(dict)
        } else {
            dict
        };

        let descriptor = metrics_dict
            .get(b"FontDescriptor")
            .ok()
            .and_then(|o| self.resolve_dict(o))
            .map(|d| self.parse_descriptor(d));

        let widths = metrics_dict
            .get(b"Widths")
            .ok()
            .and_then(|o| self.resolve(o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| self.resolve_number(w).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();

        let first_char = metrics_dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| self.resolve_number(o))
            .unwrap_or(0.0)
            .max(0.0) as u32;

        let default_width = if composite {
            metrics_dict
                .get(b"DW")
                .ok()
                .and_then(|o| self.resolve_number(o))
                .unwrap_or(1000.0)
        } else {
            metrics_dict
                .get(b"FontDescriptor")
                .ok()
                .and_then(|o| self.resolve_dict(o))
                .and_then(|d| d.get(b"MissingWidth").ok())
                .and_then(|o| self.resolve_number(o))
                .unwrap_or(0.0)
        };

        BackendFontInfo {
            name: name.to_vec(),
            base_font,
            subtype,
            descriptor,
            first_char,
            widths,
            default_width,
            composite,
        }
    }

    fn parse_descriptor(&self, dict: &Dictionary) -> FontDescriptor {
        let family = dict.get(b"FontFamily").ok().and_then(|o| match self.resolve(o)? {
            Object::String(bytes, _) => Some(decode_text_simple(bytes)),
            Object::Name(n) => Some(String::from_utf8_lossy(n).to_string()),
            _ => None,
        });
        let number = |key: &[u8]| dict.get(key).ok().and_then(|o| self.resolve_number(o));

        FontDescriptor {
            family,
            weight: number(b"FontWeight").map(|w| w.clamp(0.0, 1000.0) as u16),
            flags: number(b"Flags").unwrap_or(0.0).max(0.0) as u32,
            italic_angle: number(b"ItalicAngle").unwrap_or(0.0),
        }
    }

    fn resolve_color_space(&self, scope: ResourceScope, obj: &Object, depth: u8) -> ColorSpaceInfo {
        let unsupported = |name: &str, n| ColorSpaceInfo::new(ColorSpaceKind::Unsupported(name.into()), n);
        if depth > 4 {
            return ColorSpaceInfo::new(ColorSpaceKind::DeviceGray, 1);
        }
        match self.resolve(obj) {
            Some(Object::Name(name)) => self.color_space_by_name(scope, name, depth + 1),
            Some(Object::Array(arr)) => {
                let family = arr
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_default();
                match family.as_str() {
                    "ICCBased" => {
                        let n = arr
                            .get(1)
                            .and_then(|o| self.resolve_dict(o))
                            .and_then(|d| d.get(b"N").ok())
                            .and_then(|o| self.resolve_number(o))
                            .unwrap_or(3.0) as usize;
                        ColorSpaceInfo::new(ColorSpaceKind::Calibrated, n)
                    }
                    "CalRGB" => ColorSpaceInfo::new(ColorSpaceKind::Calibrated, 3),
                    "CalGray" => ColorSpaceInfo::new(ColorSpaceKind::Calibrated, 1),
                    "DeviceN" => {
                        let n = arr
                            .get(1)
                            .and_then(|o| self.resolve(o))
                            .and_then(|o| o.as_array().ok())
                            .map(|a| a.len())
                            .unwrap_or(1);
                        unsupported("DeviceN", n)
                    }
                    "Lab" => unsupported("Lab", 3),
                    "Separation" | "Indexed" | "Pattern" => unsupported(&family, 1),
                    other => self.color_space_by_name(scope, other.as_bytes(), depth + 1),
                }
            }
            _ => unsupported("Unknown", 1),
        }
    }

    fn color_space_by_name(&self, scope: ResourceScope, name: &[u8], depth: u8) -> ColorSpaceInfo {
        match name {
            b"DeviceGray" | b"G" => ColorSpaceInfo::new(ColorSpaceKind::DeviceGray, 1),
            b"DeviceRGB" | b"RGB" => ColorSpaceInfo::new(ColorSpaceKind::DeviceRgb, 3),
            b"DeviceCMYK" | b"CMYK" => ColorSpaceInfo::new(ColorSpaceKind::DeviceCmyk, 4),
            b"Pattern" => ColorSpaceInfo::new(ColorSpaceKind::Unsupported("Pattern".into()), 1),
            _ => match self.resource_entry(scope, b"ColorSpace", name) {
                Some(obj) => self.resolve_color_space(scope, obj, depth),
                None => ColorSpaceInfo::new(
                    ColorSpaceKind::Unsupported(String::from_utf8_lossy(name).to_string()),
                    1,
                ),
            },
        }
    }

    fn decode_image(&self, stream: &Stream) -> ImageData {
        let dict = &stream.dict;
        let number = |key: &[u8]| dict.get(key).ok().and_then(|o| self.resolve_number(o));
        let width = number(b"Width").unwrap_or(0.0).max(0.0) as u32;
        let height = number(b"Height").unwrap_or(0.0).max(0.0) as u32;

        let filters = stream_filters(dict);
        let is_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
        if is_mask {
            return ImageData::opaque(width, height, "ImageMask");
        }

        if filters.last().map(String::as_str) == Some("DCTDecode") {
            if filters.len() == 1 {
                return ImageData::jpeg(width, height, stream.content.clone());
            }
            return ImageData::opaque(width, height, filters.join("+"));
        }
        if let Some(f) = filters
            .iter()
            .find(|f| matches!(f.as_str(), "JPXDecode" | "JBIG2Decode" | "CCITTFaxDecode"))
        {
            return ImageData::opaque(width, height, f.as_str());
        }

        let samples = if filters.is_empty() {
            stream.content.clone()
        } else {
            match stream.decompressed_content() {
                Ok(data) => data,
                Err(e) => {
                    log::debug!("image stream could not be decompressed: {}", e);
                    return ImageData::opaque(width, height, filters.join("+"));
                }
            }
        };

        let bpc = number(b"BitsPerComponent").unwrap_or(8.0) as u32;
        if bpc != 8 {
            return ImageData::opaque(width, height, format!("{}-bit samples", bpc));
        }

        let components = match dict.get(b"ColorSpace").ok().and_then(|o| self.resolve(o)) {
            Some(Object::Name(n)) if n.as_slice() == b"DeviceGray" => 1,
            Some(Object::Name(n)) if n.as_slice() == b"DeviceRGB" => 3,
            Some(Object::Name(n)) if n.as_slice() == b"DeviceCMYK" => 4,
            Some(Object::Array(arr))
                if arr.first().and_then(|o| o.as_name().ok()) == Some(b"ICCBased".as_slice()) =>
            {
                arr.get(1)
                    .and_then(|o| self.resolve_dict(o))
                    .and_then(|d| d.get(b"N").ok())
                    .and_then(|o| self.resolve_number(o))
                    .unwrap_or(3.0) as usize
            }
            _ => return ImageData::opaque(width, height, "unsupported image color space"),
        };

        match components {
            1 | 3 => ImageData::raw(width, height, components as u8, samples),
            4 => {
                let rgb = samples
                    .chunks_exact(4)
                    .flat_map(|px| {
                        let c = Color::from_cmyk(
                            px[0] as f32 / 255.0,
                            px[1] as f32 / 255.0,
                            px[2] as f32 / 255.0,
                            px[3] as f32 / 255.0,
                        );
                        [c.r, c.g, c.b]
                    })
                    .collect();
                ImageData::raw(width, height, 3, rgb)
            }
            n => ImageData::opaque(width, height, format!("{} color components", n)),
        }
    }
}

fn stream_filters(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => vec![String::from_utf8_lossy(n).to_string()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .collect(),
        _ => Vec::new(),
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_geometry(&self, page: PageId) -> Result<PageGeometry> {
        let page_box = self
            .inherited(page, b"CropBox")
            .or_else(|| self.inherited(page, b"MediaBox"))
            .and_then(|o| self.resolve(o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| self.resolve_number(v))
                    .collect::<Vec<_>>()
            });

        let media_box = match page_box.as_deref() {
            Some([x0, y0, x1, y1, ..]) if (x1 - x0).abs() > 0.0 && (y1 - y0).abs() > 0.0 => {
                [*x0, *y0, *x1, *y1]
            }
            _ => PageGeometry::default().media_box,
        };

        let rotate = self
            .inherited(page, b"Rotate")
            .and_then(|o| self.resolve_number(o))
            .unwrap_or(0.0) as i64;
        let rotation = (((rotate % 360) + 360) % 360 / 90 * 90) as u16;

        Ok(PageGeometry {
            media_box,
            rotation,
        })
    }

    fn fonts(&self, scope: ResourceScope) -> Result<Vec<BackendFontInfo>> {
        let Some(resources) = self.resources(scope) else {
            return Ok(Vec::new());
        };
        let Some(font_map) = resources
            .get(b"Font")
            .ok()
            .and_then(|o| self.resolve_dict(o))
        else {
            return Ok(Vec::new());
        };

        Ok(font_map
            .iter()
            .filter_map(|(name, obj)| {
                self.resolve_dict(obj)
                    .map(|dict| self.font_info(name, dict))
            })
            .collect())
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::UnreadableDocument(e.to_string()))?;

        // A page without /Contents is blank.
        let Ok(contents) = page_dict.get(b"Contents") else {
            return Ok(Vec::new());
        };

        let stream_bytes = |s: &Stream| -> Result<Vec<u8>> {
            if stream_filters(&s.dict).is_empty() {
                Ok(s.content.clone())
            } else {
                s.decompressed_content()
                    .map_err(|e| Error::UnreadableDocument(e.to_string()))
            }
        };

        match self.resolve(contents) {
            Some(Object::Stream(s)) => stream_bytes(s),
            Some(Object::Array(arr)) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Some(Object::Stream(s)) = self.resolve(obj) {
                        content.extend_from_slice(&stream_bytes(s)?);
                        content.push(b' ');
                    }
                }
                Ok(content)
            }
            _ => Err(Error::UnreadableDocument(format!(
                "invalid content stream on page object {} {}",
                page_id.0, page_id.1
            ))),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content = lopdf::content::Content::decode(data)
            .map_err(|e| Error::UnreadableDocument(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, scope: ResourceScope, font_name: &[u8], bytes: &[u8]) -> String {
        if let Some(font_dict) = self.font_dict(scope, font_name) {
            if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn color_space(&self, scope: ResourceScope, name: &[u8]) -> ColorSpaceInfo {
        self.color_space_by_name(scope, name, 0)
    }

    fn xobject(&self, scope: ResourceScope, name: &[u8], decode_images: bool) -> Option<XObject> {
        let entry = self.resource_entry(scope, b"XObject", name)?;
        let id = entry.as_reference().ok();
        let stream = self.resolve(entry)?.as_stream().ok()?;

        let subtype = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .unwrap_or(b"");

        match subtype {
            b"Image" if decode_images => Some(XObject::Image(self.decode_image(stream))),
            b"Image" => Some(XObject::SkippedImage),
            b"Form" => {
                let id = id?;
                let content = if stream_filters(&stream.dict).is_empty() {
                    stream.content.clone()
                } else {
                    stream.decompressed_content().ok()?
                };
                let m = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|o| self.resolve(o))
                    .and_then(|o| o.as_array().ok())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|v| self.resolve_number(v))
                            .collect::<Vec<_>>()
                    });
                let matrix = match m.as_deref() {
                    Some([a, b, c, d, e, f]) => Matrix::new(*a, *b, *c, *d, *e, *f),
                    _ => Matrix::IDENTITY,
                };
                Some(XObject::Form {
                    id,
                    content,
                    matrix,
                })
            }
            other => Some(XObject::Other(String::from_utf8_lossy(other).to_string())),
        }
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point;

    #[test]
    fn test_decode_text_simple_utf8() {
        assert_eq!(decode_text_simple(b"Hello"), "Hello");
    }

    #[test]
    fn test_decode_text_simple_latin1() {
        // 0xE9 = 'é' in Latin-1
        let bytes = vec![0x48, 0x65, 0x6C, 0x6C, 0xE9];
        assert_eq!(decode_text_simple(&bytes), "Hellé");
    }

    #[test]
    fn test_decode_text_simple_utf16be() {
        let bytes = vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_text_simple(&bytes), "Hi");
    }

    #[test]
    fn test_display_transform_unrotated() {
        let geom = PageGeometry::default();
        let m = geom.to_display();
        assert_eq!(m.apply(0.0, 792.0), Point::new(0.0, 0.0));
        assert_eq!(m.apply(100.0, 692.0), Point::new(100.0, 100.0));
        assert_eq!(geom.displayed_size(), (612.0, 792.0));
    }

    #[test]
    fn test_display_transform_rotated() {
        let geom = PageGeometry {
            media_box: [0.0, 0.0, 612.0, 792.0],
            rotation: 90,
        };
        let m = geom.to_display();
        // Bottom-left of the portrait page ends up top-left of the landscape view.
        assert_eq!(m.apply(0.0, 0.0), Point::new(0.0, 0.0));
        assert_eq!(m.apply(612.0, 0.0), Point::new(0.0, 612.0));
        assert_eq!(geom.displayed_size(), (792.0, 612.0));
    }

    #[test]
    fn test_display_transform_offset_media_box() {
        let geom = PageGeometry {
            media_box: [10.0, 20.0, 210.0, 320.0],
            rotation: 0,
        };
        assert_eq!(geom.to_display().apply(10.0, 320.0), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_color_space_conversion() {
        let rgb = ColorSpaceInfo::new(ColorSpaceKind::DeviceRgb, 3);
        assert_eq!(rgb.to_color(&[1.0, 0.0, 0.0]), Color::new(255, 0, 0));

        let sep = ColorSpaceInfo::new(ColorSpaceKind::Unsupported("Separation".into()), 1);
        assert_eq!(sep.to_color(&[1.0]), Color::BLACK);

        let icc = ColorSpaceInfo::new(ColorSpaceKind::Calibrated, 3);
        assert_eq!(icc.to_color(&[0.0, 0.0, 1.0]), Color::new(0, 0, 255));
    }

    #[test]
    fn test_content_op_numbers() {
        let op = ContentOp::new(
            "Td",
            vec![PdfValue::Integer(72), PdfValue::Real(-14.5)],
        );
        assert_eq!(op.number(0), Some(72.0));
        assert_eq!(op.numbers(), vec![72.0, -14.5]);
        assert_eq!(op.number(2), None);
    }
}
