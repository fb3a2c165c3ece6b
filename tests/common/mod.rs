//! Shared fixtures: real PDFs built with lopdf, and synthetic pages.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use pdfword::model::{
    Color, ColorSpaceKind, FontRef, GlyphRun, Page, PathSegment, PathStyle, Point, Primitive, Rect,
};

/// Page height used by [`PdfBuilder`]; PDF y grows upwards from the bottom.
pub const PAGE_HEIGHT: f32 = 792.0;

/// Builder for small multi-page PDFs.
///
/// Fonts `F1` (Helvetica) and `F2` (Helvetica-Bold) are available on every
/// page, plus an image `Im1` (2x2 DeviceRGB) when requested.
#[derive(Default)]
pub struct PdfBuilder {
    pages: Vec<PageOps>,
    title: Option<String>,
}

#[derive(Default)]
struct PageOps {
    ops: Vec<Operation>,
    image: bool,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Start a new page.
    pub fn page(mut self) -> Self {
        self.pages.push(PageOps::default());
        self
    }

    fn current(&mut self) -> &mut PageOps {
        if self.pages.is_empty() {
            self.pages.push(PageOps::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Show `text` with its baseline at display coordinates `(x, top_y)`.
    pub fn text(mut self, font: &str, size: f32, x: f32, top_y: f32, text: &str) -> Self {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), real(size)]),
            Operation::new("Td", vec![real(x), real(PAGE_HEIGHT - top_y)]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ];
        self.current().ops.extend(ops);
        self
    }

    /// Stroke a straight line between display coordinates.
    pub fn line(mut self, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        let ops = vec![
            Operation::new("w", vec![real(0.5)]),
            Operation::new("m", vec![real(x0), real(PAGE_HEIGHT - y0)]),
            Operation::new("l", vec![real(x1), real(PAGE_HEIGHT - y1)]),
            Operation::new("S", vec![]),
        ];
        self.current().ops.extend(ops);
        self
    }

    /// Ruled grid with outer box and the given internal dividers.
    pub fn grid(self, x0: f32, y0: f32, x1: f32, y1: f32, rows: &[f32], cols: &[f32]) -> Self {
        let mut b = self
            .line(x0, y0, x1, y0)
            .line(x0, y1, x1, y1)
            .line(x0, y0, x0, y1)
            .line(x1, y0, x1, y1);
        for &y in rows {
            b = b.line(x0, y, x1, y);
        }
        for &x in cols {
            b = b.line(x, y0, x, y1);
        }
        b
    }

    /// Paint `Im1` into the display rectangle.
    pub fn image(mut self, x: f32, top_y: f32, width: f32, height: f32) -> Self {
        let page = self.current();
        page.image = true;
        page.ops.extend(vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(width),
                    real(0.0),
                    real(0.0),
                    real(height),
                    real(x),
                    real(PAGE_HEIGHT - top_y - height),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
            Operation::new("Q", vec![]),
        ]);
        self
    }

    pub fn build(self) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let image = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(2),
                "Height" => Object::Integer(2),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => Object::Integer(8),
            },
            vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255],
        ));

        let mut kids = Vec::new();
        for page in self.pages {
            let content = Content {
                operations: page.ops,
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().unwrap_or_default(),
            ));
            let mut resources = dictionary! {
                "Font" => dictionary! {
                    "F1" => regular,
                    "F2" => bold,
                },
            };
            if page.image {
                resources.set("XObject", dictionary! { "Im1" => image });
            }
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
                "Contents" => content_id,
                "Resources" => resources,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(count),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        if let Some(title) = self.title {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal(title),
            });
            doc.trailer.set("Info", info_id);
        }
        doc
    }

    pub fn to_bytes(self) -> Vec<u8> {
        let mut doc = self.build();
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    pub fn write(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.to_bytes()).unwrap();
        path
    }
}

fn real(v: f32) -> Object {
    Object::Real(v)
}

/// One page with a heading and two body paragraphs.
pub fn simple_document() -> PdfBuilder {
    PdfBuilder::new()
        .title("Quarterly Report")
        .page()
        .text("F2", 20.0, 72.0, 80.0, "Quarterly Report")
        .text("F1", 11.0, 72.0, 120.0, "Revenue grew in every region")
        .text("F1", 11.0, 72.0, 134.0, "during the third quarter.")
        .text("F1", 11.0, 72.0, 180.0, "Costs stayed flat.")
}

/// A PDF whose trailer declares encryption the reader cannot open.
pub fn encrypted_bytes() -> Vec<u8> {
    let mut doc = simple_document().build();
    let encrypt = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => Object::Integer(1),
        "R" => Object::Integer(2),
        "O" => Object::string_literal(vec![0x11u8; 32]),
        "U" => Object::string_literal(vec![0x22u8; 32]),
        "P" => Object::Integer(-4),
    });
    doc.trailer.set("Encrypt", encrypt);
    doc.trailer.set(
        "ID",
        vec![
            Object::string_literal(vec![0x33u8; 16]),
            Object::string_literal(vec![0x33u8; 16]),
        ],
    );
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

// Synthetic pages in display space (top-left origin, y down).

pub fn glyph(text: &str, x: f32, baseline: f32, size: f32) -> Primitive {
    glyph_with_font(text, x, baseline, size, Some("Helvetica"))
}

/// 0.5 em per character.
pub fn glyph_with_font(text: &str, x: f32, baseline: f32, size: f32, font: Option<&str>) -> Primitive {
    let width = text.chars().count() as f32 * size * 0.5;
    let font = match font {
        Some(name) => FontRef {
            resource: "F1".to_string(),
            base_font: Some(name.to_string()),
            descriptor: None,
        },
        None => FontRef::unresolved("F9"),
    };
    Primitive::Glyph(GlyphRun {
        bbox: Rect::new(x, baseline - 0.8 * size, x + width, baseline + 0.2 * size),
        baseline,
        text: text.to_string(),
        font,
        size,
        color: Color::BLACK,
        color_space: ColorSpaceKind::DeviceGray,
        rotation: 0.0,
    })
}

pub fn rule(x0: f32, y0: f32, x1: f32, y1: f32) -> Primitive {
    Primitive::Path(PathSegment {
        points: vec![Point::new(x0, y0), Point::new(x1, y1)],
        closed: false,
        style: PathStyle {
            stroke: Some(Color::BLACK),
            fill: None,
            line_width: 0.5,
        },
    })
}

pub fn synthetic_page(number: u32, primitives: Vec<Primitive>) -> Page {
    let mut page = Page::letter(number);
    page.primitives = primitives;
    page
}
