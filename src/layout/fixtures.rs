//! Synthetic page builders for layout unit tests.

use crate::model::{
    Color, ColorSpaceKind, FontDescriptor, FontRef, GlyphRun, Page, PathSegment, PathStyle,
    Point, Primitive, Rect,
};

/// A glyph run at `x` on `baseline`, 0.5 em per character.
pub fn glyph(text: &str, x: f32, baseline: f32, size: f32) -> Primitive {
    glyph_with_font(text, x, baseline, size, "Helvetica")
}

pub fn glyph_with_font(text: &str, x: f32, baseline: f32, size: f32, font: &str) -> Primitive {
    let width = text.chars().count() as f32 * size * 0.5;
    Primitive::Glyph(GlyphRun {
        bbox: Rect::new(x, baseline - 0.8 * size, x + width, baseline + 0.2 * size),
        baseline,
        text: text.to_string(),
        font: FontRef {
            resource: "F1".to_string(),
            base_font: Some(font.to_string()),
            descriptor: None::<FontDescriptor>,
        },
        size,
        color: Color::BLACK,
        color_space: ColorSpaceKind::DeviceGray,
        rotation: 0.0,
    })
}

pub fn rotated(mut prim: Primitive, degrees: f32) -> Primitive {
    if let Primitive::Glyph(g) = &mut prim {
        g.rotation = degrees;
    }
    prim
}

/// A stroked straight segment.
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

pub fn page(primitives: Vec<Primitive>) -> Page {
    let mut page = Page::letter(1);
    page.primitives = primitives;
    page
}

/// Outer box from `(x0, y0)` to `(x1, y1)` with the given internal dividers.
pub fn ruled_box(x0: f32, y0: f32, x1: f32, y1: f32, rows: &[f32], cols: &[f32]) -> Vec<Primitive> {
    let mut prims = vec![
        rule(x0, y0, x1, y0),
        rule(x0, y1, x1, y1),
        rule(x0, y0, x0, y1),
        rule(x1, y0, x1, y1),
    ];
    prims.extend(rows.iter().map(|&y| rule(x0, y, x1, y)));
    prims.extend(cols.iter().map(|&x| rule(x, y0, x, y1)));
    prims
}
