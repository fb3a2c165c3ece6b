//! Content stream interpreter.
//!
//! Walks the operators of a page (and the form XObjects it paints) and emits
//! positioned [`Primitive`]s in display space: top-left origin, y down, page
//! rotation applied.

use std::collections::HashMap;

use crate::error::Result;
use crate::model::{
    ColorSpaceKind, FontDescriptor, FontRef, GlyphRun, ImagePrimitive, Matrix, Page, PathSegment,
    PathStyle, Point, Primitive, Rect,
};

use super::backend::{
    BackendFontInfo, ColorSpaceInfo, ContentOp, PageGeometry, PageId, PdfBackend, PdfValue,
    ResourceScope, XObject,
};
use super::graphics::{GraphicsState, PathBuilder};
use super::options::ReadOptions;

/// TJ adjustments (thousandths of an em) above this split a run.
const TJ_SPLIT_THRESHOLD: f32 = 200.0;
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

#[derive(Debug, Clone)]
struct LoadedFont {
    info: BackendFontInfo,
    scope: ResourceScope,
}

impl LoadedFont {
    /// Horizontal advance of one character code, in thousandths of an em.
    fn glyph_width(&self, code: u32) -> f32 {
        let info = &self.info;
        let explicit = code
            .checked_sub(info.first_char)
            .and_then(|i| info.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0);
        explicit.unwrap_or_else(|| fallback_width(info))
    }

    fn font_ref(&self) -> FontRef {
        FontRef {
            resource: String::from_utf8_lossy(&self.info.name).to_string(),
            base_font: self.info.base_font.clone(),
            descriptor: self.info.descriptor.clone(),
        }
    }
}

fn fallback_width(info: &BackendFontInfo) -> f32 {
    if info.default_width > 0.0 {
        return info.default_width;
    }
    let fixed = info
        .descriptor
        .as_ref()
        .map(FontDescriptor::is_fixed_pitch)
        .unwrap_or(false)
        || info
            .base_font
            .as_deref()
            .map(|n| n.contains("Courier") || n.contains("Mono"))
            .unwrap_or(false);
    if fixed {
        600.0
    } else {
        500.0
    }
}

/// Text shown by consecutive TJ elements that has not been emitted yet.
#[derive(Debug)]
struct PendingRun {
    text: String,
    bbox: Rect,
    baseline: f32,
    size: f32,
    rotation: f32,
}

impl PendingRun {
    fn extend(&mut self, other: PendingRun) {
        self.text.push_str(&other.text);
        self.bbox = self.bbox.union(&other.bbox);
    }
}

/// Content stream interpreter for one page.
pub struct ContentInterpreter<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
    page_id: PageId,
    options: &'a ReadOptions,
    to_display: Matrix,
    font_cache: HashMap<ResourceScope, HashMap<Vec<u8>, LoadedFont>>,
    primitives: Vec<Primitive>,
}

/// Mutable state of one stream execution.
struct Frame {
    scope: ResourceScope,
    depth: u8,
    gs: GraphicsState,
    stack: Vec<GraphicsState>,
    tm: Matrix,
    tlm: Matrix,
    in_text: bool,
    path: PathBuilder,
}

impl<'a, B: PdfBackend + ?Sized> ContentInterpreter<'a, B> {
    pub fn new(
        backend: &'a B,
        page_id: PageId,
        geometry: &PageGeometry,
        options: &'a ReadOptions,
    ) -> Self {
        Self {
            backend,
            page_id,
            options,
            to_display: geometry.to_display(),
            font_cache: HashMap::new(),
            primitives: Vec::new(),
        }
    }

    /// Execute page-level operations and return the primitives produced.
    pub fn run(mut self, ops: &[ContentOp]) -> Vec<Primitive> {
        let scope = ResourceScope::Page(self.page_id);
        self.execute(ops, scope, Matrix::IDENTITY, 0);
        self.primitives
    }

    fn fonts(&mut self, scope: ResourceScope) -> &HashMap<Vec<u8>, LoadedFont> {
        let page_scope = ResourceScope::Page(self.page_id);
        let backend = self.backend;
        if !self.font_cache.contains_key(&scope) {
            let mut map = HashMap::new();
            // Forms without their own fonts fall back to the page's.
            if scope != page_scope {
                load_fonts(backend, page_scope, &mut map);
            }
            load_fonts(backend, scope, &mut map);
            self.font_cache.insert(scope, map);
        }
        &self.font_cache[&scope]
    }

    fn execute(&mut self, ops: &[ContentOp], scope: ResourceScope, ctm: Matrix, depth: u8) {
        let mut frame = Frame {
            scope,
            depth,
            gs: GraphicsState::new(ctm),
            stack: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            in_text: false,
            path: PathBuilder::default(),
        };

        for op in ops {
            self.apply(&mut frame, op);
        }
    }

    fn apply(&mut self, f: &mut Frame, op: &ContentOp) {
        let n = |i: usize| op.number(i).unwrap_or(0.0);
        match op.operator.as_str() {
            // Graphics state
            "q" => f.stack.push(f.gs.clone()),
            "Q" => {
                if let Some(gs) = f.stack.pop() {
                    f.gs = gs;
                }
            }
            "cm" if op.operands.len() >= 6 => {
                let m = Matrix::new(n(0), n(1), n(2), n(3), n(4), n(5));
                f.gs.ctm = m.multiply(&f.gs.ctm);
            }
            "w" => f.gs.line_width = n(0),

            // Text objects and positioning
            "BT" => {
                f.in_text = true;
                f.tm = Matrix::IDENTITY;
                f.tlm = Matrix::IDENTITY;
            }
            "ET" => f.in_text = false,
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    f.gs.text.font = Some(name.clone());
                }
                f.gs.text.font_size = n(1);
            }
            "Tc" => f.gs.text.char_spacing = n(0),
            "Tw" => f.gs.text.word_spacing = n(0),
            "Tz" => f.gs.text.horizontal_scale = n(0) / 100.0,
            "TL" => f.gs.text.leading = n(0),
            "Ts" => f.gs.text.rise = n(0),
            "Td" => next_line(f, n(0), n(1)),
            "TD" => {
                f.gs.text.leading = -n(1);
                next_line(f, n(0), n(1));
            }
            "Tm" if op.operands.len() >= 6 => {
                f.tlm = Matrix::new(n(0), n(1), n(2), n(3), n(4), n(5));
                f.tm = f.tlm;
            }
            "T*" => {
                let leading = f.gs.text.leading;
                next_line(f, 0.0, -leading);
            }

            // Text showing
            "Tj" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show_string(f, bytes);
                }
            }
            "'" => {
                let leading = f.gs.text.leading;
                next_line(f, 0.0, -leading);
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show_string(f, bytes);
                }
            }
            "\"" => {
                f.gs.text.word_spacing = n(0);
                f.gs.text.char_spacing = n(1);
                let leading = f.gs.text.leading;
                next_line(f, 0.0, -leading);
                if let Some(PdfValue::Str(bytes)) = op.operands.get(2) {
                    self.show_string(f, bytes);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    self.show_array(f, items);
                }
            }

            // Color
            "g" => set_fill(f, ColorOp::Gray, &op.numbers()),
            "G" => set_stroke(f, ColorOp::Gray, &op.numbers()),
            "rg" => set_fill(f, ColorOp::Rgb, &op.numbers()),
            "RG" => set_stroke(f, ColorOp::Rgb, &op.numbers()),
            "k" => set_fill(f, ColorOp::Cmyk, &op.numbers()),
            "K" => set_stroke(f, ColorOp::Cmyk, &op.numbers()),
            "cs" | "CS" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    let space = self.backend.color_space(f.scope, name);
                    let initial = space.to_color(&vec![0.0; space.components.max(1)]);
                    if op.operator == "cs" {
                        f.gs.fill_space = space;
                        f.gs.fill = initial;
                    } else {
                        f.gs.stroke_space = space;
                        f.gs.stroke = initial;
                    }
                }
            }
            "sc" | "scn" => {
                let values = op.numbers();
                if !values.is_empty() {
                    f.gs.fill = f.gs.fill_space.to_color(&values);
                }
            }
            "SC" | "SCN" => {
                let values = op.numbers();
                if !values.is_empty() {
                    f.gs.stroke = f.gs.stroke_space.to_color(&values);
                }
            }

            // Path construction
            "m" => {
                let m = f.gs.ctm.multiply(&self.to_display);
                f.path.move_to(&m, n(0), n(1));
            }
            "l" => {
                let m = f.gs.ctm.multiply(&self.to_display);
                f.path.line_to(&m, n(0), n(1));
            }
            "c" => {
                let m = f.gs.ctm.multiply(&self.to_display);
                f.path.curve_to(&m, (n(0), n(1)), (n(2), n(3)), (n(4), n(5)));
            }
            "v" => {
                let m = f.gs.ctm.multiply(&self.to_display);
                let c1 = f.path.current_point().unwrap_or((n(0), n(1)));
                f.path.curve_to(&m, c1, (n(0), n(1)), (n(2), n(3)));
            }
            "y" => {
                let m = f.gs.ctm.multiply(&self.to_display);
                f.path.curve_to(&m, (n(0), n(1)), (n(2), n(3)), (n(2), n(3)));
            }
            "re" => {
                let m = f.gs.ctm.multiply(&self.to_display);
                f.path.rect(&m, n(0), n(1), n(2), n(3));
            }
            "h" => f.path.close(),

            // Path painting
            "S" => self.paint(f, true, false, false),
            "s" => self.paint(f, true, false, true),
            "f" | "F" | "f*" => self.paint(f, false, true, false),
            "B" | "B*" => self.paint(f, true, true, false),
            "b" | "b*" => self.paint(f, true, true, true),
            "n" => {
                f.path.take();
            }

            // External objects
            "Do" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.paint_xobject(f, name);
                }
            }
            "sh" => self.primitives.push(Primitive::Unsupported {
                kind: "shading".to_string(),
                bbox: None,
            }),
            "BI" => {
                let m = f.gs.ctm.multiply(&self.to_display);
                self.primitives.push(Primitive::Unsupported {
                    kind: "inline image".to_string(),
                    bbox: Some(unit_square(&m)),
                });
            }
            _ => {}
        }
    }

    fn paint(&mut self, f: &mut Frame, stroke: bool, fill: bool, close: bool) {
        if close {
            f.path.close();
        }
        let style = PathStyle {
            stroke: stroke.then_some(f.gs.stroke),
            fill: fill.then_some(f.gs.fill),
            line_width: f.gs.device_line_width(),
        };
        for (points, closed) in f.path.take() {
            if points.len() < 2 {
                continue;
            }
            self.primitives.push(Primitive::Path(PathSegment {
                points,
                closed,
                style: style.clone(),
            }));
        }
    }

    fn paint_xobject(&mut self, f: &Frame, name: &[u8]) {
        let label = String::from_utf8_lossy(name).to_string();
        let decode = self.options.extract_images;
        match self.backend.xobject(f.scope, name, decode) {
            Some(XObject::Image(data)) => {
                let m = f.gs.ctm.multiply(&self.to_display);
                self.primitives.push(Primitive::Image(ImagePrimitive {
                    bbox: unit_square(&m),
                    name: label,
                    data,
                }));
            }
            Some(XObject::SkippedImage) => {}
            Some(XObject::Form {
                id,
                content,
                matrix,
            }) => {
                if f.depth >= self.options.max_form_depth {
                    log::warn!("form XObject {} nested too deeply, skipped", label);
                    return;
                }
                match self.backend.decode_content(&content) {
                    Ok(ops) => {
                        let ctm = matrix.multiply(&f.gs.ctm);
                        self.execute(&ops, ResourceScope::Form(id), ctm, f.depth + 1);
                    }
                    Err(e) => log::warn!("form XObject {} unreadable: {}", label, e),
                }
            }
            Some(XObject::Other(subtype)) => {
                let m = f.gs.ctm.multiply(&self.to_display);
                self.primitives.push(Primitive::Unsupported {
                    kind: format!("{} XObject", subtype),
                    bbox: Some(unit_square(&m)),
                });
            }
            None => log::debug!("XObject {} not found", label),
        }
    }

    fn show_string(&mut self, f: &mut Frame, bytes: &[u8]) {
        if let Some(piece) = self.layout_string(f, bytes) {
            self.emit(f, piece);
        }
    }

    fn show_array(&mut self, f: &mut Frame, items: &[PdfValue]) {
        let mut pending: Option<PendingRun> = None;
        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    if let Some(piece) = self.layout_string(f, bytes) {
                        match pending.as_mut() {
                            Some(run) => run.extend(piece),
                            None => pending = Some(piece),
                        }
                    }
                }
                other => {
                    let Some(adjust) = other.as_number() else {
                        continue;
                    };
                    let ts = &f.gs.text;
                    let tx = -adjust / 1000.0 * ts.font_size * ts.horizontal_scale;
                    f.tm = Matrix::translate(tx, 0.0).multiply(&f.tm);
                    if -adjust > TJ_SPLIT_THRESHOLD {
                        if let Some(run) = pending.take() {
                            self.emit(f, run);
                        }
                    }
                }
            }
        }
        if let Some(run) = pending {
            self.emit(f, run);
        }
    }

    /// Decode and measure a string at the current text matrix, then advance
    /// the text matrix past it.
    fn layout_string(&mut self, f: &mut Frame, bytes: &[u8]) -> Option<PendingRun> {
        if !f.in_text {
            return None;
        }
        let font_name = f.gs.text.font.clone().unwrap_or_default();
        let font = self.fonts(f.scope).get(&font_name).cloned();
        let ts = f.gs.text.clone();

        let text = match &font {
            Some(font) => self.backend.decode_text(font.scope, &font_name, bytes),
            None => self.backend.decode_text(f.scope, &font_name, bytes),
        };

        let composite = font.as_ref().map(|ft| ft.info.composite).unwrap_or(false);
        let codes: Vec<u32> = if composite {
            bytes
                .chunks(2)
                .map(|c| c.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32))
                .collect()
        } else {
            bytes.iter().map(|b| *b as u32).collect()
        };

        let mut advance = 0.0;
        for code in &codes {
            let w0 = match &font {
                Some(font) => font.glyph_width(*code),
                None => 500.0,
            };
            let word = if !composite && *code == 32 {
                ts.word_spacing
            } else {
                0.0
            };
            advance += (w0 / 1000.0 * ts.font_size + ts.char_spacing + word) * ts.horizontal_scale;
        }

        let m = f.tm.multiply(&f.gs.ctm).multiply(&self.to_display);
        let bottom = ts.rise - DESCENT * ts.font_size;
        let top = ts.rise + ASCENT * ts.font_size;
        let corners = [
            m.apply(0.0, bottom),
            m.apply(advance, bottom),
            m.apply(advance, top),
            m.apply(0.0, top),
        ];
        let bbox = Rect::from_points(&corners)?;
        let origin: Point = m.apply(0.0, ts.rise);

        let user = f.tm.multiply(&f.gs.ctm);
        let size = ts.font_size * user.vertical_scale();
        let rotation = normalize_degrees(m.rotation_degrees());

        f.tm = Matrix::translate(advance, 0.0).multiply(&f.tm);

        if font.is_none() && !font_name.is_empty() {
            log::debug!(
                "font {} not found in resources",
                String::from_utf8_lossy(&font_name)
            );
        }

        Some(PendingRun {
            text,
            bbox,
            baseline: origin.y,
            size,
            rotation,
        })
    }

    fn emit(&mut self, f: &Frame, run: PendingRun) {
        if run.text.trim().is_empty() {
            return;
        }
        let font_name = f.gs.text.font.clone().unwrap_or_default();
        let font = match self.fonts(f.scope).get(&font_name) {
            Some(font) => font.font_ref(),
            None => FontRef::unresolved(String::from_utf8_lossy(&font_name)),
        };
        self.primitives.push(Primitive::Glyph(GlyphRun {
            bbox: run.bbox,
            baseline: run.baseline,
            text: run.text,
            font,
            size: run.size,
            color: f.gs.fill,
            color_space: f.gs.fill_space.kind.clone(),
            rotation: run.rotation,
        }));
    }
}

fn load_fonts<B: PdfBackend + ?Sized>(
    backend: &B,
    scope: ResourceScope,
    map: &mut HashMap<Vec<u8>, LoadedFont>,
) {
    match backend.fonts(scope) {
        Ok(fonts) => {
            for info in fonts {
                map.insert(info.name.clone(), LoadedFont { info, scope });
            }
        }
        Err(e) => log::warn!("font resources unreadable: {}", e),
    }
}

fn next_line(f: &mut Frame, tx: f32, ty: f32) {
    f.tlm = Matrix::translate(tx, ty).multiply(&f.tlm);
    f.tm = f.tlm;
}

enum ColorOp {
    Gray,
    Rgb,
    Cmyk,
}

fn device_space(op: &ColorOp) -> ColorSpaceInfo {
    match op {
        ColorOp::Gray => ColorSpaceInfo::new(ColorSpaceKind::DeviceGray, 1),
        ColorOp::Rgb => ColorSpaceInfo::new(ColorSpaceKind::DeviceRgb, 3),
        ColorOp::Cmyk => ColorSpaceInfo::new(ColorSpaceKind::DeviceCmyk, 4),
    }
}

fn set_fill(f: &mut Frame, op: ColorOp, values: &[f32]) {
    let space = device_space(&op);
    f.gs.fill = space.to_color(values);
    f.gs.fill_space = space;
}

fn set_stroke(f: &mut Frame, op: ColorOp, values: &[f32]) {
    let space = device_space(&op);
    f.gs.stroke = space.to_color(values);
    f.gs.stroke_space = space;
}

fn unit_square(m: &Matrix) -> Rect {
    let corners = [
        m.apply(0.0, 0.0),
        m.apply(1.0, 0.0),
        m.apply(1.0, 1.0),
        m.apply(0.0, 1.0),
    ];
    Rect::from_points(&corners).unwrap_or_default()
}

fn normalize_degrees(deg: f32) -> f32 {
    let mut d = deg % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

/// Interpret one page into a [`Page`] of primitives.
pub fn interpret_page<B: PdfBackend + ?Sized>(
    backend: &B,
    page_id: PageId,
    number: u32,
    options: &ReadOptions,
) -> Result<Page> {
    let geometry = backend.page_geometry(page_id)?;
    let content = backend.page_content(page_id)?;
    let ops = if content.is_empty() {
        Vec::new()
    } else {
        backend.decode_content(&content)?
    };

    let (width, height) = geometry.displayed_size();
    let mut page = Page::new(number, width, height);
    page.rotation = geometry.rotation;
    page.primitives = ContentInterpreter::new(backend, page_id, &geometry, options).run(&ops);

    log::debug!(
        "page {}: {} operators, {} primitives",
        number,
        ops.len(),
        page.primitives.len()
    );
    Ok(page)
}
