//! Graphics and text state tracked while interpreting a content stream.

use crate::model::{Color, ColorSpaceKind, Matrix, Point};

use super::backend::ColorSpaceInfo;

/// Text state parameters (saved and restored with the graphics state).
#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    /// Font resource name selected by `Tf`
    pub font: Option<Vec<u8>>,
    pub font_size: f32,
    /// `Tc`
    pub char_spacing: f32,
    /// `Tw`
    pub word_spacing: f32,
    /// `Tz` as a fraction (1.0 = 100%)
    pub horizontal_scale: f32,
    /// `TL`
    pub leading: f32,
    /// `Ts`
    pub rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// The subset of the PDF graphics state the reader needs.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub ctm: Matrix,
    pub line_width: f32,
    pub fill_space: ColorSpaceInfo,
    pub stroke_space: ColorSpaceInfo,
    pub fill: Color,
    pub stroke: Color,
    pub text: TextState,
}

impl GraphicsState {
    pub fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            line_width: 1.0,
            fill_space: ColorSpaceInfo::new(ColorSpaceKind::DeviceGray, 1),
            stroke_space: ColorSpaceInfo::new(ColorSpaceKind::DeviceGray, 1),
            fill: Color::BLACK,
            stroke: Color::BLACK,
            text: TextState::default(),
        }
    }

    /// Line width in display units, scaled by the CTM.
    pub fn device_line_width(&self) -> f32 {
        let scale = ((self.ctm.a * self.ctm.d - self.ctm.b * self.ctm.c).abs()).sqrt();
        self.line_width * if scale > 0.0 { scale } else { 1.0 }
    }
}

/// Subpaths under construction, already in display space.
#[derive(Debug, Default)]
pub struct PathBuilder {
    subpaths: Vec<(Vec<Point>, bool)>,
    /// Current point in user space (needed by `v`)
    current: Option<(f32, f32)>,
}

impl PathBuilder {
    pub fn move_to(&mut self, m: &Matrix, x: f32, y: f32) {
        self.subpaths.push((vec![m.apply(x, y)], false));
        self.current = Some((x, y));
    }

    pub fn line_to(&mut self, m: &Matrix, x: f32, y: f32) {
        match self.subpaths.last_mut() {
            Some((points, false)) => points.push(m.apply(x, y)),
            _ => self.subpaths.push((vec![m.apply(x, y)], false)),
        }
        self.current = Some((x, y));
    }

    /// Cubic Bézier, flattened into a few line segments.
    pub fn curve_to(&mut self, m: &Matrix, c1: (f32, f32), c2: (f32, f32), end: (f32, f32)) {
        let Some(start) = self.current else {
            self.move_to(m, end.0, end.1);
            return;
        };
        const STEPS: usize = 4;
        for i in 1..=STEPS {
            let t = i as f32 / STEPS as f32;
            let u = 1.0 - t;
            let x = u * u * u * start.0
                + 3.0 * u * u * t * c1.0
                + 3.0 * u * t * t * c2.0
                + t * t * t * end.0;
            let y = u * u * u * start.1
                + 3.0 * u * u * t * c1.1
                + 3.0 * u * t * t * c2.1
                + t * t * t * end.1;
            self.line_to(m, x, y);
        }
    }

    pub fn current_point(&self) -> Option<(f32, f32)> {
        self.current
    }

    pub fn rect(&mut self, m: &Matrix, x: f32, y: f32, w: f32, h: f32) {
        let points = vec![
            m.apply(x, y),
            m.apply(x + w, y),
            m.apply(x + w, y + h),
            m.apply(x, y + h),
        ];
        self.subpaths.push((points, true));
        self.current = Some((x, y));
    }

    pub fn close(&mut self) {
        if let Some((_, closed)) = self.subpaths.last_mut() {
            *closed = true;
        }
    }

    /// Take the finished subpaths, leaving the builder empty.
    pub fn take(&mut self) -> Vec<(Vec<Point>, bool)> {
        self.current = None;
        std::mem::take(&mut self.subpaths)
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }
}
