//! Style resolution: font/graphics state → [`StyleRecord`].

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{
    Alignment, ColorSpaceKind, FidelityReason, FontDescriptor, FontRef, GlyphRun, Page,
    Primitive, Rect, StyleRecord,
};

use super::config::LayoutConfig;

/// Standard-14 families and the installed families they map to.
const STANDARD_FAMILIES: &[(&str, &str)] = &[
    ("Helvetica", "Arial"),
    ("Times", "Times New Roman"),
    ("Courier", "Courier New"),
];

const BOLD_WORDS: &[&str] = &[
    "bold", "black", "heavy", "semibold", "demi", "demibold", "extrabold", "ultrabold",
];
const ITALIC_WORDS: &[&str] = &["italic", "oblique"];

/// Style words dropped from the end of a family name.
const STYLE_WORDS: &[&str] = &[
    "Bold", "Italic", "Oblique", "Regular", "Black", "Heavy", "Semibold", "SemiBold",
    "Demi", "Light", "Medium", "Book", "Normal",
];

fn subset_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{6}\+").expect("subset prefix pattern is a valid regex"))
}

/// Normalized font face derived from a font reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFace {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
    /// `(requested, substitute)` when a standard family was mapped
    pub substitution: Option<(String, String)>,
}

/// Resolve the face of a font reference, or `None` when it is unresolved.
pub fn resolve_font(font: &FontRef) -> Option<FontFace> {
    let base = font.base_font.as_deref()?;
    let name = subset_prefix().replace(base, "");
    let (family_part, style_part) = match name.find(['-', ',']) {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => (&name[..], ""),
    };

    let tokens = name_tokens(&name);
    let has = |set: &[&str]| tokens.iter().any(|t| set.contains(&t.as_str()));
    let mut bold = has(BOLD_WORDS);
    let mut italic = has(ITALIC_WORDS);

    let mut family = family_name(family_part);
    if let Some(descriptor) = &font.descriptor {
        bold |= descriptor_is_bold(descriptor);
        italic |= descriptor_is_italic(descriptor);
        if let Some(declared) = descriptor.family.as_deref().filter(|f| !f.trim().is_empty()) {
            family = family_name(declared);
        }
    }
    if family.is_empty() {
        family = family_name(style_part);
    }
    if family.is_empty() {
        return None;
    }

    let substitution = STANDARD_FAMILIES
        .iter()
        .find(|(std, _)| family == *std)
        .map(|(std, installed)| (std.to_string(), installed.to_string()));
    if let Some((_, installed)) = &substitution {
        family = installed.clone();
    }

    Some(FontFace {
        family,
        bold,
        italic,
        substitution,
    })
}

/// Lowercased words of a font name, split at `-`, `,` and CamelCase:
/// "Arial-BoldItalicMT" → ["arial", "bold", "italic", "mt"].
fn name_tokens(name: &str) -> Vec<String> {
    name.split(['-', ','])
        .flat_map(split_camel_case)
        .map(|w| w.to_ascii_lowercase())
        .collect()
}

fn descriptor_is_bold(d: &FontDescriptor) -> bool {
    d.weight.is_some_and(|w| w >= 600) || d.flags & FontDescriptor::FLAG_FORCE_BOLD != 0
}

fn descriptor_is_italic(d: &FontDescriptor) -> bool {
    d.flags & FontDescriptor::FLAG_ITALIC != 0 || d.italic_angle.abs() > 0.1
}

/// Turn a PostScript family fragment into a display family name:
/// "TimesNewRomanPSMT" → "Times New Roman", "ArialBold" → "Arial".
pub fn family_name(raw: &str) -> String {
    let mut core = raw.trim();
    for suffix in ["PSMT", "MT", "PS"] {
        if let Some(stripped) = core.strip_suffix(suffix) {
            if !stripped.is_empty() {
                core = stripped;
                break;
            }
        }
    }

    let mut words = split_camel_case(core);
    while words.len() > 1 && words.last().is_some_and(|w| STYLE_WORDS.contains(&w.as_str())) {
        words.pop();
    }
    words.join(" ")
}

/// Split "TimesNewRoman" into ["Times", "New", "Roman"]; runs of capitals
/// stay together ("MSGothic" → ["MS", "Gothic"]).
fn split_camel_case(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' || c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();
        let boundary = c.is_uppercase()
            && !current.is_empty()
            && (prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit())
                || (prev.is_some_and(char::is_uppercase) && next.is_some_and(char::is_lowercase)));
        if boundary {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Maps glyph runs to style records for one page.
pub struct StyleResolver<'a> {
    config: &'a LayoutConfig,
    /// Thin horizontal strokes that may underline text
    underlines: Vec<Rect>,
}

impl<'a> StyleResolver<'a> {
    /// Collect underline candidates from `page`, ignoring paths inside the
    /// `excluded` areas (ruled tables).
    pub fn for_page(page: &Page, config: &'a LayoutConfig, excluded: &[Rect]) -> Self {
        let underlines = page
            .primitives
            .iter()
            .filter_map(Primitive::as_path)
            .filter_map(|path| {
                let bbox = path.bbox()?;
                let thickness = if path.style.stroke.is_some() {
                    path.style.line_width.max(bbox.height())
                } else if path.style.fill.is_some() {
                    bbox.height()
                } else {
                    return None;
                };
                let thin = thickness <= config.ruling_max_thickness && bbox.height() <= 0.5 + thickness;
                (thin && bbox.width() > 0.0).then_some(bbox)
            })
            .filter(|bbox| !excluded.iter().any(|area| area.intersects(bbox)))
            .collect();

        Self { config, underlines }
    }

    /// Resolve one run.
    ///
    /// Returns the style (alignment left at its default) and the fidelity
    /// reasons raised on the way. Never fails: unresolved fonts fall back to
    /// the default body face.
    pub fn resolve(&self, run: &GlyphRun) -> (StyleRecord, Vec<FidelityReason>) {
        let mut notes = Vec::new();
        let mut style = StyleRecord::default_body().with_size_pt(run.size);
        style.color = run.color;
        style.underline = self.is_underlined(run);

        match resolve_font(&run.font) {
            Some(face) => {
                style.font_family = face.family;
                style.bold = face.bold;
                style.italic = face.italic;
                if let Some((requested, substitute)) = face.substitution {
                    notes.push(FidelityReason::FontSubstitution {
                        requested,
                        substitute,
                    });
                }
            }
            None => notes.push(FidelityReason::UnknownFont {
                resource: run.font.resource.clone(),
            }),
        }

        if let ColorSpaceKind::Unsupported(name) = &run.color_space {
            notes.push(FidelityReason::UnsupportedColorSpace { name: name.clone() });
        }

        (style, notes)
    }

    fn is_underlined(&self, run: &GlyphRun) -> bool {
        let width = run.bbox.width();
        if width <= 0.0 {
            return false;
        }
        let max_offset = self.config.underline_max_offset * run.size;
        self.underlines.iter().any(|u| {
            let y = u.center().y;
            y >= run.baseline - 0.05 * run.size
                && y <= run.baseline + max_offset
                && u.horizontal_overlap(&run.bbox) >= self.config.underline_min_coverage * width
        })
    }
}

/// Alignment of a paragraph from its line boxes relative to the text area
/// it sits in.
pub fn paragraph_alignment(lines: &[Rect], area: Rect, font_size: f32) -> Alignment {
    let Some(first) = lines.first() else {
        return Alignment::Left;
    };
    let tol = (0.25 * font_size).max(2.0);
    let area_center = area.center().x;

    if lines.len() == 1 {
        let left_gap = first.x0 - area.x0;
        let right_gap = area.x1 - first.x1;
        if left_gap > 2.0 * tol && (left_gap - right_gap).abs() <= 2.0 * tol {
            return Alignment::Center;
        }
        if left_gap > 2.0 * tol && right_gap <= tol {
            return Alignment::Right;
        }
        return Alignment::Left;
    }

    let body = &lines[1..];
    let lefts_aligned = spread(body, |r| r.x0) <= tol;
    let all_but_last = &lines[..lines.len() - 1];
    let rights_aligned = spread(all_but_last, |r| r.x1) <= tol;
    let centers_aligned = spread(lines, |r| r.center().x) <= tol;

    if lefts_aligned && rights_aligned && lines.len() > 2 {
        return Alignment::Justify;
    }
    if lefts_aligned && rights_aligned {
        // Two lines: justified when the first line reaches the right edge.
        let full = (area.x1 - all_but_last[0].x1).abs() <= tol;
        return if full { Alignment::Justify } else { Alignment::Left };
    }
    if lefts_aligned {
        return Alignment::Left;
    }
    if centers_aligned && (lines[0].center().x - area_center).abs() <= 2.0 * tol {
        return Alignment::Center;
    }
    if spread(lines, |r| r.x1) <= tol {
        return Alignment::Right;
    }
    Alignment::Left
}

/// Distance between the smallest and largest value of `f` over `rects`.
fn spread(rects: &[Rect], f: impl Fn(&Rect) -> f32) -> f32 {
    let (lo, hi) = rects
        .iter()
        .map(f)
        .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    hi - lo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::fixtures::{glyph, glyph_with_font, page, rule};
    use crate::model::Color;

    fn font(base: &str) -> FontRef {
        FontRef {
            resource: "F1".into(),
            base_font: Some(base.into()),
            descriptor: None,
        }
    }

    fn run_of(prim: Primitive) -> GlyphRun {
        match prim {
            Primitive::Glyph(g) => g,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_family_name_cleanup() {
        assert_eq!(family_name("TimesNewRomanPSMT"), "Times New Roman");
        assert_eq!(family_name("ArialMT"), "Arial");
        assert_eq!(family_name("ArialBold"), "Arial");
        assert_eq!(family_name("MSGothic"), "MS Gothic");
        assert_eq!(family_name("Calibri"), "Calibri");
    }

    #[test]
    fn test_resolve_standard_font() {
        let face = resolve_font(&font("Helvetica-BoldOblique")).unwrap();
        assert_eq!(face.family, "Arial");
        assert!(face.bold);
        assert!(face.italic);
        assert_eq!(
            face.substitution,
            Some(("Helvetica".to_string(), "Arial".to_string()))
        );

        let times = resolve_font(&font("Times-Roman")).unwrap();
        assert_eq!(times.family, "Times New Roman");
        assert!(!times.bold && !times.italic);
    }

    #[test]
    fn test_style_words_match_whole_tokens() {
        for name in ["Academy", "Blackadder-Regular", "Heavyweight", "Italica"] {
            let face = resolve_font(&font(name)).unwrap();
            assert!(!face.bold, "{} resolved as bold", name);
            assert!(!face.italic, "{} resolved as italic", name);
        }
        for name in ["ArialBlack", "MyriadPro-SemiBold", "Garamond,Demibold", "Lato-HeavyItalic"] {
            assert!(resolve_font(&font(name)).unwrap().bold, "{} not bold", name);
        }
        assert!(resolve_font(&font("Lato-HeavyItalic")).unwrap().italic);
    }

    #[test]
    fn test_resolve_subset_font() {
        let face = resolve_font(&font("ABCDEF+Calibri-Bold")).unwrap();
        assert_eq!(face.family, "Calibri");
        assert!(face.bold);
        assert!(face.substitution.is_none());
    }

    #[test]
    fn test_descriptor_signals() {
        let f = FontRef {
            resource: "F2".into(),
            base_font: Some("XYZABC+F2".into()),
            descriptor: Some(FontDescriptor {
                family: Some("Source Sans Pro".into()),
                weight: Some(700),
                flags: FontDescriptor::FLAG_ITALIC,
                italic_angle: 0.0,
            }),
        };
        let face = resolve_font(&f).unwrap();
        assert_eq!(face.family, "Source Sans Pro");
        assert!(face.bold);
        assert!(face.italic);
    }

    #[test]
    fn test_unknown_font_falls_back_to_default_body() {
        let config = LayoutConfig::default();
        let resolver = StyleResolver::for_page(&page(Vec::new()), &config, &[]);
        let mut run = run_of(glyph("text", 72.0, 100.0, 11.0));
        run.font = FontRef::unresolved("F9");
        run.color = Color::new(200, 0, 0);

        let (style, notes) = resolver.resolve(&run);
        assert!(style.has_default_face());
        assert_eq!(style.size_pt(), 11.0);
        assert_eq!(style.color, Color::new(200, 0, 0));
        assert_eq!(
            notes,
            vec![FidelityReason::UnknownFont {
                resource: "F9".into()
            }]
        );
    }

    #[test]
    fn test_equal_runs_resolve_equal() {
        let config = LayoutConfig::default();
        let resolver = StyleResolver::for_page(&page(Vec::new()), &config, &[]);
        let a = resolver.resolve(&run_of(glyph_with_font("one", 72.0, 100.0, 10.0, "Arial,Bold"))).0;
        let b = resolver.resolve(&run_of(glyph_with_font("two", 200.0, 300.0, 10.0, "Arial-Bold"))).0;
        assert_eq!(a, b);
        assert!(a.bold);
    }

    #[test]
    fn test_unsupported_color_space_noted() {
        let config = LayoutConfig::default();
        let resolver = StyleResolver::for_page(&page(Vec::new()), &config, &[]);
        let mut run = run_of(glyph("spot", 72.0, 100.0, 10.0));
        run.color_space = ColorSpaceKind::Unsupported("Separation".into());
        let (_, notes) = resolver.resolve(&run);
        assert!(notes.contains(&FidelityReason::UnsupportedColorSpace {
            name: "Separation".into()
        }));
    }

    #[test]
    fn test_underline_detection() {
        let config = LayoutConfig::default();
        // "under" spans 72..97 at size 10; the stroke sits 2pt below baseline.
        let p = page(vec![rule(72.0, 102.0, 97.0, 102.0)]);
        let resolver = StyleResolver::for_page(&p, &config, &[]);
        assert!(resolver.resolve(&run_of(glyph("under", 72.0, 100.0, 10.0))).0.underline);
        assert!(!resolver.resolve(&run_of(glyph("above", 72.0, 80.0, 10.0))).0.underline);

        let excluded = StyleResolver::for_page(&p, &config, &[Rect::new(60.0, 90.0, 120.0, 110.0)]);
        assert!(!excluded.resolve(&run_of(glyph("under", 72.0, 100.0, 10.0))).0.underline);
    }

    #[test]
    fn test_alignment() {
        let area = Rect::new(72.0, 0.0, 540.0, 800.0);
        let justified = [
            Rect::new(72.0, 0.0, 540.0, 10.0),
            Rect::new(72.0, 12.0, 540.0, 22.0),
            Rect::new(72.0, 24.0, 300.0, 34.0),
        ];
        assert_eq!(paragraph_alignment(&justified, area, 10.0), Alignment::Justify);

        let ragged = [
            Rect::new(72.0, 0.0, 500.0, 10.0),
            Rect::new(72.0, 12.0, 450.0, 22.0),
            Rect::new(72.0, 24.0, 300.0, 34.0),
        ];
        assert_eq!(paragraph_alignment(&ragged, area, 10.0), Alignment::Left);

        let title = [Rect::new(256.0, 0.0, 356.0, 20.0)];
        assert_eq!(paragraph_alignment(&title, area, 18.0), Alignment::Center);

        let date = [Rect::new(440.0, 0.0, 540.0, 10.0)];
        assert_eq!(paragraph_alignment(&date, area, 10.0), Alignment::Right);

        assert_eq!(paragraph_alignment(&[], area, 10.0), Alignment::Left);
    }
}
