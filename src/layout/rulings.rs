//! Ruling-line detection.
//!
//! Stroked segments and hairline fills become horizontal and vertical
//! rulings; connected networks of rulings that form at least one box with an
//! internal divider are table-region candidates.

use crate::model::{Color, Page, PathSegment, Primitive, Rect, Ruling, RulingGrid};

use super::config::LayoutConfig;

/// Axis tolerance for calling a segment horizontal or vertical (points).
const AXIS_TOLERANCE: f32 = 0.5;

/// A ruled table-region candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct RuledRegion {
    pub bbox: Rect,
    pub grid: RulingGrid,
}

/// Extract raw horizontal and vertical edges from the page's paths.
pub fn extract_edges(page: &Page, config: &LayoutConfig) -> (Vec<Ruling>, Vec<Ruling>) {
    let mut horizontals = Vec::new();
    let mut verticals = Vec::new();

    for path in page.primitives.iter().filter_map(Primitive::as_path) {
        if path.style.stroke.is_some_and(|c| c != Color::WHITE) {
            stroke_edges(path, config, &mut horizontals, &mut verticals);
        } else if path.style.fill.is_some_and(|c| c != Color::WHITE) {
            if let Some(bbox) = path.bbox() {
                fill_edge(bbox, config, &mut horizontals, &mut verticals);
            }
        }
    }

    (horizontals, verticals)
}

fn stroke_edges(
    path: &PathSegment,
    config: &LayoutConfig,
    horizontals: &mut Vec<Ruling>,
    verticals: &mut Vec<Ruling>,
) {
    let points = &path.points;
    let closing = if path.closed && points.len() > 2 {
        points.last().zip(points.first())
    } else {
        None
    };
    let pairs = points.windows(2).map(|w| (&w[0], &w[1])).chain(closing);

    for (a, b) in pairs {
        let (dx, dy) = ((b.x - a.x).abs(), (b.y - a.y).abs());
        if dy <= AXIS_TOLERANCE && dx >= config.ruling_min_length {
            horizontals.push(Ruling::new((a.y + b.y) / 2.0, a.x, b.x));
        } else if dx <= AXIS_TOLERANCE && dy >= config.ruling_min_length {
            verticals.push(Ruling::new((a.x + b.x) / 2.0, a.y, b.y));
        }
    }
}

fn fill_edge(
    bbox: Rect,
    config: &LayoutConfig,
    horizontals: &mut Vec<Ruling>,
    verticals: &mut Vec<Ruling>,
) {
    let (w, h) = (bbox.width(), bbox.height());
    if h <= config.ruling_max_thickness && w >= config.ruling_min_length {
        horizontals.push(Ruling::new(bbox.center().y, bbox.x0, bbox.x1));
    } else if w <= config.ruling_max_thickness && h >= config.ruling_min_length {
        verticals.push(Ruling::new(bbox.center().x, bbox.y0, bbox.y1));
    }
}

/// Snap rulings at nearly equal positions together and join collinear
/// pieces that touch or overlap.
pub fn merge_rulings(mut rulings: Vec<Ruling>, tolerance: f32) -> Vec<Ruling> {
    rulings.sort_by(|a, b| a.position.total_cmp(&b.position));

    // Group by position.
    let mut groups: Vec<Vec<Ruling>> = Vec::new();
    for r in rulings {
        match groups.last_mut() {
            Some(group) if r.position - group[0].position <= tolerance => group.push(r),
            _ => groups.push(vec![r]),
        }
    }

    let mut merged = Vec::new();
    for mut group in groups {
        let position = group.iter().map(|r| r.position).sum::<f32>() / group.len() as f32;
        group.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut current: Option<Ruling> = None;
        for r in group {
            current = match current {
                Some(c) if r.start <= c.end + tolerance => {
                    Some(Ruling::new(position, c.start, c.end.max(r.end)))
                }
                Some(c) => {
                    merged.push(c);
                    Some(Ruling::new(position, r.start, r.end))
                }
                None => Some(Ruling::new(position, r.start, r.end)),
            };
        }
        merged.extend(current);
    }
    merged
}

fn crosses(h: &Ruling, v: &Ruling, tolerance: f32) -> bool {
    v.position >= h.start - tolerance
        && v.position <= h.end + tolerance
        && h.position >= v.start - tolerance
        && h.position <= v.end + tolerance
}

/// Disjoint-set forest over ruling indices.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb.max(ra)] = ra.min(rb);
        }
    }
}

/// Find connected ruling networks that can hold a table.
///
/// A candidate needs two horizontals and two verticals (a box) plus at least
/// one internal divider in either direction.
pub fn find_ruled_regions(page: &Page, config: &LayoutConfig) -> Vec<RuledRegion> {
    let (h, v) = extract_edges(page, config);
    let tol = config.ruling_snap_tolerance;
    let horizontals = merge_rulings(h, tol);
    let verticals = merge_rulings(v, tol);
    if horizontals.len() < 2 || verticals.len() < 2 {
        return Vec::new();
    }

    let nh = horizontals.len();
    let mut sets = UnionFind::new(nh + verticals.len());
    for (i, hr) in horizontals.iter().enumerate() {
        for (j, vr) in verticals.iter().enumerate() {
            if crosses(hr, vr, tol) {
                sets.union(i, nh + j);
            }
        }
    }

    let mut components: Vec<(usize, RulingGrid)> = Vec::new();
    for i in 0..nh + verticals.len() {
        let root = sets.find(i);
        let slot = match components.iter().position(|(r, _)| *r == root) {
            Some(slot) => slot,
            None => {
                components.push((root, RulingGrid::default()));
                components.len() - 1
            }
        };
        let grid = &mut components[slot].1;
        if i < nh {
            grid.horizontals.push(horizontals[i]);
        } else {
            grid.verticals.push(verticals[i - nh]);
        }
    }

    let regions: Vec<RuledRegion> = components
        .into_iter()
        .map(|(_, grid)| grid)
        .filter(|g| {
            g.horizontals.len() >= 2
                && g.verticals.len() >= 2
                && (g.horizontals.len() >= 3 || g.verticals.len() >= 3)
        })
        .filter_map(|grid| {
            let bbox = grid_bbox(&grid)?;
            Some(RuledRegion { bbox, grid })
        })
        .collect();

    log::debug!(
        "page {}: {} ruled region candidates from {} horizontal / {} vertical rulings",
        page.number,
        regions.len(),
        horizontals.len(),
        verticals.len()
    );
    regions
}

fn grid_bbox(grid: &RulingGrid) -> Option<Rect> {
    let hs = grid
        .horizontals
        .iter()
        .map(|r| Rect::new(r.start, r.position, r.end, r.position));
    let vs = grid
        .verticals
        .iter()
        .map(|r| Rect::new(r.position, r.start, r.position, r.end));
    hs.chain(vs).reduce(|a, b| a.union(&b))
}
