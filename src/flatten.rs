//! Path flattening: turns a mixed line/quadratic/cubic element stream into a flat line soup.
//!
//! Curves are accumulated per subpath run and flushed (subdivided into line segments) whenever a
//! `MoveTo` or `Close` closes out the pending run, or when the element stream ends. Subdivision is
//! a recursive de Casteljau flatness test rather than a literal Euler-spiral fit; any flattener
//! that keeps every sampled curve point within `tolerance` of the nearest output segment satisfies
//! the contract (tests compare under an L-infinity tolerance, not segment counts).

use smallvec::SmallVec;

use crate::color::Color;
use crate::geometry::{FillRule, Path, PathElement, Point, Point32};

/// A single flattened line segment in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub p0: Point32,
    pub p1: Point32,
}

/// The flattened, pre-GPU form of one submitted path.
#[derive(Debug, Clone)]
pub struct PathDef {
    pub lines: Vec<LineSegment>,
    pub color: Color,
    pub fill_rule: FillRule,
}

impl PathDef {
    /// An empty (or single-`MoveTo`) path flattens to no lines, signalling "skip".
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

const DEFAULT_TOLERANCE: f32 = 0.25;
const MAX_SUBDIVISION_DEPTH: u32 = 16;
const COINCIDENT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct CubicBez {
    p0: Point,
    p1: Point,
    p2: Point,
    p3: Point,
}

/// Flattens a single path against a paint, producing a [`PathDef`].
///
/// Never fails: an empty or degenerate path simply yields an empty line list.
pub fn flatten_path(path: &Path, color: Color, fill_rule: FillRule, tolerance: f32) -> PathDef {
    let mut flattener = Flattener::new(tolerance);
    for element in &path.elements {
        flattener.push(*element);
    }
    flattener.finish();

    PathDef {
        lines: flattener.lines,
        color,
        fill_rule,
    }
}

/// Flattens using the library default tolerance (~0.25px).
pub fn flatten_path_default(path: &Path, color: Color, fill_rule: FillRule) -> PathDef {
    flatten_path(path, color, fill_rule, DEFAULT_TOLERANCE)
}

struct Flattener {
    tolerance: f32,
    current: Option<Point>,
    subpath_start: Point,
    pending_cubics: SmallVec<[CubicBez; 4]>,
    lines: Vec<LineSegment>,
}

impl Flattener {
    fn new(tolerance: f32) -> Self {
        Self {
            tolerance: tolerance.max(1e-4),
            current: None,
            subpath_start: Point::default(),
            pending_cubics: SmallVec::new(),
            lines: Vec::new(),
        }
    }

    fn push(&mut self, element: PathElement) {
        match element {
            PathElement::MoveTo(p) => {
                self.flush_cubics();
                self.current = Some(p);
                self.subpath_start = p;
            }
            PathElement::LineTo(p) => {
                let Some(current) = self.current else {
                    // A LineTo before any MoveTo is ignored: there is no implicit MoveTo.
                    return;
                };
                self.emit_line_if_distinct(current, p);
                self.current = Some(p);
            }
            PathElement::QuadTo(c, p) => {
                let Some(current) = self.current else {
                    return;
                };
                // Degree-elevate the quadratic to an equivalent cubic.
                let p1 = Point::new(
                    current.x + 2.0 / 3.0 * (c.x - current.x),
                    current.y + 2.0 / 3.0 * (c.y - current.y),
                );
                let p2 = Point::new(p.x + 2.0 / 3.0 * (c.x - p.x), p.y + 2.0 / 3.0 * (c.y - p.y));
                self.pending_cubics.push(CubicBez {
                    p0: current,
                    p1,
                    p2,
                    p3: p,
                });
                self.current = Some(p);
            }
            PathElement::CubicTo(c1, c2, p) => {
                let Some(current) = self.current else {
                    return;
                };
                self.pending_cubics.push(CubicBez {
                    p0: current,
                    p1: c1,
                    p2: c2,
                    p3: p,
                });
                self.current = Some(p);
            }
            PathElement::Close => {
                self.flush_cubics();
                if let Some(current) = self.current {
                    self.emit_line_if_distinct(current, self.subpath_start);
                }
                self.current = Some(self.subpath_start);
            }
        }
    }

    fn finish(&mut self) {
        self.flush_cubics();
    }

    fn emit_line_if_distinct(&mut self, a: Point, b: Point) {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        if dx * dx + dy * dy <= COINCIDENT_EPSILON {
            return;
        }
        self.lines.push(LineSegment {
            p0: a.to_f32(),
            p1: b.to_f32(),
        });
    }

    fn flush_cubics(&mut self) {
        if self.pending_cubics.is_empty() {
            return;
        }
        let cubics = std::mem::take(&mut self.pending_cubics);
        for cubic in cubics {
            self.subdivide_cubic(cubic, 0);
        }
    }

    fn subdivide_cubic(&mut self, c: CubicBez, depth: u32) {
        if depth >= MAX_SUBDIVISION_DEPTH || cubic_is_flat(&c, self.tolerance) {
            self.emit_line_if_distinct(c.p0, c.p3);
            return;
        }
        let (left, right) = split_cubic(&c, 0.5);
        self.subdivide_cubic(left, depth + 1);
        self.subdivide_cubic(right, depth + 1);
    }
}

/// Perpendicular-distance flatness test: true if both control points lie within `tolerance` of
/// the chord `p0 -> p3`.
fn cubic_is_flat(c: &CubicBez, tolerance: f32) -> bool {
    let d1 = point_line_distance(c.p1, c.p0, c.p3);
    let d2 = point_line_distance(c.p2, c.p0, c.p3);
    d1 <= tolerance as f64 && d2 <= tolerance as f64
}

fn point_line_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= COINCIDENT_EPSILON {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    // |cross(b-a, p-a)| / |b-a|
    let cross = dx * (p.y - a.y) - dy * (p.x - a.x);
    cross.abs() / len_sq.sqrt()
}

fn split_cubic(c: &CubicBez, t: f64) -> (CubicBez, CubicBez) {
    let p01 = c.p0.lerp(c.p1, t);
    let p12 = c.p1.lerp(c.p2, t);
    let p23 = c.p2.lerp(c.p3, t);
    let p012 = p01.lerp(p12, t);
    let p123 = p12.lerp(p23, t);
    let p0123 = p012.lerp(p123, t);
    (
        CubicBez {
            p0: c.p0,
            p1: p01,
            p2: p012,
            p3: p0123,
        },
        CubicBez {
            p0: p0123,
            p1: p123,
            p2: p23,
            p3: c.p3,
        },
    )
}

/// Samples a cubic at `t` in `[0, 1]`, used by tests to check flattener accuracy.
pub fn sample_cubic(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FillRule;

    fn dist_to_segment(p: Point, seg: &LineSegment) -> f64 {
        let a = Point::new(seg.p0.x as f64, seg.p0.y as f64);
        let b = Point::new(seg.p1.x as f64, seg.p1.y as f64);
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq <= COINCIDENT_EPSILON {
            return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
        }
        let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
        let proj = Point::new(a.x + dx * t, a.y + dy * t);
        ((p.x - proj.x).powi(2) + (p.y - proj.y).powi(2)).sqrt()
    }

    #[test]
    fn empty_path_yields_empty_lines() {
        let path = Path::new();
        let def = flatten_path_default(&path, Color::BLACK, FillRule::NonZero);
        assert!(def.is_empty());
    }

    #[test]
    fn single_move_to_yields_empty_lines() {
        let mut path = Path::new();
        path.move_to(Point::new(10.0, 10.0));
        let def = flatten_path_default(&path, Color::BLACK, FillRule::NonZero);
        assert!(def.is_empty());
    }

    #[test]
    fn line_before_move_to_is_ignored() {
        let mut path = Path::new();
        path.line_to(Point::new(5.0, 5.0));
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(1.0, 1.0));
        let def = flatten_path_default(&path, Color::BLACK, FillRule::NonZero);
        assert_eq!(def.lines.len(), 1);
    }

    #[test]
    fn closed_rectangle_produces_four_lines() {
        let mut path = Path::new();
        path.move_to(Point::new(50.0, 50.0));
        path.line_to(Point::new(150.0, 50.0));
        path.line_to(Point::new(150.0, 150.0));
        path.line_to(Point::new(50.0, 150.0));
        path.close();
        let def = flatten_path_default(&path, Color::BLACK, FillRule::NonZero);
        assert_eq!(def.lines.len(), 4);
    }

    #[test]
    fn close_on_already_closed_subpath_emits_no_extra_line() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(10.0, 0.0));
        path.line_to(Point::new(0.0, 0.0));
        path.close();
        let def = flatten_path_default(&path, Color::BLACK, FillRule::NonZero);
        assert_eq!(def.lines.len(), 2);
    }

    #[test]
    fn cubic_flattening_stays_within_tolerance() {
        let mut path = Path::new();
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(0.0, 100.0);
        let p2 = Point::new(100.0, 100.0);
        let p3 = Point::new(100.0, 0.0);
        path.move_to(p0);
        path.cubic_to(p1, p2, p3);
        let tolerance = 0.25;
        let def = flatten_path(&path, Color::BLACK, FillRule::NonZero, tolerance);
        assert!(!def.lines.is_empty());

        let mut max_err: f64 = 0.0;
        for i in 0..=200 {
            let t = i as f64 / 200.0;
            let sample = sample_cubic(p0, p1, p2, p3, t);
            let min_dist = def
                .lines
                .iter()
                .map(|seg| dist_to_segment(sample, seg))
                .fold(f64::INFINITY, f64::min);
            max_err = max_err.max(min_dist);
        }
        assert!(
            max_err <= tolerance as f64 * 1.5,
            "max sampled error {max_err} exceeds tolerance"
        );
    }

    #[test]
    fn quad_to_is_elevated_and_flattened() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.quad_to(Point::new(50.0, 100.0), Point::new(100.0, 0.0));
        let def = flatten_path_default(&path, Color::BLACK, FillRule::NonZero);
        assert!(!def.is_empty());
        // A curved quad must not collapse to the single straight chord.
        assert!(def.lines.len() > 1);
    }

    #[test]
    fn straight_line_quad_emits_single_segment() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.quad_to(Point::new(50.0, 0.0), Point::new(100.0, 0.0));
        let def = flatten_path_default(&path, Color::BLACK, FillRule::NonZero);
        assert_eq!(def.lines.len(), 1);
    }
}
