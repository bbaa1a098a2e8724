//! Backend-free geometry: histogram bins, bar rectangles, heatmap cells,
//! contour segments, pie wedges and marker outlines.

use std::f64::consts::PI;

use crate::models::{Contours, Trace};
use crate::style::LineDash;

use super::util::nice_ticks;

/// Binned counts of a histogram trace.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Binned {
    pub edges: Vec<f64>,
    pub heights: Vec<f64>,
}

/// Bin a histogram trace's `x` values.
///
/// Bin bounds come from `xbins.start`/`xbins.end` when set, otherwise from the
/// data. The bin count is `nbinsx`, else derived from `xbins.size`, else
/// Sturges' rule.
pub(crate) fn histogram(trace: &Trace) -> Option<Binned> {
    let values: Vec<f64> = trace
        .x
        .as_deref()?
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    if values.is_empty() {
        return None;
    }
    let bins = trace.xbins.clone().unwrap_or_default();
    let data_lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let data_hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut lo = bins.start.unwrap_or(data_lo);
    let mut hi = bins.end.unwrap_or(data_hi);
    if hi <= lo {
        lo -= 0.5;
        hi += 0.5;
    }
    let count = match (trace.nbinsx, bins.size) {
        (Some(n), _) if n > 0 => n,
        (_, Some(size)) if size > 0.0 => ((hi - lo) / size).ceil().max(1.0) as usize,
        _ => ((values.len() as f64).log2().ceil() as usize + 1).max(1),
    };
    let width = (hi - lo) / count as f64;
    let mut heights = vec![0.0; count];
    for v in values.iter().copied().filter(|v| *v >= lo && *v <= hi) {
        let idx = (((v - lo) / width).floor() as usize).min(count - 1);
        heights[idx] += 1.0;
    }
    let total = values.len() as f64;
    match trace.histnorm.as_deref() {
        Some("probability density") => heights.iter_mut().for_each(|h| *h /= total * width),
        Some("probability") => heights.iter_mut().for_each(|h| *h /= total),
        Some("percent") => heights.iter_mut().for_each(|h| *h *= 100.0 / total),
        _ => {}
    }
    let edges = (0..=count).map(|i| lo + i as f64 * width).collect();
    Some(Binned { edges, heights })
}

/// One bar in data units: `p0..p1` along the category axis, `v0..v1` along the
/// value axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BarRect {
    pub p0: f64,
    pub p1: f64,
    pub v0: f64,
    pub v1: f64,
}

/// Smallest gap between distinct positions, `1.0` for fewer than two.
fn min_spacing(positions: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = positions.iter().copied().filter(|p| p.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))))
        .unwrap_or(1.0)
}

/// Bars of `slot` out of `slots` side-by-side bar series.
pub(crate) fn bar_rects(
    positions: &[f64],
    lengths: &[f64],
    width: Option<f64>,
    base: Option<f64>,
    slot: usize,
    slots: usize,
) -> Vec<BarRect> {
    let slots = slots.max(1);
    let group = width.unwrap_or_else(|| 0.8 * min_spacing(positions));
    let w = group / slots as f64;
    let base = base.unwrap_or(0.0);
    positions
        .iter()
        .zip(lengths)
        .filter(|(p, l)| p.is_finite() && l.is_finite())
        .map(|(&p, &l)| {
            let p0 = p - group / 2.0 + slot as f64 * w;
            BarRect {
                p0,
                p1: p0 + w,
                v0: base,
                v1: base + l,
            }
        })
        .collect()
}

/// Cell boundaries for `n` cells along one heatmap axis. Coordinates may be
/// cell centers (`n` values), cell edges (`n + 1`), or absent (centers at
/// `0..n`).
pub(crate) fn cell_edges(coords: Option<&[f64]>, n: usize) -> Vec<f64> {
    match coords {
        Some(c) if c.len() == n + 1 => c.to_vec(),
        Some(c) if c.len() == n && n >= 2 => {
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(c[0] - (c[1] - c[0]) / 2.0);
            edges.extend(c.windows(2).map(|w| (w[0] + w[1]) / 2.0));
            edges.push(c[n - 1] + (c[n - 1] - c[n - 2]) / 2.0);
            edges
        }
        Some(c) if c.len() == 1 && n == 1 => vec![c[0] - 0.5, c[0] + 0.5],
        _ => (0..=n).map(|i| i as f64 - 0.5).collect(),
    }
}

/// Finite min/max over a 2-D grid.
pub(crate) fn z_range(z: &[Vec<f64>]) -> Option<(f64, f64)> {
    super::util::min_max(z.iter().flatten().copied())
}

/// Contour levels: explicit `start`/`end`/`size` when given, otherwise round
/// numbers strictly inside the data range.
pub(crate) fn contour_levels(contours: Option<&Contours>, lo: f64, hi: f64) -> Vec<f64> {
    if let Some(Contours {
        start: Some(start),
        end: Some(end),
        size,
        ..
    }) = contours
    {
        let size = size.filter(|s| *s > 0.0);
        return match size {
            Some(size) => (0..)
                .map(|k| start + k as f64 * size)
                .take_while(|v| *v <= end + size * 1e-9)
                .take(500)
                .collect(),
            None => vec![*start],
        };
    }
    let (ticks, _) = nice_ticks(lo, hi, 10);
    ticks.into_iter().filter(|v| *v > lo && *v < hi).collect()
}

type Point = (f64, f64);

/// Marching squares over a rectilinear grid. `z[row][col]` sits at
/// `(x[col], y[row])`. Returns line segments in data coordinates.
pub(crate) fn contour_segments(x: &[f64], y: &[f64], z: &[Vec<f64>], level: f64) -> Vec<(Point, Point)> {
    let mut segments = Vec::new();
    let rows = z.len().min(y.len());
    for i in 0..rows.saturating_sub(1) {
        let cols = z[i].len().min(z[i + 1].len()).min(x.len());
        for j in 0..cols.saturating_sub(1) {
            let corners = [
                (x[j], y[i], z[i][j]),
                (x[j + 1], y[i], z[i][j + 1]),
                (x[j + 1], y[i + 1], z[i + 1][j + 1]),
                (x[j], y[i + 1], z[i + 1][j]),
            ];
            if corners.iter().any(|c| !c.2.is_finite()) {
                continue;
            }
            let crossings: Vec<Point> = (0..4)
                .filter_map(|k| {
                    let (ax, ay, av) = corners[k];
                    let (bx, by, bv) = corners[(k + 1) % 4];
                    if (av < level) == (bv < level) {
                        return None;
                    }
                    let t = (level - av) / (bv - av);
                    Some((ax + (bx - ax) * t, ay + (by - ay) * t))
                })
                .collect();
            for pair in crossings.chunks_exact(2) {
                segments.push((pair[0], pair[1]));
            }
        }
    }
    segments
}

/// One pie slice. Angles are radians, counterclockwise from the positive x
/// axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Wedge {
    pub start: f64,
    pub end: f64,
    pub fraction: f64,
    pub pull: f64,
}

impl Wedge {
    pub fn mid(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// Slices of a pie starting at twelve o'clock turned clockwise by `rotation`
/// degrees, laid out counterclockwise.
pub(crate) fn pie_wedges(values: &[f64], rotation: Option<f64>, pull: Option<&[f64]>) -> Vec<Wedge> {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let mut angle = PI / 2.0 - rotation.unwrap_or(0.0).to_radians();
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let fraction = if v > 0.0 { v / total } else { 0.0 };
            let start = angle;
            angle += fraction * 2.0 * PI;
            Wedge {
                start,
                end: angle,
                fraction,
                pull: pull.and_then(|p| p.get(i)).copied().unwrap_or(0.0),
            }
        })
        .collect()
}

/// Outline of a wedge in pixel space (y grows downwards).
pub(crate) fn wedge_outline(cx: f64, cy: f64, r: f64, wedge: &Wedge) -> Vec<Point> {
    let (ox, oy) = (
        wedge.pull * r * wedge.mid().cos(),
        -wedge.pull * r * wedge.mid().sin(),
    );
    let steps = ((wedge.end - wedge.start).abs() / (PI / 90.0)).ceil().max(1.0) as usize;
    let mut pts = Vec::with_capacity(steps + 2);
    pts.push((cx + ox, cy + oy));
    for k in 0..=steps {
        let a = wedge.start + (wedge.end - wedge.start) * k as f64 / steps as f64;
        pts.push((cx + ox + r * a.cos(), cy + oy - r * a.sin()));
    }
    pts
}

/// Closed outline of a marker symbol of radius `r` around `(cx, cy)`.
///
/// `None` for circles (drawn natively) and for the open symbols `cross` and
/// `x`, which [`marker_strokes`] handles.
pub(crate) fn marker_outline(symbol: &str, cx: f64, cy: f64, r: f64) -> Option<Vec<Point>> {
    let regular = |n: usize, phase: f64, radius: f64| -> Vec<(f64, f64)> {
        (0..n)
            .map(|k| {
                let a = phase + 2.0 * PI * k as f64 / n as f64;
                (cx + radius * a.cos(), cy - radius * a.sin())
            })
            .collect()
    };
    let pts = match symbol {
        "square" => vec![(cx - r, cy - r), (cx + r, cy - r), (cx + r, cy + r), (cx - r, cy + r)],
        "diamond" => regular(4, PI / 2.0, r * 1.2),
        "triangle-up" => regular(3, PI / 2.0, r * 1.2),
        "triangle-down" => regular(3, -PI / 2.0, r * 1.2),
        "pentagon" => regular(5, PI / 2.0, r * 1.1),
        "hexagon" => regular(6, 0.0, r * 1.1),
        "star" => {
            let outer = regular(5, PI / 2.0, r * 1.3);
            let inner = regular(5, PI / 2.0 + PI / 5.0, r * 0.55);
            outer.into_iter().zip(inner).flat_map(|(o, i)| [o, i]).collect()
        }
        _ => return None,
    };
    Some(pts)
}

/// Stroke segments of the open marker symbols.
pub(crate) fn marker_strokes(symbol: &str, cx: f64, cy: f64, r: f64) -> Option<[[Point; 2]; 2]> {
    match symbol {
        "cross" => Some([[(cx - r, cy), (cx + r, cy)], [(cx, cy - r), (cx, cy + r)]]),
        "x" => Some([
            [(cx - r, cy - r), (cx + r, cy + r)],
            [(cx - r, cy + r), (cx + r, cy - r)],
        ]),
        _ => None,
    }
}

/// Pixel rectangle `(left, top, right, bottom)` with `left <= right` and
/// `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Bounds {
    pub fn spanning(a: Point, b: Point) -> Self {
        Bounds {
            left: a.0.min(b.0),
            top: a.1.min(b.1),
            right: a.0.max(b.0),
            bottom: a.1.max(b.1),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        const SLACK: f64 = 0.5;
        p.0 >= self.left - SLACK
            && p.0 <= self.right + SLACK
            && p.1 >= self.top - SLACK
            && p.1 <= self.bottom + SLACK
    }

    pub fn clamp(&self, p: Point) -> Point {
        (p.0.clamp(self.left, self.right), p.1.clamp(self.top, self.bottom))
    }

    /// Liang-Barsky clipping of the segment `a`-`b`.
    pub fn clip_segment(&self, a: Point, b: Point) -> Option<(Point, Point)> {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let mut t0: f64 = 0.0;
        let mut t1: f64 = 1.0;
        for (p, q) in [
            (-dx, a.0 - self.left),
            (dx, self.right - a.0),
            (-dy, a.1 - self.top),
            (dy, self.bottom - a.1),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return None;
            }
        }
        Some((
            (a.0 + t0 * dx, a.1 + t0 * dy),
            (a.0 + t1 * dx, a.1 + t1 * dy),
        ))
    }

    /// Visible runs of a polyline with gaps (`None`) after clipping.
    pub fn clip_polyline(&self, points: &[Option<Point>]) -> Vec<Vec<Point>> {
        let mut runs: Vec<Vec<Point>> = Vec::new();
        let mut current: Vec<Point> = Vec::new();
        for w in points.windows(2) {
            let clipped = match (w[0], w[1]) {
                (Some(a), Some(b)) => self.clip_segment(a, b),
                _ => None,
            };
            match clipped {
                Some((a, b)) => {
                    let joined = current
                        .last()
                        .is_some_and(|l| (l.0 - a.0).abs() < 1e-9 && (l.1 - a.1).abs() < 1e-9);
                    if !joined {
                        if current.len() >= 2 {
                            runs.push(std::mem::take(&mut current));
                        }
                        current = vec![a];
                    }
                    current.push(b);
                }
                None => {
                    if current.len() >= 2 {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                }
            }
        }
        if current.len() >= 2 {
            runs.push(current);
        }
        runs
    }
}

/// On/off lengths of a dash style, in pixels, for a line `width` wide.
/// Empty for solid lines.
pub(crate) fn dash_pattern(dash: Option<LineDash>, width: f64) -> Vec<f64> {
    let u = width.max(1.0);
    match dash {
        Some(LineDash::Dash) => vec![6.0 * u, 4.0 * u],
        Some(LineDash::Dot) => vec![u, 2.0 * u],
        Some(LineDash::DashDot) => vec![6.0 * u, 3.0 * u, u, 3.0 * u],
        Some(LineDash::Solid) | None => Vec::new(),
    }
}

/// The drawn pieces of a pixel polyline under an on/off dash pattern.
pub(crate) fn dash_polyline(points: &[Point], pattern: &[f64]) -> Vec<Vec<Point>> {
    if points.len() < 2
        || pattern.is_empty()
        || pattern.len() % 2 != 0
        || pattern.iter().any(|p| *p <= 0.0)
    {
        return vec![points.to_vec()];
    }
    let mut pieces = Vec::new();
    let mut current = vec![points[0]];
    let mut idx = 0;
    let mut remaining = pattern[0];
    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        let len = (b.0 - a.0).hypot(b.1 - a.1);
        let mut pos = 0.0;
        while len - pos > 1e-9 {
            let step = remaining.min(len - pos);
            pos += step;
            remaining -= step;
            let t = pos / len;
            let p = (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t);
            let on = idx % 2 == 0;
            if on {
                current.push(p);
            }
            if remaining <= 1e-9 {
                if on {
                    if current.len() >= 2 {
                        pieces.push(std::mem::take(&mut current));
                    }
                    current.clear();
                } else {
                    current = vec![p];
                }
                idx = (idx + 1) % pattern.len();
                remaining = pattern[idx];
            }
        }
    }
    if idx % 2 == 0 && current.len() >= 2 {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bins, TraceKind};

    fn hist_trace(values: Vec<f64>) -> Trace {
        let mut t = Trace::new(TraceKind::Histogram);
        t.x = Some(values);
        t
    }

    #[test]
    fn histogram_respects_bin_count() {
        let mut t = hist_trace(vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        t.nbinsx = Some(2);
        let b = histogram(&t).unwrap();
        assert_eq!(b.edges, vec![0.0, 2.0, 4.0]);
        assert_eq!(b.heights, vec![2.0, 3.0]);
    }

    #[test]
    fn density_integrates_to_one() {
        let mut t = hist_trace(vec![1.0, 2.0, 2.5, 3.0, 7.0, 8.0]);
        t.histnorm = Some("probability density".into());
        t.xbins = Some(Bins {
            start: Some(0.0),
            end: Some(10.0),
            size: Some(2.5),
        });
        let b = histogram(&t).unwrap();
        assert_eq!(b.heights.len(), 4);
        let area: f64 = b.heights.iter().map(|h| h * 2.5).sum();
        assert!((area - 1.0).abs() < 1e-12);
    }

    #[test]
    fn grouped_bars_split_the_slot() {
        let rects = bar_rects(&[0.0, 1.0], &[3.0, 4.0], None, None, 1, 2);
        assert!((rects[0].p0 - 0.0).abs() < 1e-12);
        assert!((rects[0].p1 - 0.4).abs() < 1e-12);
        assert_eq!((rects[1].v0, rects[1].v1), (0.0, 4.0));
    }

    #[test]
    fn centers_become_edges() {
        assert_eq!(cell_edges(Some(&[0.0, 1.0, 2.0][..]), 3), vec![-0.5, 0.5, 1.5, 2.5]);
        assert_eq!(cell_edges(None, 2), vec![-0.5, 0.5, 1.5]);
        assert_eq!(cell_edges(Some(&[0.0, 2.0, 5.0][..]), 2), vec![0.0, 2.0, 5.0]);
    }

    #[test]
    fn explicit_contour_levels() {
        let c = Contours {
            start: Some(0.0),
            end: Some(1.0),
            size: Some(0.25),
            coloring: None,
        };
        assert_eq!(contour_levels(Some(&c), 0.0, 1.0), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn single_cell_contour() {
        let z = vec![vec![0.0, 1.0], vec![0.0, 1.0]];
        let segs = contour_segments(&[0.0, 1.0], &[0.0, 1.0], &z, 0.5);
        assert_eq!(segs.len(), 1);
        let ((x0, _), (x1, _)) = segs[0];
        assert!((x0 - 0.5).abs() < 1e-12 && (x1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn wedges_cover_the_circle() {
        let w = pie_wedges(&[1.0, 1.0, 2.0], None, Some(&[0.0, 0.1][..]));
        assert_eq!(w.len(), 3);
        assert!((w[0].start - PI / 2.0).abs() < 1e-12);
        assert!((w[2].end - w[0].start - 2.0 * PI).abs() < 1e-12);
        assert_eq!(w[2].fraction, 0.5);
        assert_eq!(w[1].pull, 0.1);
        assert!(pie_wedges(&[0.0], None, None).is_empty());
    }

    #[test]
    fn dashes_split_a_line() {
        let pieces = dash_polyline(&[(0.0, 0.0), (10.0, 0.0)], &[2.0, 2.0]);
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[1], vec![(4.0, 0.0), (6.0, 0.0)]);
        assert_eq!(dash_polyline(&[(0.0, 0.0), (1.0, 1.0)], &[]).len(), 1);
    }

    #[test]
    fn clipping_cuts_at_the_border() {
        let b = Bounds::spanning((0.0, 0.0), (10.0, 10.0));
        let (a, e) = b.clip_segment((-5.0, 5.0), (5.0, 5.0)).unwrap();
        assert_eq!(a, (0.0, 5.0));
        assert_eq!(e, (5.0, 5.0));
        assert!(b.clip_segment((-5.0, -5.0), (-1.0, 20.0)).is_none());

        let runs = b.clip_polyline(&[Some((1.0, 1.0)), Some((2.0, 2.0)), None, Some((3.0, 3.0)), Some((4.0, 4.0))]);
        assert_eq!(runs, vec![vec![(1.0, 1.0), (2.0, 2.0)], vec![(3.0, 3.0), (4.0, 4.0)]]);
    }
}
