//! Cartesian panels: axis geometry, traces, shapes, frames and colorbars.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use plotters::backend::DrawingBackend;
use plotters::style::RGBAColor;
use plotters::style::text_anchor::{HPos, VPos};

use crate::error::Result;
use crate::models::{
    AxisLayout, ErrorBars, MarkerColor, MarkerStyle, Mode, Orientation, Scene, ShapeKind, Trace,
    TraceKind,
};
use crate::palette::{Gradient, default_color};

use super::geometry::{
    Bounds, bar_rects, cell_edges, contour_levels, contour_segments, dash_pattern, histogram,
    marker_outline, marker_strokes, pie_wedges, wedge_outline, z_range,
};
use super::text::estimate_text_width_px;
use super::util::{
    AxisScale, BLACK, colorscale, format_tick, min_max, nice_ticks, ref_to_key, rgb8_to_rgba,
    scale_color, to_rgba, with_alpha,
};
use super::{Canvas, Painter, TextSpec};

const TEXT_GRAY: RGBAColor = RGBAColor(68, 68, 68, 1.0);
const GRID_GRAY: RGBAColor = RGBAColor(229, 229, 229, 1.0);

/// One axis mapped onto the canvas.
pub(crate) struct AxisGeom<'a> {
    pub layout: Option<&'a AxisLayout>,
    pub scale: AxisScale,
    /// Pixels at domain fractions 0 and 1; for y axes `start` is the bottom.
    pub start: f64,
    pub end: f64,
}

impl AxisGeom<'_> {
    pub fn data(&self, v: f64) -> Option<f64> {
        self.scale.fraction(v).map(|t| self.domain(t))
    }

    pub fn domain(&self, t: f64) -> f64 {
        self.start + t * (self.end - self.start)
    }

    /// Pixel of a value, with non-positive values on a log axis pinned to the
    /// low end.
    fn data_or_floor(&self, v: f64) -> Option<f64> {
        self.data(v).or_else(|| {
            (self.scale.log && v <= 0.0).then(|| self.domain(if self.scale.reversed { 1.0 } else { 0.0 }))
        })
    }

    fn side(&self) -> Option<&str> {
        self.layout.and_then(|l| l.side.as_deref())
    }

    fn tick_font(&self) -> f64 {
        self.layout
            .and_then(|l| l.tickfont.as_ref())
            .and_then(|f| f.size)
            .unwrap_or(12.0)
    }

    /// `(pixel, label)` of the ticks that fall on the axis.
    fn ticks_px(&self, spacing_px: f64) -> Vec<(f64, String)> {
        let target = ((self.end - self.start).abs() / spacing_px).max(2.0) as usize;
        let (lo, hi) = (self.start.min(self.end), self.start.max(self.end));
        self.scale
            .ticks(self.layout, target)
            .into_iter()
            .filter_map(|(v, label)| {
                let px = self.data(v)?;
                (px >= lo - 0.5 && px <= hi + 0.5).then_some((px, label))
            })
            .collect()
    }
}

/// A pair of axes that traces are drawn against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Panel {
    pub x: String,
    pub y: String,
}

/// Every axis of the scene, keyed by layout name (`xaxis`, `yaxis2`, …).
pub(crate) struct AxisSet<'a> {
    axes: BTreeMap<String, AxisGeom<'a>>,
}

fn trace_keys(t: &Trace) -> (String, String) {
    let key = |r: Option<&str>, default: &str| {
        r.and_then(ref_to_key)
            .unwrap_or_else(|| default.to_string())
    };
    (
        key(t.xaxis.as_deref(), "xaxis"),
        key(t.yaxis.as_deref(), "yaxis"),
    )
}

/// Axis key of a data reference; `None` for paper and domain references.
fn data_key(reference: &str) -> Option<String> {
    if reference.ends_with("domain") {
        None
    } else {
        ref_to_key(reference)
    }
}

fn scatter_xy(t: &Trace) -> (Vec<f64>, Vec<f64>) {
    let y = t.y.clone().unwrap_or_default();
    let x = t
        .x
        .clone()
        .unwrap_or_else(|| (0..y.len()).map(|i| i as f64).collect());
    (x, y)
}

fn grid_coords(coords: Option<&Vec<f64>>, n: usize) -> Vec<f64> {
    coords
        .filter(|c| c.len() == n)
        .cloned()
        .unwrap_or_else(|| (0..n).map(|i| i as f64).collect())
}

fn error_extent(values: &[f64], bars: Option<&ErrorBars>, out: &mut Vec<f64>) {
    if let Some(bars) = bars.filter(|b| b.visible) {
        for (i, v) in values.iter().enumerate() {
            let (minus, plus) = bars.extent(i);
            out.push(v - minus);
            out.push(v + plus);
        }
    }
}

/// Data a trace places on its x and y axes, and whether the axes get padding.
fn trace_extent(t: &Trace) -> (Vec<f64>, Vec<f64>, bool) {
    match t.kind {
        TraceKind::Scatter => {
            let (x, mut y) = scatter_xy(t);
            let mut xs = x.clone();
            error_extent(&x, t.error_x.as_ref(), &mut xs);
            let ys = y.clone();
            error_extent(&ys, t.error_y.as_ref(), &mut y);
            if t.fill.as_deref() == Some("tozeroy") {
                y.push(0.0);
            }
            (xs, y, true)
        }
        TraceKind::Bar => {
            let horizontal = t.orientation == Some(Orientation::Horizontal);
            let (pos, len) = if horizontal { (&t.y, &t.x) } else { (&t.x, &t.y) };
            let rects = bar_rects(
                pos.as_deref().unwrap_or_default(),
                len.as_deref().unwrap_or_default(),
                t.width,
                t.base,
                0,
                1,
            );
            let ps: Vec<f64> = rects.iter().flat_map(|r| [r.p0, r.p1]).collect();
            let vs: Vec<f64> = rects.iter().flat_map(|r| [r.v0, r.v1]).collect();
            if horizontal { (vs, ps, true) } else { (ps, vs, true) }
        }
        TraceKind::Histogram => match histogram(t) {
            Some(b) => {
                let mut ys = b.heights;
                ys.push(0.0);
                (b.edges, ys, true)
            }
            None => (Vec::new(), Vec::new(), true),
        },
        TraceKind::Heatmap => {
            let z = t.z.as_deref().unwrap_or_default();
            let cols = z.iter().map(Vec::len).max().unwrap_or(0);
            (
                cell_edges(t.x.as_deref(), cols),
                cell_edges(t.y.as_deref(), z.len()),
                false,
            )
        }
        TraceKind::Contour => {
            let z = t.z.as_deref().unwrap_or_default();
            let cols = z.iter().map(Vec::len).max().unwrap_or(0);
            (
                grid_coords(t.x.as_ref(), cols),
                grid_coords(t.y.as_ref(), z.len()),
                false,
            )
        }
        TraceKind::Pie => (Vec::new(), Vec::new(), false),
    }
}

impl<'a> AxisSet<'a> {
    pub fn build(scene: &'a Scene, canvas: &Canvas) -> Self {
        let layout_axes = &scene.layout.axes;
        let mut keys: BTreeSet<String> = layout_axes.keys().cloned().collect();
        let mut values: HashMap<String, Vec<f64>> = HashMap::new();
        let mut padded: HashSet<String> = HashSet::new();

        for t in scene.data.iter().filter(|t| t.is_cartesian()) {
            let (xk, yk) = trace_keys(t);
            let (xs, ys, pad) = trace_extent(t);
            if pad {
                padded.insert(xk.clone());
                padded.insert(yk.clone());
            }
            values.entry(xk.clone()).or_default().extend(xs);
            values.entry(yk.clone()).or_default().extend(ys);
            keys.insert(xk);
            keys.insert(yk);
        }
        for shape in &scene.layout.shapes {
            if let Some(k) = data_key(&shape.xref) {
                values.entry(k.clone()).or_default().extend([shape.x0, shape.x1]);
                keys.insert(k);
            }
            if let Some(k) = data_key(&shape.yref) {
                values.entry(k.clone()).or_default().extend([shape.y0, shape.y1]);
                keys.insert(k);
            }
        }
        let has_pie = scene.data.iter().any(|t| !t.is_cartesian());
        if keys.is_empty() && !has_pie {
            keys.insert("xaxis".into());
            keys.insert("yaxis".into());
        }

        // Matched axes share one range.
        let root_of = |key: &str| -> String {
            layout_axes
                .get(key)
                .and_then(|l| l.matches.as_deref())
                .and_then(ref_to_key)
                .unwrap_or_else(|| key.to_string())
        };
        let mut grouped: HashMap<String, Vec<f64>> = HashMap::new();
        let mut grouped_pad: HashSet<String> = HashSet::new();
        for key in &keys {
            let root = root_of(key);
            if padded.contains(key) {
                grouped_pad.insert(root.clone());
            }
            grouped
                .entry(root)
                .or_default()
                .extend(values.get(key).into_iter().flatten().copied());
        }

        let domain_of = |key: &str| {
            let own = layout_axes.get(key);
            let target = own
                .and_then(|l| l.overlaying.as_deref())
                .and_then(ref_to_key)
                .and_then(|k| layout_axes.get(&k));
            target
                .or(own)
                .and_then(|l| l.domain)
                .unwrap_or([0.0, 1.0])
        };

        let axes = keys
            .iter()
            .map(|key| {
                let root = root_of(key);
                let scale = AxisScale::build(
                    layout_axes.get(&root),
                    grouped.get(&root).map(Vec::as_slice).unwrap_or_default(),
                    grouped_pad.contains(&root),
                );
                let [d0, d1] = domain_of(key);
                let (start, end) = if key.starts_with('x') {
                    (canvas.paper_x(d0), canvas.paper_x(d1))
                } else {
                    (canvas.paper_y(d0), canvas.paper_y(d1))
                };
                let geom = AxisGeom {
                    layout: layout_axes.get(key),
                    scale,
                    start,
                    end,
                };
                (key.clone(), geom)
            })
            .collect();
        AxisSet { axes }
    }

    fn pair(&self, panel: &Panel) -> Option<(&AxisGeom<'a>, &AxisGeom<'a>)> {
        Some((self.axes.get(&panel.x)?, self.axes.get(&panel.y)?))
    }

    /// Axis pairs in drawing order: those with traces first, then y axes
    /// without traces against their anchor.
    pub fn panels(&self, scene: &Scene) -> Vec<Panel> {
        let mut out: Vec<Panel> = Vec::new();
        for t in scene.data.iter().filter(|t| t.is_cartesian()) {
            let (x, y) = trace_keys(t);
            let p = Panel { x, y };
            if !out.contains(&p) {
                out.push(p);
            }
        }
        for (key, axis) in self.axes.iter().filter(|(k, _)| k.starts_with('y')) {
            if out.iter().any(|p| &p.y == key) {
                continue;
            }
            let x = axis
                .layout
                .and_then(|l| l.anchor.as_deref())
                .and_then(ref_to_key)
                .filter(|k| self.axes.contains_key(k))
                .unwrap_or_else(|| "xaxis".into());
            if self.axes.contains_key(&x) {
                out.push(Panel { x, y: key.clone() });
            }
        }
        out
    }

    /// Pixel of coordinate `v` given a reference: `paper`, an axis (`x2`), or
    /// an axis domain (`x2 domain`).
    pub fn resolve(&self, reference: &str, v: f64, letter: char, canvas: &Canvas) -> Option<f64> {
        if reference.is_empty() || reference == "paper" {
            return Some(if letter == 'x' {
                canvas.paper_x(v)
            } else {
                canvas.paper_y(v)
            });
        }
        let axis = self.axes.get(&ref_to_key(reference)?)?;
        if reference.ends_with("domain") {
            Some(axis.domain(v))
        } else {
            axis.data(v)
        }
    }
}

/// Pixel mapping of one axis pair.
struct View<'g, 'a> {
    x: &'g AxisGeom<'a>,
    y: &'g AxisGeom<'a>,
    s: f64,
}

impl View<'_, '_> {
    fn pt(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        Some((self.x.data(x)?, self.y.data(y)?))
    }

    fn bounds(&self) -> Bounds {
        Bounds::spanning((self.x.start, self.y.start), (self.x.end, self.y.end))
    }

    /// Fill and/or outline a rectangle given in data coordinates, clipped to
    /// the panel.
    fn rect<DB: DrawingBackend>(
        &self,
        p: &Painter<'_, DB>,
        a: (f64, f64),
        b: (f64, f64),
        fill: Option<RGBAColor>,
        stroke: Option<(RGBAColor, f64)>,
    ) -> Result<()> {
        let (Some(x0), Some(x1), Some(y0), Some(y1)) = (
            self.x.data_or_floor(a.0),
            self.x.data_or_floor(b.0),
            self.y.data_or_floor(a.1),
            self.y.data_or_floor(b.1),
        ) else {
            return Ok(());
        };
        let bounds = self.bounds();
        let (c0, c1) = (bounds.clamp((x0, y0)), bounds.clamp((x1, y1)));
        if (c0.0 - c1.0).abs() < 0.5 && (c0.1 - c1.1).abs() < 0.5 {
            return Ok(());
        }
        p.rect(c0, c1, fill, stroke)
    }
}

fn trace_color(t: &Trace, idx: usize) -> RGBAColor {
    t.display_color()
        .map(to_rgba)
        .unwrap_or_else(|| to_rgba(&default_color(idx)))
}

fn marker_stroke(marker: &MarkerStyle, s: f64) -> Option<(RGBAColor, f64)> {
    let line = marker.line.as_ref()?;
    Some((to_rgba(line.color.as_ref()?), line.width.unwrap_or(1.0) * s))
}

/// Slot and slot count of every bar trace among the bars sharing its axes
/// and orientation; `(0, 1)` for other traces.
fn bar_slots(scene: &Scene) -> Vec<(usize, usize)> {
    let key = |t: &Trace| {
        let (x, y) = trace_keys(t);
        (x, y, t.orientation == Some(Orientation::Horizontal))
    };
    let mut counts: HashMap<(String, String, bool), usize> = HashMap::new();
    let mut slots: Vec<(usize, usize)> = Vec::with_capacity(scene.data.len());
    for t in &scene.data {
        if t.kind == TraceKind::Bar {
            let n = counts.entry(key(t)).or_default();
            slots.push((*n, 0));
            *n += 1;
        } else {
            slots.push((0, 1));
        }
    }
    for (t, slot) in scene.data.iter().zip(slots.iter_mut()) {
        if t.kind == TraceKind::Bar {
            slot.1 = counts.get(&key(t)).copied().unwrap_or(1);
        }
    }
    slots
}

pub(crate) fn draw_backgrounds<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    scene: &Scene,
    axes: &AxisSet<'_>,
    panels: &[Panel],
) -> Result<()> {
    let bg = scene
        .layout
        .plot_bgcolor
        .as_ref()
        .map(to_rgba)
        .unwrap_or(RGBAColor(255, 255, 255, 1.0));
    for panel in panels {
        if let Some((x, y)) = axes.pair(panel) {
            p.rect((x.start, y.start), (x.end, y.end), Some(bg), None)?;
        }
    }
    Ok(())
}

pub(crate) fn draw_grids<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    canvas: &Canvas,
    axes: &AxisSet<'_>,
    panels: &[Panel],
) -> Result<()> {
    let mut done: HashSet<&str> = HashSet::new();
    for panel in panels {
        let Some((x, y)) = axes.pair(panel) else {
            continue;
        };
        let s = canvas.scale;
        let grid = |a: &AxisGeom<'_>| {
            let show = a.layout.and_then(|l| l.showgrid).unwrap_or(true);
            let color = a
                .layout
                .and_then(|l| l.gridcolor.as_ref())
                .map(to_rgba)
                .unwrap_or(GRID_GRAY);
            show.then_some(color)
        };
        if done.insert(panel.x.as_str())
            && let Some(color) = grid(x)
        {
            for (px, _) in x.ticks_px(80.0 * s) {
                p.line((px, y.start), (px, y.end), color, s)?;
            }
        }
        if done.insert(panel.y.as_str())
            && let Some(color) = grid(y)
        {
            for (py, _) in y.ticks_px(50.0 * s) {
                p.line((x.start, py), (x.end, py), color, s)?;
            }
        }
    }
    Ok(())
}

pub(crate) fn draw_traces<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    scene: &Scene,
    canvas: &Canvas,
    axes: &AxisSet<'_>,
) -> Result<()> {
    let slots = bar_slots(scene);
    let mut previous: HashMap<Panel, Vec<(f64, f64)>> = HashMap::new();
    for (idx, t) in scene.data.iter().enumerate() {
        if t.kind == TraceKind::Pie {
            draw_pie(p, canvas, t)?;
            continue;
        }
        let (x, y) = trace_keys(t);
        let panel = Panel { x, y };
        let Some((xa, ya)) = axes.pair(&panel) else {
            continue;
        };
        let view = View {
            x: xa,
            y: ya,
            s: canvas.scale,
        };
        let color = trace_color(t, idx);
        match t.kind {
            TraceKind::Scatter => {
                let prev = previous.get(&panel).map(Vec::as_slice);
                let pts = draw_scatter(p, &view, t, color, prev)?;
                previous.insert(panel, pts);
            }
            TraceKind::Bar => draw_bars(p, &view, t, color, slots[idx])?,
            TraceKind::Histogram => draw_histogram(p, &view, t, color)?,
            TraceKind::Heatmap => draw_heatmap(p, &view, t)?,
            TraceKind::Contour => draw_contour(p, &view, t)?,
            TraceKind::Pie => {}
        }
    }
    Ok(())
}

fn draw_marker<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    symbol: &str,
    c: (f64, f64),
    r: f64,
    fill: RGBAColor,
    stroke: Option<(RGBAColor, f64)>,
) -> Result<()> {
    let open = symbol.ends_with("-open");
    let base = symbol.trim_end_matches("-open");
    if let Some(strokes) = marker_strokes(base, c.0, c.1, r) {
        for [a, b] in strokes {
            p.line(a, b, fill, (r / 2.5).max(1.0))?;
        }
        return Ok(());
    }
    let (fill, stroke) = if open {
        (None, Some((fill, (r / 4.0).max(1.0))))
    } else {
        (Some(fill), stroke)
    };
    match marker_outline(base, c.0, c.1, r) {
        Some(outline) => {
            if let Some(fill) = fill {
                p.polygon(&outline, fill)?;
            }
            if let Some((color, width)) = stroke {
                let mut closed = outline.clone();
                closed.extend(outline.first().copied());
                p.polyline(&closed, color, width, &[])?;
            }
            Ok(())
        }
        None => p.circle(c, r, fill, stroke),
    }
}

/// Draws one scatter trace and returns its visible pixel points, which a
/// following `tonexty` fill closes against.
fn draw_scatter<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    v: &View<'_, '_>,
    t: &Trace,
    color: RGBAColor,
    prev: Option<&[(f64, f64)]>,
) -> Result<Vec<(f64, f64)>> {
    let (xs, ys) = scatter_xy(t);
    let pts: Vec<Option<(f64, f64)>> = xs.iter().zip(&ys).map(|(&x, &y)| v.pt(x, y)).collect();
    let visible: Vec<(f64, f64)> = pts.iter().flatten().copied().collect();
    let opacity = t.opacity.unwrap_or(1.0);
    let bounds = v.bounds();
    let mode = t.mode.unwrap_or(if pts.len() < 20 {
        Mode::LinesMarkers
    } else {
        Mode::Lines
    });

    let fill_color = || {
        with_alpha(
            t.fillcolor
                .as_ref()
                .map(to_rgba)
                .unwrap_or_else(|| with_alpha(color, 0.5)),
            opacity,
        )
    };
    match (t.fill.as_deref(), prev) {
        (Some("tonexty"), Some(prev)) => {
            let poly: Vec<(f64, f64)> = visible
                .iter()
                .chain(prev.iter().rev())
                .map(|q| bounds.clamp(*q))
                .collect();
            p.polygon(&poly, fill_color())?;
        }
        (Some("tozeroy"), _) | (Some("tonexty"), None) => {
            if let (Some(first), Some(last)) = (visible.first(), visible.last()) {
                let base = v.y.data_or_floor(0.0).unwrap_or(v.y.start);
                let mut poly = visible.clone();
                poly.push((last.0, base));
                poly.push((first.0, base));
                let poly: Vec<(f64, f64)> = poly.into_iter().map(|q| bounds.clamp(q)).collect();
                p.polygon(&poly, fill_color())?;
            }
        }
        _ => {}
    }

    if mode.has_lines() {
        let line = t.line.clone().unwrap_or_default();
        let width = line.width.unwrap_or(2.0) * v.s;
        let dash = dash_pattern(line.dash, width);
        let lc = with_alpha(line.color.as_ref().map(to_rgba).unwrap_or(color), opacity);
        for run in bounds.clip_polyline(&pts) {
            p.polyline(&run, lc, width, &dash)?;
        }
    }

    let err_color = with_alpha(color, opacity);
    let cap = 4.0 * v.s;
    let err_w = (1.5 * v.s).max(1.0);
    if let Some(bars) = t.error_y.as_ref().filter(|b| b.visible) {
        for (i, (&x, &y)) in xs.iter().zip(&ys).enumerate() {
            let (minus, plus) = bars.extent(i);
            if let (Some(lo), Some(hi)) = (v.pt(x, y - minus), v.pt(x, y + plus)) {
                if let Some((a, b)) = bounds.clip_segment(lo, hi) {
                    p.line(a, b, err_color, err_w)?;
                }
                for end in [lo, hi].into_iter().filter(|e| bounds.contains(*e)) {
                    p.line((end.0 - cap, end.1), (end.0 + cap, end.1), err_color, err_w)?;
                }
            }
        }
    }
    if let Some(bars) = t.error_x.as_ref().filter(|b| b.visible) {
        for (i, (&x, &y)) in xs.iter().zip(&ys).enumerate() {
            let (minus, plus) = bars.extent(i);
            if let (Some(lo), Some(hi)) = (v.pt(x - minus, y), v.pt(x + plus, y)) {
                if let Some((a, b)) = bounds.clip_segment(lo, hi) {
                    p.line(a, b, err_color, err_w)?;
                }
                for end in [lo, hi].into_iter().filter(|e| bounds.contains(*e)) {
                    p.line((end.0, end.1 - cap), (end.0, end.1 + cap), err_color, err_w)?;
                }
            }
        }
    }

    if mode.has_markers() {
        let marker = t.marker.clone().unwrap_or_default();
        let r = marker.size.unwrap_or(6.0) * v.s / 2.0;
        let alpha = marker.opacity.unwrap_or(1.0) * opacity;
        let symbol = marker.symbol.as_deref().unwrap_or("circle");
        let stroke = marker_stroke(&marker, v.s);
        let value_range = match &marker.color {
            Some(MarkerColor::Values(vals)) => min_max(vals.iter().copied()),
            _ => None,
        };
        let gradient = colorscale(marker.colorscale.as_deref());
        for (i, pt) in pts.iter().enumerate() {
            let Some(c) = pt.filter(|c| bounds.contains(*c)) else {
                continue;
            };
            let fill = match &marker.color {
                Some(MarkerColor::Single(c)) => to_rgba(c),
                Some(MarkerColor::List(cs)) => cs.get(i).map(to_rgba).unwrap_or(color),
                Some(MarkerColor::Values(vals)) => match (vals.get(i), value_range) {
                    (Some(&val), Some((lo, hi))) => scale_color(&gradient, val, lo, hi),
                    _ => color,
                },
                None => color,
            };
            draw_marker(p, symbol, c, r, with_alpha(fill, alpha), stroke)?;
        }
    }
    Ok(visible)
}

fn bar_style(t: &Trace, color: RGBAColor, s: f64) -> (RGBAColor, Option<(RGBAColor, f64)>) {
    let marker = t.marker.clone().unwrap_or_default();
    let alpha = marker.opacity.unwrap_or(1.0) * t.opacity.unwrap_or(1.0);
    let fill = marker.single_color().map(to_rgba).unwrap_or(color);
    (with_alpha(fill, alpha), marker_stroke(&marker, s))
}

fn draw_bars<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    v: &View<'_, '_>,
    t: &Trace,
    color: RGBAColor,
    (slot, slots): (usize, usize),
) -> Result<()> {
    let horizontal = t.orientation == Some(Orientation::Horizontal);
    let (pos, len) = if horizontal { (&t.y, &t.x) } else { (&t.x, &t.y) };
    let (fill, stroke) = bar_style(t, color, v.s);
    let rects = bar_rects(
        pos.as_deref().unwrap_or_default(),
        len.as_deref().unwrap_or_default(),
        t.width,
        t.base,
        slot,
        slots,
    );
    for r in rects {
        let (a, b) = if horizontal {
            ((r.v0, r.p0), (r.v1, r.p1))
        } else {
            ((r.p0, r.v0), (r.p1, r.v1))
        };
        v.rect(p, a, b, Some(fill), stroke)?;
    }
    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    v: &View<'_, '_>,
    t: &Trace,
    color: RGBAColor,
) -> Result<()> {
    let Some(binned) = histogram(t) else {
        return Ok(());
    };
    let (fill, stroke) = bar_style(t, color, v.s);
    for (edge, h) in binned.edges.windows(2).zip(&binned.heights) {
        if *h > 0.0 {
            v.rect(p, (edge[0], 0.0), (edge[1], *h), Some(fill), stroke)?;
        }
    }
    Ok(())
}

fn value_bounds(t: &Trace, z: &[Vec<f64>]) -> Option<(f64, f64)> {
    let (lo, hi) = z_range(z)?;
    Some((t.zmin.unwrap_or(lo), t.zmax.unwrap_or(hi)))
}

fn draw_heatmap<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    v: &View<'_, '_>,
    t: &Trace,
) -> Result<()> {
    let Some(z) = t.z.as_deref() else {
        return Ok(());
    };
    let Some((lo, hi)) = value_bounds(t, z) else {
        return Ok(());
    };
    let cols = z.iter().map(Vec::len).max().unwrap_or(0);
    let xe = cell_edges(t.x.as_deref(), cols);
    let ye = cell_edges(t.y.as_deref(), z.len());
    let gradient = colorscale(t.colorscale.as_deref());
    let alpha = t.opacity.unwrap_or(1.0);
    for (i, row) in z.iter().enumerate() {
        for (j, &val) in row.iter().enumerate().filter(|(_, v)| v.is_finite()) {
            let fill = with_alpha(scale_color(&gradient, val, lo, hi), alpha);
            v.rect(p, (xe[j], ye[i]), (xe[j + 1], ye[i + 1]), Some(fill), None)?;
        }
    }
    Ok(())
}

fn draw_contour<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    v: &View<'_, '_>,
    t: &Trace,
) -> Result<()> {
    let Some(z) = t.z.as_deref() else {
        return Ok(());
    };
    let Some((lo, hi)) = value_bounds(t, z) else {
        return Ok(());
    };
    let cols = z.iter().map(Vec::len).max().unwrap_or(0);
    let xs = grid_coords(t.x.as_ref(), cols);
    let ys = grid_coords(t.y.as_ref(), z.len());
    let contours = t.contours.as_ref();
    let levels = contour_levels(contours, lo, hi);
    let gradient = colorscale(t.colorscale.as_deref());
    let coloring = contours
        .and_then(|c| c.coloring.as_deref())
        .unwrap_or("fill");

    if !matches!(coloring, "lines" | "none") {
        let xe = cell_edges(Some(xs.as_slice()), cols);
        let ye = cell_edges(Some(ys.as_slice()), z.len());
        let bands = levels.len().max(1) as f64;
        for (i, row) in z.iter().enumerate() {
            for (j, &val) in row.iter().enumerate().filter(|(_, v)| v.is_finite()) {
                let band = levels.iter().filter(|l| **l <= val).count() as f64;
                let fill = rgb8_to_rgba(gradient.sample(band / bands));
                v.rect(p, (xe[j], ye[i]), (xe[j + 1], ye[i + 1]), Some(fill), None)?;
            }
        }
    }

    let bounds = v.bounds();
    let width = v.s.max(1.0);
    for level in &levels {
        let lc = if coloring == "lines" {
            scale_color(&gradient, *level, lo, hi)
        } else {
            with_alpha(BLACK, 0.4)
        };
        for (a, b) in contour_segments(&xs, &ys, z, *level) {
            let (Some(pa), Some(pb)) = (v.pt(a.0, a.1), v.pt(b.0, b.1)) else {
                continue;
            };
            if let Some((pa, pb)) = bounds.clip_segment(pa, pb) {
                p.line(pa, pb, lc, width)?;
            }
        }
    }
    Ok(())
}

/// `[lo, hi]` of a pie domain attribute, `[0, 1]` when absent.
fn pie_domain(t: &Trace, axis: &str) -> [f64; 2] {
    t.extra
        .get("domain")
        .and_then(|d| d.get(axis))
        .and_then(|v| serde_json::from_value::<[f64; 2]>(v.clone()).ok())
        .unwrap_or([0.0, 1.0])
}

fn draw_pie<DB: DrawingBackend>(p: &Painter<'_, DB>, canvas: &Canvas, t: &Trace) -> Result<()> {
    let Some(values) = t.values.as_deref() else {
        return Ok(());
    };
    let [x0, x1] = pie_domain(t, "x");
    let [y0, y1] = pie_domain(t, "y");
    let (left, right) = (canvas.paper_x(x0), canvas.paper_x(x1));
    let (bottom, top) = (canvas.paper_y(y0), canvas.paper_y(y1));
    let (cx, cy) = ((left + right) / 2.0, (bottom + top) / 2.0);
    let max_pull = t
        .pull
        .as_deref()
        .and_then(|pulls| min_max(pulls.iter().copied()))
        .map_or(0.0, |(_, hi)| hi.max(0.0));
    let r = 0.5 * (right - left).abs().min((bottom - top).abs()) / (1.0 + max_pull);
    let colors = t.marker.as_ref().and_then(|m| m.colors.as_ref());
    let alpha = t.opacity.unwrap_or(1.0);
    let textinfo = t.textinfo.as_deref().unwrap_or("percent");
    let label_size = canvas.px(12.0);

    for (i, wedge) in pie_wedges(values, t.rotation, t.pull.as_deref())
        .iter()
        .enumerate()
    {
        if wedge.fraction <= 0.0 {
            continue;
        }
        let fill = colors
            .and_then(|c| c.get(i))
            .map(to_rgba)
            .unwrap_or_else(|| to_rgba(&default_color(i)));
        let outline = wedge_outline(cx, cy, r, wedge);
        p.polygon(&outline, with_alpha(fill, alpha))?;
        let mut closed = outline.clone();
        closed.extend(outline.first().copied());
        p.polyline(&closed, RGBAColor(255, 255, 255, 1.0), canvas.px(1.0), &[])?;

        let mut parts = Vec::new();
        if textinfo.contains("label")
            && let Some(label) = t.labels.as_ref().and_then(|l| l.get(i))
        {
            parts.push(label.clone());
        }
        if textinfo.contains("percent") {
            parts.push(format!("{:.1}%", wedge.fraction * 100.0));
        }
        if !parts.is_empty() {
            let rr = r * (0.6 + wedge.pull);
            let at = (cx + rr * wedge.mid().cos(), cy - rr * wedge.mid().sin());
            p.text(&parts.join(" "), at, TextSpec::new(label_size, RGBAColor(255, 255, 255, 1.0)))?;
        }
    }
    Ok(())
}

pub(crate) fn draw_shapes<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    scene: &Scene,
    canvas: &Canvas,
    axes: &AxisSet<'_>,
    below: bool,
) -> Result<()> {
    let shapes = scene
        .layout
        .shapes
        .iter()
        .filter(|s| (s.layer.as_deref() == Some("below")) == below);
    for shape in shapes {
        let (Some(x0), Some(x1), Some(y0), Some(y1)) = (
            axes.resolve(&shape.xref, shape.x0, 'x', canvas),
            axes.resolve(&shape.xref, shape.x1, 'x', canvas),
            axes.resolve(&shape.yref, shape.y0, 'y', canvas),
            axes.resolve(&shape.yref, shape.y1, 'y', canvas),
        ) else {
            continue;
        };
        let opacity = shape.opacity.unwrap_or(1.0);
        let line = shape.line.clone().unwrap_or_default();
        let stroke = with_alpha(line.color.as_ref().map(to_rgba).unwrap_or(TEXT_GRAY), opacity);
        let width = line.width.unwrap_or(2.0) * canvas.scale;
        let dash = dash_pattern(line.dash, width);
        match shape.kind {
            ShapeKind::Line => p.polyline(&[(x0, y0), (x1, y1)], stroke, width, &dash)?,
            ShapeKind::Rect => {
                let fill = shape.fillcolor.as_ref().map(|c| with_alpha(to_rgba(c), opacity));
                p.rect((x0, y0), (x1, y1), fill, None)?;
                p.polyline(
                    &[(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)],
                    stroke,
                    width,
                    &dash,
                )?;
            }
        }
    }
    Ok(())
}

fn axis_title(a: &AxisGeom<'_>) -> Option<(String, f64)> {
    let title = a.layout?.title.as_ref()?;
    let size = title.font.as_ref().and_then(|f| f.size).unwrap_or(14.0);
    (!title.text.is_empty()).then(|| (title.text.clone(), size))
}

fn line_color(a: &AxisGeom<'_>) -> RGBAColor {
    a.layout
        .and_then(|l| l.linecolor.as_ref())
        .map(to_rgba)
        .unwrap_or(TEXT_GRAY)
}

/// Axis lines, tick labels and axis titles.
pub(crate) fn draw_frames<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    canvas: &Canvas,
    axes: &AxisSet<'_>,
    panels: &[Panel],
) -> Result<()> {
    let s = canvas.scale;
    let mut done: HashSet<&str> = HashSet::new();
    for panel in panels {
        let Some((x, y)) = axes.pair(panel) else {
            continue;
        };
        if done.insert(panel.x.as_str()) {
            draw_x_axis(p, s, x, y)?;
        }
        if done.insert(panel.y.as_str()) {
            draw_y_axis(p, s, x, y)?;
        }
    }
    Ok(())
}

fn draw_x_axis<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    s: f64,
    x: &AxisGeom<'_>,
    y: &AxisGeom<'_>,
) -> Result<()> {
    let layout = x.layout;
    let top_side = x.side() == Some("top");
    let (at, other) = if top_side { (y.end, y.start) } else { (y.start, y.end) };
    if layout.and_then(|l| l.showline).unwrap_or(false) {
        let color = line_color(x);
        p.line((x.start, at), (x.end, at), color, s)?;
        if layout.and_then(|l| l.mirror).unwrap_or(false) {
            p.line((x.start, other), (x.end, other), color, s)?;
        }
    }
    let font = x.tick_font() * s;
    let gap = 4.0 * s;
    let dir = if top_side { -1.0 } else { 1.0 };
    let rotated = layout
        .and_then(|l| l.tickangle)
        .is_some_and(|a| a.abs() >= 45.0);
    let mut depth: f64 = font;
    for (px, label) in x.ticks_px(80.0 * s) {
        let spec = TextSpec::new(font, TEXT_GRAY);
        if rotated {
            depth = depth.max(estimate_text_width_px(&label, font as u32) as f64);
            p.text(
                &label,
                (px, at + dir * gap),
                spec.anchor(HPos::Right, VPos::Center).vertical(),
            )?;
        } else {
            let v = if top_side { VPos::Bottom } else { VPos::Top };
            p.text(&label, (px, at + dir * gap), spec.anchor(HPos::Center, v))?;
        }
    }
    if let Some((text, size)) = axis_title(x) {
        let size = size * s;
        let v = if top_side { VPos::Bottom } else { VPos::Top };
        let ty = at + dir * (gap + depth + 8.0 * s);
        p.text(
            &text,
            ((x.start + x.end) / 2.0, ty),
            TextSpec::new(size, TEXT_GRAY).anchor(HPos::Center, v),
        )?;
    }
    Ok(())
}

fn draw_y_axis<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    s: f64,
    x: &AxisGeom<'_>,
    y: &AxisGeom<'_>,
) -> Result<()> {
    let layout = y.layout;
    let right_side = y.side() == Some("right");
    let (at, other) = if right_side { (x.end, x.start) } else { (x.start, x.end) };
    if layout.and_then(|l| l.showline).unwrap_or(false) {
        let color = line_color(y);
        p.line((at, y.start), (at, y.end), color, s)?;
        if layout.and_then(|l| l.mirror).unwrap_or(false) {
            p.line((other, y.start), (other, y.end), color, s)?;
        }
    }
    let font = y.tick_font() * s;
    let gap = 6.0 * s;
    let dir = if right_side { 1.0 } else { -1.0 };
    let h = if right_side { HPos::Left } else { HPos::Right };
    let mut widest: f64 = 0.0;
    for (py, label) in y.ticks_px(50.0 * s) {
        widest = widest.max(estimate_text_width_px(&label, font as u32) as f64);
        p.text(
            &label,
            (at + dir * gap, py),
            TextSpec::new(font, TEXT_GRAY).anchor(h, VPos::Center),
        )?;
    }
    if let Some((text, size)) = axis_title(y) {
        let size = size * s;
        let tx = at + dir * (gap + widest + 6.0 * s + size / 2.0);
        p.text(
            &text,
            (tx, (y.start + y.end) / 2.0),
            TextSpec::new(size, TEXT_GRAY).vertical(),
        )?;
    }
    Ok(())
}

/// Colorscale legend of a trace: gradient name and value range.
fn colorbar_of(t: &Trace) -> Option<(Option<&str>, f64, f64)> {
    match t.kind {
        TraceKind::Heatmap | TraceKind::Contour if t.showscale != Some(false) => {
            let (lo, hi) = value_bounds(t, t.z.as_deref()?)?;
            Some((t.colorscale.as_deref(), lo, hi))
        }
        TraceKind::Scatter => {
            let marker = t.marker.as_ref()?;
            if marker.showscale != Some(true) {
                return None;
            }
            match &marker.color {
                Some(MarkerColor::Values(vals)) => {
                    let (lo, hi) = min_max(vals.iter().copied())?;
                    Some((marker.colorscale.as_deref(), lo, hi))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Vertical colorbars to the right of each panel that shows a colorscale.
pub(crate) fn draw_colorbars<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    scene: &Scene,
    canvas: &Canvas,
    axes: &AxisSet<'_>,
) -> Result<()> {
    const STEPS: usize = 64;
    let s = canvas.scale;
    let mut per_panel: HashMap<Panel, usize> = HashMap::new();
    for t in &scene.data {
        let Some((name, lo, hi)) = colorbar_of(t) else {
            continue;
        };
        let (xk, yk) = trace_keys(t);
        let panel = Panel { x: xk, y: yk };
        let Some((x, y)) = axes.pair(&panel) else {
            continue;
        };
        let twin = axes.axes.values().any(|a| {
            a.side() == Some("right") && a.start == y.start && a.end == y.end
        });
        let k = per_panel.entry(panel).or_default();
        let right = x.start.max(x.end);
        let x0 = right + (12.0 + *k as f64 * 70.0 + if twin { 50.0 } else { 0.0 }) * s;
        *k += 1;
        let x1 = x0 + 15.0 * s;
        let (bottom, top) = (y.start.max(y.end), y.start.min(y.end));
        let gradient = colorscale(name);
        for i in 0..STEPS {
            let b0 = bottom + (top - bottom) * i as f64 / STEPS as f64;
            let b1 = bottom + (top - bottom) * (i + 1) as f64 / STEPS as f64;
            let fill = rgb8_to_rgba(gradient.sample((i as f64 + 0.5) / STEPS as f64));
            p.rect((x0, b0), (x1, b1), Some(fill), None)?;
        }
        p.rect((x0, bottom), (x1, top), None, Some((TEXT_GRAY, s)))?;
        if hi > lo {
            let (ticks, step) = nice_ticks(lo, hi, 5);
            for v in ticks {
                let py = bottom + (top - bottom) * (v - lo) / (hi - lo);
                p.line((x1, py), (x1 + 3.0 * s, py), TEXT_GRAY, s)?;
                p.text(
                    &format_tick(v, step),
                    (x1 + 5.0 * s, py),
                    TextSpec::new(11.0 * s, TEXT_GRAY).anchor(HPos::Left, VPos::Center),
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AxisType, Layout};

    fn scene_with(traces: Vec<Trace>, layout: Layout) -> Scene {
        Scene {
            data: traces,
            layout,
        }
    }

    fn line(x: Vec<f64>, y: Vec<f64>) -> Trace {
        let mut t = Trace::new(TraceKind::Scatter);
        t.x = Some(x);
        t.y = Some(y);
        t
    }

    #[test]
    fn axes_cover_trace_data() {
        let scene = scene_with(vec![line(vec![0.0, 10.0], vec![5.0, 6.0])], Layout::default());
        let canvas = Canvas::new(&scene, (700, 500), 1.0);
        let axes = AxisSet::build(&scene, &canvas);
        let x = axes.axes.get("xaxis").unwrap();
        assert!(x.scale.lo < 0.0 && x.scale.hi > 10.0);
        assert_eq!(axes.panels(&scene), vec![Panel { x: "xaxis".into(), y: "yaxis".into() }]);
    }

    #[test]
    fn overlaying_axis_shares_domain() {
        let mut layout = Layout::default();
        layout.axis_mut("yaxis").domain = Some([0.5, 1.0]);
        layout.axis_mut("yaxis2").overlaying = Some("y".into());
        let mut twin = line(vec![0.0, 1.0], vec![100.0, 200.0]);
        twin.yaxis = Some("y2".into());
        let scene = scene_with(vec![line(vec![0.0, 1.0], vec![1.0, 2.0]), twin], layout);
        let canvas = Canvas::new(&scene, (700, 500), 1.0);
        let axes = AxisSet::build(&scene, &canvas);
        let (y, y2) = (axes.axes.get("yaxis").unwrap(), axes.axes.get("yaxis2").unwrap());
        assert_eq!((y.start, y.end), (y2.start, y2.end));
        assert!(y2.scale.hi > 200.0);
    }

    #[test]
    fn matched_axes_share_range() {
        let mut layout = Layout::default();
        layout.axis_mut("xaxis2").matches = Some("x".into());
        let mut second = line(vec![50.0, 60.0], vec![0.0, 1.0]);
        second.xaxis = Some("x2".into());
        second.yaxis = Some("y2".into());
        let scene = scene_with(vec![line(vec![0.0, 1.0], vec![0.0, 1.0]), second], layout);
        let canvas = Canvas::new(&scene, (700, 500), 1.0);
        let axes = AxisSet::build(&scene, &canvas);
        assert_eq!(axes.axes.get("xaxis").unwrap().scale, axes.axes.get("xaxis2").unwrap().scale);
    }

    #[test]
    fn domain_references_resolve_inside_panel() {
        let mut layout = Layout::default();
        layout.axis_mut("xaxis").domain = Some([0.0, 0.5]);
        layout.axis_mut("xaxis").scale = Some(AxisType::Linear);
        let scene = scene_with(vec![line(vec![0.0, 1.0], vec![0.0, 1.0])], layout);
        let canvas = Canvas::new(&scene, (700, 500), 1.0);
        let axes = AxisSet::build(&scene, &canvas);
        let right = axes.resolve("x domain", 1.0, 'x', &canvas).unwrap();
        assert_eq!(right, canvas.paper_x(0.5));
        assert_eq!(axes.resolve("paper", 0.0, 'y', &canvas), Some(canvas.paper_y(0.0)));
    }

    #[test]
    fn bars_are_slotted_per_panel() {
        let mut a = Trace::new(TraceKind::Bar);
        a.x = Some(vec![0.0]);
        a.y = Some(vec![1.0]);
        let b = a.clone();
        let scene = scene_with(vec![a, line(vec![0.0], vec![0.0]), b], Layout::default());
        assert_eq!(bar_slots(&scene), vec![(0, 2), (0, 1), (1, 2)]);
    }
}
