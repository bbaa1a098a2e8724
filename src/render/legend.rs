//! Legend boxes: the built-in legend of the layout and the synthetic
//! per-panel legends of subplot grids.

use plotters::backend::DrawingBackend;
use plotters::style::RGBAColor;
use plotters::style::text_anchor::{HPos, VPos};

use crate::error::Result;
use crate::models::{LegendLayout, Mode, Scene, Trace, TraceKind};
use crate::palette::default_color;
use crate::style::LineDash;

use super::geometry::dash_pattern;
use super::text::estimate_text_width_px;
use super::util::to_rgba;
use super::{Canvas, Painter, TextSpec};

const TEXT_GRAY: RGBAColor = RGBAColor(68, 68, 68, 1.0);

/// Swatch drawn in front of a legend label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Glyph {
    Line(Option<LineDash>),
    Marker,
    Block,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub label: String,
    pub color: RGBAColor,
    pub glyph: Glyph,
}

/// Frame and font of a legend box, already in pixels.
pub(crate) struct BoxStyle {
    pub font: f64,
    pub text_color: RGBAColor,
    pub bg: Option<RGBAColor>,
    pub border: Option<(RGBAColor, f64)>,
    pub pad: f64,
}

/// Top-left corner of a `w`×`h` box whose anchor point is `at`.
///
/// `auto` anchors follow the position of the box on the paper: the left third
/// anchors left, the right third anchors right.
pub(crate) fn box_origin(
    at: (f64, f64),
    (w, h): (f64, f64),
    xanchor: Option<&str>,
    yanchor: Option<&str>,
    paper: (f64, f64),
) -> (f64, f64) {
    let x = match xanchor.unwrap_or("auto") {
        "left" => 0.0,
        "right" => 1.0,
        "center" => 0.5,
        _ if paper.0 <= 1.0 / 3.0 => 0.0,
        _ if paper.0 >= 2.0 / 3.0 => 1.0,
        _ => 0.5,
    };
    let y = match yanchor.unwrap_or("auto") {
        "top" => 0.0,
        "bottom" => 1.0,
        "middle" => 0.5,
        _ if paper.1 >= 2.0 / 3.0 => 0.0,
        _ if paper.1 <= 1.0 / 3.0 => 1.0,
        _ => 0.5,
    };
    (at.0 - x * w, at.1 - y * h)
}

/// Pixel size of a legend box holding `entries`.
pub(crate) fn box_size(entries: &[Entry], style: &BoxStyle, s: f64) -> (f64, f64) {
    let widest = entries
        .iter()
        .map(|e| estimate_text_width_px(&e.label, style.font as u32))
        .max()
        .unwrap_or(0) as f64;
    let line_h = style.font + 2.0 * s;
    (
        2.0 * style.pad + 30.0 * s + widest,
        2.0 * style.pad + entries.len() as f64 * line_h,
    )
}

/// Draw a legend box with its top-left corner at `origin`.
pub(crate) fn draw_legend_box<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    entries: &[Entry],
    origin: (f64, f64),
    style: &BoxStyle,
    s: f64,
) -> Result<()> {
    let (w, h) = box_size(entries, style, s);
    let (left, top) = origin;
    p.rect((left, top), (left + w, top + h), style.bg, style.border)?;

    let line_h = style.font + 2.0 * s;
    let glyph_x = left + style.pad + 12.0 * s;
    let text_x = left + style.pad + 30.0 * s;
    for (i, entry) in entries.iter().enumerate() {
        let cy = top + style.pad + (i as f64 + 0.5) * line_h;
        match entry.glyph {
            Glyph::Line(dash) => {
                let width = 2.0 * s;
                p.polyline(
                    &[(glyph_x - 10.0 * s, cy), (glyph_x + 10.0 * s, cy)],
                    entry.color,
                    width,
                    &dash_pattern(dash, width),
                )?;
            }
            Glyph::Marker => p.circle((glyph_x, cy), 4.0 * s, Some(entry.color), None)?,
            Glyph::Block => p.rect(
                (glyph_x - 6.0 * s, cy - 5.0 * s),
                (glyph_x + 6.0 * s, cy + 5.0 * s),
                Some(entry.color),
                None,
            )?,
        }
        p.text(
            &entry.label,
            (text_x, cy),
            TextSpec::new(style.font, style.text_color).anchor(HPos::Left, VPos::Center),
        )?;
    }
    Ok(())
}

fn trace_entry(t: &Trace, idx: usize) -> Option<Entry> {
    let label = t.name.clone().filter(|n| !n.is_empty())?;
    let color = t
        .display_color()
        .map(to_rgba)
        .unwrap_or_else(|| to_rgba(&default_color(idx)));
    let glyph = match t.kind {
        TraceKind::Scatter => match t.mode {
            Some(Mode::Markers) => Glyph::Marker,
            _ => Glyph::Line(t.line.as_ref().and_then(|l| l.dash)),
        },
        TraceKind::Bar | TraceKind::Histogram => Glyph::Block,
        _ => return None,
    };
    Some(Entry {
        label,
        color,
        glyph,
    })
}

/// Entries of the built-in legend in trace order; pie slices list their
/// labels.
pub(crate) fn builtin_entries(scene: &Scene) -> Vec<Entry> {
    let mut out = Vec::new();
    for (idx, t) in scene.data.iter().enumerate() {
        if t.showlegend == Some(false) {
            continue;
        }
        if t.kind == TraceKind::Pie {
            let colors = t.marker.as_ref().and_then(|m| m.colors.as_ref());
            for (i, label) in t.labels.iter().flatten().enumerate() {
                let color = colors
                    .and_then(|c| c.get(i))
                    .map(to_rgba)
                    .unwrap_or_else(|| to_rgba(&default_color(i)));
                out.push(Entry {
                    label: label.clone(),
                    color,
                    glyph: Glyph::Block,
                });
            }
        } else if let Some(entry) = trace_entry(t, idx) {
            out.push(entry);
        }
    }
    out
}

pub(crate) fn draw_builtin_legend<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    scene: &Scene,
    canvas: &Canvas,
) -> Result<()> {
    let default_layout = LegendLayout::default();
    let legend = scene.layout.legend.as_ref().unwrap_or(&default_layout);
    if legend.visible == Some(false) {
        return Ok(());
    }
    let entries = builtin_entries(scene);
    let has_pie = scene.data.iter().any(|t| t.kind == TraceKind::Pie);
    let show = scene
        .layout
        .showlegend
        .unwrap_or(entries.len() > 1 || has_pie);
    if !show || entries.is_empty() {
        return Ok(());
    }

    let s = canvas.scale;
    let font = legend.font.as_ref();
    let style = BoxStyle {
        font: font.and_then(|f| f.size).unwrap_or(12.0) * s,
        text_color: font
            .and_then(|f| f.color.as_ref())
            .map(to_rgba)
            .unwrap_or(TEXT_GRAY),
        bg: legend.bgcolor.as_ref().map(to_rgba),
        border: legend
            .bordercolor
            .as_ref()
            .map(|c| (to_rgba(c), legend.borderwidth.unwrap_or(0.0) * s)),
        pad: 4.0 * s,
    };
    let (px, py) = (legend.x.unwrap_or(1.02), legend.y.unwrap_or(1.0));
    let at = (canvas.paper_x(px), canvas.paper_y(py));
    let xanchor = legend.xanchor.as_deref().or(Some("left"));
    let origin = box_origin(
        at,
        box_size(&entries, &style, s),
        xanchor,
        legend.yanchor.as_deref(),
        (px, py),
    );
    draw_legend_box(p, &entries, origin, &style, s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineStyle;
    use crate::style::Color;

    #[test]
    fn anchors_shift_the_box() {
        assert_eq!(box_origin((100.0, 50.0), (20.0, 10.0), Some("right"), Some("bottom"), (0.5, 0.5)), (80.0, 40.0));
        assert_eq!(box_origin((100.0, 50.0), (20.0, 10.0), None, None, (1.0, 1.0)), (80.0, 50.0));
        assert_eq!(box_origin((100.0, 50.0), (20.0, 10.0), None, None, (0.5, 0.5)), (90.0, 45.0));
    }

    #[test]
    fn unnamed_and_hidden_traces_are_skipped() {
        let mut named = Trace::new(TraceKind::Scatter);
        named.name = Some("sales".into());
        named.line = Some(LineStyle {
            color: Some(Color::new("red")),
            dash: Some(LineDash::Dash),
            ..Default::default()
        });
        let mut hidden = named.clone();
        hidden.showlegend = Some(false);
        let scene = Scene {
            data: vec![named, Trace::new(TraceKind::Scatter), hidden],
            ..Default::default()
        };
        let entries = builtin_entries(&scene);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].glyph, Glyph::Line(Some(LineDash::Dash)));
        assert_eq!(entries[0].color, RGBAColor(255, 0, 0, 1.0));
    }

    #[test]
    fn pie_slices_become_entries() {
        let mut pie = Trace::new(TraceKind::Pie);
        pie.labels = Some(vec!["a".into(), "b".into()]);
        pie.values = Some(vec![1.0, 2.0]);
        let scene = Scene {
            data: vec![pie],
            ..Default::default()
        };
        let labels: Vec<String> = builtin_entries(&scene).into_iter().map(|e| e.label).collect();
        assert_eq!(labels, ["a", "b"]);
    }
}
