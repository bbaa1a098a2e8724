//! Annotations, arrows and the figure title.

use plotters::backend::DrawingBackend;
use plotters::style::RGBAColor;
use plotters::style::text_anchor::{HPos, VPos};

use crate::error::Result;
use crate::legend::parse_panel_entries;
use crate::models::{Annotation, Scene};

use super::legend::{BoxStyle, Entry, Glyph, box_origin, box_size, draw_legend_box};
use super::panel::AxisSet;
use super::text::{block_width_px, plain_lines};
use super::util::to_rgba;
use super::{Canvas, Painter, TextSpec};

const TEXT_GRAY: RGBAColor = RGBAColor(68, 68, 68, 1.0);

/// Default arrow tail offset in layout pixels, as plotly.js places it.
const DEFAULT_AX: f64 = -10.0;
const DEFAULT_AY: f64 = -30.0;

pub(crate) fn draw_annotations<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    scene: &Scene,
    canvas: &Canvas,
    axes: &AxisSet<'_>,
) -> Result<()> {
    for ann in &scene.layout.annotations {
        let (Some(x), Some(y)) = (
            axes.resolve(&ann.xref, ann.x, 'x', canvas),
            axes.resolve(&ann.yref, ann.y, 'y', canvas),
        ) else {
            continue;
        };
        let entries = parse_panel_entries(&ann.text);
        if entries.is_empty() {
            draw_note(p, ann, (x, y), canvas, axes)?;
        } else {
            let entries: Vec<Entry> = entries
                .into_iter()
                .map(|(label, color)| Entry {
                    label,
                    color: to_rgba(&color),
                    glyph: Glyph::Marker,
                })
                .collect();
            let style = box_style(ann, canvas.scale);
            let origin = box_origin(
                (x, y),
                box_size(&entries, &style, canvas.scale),
                ann.xanchor.as_deref(),
                ann.yanchor.as_deref(),
                (ann.x, ann.y),
            );
            draw_legend_box(p, &entries, origin, &style, canvas.scale)?;
        }
    }
    Ok(())
}

fn box_style(ann: &Annotation, s: f64) -> BoxStyle {
    let font = ann.font.as_ref();
    BoxStyle {
        font: font.and_then(|f| f.size).unwrap_or(12.0) * s,
        text_color: font
            .and_then(|f| f.color.as_ref())
            .map(to_rgba)
            .unwrap_or(TEXT_GRAY),
        bg: ann.bgcolor.as_ref().map(to_rgba),
        border: ann
            .bordercolor
            .as_ref()
            .map(|c| (to_rgba(c), ann.borderwidth.unwrap_or(1.0) * s)),
        pad: ann.borderpad.unwrap_or(1.0) * s,
    }
}

/// Arrow tail: data coordinates when `axref`/`ayref` name an axis, otherwise
/// a pixel offset from the head.
fn arrow_tail(ann: &Annotation, head: (f64, f64), canvas: &Canvas, axes: &AxisSet<'_>) -> (f64, f64) {
    let s = canvas.scale;
    let along = |r: Option<&String>, v: Option<f64>, default: f64, h: f64, letter: char| {
        match (r.map(String::as_str), v) {
            (Some(r), Some(v)) if r != "pixel" => axes.resolve(r, v, letter, canvas).unwrap_or(h),
            (_, v) => h + v.unwrap_or(default) * s,
        }
    };
    (
        along(ann.axref.as_ref(), ann.ax, DEFAULT_AX, head.0, 'x'),
        along(ann.ayref.as_ref(), ann.ay, DEFAULT_AY, head.1, 'y'),
    )
}

fn draw_arrow<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    tail: (f64, f64),
    head: (f64, f64),
    color: RGBAColor,
    s: f64,
    with_head: bool,
) -> Result<()> {
    let (dx, dy) = (head.0 - tail.0, head.1 - tail.1);
    let len = dx.hypot(dy);
    if len < 1.0 {
        return Ok(());
    }
    p.line(tail, head, color, s)?;
    if with_head {
        let (ux, uy) = (dx / len, dy / len);
        let size = 8.0 * s;
        let back = (head.0 - ux * size, head.1 - uy * size);
        let half = size * 0.45;
        p.polygon(
            &[
                head,
                (back.0 - uy * half, back.1 + ux * half),
                (back.0 + uy * half, back.1 - ux * half),
            ],
            color,
        )?;
    }
    Ok(())
}

fn draw_note<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    ann: &Annotation,
    head: (f64, f64),
    canvas: &Canvas,
    axes: &AxisSet<'_>,
) -> Result<()> {
    let s = canvas.scale;
    let style = box_style(ann, s);
    let at = if ann.showarrow {
        let tail = arrow_tail(ann, head, canvas, axes);
        draw_arrow(p, tail, head, style.text_color, s, ann.arrowhead != Some(0))?;
        tail
    } else {
        head
    };
    let (xanchor, yanchor) = if ann.showarrow {
        (Some("center"), Some("middle"))
    } else {
        (
            ann.xanchor.as_deref().or(Some("center")),
            ann.yanchor.as_deref().or(Some("middle")),
        )
    };
    text_block(p, &ann.text, at, xanchor, yanchor, ann.align.as_deref(), &style)
}

/// Multi-line text in an optional frame, anchored like a legend box.
fn text_block<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    text: &str,
    at: (f64, f64),
    xanchor: Option<&str>,
    yanchor: Option<&str>,
    align: Option<&str>,
    style: &BoxStyle,
) -> Result<()> {
    let lines = plain_lines(text);
    let line_h = style.font * 1.3;
    let w = block_width_px(&lines, style.font as u32) as f64 + 2.0 * style.pad;
    let h = lines.len() as f64 * line_h + 2.0 * style.pad;
    let (left, top) = box_origin(at, (w, h), xanchor, yanchor, (0.5, 0.5));
    if style.bg.is_some() || style.border.is_some() {
        p.rect((left, top), (left + w, top + h), style.bg, style.border)?;
    }
    let (hpos, tx) = match align.unwrap_or("center") {
        "left" => (HPos::Left, left + style.pad),
        "right" => (HPos::Right, left + w - style.pad),
        _ => (HPos::Center, left + w / 2.0),
    };
    for (i, line) in lines.iter().enumerate() {
        let cy = top + style.pad + (i as f64 + 0.5) * line_h;
        p.text(
            line,
            (tx, cy),
            TextSpec::new(style.font, style.text_color).anchor(hpos, VPos::Center),
        )?;
    }
    Ok(())
}

/// Figure title, centered in the top margin.
pub(crate) fn draw_title<DB: DrawingBackend>(
    p: &Painter<'_, DB>,
    scene: &Scene,
    canvas: &Canvas,
) -> Result<()> {
    let Some(title) = scene.layout.title.as_ref().filter(|t| !t.text.is_empty()) else {
        return Ok(());
    };
    let font = title.font.as_ref();
    let style = BoxStyle {
        font: font.and_then(|f| f.size).unwrap_or(17.0) * canvas.scale,
        text_color: font
            .and_then(|f| f.color.as_ref())
            .map(to_rgba)
            .unwrap_or(TEXT_GRAY),
        bg: None,
        border: None,
        pad: 0.0,
    };
    let at = (canvas.width / 2.0, canvas.margin.t / 2.0);
    text_block(p, &title.text, at, Some("center"), Some("middle"), None, &style)
}
