//! Raster and vector rendering of a [`Scene`] with plotters.
//!
//! The browser is the reference renderer for scenes; this module draws the
//! same figure offline so `savefig("plot.png")` works without one. It covers
//! the trace types and layout attributes the plotting API produces:
//! - scatter lines, markers, fills and error bars
//! - grouped bars, histograms, heatmaps, contours and pies
//! - axes with grids, ticks, titles, log and reversed scales
//! - shapes, annotations with arrows, colorbars
//! - the built-in legend and the per-panel legends of subplot grids
//!
//! Text needs a font; see [`fonts::ensure_fonts_registered`].

pub mod fonts;
pub(crate) mod geometry;
mod annotations;
mod legend;
mod panel;
pub mod text;
pub(crate) mod util;

use std::path::Path;

use log::{debug, info};
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontTransform};
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use crate::error::{PlotError, Result};
use crate::export::Format;
use crate::models::{Margin, Scene};
use crate::options::ExportOptions;

use geometry::dash_polyline;
use util::to_rgba;

/// plotly.js defaults for a layout without explicit size or margins.
const DEFAULT_WIDTH: f64 = 700.0;
const DEFAULT_HEIGHT: f64 = 500.0;
const DEFAULT_MARGIN: Margin = Margin {
    l: 80.0,
    r: 80.0,
    t: 100.0,
    b: 80.0,
};

pub(crate) fn render_err<E: std::fmt::Debug>(e: E) -> PlotError {
    PlotError::Render(format!("{e:?}"))
}

/// Pixel size of the output image.
pub(crate) fn output_size(scene: &Scene, opts: ExportOptions) -> (u32, u32) {
    let scale = opts.scale.filter(|s| *s > 0.0).unwrap_or(1.0);
    let width = opts
        .width
        .map(f64::from)
        .or(scene.layout.width)
        .unwrap_or(DEFAULT_WIDTH);
    let height = opts
        .height
        .map(f64::from)
        .or(scene.layout.height)
        .unwrap_or(DEFAULT_HEIGHT);
    (
        (width * scale).round().max(1.0) as u32,
        (height * scale).round().max(1.0) as u32,
    )
}

/// Draw `scene` into an image file of the given raster or vector format.
pub(crate) fn render_file(
    scene: &Scene,
    path: &Path,
    format: Format,
    opts: ExportOptions,
) -> Result<()> {
    let size = output_size(scene, opts);
    let canvas = Canvas::new(scene, size, opts.scale.filter(|s| *s > 0.0).unwrap_or(1.0));
    let has_text = fonts::ensure_fonts_registered();
    debug!(
        "rendering {} traces at {}x{} (text: {})",
        scene.data.len(),
        size.0,
        size.1,
        has_text
    );
    match format {
        Format::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_scene(&root, scene, &canvas, has_text)?;
            root.present().map_err(render_err)?;
        }
        Format::Png | Format::Jpeg | Format::Bmp => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_scene(&root, scene, &canvas, has_text)?;
            root.present().map_err(render_err)?;
        }
        Format::Html | Format::Json => {
            return Err(PlotError::UnsupportedFormat(format!("{format:?}")));
        }
    }
    info!("rendered {}", path.display());
    Ok(())
}

/// Pixel geometry of the whole image.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Canvas {
    pub width: f64,
    pub height: f64,
    /// Pixels per layout unit.
    pub scale: f64,
    pub margin: Margin,
}

impl Canvas {
    pub fn new(scene: &Scene, size: (u32, u32), scale: f64) -> Self {
        let m = scene.layout.margin.unwrap_or(DEFAULT_MARGIN);
        let (width, height) = (size.0 as f64, size.1 as f64);
        // Margins larger than the image leave a one-pixel plot area.
        let fit = |a: f64, b: f64, total: f64| {
            let sum = (a + b) * scale;
            if sum < total - 1.0 {
                (a * scale, b * scale)
            } else {
                let k = (total - 1.0).max(0.0) / sum.max(1.0);
                (a * scale * k, b * scale * k)
            }
        };
        let (l, r) = fit(m.l, m.r, width);
        let (t, b) = fit(m.t, m.b, height);
        Canvas {
            width,
            height,
            scale,
            margin: Margin { l, r, t, b },
        }
    }

    /// Horizontal pixel of a paper x coordinate.
    pub fn paper_x(&self, x: f64) -> f64 {
        self.margin.l + x * (self.width - self.margin.l - self.margin.r)
    }

    /// Vertical pixel of a paper y coordinate (paper y grows upwards).
    pub fn paper_y(&self, y: f64) -> f64 {
        self.height - self.margin.b - y * (self.height - self.margin.t - self.margin.b)
    }

    /// Layout length (font size, line width, offset) in pixels.
    pub fn px(&self, v: f64) -> f64 {
        v * self.scale
    }
}

fn ipt(p: (f64, f64)) -> (i32, i32) {
    (p.0.round() as i32, p.1.round() as i32)
}

/// Thin drawing layer over a plotters area in pixel coordinates.
pub(crate) struct Painter<'a, DB: DrawingBackend> {
    area: &'a DrawingArea<DB, Shift>,
    pub has_text: bool,
}

impl<DB: DrawingBackend> Painter<'_, DB> {
    pub fn polyline(
        &self,
        points: &[(f64, f64)],
        color: RGBAColor,
        width: f64,
        dash: &[f64],
    ) -> Result<()> {
        if width <= 0.0 || points.len() < 2 || color.3 <= 0.0 {
            return Ok(());
        }
        let style = ShapeStyle {
            color,
            filled: false,
            stroke_width: width.round().max(1.0) as u32,
        };
        for piece in dash_polyline(points, dash) {
            let pts: Vec<(i32, i32)> = piece.into_iter().map(ipt).collect();
            self.area
                .draw(&PathElement::new(pts, style))
                .map_err(render_err)?;
        }
        Ok(())
    }

    pub fn line(&self, a: (f64, f64), b: (f64, f64), color: RGBAColor, width: f64) -> Result<()> {
        self.polyline(&[a, b], color, width, &[])
    }

    pub fn polygon(&self, points: &[(f64, f64)], fill: RGBAColor) -> Result<()> {
        if points.len() < 3 || fill.3 <= 0.0 {
            return Ok(());
        }
        let pts: Vec<(i32, i32)> = points.iter().copied().map(ipt).collect();
        self.area
            .draw(&Polygon::new(pts, fill.filled()))
            .map_err(render_err)
    }

    /// Axis-aligned rectangle between two corners, filled and/or outlined.
    pub fn rect(
        &self,
        a: (f64, f64),
        b: (f64, f64),
        fill: Option<RGBAColor>,
        stroke: Option<(RGBAColor, f64)>,
    ) -> Result<()> {
        let (a, b) = (ipt(a), ipt(b));
        if let Some(fill) = fill.filter(|c| c.3 > 0.0) {
            self.area
                .draw(&Rectangle::new([a, b], fill.filled()))
                .map_err(render_err)?;
        }
        if let Some((color, width)) = stroke.filter(|(c, w)| c.3 > 0.0 && *w > 0.0) {
            let style = ShapeStyle {
                color,
                filled: false,
                stroke_width: width.round().max(1.0) as u32,
            };
            self.area
                .draw(&Rectangle::new([a, b], style))
                .map_err(render_err)?;
        }
        Ok(())
    }

    pub fn circle(
        &self,
        center: (f64, f64),
        radius: f64,
        fill: Option<RGBAColor>,
        stroke: Option<(RGBAColor, f64)>,
    ) -> Result<()> {
        let c = ipt(center);
        let r = radius.round().max(1.0) as i32;
        if let Some(fill) = fill.filter(|c| c.3 > 0.0) {
            self.area
                .draw(&Circle::new(c, r, fill.filled()))
                .map_err(render_err)?;
        }
        if let Some((color, width)) = stroke.filter(|(c, w)| c.3 > 0.0 && *w > 0.0) {
            let style = ShapeStyle {
                color,
                filled: false,
                stroke_width: width.round().max(1.0) as u32,
            };
            self.area
                .draw(&Circle::new(c, r, style))
                .map_err(render_err)?;
        }
        Ok(())
    }

    /// One line of text; a no-op when no font is registered.
    pub fn text(&self, text: &str, at: (f64, f64), style: TextSpec) -> Result<()> {
        if !self.has_text || text.is_empty() {
            return Ok(());
        }
        let font: FontDesc = (FontFamily::SansSerif, style.size.max(1.0)).into();
        let mut ts = TextStyle::from(font)
            .color(&style.color)
            .pos(Pos::new(style.h, style.v));
        if style.vertical {
            ts = ts.transform(FontTransform::Rotate270);
        }
        self.area
            .draw(&Text::new(text.to_string(), ipt(at), ts))
            .map_err(render_err)
    }
}

/// Font size, color and anchoring of a text run.
#[derive(Clone, Copy)]
pub(crate) struct TextSpec {
    pub size: f64,
    pub color: RGBAColor,
    pub h: HPos,
    pub v: VPos,
    pub vertical: bool,
}

impl TextSpec {
    pub fn new(size: f64, color: RGBAColor) -> Self {
        TextSpec {
            size,
            color,
            h: HPos::Center,
            v: VPos::Center,
            vertical: false,
        }
    }

    pub fn anchor(mut self, h: HPos, v: VPos) -> Self {
        self.h = h;
        self.v = v;
        self
    }

    pub fn vertical(mut self) -> Self {
        self.vertical = true;
        self
    }
}

/// Paint the full scene.
fn draw_scene<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    scene: &Scene,
    canvas: &Canvas,
    has_text: bool,
) -> Result<()> {
    let paper = scene
        .layout
        .paper_bgcolor
        .as_ref()
        .map(to_rgba)
        .unwrap_or(WHITE.to_rgba());
    root.fill(&paper).map_err(render_err)?;
    let painter = Painter {
        area: root,
        has_text,
    };

    let axes = panel::AxisSet::build(scene, canvas);
    let panels = axes.panels(scene);

    panel::draw_backgrounds(&painter, scene, &axes, &panels)?;
    panel::draw_grids(&painter, canvas, &axes, &panels)?;
    panel::draw_shapes(&painter, scene, canvas, &axes, true)?;
    panel::draw_traces(&painter, scene, canvas, &axes)?;
    panel::draw_shapes(&painter, scene, canvas, &axes, false)?;
    panel::draw_frames(&painter, canvas, &axes, &panels)?;
    panel::draw_colorbars(&painter, scene, canvas, &axes)?;
    annotations::draw_annotations(&painter, scene, canvas, &axes)?;
    legend::draw_builtin_legend(&painter, scene, canvas)?;
    annotations::draw_title(&painter, scene, canvas)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_prefers_options_then_layout() {
        let mut scene = Scene::default();
        assert_eq!(output_size(&scene, ExportOptions::default()), (700, 500));
        scene.layout.width = Some(800.0);
        assert_eq!(output_size(&scene, ExportOptions::default()).0, 800);
        let opts = ExportOptions::size(300, 200).scale(2.0);
        assert_eq!(output_size(&scene, opts), (600, 400));
    }

    #[test]
    fn paper_coordinates_map_inside_margins() {
        let scene = Scene::default();
        let c = Canvas::new(&scene, (700, 500), 1.0);
        assert_eq!(c.paper_x(0.0), 80.0);
        assert_eq!(c.paper_x(1.0), 620.0);
        assert_eq!(c.paper_y(0.0), 420.0);
        assert_eq!(c.paper_y(1.0), 100.0);
    }

    #[test]
    fn oversized_margins_shrink() {
        let mut scene = Scene::default();
        scene.layout.margin = Some(Margin {
            l: 400.0,
            r: 400.0,
            t: 10.0,
            b: 10.0,
        });
        let c = Canvas::new(&scene, (100, 100), 1.0);
        assert!(c.margin.l + c.margin.r < 100.0);
    }
}
