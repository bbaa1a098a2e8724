//! The figure: a grid of panels plus figure-wide settings, assembled into a
//! [`Scene`] on export.

use std::path::Path;

use log::{debug, info};
use serde_json::{Map, Value};

use crate::axes::{Axes, Placement, axis_key};
use crate::error::{PlotError, Result};
use crate::export;
use crate::legend::LegendConfig;
use crate::models::{Annotation, AxisLayout, Font, Layout, Margin, Scene, Title};
use crate::options::{ExportOptions, FigureOptions};
use crate::palette::{Gradient, StopGradient};
use crate::style::Color;

/// Font size of subplot titles.
const SUBPLOT_TITLE_SIZE: f64 = 16.0;

/// Pixels per inch of `figsize`.
const DPI: f64 = 100.0;

/// `(x_domain, y_domain)` of every grid cell, row-major with row 0 at the top.
pub fn grid_domains(
    nrows: usize,
    ncols: usize,
    horizontal_spacing: f64,
    vertical_spacing: f64,
) -> Vec<([f64; 2], [f64; 2])> {
    let nrows = nrows.max(1);
    let ncols = ncols.max(1);
    let width = (1.0 - horizontal_spacing * (ncols - 1) as f64) / ncols as f64;
    let height = (1.0 - vertical_spacing * (nrows - 1) as f64) / nrows as f64;
    let clamp = |v: f64| v.clamp(0.0, 1.0);
    let mut out = Vec::with_capacity(nrows * ncols);
    for row in 0..nrows {
        let top = 1.0 - row as f64 * (height + vertical_spacing);
        for col in 0..ncols {
            let left = col as f64 * (width + horizontal_spacing);
            out.push((
                [clamp(left), clamp(left + width)],
                [clamp(top - height), clamp(top)],
            ));
        }
    }
    out
}

/// Recursive JSON merge: objects merge key by key, anything else is replaced.
pub(crate) fn merge_json(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, value) in src {
                match dst.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        dst.insert(key, value);
                    }
                }
            }
        }
        (dst, src) => *dst = src,
    }
}

/// Set every attribute of `top` that is present onto `base`.
fn overlay_axis(base: &mut AxisLayout, top: &AxisLayout) -> Result<()> {
    let mut merged = serde_json::to_value(&*base)?;
    merge_json(&mut merged, serde_json::to_value(top)?);
    *base = serde_json::from_value(merged)?;
    Ok(())
}

/// Log axes take their range as base-10 exponents. A limit that has no
/// logarithm drops the range and leaves the axis autoscaled.
fn exponent_range(axis: &mut AxisLayout) {
    if !axis.is_log() {
        return;
    }
    axis.range = axis
        .range
        .filter(|[lo, hi]| *lo > 0.0 && *hi > 0.0)
        .map(|[lo, hi]| [lo.log10(), hi.log10()]);
}

/// Frame styling every panel starts from.
fn base_axis() -> AxisLayout {
    AxisLayout {
        showline: Some(true),
        linecolor: Some(Color::new("black")),
        mirror: Some(true),
        showgrid: Some(false),
        gridcolor: Some(Color::new("#e5e5e5")),
        ..Default::default()
    }
}

/// A figure with one or more panels.
///
/// ```
/// use qplot::{Figure, LineOptions};
///
/// let mut fig = Figure::subplots(1, 2);
/// fig.ax(0, 0)?.plot([vec![1.0, 4.0, 9.0]], LineOptions::default().label("squares"))?;
/// fig.ax(0, 1)?.plot([vec![1.0, 2.0, 3.0]], LineOptions::default())?;
/// let scene = fig.to_scene()?;
/// assert_eq!(scene.data.len(), 2);
/// # Ok::<(), qplot::PlotError>(())
/// ```
pub struct Figure {
    nrows: usize,
    ncols: usize,
    sharex: bool,
    sharey: bool,
    panels: Vec<Axes>,
    current: usize,
    twins: usize,
    width: Option<f64>,
    height: Option<f64>,
    suptitle: Option<Title>,
    margin: Option<Margin>,
    template: Option<String>,
    passthrough: Value,
    gradient: Option<Box<dyn Gradient>>,
    legend_annotations: Vec<Annotation>,
}

impl Default for Figure {
    fn default() -> Self {
        Figure::new(FigureOptions::default())
    }
}

impl Figure {
    pub fn new(opts: FigureOptions) -> Self {
        let nrows = opts.nrows.max(1);
        let ncols = opts.ncols.max(1);
        let h = opts.horizontal_spacing.unwrap_or(0.2 / ncols as f64);
        let v = opts.vertical_spacing.unwrap_or(0.3 / nrows as f64);
        let panels = grid_domains(nrows, ncols, h, v)
            .into_iter()
            .enumerate()
            .map(|(i, (x_domain, y_domain))| {
                let mut ax = Axes::new(Placement {
                    row: i / ncols,
                    col: i % ncols,
                    x_number: i + 1,
                    y_number: i + 1,
                    x_domain,
                    y_domain,
                    twin_of: None,
                });
                if let Some(title) = opts.subplot_titles.get(i).filter(|t| !t.is_empty()) {
                    ax.title(title, None);
                }
                ax
            })
            .collect();
        debug!("new figure: {nrows}x{ncols} panels");
        Figure {
            nrows,
            ncols,
            sharex: opts.sharex,
            sharey: opts.sharey,
            panels,
            current: 0,
            twins: 0,
            width: opts.figsize.map(|(w, _)| w * DPI),
            height: opts.figsize.map(|(_, h)| h * DPI),
            suptitle: None,
            margin: None,
            template: None,
            passthrough: Value::Object(Map::new()),
            gradient: Some(Box::new(StopGradient::spectral())),
            legend_annotations: Vec::new(),
        }
    }

    /// A `nrows` × `ncols` grid with default spacing.
    pub fn subplots(nrows: usize, ncols: usize) -> Self {
        Figure::new(FigureOptions::grid(nrows, ncols))
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// More than one grid cell.
    pub fn is_grid(&self) -> bool {
        self.nrows * self.ncols > 1
    }

    fn cell_index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.nrows || col >= self.ncols {
            return Err(PlotError::NoSuchPanel {
                row,
                col,
                nrows: self.nrows,
                ncols: self.ncols,
            });
        }
        Ok(row * self.ncols + col)
    }

    /// Panel at a grid cell.
    pub fn ax(&mut self, row: usize, col: usize) -> Result<&mut Axes> {
        let idx = self.cell_index(row, col)?;
        Ok(&mut self.panels[idx])
    }

    /// Make a grid cell current and return it.
    pub fn subplot(&mut self, row: usize, col: usize) -> Result<&mut Axes> {
        self.current = self.cell_index(row, col)?;
        Ok(&mut self.panels[self.current])
    }

    /// Current panel; the first cell until [`Figure::subplot`] picks another.
    pub fn gca(&mut self) -> &mut Axes {
        &mut self.panels[self.current]
    }

    /// All panels: grid cells in row-major order, then secondary-y panels.
    pub fn panels(&self) -> &[Axes] {
        &self.panels
    }

    pub fn panels_mut(&mut self) -> &mut [Axes] {
        &mut self.panels
    }

    /// New panel sharing the x axis of a cell, with its own y axis on the
    /// right and its own color cycle.
    pub fn twinx(&mut self, row: usize, col: usize) -> Result<&mut Axes> {
        let parent_idx = self.cell_index(row, col)?;
        self.twins += 1;
        let parent = *self.panels[parent_idx].placement();
        let twin = Axes::new(Placement {
            y_number: self.nrows * self.ncols + self.twins,
            twin_of: Some(parent_idx),
            ..parent
        });
        debug!(
            "twin axis {} over panel ({row}, {col})",
            twin.yref()
        );
        self.panels.push(twin);
        let idx = self.panels.len() - 1;
        Ok(&mut self.panels[idx])
    }

    /// Most recent secondary-y panel of a cell.
    pub fn twin(&mut self, row: usize, col: usize) -> Option<&mut Axes> {
        let parent_idx = self.cell_index(row, col).ok()?;
        self.panels
            .iter_mut()
            .rev()
            .find(|p| p.placement().twin_of == Some(parent_idx))
    }

    // ---- figure-level settings ---------------------------------------------

    pub fn suptitle(&mut self, title: &str, fontsize: Option<f64>) -> &mut Self {
        self.suptitle = Some(Title::new(title, fontsize));
        self
    }

    pub fn tight_layout(&mut self) -> &mut Self {
        self.margin = Some(Margin {
            l: 60.0,
            r: 40.0,
            t: 60.0,
            b: 60.0,
        });
        self
    }

    /// Named template, e.g. `plotly_white`, forwarded to the HTML renderer.
    pub fn set_template(&mut self, template: &str) -> &mut Self {
        self.template = Some(template.to_string());
        self
    }

    /// Size in pixels.
    pub fn set_size(&mut self, width: f64, height: f64) -> &mut Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Raw layout attributes, merged over everything else on export.
    pub fn update_layout(&mut self, attrs: Map<String, Value>) -> &mut Self {
        merge_json(&mut self.passthrough, Value::Object(attrs));
        self
    }

    /// Gradient used when a panel has more than four auto-colored series.
    /// `None` falls back to cycling the default palette.
    pub fn set_gradient(&mut self, gradient: Option<Box<dyn Gradient>>) -> &mut Self {
        self.gradient = gradient;
        for panel in &mut self.panels {
            panel.invalidate();
        }
        self
    }

    /// Legend settings of the current panel.
    pub fn legend(&mut self, config: LegendConfig) -> &mut Self {
        self.gca().legend(config);
        self
    }

    // ---- finalize & export -------------------------------------------------

    /// Resolve auto colors and place the per-panel legends. Safe to repeat.
    pub fn finalize(&mut self) {
        let gradient = self.gradient.as_deref();
        for panel in &mut self.panels {
            panel.finalize(gradient);
        }
        self.legend_annotations = if self.is_grid() {
            self.panel_legends()
        } else {
            Vec::new()
        };
    }

    fn panel_legends(&self) -> Vec<Annotation> {
        let cells = self.nrows * self.ncols;
        (0..cells)
            .filter_map(|idx| {
                let panel = &self.panels[idx];
                let config = panel.legend_config();
                if !config.visible {
                    return None;
                }
                let mut entries = panel.legend_entries();
                for twin in self.twins_of(idx) {
                    entries.extend(twin.legend_entries());
                }
                if entries.is_empty() {
                    return None;
                }
                Some(config.to_panel_annotation(panel.x_domain(), panel.y_domain(), &entries))
            })
            .collect()
    }

    fn twins_of(&self, idx: usize) -> impl Iterator<Item = &Axes> {
        self.panels
            .iter()
            .filter(move |p| p.placement().twin_of == Some(idx))
    }

    /// Title of a cell, falling back to its secondary-y panels.
    fn cell_title(&self, idx: usize) -> Option<&Title> {
        self.panels[idx]
            .title_layout()
            .or_else(|| self.twins_of(idx).find_map(|t| t.title_layout()))
    }

    /// Finalize and assemble the scene graph.
    pub fn to_scene(&mut self) -> Result<Scene> {
        self.finalize();

        let mut layout = Layout {
            width: self.width,
            height: self.height,
            margin: self.margin,
            template: self.template.clone(),
            plot_bgcolor: Some(Color::new("white")),
            paper_bgcolor: Some(Color::new("white")),
            ..Default::default()
        };
        layout.title = self.suptitle.clone().or_else(|| {
            (!self.is_grid())
                .then(|| self.cell_title(0).cloned())
                .flatten()
        });

        let mut data = Vec::new();
        let mut pending_twin_x: Vec<(String, AxisLayout)> = Vec::new();
        for panel in &self.panels {
            data.extend(panel.traces().iter().cloned());
            layout.shapes.extend(panel.shapes().iter().cloned());
            layout.annotations.extend(panel.annotations().iter().cloned());

            let place = panel.placement();
            match place.twin_of {
                None => {
                    let mut x = base_axis();
                    let mut y = base_axis();
                    if self.is_grid() {
                        x.domain = Some(place.x_domain);
                        x.anchor = Some(panel.yref());
                        y.domain = Some(place.y_domain);
                        y.anchor = Some(panel.xref());
                        if self.sharex && place.x_number > 1 {
                            x.matches = Some("x".into());
                        }
                        if self.sharey && place.y_number > 1 {
                            y.matches = Some("y".into());
                        }
                    }
                    overlay_axis(&mut x, panel.x_layout())?;
                    overlay_axis(&mut y, panel.y_layout())?;
                    layout.axes.insert(axis_key('x', place.x_number), x);
                    layout.axes.insert(axis_key('y', place.y_number), y);
                }
                Some(parent_idx) => {
                    let parent = &self.panels[parent_idx];
                    let mut y = AxisLayout {
                        mirror: Some(false),
                        showgrid: Some(false),
                        overlaying: Some(parent.yref()),
                        side: Some("right".into()),
                        anchor: Some(parent.xref()),
                        ..base_axis()
                    };
                    overlay_axis(&mut y, panel.y_layout())?;
                    layout.axes.insert(axis_key('y', place.y_number), y);
                    pending_twin_x.push((axis_key('x', place.x_number), panel.x_layout().clone()));
                }
            }
        }
        for (key, x) in pending_twin_x {
            overlay_axis(layout.axis_mut(&key), &x)?;
        }
        layout.axes.values_mut().for_each(exponent_range);

        if self.is_grid() {
            layout.showlegend = Some(false);
            for idx in 0..self.nrows * self.ncols {
                if let Some(title) = self.cell_title(idx) {
                    let panel = &self.panels[idx];
                    let [x0, x1] = panel.x_domain();
                    layout.annotations.push(Annotation {
                        text: title.text.clone(),
                        x: (x0 + x1) / 2.0,
                        y: panel.y_domain()[1],
                        xanchor: Some("center".into()),
                        yanchor: Some("bottom".into()),
                        font: Some(
                            title
                                .font
                                .clone()
                                .unwrap_or_else(|| Font::sized(SUBPLOT_TITLE_SIZE)),
                        ),
                        ..Default::default()
                    });
                }
            }
            layout.annotations.extend(self.legend_annotations.iter().cloned());
        } else {
            let config = self.panels[0].legend_config();
            layout.showlegend = Some(config.visible);
            layout.legend = Some(config.to_layout());
        }

        if self.passthrough.as_object().is_some_and(|m| !m.is_empty()) {
            let mut map = Value::Object(layout.into());
            merge_json(&mut map, self.passthrough.clone());
            layout = serde_json::from_value(map)?;
        }

        Ok(Scene { data, layout })
    }

    pub fn to_json(&mut self) -> Result<String> {
        Ok(self.to_scene()?.to_json_pretty()?)
    }

    /// Standalone HTML document driven by plotly.js.
    pub fn to_html(&mut self) -> Result<String> {
        export::to_html(&self.to_scene()?)
    }

    /// Write the figure; the file suffix selects the format.
    pub fn savefig(&mut self, path: impl AsRef<Path>, opts: ExportOptions) -> Result<()> {
        let path = path.as_ref();
        let scene = self.to_scene()?;
        export::save(&scene, path, opts)?;
        info!("saved figure to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LineOptions;

    #[test]
    fn domains_follow_plotly_grid() {
        let d = grid_domains(2, 2, 0.1, 0.15);
        assert_eq!(d.len(), 4);
        let ([x0, x1], [y0, y1]) = d[0];
        assert!((x0 - 0.0).abs() < 1e-12 && (x1 - 0.45).abs() < 1e-12);
        assert!((y0 - 0.575).abs() < 1e-12 && (y1 - 1.0).abs() < 1e-12);
        let ([x0, _], [_, y1]) = d[3];
        assert!((x0 - 0.55).abs() < 1e-12);
        assert!((y1 - 0.425).abs() < 1e-12);
    }

    #[test]
    fn single_domain_is_full_canvas() {
        assert_eq!(grid_domains(1, 1, 0.2, 0.3), vec![([0.0, 1.0], [0.0, 1.0])]);
    }

    #[test]
    fn out_of_grid_cell_is_an_error() {
        let mut fig = Figure::subplots(2, 2);
        assert!(matches!(
            fig.ax(2, 0),
            Err(PlotError::NoSuchPanel { row: 2, col: 0, .. })
        ));
    }

    #[test]
    fn merge_json_is_recursive() {
        let mut a = serde_json::json!({"xaxis": {"type": "log", "range": [0, 1]}});
        merge_json(&mut a, serde_json::json!({"xaxis": {"range": [1, 2]}, "hovermode": "x"}));
        assert_eq!(a["xaxis"]["type"], "log");
        assert_eq!(a["xaxis"]["range"], serde_json::json!([1, 2]));
        assert_eq!(a["hovermode"], "x");
    }

    #[test]
    fn single_panel_title_becomes_figure_title() {
        let mut fig = Figure::default();
        fig.gca().title("Hello", Some(18.0));
        let scene = fig.to_scene().unwrap();
        assert_eq!(scene.layout.title.unwrap().text, "Hello");
    }

    #[test]
    fn grid_titles_are_annotations() {
        let mut fig = Figure::new(FigureOptions::grid(1, 2).subplot_titles(["a", "b"]));
        fig.ax(0, 1).unwrap().title("B", None);
        let scene = fig.to_scene().unwrap();
        let texts: Vec<_> = scene.layout.annotations.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, ["a", "B"]);
    }

    #[test]
    fn log_limits_become_exponents() {
        let mut fig = Figure::default();
        fig.gca().xscale("log").xlim(1.0, 1000.0).yscale("log").ylim(0.0, 10.0);
        let scene = fig.to_scene().unwrap();
        assert_eq!(scene.layout.axes["xaxis"].range, Some([0.0, 3.0]));
        assert_eq!(scene.layout.axes["yaxis"].range, None);
    }

    #[test]
    fn update_layout_is_applied_last() {
        let mut fig = Figure::default();
        fig.gca().plot([vec![1.0]], LineOptions::default()).unwrap();
        let mut attrs = Map::new();
        attrs.insert("plot_bgcolor".into(), "black".into());
        attrs.insert("hovermode".into(), "closest".into());
        fig.update_layout(attrs);
        let scene = fig.to_scene().unwrap();
        assert_eq!(scene.layout.plot_bgcolor.unwrap().as_str(), "black");
        assert_eq!(scene.layout.extra["hovermode"], "closest");
    }
}
