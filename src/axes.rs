//! One plotting panel: the per-panel plotting and configuration calls.
//!
//! A panel owns its traces, its color cycle, the ids of the series it colored
//! automatically, and its axis settings. Nothing is forwarded to the figure
//! until [`crate::Figure::to_scene`] assembles the panels.

use log::debug;
use serde_json::Value;

use crate::error::{PlotError, Result};
use crate::legend::LegendConfig;
use crate::models::{
    Annotation, AxisLayout, AxisType, Bins, Contours, ErrorBars, Font, LineStyle, MarkerColor,
    MarkerStyle, Mode, Orientation, Shape, ShapeKind, Title, Trace, TraceKind,
};
use crate::options::{
    BarOptions, Baseline, ContourOptions, ErrorBarOptions, ErrorSpec, FillOptions, HeatmapOptions,
    HistBins, HistOptions, Levels, LineOptions, PieOptions, PlotArg, RefLineOptions,
    ScatterOptions, SpanOptions, StemOptions, TextOptions, TickOptions,
};
use crate::palette::{ColorCycle, Gradient, auto_color_scheme};
use crate::style::{Color, LineDash, StyleSpec, resolve_marker_name};

/// Axis selector for [`Axes::grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Which {
    Both,
    X,
    Y,
}

impl Which {
    fn has_x(self) -> bool {
        matches!(self, Which::Both | Which::X)
    }

    fn has_y(self) -> bool {
        matches!(self, Which::Both | Which::Y)
    }
}

/// Aspect ratio control for [`Axes::set_aspect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aspect {
    Auto,
    /// One x unit spans as many pixels as one y unit.
    Equal,
}

/// Scene-graph reference for axis number `n` (`x`, `x2`, …).
pub(crate) fn axis_ref(letter: char, n: usize) -> String {
    if n <= 1 {
        letter.to_string()
    } else {
        format!("{letter}{n}")
    }
}

/// Layout key for axis number `n` (`xaxis`, `xaxis2`, …).
pub(crate) fn axis_key(letter: char, n: usize) -> String {
    if n <= 1 {
        format!("{letter}axis")
    } else {
        format!("{letter}axis{n}")
    }
}

/// Where a panel sits in its figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Placement {
    pub row: usize,
    pub col: usize,
    pub x_number: usize,
    pub y_number: usize,
    pub x_domain: [f64; 2],
    pub y_domain: [f64; 2],
    /// Position of the parent panel for a secondary-y panel.
    pub twin_of: Option<usize>,
}

/// A single subplot.
#[derive(Debug, Clone)]
pub struct Axes {
    place: Placement,
    cycle: ColorCycle,
    traces: Vec<Trace>,
    next_series: usize,
    auto_series: Vec<usize>,
    xaxis: AxisLayout,
    yaxis: AxisLayout,
    title: Option<Title>,
    legend: LegendConfig,
    shapes: Vec<Shape>,
    annotations: Vec<Annotation>,
    finalized: bool,
}

impl Axes {
    pub(crate) fn new(place: Placement) -> Self {
        Axes {
            place,
            cycle: ColorCycle::default(),
            traces: Vec::new(),
            next_series: 0,
            auto_series: Vec::new(),
            xaxis: AxisLayout::default(),
            yaxis: AxisLayout::default(),
            title: None,
            legend: LegendConfig::default(),
            shapes: Vec::new(),
            annotations: Vec::new(),
            finalized: false,
        }
    }

    // ---- accessors ---------------------------------------------------------

    /// Zero-based `(row, col)` of the grid cell.
    pub fn position(&self) -> (usize, usize) {
        (self.place.row, self.place.col)
    }

    pub fn is_twin(&self) -> bool {
        self.place.twin_of.is_some()
    }

    pub(crate) fn placement(&self) -> &Placement {
        &self.place
    }

    pub fn xref(&self) -> String {
        axis_ref('x', self.place.x_number)
    }

    pub fn yref(&self) -> String {
        axis_ref('y', self.place.y_number)
    }

    pub fn x_domain(&self) -> [f64; 2] {
        self.place.x_domain
    }

    pub fn y_domain(&self) -> [f64; 2] {
        self.place.y_domain
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Series that received their color from the cycle, in registration order.
    pub fn auto_series(&self) -> &[usize] {
        &self.auto_series
    }

    pub fn series_count(&self) -> usize {
        self.next_series
    }

    pub fn legend_config(&self) -> &LegendConfig {
        &self.legend
    }

    pub fn title_text(&self) -> Option<&str> {
        self.title.as_ref().map(|t| t.text.as_str())
    }

    pub(crate) fn title_layout(&self) -> Option<&Title> {
        self.title.as_ref()
    }

    pub(crate) fn x_layout(&self) -> &AxisLayout {
        &self.xaxis
    }

    pub(crate) fn y_layout(&self) -> &AxisLayout {
        &self.yaxis
    }

    pub(crate) fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub(crate) fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Force the next finalize to re-run.
    pub(crate) fn invalidate(&mut self) {
        self.finalized = false;
    }

    // ---- series bookkeeping ------------------------------------------------

    fn begin_series(&mut self) -> usize {
        let id = self.next_series;
        self.next_series += 1;
        self.finalized = false;
        id
    }

    /// Explicit color, or the next cycle color with the series recorded as auto-colored.
    fn series_color(&mut self, series: usize, explicit: Option<Color>) -> Color {
        match explicit {
            Some(color) => color,
            None => {
                self.auto_series.push(series);
                self.cycle.next_color()
            }
        }
    }

    fn push_trace(&mut self, series: usize, mut trace: Trace) {
        trace.series = series;
        if trace.is_cartesian() {
            trace.xaxis = Some(self.xref());
            trace.yaxis = Some(self.yref());
        }
        self.traces.push(trace);
    }

    fn label_trace(trace: &mut Trace, label: Option<String>) {
        trace.showlegend = Some(label.is_some());
        trace.name = label;
    }

    // ---- plotting ----------------------------------------------------------

    /// Line plot. `args` is `[y]`, `[x, y]` or `[x, y, fmt]`.
    ///
    /// Color precedence is option, then format string, then the cycle.
    pub fn plot<A: Into<PlotArg>>(
        &mut self,
        args: impl IntoIterator<Item = A>,
        opts: LineOptions,
    ) -> Result<&mut Self> {
        let mut data: Vec<Vec<f64>> = Vec::new();
        let mut fmt = opts.fmt.clone();
        for arg in args {
            match arg.into() {
                PlotArg::Values(v) => data.push(v),
                PlotArg::Format(f) => fmt = Some(f),
            }
        }
        let (x, y) = match data.len() {
            0 => {
                return Err(PlotError::InvalidArguments(
                    "plot() requires at least one data array".into(),
                ));
            }
            1 => {
                let y = data.remove(0);
                ((0..y.len()).map(|i| i as f64).collect(), y)
            }
            _ => {
                let x = data.remove(0);
                (x, data.remove(0))
            }
        };

        let parsed = fmt.as_deref().map(StyleSpec::parse).unwrap_or_default();
        let series = self.begin_series();
        let explicit = opts.color.clone().or(parsed.color);
        let color = self.series_color(series, explicit);
        let symbol = opts
            .marker
            .as_deref()
            .map(resolve_marker_name)
            .or_else(|| parsed.marker.map(|m| m.as_str().to_string()));
        let dash = opts.dash().or(parsed.dash).unwrap_or(LineDash::Solid);

        let mut trace = Trace::new(TraceKind::Scatter);
        trace.mode = Some(if symbol.is_some() {
            Mode::LinesMarkers
        } else {
            Mode::Lines
        });
        trace.x = Some(x);
        trace.y = Some(y);
        trace.line = Some(LineStyle {
            color: Some(color.clone()),
            width: Some(opts.linewidth.unwrap_or(2.0)),
            dash: Some(dash),
        });
        trace.marker = Some(MarkerStyle {
            color: Some(MarkerColor::Single(color)),
            size: Some(opts.markersize.unwrap_or(6.0)),
            symbol,
            ..Default::default()
        });
        trace.opacity = opts.alpha;
        trace.extra = opts.extra;
        Self::label_trace(&mut trace, opts.label);
        self.push_trace(series, trace);
        Ok(self)
    }

    pub fn scatter(&mut self, x: &[f64], y: &[f64], opts: ScatterOptions) -> &mut Self {
        let series = self.begin_series();
        let color = match opts.values {
            Some(values) => MarkerColor::Values(values),
            None => MarkerColor::Single(self.series_color(series, opts.color)),
        };
        let per_point = matches!(color, MarkerColor::Values(_));

        let mut trace = Trace::new(TraceKind::Scatter);
        trace.mode = Some(Mode::Markers);
        trace.x = Some(x.to_vec());
        trace.y = Some(y.to_vec());
        trace.marker = Some(MarkerStyle {
            color: Some(color),
            size: Some(opts.size.unwrap_or(8.0)),
            symbol: Some(
                opts.marker
                    .as_deref()
                    .map(resolve_marker_name)
                    .unwrap_or_else(|| "circle".into()),
            ),
            opacity: opts.alpha,
            line: opts.edgecolors.map(|c| LineStyle {
                color: Some(c),
                width: Some(opts.linewidths.unwrap_or(1.0)),
                dash: None,
            }),
            colorscale: if per_point { opts.cmap } else { None },
            showscale: per_point.then_some(opts.colorbar),
            ..Default::default()
        });
        trace.extra = opts.extra;
        Self::label_trace(&mut trace, opts.label);
        self.push_trace(series, trace);
        self
    }

    fn bar_series(
        &mut self,
        positions: &[f64],
        lengths: &[f64],
        opts: BarOptions,
        orientation: Orientation,
    ) -> &mut Self {
        let series = self.begin_series();
        let color = self.series_color(series, opts.color);
        let mut trace = Trace::new(TraceKind::Bar);
        match orientation {
            Orientation::Vertical => {
                trace.x = Some(positions.to_vec());
                trace.y = Some(lengths.to_vec());
            }
            Orientation::Horizontal => {
                trace.y = Some(positions.to_vec());
                trace.x = Some(lengths.to_vec());
                trace.orientation = Some(Orientation::Horizontal);
            }
        }
        trace.width = opts.width;
        trace.base = opts.bottom;
        trace.marker = Some(MarkerStyle {
            color: Some(MarkerColor::Single(color)),
            opacity: opts.alpha,
            line: opts.edgecolor.map(|c| LineStyle {
                color: Some(c),
                width: Some(1.0),
                dash: None,
            }),
            ..Default::default()
        });
        trace.extra = opts.extra;
        Self::label_trace(&mut trace, opts.label);
        self.push_trace(series, trace);
        self
    }

    pub fn bar(&mut self, x: &[f64], heights: &[f64], opts: BarOptions) -> &mut Self {
        self.bar_series(x, heights, opts, Orientation::Vertical)
    }

    /// Horizontal bars; `opts.width` is the bar thickness, `opts.bottom` the left edge.
    pub fn barh(&mut self, y: &[f64], widths: &[f64], opts: BarOptions) -> &mut Self {
        self.bar_series(y, widths, opts, Orientation::Horizontal)
    }

    pub fn hist(&mut self, values: &[f64], opts: HistOptions) -> &mut Self {
        let series = self.begin_series();
        let color = self.series_color(series, opts.color);
        let mut trace = Trace::new(TraceKind::Histogram);
        trace.x = Some(values.to_vec());
        trace.marker = Some(MarkerStyle {
            color: Some(MarkerColor::Single(color)),
            opacity: opts.alpha,
            line: opts.edgecolor.map(|c| LineStyle {
                color: Some(c),
                width: Some(1.0),
                dash: None,
            }),
            ..Default::default()
        });
        match opts.bins {
            Some(HistBins::Count(n)) => trace.nbinsx = Some(n),
            Some(HistBins::Edges(edges)) if edges.len() >= 2 => {
                trace.xbins = Some(Bins {
                    start: edges.first().copied(),
                    end: edges.last().copied(),
                    size: Some(edges[1] - edges[0]),
                });
            }
            _ => {}
        }
        if let Some((lo, hi)) = opts.range {
            let bins = trace.xbins.get_or_insert_with(Bins::default);
            bins.start = Some(lo);
            bins.end = Some(hi);
        }
        if opts.density {
            trace.histnorm = Some("probability density".into());
        }
        trace.extra = opts.extra;
        Self::label_trace(&mut trace, opts.label);
        self.push_trace(series, trace);
        self
    }

    /// Area between `y1` and `y2`. Emits an invisible upper bound followed by
    /// the filled lower bound.
    pub fn fill_between(
        &mut self,
        x: &[f64],
        y1: &[f64],
        y2: impl Into<Baseline>,
        opts: FillOptions,
    ) -> &mut Self {
        let lower = match y2.into() {
            Baseline::Constant(v) => vec![v; y1.len()],
            Baseline::Values(v) => v,
        };
        let series = self.begin_series();
        let color = self.series_color(series, opts.color);
        let edge = || {
            Some(LineStyle {
                color: Some(color.clone()),
                width: Some(0.0),
                dash: None,
            })
        };

        let mut upper = Trace::new(TraceKind::Scatter);
        upper.mode = Some(Mode::Lines);
        upper.x = Some(x.to_vec());
        upper.y = Some(y1.to_vec());
        upper.line = edge();
        upper.showlegend = Some(false);

        let mut filled = Trace::new(TraceKind::Scatter);
        filled.mode = Some(Mode::Lines);
        filled.x = Some(x.to_vec());
        filled.y = Some(lower);
        filled.line = edge();
        filled.fill = Some("tonexty".into());
        filled.fillcolor = Some(color.with_alpha(opts.alpha));
        filled.extra = opts.extra;
        Self::label_trace(&mut filled, opts.label);

        self.push_trace(series, upper);
        self.push_trace(series, filled);
        self
    }

    pub fn errorbar(&mut self, x: &[f64], y: &[f64], opts: ErrorBarOptions) -> &mut Self {
        let series = self.begin_series();
        let color = self.series_color(series, opts.color);
        let to_bars = |spec: ErrorSpec| match spec {
            ErrorSpec::Symmetric(v) => ErrorBars::symmetric(v),
            ErrorSpec::Asymmetric { minus, plus } => ErrorBars::asymmetric(minus, plus),
        };

        let mut trace = Trace::new(TraceKind::Scatter);
        trace.mode = Some(if opts.marker.is_some() {
            Mode::LinesMarkers
        } else {
            Mode::Lines
        });
        trace.x = Some(x.to_vec());
        trace.y = Some(y.to_vec());
        trace.line = Some(LineStyle {
            color: Some(color.clone()),
            width: Some(opts.linewidth.unwrap_or(2.0)),
            dash: None,
        });
        trace.marker = Some(MarkerStyle {
            color: Some(MarkerColor::Single(color)),
            size: Some(opts.markersize.unwrap_or(6.0)),
            symbol: Some(
                opts.marker
                    .as_deref()
                    .map(resolve_marker_name)
                    .unwrap_or_else(|| "circle".into()),
            ),
            ..Default::default()
        });
        trace.error_y = opts.yerr.map(to_bars);
        trace.error_x = opts.xerr.map(to_bars);
        trace.opacity = opts.alpha;
        trace.extra = opts.extra;
        Self::label_trace(&mut trace, opts.label);
        self.push_trace(series, trace);
        self
    }

    /// One vertical segment per point plus a marker trace carrying the label.
    pub fn stem(&mut self, x: &[f64], y: &[f64], opts: StemOptions) -> &mut Self {
        let series = self.begin_series();
        let color = self.series_color(series, opts.color);
        for (&xi, &yi) in x.iter().zip(y) {
            let mut segment = Trace::new(TraceKind::Scatter);
            segment.mode = Some(Mode::Lines);
            segment.x = Some(vec![xi, xi]);
            segment.y = Some(vec![0.0, yi]);
            segment.line = Some(LineStyle {
                color: Some(color.clone()),
                width: Some(1.0),
                dash: None,
            });
            segment.showlegend = Some(false);
            self.push_trace(series, segment);
        }
        let mut heads = Trace::new(TraceKind::Scatter);
        heads.mode = Some(Mode::Markers);
        heads.x = Some(x.to_vec());
        heads.y = Some(y.to_vec());
        heads.marker = Some(MarkerStyle {
            color: Some(MarkerColor::Single(color)),
            size: Some(8.0),
            ..Default::default()
        });
        heads.extra = opts.extra;
        Self::label_trace(&mut heads, opts.label);
        self.push_trace(series, heads);
        self
    }

    /// Pie chart over this panel's domain. Slice colors never come from the cycle.
    pub fn pie(&mut self, sizes: &[f64], opts: PieOptions) -> &mut Self {
        let series = self.begin_series();
        let mut trace = Trace::new(TraceKind::Pie);
        trace.values = Some(sizes.to_vec());
        trace.labels = opts.labels;
        trace.marker = opts.colors.map(|colors| MarkerStyle {
            colors: Some(colors),
            ..Default::default()
        });
        trace.pull = opts.explode;
        trace.textinfo = opts.autopct.then(|| "percent".to_string());
        trace.rotation = opts.startangle;
        trace.extra = opts.extra;
        trace.extra.insert(
            "domain".into(),
            serde_json::json!({ "x": self.place.x_domain, "y": self.place.y_domain }),
        );
        self.push_trace(series, trace);
        self
    }

    pub fn heatmap(&mut self, z: &[Vec<f64>], opts: HeatmapOptions) -> &mut Self {
        let series = self.begin_series();
        let mut trace = Trace::new(TraceKind::Heatmap);
        trace.z = Some(z.to_vec());
        trace.x = opts.x;
        trace.y = opts.y;
        trace.colorscale = opts.cmap;
        trace.zmin = opts.vmin;
        trace.zmax = opts.vmax;
        trace.showscale = Some(opts.colorbar);
        trace.extra = opts.extra;
        self.push_trace(series, trace);
        self
    }

    /// Image display of a 2-D array, same as [`Axes::heatmap`].
    pub fn imshow(&mut self, z: &[Vec<f64>], opts: HeatmapOptions) -> &mut Self {
        self.heatmap(z, opts)
    }

    /// Pseudocolor grid with explicit cell coordinates.
    pub fn pcolormesh(
        &mut self,
        x: &[f64],
        y: &[f64],
        z: &[Vec<f64>],
        opts: HeatmapOptions,
    ) -> &mut Self {
        let opts = HeatmapOptions {
            x: Some(x.to_vec()),
            y: Some(y.to_vec()),
            ..opts
        }
        .extra("hovertemplate", "x: %{x}<br>y: %{y}<br>z: %{z}<extra></extra>");
        self.heatmap(z, opts)
    }

    fn contour_series(
        &mut self,
        x: &[f64],
        y: &[f64],
        z: &[Vec<f64>],
        opts: ContourOptions,
        filled: bool,
    ) -> &mut Self {
        let series = self.begin_series();
        let mut contours = match opts.levels {
            Some(Levels::Count(n)) if n > 0 => {
                let (lo, hi) = z
                    .iter()
                    .flatten()
                    .filter(|v| v.is_finite())
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                if lo.is_finite() {
                    Contours {
                        start: Some(lo),
                        end: Some(hi),
                        size: Some((hi - lo) / n as f64),
                        coloring: None,
                    }
                } else {
                    Contours::default()
                }
            }
            Some(Levels::Values(levels)) if !levels.is_empty() => Contours {
                start: levels.first().copied(),
                end: levels.last().copied(),
                size: (levels.len() >= 2).then(|| levels[1] - levels[0]),
                coloring: None,
            },
            _ => Contours::default(),
        };
        contours.coloring = Some(if filled { "heatmap" } else { "lines" }.into());

        let mut trace = Trace::new(TraceKind::Contour);
        trace.x = Some(x.to_vec());
        trace.y = Some(y.to_vec());
        trace.z = Some(z.to_vec());
        trace.contours = Some(contours);
        trace.colorscale = opts.cmap;
        trace.showscale = Some(opts.colorbar);
        trace.extra = opts.extra;
        self.push_trace(series, trace);
        self
    }

    pub fn contour(
        &mut self,
        x: &[f64],
        y: &[f64],
        z: &[Vec<f64>],
        opts: ContourOptions,
    ) -> &mut Self {
        self.contour_series(x, y, z, opts, false)
    }

    pub fn contourf(
        &mut self,
        x: &[f64],
        y: &[f64],
        z: &[Vec<f64>],
        opts: ContourOptions,
    ) -> &mut Self {
        self.contour_series(x, y, z, opts, true)
    }

    // ---- reference lines, spans, text --------------------------------------

    fn domain_ref(axis: &str) -> String {
        format!("{axis} domain")
    }

    pub fn axhline(&mut self, y: f64, opts: RefLineOptions) -> &mut Self {
        let xref = Self::domain_ref(&self.xref());
        let yref = self.yref();
        self.shapes.push(Shape {
            kind: ShapeKind::Line,
            xref: xref.clone(),
            yref: yref.clone(),
            x0: 0.0,
            x1: 1.0,
            y0: y,
            y1: y,
            line: Some(LineStyle {
                color: Some(opts.color),
                width: Some(opts.linewidth),
                dash: Some(opts.linestyle),
            }),
            fillcolor: None,
            opacity: None,
            layer: None,
        });
        if let Some(label) = opts.label {
            self.annotations.push(Annotation {
                text: label,
                x: 1.0,
                y,
                xref,
                yref,
                xanchor: Some("right".into()),
                yanchor: Some("bottom".into()),
                ..Default::default()
            });
        }
        self
    }

    pub fn axvline(&mut self, x: f64, opts: RefLineOptions) -> &mut Self {
        let xref = self.xref();
        let yref = Self::domain_ref(&self.yref());
        self.shapes.push(Shape {
            kind: ShapeKind::Line,
            xref: xref.clone(),
            yref: yref.clone(),
            x0: x,
            x1: x,
            y0: 0.0,
            y1: 1.0,
            line: Some(LineStyle {
                color: Some(opts.color),
                width: Some(opts.linewidth),
                dash: Some(opts.linestyle),
            }),
            fillcolor: None,
            opacity: None,
            layer: None,
        });
        if let Some(label) = opts.label {
            self.annotations.push(Annotation {
                text: label,
                x,
                y: 1.0,
                xref,
                yref,
                xanchor: Some("left".into()),
                yanchor: Some("top".into()),
                ..Default::default()
            });
        }
        self
    }

    fn span(&mut self, x: (String, f64, f64), y: (String, f64, f64), opts: SpanOptions) {
        self.shapes.push(Shape {
            kind: ShapeKind::Rect,
            xref: x.0,
            yref: y.0,
            x0: x.1,
            x1: x.2,
            y0: y.1,
            y1: y.2,
            line: Some(LineStyle {
                width: Some(0.0),
                ..Default::default()
            }),
            fillcolor: Some(opts.color),
            opacity: Some(opts.alpha),
            layer: Some("below".into()),
        });
    }

    pub fn axhspan(&mut self, ymin: f64, ymax: f64, opts: SpanOptions) -> &mut Self {
        let xref = Self::domain_ref(&self.xref());
        let yref = self.yref();
        self.span((xref, 0.0, 1.0), (yref, ymin, ymax), opts);
        self
    }

    pub fn axvspan(&mut self, xmin: f64, xmax: f64, opts: SpanOptions) -> &mut Self {
        let xref = self.xref();
        let yref = Self::domain_ref(&self.yref());
        self.span((xref, xmin, xmax), (yref, 0.0, 1.0), opts);
        self
    }

    fn text_anchors(opts: &TextOptions) -> (String, String) {
        let xanchor = match opts.ha.as_str() {
            "center" | "right" => opts.ha.clone(),
            _ => "left".into(),
        };
        let yanchor = match opts.va.as_str() {
            "top" => "top".into(),
            "center" => "middle".into(),
            _ => "bottom".into(),
        };
        (xanchor, yanchor)
    }

    /// Text at data coordinates.
    pub fn text(&mut self, x: f64, y: f64, text: &str, opts: TextOptions) -> &mut Self {
        let (xanchor, yanchor) = Self::text_anchors(&opts);
        let (xref, yref) = (self.xref(), self.yref());
        self.annotations.push(Annotation {
            text: text.to_string(),
            x,
            y,
            xref,
            yref,
            xanchor: Some(xanchor),
            yanchor: Some(yanchor),
            font: Some(Font {
                size: Some(opts.fontsize),
                color: Some(opts.color),
                family: None,
            }),
            ..Default::default()
        });
        self
    }

    /// Label the point `xy`, with an arrow from `xytext` when given.
    pub fn annotate(
        &mut self,
        text: &str,
        xy: (f64, f64),
        xytext: Option<(f64, f64)>,
        opts: TextOptions,
    ) -> &mut Self {
        let tail = xytext.unwrap_or(xy);
        let (xref, yref) = (self.xref(), self.yref());
        self.annotations.push(Annotation {
            text: text.to_string(),
            x: xy.0,
            y: xy.1,
            xref: xref.clone(),
            yref: yref.clone(),
            showarrow: xytext.is_some(),
            ax: Some(tail.0),
            ay: Some(tail.1),
            axref: Some(xref),
            ayref: Some(yref),
            arrowhead: Some(2),
            font: Some(Font {
                size: Some(opts.fontsize),
                color: Some(opts.color),
                family: None,
            }),
            ..Default::default()
        });
        self
    }

    // ---- configuration -----------------------------------------------------

    pub fn xlabel(&mut self, label: &str, fontsize: Option<f64>) -> &mut Self {
        self.xaxis.title = Some(Title::new(label, fontsize));
        self
    }

    pub fn ylabel(&mut self, label: &str, fontsize: Option<f64>) -> &mut Self {
        self.yaxis.title = Some(Title::new(label, fontsize));
        self
    }

    /// Panel title. A single-panel figure shows it as the figure title; in a
    /// grid it replaces the panel's subplot title.
    pub fn title(&mut self, label: &str, fontsize: Option<f64>) -> &mut Self {
        self.title = Some(Title::new(label, fontsize));
        self
    }

    pub fn xlim(&mut self, lo: f64, hi: f64) -> &mut Self {
        self.xaxis.range = Some([lo, hi]);
        self
    }

    pub fn ylim(&mut self, lo: f64, hi: f64) -> &mut Self {
        self.yaxis.range = Some([lo, hi]);
        self
    }

    fn scale_type(scale: &str) -> AxisType {
        if scale.eq_ignore_ascii_case("log") {
            AxisType::Log
        } else {
            AxisType::Linear
        }
    }

    /// `"log"` or anything else for linear.
    pub fn xscale(&mut self, scale: &str) -> &mut Self {
        self.xaxis.scale = Some(Self::scale_type(scale));
        self
    }

    pub fn yscale(&mut self, scale: &str) -> &mut Self {
        self.yaxis.scale = Some(Self::scale_type(scale));
        self
    }

    fn apply_ticks(axis: &mut AxisLayout, opts: TickOptions) {
        if let Some(ticks) = opts.ticks {
            axis.tickvals = Some(ticks);
        }
        if let Some(labels) = opts.labels {
            axis.ticktext = Some(labels);
        }
        if let Some(rotation) = opts.rotation {
            axis.tickangle = Some(-rotation);
        }
        if let Some(size) = opts.fontsize {
            axis.tickfont = Some(Font::sized(size));
        }
    }

    pub fn xticks(&mut self, opts: TickOptions) -> &mut Self {
        Self::apply_ticks(&mut self.xaxis, opts);
        self
    }

    pub fn yticks(&mut self, opts: TickOptions) -> &mut Self {
        Self::apply_ticks(&mut self.yaxis, opts);
        self
    }

    pub fn grid(&mut self, visible: bool, which: Which) -> &mut Self {
        if which.has_x() {
            self.xaxis.showgrid = Some(visible);
        }
        if which.has_y() {
            self.yaxis.showgrid = Some(visible);
        }
        self
    }

    pub fn legend(&mut self, config: LegendConfig) -> &mut Self {
        self.legend = config;
        self.finalized = false;
        self
    }

    pub fn invert_xaxis(&mut self) -> &mut Self {
        self.xaxis.autorange = Some("reversed".into());
        self
    }

    pub fn invert_yaxis(&mut self) -> &mut Self {
        self.yaxis.autorange = Some("reversed".into());
        self
    }

    pub fn set_aspect(&mut self, aspect: Aspect) -> &mut Self {
        match aspect {
            Aspect::Equal => {
                let xref = self.xref();
                self.yaxis.scaleanchor = Some(xref);
                self.yaxis.scaleratio = Some(1.0);
            }
            Aspect::Auto => {
                self.yaxis.scaleanchor = None;
                self.yaxis.scaleratio = None;
            }
        }
        self
    }

    /// Raw attribute on every trace plotted so far in this panel.
    pub fn update_traces(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        for trace in &mut self.traces {
            trace.extra.insert(key.to_string(), value.clone());
        }
        self
    }

    // ---- finalize ----------------------------------------------------------

    /// Re-color the auto-colored series. Runs once until the next plotting call.
    pub(crate) fn finalize(&mut self, gradient: Option<&dyn Gradient>) {
        if self.finalized {
            return;
        }
        let colors = auto_color_scheme(self.auto_series.len(), gradient);
        debug!(
            "panel {}: re-coloring {} auto-colored series",
            self.xref(),
            colors.len()
        );
        for (series, color) in self.auto_series.iter().zip(&colors) {
            for trace in self.traces.iter_mut().filter(|t| t.series == *series) {
                trace.recolor(color);
            }
        }
        self.finalized = true;
    }

    /// `(label, color)` of every labeled series, in plotting order.
    pub fn legend_entries(&self) -> Vec<(String, Color)> {
        self.traces
            .iter()
            .filter(|t| t.showlegend == Some(true))
            .filter_map(|t| {
                let label = t.name.clone()?;
                let color = t
                    .display_color()
                    .cloned()
                    .unwrap_or_else(|| Color::new("gray"));
                Some((label, color))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> Axes {
        Axes::new(Placement {
            row: 0,
            col: 0,
            x_number: 1,
            y_number: 1,
            x_domain: [0.0, 1.0],
            y_domain: [0.0, 1.0],
            twin_of: None,
        })
    }

    #[test]
    fn plot_without_data_is_an_error() {
        let mut ax = panel();
        let err = ax
            .plot(Vec::<PlotArg>::new(), LineOptions::default())
            .unwrap_err();
        assert!(matches!(err, PlotError::InvalidArguments(_)));
        let err = ax.plot(["r--"], LineOptions::default()).unwrap_err();
        assert!(matches!(err, PlotError::InvalidArguments(_)));
    }

    #[test]
    fn single_array_gets_index_x() {
        let mut ax = panel();
        ax.plot([vec![3.0, 4.0, 5.0]], LineOptions::default()).unwrap();
        assert_eq!(ax.traces()[0].x.as_deref(), Some(&[0.0, 1.0, 2.0][..]));
    }

    #[test]
    fn format_string_sets_style() {
        let mut ax = panel();
        ax.plot(
            [PlotArg::from(vec![0.0, 1.0]), vec![1.0, 2.0].into(), "go:".into()],
            LineOptions::default(),
        )
        .unwrap();
        let t = &ax.traces()[0];
        assert_eq!(t.mode, Some(Mode::LinesMarkers));
        let line = t.line.as_ref().unwrap();
        assert_eq!(line.color.as_ref().unwrap().as_str(), "green");
        assert_eq!(line.dash, Some(LineDash::Dot));
        assert_eq!(t.marker.as_ref().unwrap().symbol.as_deref(), Some("circle"));
        assert!(ax.auto_series().is_empty());
    }

    #[test]
    fn explicit_color_skips_cycle() {
        let mut ax = panel();
        ax.plot([vec![1.0]], LineOptions::default().color("red")).unwrap();
        ax.plot([vec![1.0]], LineOptions::default()).unwrap();
        let line = ax.traces()[1].line.as_ref().unwrap();
        assert_eq!(line.color.as_ref().unwrap().as_str(), "#1f77b4");
        assert_eq!(ax.auto_series(), &[1]);
    }

    #[test]
    fn fill_between_is_one_series() {
        let mut ax = panel();
        ax.fill_between(&[0.0, 1.0], &[1.0, 2.0], 0.0, FillOptions::default().label("band"));
        assert_eq!(ax.traces().len(), 2);
        assert_eq!(ax.series_count(), 1);
        assert_eq!(ax.traces()[1].fill.as_deref(), Some("tonexty"));
        assert_eq!(ax.traces()[1].y.as_deref(), Some(&[0.0, 0.0][..]));
        assert_eq!(
            ax.traces()[1].fillcolor.as_ref().unwrap().as_str(),
            "rgba(31,119,180,0.3)"
        );
    }

    #[test]
    fn finalize_recolors_whole_series() {
        let mut ax = panel();
        ax.stem(&[1.0, 2.0], &[3.0, 4.0], StemOptions::default());
        ax.plot([vec![1.0]], LineOptions::default()).unwrap();
        ax.finalize(None);
        assert!(ax.is_finalized());
        let colors: Vec<_> = ax
            .traces()
            .iter()
            .map(|t| t.display_color().unwrap().as_str().to_string())
            .collect();
        assert_eq!(colors, ["blue", "blue", "blue", "black"]);
    }

    #[test]
    fn plotting_after_finalize_reopens_panel() {
        let mut ax = panel();
        ax.plot([vec![1.0]], LineOptions::default()).unwrap();
        ax.finalize(None);
        ax.bar(&[1.0], &[2.0], BarOptions::default());
        assert!(!ax.is_finalized());
    }

    #[test]
    fn tick_rotation_is_negated() {
        let mut ax = panel();
        ax.xticks(TickOptions::default().rotation(45.0));
        assert_eq!(ax.x_layout().tickangle, Some(-45.0));
    }

    #[test]
    fn hist_range_overrides_bin_edges() {
        let mut ax = panel();
        ax.hist(
            &[1.0, 2.0],
            HistOptions::default()
                .bins(vec![0.0, 0.5, 3.0])
                .range((0.0, 2.0))
                .density(true),
        );
        let t = &ax.traces()[0];
        let bins = t.xbins.as_ref().unwrap();
        assert_eq!((bins.start, bins.end, bins.size), (Some(0.0), Some(2.0), Some(0.5)));
        assert_eq!(t.histnorm.as_deref(), Some("probability density"));
    }
}
