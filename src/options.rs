//! Typed options for figure construction, plotting calls, and export.
//!
//! Every plotting call takes one options struct. The recognized settings are
//! typed fields; anything else goes into the `extra` map and is copied onto
//! the emitted trace verbatim.

use serde_json::{Map, Value};

use crate::style::{Color, LineDash};

/// Generates `field(value)` setters for `Option` fields plus an `extra` setter.
macro_rules! setters {
    ($ty:ty { $($name:ident : $t:ty),* $(,)? }) => {
        impl $ty {
            $(
                pub fn $name(mut self, value: impl Into<$t>) -> Self {
                    self.$name = Some(value.into());
                    self
                }
            )*

            /// Opaque attribute forwarded to the emitted trace.
            pub fn extra(mut self, key: &str, value: impl Into<Value>) -> Self {
                self.extra.insert(key.to_string(), value.into());
                self
            }
        }
    };
}

/// Positional argument of [`crate::Axes::plot`]: a data array or a format string.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotArg {
    Values(Vec<f64>),
    Format(String),
}

impl From<Vec<f64>> for PlotArg {
    fn from(v: Vec<f64>) -> Self {
        PlotArg::Values(v)
    }
}

impl From<&Vec<f64>> for PlotArg {
    fn from(v: &Vec<f64>) -> Self {
        PlotArg::Values(v.clone())
    }
}

impl From<&[f64]> for PlotArg {
    fn from(v: &[f64]) -> Self {
        PlotArg::Values(v.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for PlotArg {
    fn from(v: [f64; N]) -> Self {
        PlotArg::Values(v.to_vec())
    }
}

impl From<&str> for PlotArg {
    fn from(s: &str) -> Self {
        PlotArg::Format(s.to_string())
    }
}

impl From<String> for PlotArg {
    fn from(s: String) -> Self {
        PlotArg::Format(s)
    }
}

/// Figure construction settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureOptions {
    pub nrows: usize,
    pub ncols: usize,
    /// `(width, height)` in inches; one inch is 100 pixels.
    pub figsize: Option<(f64, f64)>,
    pub subplot_titles: Vec<String>,
    pub sharex: bool,
    pub sharey: bool,
    /// Gap between columns as a fraction of the canvas; default `0.2 / ncols`.
    pub horizontal_spacing: Option<f64>,
    /// Gap between rows as a fraction of the canvas; default `0.3 / nrows`.
    pub vertical_spacing: Option<f64>,
}

impl Default for FigureOptions {
    fn default() -> Self {
        FigureOptions {
            nrows: 1,
            ncols: 1,
            figsize: None,
            subplot_titles: Vec::new(),
            sharex: false,
            sharey: false,
            horizontal_spacing: None,
            vertical_spacing: None,
        }
    }
}

impl FigureOptions {
    pub fn grid(nrows: usize, ncols: usize) -> Self {
        FigureOptions {
            nrows: nrows.max(1),
            ncols: ncols.max(1),
            ..Default::default()
        }
    }

    pub fn figsize(mut self, width_in: f64, height_in: f64) -> Self {
        self.figsize = Some((width_in, height_in));
        self
    }

    pub fn subplot_titles<S: Into<String>>(mut self, titles: impl IntoIterator<Item = S>) -> Self {
        self.subplot_titles = titles.into_iter().map(Into::into).collect();
        self
    }

    pub fn sharex(mut self, share: bool) -> Self {
        self.sharex = share;
        self
    }

    pub fn sharey(mut self, share: bool) -> Self {
        self.sharey = share;
        self
    }

    pub fn spacing(mut self, horizontal: f64, vertical: f64) -> Self {
        self.horizontal_spacing = Some(horizontal);
        self.vertical_spacing = Some(vertical);
        self
    }
}

/// Options of [`crate::Axes::plot`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineOptions {
    pub label: Option<String>,
    pub color: Option<Color>,
    pub linewidth: Option<f64>,
    pub linestyle: Option<String>,
    pub marker: Option<String>,
    pub markersize: Option<f64>,
    pub alpha: Option<f64>,
    /// Format string; positional format strings take precedence.
    pub fmt: Option<String>,
    pub extra: Map<String, Value>,
}

setters!(LineOptions {
    label: String,
    color: Color,
    linewidth: f64,
    linestyle: String,
    marker: String,
    markersize: f64,
    alpha: f64,
    fmt: String,
});

impl LineOptions {
    pub(crate) fn dash(&self) -> Option<LineDash> {
        self.linestyle.as_deref().and_then(LineDash::from_style)
    }
}

/// Options of [`crate::Axes::scatter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScatterOptions {
    pub size: Option<f64>,
    pub color: Option<Color>,
    /// One value per point, mapped through `cmap`.
    pub values: Option<Vec<f64>>,
    pub cmap: Option<String>,
    pub colorbar: bool,
    pub label: Option<String>,
    pub marker: Option<String>,
    pub alpha: Option<f64>,
    pub edgecolors: Option<Color>,
    pub linewidths: Option<f64>,
    pub extra: Map<String, Value>,
}

setters!(ScatterOptions {
    size: f64,
    color: Color,
    values: Vec<f64>,
    cmap: String,
    label: String,
    marker: String,
    alpha: f64,
    edgecolors: Color,
    linewidths: f64,
});

impl ScatterOptions {
    pub fn colorbar(mut self, show: bool) -> Self {
        self.colorbar = show;
        self
    }
}

/// Options of [`crate::Axes::bar`] and [`crate::Axes::barh`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarOptions {
    /// Bar thickness in data units.
    pub width: Option<f64>,
    /// Baseline the bars start from.
    pub bottom: Option<f64>,
    pub label: Option<String>,
    pub color: Option<Color>,
    pub edgecolor: Option<Color>,
    pub alpha: Option<f64>,
    pub extra: Map<String, Value>,
}

setters!(BarOptions {
    width: f64,
    bottom: f64,
    label: String,
    color: Color,
    edgecolor: Color,
    alpha: f64,
});

/// Histogram binning.
#[derive(Debug, Clone, PartialEq)]
pub enum HistBins {
    Count(usize),
    /// Uniform bin edges; only the first, second, and last edge are used.
    Edges(Vec<f64>),
}

impl From<usize> for HistBins {
    fn from(n: usize) -> Self {
        HistBins::Count(n)
    }
}

impl From<Vec<f64>> for HistBins {
    fn from(edges: Vec<f64>) -> Self {
        HistBins::Edges(edges)
    }
}

/// Options of [`crate::Axes::hist`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistOptions {
    pub bins: Option<HistBins>,
    pub range: Option<(f64, f64)>,
    pub density: bool,
    pub label: Option<String>,
    pub color: Option<Color>,
    pub alpha: Option<f64>,
    pub edgecolor: Option<Color>,
    pub extra: Map<String, Value>,
}

setters!(HistOptions {
    bins: HistBins,
    range: (f64, f64),
    label: String,
    color: Color,
    alpha: f64,
    edgecolor: Color,
});

impl HistOptions {
    pub fn density(mut self, density: bool) -> Self {
        self.density = density;
        self
    }
}

/// Options of [`crate::Axes::fill_between`].
#[derive(Debug, Clone, PartialEq)]
pub struct FillOptions {
    pub label: Option<String>,
    pub color: Option<Color>,
    pub alpha: f64,
    pub extra: Map<String, Value>,
}

impl Default for FillOptions {
    fn default() -> Self {
        FillOptions {
            label: None,
            color: None,
            alpha: 0.3,
            extra: Map::new(),
        }
    }
}

setters!(FillOptions {
    label: String,
    color: Color,
});

impl FillOptions {
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
}

/// Lower bound of [`crate::Axes::fill_between`].
#[derive(Debug, Clone, PartialEq)]
pub enum Baseline {
    Constant(f64),
    Values(Vec<f64>),
}

impl From<f64> for Baseline {
    fn from(v: f64) -> Self {
        Baseline::Constant(v)
    }
}

impl From<Vec<f64>> for Baseline {
    fn from(v: Vec<f64>) -> Self {
        Baseline::Values(v)
    }
}

impl From<&[f64]> for Baseline {
    fn from(v: &[f64]) -> Self {
        Baseline::Values(v.to_vec())
    }
}

/// Error bar extents.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSpec {
    Symmetric(Vec<f64>),
    Asymmetric { minus: Vec<f64>, plus: Vec<f64> },
}

impl From<Vec<f64>> for ErrorSpec {
    fn from(v: Vec<f64>) -> Self {
        ErrorSpec::Symmetric(v)
    }
}

impl From<(Vec<f64>, Vec<f64>)> for ErrorSpec {
    fn from((minus, plus): (Vec<f64>, Vec<f64>)) -> Self {
        ErrorSpec::Asymmetric { minus, plus }
    }
}

/// Options of [`crate::Axes::errorbar`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorBarOptions {
    pub yerr: Option<ErrorSpec>,
    pub xerr: Option<ErrorSpec>,
    pub label: Option<String>,
    pub color: Option<Color>,
    pub linewidth: Option<f64>,
    pub marker: Option<String>,
    pub markersize: Option<f64>,
    pub alpha: Option<f64>,
    pub extra: Map<String, Value>,
}

setters!(ErrorBarOptions {
    yerr: ErrorSpec,
    xerr: ErrorSpec,
    label: String,
    color: Color,
    linewidth: f64,
    marker: String,
    markersize: f64,
    alpha: f64,
});

/// Options of [`crate::Axes::stem`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StemOptions {
    pub label: Option<String>,
    pub color: Option<Color>,
    pub extra: Map<String, Value>,
}

setters!(StemOptions {
    label: String,
    color: Color,
});

/// Options of [`crate::Axes::pie`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PieOptions {
    pub labels: Option<Vec<String>>,
    pub colors: Option<Vec<Color>>,
    /// Show percentages on the wedges.
    pub autopct: bool,
    pub startangle: Option<f64>,
    pub explode: Option<Vec<f64>>,
    pub extra: Map<String, Value>,
}

setters!(PieOptions {
    labels: Vec<String>,
    colors: Vec<Color>,
    startangle: f64,
    explode: Vec<f64>,
});

impl PieOptions {
    pub fn autopct(mut self, show: bool) -> Self {
        self.autopct = show;
        self
    }
}

/// Options of [`crate::Axes::heatmap`], [`crate::Axes::imshow`] and
/// [`crate::Axes::pcolormesh`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapOptions {
    pub x: Option<Vec<f64>>,
    pub y: Option<Vec<f64>>,
    pub cmap: Option<String>,
    pub colorbar: bool,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    pub extra: Map<String, Value>,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        HeatmapOptions {
            x: None,
            y: None,
            cmap: None,
            colorbar: true,
            vmin: None,
            vmax: None,
            extra: Map::new(),
        }
    }
}

setters!(HeatmapOptions {
    x: Vec<f64>,
    y: Vec<f64>,
    cmap: String,
    vmin: f64,
    vmax: f64,
});

impl HeatmapOptions {
    pub fn colorbar(mut self, show: bool) -> Self {
        self.colorbar = show;
        self
    }
}

/// Contour levels: a count spread over the data range, or explicit values.
#[derive(Debug, Clone, PartialEq)]
pub enum Levels {
    Count(usize),
    Values(Vec<f64>),
}

impl From<usize> for Levels {
    fn from(n: usize) -> Self {
        Levels::Count(n)
    }
}

impl From<Vec<f64>> for Levels {
    fn from(v: Vec<f64>) -> Self {
        Levels::Values(v)
    }
}

/// Options of [`crate::Axes::contour`] and [`crate::Axes::contourf`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContourOptions {
    pub levels: Option<Levels>,
    pub cmap: Option<String>,
    pub colorbar: bool,
    pub extra: Map<String, Value>,
}

impl Default for ContourOptions {
    fn default() -> Self {
        ContourOptions {
            levels: None,
            cmap: None,
            colorbar: true,
            extra: Map::new(),
        }
    }
}

setters!(ContourOptions {
    levels: Levels,
    cmap: String,
});

impl ContourOptions {
    pub fn colorbar(mut self, show: bool) -> Self {
        self.colorbar = show;
        self
    }
}

/// Options of the reference lines [`crate::Axes::axhline`] / [`crate::Axes::axvline`].
#[derive(Debug, Clone, PartialEq)]
pub struct RefLineOptions {
    pub color: Color,
    pub linestyle: LineDash,
    pub linewidth: f64,
    /// Text placed next to the line.
    pub label: Option<String>,
}

impl Default for RefLineOptions {
    fn default() -> Self {
        RefLineOptions {
            color: Color::new("black"),
            linestyle: LineDash::Solid,
            linewidth: 1.0,
            label: None,
        }
    }
}

impl RefLineOptions {
    pub fn color(mut self, color: impl Into<Color>) -> Self {
        self.color = color.into();
        self
    }

    /// Accepts dash codes and names; unknown styles keep the current one.
    pub fn linestyle(mut self, style: &str) -> Self {
        if let Some(dash) = LineDash::from_style(style) {
            self.linestyle = dash;
        }
        self
    }

    pub fn linewidth(mut self, width: f64) -> Self {
        self.linewidth = width;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Options of the spans [`crate::Axes::axhspan`] / [`crate::Axes::axvspan`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpanOptions {
    pub color: Color,
    pub alpha: f64,
}

impl Default for SpanOptions {
    fn default() -> Self {
        SpanOptions {
            color: Color::new("gray"),
            alpha: 0.3,
        }
    }
}

impl SpanOptions {
    pub fn color(mut self, color: impl Into<Color>) -> Self {
        self.color = color.into();
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
}

/// Options of [`crate::Axes::text`] and [`crate::Axes::annotate`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextOptions {
    pub fontsize: f64,
    pub color: Color,
    /// `left`, `center` or `right`.
    pub ha: String,
    /// `top`, `center` or `bottom`.
    pub va: String,
}

impl Default for TextOptions {
    fn default() -> Self {
        TextOptions {
            fontsize: 12.0,
            color: Color::new("black"),
            ha: "left".into(),
            va: "bottom".into(),
        }
    }
}

impl TextOptions {
    pub fn fontsize(mut self, size: f64) -> Self {
        self.fontsize = size;
        self
    }

    pub fn color(mut self, color: impl Into<Color>) -> Self {
        self.color = color.into();
        self
    }

    pub fn ha(mut self, ha: &str) -> Self {
        self.ha = ha.to_string();
        self
    }

    pub fn va(mut self, va: &str) -> Self {
        self.va = va.to_string();
        self
    }
}

/// Options of [`crate::Axes::xticks`] / [`crate::Axes::yticks`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOptions {
    pub ticks: Option<Vec<f64>>,
    pub labels: Option<Vec<String>>,
    /// Counter-clockwise label rotation in degrees.
    pub rotation: Option<f64>,
    pub fontsize: Option<f64>,
}

impl TickOptions {
    pub fn ticks(mut self, ticks: Vec<f64>) -> Self {
        self.ticks = Some(ticks);
        self
    }

    pub fn labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn fontsize(mut self, size: f64) -> Self {
        self.fontsize = Some(size);
        self
    }
}

/// Raster export settings. `None` sizes fall back to the layout size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExportOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub scale: Option<f64>,
}

impl ExportOptions {
    pub fn size(width: u32, height: u32) -> Self {
        ExportOptions {
            width: Some(width),
            height: Some(height),
            scale: None,
        }
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_fill_options() {
        let o = LineOptions::default()
            .label("sin")
            .color("red")
            .linestyle("--")
            .extra("hoverinfo", "skip");
        assert_eq!(o.label.as_deref(), Some("sin"));
        assert_eq!(o.color, Some(Color::new("red")));
        assert_eq!(o.dash(), Some(LineDash::Dash));
        assert_eq!(o.extra["hoverinfo"], "skip");
    }

    #[test]
    fn plot_args_convert() {
        assert_eq!(PlotArg::from(vec![1.0]), PlotArg::Values(vec![1.0]));
        assert_eq!(PlotArg::from("r--"), PlotArg::Format("r--".into()));
        assert_eq!(PlotArg::from([1.0, 2.0]), PlotArg::Values(vec![1.0, 2.0]));
    }
}
