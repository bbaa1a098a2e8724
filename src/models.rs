//! Scene graph: the traces and layout handed to the renderer.
//!
//! The shapes follow the plotly.js figure schema closely enough that the JSON
//! export can be fed to `Plotly.newPlot` unchanged. Only the attributes the
//! plotting API produces are typed; everything else travels in the `extra`
//! passthrough maps.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::style::{Color, LineDash};

/// Trace types the plotting API emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    #[default]
    Scatter,
    Bar,
    Histogram,
    Pie,
    Heatmap,
    Contour,
}

/// Drawing mode of a scatter trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "lines")]
    Lines,
    #[serde(rename = "markers")]
    Markers,
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

impl Mode {
    pub fn has_lines(self) -> bool {
        matches!(self, Mode::Lines | Mode::LinesMarkers)
    }

    pub fn has_markers(self) -> bool {
        matches!(self, Mode::Markers | Mode::LinesMarkers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[serde(rename = "v")]
    Vertical,
    #[serde(rename = "h")]
    Horizontal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Font {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

impl Font {
    pub fn sized(size: f64) -> Self {
        Font {
            size: Some(size),
            ..Default::default()
        }
    }
}

/// Title text with an optional font. Deserializes from a bare string as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TitleRepr")]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

impl Title {
    pub fn new(text: impl Into<String>, font_size: Option<f64>) -> Self {
        Title {
            text: text.into(),
            font: font_size.map(Font::sized),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TitleRepr {
    Text(String),
    Full {
        #[serde(default)]
        text: String,
        #[serde(default)]
        font: Option<Font>,
    },
}

impl From<TitleRepr> for Title {
    fn from(repr: TitleRepr) -> Self {
        match repr {
            TitleRepr::Text(text) => Title { text, font: None },
            TitleRepr::Full { text, font } => Title { text, font },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<LineDash>,
}

/// Marker color: one color, one numeric value per point (mapped through a
/// colorscale), or one color per point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerColor {
    Single(Color),
    Values(Vec<f64>),
    List(Vec<Color>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<MarkerColor>,
    /// Slice colors of a pie trace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<Color>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showscale: Option<bool>,
}

impl MarkerStyle {
    /// The single color, if the marker has one.
    pub fn single_color(&self) -> Option<&Color> {
        match &self.color {
            Some(MarkerColor::Single(c)) => Some(c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBars {
    #[serde(rename = "type", default = "ErrorBars::data_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symmetric: Option<bool>,
    pub array: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrayminus: Option<Vec<f64>>,
    #[serde(default = "yes")]
    pub visible: bool,
}

impl ErrorBars {
    fn data_type() -> String {
        "data".to_string()
    }

    pub fn symmetric(array: Vec<f64>) -> Self {
        ErrorBars {
            kind: Self::data_type(),
            symmetric: None,
            array,
            arrayminus: None,
            visible: true,
        }
    }

    pub fn asymmetric(minus: Vec<f64>, plus: Vec<f64>) -> Self {
        ErrorBars {
            kind: Self::data_type(),
            symmetric: Some(false),
            array: plus,
            arrayminus: Some(minus),
            visible: true,
        }
    }

    /// `(below, above)` extent at point `i`.
    pub fn extent(&self, i: usize) -> (f64, f64) {
        let plus = self.array.get(i).copied().unwrap_or(0.0);
        let minus = match (&self.arrayminus, self.symmetric) {
            (Some(m), Some(false)) => m.get(i).copied().unwrap_or(0.0),
            _ => plus,
        };
        (minus, plus)
    }
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bins {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contours {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coloring: Option<String>,
}

/// Serde helper: JSON has no NaN, so gaps are written as `null`. Read them
/// back as NaN.
fn de_gappy<'de, D>(deserializer: D) -> Result<Option<Vec<f64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<Vec<Option<f64>>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|v| v.into_iter().map(|x| x.unwrap_or(f64::NAN)).collect()))
}

fn de_gappy_grid<'de, D>(deserializer: D) -> Result<Option<Vec<Vec<f64>>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<Vec<Vec<Option<f64>>>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|rows| {
        rows.into_iter()
            .map(|row| row.into_iter().map(|x| x.unwrap_or(f64::NAN)).collect())
            .collect()
    }))
}

mod series_meta {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    #[derive(Serialize)]
    struct Meta {
        series: usize,
    }

    pub fn serialize<S: Serializer>(series: &usize, serializer: S) -> Result<S::Ok, S::Error> {
        Meta { series: *series }.serialize(serializer)
    }

    /// Foreign `meta` values are accepted and read as series 0.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
        let meta = Value::deserialize(deserializer)?;
        Ok(meta
            .get("series")
            .and_then(Value::as_u64)
            .map_or(0, |n| n as usize))
    }
}

/// One plotted trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "type", default)]
    pub kind: TraceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, deserialize_with = "de_gappy", skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<f64>>,
    #[serde(default, deserialize_with = "de_gappy", skip_serializing_if = "Option::is_none")]
    pub y: Option<Vec<f64>>,
    #[serde(default, deserialize_with = "de_gappy_grid", skip_serializing_if = "Option::is_none")]
    pub z: Option<Vec<Vec<f64>>>,
    #[serde(default, deserialize_with = "de_gappy", skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<MarkerStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_x: Option<ErrorBars>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_y: Option<ErrorBars>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbinsx: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xbins: Option<Bins>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histnorm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textinfo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zmin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zmax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showscale: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contours: Option<Contours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
    /// Series this trace belongs to within its panel. One plotting call emits
    /// one series, possibly as several traces. Written as `meta.series`,
    /// the free-form slot plotly.js leaves for callers.
    #[serde(rename = "meta", with = "series_meta", default)]
    pub series: usize,
    /// Opaque passthrough attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Trace {
    pub fn new(kind: TraceKind) -> Self {
        Trace {
            kind,
            ..Default::default()
        }
    }

    /// Color a legend glyph for this trace should use: line stroke first, then
    /// marker, then fill.
    pub fn display_color(&self) -> Option<&Color> {
        self.line
            .as_ref()
            .and_then(|l| l.color.as_ref())
            .or_else(|| self.marker.as_ref().and_then(|m| m.single_color()))
            .or(self.fillcolor.as_ref())
    }

    /// Replace the presentation color, leaving data untouched.
    ///
    /// Line stroke and single marker color are replaced when present; a fill
    /// keeps its alpha.
    pub fn recolor(&mut self, color: &Color) {
        if let Some(line) = self.line.as_mut()
            && line.color.is_some()
        {
            line.color = Some(color.clone());
        }
        if let Some(marker) = self.marker.as_mut()
            && matches!(marker.color, Some(MarkerColor::Single(_)))
        {
            marker.color = Some(MarkerColor::Single(color.clone()));
        }
        if let Some(fill) = self.fillcolor.as_ref() {
            let alpha = fill.alpha();
            self.fillcolor = Some(color.with_alpha(alpha));
        }
    }

    pub fn is_cartesian(&self) -> bool {
        !matches!(self.kind, TraceKind::Pie)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    Linear,
    Log,
}

/// One `xaxis*` / `yaxis*` layout object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisLayout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<AxisType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tickvals: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticktext: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tickangle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tickfont: Option<Font>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showgrid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gridcolor: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linecolor: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autorange: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaleanchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaleratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,
}

impl AxisLayout {
    pub fn is_log(&self) -> bool {
        self.scale == Some(AxisType::Log)
    }

    pub fn is_reversed(&self) -> bool {
        self.autorange.as_deref() == Some("reversed")
    }
}

/// The built-in legend of a single-panel figure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegendLayout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yanchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bordercolor: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borderwidth: Option<f64>,
}

/// Free text placed in data or paper coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
    pub x: f64,
    pub y: f64,
    #[serde(default = "paper_ref")]
    pub xref: String,
    #[serde(default = "paper_ref")]
    pub yref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yanchor: Option<String>,
    #[serde(default)]
    pub showarrow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ay: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ayref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrowhead: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bordercolor: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borderwidth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borderpad: Option<f64>,
}

fn paper_ref() -> String {
    "paper".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Line,
    Rect,
}

/// Reference lines and spans. `xref` / `yref` may carry a ` domain` suffix
/// (`"x2 domain"`), in which case that coordinate is a fraction of the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub xref: String,
    pub yref: String,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub l: f64,
    pub r: f64,
    pub t: f64,
    pub b: f64,
}

/// Figure-wide layout.
///
/// Axis objects are keyed by their layout name (`xaxis`, `yaxis3`, …) and are
/// (de)serialized as top-level keys, the way plotly.js expects them. Keys that
/// are neither typed fields nor axes land in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Layout {
    pub title: Option<Title>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub margin: Option<Margin>,
    pub template: Option<String>,
    pub showlegend: Option<bool>,
    pub legend: Option<LegendLayout>,
    pub annotations: Vec<Annotation>,
    pub shapes: Vec<Shape>,
    pub plot_bgcolor: Option<Color>,
    pub paper_bgcolor: Option<Color>,
    pub axes: BTreeMap<String, AxisLayout>,
    /// Raw passthrough keys, written after the typed fields.
    pub extra: Map<String, Value>,
}

static AXIS_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[xy]axis(?:[1-9][0-9]*)?$").expect("axis key regex is valid"));

/// Whether `key` names a layout axis object.
pub fn is_axis_key(key: &str) -> bool {
    AXIS_KEY.is_match(key)
}

fn value_of<T: Serialize>(v: &T) -> Value {
    serde_json::to_value(v).unwrap_or(Value::Null)
}

impl From<Layout> for Map<String, Value> {
    fn from(layout: Layout) -> Self {
        let mut map = Map::new();
        macro_rules! put {
            ($key:literal, $field:expr) => {
                if let Some(v) = &$field {
                    map.insert($key.to_string(), value_of(v));
                }
            };
        }
        put!("title", layout.title);
        put!("width", layout.width);
        put!("height", layout.height);
        put!("margin", layout.margin);
        put!("template", layout.template);
        put!("showlegend", layout.showlegend);
        put!("legend", layout.legend);
        put!("plot_bgcolor", layout.plot_bgcolor);
        put!("paper_bgcolor", layout.paper_bgcolor);
        if !layout.annotations.is_empty() {
            map.insert("annotations".into(), value_of(&layout.annotations));
        }
        if !layout.shapes.is_empty() {
            map.insert("shapes".into(), value_of(&layout.shapes));
        }
        for (key, axis) in &layout.axes {
            map.insert(key.clone(), value_of(axis));
        }
        for (key, value) in layout.extra {
            map.insert(key, value);
        }
        map
    }
}

impl TryFrom<Map<String, Value>> for Layout {
    type Error = serde_json::Error;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        use serde_json::from_value;

        let mut layout = Layout::default();
        for (key, value) in map {
            match key.as_str() {
                "title" => layout.title = from_value(value)?,
                "width" => layout.width = from_value(value)?,
                "height" => layout.height = from_value(value)?,
                "margin" => layout.margin = from_value(value)?,
                "template" if value.is_string() => layout.template = from_value(value)?,
                "showlegend" => layout.showlegend = from_value(value)?,
                "legend" => layout.legend = from_value(value)?,
                "plot_bgcolor" => layout.plot_bgcolor = from_value(value)?,
                "paper_bgcolor" => layout.paper_bgcolor = from_value(value)?,
                "annotations" => layout.annotations = from_value(value)?,
                "shapes" => layout.shapes = from_value(value)?,
                k if is_axis_key(k) => {
                    layout.axes.insert(key, from_value(value)?);
                }
                _ => {
                    layout.extra.insert(key, value);
                }
            }
        }
        Ok(layout)
    }
}

impl Layout {
    /// Mutable access to an axis object, created on first use.
    pub fn axis_mut(&mut self, key: &str) -> &mut AxisLayout {
        self.axes.entry(key.to_string()).or_default()
    }
}

/// Serializable figure: traces plus layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub data: Vec<Trace>,
    #[serde(default)]
    pub layout: Layout,
}

impl Scene {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_keys_are_recognized() {
        assert!(is_axis_key("xaxis"));
        assert!(is_axis_key("yaxis12"));
        assert!(!is_axis_key("xaxis0"));
        assert!(!is_axis_key("zaxis"));
        assert!(!is_axis_key("xaxis_title"));
    }

    #[test]
    fn layout_splits_axes_and_passthrough() {
        let v = serde_json::json!({
            "title": "Plain string title",
            "xaxis2": {"type": "log"},
            "hovermode": "closest"
        });
        let layout: Layout = serde_json::from_value(v).unwrap();
        assert_eq!(layout.title.as_ref().unwrap().text, "Plain string title");
        assert!(layout.axes["xaxis2"].is_log());
        assert_eq!(layout.extra["hovermode"], "closest");

        let back = serde_json::to_value(&layout).unwrap();
        assert_eq!(back["xaxis2"]["type"], "log");
        assert_eq!(back["hovermode"], "closest");
        assert_eq!(back["title"]["text"], "Plain string title");
    }

    #[test]
    fn recolor_keeps_fill_alpha() {
        let mut t = Trace::new(TraceKind::Scatter);
        t.line = Some(LineStyle {
            color: Some(Color::new("#1f77b4")),
            ..Default::default()
        });
        t.fillcolor = Some(Color::new("rgba(31,119,180,0.3)"));
        t.recolor(&Color::new("black"));
        assert_eq!(t.line.unwrap().color.unwrap().as_str(), "black");
        assert_eq!(t.fillcolor.unwrap().as_str(), "rgba(0,0,0,0.3)");
    }

    #[test]
    fn gaps_survive_json() {
        let mut t = Trace::new(TraceKind::Heatmap);
        t.y = Some(vec![1.0, f64::NAN]);
        t.z = Some(vec![vec![f64::NAN, 2.0]]);
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("[1.0,null]"));
        let back: Trace = serde_json::from_str(&json).unwrap();
        assert!(back.y.unwrap()[1].is_nan());
        assert!(back.z.unwrap()[0][0].is_nan());
        assert!(back.x.is_none());
    }

    #[test]
    fn series_ids_survive_json() {
        let mut t = Trace::new(TraceKind::Scatter);
        t.series = 3;
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["meta"]["series"], 3);
        let back: Trace = serde_json::from_value(json).unwrap();
        assert_eq!(back.series, 3);

        let foreign: Trace =
            serde_json::from_value(serde_json::json!({"type": "bar", "meta": "note"})).unwrap();
        assert_eq!(foreign.series, 0);
        assert!(foreign.extra.is_empty());
    }

    #[test]
    fn asymmetric_error_extent() {
        let e = ErrorBars::asymmetric(vec![1.0, 2.0], vec![3.0, 4.0]);
        assert_eq!(e.extent(1), (2.0, 4.0));
        let s = ErrorBars::symmetric(vec![0.5]);
        assert_eq!(s.extent(0), (0.5, 0.5));
    }
}
