//! Color values, marker symbols, line dashes, and the short format-string parser.
//!
//! A format string such as `"ro--"` packs up to three style attributes into a
//! few characters: a single-letter color, a single-character marker and a line
//! dash pattern. [`StyleSpec::parse`] pulls them apart. Parsing never fails;
//! characters that match nothing are ignored.
//!
//! # Example
//!
//! ```
//! use qplot::style::{LineDash, MarkerSymbol, StyleSpec};
//!
//! let spec = StyleSpec::parse("ro--");
//! assert_eq!(spec.color.as_ref().map(|c| c.as_str()), Some("red"));
//! assert_eq!(spec.marker, Some(MarkerSymbol::Circle));
//! assert_eq!(spec.dash, Some(LineDash::Dash));
//! ```

use std::fmt;
use std::sync::LazyLock;

use ahash::AHashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Opaque 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// RGB color with a CSS-style alpha in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    /// Create a new RGBA color.
    pub fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self {
            r,
            g,
            b,
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Create an opaque RGB color.
    pub fn opaque(rgb: Rgb8) -> Self {
        Self::new(rgb.r, rgb.g, rgb.b, 1.0)
    }

    pub fn rgb(&self) -> Rgb8 {
        Rgb8::new(self.r, self.g, self.b)
    }
}

/// A color as the scene graph carries it: a CSS color string.
///
/// Accepted spellings are named colors (`"blue"`), hex (`"#1f77b4"`, `"#fff"`)
/// and functional notation (`"rgb(1,2,3)"`, `"rgba(1,2,3,0.5)"`). The string is
/// kept verbatim so a scene round-trips exactly; [`Color::to_rgba`] interprets it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(value: impl Into<String>) -> Self {
        Color(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the color string. `None` when the spelling is not understood.
    pub fn to_rgba(&self) -> Option<Rgba> {
        parse_css_color(&self.0)
    }

    /// Same hue with a replaced alpha, always in `rgba()` notation.
    ///
    /// Unknown spellings turn into translucent gray, matching what a fill with
    /// an unparseable color looks like elsewhere.
    pub fn with_alpha(&self, alpha: f64) -> Color {
        let rgb = self
            .to_rgba()
            .map(|c| c.rgb())
            .unwrap_or(Rgb8::new(128, 128, 128));
        let a = alpha.clamp(0.0, 1.0);
        Color(format!("rgba({},{},{},{})", rgb.r, rgb.g, rgb.b, a))
    }

    /// Alpha of the color, `1.0` when opaque or unparseable.
    pub fn alpha(&self) -> f64 {
        self.to_rgba().map(|c| c.a).unwrap_or(1.0)
    }
}

impl From<&str> for Color {
    fn from(s: &str) -> Self {
        Color::new(s)
    }
}

impl From<String> for Color {
    fn from(s: String) -> Self {
        Color(s)
    }
}

impl From<Rgb8> for Color {
    fn from(rgb: Rgb8) -> Self {
        Color(rgb.to_hex())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// CSS named colors understood by [`Color::to_rgba`].
static NAMED_COLORS: LazyLock<AHashMap<&'static str, Rgb8>> = LazyLock::new(|| {
    [
        ("blue", Rgb8::new(0, 0, 255)),
        ("green", Rgb8::new(0, 128, 0)),
        ("red", Rgb8::new(255, 0, 0)),
        ("cyan", Rgb8::new(0, 255, 255)),
        ("magenta", Rgb8::new(255, 0, 255)),
        ("yellow", Rgb8::new(255, 255, 0)),
        ("black", Rgb8::new(0, 0, 0)),
        ("white", Rgb8::new(255, 255, 255)),
        ("gray", Rgb8::new(128, 128, 128)),
        ("grey", Rgb8::new(128, 128, 128)),
        ("orange", Rgb8::new(255, 165, 0)),
        ("purple", Rgb8::new(128, 0, 128)),
        ("brown", Rgb8::new(165, 42, 42)),
        ("pink", Rgb8::new(255, 192, 203)),
        ("lightblue", Rgb8::new(173, 216, 230)),
        ("lightyellow", Rgb8::new(255, 255, 224)),
        ("lightgreen", Rgb8::new(144, 238, 144)),
        ("lightgray", Rgb8::new(211, 211, 211)),
        ("lightgrey", Rgb8::new(211, 211, 211)),
        ("darkblue", Rgb8::new(0, 0, 139)),
        ("darkgreen", Rgb8::new(0, 100, 0)),
        ("darkred", Rgb8::new(139, 0, 0)),
        ("darkgray", Rgb8::new(169, 169, 169)),
        ("darkgrey", Rgb8::new(169, 169, 169)),
        ("navy", Rgb8::new(0, 0, 128)),
        ("teal", Rgb8::new(0, 128, 128)),
        ("olive", Rgb8::new(128, 128, 0)),
        ("maroon", Rgb8::new(128, 0, 0)),
        ("lime", Rgb8::new(0, 255, 0)),
        ("gold", Rgb8::new(255, 215, 0)),
        ("silver", Rgb8::new(192, 192, 192)),
        ("violet", Rgb8::new(238, 130, 238)),
        ("indigo", Rgb8::new(75, 0, 130)),
    ]
    .into_iter()
    .collect()
});

static FUNCTIONAL_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([0-9]*\.?[0-9]+)\s*)?\)$",
    )
    .expect("color regex is valid")
});

fn parse_css_color(s: &str) -> Option<Rgba> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(caps) = FUNCTIONAL_COLOR.captures(s) {
        let channel = |i: usize| -> Option<u8> { caps.get(i)?.as_str().parse::<u16>().ok().map(|v| v.min(255) as u8) };
        let a = caps
            .get(4)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(1.0);
        return Some(Rgba::new(channel(1)?, channel(2)?, channel(3)?, a));
    }
    if s.eq_ignore_ascii_case("transparent") {
        return Some(Rgba::new(0, 0, 0, 0.0));
    }
    NAMED_COLORS
        .get(s.to_ascii_lowercase().as_str())
        .map(|rgb| Rgba::opaque(*rgb))
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut it = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some(Rgba::new(it.next()??, it.next()??, it.next()??, 1.0))
        }
        6 => Some(Rgba::new(
            byte(hex.get(0..2)?)?,
            byte(hex.get(2..4)?)?,
            byte(hex.get(4..6)?)?,
            1.0,
        )),
        8 => Some(Rgba::new(
            byte(hex.get(0..2)?)?,
            byte(hex.get(2..4)?)?,
            byte(hex.get(4..6)?)?,
            byte(hex.get(6..8)?)? as f64 / 255.0,
        )),
        _ => None,
    }
}

/// Marker shape for data points, named the way the scene graph spells them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerSymbol {
    Circle,
    Square,
    TriangleUp,
    TriangleDown,
    Diamond,
    Cross,
    X,
    Star,
    Pentagon,
    Hexagon,
}

impl MarkerSymbol {
    /// Single-character marker codes of the format-string vocabulary.
    pub fn from_code(c: char) -> Option<Self> {
        Some(match c {
            'o' => MarkerSymbol::Circle,
            's' => MarkerSymbol::Square,
            '^' => MarkerSymbol::TriangleUp,
            'v' => MarkerSymbol::TriangleDown,
            'D' | 'd' => MarkerSymbol::Diamond,
            '+' => MarkerSymbol::Cross,
            'x' => MarkerSymbol::X,
            '*' => MarkerSymbol::Star,
            'p' => MarkerSymbol::Pentagon,
            'h' => MarkerSymbol::Hexagon,
            _ => return None,
        })
    }

    /// Scene-graph symbol name.
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerSymbol::Circle => "circle",
            MarkerSymbol::Square => "square",
            MarkerSymbol::TriangleUp => "triangle-up",
            MarkerSymbol::TriangleDown => "triangle-down",
            MarkerSymbol::Diamond => "diamond",
            MarkerSymbol::Cross => "cross",
            MarkerSymbol::X => "x",
            MarkerSymbol::Star => "star",
            MarkerSymbol::Pentagon => "pentagon",
            MarkerSymbol::Hexagon => "hexagon",
        }
    }

    /// Inverse of [`MarkerSymbol::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "circle" => MarkerSymbol::Circle,
            "square" => MarkerSymbol::Square,
            "triangle-up" => MarkerSymbol::TriangleUp,
            "triangle-down" => MarkerSymbol::TriangleDown,
            "diamond" => MarkerSymbol::Diamond,
            "cross" => MarkerSymbol::Cross,
            "x" => MarkerSymbol::X,
            "star" => MarkerSymbol::Star,
            "pentagon" => MarkerSymbol::Pentagon,
            "hexagon" => MarkerSymbol::Hexagon,
            _ => return None,
        })
    }
}

/// Translate a user-supplied marker name: one-character codes go through the
/// code table, anything else is forwarded unchanged.
pub fn resolve_marker_name(marker: &str) -> String {
    let mut chars = marker.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => MarkerSymbol::from_code(c)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| marker.to_string()),
        _ => marker.to_string(),
    }
}

/// Line dash pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineDash {
    Solid,
    Dash,
    DashDot,
    Dot,
}

impl LineDash {
    /// Dash codes in match priority order; the two-character codes come first
    /// because both contain the plain `-`.
    const CODES: [(&'static str, LineDash); 4] = [
        ("--", LineDash::Dash),
        ("-.", LineDash::DashDot),
        (":", LineDash::Dot),
        ("-", LineDash::Solid),
    ];

    /// Accepts a dash code (`"--"`) or a long name (`"dashed"`, `"dash"`).
    pub fn from_style(style: &str) -> Option<Self> {
        let style = style.trim();
        if let Some((_, dash)) = Self::CODES.iter().find(|(code, _)| *code == style) {
            return Some(*dash);
        }
        match style.to_ascii_lowercase().as_str() {
            "solid" => Some(LineDash::Solid),
            "dash" | "dashed" => Some(LineDash::Dash),
            "dashdot" => Some(LineDash::DashDot),
            "dot" | "dotted" => Some(LineDash::Dot),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineDash::Solid => "solid",
            LineDash::Dash => "dash",
            LineDash::DashDot => "dashdot",
            LineDash::Dot => "dot",
        }
    }
}

/// Color named by a single format-string letter.
pub fn color_from_code(c: char) -> Option<Color> {
    let name = match c {
        'b' => "blue",
        'g' => "green",
        'r' => "red",
        'c' => "cyan",
        'm' => "magenta",
        'y' => "yellow",
        'k' => "black",
        'w' => "white",
        _ => return None,
    };
    Some(Color::new(name))
}

/// The three style attributes a format string can carry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleSpec {
    pub color: Option<Color>,
    pub marker: Option<MarkerSymbol>,
    pub dash: Option<LineDash>,
}

impl StyleSpec {
    /// Decompose a format string.
    ///
    /// The dash pattern is located first and exactly one occurrence is removed.
    /// Remaining characters are scanned left to right; the color table is
    /// consulted before the marker table and each category keeps its first match.
    pub fn parse(fmt: &str) -> Self {
        let mut spec = StyleSpec::default();
        let mut rest = fmt.to_string();

        if let Some((code, dash)) = LineDash::CODES.iter().find(|(code, _)| rest.contains(code)) {
            spec.dash = Some(*dash);
            rest = rest.replacen(code, "", 1);
        }

        for ch in rest.chars() {
            if spec.color.is_none()
                && let Some(color) = color_from_code(ch)
            {
                spec.color = Some(color);
            } else if spec.marker.is_none()
                && let Some(marker) = MarkerSymbol::from_code(ch)
            {
                spec.marker = Some(marker);
            }
        }
        spec
    }

    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.marker.is_none() && self.dash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_color_marker_dash() {
        let spec = StyleSpec::parse("ro--");
        assert_eq!(spec.color, Some(Color::new("red")));
        assert_eq!(spec.marker, Some(MarkerSymbol::Circle));
        assert_eq!(spec.dash, Some(LineDash::Dash));
    }

    #[test]
    fn dash_dot_wins_over_plain_dash() {
        assert_eq!(StyleSpec::parse("-.").dash, Some(LineDash::DashDot));
        assert_eq!(StyleSpec::parse("k-").dash, Some(LineDash::Solid));
        assert_eq!(StyleSpec::parse("g:").dash, Some(LineDash::Dot));
    }

    #[test]
    fn token_order_does_not_matter() {
        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        let cases = [
            ("r", "o", MarkerSymbol::Circle, "red"),
            ("g", "s", MarkerSymbol::Square, "green"),
            ("k", "^", MarkerSymbol::TriangleUp, "black"),
        ];
        for (dash_code, dash) in LineDash::CODES {
            for (color_code, marker_code, marker, color) in cases {
                let parts = [color_code, marker_code, dash_code];
                for order in orders {
                    let fmt: String = order.iter().map(|&i| parts[i]).collect();
                    let spec = StyleSpec::parse(&fmt);
                    assert_eq!(spec.color, Some(Color::new(color)), "{fmt}");
                    assert_eq!(spec.marker, Some(marker), "{fmt}");
                    assert_eq!(spec.dash, Some(dash), "{fmt}");
                }
            }
        }
    }

    #[test]
    fn first_color_wins() {
        let spec = StyleSpec::parse("rb");
        assert_eq!(spec.color, Some(Color::new("red")));
        assert_eq!(spec.marker, None);
    }

    #[test]
    fn garbage_parses_to_nothing() {
        assert!(StyleSpec::parse("QZ!").is_empty());
        assert!(StyleSpec::parse("").is_empty());
    }

    #[test]
    fn hex_and_functional_colors() {
        let c = Color::new("#1f77b4").to_rgba().unwrap();
        assert_eq!((c.r, c.g, c.b), (0x1f, 0x77, 0xb4));
        let c = Color::new("#fff").to_rgba().unwrap();
        assert_eq!((c.r, c.g, c.b), (255, 255, 255));
        let c = Color::new("rgba(10, 20, 30, 0.25)").to_rgba().unwrap();
        assert_eq!((c.r, c.g, c.b), (10, 20, 30));
        assert!((c.a - 0.25).abs() < 1e-12);
        assert!(Color::new("not-a-color").to_rgba().is_none());
    }

    #[test]
    fn with_alpha_keeps_hue() {
        assert_eq!(Color::new("#ff0000").with_alpha(0.3).as_str(), "rgba(255,0,0,0.3)");
        assert_eq!(Color::new("blue").with_alpha(0.5).as_str(), "rgba(0,0,255,0.5)");
        assert_eq!(Color::new("???").with_alpha(0.5).as_str(), "rgba(128,128,128,0.5)");
    }

    #[test]
    fn marker_names_resolve_codes() {
        assert_eq!(resolve_marker_name("^"), "triangle-up");
        assert_eq!(resolve_marker_name("circle-open"), "circle-open");
        assert_eq!(resolve_marker_name("q"), "q");
    }
}
