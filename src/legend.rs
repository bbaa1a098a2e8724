//! Legend locations, legend configuration, and legend placement.
//!
//! Single-panel figures use the built-in legend object of the layout.
//! Multi-panel figures get one synthetic annotation per panel instead, placed
//! inside that panel's domain so each legend stays over its own subplot.

use std::fmt;
use std::str::FromStr;

use crate::models::{Annotation, Font, LegendLayout};
use crate::style::Color;

/// Gap between a legend and the panel edge, as a fraction of the panel.
pub const LEGEND_MARGIN: f64 = 0.02;

/// Named legend anchor positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Location {
    /// Same placement as [`Location::UpperRight`]; no free-space search is done.
    Best,
    #[default]
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
    Right,
    CenterLeft,
    CenterRight,
    LowerCenter,
    UpperCenter,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XAnchor {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YAnchor {
    Top,
    Middle,
    Bottom,
}

impl XAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            XAnchor::Left => "left",
            XAnchor::Center => "center",
            XAnchor::Right => "right",
        }
    }
}

impl YAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            YAnchor::Top => "top",
            YAnchor::Middle => "middle",
            YAnchor::Bottom => "bottom",
        }
    }
}

/// Placement inside the unit square, with the box corner the point refers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub xanchor: XAnchor,
    pub yanchor: YAnchor,
}

impl Location {
    pub const ALL: [Location; 11] = [
        Location::Best,
        Location::UpperRight,
        Location::UpperLeft,
        Location::LowerLeft,
        Location::LowerRight,
        Location::Right,
        Location::CenterLeft,
        Location::CenterRight,
        Location::LowerCenter,
        Location::UpperCenter,
        Location::Center,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Location::Best => "best",
            Location::UpperRight => "upper right",
            Location::UpperLeft => "upper left",
            Location::LowerLeft => "lower left",
            Location::LowerRight => "lower right",
            Location::Right => "right",
            Location::CenterLeft => "center left",
            Location::CenterRight => "center right",
            Location::LowerCenter => "lower center",
            Location::UpperCenter => "upper center",
            Location::Center => "center",
        }
    }

    /// Resolve a location name. Unknown names fall back to upper right.
    pub fn resolve_name(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }

    /// Integer location codes, `0` (best) through `10` (center).
    /// Out-of-range codes fall back to upper right.
    pub fn from_code(code: u8) -> Self {
        Self::ALL
            .get(code as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Normalized placement. Every coordinate lies in `[0.02, 0.98]`.
    pub fn placement(self) -> Placement {
        const LO: f64 = LEGEND_MARGIN;
        const HI: f64 = 1.0 - LEGEND_MARGIN;
        let (x, xanchor) = match self {
            Location::UpperLeft | Location::LowerLeft | Location::CenterLeft => (LO, XAnchor::Left),
            Location::LowerCenter | Location::UpperCenter | Location::Center => {
                (0.5, XAnchor::Center)
            }
            _ => (HI, XAnchor::Right),
        };
        let (y, yanchor) = match self {
            Location::LowerLeft | Location::LowerRight | Location::LowerCenter => {
                (LO, YAnchor::Bottom)
            }
            Location::Right | Location::CenterLeft | Location::CenterRight | Location::Center => {
                (0.5, YAnchor::Middle)
            }
            _ => (HI, YAnchor::Top),
        };
        Placement {
            x,
            y,
            xanchor,
            yanchor,
        }
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|loc| loc.name() == normalized)
            .ok_or_else(|| format!("unknown legend location: {s:?}"))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Legend settings of one panel.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendConfig {
    pub visible: bool,
    pub location: Location,
    pub font_size: Option<f64>,
    pub frame_on: bool,
    pub frame_alpha: f64,
    pub face_color: Color,
    pub edge_color: Color,
    /// Rounded frame corners. Accepted for API compatibility; neither the
    /// built-in legend nor the annotation legend can round corners, so it has
    /// no visible effect.
    pub fancybox: bool,
}

impl Default for LegendConfig {
    fn default() -> Self {
        LegendConfig {
            visible: true,
            location: Location::UpperRight,
            font_size: None,
            frame_on: true,
            frame_alpha: 1.0,
            face_color: Color::new("white"),
            edge_color: Color::new("#cccccc"),
            fancybox: true,
        }
    }
}

impl LegendConfig {
    pub const DEFAULT_FONT_SIZE: f64 = 12.0;

    pub fn hidden() -> Self {
        LegendConfig {
            visible: false,
            ..Default::default()
        }
    }

    pub fn loc(mut self, name: &str) -> Self {
        self.location = Location::resolve_name(name);
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn fontsize(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn frameon(mut self, on: bool) -> Self {
        self.frame_on = on;
        self
    }

    pub fn framealpha(mut self, alpha: f64) -> Self {
        self.frame_alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn facecolor(mut self, color: impl Into<Color>) -> Self {
        self.face_color = color.into();
        self
    }

    pub fn edgecolor(mut self, color: impl Into<Color>) -> Self {
        self.edge_color = color.into();
        self
    }

    pub fn fancybox(mut self, on: bool) -> Self {
        self.fancybox = on;
        self
    }

    fn font(&self) -> Font {
        Font::sized(self.font_size.unwrap_or(Self::DEFAULT_FONT_SIZE))
    }

    /// `(bgcolor, bordercolor, borderwidth)` for the frame settings.
    fn frame(&self) -> (Color, Color, f64) {
        if self.frame_on {
            (
                self.face_color.with_alpha(self.frame_alpha),
                self.edge_color.clone(),
                1.0,
            )
        } else {
            (Color::new("rgba(0,0,0,0)"), Color::new("rgba(0,0,0,0)"), 0.0)
        }
    }

    /// Built-in legend object for a single-panel figure.
    pub fn to_layout(&self) -> LegendLayout {
        let p = self.location.placement();
        let (bg, border, width) = self.frame();
        LegendLayout {
            visible: Some(self.visible),
            x: Some(p.x),
            y: Some(p.y),
            xanchor: Some(p.xanchor.as_str().to_string()),
            yanchor: Some(p.yanchor.as_str().to_string()),
            font: Some(self.font()),
            bgcolor: Some(bg),
            bordercolor: Some(border),
            borderwidth: Some(width),
        }
    }

    /// Synthetic legend for a panel occupying `x_domain` × `y_domain` of the
    /// canvas. `entries` are `(label, color)` pairs in series order.
    pub fn to_panel_annotation(
        &self,
        x_domain: [f64; 2],
        y_domain: [f64; 2],
        entries: &[(String, Color)],
    ) -> Annotation {
        let p = self.location.placement();
        let (bg, border, width) = self.frame();
        let text = entries
            .iter()
            .map(|(label, color)| {
                format!(
                    "<span style=\"color:{}\">{}</span> {}",
                    color,
                    GLYPH,
                    escape_html(label)
                )
            })
            .collect::<Vec<_>>()
            .join("<br>");
        Annotation {
            text,
            x: lerp(x_domain, p.x),
            y: lerp(y_domain, p.y),
            xref: "paper".into(),
            yref: "paper".into(),
            xanchor: Some(p.xanchor.as_str().into()),
            yanchor: Some(p.yanchor.as_str().into()),
            showarrow: false,
            font: Some(self.font()),
            align: Some("left".into()),
            bgcolor: Some(bg),
            bordercolor: Some(border),
            borderwidth: Some(width),
            borderpad: Some(4.0),
            ..Default::default()
        }
    }
}

/// Marker glyph prefixed to each synthetic legend entry.
pub const GLYPH: &str = "\u{25CF}";

/// Map a fraction of a panel onto the canvas.
pub fn lerp(domain: [f64; 2], fraction: f64) -> f64 {
    domain[0] + (domain[1] - domain[0]) * fraction
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Split a synthetic legend annotation back into `(label, color)` entries.
pub fn parse_panel_entries(text: &str) -> Vec<(String, Color)> {
    text.split("<br>")
        .filter_map(|line| {
            let rest = line.strip_prefix("<span style=\"color:")?;
            let (color, rest) = rest.split_once("\">")?;
            let (_, label) = rest.split_once("</span> ")?;
            let label = label.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&");
            Some((label, Color::new(color)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_matches_upper_right() {
        assert_eq!(Location::Best.placement(), Location::UpperRight.placement());
    }

    #[test]
    fn names_are_case_and_space_insensitive() {
        assert_eq!(Location::resolve_name("  Upper   LEFT "), Location::UpperLeft);
        assert_eq!(Location::resolve_name("nowhere"), Location::UpperRight);
    }

    #[test]
    fn codes_map_in_order() {
        assert_eq!(Location::from_code(0), Location::Best);
        assert_eq!(Location::from_code(3), Location::LowerLeft);
        assert_eq!(Location::from_code(10), Location::Center);
        assert_eq!(Location::from_code(42), Location::UpperRight);
    }

    #[test]
    fn frame_off_is_transparent() {
        let layout = LegendConfig::default().frameon(false).to_layout();
        assert_eq!(layout.borderwidth, Some(0.0));
        assert_eq!(layout.bgcolor.unwrap().alpha(), 0.0);
    }

    #[test]
    fn frame_alpha_applies_to_face() {
        let layout = LegendConfig::default().framealpha(0.5).to_layout();
        assert_eq!(layout.bgcolor.unwrap().as_str(), "rgba(255,255,255,0.5)");
    }

    #[test]
    fn panel_annotation_interpolates_into_domain() {
        let entries = vec![("a<b".to_string(), Color::new("blue"))];
        let ann = LegendConfig::default()
            .location(Location::LowerLeft)
            .to_panel_annotation([0.5, 1.0], [0.0, 0.4], &entries);
        assert!((ann.x - 0.51).abs() < 1e-12);
        assert!((ann.y - 0.008).abs() < 1e-12);
        assert_eq!(parse_panel_entries(&ann.text), entries);
    }
}
