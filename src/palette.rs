//! Color assignment: the per-panel color cycle and the finalize-time scheme
//! that re-colors automatically colored series.

use crate::style::{Color, Rgb8};

/// Default qualitative cycle, in order: blue, orange, green, red, purple,
/// brown, pink, gray, olive, cyan.
pub const DEFAULT_COLORS: [Rgb8; 10] = [
    Rgb8::new(0x1f, 0x77, 0xb4), // #1f77b4
    Rgb8::new(0xff, 0x7f, 0x0e), // #ff7f0e
    Rgb8::new(0x2c, 0xa0, 0x2c), // #2ca02c
    Rgb8::new(0xd6, 0x27, 0x28), // #d62728
    Rgb8::new(0x94, 0x67, 0xbd), // #9467bd
    Rgb8::new(0x8c, 0x56, 0x4b), // #8c564b
    Rgb8::new(0xe3, 0x77, 0xc2), // #e377c2
    Rgb8::new(0x7f, 0x7f, 0x7f), // #7f7f7f
    Rgb8::new(0xbc, 0xbd, 0x22), // #bcbd22
    Rgb8::new(0x17, 0xbe, 0xcf), // #17becf
];

/// Get a color from the default palette, wrapping around.
#[inline]
pub fn default_color(idx: usize) -> Color {
    DEFAULT_COLORS[idx % DEFAULT_COLORS.len()].into()
}

/// Round-robin allocator over a fixed palette. One per panel.
///
/// The index only ever grows; colors repeat once the palette is exhausted.
#[derive(Clone, Debug)]
pub struct ColorCycle {
    palette: Vec<Rgb8>,
    index: usize,
}

impl ColorCycle {
    pub fn new(palette: &[Rgb8]) -> Self {
        assert!(!palette.is_empty(), "color cycle needs at least one color");
        Self {
            palette: palette.to_vec(),
            index: 0,
        }
    }

    /// Hand out the next color and advance.
    pub fn next_color(&mut self) -> Color {
        let c = self.palette[self.index % self.palette.len()];
        self.index += 1;
        c.into()
    }

    /// Number of colors handed out so far.
    pub fn allocated(&self) -> usize {
        self.index
    }
}

impl Default for ColorCycle {
    fn default() -> Self {
        Self::new(&DEFAULT_COLORS)
    }
}

/// A continuous color map sampled on `0.0..=1.0`.
pub trait Gradient {
    /// Color at parameter `t`; `t` is clamped to the unit interval.
    fn sample(&self, t: f64) -> Rgb8;
}

/// Piecewise-linear gradient through `(position, color)` stops.
#[derive(Clone, Debug)]
pub struct StopGradient {
    stops: Vec<(f64, Rgb8)>,
}

impl StopGradient {
    /// Stops must be sorted by position and cover `0.0` and `1.0`.
    pub fn new(stops: Vec<(f64, Rgb8)>) -> Self {
        debug_assert!(stops.windows(2).all(|w| w[0].0 <= w[1].0));
        Self { stops }
    }

    /// Spectral rainbow: black, purple, blue, green, yellow, red, light gray.
    pub fn spectral() -> Self {
        const R: [f64; 20] = [
            0.0, 0.4667, 0.5333, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.7333, 0.9333,
            1.0, 1.0, 1.0, 0.8667, 0.80,
        ];
        const G: [f64; 20] = [
            0.0, 0.0, 0.0, 0.0, 0.0, 0.4667, 0.6000, 0.6667, 0.6667, 0.6000, 0.7333, 0.8667, 1.0,
            1.0, 0.9333, 0.8000, 0.6000, 0.0, 0.0, 0.80,
        ];
        const B: [f64; 20] = [
            0.0, 0.5333, 0.6000, 0.6667, 0.8667, 0.8667, 0.8667, 0.6667, 0.5333, 0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.80,
        ];
        let to_u8 = |v: f64| (v * 255.0).round() as u8;
        let last = (R.len() - 1) as f64;
        let stops = (0..R.len())
            .map(|i| {
                (
                    i as f64 / last,
                    Rgb8::new(to_u8(R[i]), to_u8(G[i]), to_u8(B[i])),
                )
            })
            .collect();
        Self::new(stops)
    }

    /// Default colorscale for heatmaps and contours.
    pub fn viridis() -> Self {
        Self::new(vec![
            (0.0, Rgb8::new(68, 1, 84)),
            (0.25, Rgb8::new(59, 82, 139)),
            (0.5, Rgb8::new(33, 145, 140)),
            (0.75, Rgb8::new(94, 201, 98)),
            (1.0, Rgb8::new(253, 231, 37)),
        ])
    }

    pub fn first(&self) -> Rgb8 {
        self.stops.first().map(|s| s.1).unwrap_or(Rgb8::new(0, 0, 0))
    }

    pub fn last(&self) -> Rgb8 {
        self.stops.last().map(|s| s.1).unwrap_or(Rgb8::new(0, 0, 0))
    }
}

impl Gradient for StopGradient {
    fn sample(&self, t: f64) -> Rgb8 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let Some(upper) = self.stops.iter().position(|(pos, _)| *pos >= t) else {
            return self.last();
        };
        if upper == 0 {
            return self.stops[0].1;
        }
        let (p0, c0) = self.stops[upper - 1];
        let (p1, c1) = self.stops[upper];
        let f = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
        Rgb8::new(lerp(c0.r, c1.r), lerp(c0.g, c1.g), lerp(c0.b, c1.b))
    }
}

/// Look up a named colorscale; `None` for names without a built-in table.
pub fn named_gradient(name: &str) -> Option<StopGradient> {
    match name.to_ascii_lowercase().as_str() {
        "viridis" => Some(StopGradient::viridis()),
        "spectral" | "nipy_spectral" | "rainbow" | "jet" => Some(StopGradient::spectral()),
        "greys" | "gray" | "grey" => Some(StopGradient::new(vec![
            (0.0, Rgb8::new(0, 0, 0)),
            (1.0, Rgb8::new(255, 255, 255)),
        ])),
        "rdbu" => Some(StopGradient::new(vec![
            (0.0, Rgb8::new(5, 10, 172)),
            (0.5, Rgb8::new(220, 220, 220)),
            (1.0, Rgb8::new(178, 10, 28)),
        ])),
        _ => None,
    }
}

/// Final colors for `n` automatically colored series, in registration order.
///
/// * 1 → blue
/// * 2 → blue, black
/// * 3 or 4 → blue, red, green, black (truncated)
/// * more → evenly spaced gradient samples, first and last at the gradient
///   end stops; without a gradient, the default palette cycled
pub fn auto_color_scheme(n: usize, gradient: Option<&dyn Gradient>) -> Vec<Color> {
    const SMALL: [&str; 4] = ["blue", "red", "green", "black"];
    match n {
        0 => Vec::new(),
        1 => vec![Color::new("blue")],
        2 => vec![Color::new("blue"), Color::new("black")],
        3 | 4 => SMALL[..n].iter().map(|c| Color::new(*c)).collect(),
        _ => match gradient {
            Some(g) => (0..n)
                .map(|i| g.sample(i as f64 / (n - 1) as f64).into())
                .collect(),
            None => (0..n).map(default_color).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_wraps_after_palette() {
        let mut cycle = ColorCycle::default();
        let first: Vec<Color> = (0..10).map(|_| cycle.next_color()).collect();
        assert_eq!(first[0].as_str(), "#1f77b4");
        assert_eq!(first[9].as_str(), "#17becf");
        assert_eq!(cycle.next_color().as_str(), "#1f77b4");
        assert_eq!(cycle.allocated(), 11);
    }

    #[test]
    fn gradient_endpoints() {
        let g = StopGradient::spectral();
        assert_eq!(g.sample(0.0), g.first());
        assert_eq!(g.sample(1.0), g.last());
        assert_eq!(g.sample(-3.0), g.first());
        assert_eq!(g.sample(1.0 / 19.0), Rgb8::new(119, 0, 136));
        assert_eq!(g.last(), Rgb8::new(204, 204, 204));
    }

    #[test]
    fn gradient_interpolates_between_stops() {
        let g = StopGradient::new(vec![(0.0, Rgb8::new(0, 0, 0)), (1.0, Rgb8::new(200, 100, 0))]);
        assert_eq!(g.sample(0.5), Rgb8::new(100, 50, 0));
    }

    #[test]
    fn small_schemes() {
        let names = |v: Vec<Color>| v.iter().map(|c| c.as_str().to_string()).collect::<Vec<_>>();
        assert_eq!(names(auto_color_scheme(1, None)), ["blue"]);
        assert_eq!(names(auto_color_scheme(2, None)), ["blue", "black"]);
        assert_eq!(names(auto_color_scheme(3, None)), ["blue", "red", "green"]);
        assert!(auto_color_scheme(0, None).is_empty());
    }

    #[test]
    fn spectral_schemes_have_no_repeats() {
        let g = StopGradient::spectral();
        for n in [8, 32, 41, 100] {
            let colors = auto_color_scheme(n, Some(&g as &dyn Gradient));
            let distinct: std::collections::HashSet<&Color> = colors.iter().collect();
            assert_eq!(distinct.len(), n, "n = {n}");
        }
    }

    #[test]
    fn large_scheme_without_gradient_cycles_palette() {
        let colors = auto_color_scheme(12, None);
        assert_eq!(colors[0].as_str(), "#1f77b4");
        assert_eq!(colors[10].as_str(), "#1f77b4");
    }
}
