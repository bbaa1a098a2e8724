//! Colors, axis scales, and tick generation for the raster renderer.

use num_format::{Locale, ToFormattedString};
use plotters::style::RGBAColor;

use crate::models::AxisLayout;
use crate::palette::{Gradient, StopGradient, named_gradient};
use crate::style::{Color, Rgb8};

pub(crate) const GRAY: RGBAColor = RGBAColor(128, 128, 128, 1.0);
pub(crate) const BLACK: RGBAColor = RGBAColor(0, 0, 0, 1.0);

/// Scene color to a plotters color; unparseable spellings draw gray.
pub(crate) fn to_rgba(color: &Color) -> RGBAColor {
    color
        .to_rgba()
        .map(|c| RGBAColor(c.r, c.g, c.b, c.a))
        .unwrap_or(GRAY)
}

pub(crate) fn rgb8_to_rgba(c: Rgb8) -> RGBAColor {
    RGBAColor(c.r, c.g, c.b, 1.0)
}

pub(crate) fn with_alpha(c: RGBAColor, alpha: f64) -> RGBAColor {
    RGBAColor(c.0, c.1, c.2, (c.3 * alpha).clamp(0.0, 1.0))
}

/// Colorscale by name; viridis when unnamed or unknown.
pub(crate) fn colorscale(name: Option<&str>) -> StopGradient {
    name.and_then(named_gradient)
        .unwrap_or_else(StopGradient::viridis)
}

/// Color of `v` on a `[lo, hi]` colorscale.
pub(crate) fn scale_color(g: &dyn Gradient, v: f64, lo: f64, hi: f64) -> RGBAColor {
    let t = if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };
    rgb8_to_rgba(g.sample(t))
}

/// Finite min/max of a value set.
pub(crate) fn min_max(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// 1, 2 or 5 times a power of ten, close to `span / target`.
pub(crate) fn nice_step(span: f64, target: usize) -> f64 {
    let raw = span / target.max(1) as f64;
    if !(raw.is_finite() && raw > 0.0) {
        return 1.0;
    }
    let mag = 10f64.powf(raw.log10().floor());
    let norm = raw / mag;
    let nice = if norm < 1.5 {
        1.0
    } else if norm < 3.0 {
        2.0
    } else if norm < 7.0 {
        5.0
    } else {
        10.0
    };
    nice * mag
}

/// Round-numbered ticks covering `[lo, hi]`.
pub(crate) fn nice_ticks(lo: f64, hi: f64, target: usize) -> (Vec<f64>, f64) {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if !(hi > lo) {
        return (vec![lo], 1.0);
    }
    let step = nice_step(hi - lo, target);
    let start = (lo / step).ceil() * step;
    let eps = step * 1e-9;
    let ticks = (0..)
        .map(|k| start + k as f64 * step)
        .take_while(|v| *v <= hi + eps)
        .take(200)
        .map(|v| if v.abs() < eps { 0.0 } else { v })
        .collect();
    (ticks, step)
}

/// Tick label: whole numbers with thousands separators, otherwise as many
/// decimals as the tick step needs.
pub(crate) fn format_tick(v: f64, step: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        return (v as i64).to_formatted_string(&Locale::en);
    }
    let decimals = if step > 0.0 {
        (-step.log10().floor()).clamp(0.0, 8.0) as usize
    } else {
        2
    };
    format!("{v:.decimals$}")
}

/// Mapping of one axis from data values onto `[0, 1]` of its panel.
///
/// For log axes `lo` and `hi` are base-10 exponents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisScale {
    pub lo: f64,
    pub hi: f64,
    pub log: bool,
    pub reversed: bool,
}

impl AxisScale {
    /// Axis built from a layout object and the data values plotted on it.
    pub fn build(layout: Option<&AxisLayout>, values: &[f64], pad: bool) -> Self {
        let log = layout.is_some_and(AxisLayout::is_log);
        let reversed = layout.is_some_and(AxisLayout::is_reversed);
        if let Some([lo, hi]) = layout.and_then(|l| l.range)
            && lo.is_finite()
            && hi.is_finite()
            && lo != hi
        {
            return AxisScale {
                lo,
                hi,
                log,
                reversed,
            };
        }
        let transformed = values.iter().filter_map(|&v| forward(v, log));
        let (mut lo, mut hi) = min_max(transformed).unwrap_or((0.0, 1.0));
        if (hi - lo).abs() < f64::EPSILON {
            lo -= 1.0;
            hi += 1.0;
        } else if pad {
            let margin = (hi - lo) * 0.05;
            lo -= margin;
            hi += margin;
        }
        AxisScale {
            lo,
            hi,
            log,
            reversed,
        }
    }

    /// Fraction of the panel for data value `v`; `None` when `v` cannot be
    /// placed (NaN, or non-positive on a log axis).
    pub fn fraction(&self, v: f64) -> Option<f64> {
        let t = (forward(v, self.log)? - self.lo) / (self.hi - self.lo);
        Some(if self.reversed { 1.0 - t } else { t })
    }

    /// `(data value, label)` ticks, honoring explicit tick values and text.
    pub fn ticks(&self, layout: Option<&AxisLayout>, target: usize) -> Vec<(f64, String)> {
        if let Some(vals) = layout.and_then(|l| l.tickvals.as_ref()) {
            let text = layout.and_then(|l| l.ticktext.as_ref());
            let step = nice_step((self.hi - self.lo).abs(), target);
            return vals
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    let label = text
                        .and_then(|t| t.get(i).cloned())
                        .unwrap_or_else(|| format_tick(v, step));
                    (v, label)
                })
                .collect();
        }
        if self.log {
            let (lo, hi) = (self.lo.min(self.hi), self.lo.max(self.hi));
            let decades: Vec<f64> = ((lo.ceil() as i64)..=(hi.floor() as i64))
                .map(|e| e as f64)
                .collect();
            if decades.len() >= 2 {
                return decades
                    .into_iter()
                    .map(|e| {
                        let v = 10f64.powf(e);
                        (v, format_tick(v, v))
                    })
                    .collect();
            }
            let (exps, _) = nice_ticks(lo, hi, target);
            return exps
                .into_iter()
                .map(|e| {
                    let v = 10f64.powf(e);
                    (v, format!("{v:.3}"))
                })
                .collect();
        }
        let (ticks, step) = nice_ticks(self.lo, self.hi, target);
        ticks.into_iter().map(|v| (v, format_tick(v, step))).collect()
    }
}

fn forward(v: f64, log: bool) -> Option<f64> {
    if !v.is_finite() {
        return None;
    }
    if log {
        (v > 0.0).then(|| v.log10())
    } else {
        Some(v)
    }
}

/// Split an axis reference into its layout key: `x2` → `xaxis2`,
/// `y domain` → `yaxis`.
pub(crate) fn ref_to_key(reference: &str) -> Option<String> {
    let base = reference.split_whitespace().next()?;
    let mut chars = base.chars();
    let letter = chars.next().filter(|c| *c == 'x' || *c == 'y')?;
    let number = chars.as_str();
    Some(format!("{letter}axis{number}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AxisType;

    #[test]
    fn nice_ticks_cover_range() {
        let (ticks, step) = nice_ticks(0.0, 10.0, 5);
        assert_eq!(step, 2.0);
        assert_eq!(ticks, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn tick_labels_use_separators() {
        assert_eq!(format_tick(30000.0, 10000.0), "30,000");
        assert_eq!(format_tick(0.25, 0.05), "0.25");
    }

    #[test]
    fn log_scale_uses_exponents() {
        let layout = AxisLayout {
            scale: Some(AxisType::Log),
            ..Default::default()
        };
        let s = AxisScale::build(Some(&layout), &[1.0, 1000.0], false);
        assert_eq!((s.lo, s.hi), (0.0, 3.0));
        assert_eq!(s.fraction(10.0), Some(1.0 / 3.0));
        assert_eq!(s.fraction(-1.0), None);
        let labels: Vec<String> = s.ticks(Some(&layout), 5).into_iter().map(|t| t.1).collect();
        assert_eq!(labels, ["1", "10", "100", "1,000"]);
    }

    #[test]
    fn reversed_axis_flips_fraction() {
        let layout = AxisLayout {
            autorange: Some("reversed".into()),
            range: Some([0.0, 10.0]),
            ..Default::default()
        };
        let s = AxisScale::build(Some(&layout), &[], true);
        assert!((s.fraction(2.0).unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn axis_refs_map_to_keys() {
        assert_eq!(ref_to_key("x").as_deref(), Some("xaxis"));
        assert_eq!(ref_to_key("y3 domain").as_deref(), Some("yaxis3"));
        assert_eq!(ref_to_key("paper"), None);
    }
}
