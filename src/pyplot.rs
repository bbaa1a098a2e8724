//! A current-figure context for quick scripts.
//!
//! [`Pyplot`] keeps one figure around and forwards the common plotting calls
//! to its current panel, creating a single-panel figure on first use.
//!
//! ```
//! use qplot::{LineOptions, Pyplot};
//!
//! let mut plt = Pyplot::new();
//! plt.plot([vec![0.0, 1.0, 4.0]], LineOptions::default().label("y"))?;
//! plt.title("Quick look");
//! plt.xlabel("t");
//! assert_eq!(plt.gcf().to_scene()?.data.len(), 1);
//! # Ok::<(), qplot::PlotError>(())
//! ```

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::axes::{Axes, Which};
use crate::error::Result;
use crate::figure::Figure;
use crate::legend::LegendConfig;
use crate::options::{
    BarOptions, ExportOptions, FigureOptions, HistOptions, LineOptions, PlotArg, ScatterOptions,
};

#[derive(Default)]
pub struct Pyplot {
    current: Option<Figure>,
}

impl Pyplot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current figure, created on first use.
    pub fn gcf(&mut self) -> &mut Figure {
        self.current.get_or_insert_with(Figure::default)
    }

    /// Current panel of the current figure.
    pub fn gca(&mut self) -> &mut Axes {
        self.gcf().gca()
    }

    /// Start a new figure, discarding the current one.
    pub fn figure(&mut self, opts: FigureOptions) -> &mut Figure {
        self.current.insert(Figure::new(opts))
    }

    /// Start a new `nrows` × `ncols` figure.
    pub fn subplots(&mut self, nrows: usize, ncols: usize) -> &mut Figure {
        self.figure(FigureOptions::grid(nrows, ncols))
    }

    pub fn plot<A: Into<PlotArg>>(
        &mut self,
        args: impl IntoIterator<Item = A>,
        opts: LineOptions,
    ) -> Result<&mut Axes> {
        self.gca().plot(args, opts)
    }

    pub fn scatter(&mut self, x: &[f64], y: &[f64], opts: ScatterOptions) -> &mut Axes {
        self.gca().scatter(x, y, opts)
    }

    pub fn bar(&mut self, x: &[f64], heights: &[f64], opts: BarOptions) -> &mut Axes {
        self.gca().bar(x, heights, opts)
    }

    pub fn hist(&mut self, values: &[f64], opts: HistOptions) -> &mut Axes {
        self.gca().hist(values, opts)
    }

    pub fn xlabel(&mut self, label: &str) -> &mut Axes {
        self.gca().xlabel(label, None)
    }

    pub fn ylabel(&mut self, label: &str) -> &mut Axes {
        self.gca().ylabel(label, None)
    }

    pub fn title(&mut self, label: &str) -> &mut Axes {
        self.gca().title(label, None)
    }

    pub fn xlim(&mut self, lo: f64, hi: f64) -> &mut Axes {
        self.gca().xlim(lo, hi)
    }

    pub fn ylim(&mut self, lo: f64, hi: f64) -> &mut Axes {
        self.gca().ylim(lo, hi)
    }

    pub fn legend(&mut self, config: LegendConfig) -> &mut Axes {
        self.gca().legend(config)
    }

    pub fn grid(&mut self, visible: bool) -> &mut Axes {
        self.gca().grid(visible, Which::Both)
    }

    pub fn savefig(&mut self, path: impl AsRef<Path>, opts: ExportOptions) -> Result<()> {
        self.gcf().savefig(path, opts)
    }

    /// Write the current figure as an HTML document to a temporary file that
    /// outlives the call, return its path, and start over with no figure.
    pub fn show(&mut self) -> Result<PathBuf> {
        let html = self.gcf().to_html()?;
        let file = tempfile::Builder::new()
            .prefix("qplot-")
            .suffix(".html")
            .tempfile()?;
        std::fs::write(file.path(), html)?;
        let (_, path) = file.keep().map_err(|e| e.error)?;
        info!("figure written to {}", path.display());
        self.close();
        Ok(path)
    }

    /// Drop the current figure.
    pub fn close(&mut self) {
        if self.current.take().is_some() {
            debug!("closed current figure");
        }
    }

    /// Whether a figure is open.
    pub fn has_figure(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcf_creates_single_panel_figure() {
        let mut plt = Pyplot::new();
        assert!(!plt.has_figure());
        assert!(!plt.gcf().is_grid());
        assert!(plt.has_figure());
    }

    #[test]
    fn subplots_replace_current_figure() {
        let mut plt = Pyplot::new();
        plt.plot([vec![1.0, 2.0]], LineOptions::default()).unwrap();
        plt.subplots(2, 1);
        assert_eq!(plt.gcf().nrows(), 2);
        assert_eq!(plt.gcf().to_scene().unwrap().data.len(), 0);
    }

    #[test]
    fn close_discards_figure() {
        let mut plt = Pyplot::new();
        plt.bar(&[0.0, 1.0], &[3.0, 4.0], BarOptions::default());
        plt.close();
        assert!(!plt.has_figure());
    }
}
