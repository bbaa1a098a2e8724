//! qplot
//!
//! A matplotlib-style plotting API that builds plotly-compatible scene graphs.
//! Pairs with the `qplot` CLI.
//!
//! ### Features
//! - `plot`, `scatter`, `bar`, `hist`, `errorbar`, `fill_between`, `pie`,
//!   heatmaps and contours with matplotlib-like arguments and format strings
//! - Per-panel color cycles and automatic gradient coloring of many series
//! - Legends with the eleven matplotlib locations, one per subplot
//! - Export as a plotly.js HTML page, a JSON scene graph, or PNG/SVG images
//!
//! ### Example
//! ```no_run
//! use qplot::{ExportOptions, Figure, LegendConfig, LineOptions};
//!
//! let mut fig = Figure::subplots(1, 2);
//! let squares = LineOptions::default().fmt("ro--").label("squares");
//! fig.ax(0, 0)?
//!     .plot([vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 4.0]], squares)?
//!     .legend(LegendConfig::default().loc("upper left"));
//! fig.ax(0, 1)?.plot([vec![3.0, 2.0, 1.0]], LineOptions::default().label("down"))?;
//! fig.savefig("panels.png", ExportOptions::default())?;
//! # Ok::<(), qplot::PlotError>(())
//! ```

pub mod axes;
pub mod error;
pub mod export;
pub mod figure;
pub mod legend;
pub mod models;
pub mod options;
pub mod palette;
pub mod pyplot;
pub mod render;
pub mod style;

pub use axes::{Aspect, Axes, Which};
pub use error::{PlotError, Result};
pub use export::Format;
pub use figure::Figure;
pub use legend::{LegendConfig, Location};
pub use models::{Layout, Scene, Trace, TraceKind};
pub use options::{
    BarOptions, ContourOptions, ErrorBarOptions, ExportOptions, FigureOptions, FillOptions,
    HeatmapOptions, HistOptions, LineOptions, PieOptions, RefLineOptions, ScatterOptions,
    SpanOptions, StemOptions, TextOptions, TickOptions,
};
pub use palette::{ColorCycle, Gradient, StopGradient};
pub use pyplot::Pyplot;
pub use style::{Color, StyleSpec};
