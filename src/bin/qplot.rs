use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use qplot::{
    BarOptions, ExportOptions, Figure, LegendConfig, LineOptions, Location, Scene, ScatterOptions,
};

#[derive(Parser, Debug)]
#[command(
    name = "qplot",
    version,
    about = "Build matplotlib-style figures and export them as HTML, JSON, PNG or SVG"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-export a saved JSON scene in another format.
    Render(RenderArgs),
    /// Plot columns of a CSV file.
    Plot(PlotArgs),
    /// Print the legend locations and where they anchor.
    Locations,
}

#[derive(Args, Debug, Clone, Copy)]
struct SizeArgs {
    /// Image width in pixels (raster formats).
    #[arg(long)]
    width: Option<u32>,
    /// Image height in pixels (raster formats).
    #[arg(long)]
    height: Option<u32>,
    /// Pixel scale factor (raster formats).
    #[arg(long)]
    scale: Option<f64>,
}

impl SizeArgs {
    fn export_options(self) -> ExportOptions {
        ExportOptions {
            width: self.width,
            height: self.height,
            scale: self.scale,
        }
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Scene written earlier with `--out something.json`.
    scene: PathBuf,
    /// Output file; the suffix selects the format.
    #[arg(short, long)]
    out: PathBuf,
    #[command(flatten)]
    size: SizeArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Line,
    Scatter,
    Bar,
}

#[derive(Args, Debug)]
struct PlotArgs {
    /// CSV file with a header row.
    data: PathBuf,
    /// Column used for x; row numbers when omitted.
    #[arg(long)]
    x: Option<String>,
    /// Columns to plot, separated by comma or semicolon.
    #[arg(long)]
    y: String,
    /// matplotlib format string applied to every series (e.g. "ro--").
    #[arg(long)]
    fmt: Option<String>,
    #[arg(long, value_enum, default_value_t = Kind::Line)]
    kind: Kind,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    xlabel: Option<String>,
    #[arg(long)]
    ylabel: Option<String>,
    /// Legend location name (e.g. "upper left") or code 0-10.
    #[arg(long)]
    legend_loc: Option<String>,
    /// Output file; the suffix selects the format.
    #[arg(short, long)]
    out: PathBuf,
    #[command(flatten)]
    size: SizeArgs,
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn parse_location(s: &str) -> Location {
    match s.trim().parse::<u8>() {
        Ok(code) => Location::from_code(code),
        Err(_) => Location::resolve_name(s),
    }
}

/// Numeric columns of a CSV file, keyed by header. Empty cells become NaN.
fn read_columns(path: &Path) -> Result<HashMap<String, Vec<f64>>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("bad CSV record {}", line + 1))?;
        for (col, cell) in columns.iter_mut().zip(record.iter()) {
            col.push(cell.parse::<f64>().unwrap_or(f64::NAN));
        }
    }
    Ok(headers.into_iter().zip(columns).collect())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Plot(args) => cmd_plot(args),
        Command::Locations => {
            cmd_locations();
            Ok(())
        }
    }
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let scene = Scene::load(&args.scene)
        .with_context(|| format!("cannot read scene {}", args.scene.display()))?;
    scene
        .save(&args.out, args.size.export_options())
        .with_context(|| format!("cannot write {}", args.out.display()))?;
    eprintln!("Wrote {}", args.out.display());
    Ok(())
}

fn cmd_plot(args: PlotArgs) -> Result<()> {
    let columns = read_columns(&args.data)?;
    let names = parse_list(&args.y);
    if names.is_empty() {
        anyhow::bail!("--y needs at least one column");
    }
    let x = match &args.x {
        Some(name) => Some(
            columns
                .get(name)
                .with_context(|| format!("no column named {name:?}"))?
                .clone(),
        ),
        None => None,
    };

    let mut fig = Figure::default();
    let ax = fig.gca();
    for name in &names {
        let y = columns
            .get(name)
            .with_context(|| format!("no column named {name:?}"))?;
        let x = x
            .clone()
            .unwrap_or_else(|| (0..y.len()).map(|i| i as f64).collect());
        debug!("series {name}: {} points", y.len());
        match args.kind {
            Kind::Line => {
                let mut opts = LineOptions::default().label(name.as_str());
                if let Some(fmt) = &args.fmt {
                    opts = opts.fmt(fmt.as_str());
                }
                ax.plot([x, y.clone()], opts)?;
            }
            Kind::Scatter => {
                ax.scatter(&x, y, ScatterOptions::default().label(name.as_str()));
            }
            Kind::Bar => {
                ax.bar(&x, y, BarOptions::default().label(name.as_str()));
            }
        }
    }
    if let Some(title) = &args.title {
        ax.title(title, None);
    }
    if let Some(label) = &args.xlabel {
        ax.xlabel(label, None);
    } else if let Some(name) = &args.x {
        ax.xlabel(name, None);
    }
    if let Some(label) = &args.ylabel {
        ax.ylabel(label, None);
    }
    if let Some(loc) = &args.legend_loc {
        ax.legend(LegendConfig::default().location(parse_location(loc)));
    }

    fig.savefig(&args.out, args.size.export_options())
        .with_context(|| format!("cannot write {}", args.out.display()))?;
    eprintln!(
        "Plotted {} series from {} to {}",
        names.len(),
        args.data.display(),
        args.out.display()
    );
    Ok(())
}

fn cmd_locations() {
    for (code, loc) in Location::ALL.iter().enumerate() {
        let p = loc.placement();
        println!(
            "{code:>2}  {:<13} x={:.2} y={:.2} anchor={}/{}",
            loc.name(),
            p.x,
            p.y,
            p.xanchor.as_str(),
            p.yanchor.as_str()
        );
    }
}
