use std::fs;

use qplot::{
    BarOptions, ContourOptions, ErrorBarOptions, ExportOptions, Figure, FillOptions,
    HeatmapOptions, HistOptions, LegendConfig, LineOptions, PieOptions, PlotError, RefLineOptions,
    Scene, ScatterOptions, SpanOptions, TextOptions,
};
use tempfile::tempdir;

fn busy_figure() -> Figure {
    let mut fig = Figure::subplots(2, 2);
    fig.suptitle("Everything at once", None);

    let xs: Vec<f64> = (0..30).map(|i| i as f64 / 3.0).collect();
    let ys: Vec<f64> = xs.iter().map(|x| x.sin()).collect();
    let ax = fig.ax(0, 0).unwrap();
    ax.plot([xs.clone(), ys.clone()], LineOptions::default().fmt("r--").label("sin"))
        .unwrap();
    ax.fill_between(&xs, &ys, -1.0, FillOptions::default().label("area"));
    ax.errorbar(
        &[1.0, 2.0, 3.0],
        &[0.5, -0.2, 0.1],
        ErrorBarOptions::default().yerr(vec![0.1, 0.2, 0.1]).label("obs"),
    );
    ax.axhline(0.0, RefLineOptions::default().linestyle(":"));
    ax.axvspan(2.0, 4.0, SpanOptions::default().alpha(0.2));
    ax.annotate("peak", (1.5, 1.0), Some((4.0, 1.5)), TextOptions::default());
    ax.xlabel("t", None).ylabel("value", None);
    ax.legend(LegendConfig::default().loc("lower left"));

    let ax = fig.ax(0, 1).unwrap();
    ax.bar(&[1.0, 2.0, 3.0], &[3.0, 5.0, 2.0], BarOptions::default().label("a"));
    ax.bar(&[1.0, 2.0, 3.0], &[2.0, 1.0, 4.0], BarOptions::default().label("b"));
    ax.scatter(
        &[1.0, 2.0, 3.0],
        &[4.0, 4.5, 5.0],
        ScatterOptions::default().values(vec![1.0, 2.0, 3.0]).colorbar(true),
    );
    fig.twinx(0, 1)
        .unwrap()
        .plot([vec![10.0, 30.0, 20.0]], LineOptions::default().label("twin"))
        .unwrap();

    let z: Vec<Vec<f64>> = (0..8)
        .map(|r| (0..10).map(|c| ((r * c) as f64).sqrt()).collect())
        .collect();
    let ax = fig.ax(1, 0).unwrap();
    ax.contourf(
        &(0..10).map(f64::from).collect::<Vec<_>>(),
        &(0..8).map(f64::from).collect::<Vec<_>>(),
        &z,
        ContourOptions::default(),
    );
    ax.contour(
        &(0..10).map(f64::from).collect::<Vec<_>>(),
        &(0..8).map(f64::from).collect::<Vec<_>>(),
        &z,
        ContourOptions::default().colorbar(false),
    );

    let ax = fig.ax(1, 1).unwrap();
    ax.hist(
        &[1.0, 2.0, 2.5, 3.0, 3.1, 3.2, 4.0, 7.0],
        HistOptions::default().density(true).label("hist"),
    );
    ax.yscale("log");
    fig
}

#[test]
fn json_export_reloads_to_the_same_scene() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene.json");
    let mut fig = busy_figure();
    fig.savefig(&path, ExportOptions::default()).unwrap();
    let loaded = Scene::load(&path).unwrap();
    let series: Vec<usize> = fig.to_scene().unwrap().data.iter().map(|t| t.series).collect();
    assert_eq!(loaded.data.iter().map(|t| t.series).collect::<Vec<_>>(), series);
    // fill_between emits its bound and its fill as one series
    assert_eq!(series[1], series[2]);
    assert_eq!(
        serde_json::to_value(&loaded).unwrap(),
        serde_json::to_value(fig.to_scene().unwrap()).unwrap()
    );
}

#[test]
fn html_export_embeds_plotly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("figure.HTML");
    busy_figure()
        .savefig(&path, ExportOptions::default())
        .unwrap();
    let html = fs::read_to_string(&path).unwrap();
    assert!(html.contains("Plotly.newPlot"));
    assert!(html.contains("Everything at once"));
}

#[test]
fn png_export_writes_an_image_of_the_requested_size() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("figure.png");
    busy_figure()
        .savefig(&path, ExportOptions::size(400, 300).scale(2.0))
        .unwrap();
    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    assert_eq!((width, height), (800, 600));
}

#[test]
fn svg_export_draws_shapes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("figure.svg");
    busy_figure()
        .savefig(&path, ExportOptions::default())
        .unwrap();
    let svg = fs::read_to_string(&path).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("width=\"700\""));
    assert!(svg.contains("<polygon") || svg.contains("<rect"));
}

#[test]
fn pie_and_heatmap_render() {
    let dir = tempdir().unwrap();
    let mut fig = Figure::subplots(1, 2);
    fig.ax(0, 0).unwrap().pie(
        &[30.0, 20.0, 50.0],
        PieOptions::default()
            .labels(vec!["a".to_string(), "b".to_string(), "c".to_string()])
            .explode(vec![0.0, 0.1, 0.0])
            .autopct(true),
    );
    fig.ax(0, 1).unwrap().imshow(
        &[vec![1.0, 2.0], vec![3.0, f64::NAN]],
        HeatmapOptions::default(),
    );
    for name in ["pie.png", "pie.svg"] {
        let path = dir.path().join(name);
        fig.savefig(&path, ExportOptions::default()).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0, "{name} is empty");
    }
}

#[test]
fn empty_figure_still_renders() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.png");
    Figure::default()
        .savefig(&path, ExportOptions::default())
        .unwrap();
    assert!(path.exists());
}

#[test]
fn unknown_suffix_is_rejected_before_writing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("figure.pdf");
    let err = busy_figure()
        .savefig(&path, ExportOptions::default())
        .unwrap_err();
    assert!(matches!(err, PlotError::UnsupportedFormat(_)));
    assert!(!path.exists());
}
