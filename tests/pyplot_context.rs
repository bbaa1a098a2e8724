use std::fs;

use qplot::{ExportOptions, HistOptions, LegendConfig, LineOptions, Pyplot, Scene};
use tempfile::tempdir;

#[test]
fn show_writes_html_and_starts_over() {
    let mut plt = Pyplot::new();
    plt.plot([vec![1.0, 4.0, 9.0]], LineOptions::default().label("squares"))
        .unwrap();
    plt.title("Shown");
    let path = plt.show().unwrap();

    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("html"));
    let html = fs::read_to_string(&path).unwrap();
    assert!(html.contains("squares"));
    assert!(!plt.has_figure());
    fs::remove_file(path).unwrap();
}

#[test]
fn calls_accumulate_on_the_current_axes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("current.json");

    let mut plt = Pyplot::new();
    plt.plot([vec![0.0, 1.0], vec![1.0, 0.0]], LineOptions::default().label("down"))
        .unwrap();
    plt.hist(&[1.0, 1.5, 2.0], HistOptions::default().bins(3usize).label("counts"));
    plt.xlabel("x");
    plt.ylim(0.0, 2.0);
    plt.legend(LegendConfig::default().loc("center"));
    plt.savefig(&path, ExportOptions::default()).unwrap();

    let scene = Scene::load(&path).unwrap();
    assert_eq!(scene.data.len(), 2);
    assert_eq!(scene.layout.axes["xaxis"].title.as_ref().unwrap().text, "x");
    assert_eq!(scene.layout.axes["yaxis"].range, Some([0.0, 2.0]));
    assert_eq!(scene.layout.legend.unwrap().x, Some(0.5));
    assert!(plt.has_figure());
}

#[test]
fn subplots_target_the_first_panel() {
    let mut plt = Pyplot::new();
    plt.subplots(1, 2);
    plt.plot([vec![1.0]], LineOptions::default()).unwrap();
    let fig = plt.gcf();
    assert_eq!(fig.panels()[0].traces().len(), 1);
    assert!(fig.panels()[1].traces().is_empty());
}
