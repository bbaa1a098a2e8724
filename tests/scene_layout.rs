use qplot::legend::parse_panel_entries;
use qplot::{Figure, FigureOptions, LineOptions};
use serde_json::json;

#[test]
fn twin_axis_overlays_its_parent() {
    let mut fig = Figure::default();
    fig.gca()
        .plot([vec![1.0, 2.0, 3.0]], LineOptions::default().label("left"))
        .unwrap();
    fig.twinx(0, 0)
        .unwrap()
        .plot([vec![100.0, 50.0, 10.0]], LineOptions::default().label("right"))
        .unwrap()
        .ylabel("right scale", None);

    let scene = fig.to_scene().unwrap();
    assert_eq!(scene.data[1].xaxis.as_deref(), Some("x"));
    assert_eq!(scene.data[1].yaxis.as_deref(), Some("y2"));
    let y2 = &scene.layout.axes["yaxis2"];
    assert_eq!(y2.overlaying.as_deref(), Some("y"));
    assert_eq!(y2.side.as_deref(), Some("right"));
    assert_eq!(y2.title.as_ref().unwrap().text, "right scale");
}

#[test]
fn twin_panels_keep_their_own_color_cycle() {
    let mut fig = Figure::default();
    fig.gca().plot([vec![1.0]], LineOptions::default()).unwrap();
    fig.gca().plot([vec![2.0]], LineOptions::default()).unwrap();
    fig.twinx(0, 0)
        .unwrap()
        .plot([vec![3.0]], LineOptions::default())
        .unwrap();
    let scene = fig.to_scene().unwrap();
    let colors: Vec<&str> = scene
        .data
        .iter()
        .map(|t| t.display_color().unwrap().as_str())
        .collect();
    assert_eq!(colors, ["blue", "black", "blue"]);
}

#[test]
fn twin_entries_join_the_parent_legend() {
    let mut fig = Figure::subplots(1, 2);
    fig.ax(0, 1)
        .unwrap()
        .plot([vec![1.0]], LineOptions::default().label("price"))
        .unwrap();
    fig.twinx(0, 1)
        .unwrap()
        .plot([vec![2.0]], LineOptions::default().label("volume"))
        .unwrap();
    let scene = fig.to_scene().unwrap();
    assert!(scene.layout.axes.contains_key("yaxis3"));
    let legends: Vec<_> = scene
        .layout
        .annotations
        .iter()
        .map(|a| parse_panel_entries(&a.text))
        .filter(|e| !e.is_empty())
        .collect();
    assert_eq!(legends.len(), 1);
    let labels: Vec<&str> = legends[0].iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(labels, ["price", "volume"]);
}

#[test]
fn grid_axes_are_anchored_and_shared() {
    let mut fig = Figure::new(FigureOptions::grid(2, 1).sharex(true));
    fig.ax(1, 0)
        .unwrap()
        .plot([vec![1.0, 2.0]], LineOptions::default())
        .unwrap();
    let scene = fig.to_scene().unwrap();
    let x2 = &scene.layout.axes["xaxis2"];
    assert_eq!(x2.anchor.as_deref(), Some("y2"));
    assert_eq!(x2.matches.as_deref(), Some("x"));
    assert_eq!(scene.layout.axes["xaxis"].matches, None);
    let top = scene.layout.axes["yaxis"].domain.unwrap();
    let bottom = scene.layout.axes["yaxis2"].domain.unwrap();
    assert!(top[0] > bottom[1]);
}

#[test]
fn titles_in_a_grid_become_annotations() {
    let mut fig = Figure::new(FigureOptions::grid(1, 2).subplot_titles(["left", ""]));
    fig.ax(0, 1).unwrap().title("right", Some(11.0));
    fig.suptitle("Overview", None);
    let scene = fig.to_scene().unwrap();
    assert_eq!(scene.layout.title.unwrap().text, "Overview");
    let texts: Vec<&str> = scene
        .layout
        .annotations
        .iter()
        .map(|a| a.text.as_str())
        .collect();
    assert_eq!(texts, ["left", "right"]);
    assert_eq!(scene.layout.annotations[1].font.as_ref().unwrap().size, Some(11.0));
}

#[test]
fn single_panel_title_is_the_figure_title() {
    let mut fig = Figure::default();
    fig.gca().title("Alone", None);
    let scene = fig.to_scene().unwrap();
    assert_eq!(scene.layout.title.unwrap().text, "Alone");
    assert!(scene.layout.annotations.is_empty());
}

#[test]
fn log_limits_are_exported_as_exponents() {
    let mut fig = Figure::default();
    fig.gca()
        .plot([vec![1.0, 10.0, 100.0]], LineOptions::default())
        .unwrap()
        .yscale("log")
        .ylim(1.0, 100.0);
    let json = serde_json::to_value(fig.to_scene().unwrap()).unwrap();
    assert_eq!(json["layout"]["yaxis"]["type"], "log");
    assert_eq!(json["layout"]["yaxis"]["range"], json!([0.0, 2.0]));
}

#[test]
fn passthrough_layout_wins() {
    let mut fig = Figure::default();
    fig.tight_layout();
    let attrs = json!({"hovermode": "x unified", "margin": {"l": 10.0}})
        .as_object()
        .cloned()
        .unwrap();
    fig.update_layout(attrs);
    let scene = fig.to_scene().unwrap();
    assert_eq!(scene.layout.extra["hovermode"], "x unified");
    let margin = scene.layout.margin.unwrap();
    assert_eq!((margin.l, margin.r, margin.t, margin.b), (10.0, 40.0, 60.0, 60.0));
}

#[test]
fn figsize_is_in_inches() {
    let mut fig = Figure::new(FigureOptions::default().figsize(8.0, 4.5));
    let scene = fig.to_scene().unwrap();
    assert_eq!(scene.layout.width, Some(800.0));
    assert_eq!(scene.layout.height, Some(450.0));
}
