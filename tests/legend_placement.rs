use qplot::legend::parse_panel_entries;
use qplot::models::Annotation;
use qplot::{Figure, LegendConfig, LineOptions, Location};

fn legend_annotations(fig: &mut Figure) -> Vec<Annotation> {
    fig.to_scene()
        .unwrap()
        .layout
        .annotations
        .into_iter()
        .filter(|a| !parse_panel_entries(&a.text).is_empty())
        .collect()
}

#[test]
fn names_and_codes_resolve() {
    assert_eq!(Location::resolve_name("lower right"), Location::LowerRight);
    assert_eq!(Location::resolve_name("CENTER"), Location::Center);
    assert_eq!("upper center".parse::<Location>().unwrap(), Location::UpperCenter);
    assert_eq!(Location::from_code(7), Location::CenterRight);
    assert_eq!(Location::resolve_name("somewhere else"), Location::UpperRight);
}

#[test]
fn every_location_stays_inside_the_panel() {
    for loc in Location::ALL {
        let p = loc.placement();
        assert!((0.0..=1.0).contains(&p.x), "{loc}");
        assert!((0.0..=1.0).contains(&p.y), "{loc}");
    }
}

#[test]
fn single_panel_uses_builtin_legend() {
    let mut fig = Figure::default();
    fig.gca()
        .plot([vec![1.0, 2.0]], LineOptions::default().label("a"))
        .unwrap()
        .legend(LegendConfig::default().loc("upper left").fontsize(9.0));
    let scene = fig.to_scene().unwrap();
    let legend = scene.layout.legend.unwrap();
    assert_eq!(legend.x, Some(0.02));
    assert_eq!(legend.y, Some(0.98));
    assert_eq!(legend.xanchor.as_deref(), Some("left"));
    assert_eq!(legend.yanchor.as_deref(), Some("top"));
    assert_eq!(legend.font.unwrap().size, Some(9.0));
    assert_eq!(scene.layout.showlegend, Some(true));
    assert!(legend_annotations(&mut fig).is_empty());
}

#[test]
fn hidden_legend_turns_showlegend_off() {
    let mut fig = Figure::default();
    fig.gca()
        .plot([vec![1.0, 2.0]], LineOptions::default().label("a"))
        .unwrap()
        .legend(LegendConfig::hidden());
    assert_eq!(fig.to_scene().unwrap().layout.showlegend, Some(false));
}

#[test]
fn grid_panels_get_their_own_legends() {
    let mut fig = Figure::subplots(2, 2);
    for row in 0..2 {
        for col in 0..2 {
            let label = format!("r{row}c{col}");
            fig.ax(row, col)
                .unwrap()
                .plot([vec![1.0, 2.0]], LineOptions::default().label(label))
                .unwrap();
        }
    }
    fig.ax(1, 1)
        .unwrap()
        .legend(LegendConfig::default().location(Location::LowerLeft));

    let scene = fig.to_scene().unwrap();
    assert_eq!(scene.layout.showlegend, Some(false));
    let legends = legend_annotations(&mut fig);
    assert_eq!(legends.len(), 4);

    for (i, ann) in legends.iter().enumerate() {
        let panel = &fig.panels()[i];
        let [x0, x1] = panel.x_domain();
        let [y0, y1] = panel.y_domain();
        assert!(ann.x >= x0 && ann.x <= x1, "legend {i} x outside its panel");
        assert!(ann.y >= y0 && ann.y <= y1, "legend {i} y outside its panel");
        assert_eq!(ann.xref, "paper");
        let entries = parse_panel_entries(&ann.text);
        assert_eq!(entries.len(), 1);
        let (row, col) = panel.position();
        assert_eq!(entries[0].0, format!("r{row}c{col}"));
    }
    assert_eq!(legends[3].xanchor.as_deref(), Some("left"));
    assert_eq!(legends[3].yanchor.as_deref(), Some("bottom"));
}

#[test]
fn unlabeled_and_hidden_panels_have_no_legend() {
    let mut fig = Figure::subplots(1, 3);
    fig.ax(0, 0)
        .unwrap()
        .plot([vec![1.0]], LineOptions::default().label("shown"))
        .unwrap();
    fig.ax(0, 1)
        .unwrap()
        .plot([vec![1.0]], LineOptions::default())
        .unwrap();
    fig.ax(0, 2)
        .unwrap()
        .plot([vec![1.0]], LineOptions::default().label("hidden"))
        .unwrap()
        .legend(LegendConfig::hidden());
    let legends = legend_annotations(&mut fig);
    assert_eq!(legends.len(), 1);
    assert_eq!(parse_panel_entries(&legends[0].text)[0].0, "shown");
}

#[test]
fn legend_entries_follow_final_colors() {
    let mut fig = Figure::subplots(1, 2);
    let ax = fig.ax(0, 0).unwrap();
    ax.plot([vec![1.0, 2.0]], LineOptions::default().label("first"))
        .unwrap();
    ax.plot([vec![2.0, 1.0]], LineOptions::default().label("second"))
        .unwrap();
    let legends = legend_annotations(&mut fig);
    let entries = parse_panel_entries(&legends[0].text);
    let colors: Vec<&str> = entries.iter().map(|(_, c)| c.as_str()).collect();
    assert_eq!(colors, ["blue", "black"]);
}

#[test]
fn frame_settings_reach_the_annotation() {
    let mut fig = Figure::subplots(1, 2);
    fig.ax(0, 1)
        .unwrap()
        .plot([vec![1.0]], LineOptions::default().label("x"))
        .unwrap()
        .legend(LegendConfig::default().frameon(false));
    let legends = legend_annotations(&mut fig);
    assert_eq!(legends[0].borderwidth, Some(0.0));
    assert_eq!(legends[0].bgcolor.as_ref().unwrap().alpha(), 0.0);
}
