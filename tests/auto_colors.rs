use qplot::{Color, Figure, Gradient, LineOptions, ScatterOptions, StopGradient};

fn line_colors(fig: &mut Figure) -> Vec<String> {
    fig.to_scene()
        .unwrap()
        .data
        .iter()
        .map(|t| t.display_color().unwrap().as_str().to_string())
        .collect()
}

fn plot_n(fig: &mut Figure, n: usize) {
    for i in 0..n {
        fig.gca()
            .plot([vec![0.0, i as f64]], LineOptions::default())
            .unwrap();
    }
}

#[test]
fn one_series_is_blue() {
    let mut fig = Figure::default();
    plot_n(&mut fig, 1);
    assert_eq!(line_colors(&mut fig), ["blue"]);
}

#[test]
fn two_series_are_blue_and_black() {
    let mut fig = Figure::default();
    plot_n(&mut fig, 2);
    assert_eq!(line_colors(&mut fig), ["blue", "black"]);
}

#[test]
fn three_and_four_series_use_fixed_palette() {
    let mut fig = Figure::default();
    plot_n(&mut fig, 3);
    assert_eq!(line_colors(&mut fig), ["blue", "red", "green"]);

    let mut fig = Figure::default();
    plot_n(&mut fig, 4);
    assert_eq!(line_colors(&mut fig), ["blue", "red", "green", "black"]);
}

#[test]
fn many_series_span_the_gradient() {
    let mut fig = Figure::default();
    plot_n(&mut fig, 6);
    let colors = line_colors(&mut fig);
    let spectral = StopGradient::spectral();
    assert_eq!(colors[0], Color::from(spectral.first()).as_str());
    assert_eq!(colors[5], Color::from(spectral.last()).as_str());
    assert_eq!(colors[2], Color::from(spectral.sample(0.4)).as_str());
}

#[test]
fn without_gradient_many_series_cycle_the_palette() {
    let mut fig = Figure::default();
    fig.set_gradient(None);
    plot_n(&mut fig, 5);
    let colors = line_colors(&mut fig);
    assert_eq!(colors[0], "#1f77b4");
    assert_eq!(colors[1], "#ff7f0e");
}

#[test]
fn explicit_colors_are_left_alone() {
    let mut fig = Figure::default();
    fig.gca()
        .plot([vec![1.0, 2.0]], LineOptions::default().color("orange"))
        .unwrap();
    fig.gca()
        .plot([vec![1.0, 2.0], vec![3.0, 4.0]], LineOptions::default().fmt("--"))
        .unwrap();
    fig.gca()
        .plot([vec![2.0, 1.0]], LineOptions::default().fmt("m:"))
        .unwrap();
    fig.gca()
        .plot([vec![5.0, 1.0]], LineOptions::default())
        .unwrap();
    assert_eq!(line_colors(&mut fig), ["orange", "blue", "magenta", "black"]);
}

#[test]
fn panels_color_independently() {
    let mut fig = Figure::subplots(1, 2);
    fig.ax(0, 0)
        .unwrap()
        .plot([vec![1.0, 2.0]], LineOptions::default())
        .unwrap();
    fig.ax(0, 0)
        .unwrap()
        .plot([vec![2.0, 1.0]], LineOptions::default())
        .unwrap();
    fig.ax(0, 1)
        .unwrap()
        .scatter(&[1.0], &[1.0], ScatterOptions::default());
    assert_eq!(line_colors(&mut fig), ["blue", "black", "blue"]);
}

#[test]
fn recoloring_is_repeatable() {
    let mut fig = Figure::default();
    plot_n(&mut fig, 2);
    let first = line_colors(&mut fig);
    assert_eq!(line_colors(&mut fig), first);
    plot_n(&mut fig, 1);
    assert_eq!(line_colors(&mut fig), ["blue", "red", "green"]);
}
