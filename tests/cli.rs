use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const DATA: &str = "year,north,south\n2000,1.5,2.0\n2001,2.5,1.0\n2002,3.0,\n";

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("qplot").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("qplot"));
}

#[test]
fn locations_lists_every_code() {
    let mut cmd = Command::cargo_bin("qplot").unwrap();
    cmd.arg("locations");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("upper left"))
        .stdout(predicate::str::contains("10  center"));
}

#[test]
fn plot_csv_columns_to_svg_and_json() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("data.csv");
    fs::write(&csv, DATA).unwrap();

    let svg = dir.path().join("out.svg");
    Command::cargo_bin("qplot")
        .unwrap()
        .arg("plot")
        .arg(&csv)
        .args(["--x", "year", "--y", "north;south", "--title", "Rain"])
        .args(["--legend-loc", "2", "--out"])
        .arg(&svg)
        .assert()
        .success()
        .stderr(predicate::str::contains("Plotted 2 series"));
    assert!(fs::read_to_string(&svg).unwrap().starts_with("<svg"));

    let json = dir.path().join("out.json");
    Command::cargo_bin("qplot")
        .unwrap()
        .arg("plot")
        .arg(&csv)
        .args(["--y", "north", "--kind", "bar", "--out"])
        .arg(&json)
        .assert()
        .success();
    let scene: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(scene["data"][0]["type"], "bar");
    assert_eq!(scene["data"][0]["x"], serde_json::json!([0.0, 1.0, 2.0]));
}

#[test]
fn render_reexports_a_saved_scene() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("data.csv");
    fs::write(&csv, DATA).unwrap();
    let json = dir.path().join("scene.json");
    Command::cargo_bin("qplot")
        .unwrap()
        .arg("plot")
        .arg(&csv)
        .args(["--y", "north", "--out"])
        .arg(&json)
        .assert()
        .success();

    let html = dir.path().join("scene.html");
    Command::cargo_bin("qplot")
        .unwrap()
        .arg("render")
        .arg(&json)
        .arg("--out")
        .arg(&html)
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote"));
    assert!(fs::read_to_string(&html).unwrap().contains("Plotly.newPlot"));
}

#[test]
fn missing_column_fails() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("data.csv");
    fs::write(&csv, DATA).unwrap();
    Command::cargo_bin("qplot")
        .unwrap()
        .arg("plot")
        .arg(&csv)
        .args(["--y", "east", "--out"])
        .arg(dir.path().join("out.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no column named"));
}
