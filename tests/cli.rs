mod common;

use assert_cmd::Command;
use predicates::{prelude::*, str::contains};
use serde_json::Value as JsonValue;

use common::{TestWorkspace, fixture_path};

const NETFLIX_CSV: &str = "Show ID,Type,Release Year,Country\n\
                           s1,Movie,2020,France\n\
                           s2,TV Show,2020,France\n\
                           s3,Movie,2021,USA\n";

fn csv_insight() -> Command {
    Command::cargo_bin("csv-insight").expect("binary exists")
}

#[test]
fn dashboard_prints_netflix_kpis() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("titles.csv", NETFLIX_CSV);
    csv_insight()
        .args(["dashboard", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Dataset: NETFLIX"))
        .stdout(contains("movie_percentage"))
        .stdout(contains("66.67"))
        .stdout(contains("France"))
        .stdout(contains("Cinema"))
        .stdout(contains("Years: all, 2021, 2020"));
}

#[test]
fn dashboard_json_is_machine_readable() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("titles.csv", NETFLIX_CSV);
    let output = csv_insight()
        .args([
            "dashboard",
            "-i",
            input.to_str().unwrap(),
            "--year",
            "2021",
            "--format",
            "json",
        ])
        .output()
        .expect("run dashboard");
    assert!(output.status.success());
    let report: JsonValue = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["domain"], "NETFLIX");
    let total = report["kpis"]
        .as_array()
        .and_then(|kpis| kpis.iter().find(|kpi| kpi["name"] == "total_titles"))
        .expect("total KPI");
    assert_eq!(total["value"], 1);
}

#[test]
fn dashboard_reports_malformed_filter_inline() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("titles.csv", NETFLIX_CSV);
    csv_insight()
        .args(["dashboard", "-i", input.to_str().unwrap(), "--year", "soon"])
        .assert()
        .success()
        .stdout(contains("! Ignored year"))
        .stdout(contains("total_titles"));
}

#[test]
fn dashboard_reads_stdin() {
    csv_insight()
        .args(["dashboard", "-i", "-"])
        .write_stdin("foo,bar\n1,2\n3,4\n")
        .assert()
        .success()
        .stdout(contains("Dataset: UNKNOWN"))
        .stdout(contains("First rows [table]"));
}

#[test]
fn dashboard_handles_latin1_upload() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_bytes(
        "titles.csv",
        b"show_id,type,release_year,country\ns1,Movie,2020,Espa\xf1a\ns2,Movie,2021,Espa\xf1a\n",
    );
    csv_insight()
        .args(["dashboard", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("España"));
}

#[test]
fn dashboard_fails_on_unreadable_file() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("broken.csv", "a,b\n1,2,3\n");
    csv_insight()
        .args(["dashboard", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("file could not be read"));
}

#[test]
fn dashboard_rejects_colliding_headers() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("dupes.csv", "Show ID,show_id,type\n1,2,Movie\n");
    csv_insight()
        .args(["dashboard", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("show_id"));
}

#[test]
fn classify_prints_domain_and_types() {
    csv_insight()
        .args([
            "classify",
            "-i",
            fixture_path("spotify_tracks.csv").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("Dataset: SPOTIFY_TRACKS"))
        .stdout(contains("track_name"))
        .stdout(contains("explicit").and(contains("boolean")));
}

#[test]
fn classify_honours_custom_delimiter() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("artists.txt", "name;followers;genres\nA;10;pop\n");
    csv_insight()
        .args(["classify", "-i", input.to_str().unwrap(), "--delimiter", ";"])
        .assert()
        .success()
        .stdout(contains("Dataset: SPOTIFY_ARTISTS"));
}

#[test]
fn preview_limits_rows_and_normalizes_headers() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("data.csv", "Col A,Col.B\n1,x\n2,y\n3,z\n");
    csv_insight()
        .args(["preview", "-i", input.to_str().unwrap(), "--rows", "2"])
        .assert()
        .success()
        .stdout(contains("col_a").and(contains("colb")))
        .stdout(contains("y"))
        .stdout(contains("z").not());
}
