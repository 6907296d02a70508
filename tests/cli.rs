#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

const GFA: &str = "H\tVN:Z:2.0\nS\ts1\t3\tCAT\nS\ts2\t4\tTAGT\nE\te1\ts1+\ts2+\t2\t3$\t0\t1\t1M\n";

fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("graph.gfa");
    fs::write(&path, GFA).expect("write gfa");
    (dir, path)
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf8 stdout")
}

#[test]
fn prints_the_shortest_path() {
    let (_dir, gfa) = setup();
    let output = cargo_bin_cmd!("gene-paths")
        .env_remove("GENE_PATHS_CONFIG")
        .arg(&gfa)
        .args(["s1:0:1+", "s2:2:3+"])
        .output()
        .expect("run gene-paths");
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_of(&output),
        ">PATH s1:0:1+ s1:1:2+ s2:0:2+ s2:2:3+ (length 5)\nCATAG\n"
    );
}

#[test]
fn both_directions_report_the_reverse_path() {
    let (_dir, gfa) = setup();
    let output = cargo_bin_cmd!("gene-paths")
        .env_remove("GENE_PATHS_CONFIG")
        .arg(&gfa)
        .args(["--both", "s1:0:1+", "s2:2:3+"])
        .output()
        .expect("run gene-paths");
    assert!(output.status.success(), "{output:?}");
    let stdout = stdout_of(&output);
    assert!(stdout.starts_with(">PATH s1:0:1+"), "{stdout}");
    assert!(!stdout.contains(">PATH_REV"), "{stdout}");

    let output = cargo_bin_cmd!("gene-paths")
        .env_remove("GENE_PATHS_CONFIG")
        .arg(&gfa)
        .args(["-b", "s2:2:3-", "s1:0:1-"])
        .output()
        .expect("run gene-paths");
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_of(&output),
        ">PATH s2:2:3- s2:1:2- s1:1:3- s1:0:1- (length 5)\nCTATG\n"
    );
}

#[test]
fn no_path_exits_with_two() {
    let (_dir, gfa) = setup();
    let output = cargo_bin_cmd!("gene-paths")
        .env_remove("GENE_PATHS_CONFIG")
        .arg(&gfa)
        .args(["s2:2:3+", "s1:0:1+"])
        .output()
        .expect("run gene-paths");
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No path was found"), "{stderr}");
}

#[test]
fn bad_target_exits_with_one() {
    let (_dir, gfa) = setup();
    let output = cargo_bin_cmd!("gene-paths")
        .env_remove("GENE_PATHS_CONFIG")
        .arg(&gfa)
        .args(["s9+", "s1:0:1+"])
        .output()
        .expect("run gene-paths");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("gene-paths: error: unknown segment: s9"), "{stderr}");
}

#[test]
fn furthest_mode_and_json_output() {
    let (_dir, gfa) = setup();
    let output = cargo_bin_cmd!("gene-paths")
        .env_remove("GENE_PATHS_CONFIG")
        .arg(&gfa)
        .args(["--format", "json", "s1:0:1+"])
        .output()
        .expect("run gene-paths");
    assert!(output.status.success(), "{output:?}");
    let value: Value = serde_json::from_str(stdout_of(&output).trim()).expect("json line");
    assert_eq!(value["label"], "FURTHEST");
    // the furthest arc destination is where the overlap lands on s2
    assert_eq!(value["length"], 3);
    assert_eq!(value["route"], "s1:0:1+ s1:1:3+");
    assert_eq!(value["sequence"], "CAT");
}

#[test]
fn config_file_sets_defaults() {
    let (dir, gfa) = setup();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[output]\nwrap = 2\n").expect("write config");
    let output = cargo_bin_cmd!("gene-paths")
        .env("GENE_PATHS_CONFIG", &config)
        .arg(&gfa)
        .args(["s1:0:1+", "s2:2:3+"])
        .output()
        .expect("run gene-paths");
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_of(&output),
        ">PATH s1:0:1+ s1:1:2+ s2:0:2+ s2:2:3+ (length 5)\nCA\nTA\nG\n"
    );

    let output = cargo_bin_cmd!("gene-paths")
        .env("GENE_PATHS_CONFIG", &config)
        .arg(&gfa)
        .args(["-w", "0", "s1:0:1+", "s2:2:3+"])
        .output()
        .expect("run gene-paths");
    assert!(stdout_of(&output).ends_with("\nCATAG\n"));
}

#[test]
fn invalid_config_value_exits_with_one() {
    let (dir, gfa) = setup();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[search]\nmode = \"longest\"\n").expect("write config");
    let output = cargo_bin_cmd!("gene-paths")
        .env("GENE_PATHS_CONFIG", &config)
        .arg(&gfa)
        .args(["s1:0:1+", "s2:2:3+"])
        .output()
        .expect("run gene-paths");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config value 'longest' is invalid for search.mode"),
        "{stderr}"
    );
}
