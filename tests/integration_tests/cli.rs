//! End-to-end tests for the `plot-mem-usage` binary that stop before rendering.

use crate::common::{SAMPLE_LOG, TestLog};
use assert_cmd::cargo::cargo_bin_cmd;
use insta::assert_snapshot;
use rstest::rstest;

#[test]
fn test_no_plot_prints_sections_and_table() {
    let log = TestLog::new(SAMPLE_LOG);
    let output = log.command().arg("--no-plot").output().unwrap();
    assert!(output.status.success(), "plot-mem-usage failed: {output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_snapshot!(stdout.trim_end(), @r"
    Parsed sections: 3
                   heuristics  trajs  total
    section_index
    0                   1.500   0.25   1.75
    1                   1.500   0.50   2.00
    2                   2.125   0.00   0.00
    ");
}

#[test]
fn test_start_key_repeat_splits_sections() {
    let log = TestLog::new(
        "TrajLNS:heuristics_mem_GB = 1.0\n\
         TrajLNS:heuristics_mem_GB = 2.0\n\
         TrajLNS:total_mem_GB = 3.0\n",
    );
    let output = log.command().arg("--no-plot").output().unwrap();
    assert!(output.status.success(), "plot-mem-usage failed: {output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Parsed sections: 2\n"), "{stdout}");
}

#[test]
fn test_no_matching_lines_fails() {
    let log = TestLog::new("planner started\nnothing else happened\n");
    let output = log.command().arg("--no-plot").output().unwrap();
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("No TrajLNS memory lines found in the log."),
        "unexpected stderr: {stderr}"
    );
    assert!(output.stdout.is_empty());
}

#[test]
fn test_missing_log_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt");
    let output = cargo_bin_cmd!("plot-mem-usage")
        .arg("--log")
        .arg(&missing)
        .arg("--no-plot")
        .env("MEMPLOT_CONFIG_PATH", dir.path().join("no-config.toml"))
        .env("NO_COLOR", "1")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to open log file"), "{stderr}");
    assert!(stderr.contains("missing.txt"), "{stderr}");
}

#[test]
fn test_prefix_flag_reads_other_tags() {
    let log = TestLog::new(
        "DefaultPlanner:init:p_mem_GB = 0.5\n\
         DefaultPlanner:init:decision_mem_GB = 0.25\n\
         DefaultPlanner:init:total_mem_GB = 0.75\n\
         TrajLNS:heuristics_mem_GB = 9.0\n",
    );
    let output = log
        .command()
        .args(["--no-plot", "--prefix", "DefaultPlanner:init"])
        .output()
        .unwrap();
    assert!(output.status.success(), "plot-mem-usage failed: {output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Parsed sections: 1\n"), "{stdout}");
    assert!(stdout.contains("decision"));
    assert!(!stdout.contains("heuristics"));
}

#[test]
fn test_config_file_sets_prefix() {
    let log = TestLog::new("Custom:flow_mem_GB = 1e-3\nCustom:total_mem_GB = 2\n");
    let config = log.dir().join("config.toml");
    std::fs::write(&config, "[parser]\nprefix = \"Custom\"\n").unwrap();

    let output = log
        .command()
        .arg("--no-plot")
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success(), "plot-mem-usage failed: {output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.001"), "{stdout}");
}

#[test]
fn test_explicit_missing_config_fails() {
    let log = TestLog::new(SAMPLE_LOG);
    let output = log
        .command()
        .arg("--no-plot")
        .arg("--config")
        .arg(log.dir().join("absent.toml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load memplot config"), "{stderr}");
}

#[rstest]
#[case(&["--no-plot", "--out", "chart.png"])]
#[case(&["--no-plot", "--show"])]
fn test_no_plot_conflicts(#[case] args: &[&str]) {
    let log = TestLog::new(SAMPLE_LOG);
    let output = log.command().args(args).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_log_is_required() {
    let output = cargo_bin_cmd!("plot-mem-usage")
        .arg("--no-plot")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--log"), "{stderr}");
}
