mod common;

use common::{fixture, read_json};
use std::fs;
use tempfile::TempDir;
use treebuilder::cli::{AttachArgs, ReferenceArgs};
use treebuilder::commands::{attach, validate};
use treebuilder::placement::UnknownTargetPolicy;

fn length(reference_length: usize) -> ReferenceArgs {
    ReferenceArgs {
        reference: None,
        reference_length: Some(reference_length),
    }
}

fn attach_args(dir: &TempDir, queries: &str) -> AttachArgs {
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    AttachArgs {
        tree_file: fixture("scenario_d_tree.json"),
        queries_file: fixture(queries),
        output_file: dir.path().join("tree_attached.json"),
        reference: length(16),
        report: Some(dir.path().join("report.tsv")),
        on_unknown_target: None,
        no_ladderize: false,
        config: Some(config),
    }
}

#[test]
fn attach_writes_tree_and_report() {
    let dir = TempDir::new().unwrap();
    let args = attach_args(&dir, "scenario_d_queries.json");
    let output = args.output_file.clone();
    let report = args.report.clone().unwrap();

    attach::run(args).unwrap();

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
    assert_eq!(written, read_json("scenario_d_expected.json"));

    let report = fs::read_to_string(report).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Query\tStatus"));
    assert!(lines[1].starts_with("q\tplaced\t0\tparent_5\t5\tq_new\t"));
}

#[test]
fn reference_length_can_come_from_fasta() {
    let dir = TempDir::new().unwrap();
    let fasta = dir.path().join("reference.fasta");
    fs::write(&fasta, ">ref\nACGTACGT\nACGTACGT\n").unwrap();

    let mut args = attach_args(&dir, "scenario_d_queries.json");
    args.reference = ReferenceArgs {
        reference: Some(fasta),
        reference_length: None,
    };
    let output = args.output_file.clone();
    attach::run(args).unwrap();

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
    assert_eq!(written, read_json("scenario_d_expected.json"));
}

#[test]
fn abort_policy_fails_on_unknown_target() {
    let dir = TempDir::new().unwrap();
    let mut args = attach_args(&dir, "batch_queries.json");
    args.on_unknown_target = Some(UnknownTargetPolicy::Abort);
    let output = args.output_file.clone();

    let err = attach::run(args).unwrap_err();
    assert!(format!("{:#}", err).contains("lost"));
    assert!(!output.exists());
}

#[test]
fn skip_policy_reports_unknown_target() {
    let dir = TempDir::new().unwrap();
    let args = attach_args(&dir, "batch_queries.json");
    let report = args.report.clone().unwrap();

    attach::run(args).unwrap();

    let report = fs::read_to_string(report).unwrap();
    let skipped: Vec<&str> = report.lines().filter(|l| l.contains("\tskipped\t")).collect();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].starts_with("lost\t"));
}

#[test]
fn validate_accepts_fixture_and_rejects_zero_length() {
    validate::run(&fixture("scenario_d_tree.json"), &length(16)).unwrap();
    assert!(validate::run(&fixture("scenario_d_tree.json"), &length(0)).is_err());
}
