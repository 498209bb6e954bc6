use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("nafolia-babel")
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn list_conversions() {
    let mut cmd = cargo_bin_cmd!("nafolia");
    cmd.arg("list-conversions");
    cmd.assert().success().stdout(
        predicate::str::contains("folia2naf").and(predicate::str::contains("naf2folia")),
    );
}

#[test]
fn convert_naf_to_folia_via_cli() {
    let mut cmd = cargo_bin_cmd!("nafolia");
    cmd.arg("convert").arg(fixture_path("boeing.naf"));

    let output_pred = predicate::str::contains("<FoLiA")
        .and(predicate::str::contains(r#"xml:id="boeing""#))
        .and(predicate::str::contains("Boeing"));
    cmd.assert().success().stdout(output_pred);
}

#[test]
fn convert_folia_to_naf_via_cli() {
    let mut cmd = cargo_bin_cmd!("nafolia");
    cmd.arg("convert")
        .arg(fixture_path("boeing.folia.xml"))
        .arg("--set")
        .arg("folia2naf.timestamp=2024-05-01T12:00:00Z");

    let output_pred =
        predicate::str::contains("<NAF").and(predicate::str::contains("2024-05-01T12:00:00Z"));
    cmd.assert().success().stdout(output_pred);
}

#[test]
fn explicit_formats_must_match_a_conversion() {
    let mut cmd = cargo_bin_cmd!("nafolia");
    cmd.arg("convert")
        .arg(fixture_path("boeing.naf"))
        .arg("--from")
        .arg("naf")
        .arg("--to")
        .arg("naf");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("no conversion from naf to naf"));
}

#[test]
fn invalid_document_id_exits_with_2() {
    let mut cmd = cargo_bin_cmd!("nafolia");
    cmd.arg("convert")
        .arg(fixture_path("boeing.naf"))
        .arg("--id")
        .arg("2016 news");
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("2016 news"));
}

#[test]
fn missing_input_exits_with_1() {
    let mut cmd = cargo_bin_cmd!("nafolia");
    cmd.arg("convert").arg(fixture_path("does-not-exist.naf"));
    cmd.assert().code(1);
}

#[test]
fn json_diagnostics_report() {
    let mut cmd = cargo_bin_cmd!("nafolia");
    cmd.env("NAFOLIA_LOG", "off")
        .arg("convert")
        .arg(fixture_path("boeing.naf"))
        .arg("--diagnostics")
        .arg("json");
    cmd.assert().success().stderr(
        predicate::str::contains("dangling_span_reference")
            .and(predicate::str::contains("missing_span")),
    );
}

#[test]
fn writes_output_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("boeing.folia.xml");
    let mut cmd = cargo_bin_cmd!("nafolia");
    cmd.arg("convert")
        .arg(fixture_path("boeing.naf"))
        .arg("-o")
        .arg(&output)
        .arg("--sense-mode")
        .arg("flat");
    cmd.assert().success().stdout(predicate::str::is_empty());

    let written = std::fs::read_to_string(&output).expect("output written");
    assert!(written.contains("<FoLiA"));
}
