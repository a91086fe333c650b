use assert_cmd::Command;
use image::{Rgba, RgbaImage};
use predicates::prelude::*;

fn write_sample(path: &std::path::Path, width: u32, height: u32) {
    RgbaImage::from_pixel(width, height, Rgba([120, 130, 140, 255]))
        .save(path)
        .unwrap();
}

#[test]
fn info_prints_watermark_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.png");
    write_sample(&input, 1024, 1024);

    let mut cmd = Command::cargo_bin("gemini-inpaint").unwrap();
    cmd.arg("--info").arg(&input);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Watermark: 48x48"))
        .stdout(predicate::str::contains("Position: (944,944)"));
}

#[test]
fn single_file_writes_default_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    write_sample(&input, 800, 600);

    let mut cmd = Command::cargo_bin("gemini-inpaint").unwrap();
    cmd.arg(&input);
    cmd.assert().success();

    let output = dir.path().join("unwatermarked_photo.png");
    let img = image::open(output).unwrap();
    assert_eq!((img.width(), img.height()), (800, 600));
}

#[test]
fn directory_requires_output() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("gemini-inpaint").unwrap();
    cmd.arg(dir.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Output directory is required"));
}

#[test]
fn directory_reports_failures_individually() {
    let dir = tempfile::tempdir().unwrap();
    let input_dir = dir.path().join("in");
    std::fs::create_dir(&input_dir).unwrap();
    write_sample(&input_dir.join("a.png"), 320, 240);
    std::fs::write(input_dir.join("broken.png"), b"not an image").unwrap();
    write_sample(&input_dir.join("c.png"), 240, 320);
    let out_dir = dir.path().join("out");

    let mut cmd = Command::cargo_bin("gemini-inpaint").unwrap();
    cmd.arg(&input_dir).arg("-o").arg(&out_dir);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("[FAIL] broken.png"))
        .stderr(predicate::str::contains("Processed: 2, Failed: 1"));

    assert!(out_dir.join("unwatermarked_a.png").exists());
    assert!(out_dir.join("unwatermarked_c.png").exists());
}

#[test]
fn malformed_calibration_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    write_sample(&input, 64, 64);
    let table = dir.path().join("table.json");
    std::fs::write(&table, r#"{"entries": []}"#).unwrap();

    let mut cmd = Command::cargo_bin("gemini-inpaint").unwrap();
    cmd.arg("--calibration").arg(&table).arg(&input);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("calibration table is empty"));
}

#[test]
fn missing_input_fails() {
    let mut cmd = Command::cargo_bin("gemini-inpaint").unwrap();
    cmd.arg("/definitely/not/here.png");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn band_outside_supported_range_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    write_sample(&input, 64, 64);

    let mut cmd = Command::cargo_bin("gemini-inpaint").unwrap();
    cmd.arg("--band").arg("4294967295").arg(&input);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--band"));

    assert!(!dir.path().join("unwatermarked_photo.png").exists());
}
