use std::path::PathBuf;

use forgery_detector::{
    ForgeryDetector,
    analysis::{Analyzer, copy_move::CopyMoveDetector, ela::ElaAnalyzer},
    source::ImageHandle,
};
use image::{DynamicImage, Rgb, RgbImage};
use tempfile::TempDir;

/// Deterministic high-contrast texture so keypoint and recompression
/// analyzers have something to bite on.
fn fill_noise(image: &mut RgbImage, x0: u32, y0: u32, width: u32, height: u32, seed: u32) {
    let mut state = seed;
    for y in y0..y0 + height {
        for x in x0..x0 + width {
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            let v = (state >> 24) as u8;
            image.put_pixel(x, y, Rgb([v, v.wrapping_add(31), v.wrapping_add(67)]));
        }
    }
}

fn save_png(dir: &TempDir, name: &str, image: &RgbImage) -> PathBuf {
    let path = dir.path().join(name);
    image.save(&path).expect("save png");
    path
}

#[test]
fn nonexistent_path_is_a_load_failure() {
    let detector = ForgeryDetector::new();
    assert!(detector.detect("/definitely/not/here.png").is_err());
}

#[test]
fn nonexistent_path_yields_failure_envelope() {
    let json = ForgeryDetector::new()
        .detect_to_json("/definitely/not/here.png")
        .expect("envelope");
    let value: serde_json::Value = serde_json::from_str(&json).expect("parse");

    assert_eq!(value["success"], false);
    assert!(value["error"].as_str().is_some_and(|e| !e.is_empty()));
    assert!(value.get("analysis").is_none());
}

#[test]
fn flat_image_zeroes_the_texture_signals() {
    let dir = tempfile::tempdir().expect("tempdir");
    let flat = RgbImage::from_pixel(64, 64, Rgb([120, 120, 120]));
    let path = save_png(&dir, "flat.png", &flat);

    let report = ForgeryDetector::new().detect(&path).expect("report");

    assert_eq!(report.scores.copy_move, 0.0);
    assert_eq!(report.scores.noise, 0.0);
    assert_eq!(report.scores.jpeg_artifacts, 0.0);
    for score in [
        report.scores.ela,
        report.scores.copy_move,
        report.scores.noise,
        report.scores.jpeg_artifacts,
        report.scores.edge_consistency,
        report.overall_score,
    ] {
        assert!((0.0..=1.0).contains(&score));
        assert!(score.is_finite());
    }
}

#[test]
fn overall_score_is_the_mean_of_the_subscores() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut textured = RgbImage::from_pixel(96, 96, Rgb([128, 128, 128]));
    fill_noise(&mut textured, 0, 0, 96, 96, 7);
    let path = save_png(&dir, "textured.png", &textured);

    let report = ForgeryDetector::new().detect(&path).expect("report");

    let mean = (report.scores.ela
        + report.scores.copy_move
        + report.scores.noise
        + report.scores.jpeg_artifacts
        + report.scores.edge_consistency)
        / 5.0;
    assert!((report.overall_score - mean).abs() < 1e-12);

    assert_eq!(report.is_likely_forged, report.overall_score > 0.6);
    let expected = if report.overall_score > 0.8 {
        forgery_detector::Confidence::High
    } else if report.overall_score > 0.5 {
        forgery_detector::Confidence::Medium
    } else {
        forgery_detector::Confidence::Low
    };
    assert_eq!(report.confidence, expected);
}

#[test]
fn pipeline_is_deterministic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut textured = RgbImage::from_pixel(96, 96, Rgb([128, 128, 128]));
    fill_noise(&mut textured, 0, 0, 96, 96, 99);
    let path = save_png(&dir, "repeat.png", &textured);

    let detector = ForgeryDetector::new();
    let first = detector.detect(&path).expect("first run");
    let second = detector.detect(&path).expect("second run");

    assert_eq!(first.scores, second.scores);
    assert_eq!(first.overall_score, second.overall_score);
    assert_eq!(first.is_likely_forged, second.is_likely_forged);
    assert_eq!(first.confidence, second.confidence);
}

#[test]
fn recompression_leaves_no_artifact_behind() {
    let artifact_dir = tempfile::tempdir().expect("tempdir");
    let analyzer = ElaAnalyzer::new(95)
        .expect("analyzer")
        .with_temp_dir(artifact_dir.path());

    let mut textured = RgbImage::new(64, 64);
    fill_noise(&mut textured, 0, 0, 64, 64, 3);
    let handle = ImageHandle::from_image(DynamicImage::ImageRgb8(textured));

    let score = analyzer.compute(&handle).expect("score");
    assert!(score > 0.0, "a lossy round trip on texture must drift");
    assert!(score <= 1.0);

    let leftovers = std::fs::read_dir(artifact_dir.path())
        .expect("read_dir")
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn duplicated_patch_raises_the_copy_move_score() {
    let mut image = RgbImage::from_pixel(128, 128, Rgb([128, 128, 128]));
    // Same seed twice: two byte-identical 48x48 regions far apart.
    fill_noise(&mut image, 8, 8, 48, 48, 42);
    fill_noise(&mut image, 72, 8, 48, 48, 42);
    let handle = ImageHandle::from_image(DynamicImage::ImageRgb8(image));

    let detector = CopyMoveDetector::new(0.7).expect("detector");
    let score = detector.compute(&handle).expect("score");

    assert!(score > 0.0, "cloned regions should produce distinctive matches");
    assert!(score <= 1.0);
}
