use std::path::Path;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    aggregate::{AnalysisReport, ScoreSet, Thresholds, aggregate},
    analysis::{
        Analyzer, block_artifacts::BlockArtifactAnalyzer, copy_move::CopyMoveDetector,
        edges::EdgeConsistencyAnalyzer, ela::ElaAnalyzer, noise::NoiseAnalyzer,
    },
    error::Result,
    report::JsonReport,
    source::ImageHandle,
};

pub mod aggregate;
pub mod analysis;
pub mod check;
pub mod error;
pub mod image_utils;
pub mod metadata;
pub mod report;
pub mod source;

pub use aggregate::Confidence;
pub use error::ForgeryError;

/// Pipeline tunables. The normalization constants and thresholds are
/// empirical values kept for behavioral compatibility.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub ela_quality: u8,
    pub ratio_threshold: f64,
    pub corner_threshold: u8,
    pub max_keypoints: usize,
    pub noise_normalizer: f64,
    pub block_normalizer: f64,
    pub edge_normalizer: f64,
    pub thresholds: Thresholds,
    pub parallel: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            ela_quality: 95,
            ratio_threshold: 0.7,
            corner_threshold: 20,
            max_keypoints: 512,
            noise_normalizer: 1000.0,
            block_normalizer: 1000.0,
            edge_normalizer: 10000.0,
            thresholds: Thresholds::default(),
            parallel: true,
        }
    }
}

pub struct ForgeryDetector {
    config: DetectorConfig,
}

impl ForgeryDetector {
    pub fn new() -> Self {
        Self {
            config: DetectorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs the full pipeline on the image at `path`.
    ///
    /// Only a load failure aborts the invocation. Once the image has
    /// decoded, every analyzer failure degrades to a 0.0 sub-score and a
    /// report is always produced.
    pub fn detect<P: AsRef<Path>>(&self, path: P) -> Result<AnalysisReport> {
        let analyzers = self.analyzers()?;
        let handle = ImageHandle::load(path)?;
        Ok(self.run(&analyzers, &handle))
    }

    pub fn detect_image(&self, image: image::DynamicImage) -> Result<AnalysisReport> {
        let analyzers = self.analyzers()?;
        let handle = ImageHandle::from_image(image);
        Ok(self.run(&analyzers, &handle))
    }

    /// The external envelope: `{"success": true, "analysis": {...}}` on a
    /// produced report, `{"success": false, "error": "..."}` on a load
    /// failure.
    pub fn detect_to_json<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let envelope = match self.detect(path) {
            Ok(report) => JsonReport::success(&report),
            Err(err) => JsonReport::failure(err.to_string()),
        };
        envelope.to_json()
    }

    fn analyzers(&self) -> Result<Vec<Box<dyn Analyzer>>> {
        let config = &self.config;

        Ok(vec![
            Box::new(ElaAnalyzer::new(config.ela_quality)?),
            Box::new(
                CopyMoveDetector::new(config.ratio_threshold)?
                    .with_corner_threshold(config.corner_threshold)
                    .with_max_keypoints(config.max_keypoints),
            ),
            Box::new(NoiseAnalyzer::new().with_normalizer(config.noise_normalizer)),
            Box::new(BlockArtifactAnalyzer::new().with_normalizer(config.block_normalizer)),
            Box::new(EdgeConsistencyAnalyzer::new().with_normalizer(config.edge_normalizer)),
        ])
    }

    fn run(&self, analyzers: &[Box<dyn Analyzer>], handle: &ImageHandle) -> AnalysisReport {
        let scores: Vec<f64> = if self.config.parallel {
            analyzers
                .par_iter()
                .map(|analyzer| Self::run_one(analyzer.as_ref(), handle))
                .collect()
        } else {
            analyzers
                .iter()
                .map(|analyzer| Self::run_one(analyzer.as_ref(), handle))
                .collect()
        };

        // Slot order is fixed by analyzers().
        let scores = ScoreSet {
            ela: scores[0],
            copy_move: scores[1],
            noise: scores[2],
            jpeg_artifacts: scores[3],
            edge_consistency: scores[4],
        };

        aggregate(scores, &self.config.thresholds)
    }

    // The single place a failed analyzer becomes a zero sub-score. The
    // reason is logged so the fail-open policy does not bury it.
    fn run_one(analyzer: &dyn Analyzer, handle: &ImageHandle) -> f64 {
        match analyzer.compute(handle) {
            Ok(score) => score,
            Err(err) => {
                log::warn!("{} analysis degraded, scoring 0.0: {err}", analyzer.name());
                0.0
            }
        }
    }
}

impl Default for ForgeryDetector {
    fn default() -> Self {
        Self::new()
    }
}
