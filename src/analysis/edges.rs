use imageproc::edges::canny;
use statrs::statistics::Statistics;

use crate::{analysis::Analyzer, error::Result, source::ImageHandle};

/// Edge consistency: spliced regions tend to introduce boundaries whose
/// density and spread differ from the rest of the frame.
pub struct EdgeConsistencyAnalyzer {
    low_threshold: f32,
    high_threshold: f32,
    normalizer: f64,
}

impl EdgeConsistencyAnalyzer {
    pub fn new() -> Self {
        Self {
            low_threshold: 50.0,
            high_threshold: 150.0,
            normalizer: 10000.0,
        }
    }

    pub fn with_thresholds(mut self, low: f32, high: f32) -> Self {
        self.low_threshold = low;
        self.high_threshold = high;
        self
    }

    /// Empirical normalization constant. Tunable.
    pub fn with_normalizer(mut self, normalizer: f64) -> Self {
        self.normalizer = normalizer;
        self
    }
}

impl Default for EdgeConsistencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for EdgeConsistencyAnalyzer {
    fn name(&self) -> &'static str {
        "edge_consistency"
    }

    fn compute(&self, image: &ImageHandle) -> Result<f64> {
        let gray = image.gray();
        let total = (gray.width() * gray.height()) as f64;
        if total == 0.0 {
            return Ok(0.0);
        }

        let edge_map = canny(&gray, self.low_threshold, self.high_threshold);

        let values: Vec<f64> = edge_map.pixels().map(|p| p[0] as f64).collect();
        let edge_pixels = values.iter().filter(|&&v| v > 0.0).count() as f64;

        let density = edge_pixels / total;
        let variance = values.iter().population_variance();

        Ok((density * (variance / self.normalizer)).clamp(0.0, 1.0))
    }
}
