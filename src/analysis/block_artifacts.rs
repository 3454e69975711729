use statrs::statistics::Statistics;

use crate::{
    analysis::Analyzer,
    error::Result,
    image_utils::{block_variance, extract_block},
    source::ImageHandle,
};

const BLOCK_SIZE: u32 = 8;

/// Block-transform artifact strength: mean pixel variance over the 8x8
/// grid that block-based codecs quantize on.
pub struct BlockArtifactAnalyzer {
    normalizer: f64,
}

impl BlockArtifactAnalyzer {
    pub fn new() -> Self {
        Self { normalizer: 1000.0 }
    }

    /// Empirical normalization constant. Tunable.
    pub fn with_normalizer(mut self, normalizer: f64) -> Self {
        self.normalizer = normalizer;
        self
    }
}

impl Default for BlockArtifactAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for BlockArtifactAnalyzer {
    fn name(&self) -> &'static str {
        "jpeg_artifacts"
    }

    fn compute(&self, image: &ImageHandle) -> Result<f64> {
        let luma = image.luma();
        let (width, height) = luma.dimensions();
        if width < BLOCK_SIZE || height < BLOCK_SIZE {
            return Ok(0.0);
        }

        // Partial trailing blocks at the right and bottom edges are
        // dropped, not padded.
        let mut variances = Vec::new();
        for by in (0..=height - BLOCK_SIZE).step_by(BLOCK_SIZE as usize) {
            for bx in (0..=width - BLOCK_SIZE).step_by(BLOCK_SIZE as usize) {
                let block = extract_block(&luma, bx, by, BLOCK_SIZE);
                variances.push(block_variance(&block));
            }
        }

        if variances.is_empty() {
            return Ok(0.0);
        }

        let mean_variance = variances.iter().mean();
        Ok((mean_variance / self.normalizer).clamp(0.0, 1.0))
    }
}
