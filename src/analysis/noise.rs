use crate::{
    analysis::Analyzer,
    error::Result,
    image_utils::{gaussian_blur_5x5, gray_to_array},
    source::ImageHandle,
};

/// Noise irregularity: the variance of the residual left after smoothing.
/// Spliced or heavily processed regions carry sensor noise that does not
/// match the rest of the frame, which inflates the residual.
pub struct NoiseAnalyzer {
    normalizer: f64,
}

impl NoiseAnalyzer {
    pub fn new() -> Self {
        Self { normalizer: 1000.0 }
    }

    /// Empirical normalization constant, not derived from image
    /// statistics. Tunable.
    pub fn with_normalizer(mut self, normalizer: f64) -> Self {
        self.normalizer = normalizer;
        self
    }
}

impl Default for NoiseAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for NoiseAnalyzer {
    fn name(&self) -> &'static str {
        "noise"
    }

    fn compute(&self, image: &ImageHandle) -> Result<f64> {
        let gray = image.gray();
        let smoothed = gaussian_blur_5x5(&gray);

        let residual = gray_to_array(&gray) - gray_to_array(&smoothed);
        if residual.is_empty() {
            return Ok(0.0);
        }

        let variance = residual.var(0.0);
        Ok((variance / self.normalizer).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, GrayImage, Luma};

    use super::*;

    #[test]
    fn flat_image_has_zero_residual_variance() {
        let flat = GrayImage::from_pixel(32, 32, Luma([77]));
        let handle = ImageHandle::from_image(DynamicImage::ImageLuma8(flat));

        let score = NoiseAnalyzer::new().compute(&handle).expect("score");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn checkerboard_scores_above_flat() {
        let mut noisy = GrayImage::new(32, 32);
        for (x, y, p) in noisy.enumerate_pixels_mut() {
            *p = Luma([if (x + y) % 2 == 0 { 0 } else { 255 }]);
        }
        let handle = ImageHandle::from_image(DynamicImage::ImageLuma8(noisy));

        let score = NoiseAnalyzer::new().compute(&handle).expect("score");
        assert!(score > 0.0);
        assert!(score <= 1.0);
    }
}
