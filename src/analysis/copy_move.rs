use std::cmp::Ordering;

use image::GrayImage;
use imageproc::corners::{Corner, corners_fast9};
use num_complex::Complex;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use rustfft::{Fft, FftPlanner};

use crate::{
    analysis::Analyzer,
    error::{ForgeryError, Result},
    image_utils::extract_block,
    source::ImageHandle,
};

const PATCH_SIZE: u32 = 16;
const DESCRIPTOR_LEN: usize = 32;

/// Copy-move detection: keypoint patches that match other patches of the
/// same image suggest a cloned region.
pub struct CopyMoveDetector {
    ratio_threshold: f64,
    corner_threshold: u8,
    max_keypoints: usize,
}

impl CopyMoveDetector {
    pub fn new(ratio_threshold: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&ratio_threshold) || ratio_threshold == 0.0 {
            return Err(ForgeryError::InvalidParameter(
                "ratio threshold must lie strictly between 0 and 1".into(),
            ));
        }

        Ok(Self {
            ratio_threshold,
            corner_threshold: 20,
            max_keypoints: 512,
        })
    }

    pub fn with_corner_threshold(mut self, threshold: u8) -> Self {
        self.corner_threshold = threshold;
        self
    }

    /// Caps the number of keypoints fed to the quadratic matcher. The
    /// strongest corners are kept; the score denominator is the retained
    /// count.
    pub fn with_max_keypoints(mut self, max_keypoints: usize) -> Self {
        self.max_keypoints = max_keypoints;
        self
    }

    fn keypoints(&self, gray: &GrayImage) -> Vec<Corner> {
        let (width, height) = gray.dimensions();
        let margin = PATCH_SIZE / 2;

        let mut corners: Vec<Corner> = corners_fast9(gray, self.corner_threshold)
            .into_iter()
            .filter(|c| {
                c.x >= margin && c.y >= margin && c.x + margin < width && c.y + margin < height
            })
            .collect();

        corners.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        corners.truncate(self.max_keypoints);
        corners
    }

    /// L2-normalized magnitudes of the leading FFT coefficients of the
    /// patch around a keypoint. Magnitudes ignore the phase, so small
    /// shifts of the cloned region do not break the match.
    fn describe(&self, gray: &GrayImage, corner: &Corner, fft: &dyn Fft<f64>) -> Vec<f64> {
        let margin = PATCH_SIZE / 2;
        let patch = extract_block(gray, corner.x - margin, corner.y - margin, PATCH_SIZE);

        let mut spectrum: Vec<Complex<f64>> = patch
            .iter()
            .map(|&v| Complex::new(v as f64, 0.0))
            .collect();
        spectrum.resize((PATCH_SIZE * PATCH_SIZE) as usize, Complex::new(0.0, 0.0));

        fft.process(&mut spectrum);

        let mut descriptor: Vec<f64> = spectrum
            .iter()
            .take(DESCRIPTOR_LEN)
            .map(|c| c.norm())
            .collect();

        let norm = descriptor.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 1e-12 {
            for value in &mut descriptor {
                *value /= norm;
            }
        }

        descriptor
    }

    // Nearest-vs-second-nearest ratio test. The trivial self-match is
    // excluded; with it every descriptor would pass at distance zero.
    fn is_distinctive_match(&self, index: usize, descriptor: &[f64], all: &[Vec<f64>]) -> bool {
        let mut nearest = f64::INFINITY;
        let mut second = f64::INFINITY;

        for (j, other) in all.iter().enumerate() {
            if j == index {
                continue;
            }

            let dist = euclidean(descriptor, other);
            if dist < nearest {
                second = nearest;
                nearest = dist;
            } else if dist < second {
                second = dist;
            }
        }

        second.is_finite() && nearest < self.ratio_threshold * second
    }
}

impl Analyzer for CopyMoveDetector {
    fn name(&self) -> &'static str {
        "copy_move"
    }

    fn compute(&self, image: &ImageHandle) -> Result<f64> {
        let gray = image.gray();
        let (width, height) = gray.dimensions();
        if width <= PATCH_SIZE || height <= PATCH_SIZE {
            return Ok(0.0);
        }

        let corners = self.keypoints(&gray);
        if corners.len() < 2 {
            return Ok(0.0);
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward((PATCH_SIZE * PATCH_SIZE) as usize);

        let descriptors: Vec<Vec<f64>> = corners
            .par_iter()
            .map(|corner| self.describe(&gray, corner, fft.as_ref()))
            .collect();

        // The ratio test needs a nearest and a second nearest besides the
        // descriptor itself.
        if descriptors.len() < 3 {
            return Ok(0.0);
        }

        let good_matches = descriptors
            .par_iter()
            .enumerate()
            .filter(|(i, d)| self.is_distinctive_match(*i, d.as_slice(), &descriptors))
            .count();

        Ok((good_matches as f64 / descriptors.len() as f64).clamp(0.0, 1.0))
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
