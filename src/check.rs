use std::{collections::HashMap, f64::consts::TAU, fmt, fs::File, io::Read, path::Path};

use md5::{Digest, Md5};
use rand::Rng;

use crate::error::Result;

/// Outcome of the lightweight trusted-hash / noise check. External tooling
/// depends on the exact `"ok"` / `"forged"` wire tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Forged,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Clean => "ok",
            Verdict::Forged => "forged",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-stage check: files with a known trusted digest are compared by MD5;
/// everything else runs a cheap synthetic-noise heuristic.
pub struct QuickCheck {
    trusted: HashMap<String, String>,
    noise_variance: f64,
    diff_threshold: f64,
}

impl QuickCheck {
    pub fn new() -> Self {
        Self {
            trusted: HashMap::new(),
            noise_variance: 0.01,
            diff_threshold: 0.2,
        }
    }

    /// Trusted table: file name to lowercase hex MD5 of the pristine copy.
    pub fn with_trusted_hashes(mut self, hashes: HashMap<String, String>) -> Self {
        self.trusted = hashes;
        self
    }

    pub fn trust(mut self, file_name: impl Into<String>, md5_hex: impl Into<String>) -> Self {
        self.trusted.insert(file_name.into(), md5_hex.into());
        self
    }

    pub fn check<P: AsRef<Path>>(&self, path: P) -> Result<Verdict> {
        let path = path.as_ref();
        let digest = md5_hex(path)?;

        if let Some(expected) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| self.trusted.get(name))
        {
            return Ok(if digest.eq_ignore_ascii_case(expected) {
                Verdict::Clean
            } else {
                Verdict::Forged
            });
        }

        Ok(if self.noise_suspicious(path) {
            Verdict::Forged
        } else {
            Verdict::Clean
        })
    }

    // Injects Gaussian noise and measures the mean absolute clipped
    // response. Files that do not decode as images are not suspicious.
    fn noise_suspicious(&self, path: &Path) -> bool {
        let Ok(image) = image::open(path) else {
            return false;
        };

        let gray = image.to_luma8();
        let pixels = (gray.width() * gray.height()) as f64;
        if pixels == 0.0 {
            return false;
        }

        let sigma = self.noise_variance.sqrt();
        let mut rng = rand::thread_rng();
        let mut total = 0.0;

        for pixel in gray.pixels() {
            let value = pixel[0] as f64 / 255.0;
            let noisy = (value + gaussian(&mut rng, sigma)).clamp(0.0, 1.0);
            total += (noisy - value).abs();
        }

        total / pixels > self.diff_threshold
    }
}

impl Default for QuickCheck {
    fn default() -> Self {
        Self::new()
    }
}

fn gaussian<R: Rng>(rng: &mut R, sigma: f64) -> f64 {
    // Box-Muller transform.
    let u1: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    sigma * (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

fn md5_hex(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut chunk = [0u8; 4096];

    loop {
        let read = file.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        hasher.update(&chunk[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
