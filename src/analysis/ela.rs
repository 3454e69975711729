use std::{
    io::{BufWriter, Write},
    path::PathBuf,
};

use image::codecs::jpeg::JpegEncoder;
use tempfile::{Builder, NamedTempFile};

use crate::{
    analysis::Analyzer,
    error::{ForgeryError, Result},
    source::ImageHandle,
};

/// Error level analysis: one extra lossy round trip exposes regions whose
/// compression history differs from the rest of the frame.
pub struct ElaAnalyzer {
    quality: u8,
    temp_dir: Option<PathBuf>,
}

impl ElaAnalyzer {
    pub fn new(quality: u8) -> Result<Self> {
        if quality == 0 || quality > 100 {
            return Err(ForgeryError::InvalidParameter(
                "JPEG quality must be between 1 and 100".into(),
            ));
        }

        Ok(Self {
            quality,
            temp_dir: None,
        })
    }

    /// Directory for the scoped recompression artifact. Defaults to the
    /// system temp directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    // The artifact carries a random per-invocation name and is removed on
    // drop, so concurrent invocations in one process cannot collide and
    // early returns cannot leak it.
    fn recompress_artifact(&self) -> Result<NamedTempFile> {
        let mut builder = Builder::new();
        builder.prefix("recompress-").suffix(".jpg");

        let artifact = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        Ok(artifact)
    }
}

impl Analyzer for ElaAnalyzer {
    fn name(&self) -> &'static str {
        "ela"
    }

    fn compute(&self, image: &ImageHandle) -> Result<f64> {
        let original = image.rgb();
        let artifact = self.recompress_artifact()?;

        {
            let mut writer = BufWriter::new(artifact.as_file());
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, self.quality);
            encoder.encode_image(original)?;
            writer.flush()?;
        }

        let roundtrip = image::open(artifact.path())?.to_rgb8();
        if roundtrip.dimensions() != original.dimensions() {
            return Err(ForgeryError::Analysis(
                "recompressed dimensions diverge from source".into(),
            ));
        }

        let mut total_diff = 0.0;
        for (orig, recomp) in original.pixels().zip(roundtrip.pixels()) {
            for c in 0..3 {
                total_diff += (orig[c] as f64 - recomp[c] as f64).abs();
            }
        }

        let samples = (original.width() * original.height() * 3) as f64;
        if samples == 0.0 {
            return Ok(0.0);
        }

        Ok((total_diff / samples / 255.0).clamp(0.0, 1.0))
    }
}
