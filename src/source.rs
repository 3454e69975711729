use std::{path::Path, sync::Arc};

use image::{DynamicImage, GrayImage, RgbImage};
use parking_lot::RwLock;

use crate::{
    error::Result,
    image_utils::{HsvImage, rgb_to_gray, rgb_to_hsv},
};

/// Decoded pixel data for one image plus lazily derived views.
///
/// Derived planes are computed on first request and cached behind an
/// `RwLock`, shared as `Arc` so analyzers running on worker threads can
/// hold them without copying.
pub struct ImageHandle {
    original: DynamicImage,
    rgb: RgbImage,
    views: RwLock<ViewCache>,
}

#[derive(Default)]
struct ViewCache {
    gray: Option<Arc<GrayImage>>,
    hsv: Option<Arc<HsvImage>>,
}

impl ImageHandle {
    /// Decodes the image at `path`. This is the only fatal failure point
    /// of the pipeline; everything downstream degrades per analyzer.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let original = image::open(path)?;
        Ok(Self::from_image(original))
    }

    pub fn from_image(original: DynamicImage) -> Self {
        let rgb = original.to_rgb8();
        Self {
            original,
            rgb,
            views: RwLock::new(ViewCache::default()),
        }
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn original(&self) -> &DynamicImage {
        &self.original
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn gray(&self) -> Arc<GrayImage> {
        if let Some(gray) = self.views.read().gray.clone() {
            return gray;
        }
        let mut views = self.views.write();
        views
            .gray
            .get_or_insert_with(|| Arc::new(rgb_to_gray(&self.rgb)))
            .clone()
    }

    /// Y plane of the YUV decomposition. BT.601 weights make it identical
    /// to the grayscale projection, so the cached plane is shared.
    pub fn luma(&self) -> Arc<GrayImage> {
        self.gray()
    }

    pub fn hsv(&self) -> Arc<HsvImage> {
        if let Some(hsv) = self.views.read().hsv.clone() {
            return hsv;
        }
        let mut views = self.views.write();
        views
            .hsv
            .get_or_insert_with(|| Arc::new(rgb_to_hsv(&self.rgb)))
            .clone()
    }
}
