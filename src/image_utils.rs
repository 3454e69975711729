use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use ndarray::Array2;

/// HSV plane packed like the OpenCV 8-bit convention: H in [0, 180),
/// S and V in [0, 255].
pub type HsvImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let lum =
            (0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64) as u8;
        gray.put_pixel(x, y, Luma([lum]));
    }

    gray
}

pub fn rgb_to_hsv(image: &RgbImage) -> HsvImage {
    let (width, height) = image.dimensions();
    let mut hsv = HsvImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let r = pixel[0] as f64 / 255.0;
        let g = pixel[1] as f64 / 255.0;
        let b = pixel[2] as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let mut h = if delta < 1e-12 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta)
        } else if max == g {
            60.0 * ((b - r) / delta) + 120.0
        } else {
            60.0 * ((r - g) / delta) + 240.0
        };
        if h < 0.0 {
            h += 360.0;
        }

        let s = if max < 1e-12 { 0.0 } else { delta / max };

        hsv.put_pixel(
            x,
            y,
            Rgb([
                (h / 2.0).round().min(179.0) as u8,
                (s * 255.0).round() as u8,
                (max * 255.0).round() as u8,
            ]),
        );
    }

    hsv
}

/// 5x5 binomial approximation of a Gaussian. Samples outside the frame
/// replicate the border pixel so the residual stays flat at the edges.
pub fn gaussian_blur_5x5(image: &GrayImage) -> GrayImage {
    const TAPS: [f64; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
    const WEIGHT: f64 = 256.0;

    let (width, height) = image.dimensions();
    let mut smoothed = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;

            for (ky, wy) in TAPS.iter().enumerate() {
                for (kx, wx) in TAPS.iter().enumerate() {
                    let px = (x as i64 + kx as i64 - 2).clamp(0, width as i64 - 1) as u32;
                    let py = (y as i64 + ky as i64 - 2).clamp(0, height as i64 - 1) as u32;
                    acc += image.get_pixel(px, py)[0] as f64 * wx * wy;
                }
            }

            smoothed.put_pixel(x, y, Luma([(acc / WEIGHT).round().clamp(0.0, 255.0) as u8]));
        }
    }

    smoothed
}

pub fn gray_to_array(image: &GrayImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut arr = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        arr[[y as usize, x as usize]] = pixel[0] as f64;
    }

    arr
}

pub fn extract_block(image: &GrayImage, x: u32, y: u32, size: u32) -> Vec<u8> {
    let mut block = Vec::with_capacity((size * size) as usize);

    for dy in 0..size {
        for dx in 0..size {
            if x + dx < image.width() && y + dy < image.height() {
                block.push(image.get_pixel(x + dx, y + dy)[0]);
            }
        }
    }

    block
}

pub fn block_mean(block: &[u8]) -> f64 {
    if block.is_empty() {
        return 0.0;
    }
    block.iter().map(|&v| v as f64).sum::<f64>() / block.len() as f64
}

pub fn block_variance(block: &[u8]) -> f64 {
    if block.is_empty() {
        return 0.0;
    }
    let mean = block_mean(block);
    block
        .iter()
        .map(|&v| {
            let diff = v as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / block.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_block_has_zero_variance() {
        let block = vec![42u8; 64];
        assert_eq!(block_variance(&block), 0.0);
        assert_eq!(block_mean(&block), 42.0);
    }

    #[test]
    fn blur_preserves_flat_image() {
        let flat = GrayImage::from_pixel(16, 16, Luma([100]));
        let smoothed = gaussian_blur_5x5(&flat);
        assert!(smoothed.pixels().all(|p| p[0] == 100));
    }

    #[test]
    fn hsv_of_pure_red() {
        let red = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        let hsv = rgb_to_hsv(&red);
        let p = hsv.get_pixel(0, 0);
        assert_eq!(p[0], 0);
        assert_eq!(p[1], 255);
        assert_eq!(p[2], 255);
    }

    #[test]
    fn gray_array_round_trip_dimensions() {
        let gray = GrayImage::new(7, 3);
        let arr = gray_to_array(&gray);
        assert_eq!(arr.dim(), (3, 7));
    }
}
