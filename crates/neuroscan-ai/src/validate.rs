//! Heuristic domain gate for uploaded scans.
//!
//! Rejects images that are unlikely to be grayscale medical scans before any
//! model runs: color photographs, tiny thumbnails, implausibly large files,
//! and near-blank images. This is a permissive gate, not a classifier; it
//! fails closed and tolerates false positives.

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::debug;

/// Resolution the grayscale check downsamples to.
const CHECK_RESOLUTION: u32 = 256;
/// Maximum mean absolute difference between channel pairs (0-255 scale).
/// Allows slight color casts introduced by format conversion.
const CHANNEL_DIFF_THRESHOLD: f64 = 30.0;
const MIN_DIMENSION: u32 = 64;
const MAX_DIMENSION: u32 = 2000;
/// Minimum standard deviation of luma intensity.
const MIN_CONTRAST_STDDEV: f64 = 5.0;

/// True when the image plausibly belongs to the grayscale scan domain.
pub fn validate(image: &DynamicImage) -> bool {
    if !is_grayscale_like(image) {
        debug!("image rejected: not grayscale-like");
        return false;
    }

    let width = image.width();
    let height = image.height();
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        debug!(width, height, "image rejected: too small");
        return false;
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        debug!(width, height, "image rejected: too large");
        return false;
    }

    let contrast = luma_stddev(image);
    if contrast < MIN_CONTRAST_STDDEV {
        debug!(contrast, "image rejected: very low contrast");
        return false;
    }

    true
}

/// Check whether the image is mostly grayscale (low channel variance).
///
/// Single-channel images pass outright. Three-channel images must keep the
/// mean absolute difference between every channel pair under
/// [`CHANNEL_DIFF_THRESHOLD`].
pub fn is_grayscale_like(image: &DynamicImage) -> bool {
    if matches!(
        image,
        DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
    ) {
        return true;
    }

    let small = image
        .resize_exact(CHECK_RESOLUTION, CHECK_RESOLUTION, FilterType::Triangle)
        .to_rgb8();

    let mut diff_rg = 0.0f64;
    let mut diff_rb = 0.0f64;
    let mut diff_gb = 0.0f64;
    for pixel in small.pixels() {
        let [r, g, b] = pixel.0;
        diff_rg += (r as f64 - g as f64).abs();
        diff_rb += (r as f64 - b as f64).abs();
        diff_gb += (g as f64 - b as f64).abs();
    }
    let n = (small.width() * small.height()) as f64;
    diff_rg /= n;
    diff_rb /= n;
    diff_gb /= n;

    diff_rg < CHANNEL_DIFF_THRESHOLD
        && diff_rb < CHANNEL_DIFF_THRESHOLD
        && diff_gb < CHANNEL_DIFF_THRESHOLD
}

/// Standard deviation of pixel intensity over the luma-converted image.
fn luma_stddev(image: &DynamicImage) -> f64 {
    let gray = image.to_luma8();
    let n = (gray.width() * gray.height()) as f64;
    if n == 0.0 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    for pixel in gray.pixels() {
        sum += pixel.0[0] as f64;
    }
    let mean = sum / n;

    let mut var = 0.0f64;
    for pixel in gray.pixels() {
        let d = pixel.0[0] as f64 - mean;
        var += d * d;
    }
    (var / n).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgb, RgbImage};

    fn gray_gradient(size: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(size, size, |x, y| {
            image::Luma([((x + y) % 256) as u8])
        }))
    }

    #[test]
    fn accepts_grayscale_gradient() {
        assert!(validate(&gray_gradient(256)));
    }

    #[test]
    fn accepts_rgb_with_equal_channels() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(256, 256, |x, _| {
            let v = (x % 256) as u8;
            Rgb([v, v, v])
        }));
        assert!(validate(&img));
    }

    #[test]
    fn rejects_color_photograph() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(256, 256, |x, y| {
            Rgb([((x * 7) % 256) as u8, ((y * 3) % 256) as u8, 200])
        }));
        assert!(!is_grayscale_like(&img));
        assert!(!validate(&img));
    }

    #[test]
    fn rejects_too_small() {
        assert!(!validate(&gray_gradient(32)));
    }

    #[test]
    fn rejects_too_large() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(2048, 128, |x, _| {
            image::Luma([(x % 256) as u8])
        }));
        assert!(!validate(&img));
    }

    #[test]
    fn rejects_flat_image() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(256, 256, image::Luma([128])));
        assert!(!validate(&img));
    }

    #[test]
    fn channel_diff_bound_holds_for_accepted_rgb() {
        // The grayscale check guarantees every channel pair differs by less
        // than the threshold on average; spot-check with a slight cast.
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(128, 128, |x, _| {
            let v = (x % 200) as u8;
            Rgb([v, v.saturating_add(10), v.saturating_sub(5)])
        }));
        assert!(is_grayscale_like(&img));
    }
}
