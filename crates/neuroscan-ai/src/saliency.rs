//! Saliency overlay rendering.
//!
//! Builds a class-activation-style heatmap from the primary model's last
//! spatial feature map, colorizes it, and alpha-blends it over the uploaded
//! image. Every failure path degrades to the plain image encoded identically;
//! this is a best-effort visual aid and never surfaces an error.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use tracing::warn;

use crate::classifier::FeatureMap;

/// Heatmap weight in the blend; the remainder is the original image.
const HEATMAP_ALPHA: f32 = 0.4;

/// Render the saliency overlay as PNG bytes, falling back to the plain image
/// when no feature map is available or any rendering step fails.
pub fn render_or_plain(image: &DynamicImage, features: Option<&FeatureMap>) -> Vec<u8> {
    if let Some(map) = features {
        match render_overlay(image, map) {
            Ok(png) => return png,
            Err(err) => warn!(%err, "saliency rendering failed, using plain image"),
        }
    }
    encode_png(image).unwrap_or_else(|err| {
        warn!(%err, "failed to encode plain image");
        Vec::new()
    })
}

/// Compute the heatmap overlay: mean absolute activation across channels,
/// min-max normalized, resized to the image dimensions, jet-colorized, and
/// blended 40/60 with the original.
fn render_overlay(image: &DynamicImage, map: &FeatureMap) -> anyhow::Result<Vec<u8>> {
    anyhow::ensure!(
        map.height > 0 && map.width > 0 && map.channels > 0,
        "degenerate feature map {}x{}x{}",
        map.channels,
        map.height,
        map.width
    );
    anyhow::ensure!(
        map.data.len() == map.channels * map.height * map.width,
        "feature map data length {} does not match shape",
        map.data.len()
    );

    // Mean absolute activation per spatial position.
    let mut cam = vec![0.0f32; map.height * map.width];
    for y in 0..map.height {
        for x in 0..map.width {
            let mut sum = 0.0f32;
            for c in 0..map.channels {
                sum += map.at(c, y, x).abs();
            }
            cam[y * map.width + x] = sum / map.channels as f32;
        }
    }

    // Min-max normalize; a flat map renders as a uniform (cold) overlay.
    let min = cam.iter().copied().fold(f32::INFINITY, f32::min);
    let max = cam.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if range > 0.0 {
        for v in &mut cam {
            *v = (*v - min) / range;
        }
    } else {
        cam.fill(0.0);
    }

    // Upsample the heatmap to the original image dimensions.
    let heat_small = GrayImage::from_fn(map.width as u32, map.height as u32, |x, y| {
        Luma([(cam[y as usize * map.width + x as usize] * 255.0) as u8])
    });
    let heat = image::imageops::resize(
        &heat_small,
        image.width(),
        image.height(),
        FilterType::Triangle,
    );

    let base = image.to_rgb8();
    let mut overlay = RgbImage::new(base.width(), base.height());
    for (x, y, pixel) in overlay.enumerate_pixels_mut() {
        let t = heat.get_pixel(x, y).0[0] as f32 / 255.0;
        let color = jet(t);
        let orig = base.get_pixel(x, y).0;
        let mut blended = [0u8; 3];
        for i in 0..3 {
            let v = HEATMAP_ALPHA * color[i] as f32 + (1.0 - HEATMAP_ALPHA) * orig[i] as f32;
            blended[i] = v.clamp(0.0, 255.0) as u8;
        }
        *pixel = Rgb(blended);
    }

    encode_png(&DynamicImage::ImageRgb8(overlay))
}

/// Encode any image as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> anyhow::Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Jet colormap approximation (0 = blue, 0.5 = green, 1 = red).
fn jet(t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let r = (1.5 - (4.0 * t - 3.0).abs()).clamp(0.0, 1.0);
    let g = (1.5 - (4.0 * t - 2.0).abs()).clamp(0.0, 1.0);
    let b = (1.5 - (4.0 * t - 1.0).abs()).clamp(0.0, 1.0);
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(96, 64, |x, y| {
            Luma([((x + y) % 256) as u8])
        }))
    }

    fn decode(png: &[u8]) -> DynamicImage {
        image::load_from_memory(png).expect("valid png")
    }

    #[test]
    fn plain_fallback_preserves_dimensions() {
        let img = test_image();
        let png = render_or_plain(&img, None);
        let decoded = decode(&png);
        assert_eq!((decoded.width(), decoded.height()), (96, 64));
    }

    #[test]
    fn overlay_preserves_dimensions() {
        let img = test_image();
        let map = FeatureMap {
            data: (0..2 * 5 * 5).map(|v| v as f32).collect(),
            channels: 2,
            height: 5,
            width: 5,
        };
        let png = render_or_plain(&img, Some(&map));
        let decoded = decode(&png);
        assert_eq!((decoded.width(), decoded.height()), (96, 64));
    }

    #[test]
    fn malformed_feature_map_falls_back_to_plain() {
        let img = test_image();
        let map = FeatureMap {
            data: vec![1.0; 3],
            channels: 2,
            height: 5,
            width: 5,
        };
        let png = render_or_plain(&img, Some(&map));
        // Still a decodable PNG of the original size.
        let decoded = decode(&png);
        assert_eq!((decoded.width(), decoded.height()), (96, 64));
    }

    #[test]
    fn flat_feature_map_still_renders() {
        let img = test_image();
        let map = FeatureMap {
            data: vec![0.5; 4 * 4],
            channels: 1,
            height: 4,
            width: 4,
        };
        let png = render_or_plain(&img, Some(&map));
        assert!(!png.is_empty());
        decode(&png);
    }

    #[test]
    fn jet_endpoints() {
        let cold = jet(0.0);
        assert!(cold[2] > cold[0] && cold[2] > cold[1]); // blue end
        let hot = jet(1.0);
        assert!(hot[0] > hot[1] && hot[0] > hot[2]); // red end
        assert_eq!(jet(0.5)[1], 255); // green middle
    }
}
