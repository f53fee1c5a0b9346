//! Classifier ensemble: preprocessing, probability blending, and ranking.
//!
//! Wraps one primary and at most one alternate classifier behind a single
//! "probability vector over labels" contract. When both are present and their
//! output shapes match, probabilities are averaged elementwise; the averaged
//! vector is deliberately not renormalized.

use std::sync::Arc;

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::warn;

use neuroscan_core::{LabelCatalog, Prediction, TopPrediction};

use crate::classifier::{AiError, Classifier, FeatureMap};

/// Input resolution used when the primary model does not declare one.
const DEFAULT_INPUT_SIZE: (u32, u32) = (150, 150);
const TOP_K: usize = 5;

/// Everything the orchestrator needs from one inference pass.
#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    pub prediction: Prediction,
    /// Winning class index (stable argmax).
    pub class_index: usize,
    /// `(width, height)` the image was resized to.
    pub input_size: (u32, u32),
    /// Primary model's spatial feature map, for saliency rendering.
    pub features: Option<FeatureMap>,
}

pub struct EnsembleAdapter {
    primary: Box<dyn Classifier>,
    alternate: Option<Box<dyn Classifier>>,
    catalog: Arc<LabelCatalog>,
}

impl EnsembleAdapter {
    pub fn new(
        primary: Box<dyn Classifier>,
        alternate: Option<Box<dyn Classifier>>,
        catalog: Arc<LabelCatalog>,
    ) -> Self {
        Self {
            primary,
            alternate,
            catalog,
        }
    }

    /// Name of the primary model, reported in response metadata.
    pub fn model_name(&self) -> &str {
        self.primary.name()
    }

    /// Classify a validated image.
    ///
    /// Alternate-model failures and shape mismatches are logged and ignored;
    /// only primary-model failures surface.
    pub fn infer(&self, image: &DynamicImage) -> Result<InferenceOutcome, AiError> {
        let (width, height) = self.primary.input_size().unwrap_or(DEFAULT_INPUT_SIZE);
        let pixels = normalize_pixels(image, width, height);

        let primary = self.primary.infer(&pixels, width, height)?;
        let mut probs = expand_binary(primary.probs);
        if probs.is_empty() {
            return Err(AiError::InferenceFailed(
                "classifier returned an empty probability vector".to_string(),
            ));
        }

        if let Some(alternate) = &self.alternate {
            match alternate.infer(&pixels, width, height) {
                Ok(out) => {
                    let alt_probs = expand_binary(out.probs);
                    if alt_probs.len() == probs.len() {
                        for (p, a) in probs.iter_mut().zip(&alt_probs) {
                            *p = (*p + *a) / 2.0;
                        }
                    } else {
                        warn!(
                            primary = probs.len(),
                            alternate = alt_probs.len(),
                            "alternate classifier shape mismatch, ignoring"
                        );
                    }
                }
                Err(err) => warn!(%err, "alternate classifier failed, ignoring"),
            }
        }

        let class_index = argmax(&probs);
        let prediction = self.rank(&probs, class_index);

        Ok(InferenceOutcome {
            prediction,
            class_index,
            input_size: (width, height),
            features: primary.features,
        })
    }

    fn rank(&self, probs: &[f32], class_index: usize) -> Prediction {
        // Sort by probability descending, ties by class index ascending.
        let mut order: Vec<usize> = (0..probs.len()).collect();
        order.sort_by(|&a, &b| {
            probs[b]
                .partial_cmp(&probs[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        let top_k = order
            .iter()
            .take(TOP_K.min(probs.len()))
            .map(|&i| TopPrediction {
                label: self.catalog.name(i),
                probability: probs[i],
            })
            .collect();

        let probs_map = probs
            .iter()
            .enumerate()
            .map(|(i, &p)| (self.catalog.name(i), p))
            .collect();

        Prediction {
            label: self.catalog.name(class_index),
            confidence: probs[class_index],
            top_k,
            probs: probs_map,
        }
    }
}

/// Resize to the model resolution and scale pixel values to [0, 1],
/// flattened NHWC.
pub fn normalize_pixels(image: &DynamicImage, width: u32, height: u32) -> Vec<f32> {
    let resized = image
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgb8();
    let mut out = Vec::with_capacity((width * height * 3) as usize);
    for pixel in resized.pixels() {
        for channel in pixel.0 {
            out.push(channel as f32 / 255.0);
        }
    }
    out
}

/// Expand a single-element binary output `[p]` to `[1 - p, p]`.
fn expand_binary(probs: Vec<f32>) -> Vec<f32> {
    if probs.len() == 1 {
        vec![1.0 - probs[0], probs[0]]
    } else {
        probs
    }
}

/// Index of the maximum value; ties resolve to the lowest index.
fn argmax(probs: &[f32]) -> usize {
    let mut best = 0;
    for (i, &p) in probs.iter().enumerate() {
        if p > probs[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Inference;
    use std::collections::HashMap;

    /// Classifier stub returning a fixed probability vector.
    struct Fixed {
        probs: Vec<f32>,
        size: Option<(u32, u32)>,
    }

    impl Fixed {
        fn new(probs: Vec<f32>) -> Self {
            Self {
                probs,
                size: Some((32, 32)),
            }
        }
    }

    impl Classifier for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn input_size(&self) -> Option<(u32, u32)> {
            self.size
        }

        fn infer(&self, _pixels: &[f32], _w: u32, _h: u32) -> Result<Inference, AiError> {
            Ok(Inference {
                probs: self.probs.clone(),
                features: None,
            })
        }
    }

    struct Failing;

    impl Classifier for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn infer(&self, _pixels: &[f32], _w: u32, _h: u32) -> Result<Inference, AiError> {
            Err(AiError::InferenceFailed("boom".to_string()))
        }
    }

    fn catalog() -> Arc<LabelCatalog> {
        let mut m = HashMap::new();
        m.insert("1".to_string(), "glioma".to_string());
        Arc::new(LabelCatalog::from_map(m))
    }

    fn test_image() -> DynamicImage {
        DynamicImage::ImageLuma8(image::GrayImage::from_fn(64, 64, |x, _| {
            image::Luma([(x * 4 % 256) as u8])
        }))
    }

    #[test]
    fn single_model_argmax_and_top_k() {
        let adapter = EnsembleAdapter::new(
            Box::new(Fixed::new(vec![0.1, 0.7, 0.1, 0.1])),
            None,
            catalog(),
        );
        let outcome = adapter.infer(&test_image()).unwrap();
        let p = &outcome.prediction;
        assert_eq!(p.label, "glioma");
        assert!((p.confidence - 0.7).abs() < 1e-6);
        assert_eq!(outcome.class_index, 1);
        assert_eq!(p.top_k[0].label, "glioma");
        assert!((p.top_k[0].probability - 0.7).abs() < 1e-6);
        assert_eq!(p.top_k.len(), 4);
        assert_eq!(p.probs.len(), 4);
        // Unmapped indices fall back to the index string.
        assert!((p.probs["0"] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn matching_shapes_are_averaged_without_renormalization() {
        let adapter = EnsembleAdapter::new(
            Box::new(Fixed::new(vec![0.2, 0.8])),
            Some(Box::new(Fixed::new(vec![0.4, 0.4]))),
            catalog(),
        );
        let outcome = adapter.infer(&test_image()).unwrap();
        let p = &outcome.prediction;
        // Elementwise mean at the winning index; the blended vector sums to
        // 0.9 and stays that way.
        assert!((p.confidence - 0.6).abs() < 1e-6);
        let total: f32 = p.probs.values().sum();
        assert!((total - 0.9).abs() < 1e-6);
    }

    #[test]
    fn shape_mismatch_keeps_primary_result() {
        let adapter = EnsembleAdapter::new(
            Box::new(Fixed::new(vec![0.1, 0.7, 0.2])),
            Some(Box::new(Fixed::new(vec![0.5, 0.5]))),
            catalog(),
        );
        let outcome = adapter.infer(&test_image()).unwrap();
        assert!((outcome.prediction.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn alternate_failure_is_not_fatal() {
        let adapter = EnsembleAdapter::new(
            Box::new(Fixed::new(vec![0.3, 0.7])),
            Some(Box::new(Failing)),
            catalog(),
        );
        let outcome = adapter.infer(&test_image()).unwrap();
        assert!((outcome.prediction.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn primary_failure_surfaces() {
        let adapter = EnsembleAdapter::new(Box::new(Failing), None, catalog());
        assert!(matches!(
            adapter.infer(&test_image()),
            Err(AiError::InferenceFailed(_))
        ));
    }

    #[test]
    fn binary_output_expands_to_two_classes() {
        let adapter = EnsembleAdapter::new(Box::new(Fixed::new(vec![0.8])), None, catalog());
        let outcome = adapter.infer(&test_image()).unwrap();
        let p = &outcome.prediction;
        assert_eq!(outcome.class_index, 1);
        assert!((p.confidence - 0.8).abs() < 1e-6);
        assert!((p.probs["0"] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn argmax_ties_break_to_lowest_index() {
        let adapter = EnsembleAdapter::new(
            Box::new(Fixed::new(vec![0.25, 0.25, 0.25, 0.25])),
            None,
            catalog(),
        );
        let outcome = adapter.infer(&test_image()).unwrap();
        assert_eq!(outcome.class_index, 0);
        // Tied top-k entries stay in class-index order.
        assert_eq!(outcome.prediction.top_k[0].label, "0");
        assert_eq!(outcome.prediction.top_k[1].label, "glioma");
    }

    #[test]
    fn default_input_size_when_model_declares_none() {
        let mut fixed = Fixed::new(vec![0.5, 0.5]);
        fixed.size = None;
        let adapter = EnsembleAdapter::new(Box::new(fixed), None, catalog());
        let outcome = adapter.infer(&test_image()).unwrap();
        assert_eq!(outcome.input_size, DEFAULT_INPUT_SIZE);
    }

    #[test]
    fn normalize_pixels_scales_to_unit_range() {
        let pixels = normalize_pixels(&test_image(), 8, 8);
        assert_eq!(pixels.len(), 8 * 8 * 3);
        assert!(pixels.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
}
