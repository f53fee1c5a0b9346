//! The classifier capability.
//!
//! A classifier takes a normalized NHWC f32 RGB tensor and returns a
//! probability vector over the catalog's classes, optionally alongside the
//! model's last spatial feature map for saliency rendering. Concrete
//! adapters wrap the underlying runtime; callers never see runtime types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("no classifier is loaded")]
    ModelUnavailable,
    #[error("inference failed: {0}")]
    InferenceFailed(String),
}

/// Last spatial (4-D) activation of a model, laid out channel-major
/// (`data[c * height * width + y * width + x]`).
#[derive(Debug, Clone)]
pub struct FeatureMap {
    pub data: Vec<f32>,
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl FeatureMap {
    /// Activation value at one spatial position of one channel.
    pub fn at(&self, channel: usize, y: usize, x: usize) -> f32 {
        self.data[channel * self.height * self.width + y * self.width + x]
    }
}

/// Output of one classifier invocation.
#[derive(Debug, Clone)]
pub struct Inference {
    /// Probability vector over classes, in class-index order.
    pub probs: Vec<f32>,
    /// Spatial feature map for saliency, when the model exposes one.
    pub features: Option<FeatureMap>,
}

/// A pre-trained image classifier.
pub trait Classifier: Send + Sync {
    /// Identifier reported in response metadata.
    fn name(&self) -> &str;

    /// Declared input resolution as `(width, height)`, when the model
    /// exposes one.
    fn input_size(&self) -> Option<(u32, u32)> {
        None
    }

    /// Run inference over a normalized NHWC RGB tensor of the given
    /// dimensions.
    fn infer(&self, pixels: &[f32], width: u32, height: u32) -> Result<Inference, AiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_map_indexing_is_channel_major() {
        let f = FeatureMap {
            data: (0..24).map(|v| v as f32).collect(),
            channels: 2,
            height: 3,
            width: 4,
        };
        assert_eq!(f.at(0, 0, 0), 0.0);
        assert_eq!(f.at(0, 1, 2), 6.0);
        assert_eq!(f.at(1, 0, 0), 12.0);
        assert_eq!(f.at(1, 2, 3), 23.0);
    }
}
