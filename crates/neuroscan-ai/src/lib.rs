//! Inference layer: domain validation, the classifier capability, the ONNX
//! Runtime adapter, ensemble averaging, and saliency rendering.

pub mod classifier;
pub mod ensemble;
pub mod saliency;
pub mod validate;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

pub use classifier::{AiError, Classifier, FeatureMap, Inference};
pub use ensemble::{EnsembleAdapter, InferenceOutcome};
