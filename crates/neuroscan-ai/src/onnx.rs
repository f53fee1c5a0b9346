//! ONNX Runtime classifier adapter.
//!
//! Loads a `.onnx` model, introspects its input resolution and tensor layout,
//! and exposes it behind the [`Classifier`] capability. When the model
//! exports an additional 4-D output, that tensor is returned as the spatial
//! feature map used for saliency rendering.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::classifier::{AiError, Classifier, FeatureMap, Inference};

/// Tensor layout of the model's image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Nhwc,
    Nchw,
}

pub struct OnnxClassifier {
    session: Mutex<Session>,
    name: String,
    input_name: String,
    input_size: Option<(u32, u32)>,
    layout: Layout,
    output_count: usize,
}

impl OnnxClassifier {
    /// Load a classifier from a `.onnx` file.
    pub fn load(model_path: &Path) -> anyhow::Result<Self> {
        anyhow::ensure!(model_path.exists(), "model not found at {model_path:?}");

        let session = Session::builder()?.commit_from_file(model_path)?;
        let input_name = session.inputs()[0].name().to_string();
        let (input_size, layout) = introspect_input(session.inputs()[0].dtype());
        let output_count = session.outputs().len();

        let name = model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| model_path.display().to_string());

        info!(
            model = %model_path.display(),
            ?input_size,
            ?layout,
            outputs = output_count,
            "loaded ONNX classifier"
        );

        Ok(Self {
            session: Mutex::new(session),
            name,
            input_name,
            input_size,
            layout,
            output_count,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_size(&self) -> Option<(u32, u32)> {
        self.input_size
    }

    fn infer(&self, pixels: &[f32], width: u32, height: u32) -> Result<Inference, AiError> {
        let (h, w) = (height as usize, width as usize);
        if pixels.len() != h * w * 3 {
            return Err(AiError::InferenceFailed(format!(
                "input tensor length {} does not match {h}x{w}x3",
                pixels.len()
            )));
        }

        let (shape, data) = match self.layout {
            Layout::Nhwc => ([1i64, h as i64, w as i64, 3], pixels.to_vec()),
            Layout::Nchw => ([1i64, 3, h as i64, w as i64], transpose_to_chw(pixels, h, w)),
        };

        let tensor = Tensor::from_array((shape, data.into_boxed_slice()))
            .map_err(|e| AiError::InferenceFailed(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| AiError::InferenceFailed("classifier lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| AiError::InferenceFailed(e.to_string()))?;

        let (out_shape, out_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| AiError::InferenceFailed(e.to_string()))?;
        let dims: &[i64] = out_shape;
        let classes = dims.last().copied().unwrap_or(0).max(0) as usize;
        if classes == 0 || out_data.len() < classes {
            return Err(AiError::InferenceFailed(format!(
                "unexpected output shape: {dims:?}"
            )));
        }
        let probs = out_data[..classes].to_vec();

        // Any additional 4-D output is treated as the last spatial layer.
        let mut features = None;
        for idx in 1..self.output_count {
            if let Ok((f_shape, f_data)) = outputs[idx].try_extract_tensor::<f32>() {
                let f_dims: &[i64] = f_shape;
                if f_dims.len() == 4 {
                    features = feature_map_from(f_dims, f_data, self.layout);
                    if features.is_some() {
                        break;
                    }
                }
            }
        }

        Ok(Inference { probs, features })
    }
}

/// Derive `(width, height)` and tensor layout from the model's input type.
/// Dynamic dimensions leave the size unset so the caller falls back to its
/// default resolution.
fn introspect_input(input_type: &ort::value::ValueType) -> (Option<(u32, u32)>, Layout) {
    if let ort::value::ValueType::Tensor { shape, .. } = input_type {
        if shape.len() == 4 {
            if shape[3] == 3 {
                let size = (shape[1] > 0 && shape[2] > 0)
                    .then(|| (shape[2] as u32, shape[1] as u32));
                return (size, Layout::Nhwc);
            }
            if shape[1] == 3 {
                let size = (shape[2] > 0 && shape[3] > 0)
                    .then(|| (shape[3] as u32, shape[2] as u32));
                return (size, Layout::Nchw);
            }
        }
    }
    (None, Layout::Nhwc)
}

/// Transpose a flat HWC buffer to CHW.
fn transpose_to_chw(pixels: &[f32], height: usize, width: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; pixels.len()];
    let plane = height * width;
    for y in 0..height {
        for x in 0..width {
            for c in 0..3 {
                out[c * plane + y * width + x] = pixels[(y * width + x) * 3 + c];
            }
        }
    }
    out
}

/// Interpret a 4-D activation tensor as a channel-major feature map,
/// following the model's input layout convention.
fn feature_map_from(dims: &[i64], data: &[f32], layout: Layout) -> Option<FeatureMap> {
    if dims.iter().any(|&d| d <= 0) || dims[0] != 1 {
        return None;
    }
    let (channels, height, width) = match layout {
        Layout::Nchw => (dims[1] as usize, dims[2] as usize, dims[3] as usize),
        Layout::Nhwc => (dims[3] as usize, dims[1] as usize, dims[2] as usize),
    };
    if data.len() != channels * height * width {
        return None;
    }

    let converted = match layout {
        Layout::Nchw => data.to_vec(),
        Layout::Nhwc => {
            let mut out = vec![0.0f32; data.len()];
            let plane = height * width;
            for y in 0..height {
                for x in 0..width {
                    for c in 0..channels {
                        out[c * plane + y * width + x] = data[(y * width + x) * channels + c];
                    }
                }
            }
            out
        }
    };

    Some(FeatureMap {
        data: converted,
        channels,
        height,
        width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_round_trips_known_values() {
        // 1x2 image: pixel (0,0) = [1,2,3], pixel (0,1) = [4,5,6].
        let hwc = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let chw = transpose_to_chw(&hwc, 1, 2);
        assert_eq!(chw, [1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn nhwc_feature_map_converts_to_channel_major() {
        // [1, 1, 2, 2]: one row, two columns, two channels.
        let data = [10.0, 20.0, 30.0, 40.0];
        let map = feature_map_from(&[1, 1, 2, 2], &data, Layout::Nhwc).unwrap();
        assert_eq!(map.channels, 2);
        assert_eq!(map.at(0, 0, 0), 10.0);
        assert_eq!(map.at(1, 0, 0), 20.0);
        assert_eq!(map.at(0, 0, 1), 30.0);
    }

    #[test]
    fn feature_map_rejects_dynamic_or_batched_shapes() {
        let data = [0.0; 8];
        assert!(feature_map_from(&[2, 2, 1, 2], &data, Layout::Nchw).is_none());
        assert!(feature_map_from(&[1, -1, 2, 2], &data, Layout::Nchw).is_none());
    }
}
