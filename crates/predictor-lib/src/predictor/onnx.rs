//! ONNX classifier inference using tract
//!
//! Expects a classifier exported with a single `f32 [1, 8]` input, such as an
//! sklearn pipeline converted by skl2onnx with zipmap disabled. The class
//! probabilities are read from the float output holding two values; a single
//! float output is taken as the probability of the positive class.

use super::{Classifier, ModelInfo};
use crate::error::{PredictorError, Result};
use crate::schema::{self, NUM_FEATURES};
use anyhow::Context;
use tract_onnx::prelude::*;

/// Format tag reported in model info
pub const ONNX_FORMAT: &str = "onnx";

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based classifier using tract for lightweight inference
pub struct OnnxClassifier {
    model: TractModel,
    version: String,
}

impl OnnxClassifier {
    /// Parse, type and optimize an ONNX model from bytes
    pub fn from_bytes(model_bytes: &[u8], version: impl Into<String>) -> anyhow::Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;

        Ok(Self {
            model,
            version: version.into(),
        })
    }

    fn run(&self, features: &[f32]) -> anyhow::Result<[f64; 2]> {
        let input: Tensor =
            tract_ndarray::Array2::from_shape_vec((1, features.len()), features.to_vec())?.into();
        let outputs = self.model.run(tvec!(input.into()))?;

        // skl2onnx emits the int64 label first; only float outputs carry probabilities
        for output in outputs.iter() {
            if output.datum_type() != f32::datum_type() {
                continue;
            }
            let values: Vec<f32> = output.to_array_view::<f32>()?.iter().copied().collect();
            match values.as_slice() {
                [negative, positive] => return Ok([*negative as f64, *positive as f64]),
                [positive] => return Ok([1.0 - *positive as f64, *positive as f64]),
                _ => continue,
            }
        }

        anyhow::bail!("Model produced no float output with class probabilities")
    }
}

impl Classifier for OnnxClassifier {
    fn predict_proba(&self, features: &[f32]) -> Result<[f64; 2]> {
        if features.len() != NUM_FEATURES {
            return Err(PredictorError::InputMismatch(format!(
                "got {} values, model expects {}",
                features.len(),
                NUM_FEATURES
            )));
        }
        self.run(features)
            .map_err(|e| PredictorError::Inference(format!("{:#}", e)))
    }

    fn n_features(&self) -> usize {
        NUM_FEATURES
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            format: ONNX_FORMAT.to_string(),
            version: self.version.clone(),
            features: schema::feature_names().iter().map(|name| name.to_string()).collect(),
            sha256: None,
        }
    }
}
