//! Logistic regression classifier read from a JSON artifact
//!
//! The artifact carries the fitted coefficients, the intercept and the
//! optional standard-scaler statistics of an sklearn pipeline, together with
//! the column names it was trained on.

use super::{Classifier, ModelInfo};
use crate::error::{PredictorError, Result};
use anyhow::Context;
use serde::Deserialize;

/// Format tag expected in the artifact
pub const LOGISTIC_FORMAT: &str = "logistic";

/// Standard-scaler statistics applied before the linear term
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct LogisticArtifact {
    format: String,
    #[serde(default = "default_version")]
    version: String,
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
    #[serde(default)]
    scaler: Option<Scaler>,
}

fn default_version() -> String {
    "unversioned".to_string()
}

#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    version: String,
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
    scaler: Option<Scaler>,
}

impl LogisticClassifier {
    /// Parse and sanity-check a JSON artifact
    pub fn from_json(bytes: &[u8]) -> anyhow::Result<Self> {
        let artifact: LogisticArtifact =
            serde_json::from_slice(bytes).context("Failed to parse logistic model JSON")?;

        if artifact.format != LOGISTIC_FORMAT {
            anyhow::bail!(
                "Unsupported model format '{}', expected '{}'",
                artifact.format,
                LOGISTIC_FORMAT
            );
        }

        let width = artifact.feature_names.len();
        if artifact.coefficients.len() != width {
            anyhow::bail!(
                "Model has {} coefficients for {} features",
                artifact.coefficients.len(),
                width
            );
        }
        if let Some(scaler) = &artifact.scaler {
            if scaler.mean.len() != width || scaler.scale.len() != width {
                anyhow::bail!("Scaler statistics do not cover {} features", width);
            }
            if scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                anyhow::bail!("Scaler has a zero or non-finite scale");
            }
        }
        if !artifact.intercept.is_finite() || artifact.coefficients.iter().any(|c| !c.is_finite()) {
            anyhow::bail!("Model has non-finite coefficients");
        }

        Ok(Self {
            version: artifact.version,
            feature_names: artifact.feature_names,
            coefficients: artifact.coefficients,
            intercept: artifact.intercept,
            scaler: artifact.scaler,
        })
    }

    fn decision_function(&self, features: &[f32]) -> f64 {
        let mut z = self.intercept;
        for (i, (coefficient, value)) in self.coefficients.iter().zip(features).enumerate() {
            let x = match &self.scaler {
                Some(scaler) => (*value as f64 - scaler.mean[i]) / scaler.scale[i],
                None => *value as f64,
            };
            z += coefficient * x;
        }
        z
    }
}

impl Classifier for LogisticClassifier {
    fn predict_proba(&self, features: &[f32]) -> Result<[f64; 2]> {
        if features.len() != self.coefficients.len() {
            return Err(PredictorError::InputMismatch(format!(
                "got {} values, model expects {}",
                features.len(),
                self.coefficients.len()
            )));
        }
        let positive = 1.0 / (1.0 + (-self.decision_function(features)).exp());
        Ok([1.0 - positive, positive])
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature_names)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            format: LOGISTIC_FORMAT.to_string(),
            version: self.version.clone(),
            features: self.feature_names.clone(),
            sha256: None,
        }
    }
}
