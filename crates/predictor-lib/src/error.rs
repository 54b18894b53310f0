//! Error types for the predictor library

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, PredictorError>;

/// Failure conditions surfaced by the collector, adapter and exporter
#[derive(Debug, Error)]
pub enum PredictorError {
    /// The model artifact could not be read, parsed or validated at startup
    #[error("failed to load model from {path:?}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// The feature row does not match what the model was trained on
    #[error("model input mismatch: {0}")]
    InputMismatch(String),

    /// A field value falls outside its declared bounds
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A field declared as an integer received a fractional value
    #[error("{field} must be a whole number (got {value})")]
    NotAnInteger { field: &'static str, value: f64 },

    /// The model ran but produced unusable output
    #[error("inference failed: {0}")]
    Inference(String),

    /// The report could not be written or read back
    #[error("report error: {0}")]
    Report(String),
}

impl PredictorError {
    pub(crate) fn model_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable code for logs, metrics labels and API bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModelLoad { .. } => "MODEL_LOAD_FAILURE",
            Self::InputMismatch(_) => "MODEL_INPUT_MISMATCH",
            Self::OutOfRange { .. } | Self::NotAnInteger { .. } => "OUT_OF_RANGE",
            Self::Inference(_) => "INFERENCE_FAILURE",
            Self::Report(_) => "REPORT_FAILURE",
        }
    }
}

impl From<csv::Error> for PredictorError {
    fn from(err: csv::Error) -> Self {
        Self::Report(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            PredictorError::model_load("m.onnx", "missing").code(),
            "MODEL_LOAD_FAILURE"
        );
        assert_eq!(
            PredictorError::InputMismatch("x".into()).code(),
            "MODEL_INPUT_MISMATCH"
        );
        assert_eq!(
            PredictorError::NotAnInteger { field: "Age", value: 1.5 }.code(),
            "OUT_OF_RANGE"
        );
    }

    #[test]
    fn test_model_load_message_names_path() {
        let err = PredictorError::model_load("/models/missing.onnx", "No such file");
        let message = err.to_string();
        assert!(message.contains("missing.onnx"));
        assert!(message.contains("No such file"));
    }
}
