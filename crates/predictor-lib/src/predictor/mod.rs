//! Prediction engine
//!
//! The model is an opaque artifact behind the [`Classifier`] trait. The
//! [`PredictorAdapter`] owns one classifier for the life of the process and
//! guards the feature contract between the collector and the model.

mod loader;
mod logistic;
mod onnx;

pub use loader::{load_model, sha256_hex, ModelFormat};
pub use logistic::{LogisticClassifier, Scaler};
pub use onnx::OnnxClassifier;

use crate::error::{PredictorError, Result};
use crate::models::{FeatureRow, PatientRecord, PredictionResult};
use crate::schema::{self, NUM_FEATURES};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// Classification latency above which a warning is logged
const MAX_INFERENCE_MS: u128 = 5;

/// Trait for binary classifier backends
pub trait Classifier: Send + Sync {
    /// Class probabilities `[P(no diabetes), P(diabetes)]` for one row
    fn predict_proba(&self, features: &[f32]) -> Result<[f64; 2]>;

    /// Number of input columns the model accepts
    fn n_features(&self) -> usize;

    /// Column names recorded in the artifact, when the format keeps them
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Descriptive metadata for the model endpoint and metrics
    fn info(&self) -> ModelInfo;
}

/// Metadata about the loaded model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub format: String,
    pub version: String,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sha256: Option<String>,
}

/// Boundary around the pre-trained classifier
pub struct PredictorAdapter {
    classifier: Box<dyn Classifier>,
    info: ModelInfo,
}

impl std::fmt::Debug for PredictorAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictorAdapter").field("info", &self.info).finish()
    }
}

impl PredictorAdapter {
    /// Wrap a classifier after checking it against the patient schema
    pub fn new(classifier: Box<dyn Classifier>) -> Result<Self> {
        match classifier.feature_names() {
            Some(names) => schema::validate_feature_names(names)?,
            None if classifier.n_features() != NUM_FEATURES => {
                return Err(PredictorError::InputMismatch(format!(
                    "model takes {} features, schema has {}",
                    classifier.n_features(),
                    NUM_FEATURES
                )));
            }
            None => {}
        }
        let info = classifier.info();
        Ok(Self { classifier, info })
    }

    pub(crate) fn with_checksum(mut self, sha256: String) -> Self {
        self.info.sha256 = Some(sha256);
        self
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Classify one patient record
    pub fn classify(&self, record: &PatientRecord) -> Result<PredictionResult> {
        self.classify_row(&record.to_feature_row())
    }

    /// Classify an explicit feature row
    ///
    /// The row's column names must match the model's columns exactly and in
    /// order; anything else aborts the prediction.
    pub fn classify_row(&self, row: &FeatureRow) -> Result<PredictionResult> {
        self.check_row(row)?;

        let start = Instant::now();
        let raw = self.classifier.predict_proba(&row.to_f32())?;
        let result = PredictionResult::from_probabilities(raw)?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(result)
    }

    fn check_row(&self, row: &FeatureRow) -> Result<()> {
        if row.len() != self.classifier.n_features() {
            return Err(PredictorError::InputMismatch(format!(
                "row has {} columns, model expects {}",
                row.len(),
                self.classifier.n_features()
            )));
        }

        let expected: Vec<&str> = match self.classifier.feature_names() {
            Some(names) => names.iter().map(String::as_str).collect(),
            None => schema::feature_names().to_vec(),
        };
        for (position, (got, want)) in row.names().zip(expected).enumerate() {
            if got != want {
                return Err(PredictorError::InputMismatch(format!(
                    "column {} is '{}', model expects '{}'",
                    position, got, want
                )));
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::models::{Outcome, PROBABILITY_TOLERANCE};
    use crate::schema::PATIENT_SCHEMA;

    #[test]
    fn test_classify_every_field_at_bounds() {
        let adapter = logistic_adapter();
        let base = PatientRecord::default();
        for spec in PATIENT_SCHEMA.iter() {
            for bound in [spec.min, spec.max] {
                let record = base.with_value(spec.name, bound).unwrap();
                let result = adapter
                    .classify(&record)
                    .unwrap_or_else(|e| panic!("{}={} failed: {}", spec.name, bound, e));
                let total: f64 = result.probabilities.iter().sum();
                assert!((total - 1.0).abs() < PROBABILITY_TOLERANCE);
            }
        }
    }

    #[test]
    fn test_all_minimums_and_all_maximums() {
        let adapter = logistic_adapter();
        let low = PatientRecord::from_named_values(PATIENT_SCHEMA.iter().map(|s| (s.name, s.min))).unwrap();
        let high = PatientRecord::from_named_values(PATIENT_SCHEMA.iter().map(|s| (s.name, s.max))).unwrap();

        assert_eq!(adapter.classify(&low).unwrap().outcome, Outcome::NoDiabetes);
        assert_eq!(adapter.classify(&high).unwrap().outcome, Outcome::Diabetes);
    }

    #[test]
    fn test_confidence_is_max_probability() {
        let adapter = logistic_adapter();
        let base = PatientRecord::default();
        for glucose in [0.0, 60.0, 120.0, 180.0, 240.0, 300.0] {
            let record = base.with_value(schema::GLUCOSE, glucose).unwrap();
            let result = adapter.classify(&record).unwrap();
            let max = result.probabilities[0].max(result.probabilities[1]);
            assert_eq!(result.confidence(), max);
            assert_eq!(result.confidence_percent(), (max * 100.0 * 100.0).round() / 100.0);
        }
    }

    #[test]
    fn test_classify_does_not_touch_record() {
        let adapter = logistic_adapter();
        let record = PatientRecord::default();
        let copy = record;
        adapter.classify(&record).unwrap();
        let changed = record.with_value(schema::INSULIN, 400.0).unwrap();
        adapter.classify(&changed).unwrap();
        assert_eq!(record, copy);
        assert_eq!(changed.glucose(), record.glucose());
    }

    #[test]
    fn test_swapped_columns_rejected() {
        let adapter = logistic_adapter();
        let mut columns: Vec<(String, f64)> = PATIENT_SCHEMA
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default))
            .collect();
        columns.swap(1, 2);
        let err = adapter.classify_row(&FeatureRow::new(columns)).unwrap_err();
        assert_eq!(err.code(), "MODEL_INPUT_MISMATCH");
    }

    #[test]
    fn test_missing_column_rejected() {
        let adapter = logistic_adapter();
        let columns: Vec<(String, f64)> = PATIENT_SCHEMA
            .iter()
            .take(7)
            .map(|spec| (spec.name.to_string(), spec.default))
            .collect();
        let err = adapter.classify_row(&FeatureRow::new(columns)).unwrap_err();
        assert_eq!(err.code(), "MODEL_INPUT_MISMATCH");
    }

    #[test]
    fn test_unnamed_model_checked_against_schema() {
        let classifier = FixedClassifier {
            probabilities: [0.2, 0.8],
            n_features: NUM_FEATURES,
        };
        let adapter = PredictorAdapter::new(Box::new(classifier)).unwrap();

        let result = adapter.classify(&PatientRecord::default()).unwrap();
        assert_eq!(result.outcome, Outcome::Diabetes);

        let mut columns: Vec<(String, f64)> = PATIENT_SCHEMA
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default))
            .collect();
        columns[5].0 = "Bmi".to_string();
        assert!(adapter.classify_row(&FeatureRow::new(columns)).is_err());
    }

    #[test]
    fn test_wrong_arity_model_rejected() {
        let classifier = FixedClassifier {
            probabilities: [0.5, 0.5],
            n_features: 7,
        };
        let err = PredictorAdapter::new(Box::new(classifier)).unwrap_err();
        assert_eq!(err.code(), "MODEL_INPUT_MISMATCH");
    }

    #[test]
    fn test_invalid_probabilities_surface_as_inference_error() {
        let classifier = FixedClassifier {
            probabilities: [f64::NAN, 0.5],
            n_features: NUM_FEATURES,
        };
        let adapter = PredictorAdapter::new(Box::new(classifier)).unwrap();
        let err = adapter.classify(&PatientRecord::default()).unwrap_err();
        assert_eq!(err.code(), "INFERENCE_FAILURE");
    }
}
