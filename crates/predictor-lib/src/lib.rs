//! Core library for the diabetes predictor
//!
//! This crate provides:
//! - The ordered patient feature schema and the immutable patient record
//! - A predictor adapter around an opaque pre-trained classifier (ONNX or logistic JSON)
//! - Verdict presentation with fixed health advice and a probability pie chart
//! - Single-row CSV report export
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod presenter;
pub mod report;
pub mod schema;

pub use error::{PredictorError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::{FeatureRow, Outcome, PatientRecord, PredictionResult};
pub use observability::{PredictorMetrics, StructuredLogger};
pub use predictor::{load_model, Classifier, ModelInfo, PredictorAdapter};
pub use presenter::{PieChart, PredictionResponse, Severity, Verdict};
pub use report::{export_report, parse_report, ReportRow};
pub use schema::{FieldKind, FieldSpec, PATIENT_SCHEMA};
