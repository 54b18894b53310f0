//! Observability for the prediction service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcomes, errors, exports, model info)
//! - Structured JSON logging with tracing

use crate::models::Outcome;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for classification latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once per process)
static GLOBAL_METRICS: OnceLock<MetricsInner> = OnceLock::new();

struct MetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    prediction_errors_total: IntCounterVec,
    reports_exported_total: IntCounter,
    model_info: GaugeVec,
}

impl MetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "diabetes_predictor_prediction_latency_seconds",
                "Time spent classifying one patient record",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "diabetes_predictor_predictions_total",
                "Predictions served, by predicted outcome",
                &["outcome"]
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter_vec!(
                "diabetes_predictor_prediction_errors_total",
                "Predictions aborted, by error code",
                &["code"]
            )
            .expect("Failed to register prediction_errors_total"),

            reports_exported_total: register_int_counter!(
                "diabetes_predictor_reports_exported_total",
                "Patient reports exported as CSV"
            )
            .expect("Failed to register reports_exported_total"),

            model_info: register_gauge_vec!(
                "diabetes_predictor_model_info",
                "Information about the loaded classifier",
                &["format", "version"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Lightweight handle to the process-wide metrics
///
/// Clones share the same underlying Prometheus collectors.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MetricsInner {
        GLOBAL_METRICS.get_or_init(MetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, outcome: Outcome) {
        self.inner()
            .predictions_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    pub fn inc_prediction_errors(&self, code: &str) {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[code])
            .inc();
    }

    pub fn inc_reports_exported(&self) {
        self.inner().reports_exported_total.inc();
    }

    /// Replace the model info series with the current model
    pub fn set_model_info(&self, format: &str, version: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[format, version])
            .set(1.0);
    }
}

/// Structured logger for service events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, bind_address: &str) {
        info!(
            event = "server_started",
            instance = %self.instance,
            server_version = %version,
            bind_address = %bind_address,
            "Diabetes predictor started"
        );
    }

    pub fn log_model_loaded(&self, path: &str, format: &str, model_version: &str) {
        info!(
            event = "model_loaded",
            instance = %self.instance,
            path = %path,
            format = %format,
            model_version = %model_version,
            "Model artifact loaded"
        );
    }

    /// Startup-fatal: the process exits after this
    pub fn log_model_load_failure(&self, path: &str, reason: &str) {
        error!(
            event = "model_load_failed",
            instance = %self.instance,
            path = %path,
            code = "MODEL_LOAD_FAILURE",
            reason = %reason,
            "Model artifact failed to load, refusing to serve predictions"
        );
    }

    pub fn log_prediction(&self, outcome: Outcome, confidence_percent: f64, elapsed_us: u128) {
        info!(
            event = "prediction_generated",
            instance = %self.instance,
            outcome = %outcome,
            confidence_percent = confidence_percent,
            elapsed_us = elapsed_us as u64,
            "Generated diabetes prediction"
        );
    }

    pub fn log_prediction_failed(&self, code: &str, message: &str) {
        warn!(
            event = "prediction_failed",
            instance = %self.instance,
            code = %code,
            message = %message,
            "Prediction aborted"
        );
    }

    pub fn log_report_exported(&self, outcome: Outcome, bytes: usize) {
        info!(
            event = "report_exported",
            instance = %self.instance,
            outcome = %outcome,
            bytes = bytes,
            "Patient report exported"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Diabetes predictor shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handles_share_registry() {
        let first = PredictorMetrics::new();
        let second = first.clone();

        first.observe_prediction_latency(0.0002);
        first.inc_predictions(Outcome::Diabetes);
        second.inc_predictions(Outcome::NoDiabetes);
        second.inc_prediction_errors("MODEL_INPUT_MISMATCH");
        second.inc_reports_exported();
        second.set_model_info("logistic", "test-1");

        let families = prometheus::gather();
        let names: Vec<&str> = families.iter().map(|f| f.get_name()).collect();
        assert!(names.contains(&"diabetes_predictor_predictions_total"));
        assert!(names.contains(&"diabetes_predictor_model_info"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }
}
