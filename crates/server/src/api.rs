//! HTTP surface: prediction form, JSON API, report download, health and metrics

use crate::pages::{render_page, PageModel};
use axum::{
    body::Bytes,
    extract::{Form, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use predictor_lib::{
    export_report,
    health::{components, ComponentStatus, HealthRegistry},
    observability::{PredictorMetrics, StructuredLogger},
    report::{REPORT_CONTENT_TYPE, REPORT_FILE_NAME},
    PatientRecord, PredictionResponse, PredictionResult, PredictorAdapter, PredictorError,
    ReportRow, PATIENT_SCHEMA,
};
use prometheus::{Encoder, TextEncoder};
use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Consecutive inference failures after which the model is reported unhealthy
const UNHEALTHY_AFTER_FAILURES: u32 = 3;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<PredictorAdapter>,
    pub health_registry: HealthRegistry,
    pub metrics: PredictorMetrics,
    pub logger: StructuredLogger,
    inference_failures: Arc<AtomicU32>,
}

impl AppState {
    pub fn new(
        predictor: Arc<PredictorAdapter>,
        health_registry: HealthRegistry,
        metrics: PredictorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            predictor,
            health_registry,
            metrics,
            logger,
            inference_failures: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Classify one record, recording latency, outcome and failures
    async fn run_prediction(
        &self,
        record: &PatientRecord,
    ) -> Result<PredictionResult, PredictorError> {
        let start = Instant::now();
        match self.predictor.classify(record) {
            Ok(result) => {
                let elapsed = start.elapsed();
                self.metrics.observe_prediction_latency(elapsed.as_secs_f64());
                self.metrics.inc_predictions(result.outcome);
                self.logger
                    .log_prediction(result.outcome, result.confidence_percent(), elapsed.as_micros());
                self.model_recovered().await;
                Ok(result)
            }
            Err(e) => {
                if matches!(e, PredictorError::Inference(_)) {
                    self.model_failed(&e).await;
                }
                Err(self.record_failure(e))
            }
        }
    }

    fn record_failure(&self, error: PredictorError) -> PredictorError {
        self.metrics.inc_prediction_errors(error.code());
        self.logger.log_prediction_failed(error.code(), &error.to_string());
        error
    }

    async fn model_failed(&self, error: &PredictorError) {
        let failures = self.inference_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= UNHEALTHY_AFTER_FAILURES {
            self.health_registry
                .set_unhealthy(
                    components::MODEL,
                    format!("{} consecutive inference failures: {}", failures, error),
                )
                .await;
        } else {
            self.health_registry
                .set_degraded(components::MODEL, error.to_string())
                .await;
        }
    }

    async fn model_recovered(&self) {
        if self.inference_failures.swap(0, Ordering::Relaxed) > 0 {
            self.health_registry.set_healthy(components::MODEL).await;
        }
    }

    /// Classify and serialize the single-row report
    async fn build_report(&self, record: PatientRecord) -> Result<Vec<u8>, PredictorError> {
        let result = self.run_prediction(&record).await?;
        let bytes = export_report(&ReportRow::new(record, &result))
            .map_err(|e| self.record_failure(e))?;
        self.metrics.inc_reports_exported();
        self.logger.log_report_exported(result.outcome, bytes.len());
        Ok(bytes)
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

/// Predictor failure mapped onto an HTTP status
#[derive(Debug)]
pub struct ApiError(pub PredictorError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        status_for(&self.0)
    }
}

impl From<PredictorError> for ApiError {
    fn from(err: PredictorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.0.to_string(),
            code: self.0.code(),
        };
        (self.status(), Json(body)).into_response()
    }
}

fn status_for(error: &PredictorError) -> StatusCode {
    match error {
        PredictorError::InputMismatch(_) => StatusCode::BAD_REQUEST,
        PredictorError::OutOfRange { .. } | PredictorError::NotAnInteger { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PredictorError::ModelLoad { .. }
        | PredictorError::Inference(_)
        | PredictorError::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build a record from urlencoded name/value pairs
fn record_from_pairs(pairs: &[(String, String)]) -> Result<PatientRecord, PredictorError> {
    let mut values = Vec::with_capacity(pairs.len());
    for (name, raw) in pairs {
        let value: f64 = raw.trim().parse().map_err(|_| {
            PredictorError::InputMismatch(format!("field '{}' is not a number: '{}'", name, raw))
        })?;
        values.push((name.as_str(), value));
    }
    PatientRecord::from_named_values(values)
}

/// Defaults overlaid with every submitted value that parses and is in range
fn submitted_or_default(pairs: &[(String, String)]) -> PatientRecord {
    pairs
        .iter()
        .fold(PatientRecord::default(), |record, (name, raw)| {
            raw.trim()
                .parse()
                .ok()
                .and_then(|value| record.with_value(name, value).ok())
                .unwrap_or(record)
        })
}

/// JSON object kept as ordered pairs so repeated keys reach the record builder
struct NamedValues(Vec<(String, serde_json::Value)>);

impl<'de> Deserialize<'de> for NamedValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = NamedValues;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping field names to numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(pair) = map.next_entry::<String, serde_json::Value>()? {
                    pairs.push(pair);
                }
                Ok(NamedValues(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

/// Build a record from a JSON body; every malformed input is a mismatch
fn record_from_json(body: &[u8]) -> Result<PatientRecord, PredictorError> {
    let NamedValues(pairs) = serde_json::from_slice(body)
        .map_err(|e| PredictorError::InputMismatch(format!("invalid JSON body: {}", e)))?;

    let mut values = Vec::with_capacity(pairs.len());
    for (name, raw) in pairs {
        let value = raw.as_f64().ok_or_else(|| {
            PredictorError::InputMismatch(format!("field '{}' is not a number: {}", name, raw))
        })?;
        values.push((name, value));
    }
    PatientRecord::from_named_values(values)
}

fn report_attachment(bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, REPORT_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", REPORT_FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Blank form with default slider positions
async fn index() -> Html<String> {
    let record = PatientRecord::default();
    Html(render_page(&PageModel {
        record: &record,
        result: None,
        error: None,
    }))
}

/// Form submission: re-render with the verdict or an error banner
async fn predict_form(
    State(state): State<Arc<AppState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let outcome = match record_from_pairs(&pairs) {
        Ok(record) => state
            .run_prediction(&record)
            .await
            .map(|result| (record, result)),
        Err(e) => Err(state.record_failure(e)),
    };

    match outcome {
        Ok((record, result)) => Html(render_page(&PageModel {
            record: &record,
            result: Some(&result),
            error: None,
        }))
        .into_response(),
        Err(e) => {
            let record = submitted_or_default(&pairs);
            let message = e.to_string();
            let page = render_page(&PageModel {
                record: &record,
                result: None,
                error: Some(&message),
            });
            (status_for(&e), Html(page)).into_response()
        }
    }
}

/// Report download linked from the result panel
async fn report_csv(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let record = record_from_pairs(&pairs).map_err(|e| state.record_failure(e))?;
    Ok(report_attachment(state.build_report(record).await?))
}

#[derive(Debug, Serialize)]
struct SchemaResponse {
    fields: &'static [predictor_lib::FieldSpec],
}

async fn api_schema() -> Json<SchemaResponse> {
    Json(SchemaResponse {
        fields: &PATIENT_SCHEMA,
    })
}

async fn api_model(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.predictor.info().clone())
}

async fn api_predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let record = record_from_json(&body).map_err(|e| state.record_failure(e))?;
    let result = state.run_prediction(&record).await?;
    Ok(Json(PredictionResponse::new(record, &result)))
}

async fn api_report(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let record = record_from_json(&body).map_err(|e| state.record_failure(e))?;
    Ok(report_attachment(state.build_report(record).await?))
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/report.csv", get(report_csv))
        .route("/api/v1/schema", get(api_schema))
        .route("/api/v1/model", get(api_model))
        .route("/api/v1/predict", post(api_predict))
        .route("/api/v1/report", post(api_report))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(addr: &str, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&PredictorError::InputMismatch("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&PredictorError::NotAnInteger {
                field: "Age",
                value: 1.5
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&PredictorError::Inference("nan".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_record_from_pairs_rejects_non_numeric() {
        let err = record_from_pairs(&pairs(&[("Glucose", "high")])).unwrap_err();
        assert_eq!(err.code(), "MODEL_INPUT_MISMATCH");
    }

    #[test]
    fn test_record_from_pairs_full_form() {
        let record = record_from_pairs(&pairs(&[
            ("Pregnancies", "6"),
            ("Glucose", "148"),
            ("BloodPressure", "72"),
            ("SkinThickness", "35"),
            ("Insulin", "0"),
            ("BMI", "33.6"),
            ("DiabetesPedigreeFunction", "0.627"),
            ("Age", "50"),
        ]))
        .unwrap();
        assert_eq!(record.glucose(), 148);
        assert_eq!(record.bmi(), 33.6);
    }

    #[test]
    fn test_submitted_values_survive_a_rejected_form() {
        let record = submitted_or_default(&pairs(&[
            ("Pregnancies", "9"),
            ("Glucose", "500"),
            ("BMI", "abc"),
            ("Age", "70"),
        ]));
        assert_eq!(record.pregnancies(), 9);
        assert_eq!(record.glucose(), 120);
        assert_eq!(record.bmi(), 26.0);
        assert_eq!(record.age(), 70);
    }

    #[test]
    fn test_json_duplicate_key_is_mismatch() {
        let err = record_from_json(br#"{"Glucose":120,"Glucose":299}"#).unwrap_err();
        assert_eq!(err.code(), "MODEL_INPUT_MISMATCH");
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_json_non_numeric_and_malformed_are_mismatch() {
        let err = record_from_json(br#"{"Glucose":"high"}"#).unwrap_err();
        assert_eq!(err.code(), "MODEL_INPUT_MISMATCH");
        assert!(err.to_string().contains("not a number"));

        assert_eq!(record_from_json(b"[1, 2]").unwrap_err().code(), "MODEL_INPUT_MISMATCH");
        assert_eq!(record_from_json(b"{").unwrap_err().code(), "MODEL_INPUT_MISMATCH");
    }
}
