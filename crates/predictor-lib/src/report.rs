//! Patient report export
//!
//! One header row plus one data row: the eight inputs in schema order, then
//! the prediction and its confidence. Nothing is accumulated between exports.

use crate::error::{PredictorError, Result};
use crate::models::{round2, Outcome, PatientRecord, PredictionResult};
use crate::schema::{FieldKind, PATIENT_SCHEMA};
use serde::{Deserialize, Serialize};

/// Download file name offered to the browser
pub const REPORT_FILE_NAME: &str = "patient_report.csv";

/// MIME type of the export
pub const REPORT_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Header row in column order
pub const REPORT_HEADER: [&str; 10] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
    "Prediction",
    "Confidence (%)",
];

/// One exported row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(flatten)]
    pub record: PatientRecord,
    #[serde(rename = "Prediction")]
    pub prediction: Outcome,
    #[serde(rename = "Confidence (%)")]
    pub confidence_percent: f64,
}

impl ReportRow {
    pub fn new(record: PatientRecord, result: &PredictionResult) -> Self {
        Self {
            record,
            prediction: result.outcome,
            confidence_percent: round2(result.confidence() * 100.0),
        }
    }
}

/// Serialize a row as UTF-8 CSV bytes
pub fn export_report(row: &ReportRow) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(REPORT_HEADER)?;

    let mut fields: Vec<String> = row
        .record
        .values()
        .iter()
        .zip(PATIENT_SCHEMA.iter())
        .map(|(value, spec)| format_value(*value, spec.kind))
        .collect();
    fields.push(row.prediction.as_str().to_string());
    fields.push(format_float(row.confidence_percent));
    writer.write_record(&fields)?;

    writer
        .into_inner()
        .map_err(|e| PredictorError::Report(e.to_string()))
}

/// Parse an export back into its row
///
/// The header must match [`REPORT_HEADER`] and exactly one data row must follow.
pub fn parse_report(bytes: &[u8]) -> Result<ReportRow> {
    let mut reader = csv::Reader::from_reader(bytes);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if header != REPORT_HEADER {
        return Err(PredictorError::Report(format!(
            "unexpected header: {}",
            header.join(",")
        )));
    }

    let mut records = reader.records();
    let data = records
        .next()
        .ok_or_else(|| PredictorError::Report("report has no data row".to_string()))??;
    if records.next().is_some() {
        return Err(PredictorError::Report("report has more than one data row".to_string()));
    }
    if data.len() != REPORT_HEADER.len() {
        return Err(PredictorError::Report(format!(
            "data row has {} fields, expected {}",
            data.len(),
            REPORT_HEADER.len()
        )));
    }

    let mut values = Vec::with_capacity(8);
    for (name, raw) in REPORT_HEADER[..8].iter().zip(data.iter()) {
        values.push((*name, parse_number(name, raw)?));
    }
    let record = PatientRecord::from_named_values(values)?;

    let prediction = match &data[8] {
        "Diabetes" => Outcome::Diabetes,
        "No Diabetes" => Outcome::NoDiabetes,
        other => {
            return Err(PredictorError::Report(format!("unknown prediction '{}'", other)));
        }
    };
    let confidence_percent = parse_number(REPORT_HEADER[9], &data[9])?;

    Ok(ReportRow {
        record,
        prediction,
        confidence_percent,
    })
}

fn parse_number(column: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| PredictorError::Report(format!("{} is not a number: '{}'", column, raw)))
}

fn format_value(value: f64, kind: FieldKind) -> String {
    match kind {
        FieldKind::Integer => format!("{}", value as i64),
        FieldKind::Float => format_float(value),
    }
}

/// Floats keep a decimal point even when whole, e.g. `26.0`
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_row() -> ReportRow {
        let result = PredictionResult::from_probabilities([0.87534, 0.12466]).unwrap();
        ReportRow::new(PatientRecord::default(), &result)
    }

    #[test]
    fn test_export_layout() {
        let bytes = export_report(&default_row()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Prediction,Confidence (%)"
        );
        assert_eq!(lines[1], "2,120,80,20,85,26.0,0.5,33,No Diabetes,87.53");
    }

    #[test]
    fn test_default_record_round_trip() {
        let row = default_row();
        let parsed = parse_report(&export_report(&row).unwrap()).unwrap();

        assert_eq!(parsed, row);
        assert_eq!(parsed.record.values(), [2.0, 120.0, 80.0, 20.0, 85.0, 26.0, 0.5, 33.0]);
        assert_eq!(parsed.prediction, Outcome::NoDiabetes);
        assert_eq!(parsed.confidence_percent, 87.53);
    }

    #[test]
    fn test_diabetes_label_in_export() {
        let result = PredictionResult::from_probabilities([0.25, 0.75]).unwrap();
        let record = PatientRecord::default().with_value("BMI", 33.6).unwrap();
        let text = String::from_utf8(export_report(&ReportRow::new(record, &result)).unwrap()).unwrap();
        assert!(text.ends_with("2,120,80,20,85,33.6,0.5,33,Diabetes,75.0\n"));
    }

    #[test]
    fn test_parse_rejects_wrong_header() {
        let bytes = b"Glucose,Pregnancies\n120,2\n";
        assert_eq!(parse_report(bytes).unwrap_err().code(), "REPORT_FAILURE");
    }

    #[test]
    fn test_parse_rejects_history() {
        let mut bytes = export_report(&default_row()).unwrap();
        bytes.extend_from_slice(b"2,120,80,20,85,26.0,0.5,33,No Diabetes,87.53\n");
        let err = parse_report(&bytes).unwrap_err();
        assert!(err.to_string().contains("more than one"));
    }

    #[test]
    fn test_parse_rejects_empty_body() {
        let header = REPORT_HEADER.join(",") + "\n";
        assert!(parse_report(header.as_bytes()).is_err());
    }
}
