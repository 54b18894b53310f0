//! Prediction command

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use predictor_lib::{parse_report, schema, PatientRecord, PredictionResponse};
use std::path::PathBuf;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_severity, format_percent, format_probability, print_json, print_success, print_table,
    OutputFormat,
};

/// Patient details; omitted fields keep their default slider position
#[derive(Debug, Default, Args)]
pub struct PredictArgs {
    /// Number of pregnancies (0-20)
    #[arg(long)]
    pub pregnancies: Option<u32>,

    /// Glucose level in mg/dL (0-300)
    #[arg(long)]
    pub glucose: Option<u32>,

    /// Blood pressure in mm Hg (0-200)
    #[arg(long)]
    pub blood_pressure: Option<u32>,

    /// Skin thickness in mm (0-100)
    #[arg(long)]
    pub skin_thickness: Option<u32>,

    /// Insulin level in µU/mL (0-900)
    #[arg(long)]
    pub insulin: Option<u32>,

    /// Body mass index (0-70)
    #[arg(long)]
    pub bmi: Option<f64>,

    /// Diabetes pedigree function (0-2.5)
    #[arg(long)]
    pub diabetes_pedigree_function: Option<f64>,

    /// Age in years (1-120)
    #[arg(long)]
    pub age: Option<u32>,

    /// Save the CSV patient report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl PredictArgs {
    /// Start from the defaults and apply every given field, checking bounds locally
    pub fn to_record(&self) -> Result<PatientRecord> {
        let overrides = [
            (schema::PREGNANCIES, self.pregnancies.map(f64::from)),
            (schema::GLUCOSE, self.glucose.map(f64::from)),
            (schema::BLOOD_PRESSURE, self.blood_pressure.map(f64::from)),
            (schema::SKIN_THICKNESS, self.skin_thickness.map(f64::from)),
            (schema::INSULIN, self.insulin.map(f64::from)),
            (schema::BMI, self.bmi),
            (schema::DIABETES_PEDIGREE_FUNCTION, self.diabetes_pedigree_function),
            (schema::AGE, self.age.map(f64::from)),
        ];

        let mut record = PatientRecord::default();
        for (name, value) in overrides {
            if let Some(value) = value {
                record = record.with_value(name, value)?;
            }
        }
        Ok(record)
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Request a prediction and print the verdict
pub async fn predict(client: &ApiClient, args: &PredictArgs, format: OutputFormat) -> Result<()> {
    let record = args.to_record()?;
    let response: PredictionResponse = client.post("api/v1/predict", &record).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => print_verdict(&response),
    }

    if let Some(path) = &args.report {
        let bytes = client.post_bytes("api/v1/report", &record).await?;
        let row = parse_report(&bytes).context("Server returned a malformed report")?;
        std::fs::write(path, &bytes)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        print_success(&format!(
            "Report saved to {} ({}, {})",
            path.display(),
            row.prediction,
            format_percent(row.confidence_percent)
        ));
    }

    Ok(())
}

fn print_verdict(response: &PredictionResponse) {
    println!("{}", "Patient Summary".bold());
    let rows: Vec<SummaryRow> = response
        .record
        .summary()
        .into_iter()
        .map(|(spec, value)| SummaryRow {
            field: spec.name.to_string(),
            value,
        })
        .collect();
    print_table(&rows);
    println!();

    println!("{}", "Prediction Result".bold());
    println!("{}", "=".repeat(50));
    println!("{}", color_severity(response.severity, &response.headline));
    println!(
        "Prediction Confidence:  {}",
        format_percent(response.confidence_percent)
    );
    println!(
        "Probabilities:          No Diabetes {} / Diabetes {}",
        format_probability(response.probabilities[0]).green(),
        format_probability(response.probabilities[1]).red()
    );
    println!();

    println!("{}", response.advice_title.bold());
    for tip in &response.tips {
        println!("  - {}", tip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_gives_default_record() {
        let record = PredictArgs::default().to_record().unwrap();
        assert_eq!(record, PatientRecord::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = PredictArgs {
            glucose: Some(148),
            bmi: Some(33.6),
            ..Default::default()
        };
        let record = args.to_record().unwrap();
        assert_eq!(record.glucose(), 148);
        assert_eq!(record.bmi(), 33.6);
        assert_eq!(record.age(), 33);
    }

    #[test]
    fn test_out_of_range_rejected_locally() {
        let args = PredictArgs {
            glucose: Some(301),
            ..Default::default()
        };
        let err = args.to_record().unwrap_err();
        assert!(err.to_string().contains("Glucose"));
    }
}
