//! Schema, model and service status commands

use anyhow::Result;
use colored::Colorize;
use predictor_lib::{HealthResponse, ModelInfo, ReadinessResponse};
use serde::Serialize;
use tabled::Tabled;

use crate::client::{ApiClient, SchemaView};
use crate::output::{color_status, print_info, print_json, print_table, print_warning, OutputFormat};

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Default")]
    default: String,
}

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

#[derive(Serialize)]
struct StatusReport {
    health: HealthResponse,
    readiness: ReadinessResponse,
}

/// Show the input schema served by the API
pub async fn show_schema(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let schema: SchemaView = client.get("api/v1/schema").await?;

    match format {
        OutputFormat::Json => print_json(&schema)?,
        OutputFormat::Table => {
            let rows: Vec<FieldRow> = schema
                .fields
                .into_iter()
                .map(|field| FieldRow {
                    range: format!("{} - {}", field.min, field.max),
                    default: field.default.to_string(),
                    name: field.name,
                    label: field.label,
                    kind: field.kind,
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

/// Show the loaded model
pub async fn show_model(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info: ModelInfo = client.get("api/v1/model").await?;

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => {
            println!("{}", "Model".bold());
            println!("{}", "=".repeat(50));
            println!("Format:                 {}", info.format.cyan());
            println!("Version:                {}", info.version);
            if let Some(sha) = &info.sha256 {
                println!("SHA256:                 {}", sha.dimmed());
            }
            println!("Features:               {}", info.features.join(", "));
        }
    }

    Ok(())
}

/// Show health and readiness
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthResponse = client.get_probe("healthz").await?;
    let readiness: ReadinessResponse = client.get_probe("readyz").await?;

    match format {
        OutputFormat::Json => print_json(&StatusReport { health, readiness })?,
        OutputFormat::Table => {
            println!("Overall:                {}", color_status(health.status));
            let rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(component.status),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();
            print_table(&rows);

            if readiness.ready {
                print_info("Ready to serve predictions");
            } else {
                print_warning(&format!(
                    "Not ready: {}",
                    readiness.reason.as_deref().unwrap_or("unknown")
                ));
            }
        }
    }

    Ok(())
}
