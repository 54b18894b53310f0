//! Diabetes Predictor CLI
//!
//! A command-line client for requesting predictions, downloading patient
//! reports, and checking the state of the prediction service.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{info, predict};

/// Diabetes Predictor CLI
#[derive(Parser)]
#[command(name = "dpc")]
#[command(author, version, about = "CLI for the Diabetes Predictor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via DPC_API_URL env var)
    #[arg(long, env = "DPC_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict diabetes status for one patient
    Predict(predict::PredictArgs),

    /// Show the patient input schema
    Schema,

    /// Show service health and readiness
    Status,

    /// Show the loaded model
    Model,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let api_url = config::Config::load()?.resolve_api_url(cli.api_url);
    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Predict(args) => predict::predict(&client, &args, cli.format).await?,
        Commands::Schema => info::show_schema(&client, cli.format).await?,
        Commands::Status => info::show_status(&client, cli.format).await?,
        Commands::Model => info::show_model(&client, cli.format).await?,
    }

    Ok(())
}
