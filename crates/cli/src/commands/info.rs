//! Sample data, model description and server status

use anyhow::Result;
use colored::Colorize;
use gestation_lib::{sample_fields, Feature, HealthResponse, ReadinessResponse};
use serde::Serialize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_status, print_json, print_table, print_warning, OutputFormat};

/// Row for the sample values table
#[derive(Tabled, Serialize)]
struct SampleRow {
    #[tabled(rename = "Flag")]
    flag: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Measurement")]
    label: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn sample_rows() -> Vec<SampleRow> {
    sample_fields()
        .into_iter()
        .map(|field| SampleRow {
            flag: format!("--{}", field.key.replace('_', "-")),
            code: field.code,
            label: field.label,
            value: field.value,
        })
        .collect()
}

/// Show the sample measurements
pub fn show_sample(format: OutputFormat) -> Result<()> {
    let rows = sample_rows();
    if let OutputFormat::Table = format {
        println!("{}", "Sample Measurements".bold());
    }
    print_table(&rows, format)?;
    if let OutputFormat::Table = format {
        println!("Run `fap predict --sample` to predict with these values.");
    }
    Ok(())
}

/// Describe the model and its inputs
pub fn show_about() {
    println!("{}", "About This App".bold());
    println!("{}", "=".repeat(50));
    println!("Predicts fetal gestational age in days from eight maternal and");
    println!("ultrasound measurements using a RandomForestRegressor model.");
    println!();
    println!("{}", "Inputs".bold());
    for feature in Feature::ALL {
        let (low, high) = feature.hint_range();
        println!(
            "  {:<4} {:<40} typical {} - {}",
            feature.code().cyan(),
            feature.label(),
            low,
            high
        );
    }
}

#[derive(Serialize)]
struct StatusReport {
    health: HealthResponse,
    ready: bool,
}

/// Show server health and readiness
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthResponse = client.get_status_body("healthz").await?;
    let readiness: Option<ReadinessResponse> = client.get_status_body("readyz").await.ok();
    let ready = readiness.as_ref().is_some_and(|r| r.ready);

    match format {
        OutputFormat::Json => print_json(&StatusReport { health, ready })?,
        OutputFormat::Table => {
            let status = serde_json::to_value(health.status)?;
            let status = status.as_str().unwrap_or("unknown");

            println!("{}", "Server Status".bold());
            println!("{}", "=".repeat(50));
            println!("Status:          {}", color_status(status));
            println!(
                "Ready:           {}",
                color_status(if ready { "ready" } else { "not ready" })
            );
            if let Some(reason) = readiness.as_ref().and_then(|r| r.reason.as_deref()) {
                print_warning(reason);
            }
            if let Some(version) = &health.model_version {
                println!("Model version:   {}", version);
            }

            let mut names: Vec<_> = health.components.keys().collect();
            names.sort();
            for name in names {
                let component = &health.components[name];
                let status = serde_json::to_value(component.status)?;
                println!(
                    "  {:<14} {}",
                    name,
                    color_status(status.as_str().unwrap_or("unknown"))
                );
                if let Some(message) = &component.message {
                    print_warning(message);
                }
            }
        }
    }

    Ok(())
}
