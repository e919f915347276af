//! Fetal Age Predictor CLI
//!
//! Fills in the eight measurements from flags (or the sample data) and asks
//! the prediction server for a gestational age estimate.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{info, predict};
use gestation_lib::{Feature, InputForm};

/// Default server address, matching the server's default port
pub const DEFAULT_API_URL: &str = "http://localhost:8501";

/// Fetal Age Predictor CLI
#[derive(Parser)]
#[command(name = "fap")]
#[command(author, version, about = "CLI for the Fetal Age Predictor", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via FAP_API_URL env var)
    #[arg(long, env = "FAP_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict gestational age from the eight measurements
    Predict(MeasurementArgs),

    /// Show the sample measurements
    Sample,

    /// Describe the model inputs
    About,

    /// Show server health
    Status,
}

/// The eight measurements; any text is accepted and validated by the server
#[derive(Args, Debug, Default)]
pub struct MeasurementArgs {
    /// Maternal age (years)
    #[arg(long, allow_hyphen_values = true)]
    pub maternal_age: Option<String>,

    /// Hemoglobin level (g/dL)
    #[arg(long, allow_hyphen_values = true)]
    pub hemoglobin: Option<String>,

    /// Biparietal diameter (mm)
    #[arg(long, allow_hyphen_values = true)]
    pub bpd: Option<String>,

    /// Femur length (mm)
    #[arg(long, allow_hyphen_values = true)]
    pub femur_length: Option<String>,

    /// Head circumference (mm)
    #[arg(long, allow_hyphen_values = true)]
    pub head_circumference: Option<String>,

    /// Abdominal circumference (mm)
    #[arg(long, allow_hyphen_values = true)]
    pub abdominal_circumference: Option<String>,

    /// Estimated fetal weight (g)
    #[arg(long, allow_hyphen_values = true)]
    pub estimated_fetal_weight: Option<String>,

    /// Days since last menstrual period
    #[arg(long, allow_hyphen_values = true)]
    pub days_since_lmp: Option<String>,

    /// Use the sample measurements, overriding any values given
    #[arg(long)]
    pub sample: bool,
}

impl MeasurementArgs {
    /// Collect the flags into an input form; missing values stay empty
    pub fn to_form(&self) -> InputForm {
        let values = [
            &self.maternal_age,
            &self.hemoglobin,
            &self.bpd,
            &self.femur_length,
            &self.head_circumference,
            &self.abdominal_circumference,
            &self.estimated_fetal_weight,
            &self.days_since_lmp,
        ];

        let mut form = InputForm::new();
        for (feature, value) in Feature::ALL.into_iter().zip(values) {
            if let Some(text) = value {
                form.set(feature, text.as_str());
            }
        }
        form.use_sample_data(self.sample);
        form
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = config::Config::load()?;
    let api_url = settings.resolve_api_url(cli.api_url.as_deref());
    let format = cli.format.unwrap_or_else(|| settings.resolve_format());

    if cli.verbose {
        output::print_info(&format!("Using server {}", api_url));
    }

    match cli.command {
        Commands::Predict(args) => {
            let client = client::ApiClient::new(&api_url)?;
            predict::run_prediction(&client, &args.to_form(), format).await?;
        }
        Commands::Sample => info::show_sample(format)?,
        Commands::About => info::show_about(),
        Commands::Status => {
            let client = client::ApiClient::new(&api_url)?;
            info::show_status(&client, format).await?;
        }
    }

    Ok(())
}
