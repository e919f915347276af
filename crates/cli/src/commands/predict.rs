//! Prediction command

use anyhow::Result;
use colored::Colorize;
use gestation_lib::{
    predictor::parse_features, Feature, InputForm, OutputFormatter, PredictRequest,
    PredictResponse,
};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    format_timestamp, print_error, print_json, print_success, print_warning, render_table,
    OutputFormat,
};

/// Row for the submitted measurements table
#[derive(Tabled)]
struct InputRow {
    #[tabled(rename = "Code")]
    code: &'static str,
    #[tabled(rename = "Measurement")]
    label: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Build the request body sent for a form
pub fn build_request(form: &InputForm) -> PredictRequest {
    PredictRequest {
        fields: form.raw_fields().iter().map(|s| s.to_string()).collect(),
        use_sample_data: form.is_sample(),
    }
}

fn input_rows(form: &InputForm) -> Vec<InputRow> {
    Feature::ALL
        .into_iter()
        .map(|feature| InputRow {
            code: feature.code(),
            label: feature.label(),
            value: form.value(feature).to_string(),
        })
        .collect()
}

/// Features whose values parse but fall outside the suggested ranges
fn unusual_features(form: &InputForm) -> Vec<Feature> {
    parse_features(&form.raw_fields())
        .map(|vector| vector.outside_hints())
        .unwrap_or_default()
}

/// Submit the form to the server and show the outcome
pub async fn run_prediction(client: &ApiClient, form: &InputForm, format: OutputFormat) -> Result<()> {
    let request = build_request(form);
    let result = client
        .post::<PredictResponse, _>("api/v1/predict", &request)
        .await;

    let response = match result {
        Ok(response) => response,
        Err(err) if err.is_invalid_input() => {
            if let OutputFormat::Json = format {
                print_json(&serde_json::json!({ "error": gestation_lib::INVALID_INPUT_MESSAGE }))?;
            } else {
                println!("{}", render_table(&input_rows(form)));
                print_error(gestation_lib::INVALID_INPUT_MESSAGE);
            }
            anyhow::bail!("prediction rejected by server");
        }
        Err(err) => return Err(err.into()),
    };

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            println!("{}", "Measurements".bold());
            println!("{}", render_table(&input_rows(form)));

            for feature in unusual_features(form) {
                let (low, high) = feature.hint_range();
                print_warning(&format!(
                    "{} is outside the typical range {} - {}",
                    feature.label(),
                    low,
                    high
                ));
            }

            println!();
            print_success(&response.message);
            let formatter = OutputFormatter::new();
            println!(
                "  Approximately:  {}",
                formatter.format_weeks(response.gestational_age_days).cyan()
            );
            println!("  Model version:  {}", response.model_version);
            println!("  Generated at:   {}", format_timestamp(response.generated_at));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_keeps_raw_text() {
        let mut form = InputForm::new();
        form.set(Feature::BiparietalDiameter, " abc ");
        let request = build_request(&form);

        assert_eq!(request.fields.len(), 8);
        assert_eq!(request.fields[2], " abc ");
        assert!(!request.use_sample_data);
    }

    #[test]
    fn test_request_for_sample_form() {
        let request = build_request(&InputForm::sample());
        assert!(request.use_sample_data);
        assert_eq!(request.fields[0], "28");
    }

    #[test]
    fn test_unusual_features_only_for_parsable_forms() {
        assert!(unusual_features(&InputForm::new()).is_empty());
        // Sample weight of 1500 g is above the suggested 0 - 1000 range
        assert_eq!(
            unusual_features(&InputForm::sample()),
            vec![Feature::EstimatedFetalWeight]
        );
    }

    #[tokio::test]
    async fn test_run_prediction_against_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/predict")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({ "use_sample_data": true }),
            ))
            .with_status(200)
            .with_body(
                r#"{"gestational_age_days":274.6,"rounded_days":275,
                    "message":"Predicted Gestational Age: 275 days",
                    "model_version":"v1","generated_at":0}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        run_prediction(&client, &InputForm::sample(), OutputFormat::Json)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_run_prediction_reports_invalid_input() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/predict")
            .with_status(422)
            .with_body(
                r#"{"error":"Please enter valid numeric values for all fields.","error_code":"INVALID_INPUT"}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let result = run_prediction(&client, &InputForm::new(), OutputFormat::Json).await;
        assert!(result.is_err());
    }
}
