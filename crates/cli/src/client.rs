//! API client for the prediction server

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Error code the server uses for non-numeric fields
pub const INVALID_INPUT_CODE: &str = "INVALID_INPUT";

/// Errors from talking to the server
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("API error ({status}): {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Failed to reach server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// True when the server rejected the measurements themselves
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ApiError::Rejected { code: Some(code), .. } if code == INVALID_INPUT_CODE)
    }
}

/// Error body returned by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_code: Option<String>,
}

/// API client for the prediction server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let base_url = Url::parse(base_url)?;

        Ok(Self { client, base_url })
    }

    /// GET a health endpoint. They answer 503 with the same JSON body, so the
    /// body is decoded whatever the status.
    pub async fn get_status_body<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.base_url.join(path)?;
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|_| ApiError::Rejected {
            status,
            code: None,
            message: body,
        })
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.base_url.join(path)?;
        let response = self.client.post(url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) => (err.error_code, err.error),
            Err(_) => (None, body),
        };
        Err(ApiError::Rejected {
            status: status.as_u16(),
            code,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gestation_lib::PredictResponse;

    #[tokio::test]
    async fn test_post_decodes_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/predict")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"gestational_age_days":274.6,"rounded_days":275,
                    "message":"Predicted Gestational Age: 275 days",
                    "model_version":"v1","generated_at":0}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let response: PredictResponse = client
            .post("api/v1/predict", &serde_json::json!({"use_sample_data": true}))
            .await
            .unwrap();

        assert_eq!(response.rounded_days, 275);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_input_is_recognised() {
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
        let err = client
            .post::<PredictResponse, _>("api/v1/predict", &serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("valid numeric values"));
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/predict")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .post::<serde_json::Value, _>("api/v1/predict", &serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(!err.is_invalid_input());
        match err {
            ApiError::Rejected { status, message, .. } => {
                assert_eq!(status, 502);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_body_decoded_on_503() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/readyz")
            .with_status(503)
            .with_body(r#"{"ready":false,"reason":"Model not yet loaded"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let readiness: gestation_lib::ReadinessResponse = client.get_status_body("readyz").await.unwrap();
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Model not yet loaded"));
    }

    #[tokio::test]
    async fn test_status_without_json_body_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/healthz")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.get_status_body::<serde_json::Value>("healthz").await;
        assert!(matches!(err, Err(ApiError::Rejected { status: 502, .. })));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(ApiClient::new("not a url"), Err(ApiError::Url(_))));
    }
}
