//! Validation API client
//!
//! Client for the test server's bookkeeping endpoints: a reset call at
//! the start of a run and the final validation submission carrying the
//! observed identifier set.

use crate::config::ServerUrl;
use crate::error::{ApiError, ApiResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Body POSTed to the validate endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    /// Deduplicated identifiers touched during the run
    pub image_ids: BTreeSet<String>,
}

/// Verdict returned by the validate endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub success: bool,
    #[serde(default)]
    pub violations: Option<Vec<Violation>>,
}

/// Server-reported discrepancy for one identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub image_id: String,
    pub reason: String,
    pub total_requests: u64,
    pub success: u64,
    pub failed: u64,
}

/// Client for the reset and validate endpoints
pub struct ValidationClient {
    client: Client,
    base: String,
}

impl ValidationClient {
    /// Create a client over an already-configured reqwest client
    pub fn new(client: Client, server_url: &ServerUrl) -> Self {
        Self {
            client,
            base: server_url.base(),
        }
    }

    /// Clear the server's per-session bookkeeping
    ///
    /// The response is ignored; only transport failures are errors.
    pub async fn reset(&self) -> ApiResult<()> {
        let endpoint = format!("{}/test-tasks/clear", self.base);
        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        debug!(status = resp.status().as_u16(), "Reset acknowledged");
        Ok(())
    }

    /// Submit the identifier set for validation
    pub async fn validate(
        &self,
        image_ids: &BTreeSet<String>,
        session_token: &str,
    ) -> ApiResult<ValidateResponse> {
        let endpoint = format!(
            "{}/test-tasks/validate?session-token={}",
            self.base, session_token
        );

        let body = ValidateRequest {
            image_ids: image_ids.clone(),
        };

        let resp = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::BodyRead(e.to_string()))?;

        let response: ValidateResponse = serde_json::from_str(&text)?;

        debug!(
            success = response.success,
            violations = response.violations.as_ref().map(|v| v.len()).unwrap_or(0),
            "Validation response decoded"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_request_wire_format() {
        let request = ValidateRequest {
            image_ids: ["image_2", "image_1"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"imageIds":["image_1","image_2"]}"#);
    }

    #[test]
    fn test_decode_success_response() {
        let response: ValidateResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(response.success);
        assert!(response.violations.is_none());
    }

    #[test]
    fn test_decode_violation_response() {
        let json = r#"{
            "success": false,
            "violations": [
                {
                    "imageId": "image_3",
                    "reason": "requested count mismatch",
                    "totalRequests": 12,
                    "success": 10,
                    "failed": 2
                }
            ]
        }"#;
        let response: ValidateResponse = serde_json::from_str(json).unwrap();
        assert!(!response.success);
        let violations = response.violations.unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].image_id, "image_3");
        assert_eq!(violations[0].total_requests, 12);
        assert_eq!(violations[0].failed, 2);
    }

    #[test]
    fn test_request_response_round_trip() {
        let request = ValidateRequest {
            image_ids: (1..=5).map(|n| format!("image_{n}")).collect(),
        };
        let encoded = serde_json::to_string(&request).unwrap();
        let decoded: ValidateRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.image_ids, request.image_ids);

        let verdict: ValidateResponse =
            serde_json::from_str(r#"{"success":true,"violations":null}"#).unwrap();
        assert!(verdict.success);
        assert!(verdict.violations.is_none());
    }
}
