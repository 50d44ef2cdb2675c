//! Image fetching
//!
//! Provides the `ImageFetcher` trait the coordinator fans out over, and
//! the reqwest-backed implementation used by the CLI. Fetch failures are
//! reported per work item and never abort the batch.

use crate::error::{FetchError, FetchResult};
use async_trait::async_trait;
use reqwest::Client;

/// Trait for image fetch implementations
///
/// The coordinator treats the fetcher as a black box: it only cares
/// whether the fetch happened, not about the payload.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch a single image, returning its raw bytes
    async fn fetch_image(&self, url: &str) -> FetchResult<Vec<u8>>;
}

/// HTTP image fetcher backed by a shared reqwest client
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    /// Create a fetcher over an already-configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_image(&self, url: &str) -> FetchResult<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| FetchError::BodyRead {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }
}

/// Build the fetch URL for one image identifier
pub fn image_url(base: &str, image_id: &str, session_token: &str) -> String {
    format!("{base}/test-tasks/get-image/{image_id}.png?session-token={session_token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_format() {
        let url = image_url("https://host.example", "image_7", "token-1");
        assert_eq!(
            url,
            "https://host.example/test-tasks/get-image/image_7.png?session-token=token-1"
        );
    }
}
