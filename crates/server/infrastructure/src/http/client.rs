//! reqwest-backed implementation of the [`HttpClient`] port.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use eventide_server_domain::{HttpClient, HttpError};

/// HTTP adapter with a bounded total-request timeout, so a slow endpoint
/// cannot stall a consumer task indefinitely.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: String,
    ) -> Result<u16, HttpError> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|_| HttpError::InvalidMethod(method.to_string()))?;

        let mut request = self.client.request(method, url);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| HttpError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_method_is_rejected_before_any_io() {
        let client = ReqwestHttpClient::new(Duration::from_secs(1)).unwrap();

        let err = client
            .execute("NOT A METHOD", "http://localhost:1", &HashMap::new(), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidMethod(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let client = ReqwestHttpClient::new(Duration::from_millis(200)).unwrap();

        // Nothing listens on port 9 on loopback.
        let err = client
            .execute("POST", "http://127.0.0.1:9", &HashMap::new(), "{}".into())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Transport { .. }));
    }
}
