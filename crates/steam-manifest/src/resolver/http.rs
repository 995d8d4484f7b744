//! HTTP utilities
//!
//! The pipeline talks to the network only through the [`Fetcher`] trait so the
//! orchestrator can be driven by any client. [`HttpClient`] is the `reqwest`
//! implementation used in production.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::resolver::config::ResolverConfig;
use crate::resolver::core::{ResolveError, Result};

/// Retrieves the raw body behind a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the body of a successful response
    ///
    /// Non-success statuses map to [`ResolveError::HttpStatus`].
    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// GET `url` and decode the JSON body into `T`
pub async fn get_json<T: DeserializeOwned>(fetcher: &dyn Fetcher, url: &str) -> Result<T> {
    let body = fetcher.get(url).await?;
    decode_json(url, &body)
}

/// Decode a JSON body, keeping the URL for error context
pub fn decode_json<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| ResolveError::MalformedResponse {
        url: url.to_string(),
        source: e,
    })
}

/// `reqwest` backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client from resolver configuration
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ResolveError::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
            field: None,
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| ResolveError::HttpRequest {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!("GET {} returned {}", url, status);
            return Err(ResolveError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| ResolveError::HttpRequest {
            url: url.to_string(),
            source: e,
        })?;
        debug!("GET {} returned {} bytes", url, body.len());
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[derive(Debug, Deserialize)]
    struct Payload {
        value: u32,
    }

    #[tokio::test]
    async fn get_json_decodes_successful_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payload"))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value":7}"#))
            .mount(&server)
            .await;

        let client = HttpClient::from_config(&ResolverConfig::default()).unwrap();
        let payload: Payload = get_json(&client, &format!("{}/payload", server.uri())).await.unwrap();
        assert_eq!(payload.value, 7);
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpClient::from_config(&ResolverConfig::default()).unwrap();
        let result = client.get(&format!("{}/missing", server.uri())).await;
        match result {
            Err(ResolveError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = HttpClient::from_config(&ResolverConfig::default()).unwrap();
        let result: Result<Payload> = get_json(&client, &format!("{}/garbage", server.uri())).await;
        assert!(matches!(result, Err(ResolveError::MalformedResponse { .. })));
    }
}
