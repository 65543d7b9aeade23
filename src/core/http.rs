use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

use crate::core::error::{StageError, StageResult};

const APP_USER_AGENT: &str = "mcstage/0.1.0";
const REQUEST_TIMEOUT_SECS: u64 = 120;

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
}

/// Network seam used by the resolver, the asset engine and the artifact fetcher.
///
/// One call is one GET. Implementations must not retry internally.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the full body at `url`. Non-success statuses are errors.
    async fn get(&self, url: &str) -> StageResult<Vec<u8>>;
}

/// `Transport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> StageResult<Self> {
        Ok(Self {
            client: build_http_client()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> StageResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StageError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ab/payload"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let body = transport
            .get(&format!("{}/ab/payload", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn get_maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let err = transport
            .get(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::DownloadFailed { status: 404, .. }));
    }
}
