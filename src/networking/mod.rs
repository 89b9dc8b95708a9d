mod error;
mod http;
mod tcp;
mod uri;

pub use error::NetworkError;
pub use http::{Response, Status};
pub use uri::Uri;

use std::time::Duration;
use tcp::TcpConnection;

const USER_AGENT: &str = concat!("chimera/", env!("CARGO_PKG_VERSION"));

/// Transport-level deadlines. The studio core imposes no timeout of its own;
/// these bound the network round trip only.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// One-shot HTTP client: a fresh connection per request, no retries, no
/// redirect following. The sole consumer issues at most one request at a
/// time, so there is nothing to pool.
#[derive(Debug, Clone, Default)]
pub struct HttpClient;

impl HttpClient {
    pub fn new() -> Self {
        Self
    }

    /// POST `body` to `url` and return the parsed response, whatever its
    /// status code. Callers decide what a non-success status means.
    pub async fn post(
        &self,
        url: &str,
        content_type: &str,
        extra_headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<Response, NetworkError> {
        let uri = Uri::parse(url)?;

        let mut connection = tokio::time::timeout(CONNECT_TIMEOUT, TcpConnection::connect(&uri))
            .await
            .map_err(|_| NetworkError::Timeout("Connection timed out".to_string()))??;

        let mut builder = http::Request::new()
            .method(http::Method::POST)
            .uri(uri.request_target())
            .header("Host", uri.host())
            .header("Connection", "close")
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .header("Accept-Encoding", "gzip, deflate, identity")
            .header("Content-Type", content_type);
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(body).build()?;

        log::debug!(target: "network", "POST {} ({})", url, content_type);
        let response = tokio::time::timeout(REQUEST_TIMEOUT, connection.send_request(&request))
            .await
            .map_err(|_| NetworkError::Timeout("Request timed out".to_string()))??;

        log::debug!(
            target: "network",
            "{} {} ({} body bytes)",
            response.status.code,
            response.status.text,
            response.body.len()
        );
        Ok(response)
    }
}
