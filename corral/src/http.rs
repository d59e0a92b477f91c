//! HTTP client abstraction for testability
//!
//! Both remote boundaries (the platform REST API and the coordinator RPC
//! endpoint) speak JSON over HTTP through [`HttpClient`], so tests can swap
//! in a scripted client.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace};

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// The request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The remote end could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The remote end answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Any other request failure.
    #[error("request failed: {0}")]
    Request(String),
}

impl HttpError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Synchronous JSON-over-HTTP operations.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the body.
    fn get(&self, url: &str) -> Result<Vec<u8>, HttpError>;

    /// Performs an HTTP POST request with a JSON body.
    fn post_json(&self, url: &str, json_body: &str) -> Result<Vec<u8>, HttpError>;

    /// Performs an HTTP PUT request with a JSON body.
    fn put_json(&self, url: &str, json_body: &str) -> Result<Vec<u8>, HttpError>;
}

/// Connect and request timeouts for a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(15),
        }
    }
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

const USER_AGENT: &str = concat!("corral/", env!("CARGO_PKG_VERSION"));

impl ReqwestClient {
    /// Creates a client with the given timeouts.
    pub fn new(timeouts: Timeouts) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn finish(
        &self,
        url: &str,
        result: reqwest::Result<reqwest::blocking::Response>,
    ) -> Result<Vec<u8>, HttpError> {
        let response = result.map_err(|e| classify(url, e))?;
        let status = response.status();
        let bytes = response.bytes().map_err(|e| classify(url, e))?;

        if !status.is_success() {
            debug!(url, status = status.as_u16(), "HTTP request rejected");
            return Err(HttpError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        trace!(url, bytes = bytes.len(), "HTTP request complete");
        Ok(bytes.to_vec())
    }
}

fn classify(url: &str, e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout(format!("{}: {}", url, e))
    } else if e.is_connect() {
        HttpError::Connect(format!("{}: {}", url, e))
    } else {
        HttpError::Request(format!("{}: {}", url, e))
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        trace!(url, "GET");
        self.finish(url, self.client.get(url).send())
    }

    fn post_json(&self, url: &str, json_body: &str) -> Result<Vec<u8>, HttpError> {
        trace!(url, "POST");
        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(json_body.to_string());
        self.finish(url, request.send())
    }

    fn put_json(&self, url: &str, json_body: &str) -> Result<Vec<u8>, HttpError> {
        trace!(url, "PUT");
        let request = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(json_body.to_string());
        self.finish(url, request.send())
    }
}
