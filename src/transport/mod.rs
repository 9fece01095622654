//! Delivery layer.
//!
//! The primary channel is a host-provided beacon capability that survives
//! page teardown; when it is unavailable or fails synchronously the payload
//! goes out through a single keepalive-style HTTP POST. Delivery is strictly
//! best-effort: no retry, no queue, losing an occasional event is acceptable
//! while blocking the page is not.

mod http_client;

pub use http_client::{HttpClient, HttpClientError, HttpResponse, ReqwestHttpClient};

use std::sync::Arc;

use async_trait::async_trait;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

/// Header added to fallback requests when debug diagnostics are on.
const DEBUG_REQUEST_HEADER: &str = "x-debug-request";

/// Error raised synchronously by a beacon capability.
#[derive(Debug, Error)]
pub enum BeaconError {
    #[error("beacon channel unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("beacon send failed: {0}")]
    Beacon(#[from] BeaconError),
    #[error("http error: {0}")]
    Http(#[from] HttpClientError),
}

/// Best-effort delivery of one serialized event body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, endpoint: &Url, body: &str, debug: bool) -> Result<(), TransportError>;
}

/// Unload-surviving fire-and-forget primitive supplied by the host
/// environment, mirroring `navigator.sendBeacon`. Synchronous: an error here
/// means the capability itself is unusable and the HTTP fallback takes over.
/// A beacon that accepts the hand-off but later drops the payload (the
/// `sendBeacon() == false` case) must report `Ok`; that loss is silent and
/// never triggers the fallback.
pub trait BeaconChannel: Send + Sync {
    fn send(&self, endpoint: &Url, body: &str) -> Result<(), BeaconError>;
}

/// Fallback transport issuing a plain-text POST that is never cancelled by
/// the library, the closest server-side equivalent of a keepalive fetch.
pub struct KeepaliveHttpTransport {
    client: Arc<dyn HttpClient>,
}

impl KeepaliveHttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            client: Arc::new(ReqwestHttpClient::new()?),
        })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(ReqwestHttpClient::from_client(client)),
        }
    }

    /// Use a custom HTTP capability instead of the reqwest-backed one.
    pub fn with_http_client(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for KeepaliveHttpTransport {
    async fn send(&self, endpoint: &Url, body: &str, debug: bool) -> Result<(), TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        if debug {
            headers.insert(
                HeaderName::from_static(DEBUG_REQUEST_HEADER),
                HeaderValue::from_static("true"),
            );
        }
        self.client.post(endpoint, &headers, body.to_string()).await?;
        Ok(())
    }
}

/// Primary/fallback composition. The beacon is probed first; only a
/// synchronous beacon failure falls through to exactly one HTTP attempt.
/// There is never a retry after a network failure.
pub struct BestEffortTransport {
    beacon: Option<Arc<dyn BeaconChannel>>,
    fallback: Arc<dyn Transport>,
}

impl BestEffortTransport {
    pub fn new(beacon: Option<Arc<dyn BeaconChannel>>, fallback: Arc<dyn Transport>) -> Self {
        Self { beacon, fallback }
    }
}

#[async_trait]
impl Transport for BestEffortTransport {
    async fn send(&self, endpoint: &Url, body: &str, debug: bool) -> Result<(), TransportError> {
        if let Some(beacon) = &self.beacon {
            match beacon.send(endpoint, body) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    log::debug!("plausible: beacon failed, falling back to http: {err}");
                }
            }
        }
        self.fallback.send(endpoint, body, debug).await
    }
}
