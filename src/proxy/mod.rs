//! Collector passthrough forwarder.
//!
//! Stateless relay between the page and the real collector endpoint for
//! same-origin proxying: keeps the client IP visible upstream via
//! `X-Forwarded-For` and surfaces the collector's dropped-event diagnostic
//! header when debugging. No measurement logic lives here.

use std::sync::Arc;

use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::transport::{HttpClient, HttpClientError, ReqwestHttpClient};

/// Diagnostic header the collector sets when it drops an event.
const DROPPED_HEADER: &str = "x-plausible-dropped";

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to proxy request to Plausible API: {0}")]
    Upstream(#[from] HttpClientError),
    #[error("client ip is not a valid header value: {0}")]
    InvalidClientIp(String),
}

impl ProxyError {
    /// HTTP status the forwarding layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::Upstream(_) => 502,
            ProxyError::InvalidClientIp(_) => 400,
        }
    }
}

/// Upstream response relayed back to the original caller.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: u16,
    pub body: String,
}

pub struct ProxyForwarder {
    client: Arc<dyn HttpClient>,
    upstream: Url,
    debug: bool,
}

impl ProxyForwarder {
    pub fn new(upstream: Url, debug: bool) -> Result<Self, ProxyError> {
        Ok(Self {
            client: Arc::new(ReqwestHttpClient::new()?),
            upstream,
            debug,
        })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(client: reqwest::Client, upstream: Url, debug: bool) -> Self {
        Self {
            client: Arc::new(ReqwestHttpClient::from_client(client)),
            upstream,
            debug,
        }
    }

    /// Use a custom HTTP capability instead of the reqwest-backed one.
    pub fn with_http_client(client: Arc<dyn HttpClient>, upstream: Url, debug: bool) -> Self {
        Self {
            client,
            upstream,
            debug,
        }
    }

    /// Relays one event body upstream. Any transport failure maps to the
    /// fixed 502-style [`ProxyError::Upstream`].
    pub async fn forward(
        &self,
        body: String,
        client_ip: Option<String>,
    ) -> Result<ProxyResponse, ProxyError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        if let Some(ip) = client_ip {
            let value = HeaderValue::from_str(&ip)
                .map_err(|_| ProxyError::InvalidClientIp(ip.clone()))?;
            headers.insert(HeaderName::from_static(FORWARDED_FOR_HEADER), value);
        }

        let response = self.client.post(&self.upstream, &headers, body).await?;
        if self.debug
            && let Some(dropped) = response.headers.get(DROPPED_HEADER)
        {
            log::warn!(
                "plausible: collector dropped event: {}",
                String::from_utf8_lossy(dropped.as_bytes())
            );
        }

        Ok(ProxyResponse {
            status: response.status,
            body: response.body,
        })
    }
}
