//! Shared test doubles: a scripted page, a manually advanced clock, and a
//! transport that captures deserialized bodies instead of touching the
//! network.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use url::Url;

use http::HeaderMap;

use crate::browser::{Clock, Page};
use crate::transport::{HttpClient, HttpClientError, HttpResponse, Transport, TransportError};

pub(crate) struct ManualClock {
    now_ms: Mutex<i64>,
}

impl ManualClock {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            now_ms: Mutex::new(0),
        })
    }

    pub(crate) fn advance_ms(&self, ms: i64) {
        *self.now_ms.lock().unwrap() += ms;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(*self.now_ms.lock().unwrap())
            .single()
            .expect("in-range test timestamp")
    }
}

pub(crate) struct FakePage {
    pub(crate) referrer: Option<String>,
    pub(crate) viewport_height: i64,
    pub(crate) document_height: Mutex<i64>,
    pub(crate) scroll_top: Mutex<i64>,
    pub(crate) visible: Mutex<bool>,
    pub(crate) focused: Mutex<bool>,
}

impl FakePage {
    pub(crate) fn new() -> Arc<Self> {
        Self::with_referrer(Some("https://referrer.example/".into()))
    }

    pub(crate) fn without_referrer() -> Arc<Self> {
        Self::with_referrer(None)
    }

    pub(crate) fn with_referrer(referrer: Option<String>) -> Arc<Self> {
        Arc::new(Self {
            referrer,
            viewport_height: 1000,
            document_height: Mutex::new(4000),
            scroll_top: Mutex::new(0),
            visible: Mutex::new(true),
            focused: Mutex::new(true),
        })
    }

    pub(crate) fn set_scroll_top(&self, px: i64) {
        *self.scroll_top.lock().unwrap() = px;
    }

    pub(crate) fn set_visible(&self, visible: bool) {
        *self.visible.lock().unwrap() = visible;
    }

    pub(crate) fn set_focused(&self, focused: bool) {
        *self.focused.lock().unwrap() = focused;
    }
}

impl Page for FakePage {
    fn hostname(&self) -> String {
        "example.com".into()
    }

    fn host(&self) -> String {
        "example.com".into()
    }

    fn origin(&self) -> String {
        "https://example.com".into()
    }

    fn pathname(&self) -> String {
        "/".into()
    }

    fn initial_referrer(&self) -> Option<String> {
        self.referrer.clone()
    }

    fn scroll_top_px(&self) -> i64 {
        *self.scroll_top.lock().unwrap()
    }

    fn viewport_height_px(&self) -> i64 {
        self.viewport_height
    }

    fn document_height_px(&self) -> i64 {
        *self.document_height.lock().unwrap()
    }

    fn is_visible(&self) -> bool {
        *self.visible.lock().unwrap()
    }

    fn has_focus(&self) -> bool {
        *self.focused.lock().unwrap()
    }
}

pub(crate) struct CaptureTransport {
    sent: Mutex<Vec<(Url, Value)>>,
}

impl CaptureTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn bodies(&self) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub(crate) fn endpoints(&self) -> Vec<Url> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for CaptureTransport {
    async fn send(&self, endpoint: &Url, body: &str, _debug: bool) -> Result<(), TransportError> {
        let body: Value = serde_json::from_str(body).expect("dispatched body is valid json");
        self.sent.lock().unwrap().push((endpoint.clone(), body));
        Ok(())
    }
}

/// HTTP capability double recording every assembled request and answering
/// with a canned response, or failing outright.
pub(crate) struct CaptureHttpClient {
    requests: Mutex<Vec<(Url, HeaderMap, String)>>,
    response: Option<HttpResponse>,
}

impl CaptureHttpClient {
    pub(crate) fn ok() -> Arc<Self> {
        Self::with_response(202, HeaderMap::new(), "")
    }

    pub(crate) fn with_response(status: u16, headers: HeaderMap, body: &str) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            response: Some(HttpResponse {
                status,
                headers,
                body: body.to_string(),
            }),
        })
    }

    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            response: None,
        })
    }

    pub(crate) fn requests(&self) -> Vec<(Url, HeaderMap, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for CaptureHttpClient {
    async fn post(
        &self,
        url: &Url,
        headers: &HeaderMap,
        body: String,
    ) -> Result<HttpResponse, HttpClientError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.clone(), headers.clone(), body));
        match &self.response {
            Some(response) => Ok(response.clone()),
            None => Err(HttpClientError::Transport("connection refused".into())),
        }
    }
}
