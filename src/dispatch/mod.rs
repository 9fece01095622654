//! Event dispatch funnel.
//!
//! Every tracker converges here: enrichment listeners run first and may
//! mutate the payload, environment defaults are merged underneath whatever is
//! already present, and the assembled body goes out through the transport
//! exactly once. Transport failures are absorbed (fire-and-forget);
//! enrichment failures propagate to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::browser::Page;
use crate::config::TrackerConfig;
use crate::payload::{EventPayload, Revenue, TRACKER_SCRIPT_VERSION};
use crate::transport::Transport;

/// Opaque error type surfaced by user-supplied enrichment listeners.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("enrichment listener failed: {0}")]
    Enrich(#[source] BoxError),
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Mutable view handed to enrichment listeners, one per dispatch.
///
/// Listeners run sequentially in registration order over the same payload, so
/// each sees the mutations of the previous one. There is no isolation between
/// them.
pub struct EnrichContext<'a> {
    event_name: &'a str,
    payload: &'a mut EventPayload,
}

impl EnrichContext<'_> {
    pub fn event_name(&self) -> &str {
        self.event_name
    }

    pub fn payload(&self) -> &EventPayload {
        self.payload
    }

    pub fn payload_mut(&mut self) -> &mut EventPayload {
        self.payload
    }

    /// Merges a custom property into the payload; the last write per key
    /// within one dispatch wins.
    pub fn add_prop(&mut self, key: impl Into<String>, value: Value) {
        self.payload.set_prop(key, value);
    }

    /// Attaches revenue data; calling again overwrites the previous value.
    pub fn add_revenue(&mut self, amount: f64, currency: impl Into<String>) {
        self.payload.revenue = Some(Revenue::new(amount, currency));
    }
}

/// Extension point invoked once per dispatch, before defaults are merged.
#[async_trait]
pub trait EnrichListener: Send + Sync {
    async fn on_track(&self, ctx: &mut EnrichContext<'_>) -> Result<(), BoxError>;
}

/// The single funnel all trackers call through.
pub struct Dispatcher {
    config: Arc<TrackerConfig>,
    page: Arc<dyn Page>,
    transport: Arc<dyn Transport>,
    listeners: Vec<Arc<dyn EnrichListener>>,
}

impl Dispatcher {
    pub fn new(
        config: Arc<TrackerConfig>,
        page: Arc<dyn Page>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            page,
            transport,
            listeners: Vec::new(),
        }
    }

    pub fn register_listener(&mut self, listener: Arc<dyn EnrichListener>) {
        self.listeners.push(listener);
    }

    /// Assembles and sends one event. Exactly one outbound attempt; a
    /// delivery failure is logged and swallowed, never retried.
    pub async fn dispatch(
        &self,
        event_name: &str,
        mut payload: EventPayload,
    ) -> Result<(), DispatchError> {
        {
            let mut ctx = EnrichContext {
                event_name,
                payload: &mut payload,
            };
            for listener in &self.listeners {
                listener
                    .on_track(&mut ctx)
                    .await
                    .map_err(DispatchError::Enrich)?;
            }
        }

        let defaults = EventPayload {
            domain: Some(
                self.config
                    .domain
                    .clone()
                    .unwrap_or_else(|| self.page.hostname()),
            ),
            name: Some(event_name.to_string()),
            url: Some(self.page.pathname()),
            hash_mode: self.config.hash_mode.then_some("1"),
            version: Some(TRACKER_SCRIPT_VERSION),
            ..EventPayload::default()
        };
        let body = payload.merge_defaults(defaults);

        if self.config.debug {
            log::debug!("{}", debug_line(&body));
        }

        let serialized = serde_json::to_string(&body)?;
        if let Err(err) = self
            .transport
            .send(self.config.event_endpoint(), &serialized, self.config.debug)
            .await
        {
            log::debug!("plausible: event delivery failed: {err}");
        }
        Ok(())
    }
}

/// One readable line per dispatched event for debug diagnostics.
fn debug_line(body: &EventPayload) -> String {
    let name = body.name.as_deref().unwrap_or_default();
    let url = body.url.as_deref().unwrap_or_default();
    match body.engaged_ms {
        Some(engaged_ms) => format!("plausible:track {name} {url} {engaged_ms}ms"),
        None => format!("plausible:track {name} {url}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CaptureTransport, FakePage};
    use serde_json::json;

    fn dispatcher_with(
        config: TrackerConfig,
        listeners: Vec<Arc<dyn EnrichListener>>,
    ) -> (Dispatcher, Arc<CaptureTransport>) {
        let transport = CaptureTransport::new();
        let mut dispatcher = Dispatcher::new(Arc::new(config), FakePage::new(), transport.clone());
        for listener in listeners {
            dispatcher.register_listener(listener);
        }
        (dispatcher, transport)
    }

    struct PropListener {
        key: &'static str,
        value: Value,
    }

    #[async_trait]
    impl EnrichListener for PropListener {
        async fn on_track(&self, ctx: &mut EnrichContext<'_>) -> Result<(), BoxError> {
            ctx.add_prop(self.key, self.value.clone());
            Ok(())
        }
    }

    struct FailingListener;

    #[async_trait]
    impl EnrichListener for FailingListener {
        async fn on_track(&self, _ctx: &mut EnrichContext<'_>) -> Result<(), BoxError> {
            Err("listener exploded".into())
        }
    }

    #[tokio::test]
    async fn merges_environment_defaults_under_caller_fields() {
        let (dispatcher, transport) = dispatcher_with(TrackerConfig::default(), Vec::new());

        dispatcher
            .dispatch("pageview", EventPayload::new().with_url("/about"))
            .await
            .unwrap();

        let body = &transport.bodies()[0];
        assert_eq!(body["n"], json!("pageview"));
        assert_eq!(body["u"], json!("/about"));
        assert_eq!(body["d"], json!("example.com"));
        assert_eq!(body["v"], json!(5));
        assert!(body.get("h").is_none());
    }

    #[tokio::test]
    async fn configured_domain_and_hash_mode_win_over_environment() {
        let config = TrackerConfig {
            domain: Some("stats.example.org".into()),
            hash_mode: true,
            ..TrackerConfig::default()
        };
        let (dispatcher, transport) = dispatcher_with(config, Vec::new());

        dispatcher.dispatch("pageview", EventPayload::new()).await.unwrap();

        let body = &transport.bodies()[0];
        assert_eq!(body["d"], json!("stats.example.org"));
        assert_eq!(body["h"], json!("1"));
        assert_eq!(body["u"], json!("/"));
    }

    #[tokio::test]
    async fn listeners_run_in_registration_order_and_last_write_wins() {
        let (dispatcher, transport) = dispatcher_with(
            TrackerConfig::default(),
            vec![
                Arc::new(PropListener {
                    key: "plan",
                    value: json!("free"),
                }),
                Arc::new(PropListener {
                    key: "plan",
                    value: json!("pro"),
                }),
            ],
        );

        let payload = EventPayload::new().with_prop("plan", json!("caller"));
        dispatcher.dispatch("signup", payload).await.unwrap();

        // Hook value wins over the caller-supplied one.
        assert_eq!(transport.bodies()[0]["p"]["plan"], json!("pro"));
    }

    #[tokio::test]
    async fn revenue_overwrites_on_repeat_calls() {
        struct RevenueListener;

        #[async_trait]
        impl EnrichListener for RevenueListener {
            async fn on_track(&self, ctx: &mut EnrichContext<'_>) -> Result<(), BoxError> {
                ctx.add_revenue(1.0, "USD");
                ctx.add_revenue(19.90, "EUR");
                Ok(())
            }
        }

        let (dispatcher, transport) =
            dispatcher_with(TrackerConfig::default(), vec![Arc::new(RevenueListener)]);
        dispatcher.dispatch("purchase", EventPayload::new()).await.unwrap();

        let body = &transport.bodies()[0];
        assert_eq!(body["$"]["amount"], json!(19.90));
        assert_eq!(body["$"]["currency"], json!("EUR"));
    }

    #[tokio::test]
    async fn listener_error_propagates_and_nothing_is_sent() {
        let (dispatcher, transport) =
            dispatcher_with(TrackerConfig::default(), vec![Arc::new(FailingListener)]);

        let result = dispatcher.dispatch("pageview", EventPayload::new()).await;
        assert!(matches!(result, Err(DispatchError::Enrich(_))));
        assert!(transport.bodies().is_empty());
    }

    #[test]
    fn debug_line_prints_plain_values() {
        let body = EventPayload {
            name: Some("engagement".into()),
            url: Some("https://example.com/".into()),
            engaged_ms: Some(3500),
            ..EventPayload::default()
        };
        assert_eq!(
            debug_line(&body),
            "plausible:track engagement https://example.com/ 3500ms"
        );
    }

    #[test]
    fn debug_line_omits_missing_engaged_time() {
        let body = EventPayload {
            name: Some("pageview".into()),
            url: Some("/".into()),
            ..EventPayload::default()
        };
        assert_eq!(debug_line(&body), "plausible:track pageview /");
    }

    #[tokio::test]
    async fn dispatches_to_proxy_endpoint_when_configured() {
        let config = TrackerConfig {
            proxy_endpoint: Some(url::Url::parse("https://example.com/pa/event").unwrap()),
            ..TrackerConfig::default()
        };
        let (dispatcher, transport) = dispatcher_with(config, Vec::new());

        dispatcher.dispatch("pageview", EventPayload::new()).await.unwrap();
        assert_eq!(
            transport.endpoints()[0].as_str(),
            "https://example.com/pa/event"
        );
    }
}
