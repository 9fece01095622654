//! High level tracker orchestration.
//!
//! Wires the configuration, dispatcher, transport, and the individual
//! trackers into a single instance the host feeds browser signals to. All
//! state transitions happen on the host's single event queue; the
//! orchestrator itself holds no measurement state.

use std::sync::Arc;

use thiserror::Error;

use crate::browser::{BrowserSignal, Clock, Page, SystemClock};
use crate::config::TrackerConfig;
use crate::dispatch::{DispatchError, Dispatcher, EnrichListener};
use crate::payload::EventPayload;
use crate::trackers::{EngagementTracker, LinksTracker, NotFoundTracker, PageviewTracker};
use crate::transport::{BeaconChannel, BestEffortTransport, KeepaliveHttpTransport, Transport, TransportError};

/// Result alias used across the orchestration layer.
pub type PlausibleResult<T> = Result<T, PlausibleError>;

/// High-level error surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum PlausibleError {
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("transport setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Fluent builder for [`Plausible`].
pub struct PlausibleBuilder {
    config: TrackerConfig,
    page: Arc<dyn Page>,
    clock: Arc<dyn Clock>,
    beacon: Option<Arc<dyn BeaconChannel>>,
    transport: Option<Arc<dyn Transport>>,
    listeners: Vec<Arc<dyn EnrichListener>>,
}

impl PlausibleBuilder {
    pub fn new(page: Arc<dyn Page>) -> Self {
        Self {
            config: TrackerConfig::default(),
            page,
            clock: Arc::new(SystemClock),
            beacon: None,
            transport: None,
            listeners: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Host-provided unload-surviving send primitive. Without one, every
    /// event goes out over the keepalive HTTP fallback.
    pub fn with_beacon_channel(mut self, beacon: Arc<dyn BeaconChannel>) -> Self {
        self.beacon = Some(beacon);
        self
    }

    /// Replaces the whole delivery layer, beacon probing included.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Registers an enrichment listener; listeners run per dispatch in
    /// registration order.
    pub fn with_enrich_listener(mut self, listener: Arc<dyn EnrichListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn build(self) -> PlausibleResult<Plausible> {
        let config = Arc::new(self.config);
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(BestEffortTransport::new(
                self.beacon,
                Arc::new(KeepaliveHttpTransport::new()?),
            )),
        };

        let mut dispatcher = Dispatcher::new(config.clone(), self.page.clone(), transport);
        for listener in self.listeners {
            dispatcher.register_listener(listener);
        }
        let dispatcher = Arc::new(dispatcher);

        let pageview = config
            .track_pageviews
            .then(|| PageviewTracker::new(dispatcher.clone(), self.page.as_ref()));
        let engagement = config.track_engagement.then(|| {
            EngagementTracker::new(dispatcher.clone(), self.page.clone(), self.clock.clone())
        });
        let links = (config.track_outbound_links || !config.download_extensions().is_empty())
            .then(|| LinksTracker::new(dispatcher.clone(), self.page.clone(), &config));
        let not_found = config
            .track_404
            .then(|| NotFoundTracker::new(dispatcher.clone()));

        Ok(Plausible {
            dispatcher,
            pageview,
            engagement,
            links,
            not_found,
        })
    }
}

/// Main tracker instance, one per page/session context.
pub struct Plausible {
    dispatcher: Arc<Dispatcher>,
    pageview: Option<PageviewTracker>,
    engagement: Option<EngagementTracker>,
    links: Option<LinksTracker>,
    not_found: Option<NotFoundTracker>,
}

impl Plausible {
    /// Obtain a builder for the given host page.
    pub fn builder(page: Arc<dyn Page>) -> PlausibleBuilder {
        PlausibleBuilder::new(page)
    }

    /// Routes one browser-delivered signal to the interested trackers.
    /// Dispatch failures inside trackers are logged and absorbed so a signal
    /// handler never takes the host page down.
    pub async fn handle(&mut self, signal: BrowserSignal) {
        match signal {
            BrowserSignal::VisibilityChanged | BrowserSignal::FocusChanged => {
                if let Some(engagement) = self.engagement.as_mut() {
                    engagement.on_visibility_change().await;
                }
            }
            BrowserSignal::Scrolled => {
                if let Some(engagement) = self.engagement.as_mut() {
                    engagement.on_scroll();
                }
            }
            BrowserSignal::BeforeNavigate => {
                if let Some(engagement) = self.engagement.as_mut() {
                    engagement.on_before_navigate().await;
                }
            }
            BrowserSignal::Navigated(navigation) => {
                if let Some(pageview) = self.pageview.as_mut() {
                    pageview.on_navigation(&navigation).await;
                }
                if let Some(engagement) = self.engagement.as_mut() {
                    engagement.on_navigation(&navigation);
                }
            }
            BrowserSignal::Click(click) => {
                if let Some(links) = self.links.as_ref() {
                    links.on_click(&click).await;
                }
            }
            BrowserSignal::Unload => {
                if let Some(engagement) = self.engagement.as_mut() {
                    engagement.on_unload().await;
                }
            }
            BrowserSignal::AppError { status, path } => {
                if let Some(not_found) = self.not_found.as_ref() {
                    not_found.on_app_error(status, &path).await;
                }
            }
        }
    }

    /// Manual custom-event entry point. Unlike the automatic trackers this
    /// surfaces enrichment failures to the caller.
    pub async fn track(&self, event_name: &str, payload: EventPayload) -> PlausibleResult<()> {
        self.dispatcher
            .dispatch(event_name, payload)
            .await
            .map_err(Into::into)
    }
}
