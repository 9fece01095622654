//! # plausible-tracker-rs
//!
//! A Rust-first take on the Plausible Analytics client tracker for
//! Rust-hosted page contexts (webview bridges, embedded browsers, test
//! harnesses).
//!
//! The host environment implements the [`browser::Page`] and
//! [`browser::Clock`] capabilities and feeds discrete
//! [`browser::BrowserSignal`]s into a [`Plausible`] instance; the crate takes
//! care of engaged-time and scroll-depth measurement, pageview and
//! interaction classification, payload assembly, and best-effort delivery to
//! the collector endpoint.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use plausible_tracker_rs::{BrowserSignal, Navigation, Plausible, TrackerConfig};
//! # use plausible_tracker_rs::browser::Page;
//! # struct HostPage;
//! # impl Page for HostPage {
//! #     fn hostname(&self) -> String { "example.com".into() }
//! #     fn host(&self) -> String { "example.com".into() }
//! #     fn origin(&self) -> String { "https://example.com".into() }
//! #     fn pathname(&self) -> String { "/".into() }
//! #     fn initial_referrer(&self) -> Option<String> { None }
//! #     fn scroll_top_px(&self) -> i64 { 0 }
//! #     fn viewport_height_px(&self) -> i64 { 1000 }
//! #     fn document_height_px(&self) -> i64 { 4000 }
//! #     fn is_visible(&self) -> bool { true }
//! #     fn has_focus(&self) -> bool { true }
//! # }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut plausible = Plausible::builder(Arc::new(HostPage))
//!     .with_config(TrackerConfig {
//!         domain: Some("example.com".into()),
//!         ..TrackerConfig::default()
//!     })
//!     .build()?;
//!
//! plausible
//!     .handle(BrowserSignal::Navigated(Navigation::new("/")))
//!     .await;
//! # Ok(())
//! # }
//! ```

mod plausible;

pub mod browser;
pub mod config;
pub mod dispatch;
pub mod payload;
pub mod proxy;
pub mod trackers;
pub mod transport;

#[cfg(test)]
pub(crate) mod testutil;

pub use crate::plausible::{Plausible, PlausibleBuilder, PlausibleError, PlausibleResult};

pub use crate::browser::{
    BrowserSignal,
    Click,
    ClickKind,
    Clock,
    Navigation,
    Page,
    SystemClock,
};

pub use crate::config::TrackerConfig;

pub use crate::dispatch::{
    BoxError,
    DispatchError,
    Dispatcher,
    EnrichContext,
    EnrichListener,
};

pub use crate::payload::{EventPayload, Revenue, TRACKER_SCRIPT_VERSION};

pub use crate::proxy::{ProxyError, ProxyForwarder, ProxyResponse};

pub use crate::trackers::{
    EngagementTracker,
    LinksTracker,
    NotFoundTracker,
    PageviewTracker,
};

pub use crate::transport::{
    BeaconChannel,
    BeaconError,
    BestEffortTransport,
    HttpClient,
    HttpClientError,
    HttpResponse,
    KeepaliveHttpTransport,
    ReqwestHttpClient,
    Transport,
    TransportError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
