//! Outbound-link and file-download click classification.
//!
//! Thin observer over click signals: a link whose host differs from the page
//! host is outbound; otherwise a download attribute or an allowlisted path
//! extension marks a file download. Auxiliary clicks count only for the
//! middle mouse button.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use url::Url;

use crate::browser::{Click, ClickKind, MIDDLE_MOUSE_BUTTON, Page};
use crate::config::TrackerConfig;
use crate::dispatch::Dispatcher;
use crate::payload::EventPayload;

pub struct LinksTracker {
    dispatcher: Arc<Dispatcher>,
    page: Arc<dyn Page>,
    track_outbound: bool,
    download_extensions: HashSet<String>,
}

impl LinksTracker {
    pub fn new(dispatcher: Arc<Dispatcher>, page: Arc<dyn Page>, config: &TrackerConfig) -> Self {
        Self {
            dispatcher,
            page,
            track_outbound: config.track_outbound_links,
            download_extensions: config.download_extensions(),
        }
    }

    pub async fn on_click(&self, click: &Click) {
        if let ClickKind::Aux { button } = click.kind
            && button != MIDDLE_MOUSE_BUTTON
        {
            return;
        }
        let Some(href) = click.href.as_deref() else {
            return;
        };
        let Ok(url) = Url::parse(href) else {
            return;
        };

        // Outbound check comes first and never falls through to downloads.
        if link_host(&url) != self.page.host() {
            if self.track_outbound {
                self.dispatch_link("Outbound Link: Click", href).await;
            }
            return;
        }

        if self.download_extensions.is_empty() {
            return;
        }
        let tracked_extension = path_extension(url.path())
            .is_some_and(|extension| self.download_extensions.contains(extension));
        if click.has_download_attr || tracked_extension {
            self.dispatch_link("File Download", href).await;
        }
    }

    async fn dispatch_link(&self, event_name: &str, href: &str) {
        let payload = EventPayload::new().with_prop("url", json!(href));
        if let Err(err) = self.dispatcher.dispatch(event_name, payload).await {
            log::warn!("plausible: link dispatch failed: {err}");
        }
    }
}

fn link_host(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

fn path_extension(path: &str) -> Option<&str> {
    let (_, extension) = path.rsplit_once('.')?;
    (!extension.is_empty() && !extension.contains('/')).then_some(extension)
}
