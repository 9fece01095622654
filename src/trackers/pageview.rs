//! Pageview emission on route changes.
//!
//! The very first navigation carries the document's initial referrer (or an
//! explicit `null` when there is none); later in-page navigations omit the
//! key entirely so the collector derives the referrer from its own session
//! continuity instead of a stale value.

use std::sync::Arc;

use crate::browser::{Navigation, Page};
use crate::dispatch::Dispatcher;
use crate::payload::EventPayload;

pub struct PageviewTracker {
    dispatcher: Arc<Dispatcher>,
    // Consumed by the first non-restore navigation.
    initial_referrer: Option<Option<String>>,
}

impl PageviewTracker {
    pub fn new(dispatcher: Arc<Dispatcher>, page: &dyn Page) -> Self {
        Self {
            dispatcher,
            initial_referrer: Some(page.initial_referrer()),
        }
    }

    pub async fn on_navigation(&mut self, navigation: &Navigation) {
        if navigation.history_restore {
            return;
        }
        let payload = EventPayload {
            url: Some(navigation.path.clone()),
            referrer: self.initial_referrer.take(),
            ..EventPayload::default()
        };
        if let Err(err) = self.dispatcher.dispatch("pageview", payload).await {
            log::warn!("plausible: pageview dispatch failed: {err}");
        }
    }
}
