//! Engaged-time and scroll-depth tracking.
//!
//! Per-page state machine: time accrues while the page is both visible and
//! focused, scroll depth is the monotonic max observed for the current page,
//! and an engagement event goes out only when there is new information to
//! report (deeper scroll than last sent, or at least three seconds of engaged
//! time). The sentinel on the last-sent scroll depth guarantees the first
//! emission for every page.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::browser::{Clock, Navigation, Page};
use crate::dispatch::Dispatcher;
use crate::payload::EventPayload;

/// Engaged time that qualifies an emission on its own.
const ENGAGED_MS_THRESHOLD: u64 = 3000;

/// Sentinel: no engagement event has been sent for this page yet.
const NOTHING_SENT: i64 = -1;

#[derive(Debug)]
struct EngagementState {
    current_url: Option<String>,
    max_scroll_depth_px: i64,
    document_height_px: i64,
    engagement_start: Option<DateTime<Utc>>,
    accumulated_engaged_ms: u64,
    last_sent_max_scroll_px: i64,
}

impl EngagementState {
    fn empty() -> Self {
        Self {
            current_url: None,
            max_scroll_depth_px: 0,
            document_height_px: 0,
            engagement_start: None,
            accumulated_engaged_ms: 0,
            last_sent_max_scroll_px: NOTHING_SENT,
        }
    }
}

pub struct EngagementTracker {
    dispatcher: Arc<Dispatcher>,
    page: Arc<dyn Page>,
    clock: Arc<dyn Clock>,
    state: EngagementState,
}

impl EngagementTracker {
    pub fn new(dispatcher: Arc<Dispatcher>, page: Arc<dyn Page>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dispatcher,
            page,
            clock,
            state: EngagementState::empty(),
        }
    }

    /// Completed navigation to a new page. Replaces the per-page state
    /// wholesale and starts accruing immediately; the departing page's
    /// emission already happened on the before-navigate signal. History
    /// restores replace nothing.
    pub fn on_navigation(&mut self, navigation: &Navigation) {
        if navigation.history_restore {
            return;
        }
        self.state = EngagementState {
            current_url: Some(format!("{}{}", self.page.origin(), navigation.full_path)),
            max_scroll_depth_px: 0,
            document_height_px: self.page.document_height_px(),
            engagement_start: Some(self.clock.now()),
            accumulated_engaged_ms: 0,
            last_sent_max_scroll_px: NOTHING_SENT,
        };
        self.sample_scroll();
    }

    /// Visibility or focus changed. Accrual starts only on a genuine
    /// becomes-visible-and-focused transition and stops exactly once when
    /// either signal drops, so elapsed time is never double-counted.
    pub async fn on_visibility_change(&mut self) {
        if self.page.is_visible() && self.page.has_focus() {
            if self.state.engagement_start.is_none() {
                self.state.engagement_start = Some(self.clock.now());
            }
        } else {
            self.state.accumulated_engaged_ms = self.engaged_ms(self.clock.now());
            self.state.engagement_start = None;
            self.try_emit().await;
        }
    }

    /// The router is about to leave the current page; flush in-flight engaged
    /// time before the navigation reset tears the state down.
    pub async fn on_before_navigate(&mut self) {
        self.try_emit().await;
    }

    /// Page teardown races the actual destruction, which is why the transport
    /// must be unload-safe.
    pub async fn on_unload(&mut self) {
        self.try_emit().await;
    }

    pub fn on_scroll(&mut self) {
        self.sample_scroll();
    }

    fn engaged_ms(&self, now: DateTime<Utc>) -> u64 {
        let running = self
            .state
            .engagement_start
            .map(|start| (now - start).num_milliseconds().max(0) as u64)
            .unwrap_or(0);
        self.state.accumulated_engaged_ms + running
    }

    /// Scroll-equivalent pixel position: scroll offset plus viewport, capped
    /// at the document height; the whole height when the document fits the
    /// viewport.
    fn scroll_depth_sample(&self) -> i64 {
        let viewport = self.page.viewport_height_px();
        let document = self.state.document_height_px;
        if document <= viewport {
            document
        } else {
            (self.page.scroll_top_px() + viewport).min(document)
        }
    }

    fn sample_scroll(&mut self) {
        let sample = self.scroll_depth_sample();
        if sample > self.state.max_scroll_depth_px {
            self.state.max_scroll_depth_px = sample;
        }
    }

    /// Emission gate: only send when the user scrolled past the previously
    /// sent depth or enough engaged time passed to be a materially different
    /// sample. After an emission the timer does not re-arm; accrual restarts
    /// only on the next visible-and-focused transition or navigation.
    async fn try_emit(&mut self) {
        self.sample_scroll();
        let engaged_ms = self.engaged_ms(self.clock.now());
        let Some(url) = self.state.current_url.clone() else {
            return;
        };
        if self.state.max_scroll_depth_px <= self.state.last_sent_max_scroll_px
            && engaged_ms < ENGAGED_MS_THRESHOLD
        {
            return;
        }

        self.state.last_sent_max_scroll_px = self.state.max_scroll_depth_px;
        let scroll_depth =
            scroll_depth_pct(self.state.max_scroll_depth_px, self.state.document_height_px);

        let payload = EventPayload {
            url: Some(url),
            scroll_depth: Some(scroll_depth),
            engaged_ms: Some(engaged_ms),
            ..EventPayload::default()
        };
        if let Err(err) = self.dispatcher.dispatch("engagement", payload).await {
            log::warn!("plausible: engagement dispatch failed: {err}");
        }

        self.state.accumulated_engaged_ms = 0;
        self.state.engagement_start = None;
    }
}

fn scroll_depth_pct(max_px: i64, document_height_px: i64) -> u8 {
    if document_height_px <= 0 {
        return 0;
    }
    let pct = (max_px as f64 / document_height_px as f64) * 100.0;
    pct.round().clamp(0.0, 100.0) as u8
}
