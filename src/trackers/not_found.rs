//! 404 classification over the host application's error signal.

use std::sync::Arc;

use serde_json::json;

use crate::dispatch::Dispatcher;
use crate::payload::EventPayload;

pub struct NotFoundTracker {
    dispatcher: Arc<Dispatcher>,
}

impl NotFoundTracker {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub async fn on_app_error(&self, status: u16, path: &str) {
        if status != 404 {
            return;
        }
        let payload = EventPayload::new().with_prop("path", json!(path));
        if let Err(err) = self.dispatcher.dispatch("404", payload).await {
            log::warn!("plausible: 404 dispatch failed: {err}");
        }
    }
}
