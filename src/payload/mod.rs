//! Collector wire payload.
//!
//! Single-letter keys mirror the Plausible events API. Absent optional fields
//! are omitted from the serialized body; the referrer is the one field that
//! distinguishes "absent" from an explicit JSON `null`.

use serde::Serialize;
use serde_json::{Map, Value};

/// Version of the payload schema spoken by this tracker.
pub const TRACKER_SCRIPT_VERSION: u8 = 5;

/// Revenue attribution attached to a goal or custom event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Revenue {
    pub amount: f64,
    pub currency: String,
}

impl Revenue {
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

/// Wire-level event sent to the collector endpoint.
///
/// Trackers fill in the fields they own and leave the rest to the dispatcher,
/// which merges environment defaults underneath before sending.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventPayload {
    /// Domain name of the site in Plausible (`d`).
    #[serde(rename = "d", skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Event name (`n`). `pageview` and `engagement` are special collector
    /// events; anything else is a custom event.
    #[serde(rename = "n", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// URL of the event (`u`). The hostname derived from it takes part in
    /// unique visitor recognition.
    #[serde(rename = "u", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Referrer (`r`). Outer `None` omits the key entirely; `Some(None)`
    /// sends an explicit `null`.
    #[serde(rename = "r", skip_serializing_if = "Option::is_none")]
    pub referrer: Option<Option<String>>,
    /// `"1"` when the host application uses hash-based routing (`h`).
    #[serde(rename = "h", skip_serializing_if = "Option::is_none")]
    pub hash_mode: Option<&'static str>,
    /// Custom properties (`p`), attachable to pageviews and custom events.
    #[serde(rename = "p", skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    /// Revenue data (`$`) for goals and custom events.
    #[serde(rename = "$", skip_serializing_if = "Option::is_none")]
    pub revenue: Option<Revenue>,
    /// Whether the event counts for bounce detection (`i`).
    #[serde(rename = "i", skip_serializing_if = "Option::is_none")]
    pub interactive: Option<bool>,
    /// Scroll depth percentage, 0-100 (`sd`). Engagement events only.
    #[serde(rename = "sd", skip_serializing_if = "Option::is_none")]
    pub scroll_depth: Option<u8>,
    /// Engaged time in milliseconds (`e`). Engagement events only.
    #[serde(rename = "e", skip_serializing_if = "Option::is_none")]
    pub engaged_ms: Option<u64>,
    /// Tracker schema version (`v`).
    #[serde(rename = "v", skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
}

impl EventPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets a single custom property, overwriting any previous value for the
    /// same key.
    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set_prop(key, value);
        self
    }

    pub fn set_prop(&mut self, key: impl Into<String>, value: Value) {
        self.props
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
    }

    /// Fills every field that is still absent from `defaults`. Present fields
    /// always win; custom properties merge key-wise with present keys
    /// winning, so the merge is commutative on disjoint keys.
    pub fn merge_defaults(mut self, defaults: Self) -> Self {
        self.domain = self.domain.or(defaults.domain);
        self.name = self.name.or(defaults.name);
        self.url = self.url.or(defaults.url);
        self.referrer = self.referrer.or(defaults.referrer);
        self.hash_mode = self.hash_mode.or(defaults.hash_mode);
        self.revenue = self.revenue.or(defaults.revenue);
        self.interactive = self.interactive.or(defaults.interactive);
        self.scroll_depth = self.scroll_depth.or(defaults.scroll_depth);
        self.engaged_ms = self.engaged_ms.or(defaults.engaged_ms);
        self.version = self.version.or(defaults.version);

        if let Some(default_props) = defaults.props {
            let props = self.props.get_or_insert_with(Map::new);
            for (key, value) in default_props {
                props.entry(key).or_insert(value);
            }
        }

        self
    }
}
