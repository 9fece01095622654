//! Tracker configuration.
//!
//! Owned by the host application's setup layer and read-only to the core once
//! built. Defaults mirror the reference tracker: pageview and engagement
//! tracking on, everything else opt-in.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use url::Url;

/// Extensions tracked when the file-download allowlist is set to `"*"`.
static DEFAULT_FILE_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "pdf", "xlsx", "docx", "txt", "rtf", "csv", "exe", "key", "pps", "ppt", "pptx", "7z",
        "pkg", "rar", "gz", "zip", "avi", "mov", "mp4", "mpeg", "wmv", "midi", "mp3", "wav",
        "wma", "dmg",
    ]
    .into_iter()
    .collect()
});

/// Runtime configuration consumed by the tracker core.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Site domain registered in Plausible. Falls back to the page hostname.
    pub domain: Option<String>,
    /// Events API endpoint of the Plausible instance.
    pub api_endpoint: Url,
    /// When set, the client sends events here instead of `api_endpoint`,
    /// typically a same-origin passthrough to dodge content blockers.
    pub proxy_endpoint: Option<Url>,
    /// Whether the host routes via the URL fragment instead of the path.
    pub hash_mode: bool,
    /// Emit local diagnostics for every dispatched event.
    pub debug: bool,
    /// Track route changes automatically.
    pub track_pageviews: bool,
    /// Track engaged time and scroll depth automatically.
    pub track_engagement: bool,
    /// Track application-level 404s.
    pub track_404: bool,
    /// Track clicks on links leaving the current host.
    pub track_outbound_links: bool,
    /// Comma-delimited extension allowlist for file-download tracking.
    /// Empty disables it; `"*"` expands to the default extension list.
    pub track_file_downloads: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            domain: None,
            api_endpoint: Url::parse("https://plausible.io/api/event")
                .expect("default endpoint is a valid url"),
            proxy_endpoint: None,
            hash_mode: false,
            debug: false,
            track_pageviews: true,
            track_engagement: true,
            track_404: false,
            track_outbound_links: false,
            track_file_downloads: String::new(),
        }
    }
}

impl TrackerConfig {
    /// Endpoint events are dispatched to: the proxy when configured,
    /// otherwise the API endpoint itself.
    pub fn event_endpoint(&self) -> &Url {
        self.proxy_endpoint.as_ref().unwrap_or(&self.api_endpoint)
    }

    /// Parsed file-download extension set. Empty means the classifier is
    /// disabled.
    pub fn download_extensions(&self) -> HashSet<String> {
        let spec = self.track_file_downloads.trim();
        if spec.is_empty() {
            return HashSet::new();
        }
        if spec == "*" {
            return DEFAULT_FILE_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_string())
                .collect();
        }
        spec.split(',')
            .map(str::trim)
            .filter(|ext| !ext.is_empty())
            .map(str::to_string)
            .collect()
    }
}
