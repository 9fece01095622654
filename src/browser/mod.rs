//! Host-environment capabilities and the browser signal stream.
//!
//! The core never touches a real DOM. The host embedding (webview bridge,
//! test harness…) implements [`Page`] and [`Clock`] and feeds discrete
//! [`BrowserSignal`]s into the orchestrator, which keeps every state
//! transition on a single cooperative event queue.

use chrono::{DateTime, Utc};

/// Wall-clock capability, injectable so tests can drive engaged time
/// deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// System-time backed clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Read-only view of the current page, sampled at signal-handling time.
pub trait Page: Send + Sync {
    /// Hostname without port, as in `location.hostname`.
    fn hostname(&self) -> String;
    /// Hostname plus optional port, as in `location.host`.
    fn host(&self) -> String;
    /// Scheme plus host, as in `location.origin`.
    fn origin(&self) -> String;
    /// Current path, as in `location.pathname`.
    fn pathname(&self) -> String;
    /// The document's initial referrer; `None` when the document has none.
    fn initial_referrer(&self) -> Option<String>;
    fn scroll_top_px(&self) -> i64;
    fn viewport_height_px(&self) -> i64;
    fn document_height_px(&self) -> i64;
    fn is_visible(&self) -> bool;
    fn has_focus(&self) -> bool;
}

/// A completed route change.
#[derive(Debug, Clone)]
pub struct Navigation {
    /// Route path, e.g. `/about`.
    pub path: String,
    /// Full path including query and fragment.
    pub full_path: String,
    /// True for same-document history restores, which replace nothing.
    pub history_restore: bool,
}

impl Navigation {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            full_path: path.clone(),
            path,
            history_restore: false,
        }
    }

    pub fn with_full_path(mut self, full_path: impl Into<String>) -> Self {
        self.full_path = full_path.into();
        self
    }

    pub fn history_restore(mut self) -> Self {
        self.history_restore = true;
        self
    }
}

/// Mouse button carried by auxiliary clicks.
pub const MIDDLE_MOUSE_BUTTON: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Primary,
    /// `auxclick` with the originating button index.
    Aux { button: u8 },
}

/// A click that resolved to an enclosing anchor. The DOM ancestor lookup is
/// the host's job; the core only sees the anchor's resolved absolute href.
#[derive(Debug, Clone)]
pub struct Click {
    pub href: Option<String>,
    pub has_download_attr: bool,
    pub kind: ClickKind,
}

impl Click {
    pub fn primary(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            has_download_attr: false,
            kind: ClickKind::Primary,
        }
    }

    pub fn aux(href: impl Into<String>, button: u8) -> Self {
        Self {
            href: Some(href.into()),
            has_download_attr: false,
            kind: ClickKind::Aux { button },
        }
    }

    pub fn with_download_attr(mut self) -> Self {
        self.has_download_attr = true;
        self
    }
}

/// Discrete browser-delivered events the host feeds into the tracker.
#[derive(Debug, Clone)]
pub enum BrowserSignal {
    VisibilityChanged,
    FocusChanged,
    Scrolled,
    /// The router is about to leave the current page.
    BeforeNavigate,
    Navigated(Navigation),
    Click(Click),
    Unload,
    AppError { status: u16, path: String },
}
