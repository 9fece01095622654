//! Signal observers: each tracker watches a slice of the browser signal
//! stream and converges on the shared dispatcher.

pub mod engagement;
pub mod links;
pub mod not_found;
pub mod pageview;

pub use engagement::EngagementTracker;
pub use links::LinksTracker;
pub use not_found::NotFoundTracker;
pub use pageview::PageviewTracker;
