//! Recency-based routing for ordered result sets.
//! The newest items in a newest-first feed are viewed most, so they earn
//! provider-quality translation; older items settle for the static tier and
//! amortize the cost.

/// Which resolution path an item takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Full pipeline including the live provider tier.
    Live,
    /// Dictionary and cache only; no provider call.
    Static,
}

#[derive(Debug, Clone)]
pub struct RecencyRouter {
    /// Items with rank below this go Live. Policy constant, not a property
    /// of the data.
    live_window: usize,
}

impl RecencyRouter {
    pub const DEFAULT_LIVE_WINDOW: usize = 3;

    pub fn new(live_window: usize) -> Self {
        Self { live_window }
    }

    /// Route by zero-based position within the containing ordered collection.
    pub fn route(&self, rank: usize) -> Route {
        if rank < self.live_window {
            Route::Live
        } else {
            Route::Static
        }
    }
}

impl Default for RecencyRouter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIVE_WINDOW)
    }
}
