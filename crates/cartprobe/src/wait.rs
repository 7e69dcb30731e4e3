//! Bounded cooperative waits and the overlay guard.
//!
//! Storefront modals routinely swallow clicks aimed at the elements beneath
//! them. The guard polls a known set of overlay selectors and reports (never
//! enforces) whether the page is clear; callers proceed on a "not clear"
//! answer and let the action executor absorb the fallout.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::driver::StoreDriver;
use crate::locator::Selector;

/// Default timeout for overlay clearance (3 seconds)
pub const DEFAULT_OVERLAY_TIMEOUT_MS: u64 = 3_000;

/// Default overlay polling interval (150ms)
pub const DEFAULT_OVERLAY_POLL_MS: u64 = 150;

/// Default timeout for element visibility waits (8 seconds)
pub const DEFAULT_VISIBILITY_TIMEOUT_MS: u64 = 8_000;

/// Default element polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Options for bounded polling waits
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_VISIBILITY_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Timeout as a Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as a Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Wait until the selector's first match is visible, within the bounded
/// timeout. Returns whether visibility was reached; never errors.
pub async fn wait_for_visible<D: StoreDriver>(
    driver: &D,
    selector: &Selector,
    options: &WaitOptions,
) -> bool {
    let deadline = Instant::now() + options.timeout();
    loop {
        if driver.is_visible(selector).await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(options.poll_interval()).await;
    }
}

/// Wait until the selector no longer resolves to a visible element
pub async fn wait_for_hidden<D: StoreDriver>(
    driver: &D,
    selector: &Selector,
    options: &WaitOptions,
) -> bool {
    let deadline = Instant::now() + options.timeout();
    loop {
        if !driver.is_visible(selector).await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(options.poll_interval()).await;
    }
}

/// Guard over a static set of known blocking overlay selectors
#[derive(Debug, Clone)]
pub struct OverlayGuard {
    selectors: Vec<Selector>,
    options: WaitOptions,
}

impl OverlayGuard {
    /// Create a guard for a set of overlay selectors
    #[must_use]
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self {
            selectors,
            options: WaitOptions {
                timeout_ms: DEFAULT_OVERLAY_TIMEOUT_MS,
                poll_interval_ms: DEFAULT_OVERLAY_POLL_MS,
            },
        }
    }

    /// Override the wait options
    #[must_use]
    pub const fn with_options(mut self, options: WaitOptions) -> Self {
        self.options = options;
        self
    }

    /// The overlay selectors being watched
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// First overlay currently visible, if any
    pub async fn blocking_overlay<D: StoreDriver>(&self, driver: &D) -> Option<&Selector> {
        for selector in &self.selectors {
            if driver.is_visible(selector).await {
                return Some(selector);
            }
        }
        None
    }

    /// Poll until no overlay is visible or the timeout elapses.
    ///
    /// Returns the "clear" status. A `false` result is a soft warning, not a
    /// hard gate; callers proceed anyway.
    pub async fn wait_until_clear<D: StoreDriver>(&self, driver: &D) -> bool {
        let deadline = Instant::now() + self.options.timeout();
        loop {
            match self.blocking_overlay(driver).await {
                None => return true,
                Some(selector) => {
                    if Instant::now() >= deadline {
                        warn!(overlay = %selector, "overlay still visible at timeout");
                        return false;
                    }
                    debug!(overlay = %selector, "waiting for overlay to clear");
                }
            }
            sleep(self.options.poll_interval()).await;
        }
    }
}
