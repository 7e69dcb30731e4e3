//! Modal dismissal chain.
//!
//! Cart confirmation modals on the audited storefronts ignore their own
//! close button often enough that a single strategy is not survivable. The
//! chain tries an ordered list of dismissal strategies, re-checking the
//! modal after each, and reports which one finally worked.

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::driver::StoreDriver;
use crate::locator::Selector;

/// Settle time after each dismissal attempt before re-checking the modal
pub const DEFAULT_SETTLE_MS: u64 = 800;

/// Script dropping fixed high-z-index layers and restoring body scroll.
/// Last-ditch cleanup for modals that no longer respond to input.
const REMOVE_OVERLAYS_SCRIPT: &str = "(() => { \
  const selectors = ['[class*=\"modal\"]', '[class*=\"cart\"]', '[class*=\"overlay\"]', '[class*=\"drawer\"]']; \
  selectors.forEach(selector => { \
    document.querySelectorAll(selector).forEach(el => { \
      const computed = window.getComputedStyle(el); \
      if (computed.position === 'fixed' || computed.position === 'absolute') { \
        const z = parseInt(computed.zIndex, 10); \
        if (z > 100) { el.style.display = 'none'; el.remove(); } \
      } \
    }); \
  }); \
  document.body.style.overflow = 'auto'; \
  document.documentElement.style.overflow = 'auto'; \
  return true; })()";

/// One way of making a modal go away
#[derive(Debug, Clone)]
pub enum DismissStrategy {
    /// Click the designated close control
    CloseClick(Selector),
    /// Scripted click on the close control, bypassing interactability
    ScriptedClose(Selector),
    /// Send the Escape key to the page
    EscapeKey,
    /// Click the first visible control from a list of likely close buttons
    AnyCloseControl(Vec<Selector>),
    /// Remove fixed high-z-index layers from the DOM
    RemoveFromDom,
    /// Navigate back to a known URL to reset page state
    NavigateTo(String),
}

impl std::fmt::Display for DismissStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CloseClick(_) => write!(f, "close-click"),
            Self::ScriptedClose(_) => write!(f, "scripted-close"),
            Self::EscapeKey => write!(f, "escape-key"),
            Self::AnyCloseControl(_) => write!(f, "any-close-control"),
            Self::RemoveFromDom => write!(f, "dom-removal"),
            Self::NavigateTo(_) => write!(f, "navigate-reset"),
        }
    }
}

/// What happened to the modal after running the chain
#[derive(Debug, Clone, Copy)]
pub enum DismissOutcome<'a> {
    /// The modal was not visible to begin with
    AlreadyClear,
    /// The modal disappeared after this strategy
    Dismissed(&'a DismissStrategy),
    /// The modal survived every strategy
    Stuck,
}

impl DismissOutcome<'_> {
    /// Whether the modal is gone
    #[must_use]
    pub const fn is_clear(&self) -> bool {
        !matches!(self, Self::Stuck)
    }
}

/// Ordered dismissal strategies for one modal
#[derive(Debug, Clone)]
pub struct DismissChain {
    modal: Selector,
    strategies: Vec<DismissStrategy>,
    settle_ms: u64,
}

impl DismissChain {
    /// Create an empty chain for a modal
    #[must_use]
    pub fn new(modal: Selector) -> Self {
        Self {
            modal,
            strategies: Vec::new(),
            settle_ms: DEFAULT_SETTLE_MS,
        }
    }

    /// The full escalation the storefront cart modal needs: direct close,
    /// scripted close, Escape, any plausible close control, DOM removal,
    /// and finally a navigation reset to `reset_url`.
    #[must_use]
    pub fn standard(modal: Selector, close: Selector, reset_url: impl Into<String>) -> Self {
        let fallback_controls = vec![
            close.clone(),
            Selector::css("button[aria-label=\"Close\"]"),
            Selector::css("button.close"),
            Selector::css("[class*=\"close\"]"),
            Selector::xpath("//button[contains(@class, \"close\")]"),
            Selector::xpath("//a[contains(@class, \"close\")]"),
        ];
        Self::new(modal)
            .push(DismissStrategy::CloseClick(close.clone()))
            .push(DismissStrategy::ScriptedClose(close))
            .push(DismissStrategy::EscapeKey)
            .push(DismissStrategy::AnyCloseControl(fallback_controls))
            .push(DismissStrategy::RemoveFromDom)
            .push(DismissStrategy::NavigateTo(reset_url.into()))
    }

    /// Append a strategy
    #[must_use]
    pub fn push(mut self, strategy: DismissStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Override the settle time between attempts
    #[must_use]
    pub const fn with_settle(mut self, settle_ms: u64) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    /// The configured strategies, in order
    #[must_use]
    pub fn strategies(&self) -> &[DismissStrategy] {
        &self.strategies
    }

    /// The modal selector this chain watches
    #[must_use]
    pub const fn modal(&self) -> &Selector {
        &self.modal
    }

    /// Try each strategy in order until the modal is gone.
    ///
    /// Strategy-level failures are absorbed: the next strategy still runs.
    pub async fn dismiss<D: StoreDriver>(&self, driver: &D) -> DismissOutcome<'_> {
        if !driver.is_visible(&self.modal).await {
            return DismissOutcome::AlreadyClear;
        }
        for strategy in &self.strategies {
            self.apply(driver, strategy).await;
            sleep(std::time::Duration::from_millis(self.settle_ms)).await;
            if !driver.is_visible(&self.modal).await {
                info!(%strategy, modal = %self.modal, "modal dismissed");
                return DismissOutcome::Dismissed(strategy);
            }
            warn!(%strategy, modal = %self.modal, "modal still visible");
        }
        error!(modal = %self.modal, "modal survived every dismissal strategy");
        DismissOutcome::Stuck
    }

    async fn apply<D: StoreDriver>(&self, driver: &D, strategy: &DismissStrategy) {
        match strategy {
            DismissStrategy::CloseClick(selector) => {
                if let Err(e) = driver.click(selector).await {
                    warn!(%selector, error = %e, "close click failed");
                }
            }
            DismissStrategy::ScriptedClose(selector) => {
                if let Err(e) = driver.click_scripted(selector, true).await {
                    warn!(%selector, error = %e, "scripted close failed");
                }
            }
            DismissStrategy::EscapeKey => {
                if let Err(e) = driver.press_key("Escape").await {
                    warn!(error = %e, "escape key failed");
                }
            }
            DismissStrategy::AnyCloseControl(selectors) => {
                for selector in selectors {
                    if driver.is_visible(selector).await {
                        match driver.click_scripted(selector, true).await {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(e) => warn!(%selector, error = %e, "close control failed"),
                        }
                    }
                }
            }
            DismissStrategy::RemoveFromDom => {
                if let Err(e) = driver.evaluate(REMOVE_OVERLAYS_SCRIPT).await {
                    warn!(error = %e, "overlay removal script failed");
                }
            }
            DismissStrategy::NavigateTo(url) => {
                if let Err(e) = driver.navigate(url).await {
                    warn!(%url, error = %e, "navigation reset failed");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};

    fn modal() -> Selector {
        Selector::xpath("//*[@id=\"__layout\"]/div/div[1]/header/div[3]/div")
    }

    fn close() -> Selector {
        Selector::xpath("//*[@id=\"__layout\"]//ul/li[3]/div/a")
    }

    fn chain() -> DismissChain {
        DismissChain::standard(modal(), close(), "https://shop.example/product").with_settle(10)
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_modal_is_already_clear() {
        let driver = MockDriver::new().with_element(&close(), MockElement::visible("x"));
        let chain = chain();
        let outcome = chain.dismiss(&driver).await;
        assert!(matches!(outcome, DismissOutcome::AlreadyClear));
        // nothing was clicked: the modal never blocked anything
        assert_eq!(driver.calls_matching("click"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_strategy_gets_credit() {
        // visible on the entry check, gone by the first post-strategy check
        let driver = MockDriver::new()
            .with_element(&modal(), MockElement::visible("").hide_after(1))
            .with_element(&close(), MockElement::visible("x"));
        let chain = chain();
        let outcome = chain.dismiss(&driver).await;
        assert!(matches!(
            outcome,
            DismissOutcome::Dismissed(DismissStrategy::CloseClick(_))
        ));
        assert_eq!(driver.calls_matching("click:"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalates_to_escape() {
        // survives the entry check and two post-strategy checks
        let driver = MockDriver::new()
            .with_element(&modal(), MockElement::visible("").hide_after(3))
            .with_element(&close(), MockElement::visible("x"));
        let chain = chain();
        let outcome = chain.dismiss(&driver).await;
        assert!(matches!(
            outcome,
            DismissOutcome::Dismissed(DismissStrategy::EscapeKey)
        ));
        assert!(driver.was_called("press:Escape"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_modal_exhausts_chain_in_order() {
        let driver = MockDriver::new()
            .with_element(&modal(), MockElement::visible(""))
            .with_element(&close(), MockElement::visible("x"));
        let chain = chain();
        let outcome = chain.dismiss(&driver).await;
        assert!(!outcome.is_clear());
        let history = driver.history();
        let click_pos = history.iter().position(|c| c.starts_with("click:")).unwrap();
        let escape_pos = history.iter().position(|c| c == "press:Escape").unwrap();
        let nav_pos = history.iter().position(|c| c.starts_with("navigate:")).unwrap();
        assert!(click_pos < escape_pos);
        assert!(escape_pos < nav_pos);
    }
}
