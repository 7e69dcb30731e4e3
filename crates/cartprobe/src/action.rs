//! Resilient action executor.
//!
//! Storefront option tiles go stale, re-render, and hide behind overlays
//! mid-run. Every interaction therefore goes through a bounded retry loop
//! with escalating strategies: trusted click, scripted click, forced click.
//! Failure is reported in the outcome, never raised, so a run can skip the
//! current combination and keep going.

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::driver::StoreDriver;
use crate::locator::Selector;
use crate::wait::{wait_for_visible, OverlayGuard, WaitOptions};

/// Default number of attempts per action
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff base (multiplied by the attempt number)
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 500;

/// Default per-attempt visibility wait
pub const DEFAULT_ATTEMPT_VISIBILITY_MS: u64 = 3_000;

/// Retry behavior for UI actions
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts before giving up
    pub max_attempts: u32,
    /// Backoff base; attempt `n` sleeps `n * base` before the next attempt
    pub base_backoff_ms: u64,
    /// Per-attempt bounded wait for the target to become visible
    pub visibility_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff_ms: DEFAULT_BASE_BACKOFF_MS,
            visibility_timeout_ms: DEFAULT_ATTEMPT_VISIBILITY_MS,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attempt budget
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the backoff base in milliseconds
    #[must_use]
    pub const fn with_base_backoff(mut self, ms: u64) -> Self {
        self.base_backoff_ms = ms;
        self
    }

    /// Set the per-attempt visibility wait in milliseconds
    #[must_use]
    pub const fn with_visibility_timeout(mut self, ms: u64) -> Self {
        self.visibility_timeout_ms = ms;
        self
    }

    /// Backoff duration after the given (1-based) attempt
    #[must_use]
    pub const fn backoff_for(&self, attempt: u32) -> std::time::Duration {
        std::time::Duration::from_millis(self.base_backoff_ms * attempt as u64)
    }

    fn visibility_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.visibility_timeout_ms)
            .with_poll_interval(100)
    }
}

/// Which strategy finally landed the action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStrategy {
    /// Trusted click/fill through the backend
    Standard,
    /// Scripted `el.click()` / value assignment
    Scripted,
    /// Scripted action with the interactability gate bypassed
    Forced,
}

impl std::fmt::Display for ActionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Scripted => write!(f, "scripted"),
            Self::Forced => write!(f, "forced"),
        }
    }
}

/// Result of a resilient action; reported, never thrown
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Whether the action was applied
    pub applied: bool,
    /// Attempts consumed
    pub attempts: u32,
    /// Winning strategy when applied
    pub strategy: Option<ActionStrategy>,
    /// Last failure message when not applied
    pub last_error: Option<String>,
}

impl ActionOutcome {
    /// Successful outcome
    #[must_use]
    pub const fn applied(attempts: u32, strategy: ActionStrategy) -> Self {
        Self {
            applied: true,
            attempts,
            strategy: Some(strategy),
            last_error: None,
        }
    }

    /// Failed outcome after exhausting attempts
    #[must_use]
    pub const fn failed(attempts: u32, last_error: Option<String>) -> Self {
        Self {
            applied: false,
            attempts,
            strategy: None,
            last_error,
        }
    }

    /// Whether the action landed
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        self.applied
    }
}

/// Executor applying clicks and fills with retry and strategy escalation
#[derive(Debug)]
pub struct ActionExecutor<'a, D: StoreDriver> {
    driver: &'a D,
    policy: RetryPolicy,
    guard: Option<&'a OverlayGuard>,
}

impl<'a, D: StoreDriver> ActionExecutor<'a, D> {
    /// Create an executor over a driver with the default policy
    #[must_use]
    pub fn new(driver: &'a D) -> Self {
        Self {
            driver,
            policy: RetryPolicy::default(),
            guard: None,
        }
    }

    /// Override the retry policy
    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Consult an overlay guard before every attempt
    #[must_use]
    pub const fn with_guard(mut self, guard: &'a OverlayGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// The active policy
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Click the selector's first match, retrying with escalation
    pub async fn click(&self, selector: &Selector, label: &str) -> ActionOutcome {
        let mut last_error = None;
        for attempt in 1..=self.policy.max_attempts {
            self.clear_overlays(label).await;
            match self.try_click_once(selector).await {
                Ok(strategy) => {
                    info!(%label, attempt, %strategy, "clicked");
                    return ActionOutcome::applied(attempt, strategy);
                }
                Err(message) => {
                    warn!(%label, attempt, %message, "click attempt failed");
                    last_error = Some(message);
                    if attempt < self.policy.max_attempts {
                        sleep(self.policy.backoff_for(attempt)).await;
                    }
                }
            }
        }
        error!(%label, attempts = self.policy.max_attempts, "click exhausted all attempts");
        ActionOutcome::failed(self.policy.max_attempts, last_error)
    }

    /// Fill the selector's first match, retrying with escalation
    pub async fn fill(&self, selector: &Selector, value: &str, label: &str) -> ActionOutcome {
        let mut last_error = None;
        for attempt in 1..=self.policy.max_attempts {
            self.clear_overlays(label).await;
            match self.try_fill_once(selector, value).await {
                Ok(strategy) => {
                    info!(%label, attempt, %strategy, "filled");
                    return ActionOutcome::applied(attempt, strategy);
                }
                Err(message) => {
                    warn!(%label, attempt, %message, "fill attempt failed");
                    last_error = Some(message);
                    if attempt < self.policy.max_attempts {
                        sleep(self.policy.backoff_for(attempt)).await;
                    }
                }
            }
        }
        error!(%label, attempts = self.policy.max_attempts, "fill exhausted all attempts");
        ActionOutcome::failed(self.policy.max_attempts, last_error)
    }

    async fn clear_overlays(&self, label: &str) {
        if let Some(guard) = self.guard {
            if !guard.wait_until_clear(self.driver).await {
                warn!(%label, "proceeding with an overlay still visible");
            }
        }
    }

    async fn try_click_once(&self, selector: &Selector) -> Result<ActionStrategy, String> {
        match self.driver.count(selector).await {
            Ok(0) => return Err(format!("no elements match {selector}")),
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }

        if let Err(e) = self.driver.scroll_into_view(selector).await {
            debug!(%selector, error = %e, "scroll into view failed");
        }

        let visible = wait_for_visible(
            self.driver,
            selector,
            &self.policy.visibility_options(),
        )
        .await;

        let mut failure = String::new();
        if visible {
            match self.driver.click(selector).await {
                Ok(()) => return Ok(ActionStrategy::Standard),
                Err(e) => failure = e.to_string(),
            }
        } else {
            failure = format!("{selector} not visible within attempt budget");
        }

        match self.driver.click_scripted(selector, false).await {
            Ok(true) => return Ok(ActionStrategy::Scripted),
            Ok(false) => {}
            Err(e) => failure = e.to_string(),
        }

        match self.driver.click_scripted(selector, true).await {
            Ok(true) => Ok(ActionStrategy::Forced),
            Ok(false) => Err(format!("forced click found nothing for {selector}")),
            Err(e) => Err(if failure.is_empty() { e.to_string() } else { failure }),
        }
    }

    async fn try_fill_once(&self, selector: &Selector, value: &str) -> Result<ActionStrategy, String> {
        match self.driver.count(selector).await {
            Ok(0) => return Err(format!("no elements match {selector}")),
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }

        if let Err(e) = self.driver.scroll_into_view(selector).await {
            debug!(%selector, error = %e, "scroll into view failed");
        }

        wait_for_visible(self.driver, selector, &self.policy.visibility_options()).await;

        match self.driver.fill(selector, value).await {
            Ok(()) => return Ok(ActionStrategy::Standard),
            Err(e) => debug!(%selector, error = %e, "native fill failed"),
        }

        match self.driver.evaluate(&selector.to_fill_script(value)).await {
            Ok(serde_json::Value::Bool(true)) => Ok(ActionStrategy::Scripted),
            Ok(_) => Err(format!("scripted fill found nothing for {selector}")),
            Err(e) => Err(e.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use std::time::Duration;
    use tokio::time::Instant;

    fn quick_policy() -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(3)
            .with_base_backoff(500)
            .with_visibility_timeout(200)
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_matches_fails_after_exact_attempts_with_backoff() {
        let driver = MockDriver::new();
        let executor = ActionExecutor::new(&driver).with_policy(quick_policy());
        let start = Instant::now();
        let outcome = executor.click(&Selector::css("#ghost"), "Ghost").await;
        assert!(!outcome.is_applied());
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.last_error.unwrap().contains("no elements match"));
        // backoff after attempts 1 and 2: 500 + 1000
        assert!(start.elapsed() >= Duration::from_millis(1_500));
        assert_eq!(driver.calls_matching("click:"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_element_clicks_standard_first_attempt() {
        let sel = Selector::xpath("//ul/li[1]");
        let driver = MockDriver::new().with_element(&sel, MockElement::visible("Circle"));
        let executor = ActionExecutor::new(&driver).with_policy(quick_policy());
        let outcome = executor.click(&sel, "Shape: Circle").await;
        assert!(outcome.is_applied());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.strategy, Some(ActionStrategy::Standard));
    }

    #[tokio::test(start_paused = true)]
    async fn test_native_failure_falls_back_to_scripted_same_attempt() {
        let sel = Selector::xpath("//ul/li[2]");
        let driver = MockDriver::new()
            .with_element(&sel, MockElement::visible("Square").with_click_failures(1));
        let executor = ActionExecutor::new(&driver).with_policy(quick_policy());
        let outcome = executor.click(&sel, "Shape: Square").await;
        assert!(outcome.is_applied());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.strategy, Some(ActionStrategy::Scripted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_element_forces_click() {
        let sel = Selector::css("li.offscreen");
        let driver = MockDriver::new().with_element(&sel, MockElement::hidden());
        let executor = ActionExecutor::new(&driver).with_policy(quick_policy());
        let outcome = executor.click(&sel, "Offscreen tier").await;
        assert!(outcome.is_applied());
        assert_eq!(outcome.strategy, Some(ActionStrategy::Forced));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fill_standard() {
        let sel = Selector::xpath("//textarea");
        let driver = MockDriver::new().with_element(&sel, MockElement::visible(""));
        let executor = ActionExecutor::new(&driver).with_policy(quick_policy());
        let outcome = executor.fill(&sel, "Circle / 32x32mm / Qty: 5", "Instructions").await;
        assert!(outcome.is_applied());
        assert_eq!(outcome.strategy, Some(ActionStrategy::Standard));
        assert_eq!(
            driver.fill_value(&sel),
            Some("Circle / 32x32mm / Qty: 5".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_consulted_before_click() {
        let overlay = Selector::css(".modal.active");
        let target = Selector::css("button.add");
        let driver = MockDriver::new()
            .with_element(&overlay, MockElement::visible("").hide_after(1))
            .with_element(&target, MockElement::visible("Add to Cart"));
        let guard = OverlayGuard::new(vec![overlay]);
        let executor = ActionExecutor::new(&driver)
            .with_policy(quick_policy())
            .with_guard(&guard);
        let outcome = executor.click(&target, "Add to Cart").await;
        assert!(outcome.is_applied());
    }
}
