//! Driver seam between the audit harness and the browser.
//!
//! The harness only ever talks to a [`StoreDriver`]; the real CDP-backed
//! implementation lives in [`crate::browser`] behind the `browser` feature,
//! and [`MockDriver`] provides a scripted page for unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::locator::Selector;
use crate::result::{CartprobeError, CartprobeResult};

/// Abstract driver for storefront pages
///
/// Implementations:
///
/// - `ChromiumDriver` — default, chromiumoxide CDP (feature `browser`)
/// - [`MockDriver`] — scripted DOM for unit testing
#[async_trait]
pub trait StoreDriver: Send + Sync {
    /// Navigate to a URL and wait for the document to load
    async fn navigate(&self, url: &str) -> CartprobeResult<()>;

    /// Evaluate JavaScript in the page context
    async fn evaluate(&self, script: &str) -> CartprobeResult<serde_json::Value>;

    /// Number of elements the selector currently resolves to
    async fn count(&self, selector: &Selector) -> CartprobeResult<u32>;

    /// Whether the first match is visible; resolution failures read as "not
    /// visible" so callers can poll without error handling
    async fn is_visible(&self, selector: &Selector) -> bool;

    /// Primary (trusted where the backend allows) click on the first match
    async fn click(&self, selector: &Selector) -> CartprobeResult<()>;

    /// Scripted `el.click()`; returns whether a click actually happened.
    /// With `force` the interactability gate is bypassed.
    async fn click_scripted(&self, selector: &Selector, force: bool) -> CartprobeResult<bool>;

    /// Fill a form control with a value
    async fn fill(&self, selector: &Selector, value: &str) -> CartprobeResult<()>;

    /// Trimmed text content of the first match
    async fn text_of(&self, selector: &Selector) -> CartprobeResult<String>;

    /// Best-effort scroll of the first match into view
    async fn scroll_into_view(&self, selector: &Selector) -> CartprobeResult<()>;

    /// Dispatch a key press (e.g. `Escape`) to the page
    async fn press_key(&self, key: &str) -> CartprobeResult<()>;

    /// Attach local files to a file input
    async fn set_input_files(&self, selector: &Selector, paths: &[PathBuf])
        -> CartprobeResult<()>;

    /// Capture a full-page screenshot to `path`
    async fn screenshot(&self, path: &Path) -> CartprobeResult<()>;

    /// Current page URL
    async fn current_url(&self) -> CartprobeResult<String>;

    /// Shut the driver down
    async fn close(&mut self) -> CartprobeResult<()>;
}

/// A scripted element in the mock page
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    /// Steady-state visibility
    pub visible: bool,
    /// Text content
    pub text: String,
    /// Visible for this many visibility polls, then hidden (overlays)
    pub hide_after_polls: Option<u32>,
    /// Hidden for this many visibility polls, then visible
    pub show_after_polls: Option<u32>,
    /// Number of primary clicks that fail before one succeeds
    pub click_failures: u32,
    /// Number of scripted clicks that report "not clicked"
    pub scripted_click_failures: u32,
    /// Last value written by `fill`
    pub fill_value: Option<String>,
}

impl MockElement {
    /// A visible element with text content
    #[must_use]
    pub fn visible(text: impl Into<String>) -> Self {
        Self {
            visible: true,
            text: text.into(),
            ..Self::default()
        }
    }

    /// An attached but hidden element
    #[must_use]
    pub fn hidden() -> Self {
        Self::default()
    }

    /// Visible for `polls` visibility checks, then gone
    #[must_use]
    pub const fn hide_after(mut self, polls: u32) -> Self {
        self.hide_after_polls = Some(polls);
        self
    }

    /// Hidden for `polls` visibility checks, then visible
    #[must_use]
    pub const fn show_after(mut self, polls: u32) -> Self {
        self.show_after_polls = Some(polls);
        self
    }

    /// Fail this many primary clicks before succeeding
    #[must_use]
    pub const fn with_click_failures(mut self, n: u32) -> Self {
        self.click_failures = n;
        self
    }

    /// Report "not clicked" for this many scripted clicks
    #[must_use]
    pub const fn with_scripted_click_failures(mut self, n: u32) -> Self {
        self.scripted_click_failures = n;
        self
    }

    fn currently_visible(&self) -> bool {
        if let Some(n) = self.hide_after_polls {
            return n > 0;
        }
        if let Some(n) = self.show_after_polls {
            return n == 0;
        }
        self.visible
    }

    fn poll_visibility(&mut self) -> bool {
        if let Some(n) = self.hide_after_polls {
            if n > 0 {
                self.hide_after_polls = Some(n - 1);
                return true;
            }
            return false;
        }
        if let Some(n) = self.show_after_polls {
            if n > 0 {
                self.show_after_polls = Some(n - 1);
                return false;
            }
            return true;
        }
        self.visible
    }
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    elements: HashMap<String, MockElement>,
    eval_results: Vec<serde_json::Value>,
    history: Vec<String>,
}

/// Mock driver with a scripted page, for unit tests
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Create an empty mock page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a scripted element
    pub fn add_element(&self, selector: &Selector, element: MockElement) {
        self.state().elements.insert(selector.to_string(), element);
    }

    /// Builder form of [`Self::add_element`]
    #[must_use]
    pub fn with_element(self, selector: &Selector, element: MockElement) -> Self {
        self.add_element(selector, element);
        self
    }

    /// Queue a result for the next `evaluate` call
    pub fn push_eval_result(&self, value: serde_json::Value) {
        self.state().eval_results.push(value);
    }

    /// Remove an element (it becomes unresolvable)
    pub fn remove_element(&self, selector: &Selector) {
        self.state().elements.remove(&selector.to_string());
    }

    /// Full call history, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state().history.clone()
    }

    /// Whether any call matching `prefix` was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.state().history.iter().any(|c| c.starts_with(prefix))
    }

    /// Number of calls matching `prefix`
    #[must_use]
    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.state()
            .history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Last value written into an element by `fill`
    #[must_use]
    pub fn fill_value(&self, selector: &Selector) -> Option<String> {
        self.state()
            .elements
            .get(&selector.to_string())
            .and_then(|e| e.fill_value.clone())
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StoreDriver for MockDriver {
    async fn navigate(&self, url: &str) -> CartprobeResult<()> {
        let mut state = self.state();
        state.history.push(format!("navigate:{url}"));
        state.url = url.to_string();
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> CartprobeResult<serde_json::Value> {
        let mut state = self.state();
        state.history.push(format!("evaluate:{script}"));
        if state.eval_results.is_empty() {
            Ok(serde_json::Value::Null)
        } else {
            Ok(state.eval_results.remove(0))
        }
    }

    async fn count(&self, selector: &Selector) -> CartprobeResult<u32> {
        let state = self.state();
        Ok(u32::from(state.elements.contains_key(&selector.to_string())))
    }

    async fn is_visible(&self, selector: &Selector) -> bool {
        let mut state = self.state();
        state
            .elements
            .get_mut(&selector.to_string())
            .is_some_and(MockElement::poll_visibility)
    }

    async fn click(&self, selector: &Selector) -> CartprobeResult<()> {
        let mut state = self.state();
        let key = selector.to_string();
        let Some(el) = state.elements.get_mut(&key) else {
            return Err(CartprobeError::page(format!("no element for {selector}")));
        };
        if el.click_failures > 0 {
            el.click_failures -= 1;
            return Err(CartprobeError::page(format!(
                "element {selector} not interactable"
            )));
        }
        state.history.push(format!("click:{key}"));
        Ok(())
    }

    async fn click_scripted(&self, selector: &Selector, force: bool) -> CartprobeResult<bool> {
        let mut state = self.state();
        let key = selector.to_string();
        let Some(el) = state.elements.get_mut(&key) else {
            return Ok(false);
        };
        if el.scripted_click_failures > 0 {
            el.scripted_click_failures -= 1;
            return Ok(false);
        }
        if !force && !el.currently_visible() {
            return Ok(false);
        }
        state.history.push(format!("click_js:{key}:force={force}"));
        Ok(true)
    }

    async fn fill(&self, selector: &Selector, value: &str) -> CartprobeResult<()> {
        let mut state = self.state();
        let key = selector.to_string();
        let Some(el) = state.elements.get_mut(&key) else {
            return Err(CartprobeError::page(format!("no element for {selector}")));
        };
        el.fill_value = Some(value.to_string());
        state.history.push(format!("fill:{key}"));
        Ok(())
    }

    async fn text_of(&self, selector: &Selector) -> CartprobeResult<String> {
        let state = self.state();
        state
            .elements
            .get(&selector.to_string())
            .map(|e| e.text.clone())
            .ok_or_else(|| CartprobeError::page(format!("no element for {selector}")))
    }

    async fn scroll_into_view(&self, selector: &Selector) -> CartprobeResult<()> {
        let mut state = self.state();
        let key = selector.to_string();
        if state.elements.contains_key(&key) {
            state.history.push(format!("scroll:{key}"));
            Ok(())
        } else {
            Err(CartprobeError::page(format!("no element for {selector}")))
        }
    }

    async fn press_key(&self, key: &str) -> CartprobeResult<()> {
        self.state().history.push(format!("press:{key}"));
        Ok(())
    }

    async fn set_input_files(
        &self,
        selector: &Selector,
        paths: &[PathBuf],
    ) -> CartprobeResult<()> {
        let mut state = self.state();
        let key = selector.to_string();
        if state.elements.contains_key(&key) {
            state.history.push(format!("upload:{key}:{}", paths.len()));
            Ok(())
        } else {
            Err(CartprobeError::page(format!("no element for {selector}")))
        }
    }

    async fn screenshot(&self, path: &Path) -> CartprobeResult<()> {
        self.state()
            .history
            .push(format!("screenshot:{}", path.display()));
        Ok(())
    }

    async fn current_url(&self) -> CartprobeResult<String> {
        Ok(self.state().url.clone())
    }

    async fn close(&mut self) -> CartprobeResult<()> {
        self.state().history.push("close".to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::css(s)
    }

    #[tokio::test]
    async fn test_navigate_records_history() {
        let driver = MockDriver::new();
        driver.navigate("https://example.com/").await.unwrap();
        assert!(driver.was_called("navigate:https://example.com/"));
        assert_eq!(driver.current_url().await.unwrap(), "https://example.com/");
    }

    #[tokio::test]
    async fn test_missing_element_counts_zero() {
        let driver = MockDriver::new();
        assert_eq!(driver.count(&sel("#nope")).await.unwrap(), 0);
        assert!(!driver.is_visible(&sel("#nope")).await);
        assert!(driver.click(&sel("#nope")).await.is_err());
    }

    #[tokio::test]
    async fn test_click_failure_injection() {
        let driver =
            MockDriver::new().with_element(&sel("button"), MockElement::visible("Add").with_click_failures(2));
        assert!(driver.click(&sel("button")).await.is_err());
        assert!(driver.click(&sel("button")).await.is_err());
        assert!(driver.click(&sel("button")).await.is_ok());
        assert_eq!(driver.calls_matching("click:"), 1);
    }

    #[tokio::test]
    async fn test_hide_after_polls() {
        let driver =
            MockDriver::new().with_element(&sel(".overlay"), MockElement::visible("").hide_after(2));
        assert!(driver.is_visible(&sel(".overlay")).await);
        assert!(driver.is_visible(&sel(".overlay")).await);
        assert!(!driver.is_visible(&sel(".overlay")).await);
    }

    #[tokio::test]
    async fn test_scripted_click_respects_visibility_gate() {
        let driver = MockDriver::new().with_element(&sel(".hidden"), MockElement::hidden());
        assert!(!driver.click_scripted(&sel(".hidden"), false).await.unwrap());
        assert!(driver.click_scripted(&sel(".hidden"), true).await.unwrap());
    }

    #[tokio::test]
    async fn test_fill_stores_value() {
        let driver = MockDriver::new().with_element(&sel("textarea"), MockElement::visible(""));
        driver.fill(&sel("textarea"), "note").await.unwrap();
        assert_eq!(driver.fill_value(&sel("textarea")), Some("note".to_string()));
    }
}
