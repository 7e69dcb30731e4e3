//! Locator model: selectors and the scripts that drive them.
//!
//! The storefront locator tables are dominated by positional XPath, so every
//! selector kind lowers to a JavaScript expression the driver can evaluate.
//! CSS selectors additionally support native element resolution where the
//! backend offers it.

use serde::{Deserialize, Serialize};

/// Selector for locating elements on a storefront page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g. `#product_details`)
    Css(String),
    /// XPath selector (positional storefront locators)
    XPath(String),
    /// Visible-text selector
    Text(String),
    /// CSS selector filtered by text content
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// The raw selector string (without the kind prefix)
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) | Self::Text(s) => s,
            Self::CssWithText { css, .. } => css,
        }
    }

    /// CSS selector string, when this selector can be resolved natively
    #[must_use]
    pub fn as_css(&self) -> Option<&str> {
        match self {
            Self::Css(s) => Some(s),
            _ => None,
        }
    }

    /// JavaScript expression resolving to the first matching element (or null)
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelector({s:?})"),
            Self::XPath(s) => {
                format!("document.evaluate({s:?}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue")
            }
            Self::Text(t) => {
                format!("Array.from(document.querySelectorAll('*')).find(el => el.textContent.includes({t:?}))")
            }
            Self::CssWithText { css, text } => {
                format!("Array.from(document.querySelectorAll({css:?})).find(el => el.textContent.includes({text:?}))")
            }
        }
    }

    /// JavaScript expression counting matching elements
    #[must_use]
    pub fn to_count_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelectorAll({s:?}).length"),
            Self::XPath(s) => {
                format!("document.evaluate({s:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength")
            }
            Self::Text(t) => {
                format!("Array.from(document.querySelectorAll('*')).filter(el => el.textContent.includes({t:?})).length")
            }
            Self::CssWithText { css, text } => {
                format!("Array.from(document.querySelectorAll({css:?})).filter(el => el.textContent.includes({text:?})).length")
            }
        }
    }

    /// JavaScript expression answering "is the first match visible?"
    ///
    /// Mirrors the interactability check the storefronts need: a zero-sized
    /// or `display: none` element is considered not visible.
    #[must_use]
    pub fn to_visibility_query(&self) -> String {
        format!(
            "(() => {{ const el = {q}; if (!el) return false; \
             const r = el.getBoundingClientRect(); \
             const st = window.getComputedStyle(el); \
             return r.width > 0 && r.height > 0 && \
             st.visibility !== 'hidden' && st.display !== 'none'; }})()",
            q = self.to_query()
        )
    }

    /// JavaScript click on the first match; returns whether a click happened.
    ///
    /// With `force` the interactability check is bypassed, matching the
    /// last-resort forced click the flaky storefront UIs need.
    #[must_use]
    pub fn to_click_script(&self, force: bool) -> String {
        let gate = if force {
            String::new()
        } else {
            "const r = el.getBoundingClientRect(); \
             if (r.width === 0 || r.height === 0) return false; "
                .to_string()
        };
        format!(
            "(() => {{ const el = {q}; if (!el) return false; {gate}el.click(); return true; }})()",
            q = self.to_query()
        )
    }

    /// JavaScript fill of the first match; dispatches input/change events so
    /// reactive frontends observe the new value.
    #[must_use]
    pub fn to_fill_script(&self, value: &str) -> String {
        format!(
            "(() => {{ const el = {q}; if (!el) return false; \
             el.value = {value:?}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true; }})()",
            q = self.to_query()
        )
    }

    /// JavaScript scroll-into-view of the first match
    #[must_use]
    pub fn to_scroll_script(&self) -> String {
        format!(
            "(() => {{ const el = {q}; if (!el) return false; \
             el.scrollIntoView({{ behavior: 'instant', block: 'center' }}); return true; }})()",
            q = self.to_query()
        )
    }

    /// JavaScript expression yielding the first match's trimmed text content
    #[must_use]
    pub fn to_text_query(&self) -> String {
        format!(
            "(() => {{ const el = {q}; return el ? el.textContent.trim() : ''; }})()",
            q = self.to_query()
        )
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::CssWithText { css, text } => write!(f, "css={css} :text({text})"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_css_query() {
        let sel = Selector::css("#product_details");
        assert_eq!(
            sel.to_query(),
            "document.querySelector(\"#product_details\")"
        );
        assert_eq!(sel.as_css(), Some("#product_details"));
    }

    #[test]
    fn test_xpath_query_uses_document_evaluate() {
        let sel = Selector::xpath("//*[@id=\"product_details\"]/div[1]");
        let q = sel.to_query();
        assert!(q.contains("document.evaluate"));
        assert!(q.contains("FIRST_ORDERED_NODE_TYPE"));
        assert!(sel.as_css().is_none());
    }

    #[test]
    fn test_count_query() {
        let sel = Selector::xpath("//li");
        assert!(sel.to_count_query().contains("snapshotLength"));
        let css = Selector::css("li.option");
        assert!(css.to_count_query().contains("querySelectorAll"));
    }

    #[test]
    fn test_click_script_gates_on_visibility() {
        let sel = Selector::css("button.add");
        let soft = sel.to_click_script(false);
        let forced = sel.to_click_script(true);
        assert!(soft.contains("getBoundingClientRect"));
        assert!(!forced.contains("getBoundingClientRect"));
        assert!(forced.contains("el.click()"));
    }

    #[test]
    fn test_fill_script_dispatches_events() {
        let sel = Selector::xpath("//textarea");
        let script = sel.to_fill_script("Circle / 32x32mm");
        assert!(script.contains("'input'"));
        assert!(script.contains("'change'"));
        assert!(script.contains("Circle / 32x32mm"));
    }

    #[test]
    fn test_text_selector_display() {
        let sel = Selector::text("Add to Cart");
        assert_eq!(sel.to_string(), "text=Add to Cart");
    }

    #[test]
    fn test_serde_round_trip() {
        let sel = Selector::xpath("//*[@id=\"#modal\"]/div/div");
        let json = serde_json::to_string(&sel).unwrap();
        let back: Selector = serde_json::from_str(&json).unwrap();
        assert_eq!(sel, back);
    }
}
