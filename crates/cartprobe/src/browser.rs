//! Real browser control over the Chrome DevTools Protocol.
//!
//! Compiled with the `browser` feature. CSS selectors resolve natively
//! through CDP element handles; XPath and text selectors (the storefronts'
//! locator tables are positional XPath) resolve through evaluated scripts
//! from [`crate::locator::Selector`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::page::{Page as CdpPage, ScreenshotParams};
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::driver::StoreDriver;
use crate::locator::Selector;
use crate::result::{CartprobeError, CartprobeResult};

/// Browser launch configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run without a window
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to the chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable in containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1_280,
            viewport_height: 900,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set the chromium binary path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable the sandbox (containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// A running browser instance
#[derive(Debug)]
pub struct Browser {
    config: BrowserConfig,
    inner: Arc<Mutex<CdpBrowser>>,
    #[allow(dead_code)]
    handle: tokio::task::JoinHandle<()>,
}

impl Browser {
    /// Launch a browser
    pub async fn launch(config: BrowserConfig) -> CartprobeResult<Self> {
        let mut builder =
            CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(|message| {
            if message.contains("executable") {
                CartprobeError::BrowserNotFound
            } else {
                CartprobeError::BrowserLaunch { message }
            }
        })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| CartprobeError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            config,
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// The launch configuration
    #[must_use]
    pub const fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Open a new page and wrap it as a driver
    pub async fn new_driver(&self) -> CartprobeResult<ChromiumDriver> {
        let browser = self.inner.lock().await;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CartprobeError::page(e.to_string()))?;
        Ok(ChromiumDriver { page })
    }

    /// Shut the browser down
    pub async fn close(self) -> CartprobeResult<()> {
        let mut browser = self.inner.lock().await;
        browser
            .close()
            .await
            .map_err(|e| CartprobeError::BrowserLaunch {
                message: e.to_string(),
            })?;
        Ok(())
    }
}

/// [`StoreDriver`] over one CDP page
#[derive(Debug)]
pub struct ChromiumDriver {
    page: CdpPage,
}

impl ChromiumDriver {
    async fn eval_value(&self, script: &str) -> CartprobeResult<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| CartprobeError::eval(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| CartprobeError::eval(e.to_string()))
    }

    async fn eval_bool(&self, script: &str) -> CartprobeResult<bool> {
        Ok(matches!(
            self.eval_value(script).await?,
            serde_json::Value::Bool(true)
        ))
    }

    async fn dispatch_key(&self, kind: DispatchKeyEventType, key: &str) -> CartprobeResult<()> {
        let params = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key(key)
            .build()
            .map_err(|message| CartprobeError::page(message))?;
        self.page
            .execute(params)
            .await
            .map_err(|e| CartprobeError::page(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl StoreDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> CartprobeResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| CartprobeError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        if let Err(e) = self.page.wait_for_navigation().await {
            debug!(%url, error = %e, "navigation wait ended early");
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> CartprobeResult<serde_json::Value> {
        self.eval_value(script).await
    }

    async fn count(&self, selector: &Selector) -> CartprobeResult<u32> {
        match self.eval_value(&selector.to_count_query()).await? {
            serde_json::Value::Number(n) => Ok(n.as_u64().unwrap_or(0) as u32),
            _ => Ok(0),
        }
    }

    async fn is_visible(&self, selector: &Selector) -> bool {
        self.eval_bool(&selector.to_visibility_query())
            .await
            .unwrap_or(false)
    }

    async fn click(&self, selector: &Selector) -> CartprobeResult<()> {
        if let Some(css) = selector.as_css() {
            let element = self
                .page
                .find_element(css)
                .await
                .map_err(|e| CartprobeError::page(e.to_string()))?;
            element
                .click()
                .await
                .map_err(|e| CartprobeError::page(e.to_string()))?;
            return Ok(());
        }
        // positional XPath: resolved and clicked in page context
        if self.eval_bool(&selector.to_click_script(false)).await? {
            Ok(())
        } else {
            Err(CartprobeError::page(format!(
                "{selector} not clickable in page context"
            )))
        }
    }

    async fn click_scripted(&self, selector: &Selector, force: bool) -> CartprobeResult<bool> {
        self.eval_bool(&selector.to_click_script(force)).await
    }

    async fn fill(&self, selector: &Selector, value: &str) -> CartprobeResult<()> {
        if self.eval_bool(&selector.to_fill_script(value)).await? {
            Ok(())
        } else {
            Err(CartprobeError::page(format!("{selector} not fillable")))
        }
    }

    async fn text_of(&self, selector: &Selector) -> CartprobeResult<String> {
        match self.eval_value(&selector.to_text_query()).await? {
            serde_json::Value::String(text) => Ok(text),
            other => Ok(other.to_string()),
        }
    }

    async fn scroll_into_view(&self, selector: &Selector) -> CartprobeResult<()> {
        if let Some(css) = selector.as_css() {
            if let Ok(element) = self.page.find_element(css).await {
                if element.scroll_into_view().await.is_ok() {
                    return Ok(());
                }
            }
        }
        if self.eval_bool(&selector.to_scroll_script()).await? {
            Ok(())
        } else {
            Err(CartprobeError::page(format!("{selector} not scrollable")))
        }
    }

    async fn press_key(&self, key: &str) -> CartprobeResult<()> {
        self.dispatch_key(DispatchKeyEventType::KeyDown, key).await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, key).await
    }

    async fn set_input_files(
        &self,
        selector: &Selector,
        paths: &[PathBuf],
    ) -> CartprobeResult<()> {
        let Some(css) = selector.as_css() else {
            return Err(CartprobeError::page(format!(
                "file inputs need a CSS selector, got {selector}"
            )));
        };
        let element = self
            .page
            .find_element(css)
            .await
            .map_err(|e| CartprobeError::page(e.to_string()))?;
        let files: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let params = SetFileInputFilesParams::builder()
            .files(files)
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(|message| CartprobeError::page(message))?;
        self.page
            .execute(params)
            .await
            .map_err(|e| CartprobeError::page(e.to_string()))?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> CartprobeResult<()> {
        let bytes = self
            .page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(|e| CartprobeError::page(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    async fn current_url(&self) -> CartprobeResult<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| CartprobeError::page(e.to_string()))?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn close(&mut self) -> CartprobeResult<()> {
        // the page dies with the browser; nothing to tear down per driver
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_config_builders() {
        let config = BrowserConfig::default()
            .with_headless(false)
            .with_viewport(1_920, 1_080)
            .with_no_sandbox()
            .with_chromium_path("/usr/bin/chromium");
        assert!(!config.headless);
        assert_eq!(config.viewport_width, 1_920);
        assert!(!config.sandbox);
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
    }
}
