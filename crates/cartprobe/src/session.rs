//! Login flow.
//!
//! Opens the account dropdown, signs in through the modal, then decides the
//! outcome by whether the modal went away or the inline error showed up.
//! Login problems are reported as a status, not an error: the caller decides
//! whether they are fatal for the run at hand.

use std::path::PathBuf;

use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::config::Environment;
use crate::driver::StoreDriver;
use crate::sites::SiteProfile;
use crate::wait::{wait_for_hidden, wait_for_visible, WaitOptions};

/// Outcome of a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStatus {
    /// Modal closed; the account is signed in
    Success,
    /// The site rejected the attempt (or a step could not be performed)
    Failed(String),
    /// Neither the modal closed nor an error appeared within the budget
    Uncertain,
}

impl LoginStatus {
    /// Whether the login can be relied on
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Driver of the storefront login modal
#[derive(Debug)]
pub struct LoginFlow<'a> {
    profile: &'a SiteProfile,
    artifacts_dir: PathBuf,
}

impl<'a> LoginFlow<'a> {
    /// Create a login flow; screenshots land in `artifacts_dir`
    #[must_use]
    pub fn new(profile: &'a SiteProfile, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            profile,
            artifacts_dir: artifacts_dir.into(),
        }
    }

    /// Run the login against the given environment
    pub async fn run<D: StoreDriver>(&self, driver: &D, env: Environment) -> LoginStatus {
        let targets = match self.profile.targets(env) {
            Ok(t) => t,
            Err(e) => return LoginStatus::Failed(e.to_string()),
        };
        info!(site = %self.profile.name, %env, base_url = %targets.base_url, "logging in");

        if let Err(e) = driver.navigate(&targets.base_url).await {
            return LoginStatus::Failed(format!("homepage navigation failed: {e}"));
        }

        let selectors = &self.profile.login;
        let modal_wait = WaitOptions::new().with_timeout(5_000);

        if let Err(e) = driver.click(&selectors.login_icon).await {
            return LoginStatus::Failed(format!("login icon: {e}"));
        }
        if !wait_for_visible(driver, &selectors.dropdown_menu, &modal_wait).await {
            warn!("account dropdown never opened; trying the sign-in button anyway");
        }
        if let Err(e) = driver.click(&selectors.sign_in_button).await {
            return LoginStatus::Failed(format!("sign-in button: {e}"));
        }

        if !wait_for_visible(driver, &selectors.modal, &modal_wait).await {
            return LoginStatus::Failed("login modal never appeared".to_string());
        }
        if let Err(e) = driver
            .fill(&selectors.email_field, &self.profile.credentials.email)
            .await
        {
            return LoginStatus::Failed(format!("email field: {e}"));
        }
        if let Err(e) = driver
            .fill(&selectors.password_field, &self.profile.credentials.password)
            .await
        {
            return LoginStatus::Failed(format!("password field: {e}"));
        }
        if let Err(e) = driver.click(&selectors.submit).await {
            return LoginStatus::Failed(format!("submit: {e}"));
        }

        // give the backend a moment before deciding the outcome
        sleep(Duration::from_millis(2_000)).await;

        let decision_wait = WaitOptions::new().with_timeout(2_000);
        if wait_for_hidden(driver, &selectors.modal, &decision_wait).await {
            info!(site = %self.profile.name, "login successful, modal closed");
            self.capture(driver, env, "success").await;
            return LoginStatus::Success;
        }

        if driver.is_visible(&selectors.error_message).await {
            let error_text = driver
                .text_of(&selectors.error_message)
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!(site = %self.profile.name, %error_text, "login rejected");
            self.capture(driver, env, "error").await;
            return LoginStatus::Failed(error_text);
        }

        warn!(site = %self.profile.name, "uncertain login state");
        self.capture(driver, env, "uncertain").await;
        LoginStatus::Uncertain
    }

    async fn capture<D: StoreDriver>(&self, driver: &D, env: Environment, outcome: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.artifacts_dir) {
            warn!(error = %e, "could not create artifacts directory");
            return;
        }
        let path = self
            .artifacts_dir
            .join(format!("login-{outcome}-{}-{env}.png", self.profile.slug));
        if let Err(e) = driver.screenshot(&path).await {
            warn!(error = %e, "login screenshot failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use crate::sites::singaprinting;

    fn driver_with_login_page(profile: &SiteProfile) -> MockDriver {
        let selectors = &profile.login;
        MockDriver::new()
            .with_element(&selectors.login_icon, MockElement::visible("account"))
            .with_element(&selectors.dropdown_menu, MockElement::visible("menu"))
            .with_element(&selectors.sign_in_button, MockElement::visible("Sign in"))
            .with_element(&selectors.email_field, MockElement::visible(""))
            .with_element(&selectors.password_field, MockElement::visible(""))
            .with_element(&selectors.submit, MockElement::visible("Sign in"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_login_when_modal_closes() {
        let profile = singaprinting();
        let driver = driver_with_login_page(&profile);
        // visible while the form is being filled, closed when checked after submit
        driver.add_element(&profile.login.modal, MockElement::visible("").hide_after(1));

        let dir = tempfile::tempdir().unwrap();
        let flow = LoginFlow::new(&profile, dir.path());
        let status = flow.run(&driver, Environment::Dev).await;
        assert_eq!(status, LoginStatus::Success);
        assert_eq!(driver.fill_value(&profile.login.email_field).unwrap(), profile.credentials.email);
        assert!(driver.was_called("screenshot:"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_error_is_failure_with_site_message() {
        let profile = singaprinting();
        let driver = driver_with_login_page(&profile);
        driver.add_element(&profile.login.modal, MockElement::visible(""));
        driver.add_element(
            &profile.login.error_message,
            MockElement::visible("Invalid email or password"),
        );

        let dir = tempfile::tempdir().unwrap();
        let flow = LoginFlow::new(&profile, dir.path());
        let status = flow.run(&driver, Environment::Dev).await;
        assert_eq!(
            status,
            LoginStatus::Failed("Invalid email or password".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_modal_stuck_without_error_is_uncertain() {
        let profile = singaprinting();
        let driver = driver_with_login_page(&profile);
        driver.add_element(&profile.login.modal, MockElement::visible(""));

        let dir = tempfile::tempdir().unwrap();
        let flow = LoginFlow::new(&profile, dir.path());
        let status = flow.run(&driver, Environment::Dev).await;
        assert_eq!(status, LoginStatus::Uncertain);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_modal_is_failure() {
        let profile = singaprinting();
        let driver = driver_with_login_page(&profile);

        let dir = tempfile::tempdir().unwrap();
        let flow = LoginFlow::new(&profile, dir.path());
        let status = flow.run(&driver, Environment::Dev).await;
        assert!(matches!(status, LoginStatus::Failed(_)));
    }
}
