//! Ordering scenario: drive a product page through every configuration
//! combination, capture the quoted price, add to cart, and always export.
//!
//! The loop is strictly sequential. Transient flakiness is absorbed by the
//! action executor; a combination that fails irrecoverably is recorded
//! `Skipped` and never retried; only login or a dead product page abort the
//! run — and even then the comparison pass and export still happen over
//! whatever was recorded.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::action::{ActionExecutor, RetryPolicy};
use crate::baseline::{parse_price, Comparator, PriceTable, DEFAULT_TOLERANCE};
use crate::config::{Environment, RunLimits};
use crate::dismiss::DismissChain;
use crate::driver::StoreDriver;
use crate::export::{ExportArtifacts, SheetExporter, SheetRow};
use crate::locator::Selector;
use crate::matrix::{ConfigMatrix, ConfigOption, Dimension, Selection};
use crate::recorder::{
    Combination, Recorder, RowTally, DIM_FINISHING, DIM_PACKAGING, DIM_QUANTITY, DIM_SHAPE,
    DIM_SIZE,
};
use crate::result::{CartprobeError, CartprobeResult};
use crate::session::{LoginFlow, LoginStatus};
use crate::sites::SiteProfile;
use crate::wait::{wait_for_visible, OverlayGuard, WaitOptions};

/// Locators for the add-to-cart / artwork-upload surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSurface {
    /// Add-to-cart button on the product page
    pub add_to_cart: Selector,
    /// Artwork upload modal that opens after add-to-cart
    pub upload_modal: Selector,
    /// File input inside the upload modal
    pub artwork_input: Selector,
    /// Special-instructions textarea inside the upload modal
    pub special_instruction: Selector,
    /// Continue button inside the upload modal
    pub continue_button: Selector,
    /// Cart confirmation modal
    pub cart_modal: Selector,
    /// Close control of the cart confirmation modal
    pub cart_close: Selector,
}

/// One shape and the size/finish subtree it unlocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeSpec {
    /// The shape tile itself
    pub option: ConfigOption,
    /// Sizes available for this shape
    pub sizes: Vec<ConfigOption>,
    /// Finishes available for this shape (empty = no finishing dimension)
    pub finishes: Vec<ConfigOption>,
}

/// Everything needed to exercise one product end to end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductScenario {
    /// Product name; also the baseline table key (e.g. `Button Badges`)
    pub name: String,
    /// Product slug used in URLs and artifact paths
    pub slug: String,
    /// Path of the product page relative to the site base URL
    pub product_path: String,
    /// Element whose visibility marks the product page as ready
    pub product_ready: Selector,
    /// Shapes with their dependent sizes and finishes
    pub shapes: Vec<ShapeSpec>,
    /// Quantity tiers, shared across shapes
    pub quantities: Vec<ConfigOption>,
    /// Individual-packaging options, when the product has them
    pub packaging: Option<Vec<ConfigOption>>,
    /// "See more" expander hiding the higher quantity tiers
    pub see_more: Option<Selector>,
    /// Quoted price element
    pub price: Selector,
    /// Add-to-cart / upload surface
    pub cart: CartSurface,
    /// Settle time between interactions
    pub settle_ms: u64,
}

impl ProductScenario {
    /// Matrix of the dimensions below one shape (size × finish × quantity ×
    /// packaging); empty dimensions are omitted rather than zeroing the
    /// product
    #[must_use]
    pub fn matrix_for(&self, shape: &ShapeSpec) -> ConfigMatrix {
        let mut dimensions = Vec::new();
        if !shape.sizes.is_empty() {
            dimensions.push(Dimension::new(DIM_SIZE, shape.sizes.clone()));
        }
        if !shape.finishes.is_empty() {
            dimensions.push(Dimension::new(DIM_FINISHING, shape.finishes.clone()));
        }
        dimensions.push(Dimension::new(DIM_QUANTITY, self.quantities.clone()));
        if let Some(packaging) = &self.packaging {
            dimensions.push(Dimension::new(DIM_PACKAGING, packaging.clone()));
        }
        ConfigMatrix::new(dimensions)
    }

    /// Total combinations across all shapes
    #[must_use]
    pub fn combination_count(&self) -> usize {
        self.shapes
            .iter()
            .map(|s| self.matrix_for(s).combination_count())
            .sum()
    }

    /// Worksheet/file name (`Button Badges` → `ButtonBadges`)
    #[must_use]
    pub fn sheet_name(&self) -> String {
        self.name.replace(' ', "")
    }
}

/// Explicit rotating index over the artwork files in the upload directory.
/// Threaded through the loop; there is no shared counter.
#[derive(Debug, Clone)]
pub struct UploadRotation {
    dir: PathBuf,
    next: u32,
    max: u32,
}

impl UploadRotation {
    /// Rotate over `1.png ..= max.png` inside `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, max: u32) -> Self {
        Self {
            dir: dir.into(),
            next: 1,
            max: max.max(1),
        }
    }

    /// The index the next upload will use
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.next
    }

    /// Path for this upload, advancing the rotation
    pub fn advance(&mut self) -> PathBuf {
        let path = self.dir.join(format!("{}.png", self.next));
        self.next = if self.next >= self.max { 1 } else { self.next + 1 };
        path
    }
}

/// Summary of one completed (or capped) run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Unique run identifier
    pub run_id: String,
    /// Status tally over all recorded rows
    pub tally: RowTally,
    /// Successful cart additions
    pub cart_additions: u32,
    /// Export artifacts, when the export succeeded
    pub artifacts: Option<ExportArtifacts>,
}

/// Driver of one product scenario against one site deployment
#[derive(Debug)]
pub struct ScenarioRunner<'a, D: StoreDriver> {
    driver: &'a D,
    profile: &'a SiteProfile,
    scenario: &'a ProductScenario,
    env: Environment,
    policy: RetryPolicy,
    limits: RunLimits,
    tolerance: f64,
    place_orders: bool,
    export_base: PathBuf,
    artifacts_dir: PathBuf,
    upload_dir: PathBuf,
    upload_files: u32,
}

impl<'a, D: StoreDriver> ScenarioRunner<'a, D> {
    /// Create a runner with defaults
    #[must_use]
    pub fn new(
        driver: &'a D,
        profile: &'a SiteProfile,
        scenario: &'a ProductScenario,
        env: Environment,
    ) -> Self {
        Self {
            driver,
            profile,
            scenario,
            env,
            policy: RetryPolicy::default(),
            limits: RunLimits::none(),
            tolerance: DEFAULT_TOLERANCE,
            place_orders: true,
            export_base: PathBuf::from("test-results"),
            artifacts_dir: PathBuf::from("test-results/screenshots"),
            upload_dir: PathBuf::from("Materials"),
            upload_files: 10,
        }
    }

    /// Override the retry policy
    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Apply run limits (cart cap)
    #[must_use]
    pub const fn with_limits(mut self, limits: RunLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Override the price tolerance
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Price sweep only: never add to cart
    #[must_use]
    pub const fn prices_only(mut self) -> Self {
        self.place_orders = false;
        self
    }

    /// Where export artifacts go
    #[must_use]
    pub fn with_export_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.export_base = base.into();
        self
    }

    /// Where screenshots go
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    /// Artwork source directory and rotation size
    #[must_use]
    pub fn with_upload_source(mut self, dir: impl Into<PathBuf>, files: u32) -> Self {
        self.upload_dir = dir.into();
        self.upload_files = files;
        self
    }

    /// Run the scenario. The comparison pass and the export run regardless
    /// of how the iteration ended; a fatal setup failure is returned after
    /// the partial results have been written out.
    pub async fn run(&self, baseline: Option<&PriceTable>) -> CartprobeResult<RunSummary> {
        let run_id = uuid::Uuid::new_v4().to_string();
        info!(
            %run_id,
            site = %self.profile.name,
            scenario = %self.scenario.name,
            env = %self.env,
            combinations = self.scenario.combination_count(),
            "starting ordering audit"
        );

        let mut recorder = Recorder::new();
        let mut cart_additions = 0u32;
        let outcome = self.drive(&mut recorder, &mut cart_additions).await;
        if let Err(e) = &outcome {
            error!(error = %e, "run aborted; exporting partial results");
        }

        Comparator::new(&self.scenario.name)
            .with_tolerance(self.tolerance)
            .apply(baseline, &mut recorder);

        let rows: Vec<SheetRow> = recorder.rows().iter().map(SheetRow::from).collect();
        let out_dir = SheetExporter::artifact_dir(&self.export_base, &self.profile.slug, self.env);
        let artifacts = match SheetExporter::new(out_dir, self.scenario.sheet_name()).export(&rows)
        {
            Ok(artifacts) => Some(artifacts),
            Err(e) => {
                error!(error = %e, "export failed");
                None
            }
        };

        outcome?;

        let tally = recorder.tally();
        info!(
            %run_id,
            rows = recorder.len(),
            matches = tally.matches,
            mismatches = tally.mismatches,
            skipped = tally.skipped,
            cart_additions,
            "run complete"
        );
        Ok(RunSummary {
            run_id,
            tally,
            cart_additions,
            artifacts,
        })
    }

    async fn drive(
        &self,
        recorder: &mut Recorder,
        cart_additions: &mut u32,
    ) -> CartprobeResult<()> {
        let login = LoginFlow::new(self.profile, &self.artifacts_dir);
        match login.run(self.driver, self.env).await {
            LoginStatus::Success => {}
            LoginStatus::Failed(reason) => {
                return Err(CartprobeError::Login { message: reason });
            }
            LoginStatus::Uncertain => {
                return Err(CartprobeError::Login {
                    message: "uncertain login state".to_string(),
                });
            }
        }

        let targets = self.profile.targets(self.env)?;
        let product_url = targets.product_url(&self.scenario.slug, &self.scenario.product_path);
        self.driver.navigate(&product_url).await?;
        let ready_wait = WaitOptions::new().with_timeout(15_000);
        if !wait_for_visible(self.driver, &self.scenario.product_ready, &ready_wait).await {
            return Err(CartprobeError::scenario(format!(
                "product page never became ready at {product_url}"
            )));
        }
        info!(%product_url, "product page loaded");

        let guard = OverlayGuard::new(self.profile.overlays.clone());
        let executor = ActionExecutor::new(self.driver)
            .with_policy(self.policy)
            .with_guard(&guard);
        let chain = DismissChain::standard(
            self.scenario.cart.cart_modal.clone(),
            self.scenario.cart.cart_close.clone(),
            product_url,
        );
        let mut rotation = UploadRotation::new(&self.upload_dir, self.upload_files);

        'shapes: for shape in &self.scenario.shapes {
            let shape_label = format!("{DIM_SHAPE}: {}", shape.option.label);
            if !executor
                .click(&shape.option.selector, &shape_label)
                .await
                .is_applied()
            {
                warn!(shape = %shape.option.label, "shape never became clickable; skipping its subtree");
                for selection in self.scenario.matrix_for(shape).combinations() {
                    recorder.record_skipped(
                        self.combination_for(shape, &selection),
                        "shape tile never became clickable",
                    );
                }
                continue;
            }
            self.settle().await;

            let matrix = self.scenario.matrix_for(shape);
            let mut last_labels: Vec<Option<String>> = vec![None; matrix.dimensions().len()];
            for selection in matrix.combinations() {
                if self.limits.cart_limit_reached(*cart_additions) {
                    info!(cart_additions = *cart_additions, "cart limit reached; stopping early");
                    break 'shapes;
                }
                let combination = self.combination_for(shape, &selection);

                if let Err(reason) = self
                    .select_options(&executor, &selection, &mut last_labels)
                    .await
                {
                    recorder.record_skipped(combination, reason);
                    continue;
                }
                self.settle().await;

                let price_text = self
                    .driver
                    .text_of(&self.scenario.price)
                    .await
                    .unwrap_or_default();
                let price = parse_price(&price_text);
                if price.is_none() {
                    warn!(%combination, %price_text, "no parseable price");
                }

                if self.place_orders {
                    match self
                        .add_to_cart(&executor, &chain, &mut rotation, &combination, &price_text)
                        .await
                    {
                        Ok(()) => {
                            recorder.record_observed(combination, price, price_text);
                            *cart_additions += 1;
                        }
                        Err(reason) => {
                            warn!(%reason, "combination abandoned");
                            recorder.record_skipped(combination, reason);
                        }
                    }
                } else {
                    recorder.record_observed(combination, price, price_text);
                }
            }
        }
        Ok(())
    }

    async fn select_options(
        &self,
        executor: &ActionExecutor<'_, D>,
        selection: &Selection<'_>,
        last_labels: &mut [Option<String>],
    ) -> Result<(), String> {
        for (idx, (dimension, option)) in selection.pairs().iter().enumerate() {
            // options sticky from the previous combination stay selected
            if last_labels[idx].as_deref() == Some(option.label.as_str()) {
                continue;
            }
            if *dimension == DIM_QUANTITY {
                self.expand_quantity_tiers(option).await;
            }
            let label = format!("{dimension}: {}", option.label);
            if executor.click(&option.selector, &label).await.is_applied() {
                last_labels[idx] = Some(option.label.clone());
                self.settle().await;
            } else {
                last_labels[idx] = None;
                return Err(format!(
                    "{dimension} option '{}' never became clickable",
                    option.label
                ));
            }
        }
        Ok(())
    }

    async fn expand_quantity_tiers(&self, option: &ConfigOption) {
        let Some(see_more) = &self.scenario.see_more else {
            return;
        };
        if self.driver.is_visible(&option.selector).await {
            return;
        }
        if self.driver.is_visible(see_more).await {
            match self.driver.click(see_more).await {
                Ok(()) => self.settle().await,
                Err(e) => warn!(error = %e, "see-more expander click failed"),
            }
        }
    }

    async fn add_to_cart(
        &self,
        executor: &ActionExecutor<'_, D>,
        chain: &DismissChain,
        rotation: &mut UploadRotation,
        combination: &Combination,
        price_text: &str,
    ) -> Result<(), String> {
        let cart = &self.scenario.cart;
        if !executor
            .click(&cart.add_to_cart, "Add to Cart")
            .await
            .is_applied()
        {
            return Err("add-to-cart button never became clickable".to_string());
        }

        let modal_wait = WaitOptions::new().with_timeout(5_000);
        if !wait_for_visible(self.driver, &cart.upload_modal, &modal_wait).await {
            return Err("upload modal never appeared".to_string());
        }

        let artwork = rotation.advance();
        if let Err(e) = self
            .driver
            .set_input_files(&cart.artwork_input, std::slice::from_ref(&artwork))
            .await
        {
            return Err(format!("artwork upload failed: {e}"));
        }

        let note = format!("{combination} / Price: {price_text}");
        // missing instructions never sink the combination
        let _ = executor
            .fill(&cart.special_instruction, &note, "Special instructions")
            .await;

        if !executor
            .click(&cart.continue_button, "Continue")
            .await
            .is_applied()
        {
            return Err("continue button never became clickable".to_string());
        }
        self.settle().await;

        if !chain.dismiss(self.driver).await.is_clear() {
            self.capture(&format!("cart-modal-stuck-{}", rotation.current()))
                .await;
            return Err("cart modal could not be dismissed".to_string());
        }
        Ok(())
    }

    fn combination_for(&self, shape: &ShapeSpec, selection: &Selection<'_>) -> Combination {
        let mut combination = Combination::new().with(DIM_SHAPE, &shape.option.label);
        for (dimension, option) in selection.pairs() {
            combination.push(*dimension, option.label.clone());
        }
        combination
    }

    async fn settle(&self) {
        sleep(Duration::from_millis(self.scenario.settle_ms)).await;
    }

    async fn capture(&self, stem: &str) {
        if std::fs::create_dir_all(&self.artifacts_dir).is_err() {
            return;
        }
        let path = self.artifacts_dir.join(format!("{stem}.png"));
        if let Err(e) = self.driver.screenshot(&path).await {
            warn!(error = %e, "screenshot failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::baseline::PriceTable;
    use crate::config::{Credentials, EnvTargets};
    use crate::driver::{MockDriver, MockElement};
    use crate::recorder::RowStatus;
    use crate::sites::LoginSelectors;
    use std::collections::BTreeMap;

    fn sel(s: &str) -> Selector {
        Selector::css(s)
    }

    fn mini_profile() -> SiteProfile {
        let mut environments = BTreeMap::new();
        environments.insert(Environment::Dev, EnvTargets::new("https://shop.test/"));
        SiteProfile {
            name: "TestShop".to_string(),
            slug: "ts".to_string(),
            environments,
            credentials: Credentials::new("qa@shop.test", "secret"),
            login: LoginSelectors {
                login_icon: sel("#login-icon"),
                dropdown_menu: sel("#dropdown"),
                sign_in_button: sel("#sign-in"),
                modal: sel("#login-modal"),
                email_field: sel("#email"),
                password_field: sel("#password"),
                submit: sel("#submit"),
                error_message: sel("#login-error"),
            },
            overlays: Vec::new(),
        }
    }

    fn mini_scenario() -> ProductScenario {
        ProductScenario {
            name: "Test Product".to_string(),
            slug: "test-product".to_string(),
            product_path: "products/test?featured=1".to_string(),
            product_ready: sel("#product_details"),
            shapes: vec![ShapeSpec {
                option: ConfigOption::new("Circle", sel("#shape-circle")),
                sizes: vec![ConfigOption::new("32x32mm", sel("#size-32"))],
                finishes: Vec::new(),
            }],
            quantities: vec![
                ConfigOption::new("5", sel("#qty-5")),
                ConfigOption::new("10", sel("#qty-10")),
            ],
            packaging: None,
            see_more: None,
            price: sel("#price"),
            cart: CartSurface {
                add_to_cart: sel("#add"),
                upload_modal: sel("#upload-modal"),
                artwork_input: sel("#artwork"),
                special_instruction: sel("#note"),
                continue_button: sel("#continue"),
                cart_modal: sel("#cart-modal"),
                cart_close: sel("#cart-close"),
            },
            settle_ms: 10,
        }
    }

    fn full_page_driver(profile: &SiteProfile, scenario: &ProductScenario) -> MockDriver {
        let driver = MockDriver::new()
            .with_element(&profile.login.login_icon, MockElement::visible("account"))
            .with_element(&profile.login.dropdown_menu, MockElement::visible("menu"))
            .with_element(&profile.login.sign_in_button, MockElement::visible("Sign in"))
            .with_element(&profile.login.email_field, MockElement::visible(""))
            .with_element(&profile.login.password_field, MockElement::visible(""))
            .with_element(&profile.login.submit, MockElement::visible("Sign in"))
            .with_element(&profile.login.modal, MockElement::visible("").hide_after(1))
            .with_element(&scenario.product_ready, MockElement::visible("details"))
            .with_element(&scenario.price, MockElement::visible("S$4.50"));
        for shape in &scenario.shapes {
            driver.add_element(&shape.option.selector, MockElement::visible(&shape.option.label));
            for size in &shape.sizes {
                driver.add_element(&size.selector, MockElement::visible(&size.label));
            }
        }
        for qty in &scenario.quantities {
            driver.add_element(&qty.selector, MockElement::visible(&qty.label));
        }
        let cart = &scenario.cart;
        driver.add_element(&cart.add_to_cart, MockElement::visible("Add to Cart"));
        driver.add_element(&cart.upload_modal, MockElement::visible("upload"));
        driver.add_element(&cart.artwork_input, MockElement::visible(""));
        driver.add_element(&cart.special_instruction, MockElement::visible(""));
        driver.add_element(&cart.continue_button, MockElement::visible("Continue"));
        // the cart confirmation modal never shows up in the mock: dismissal
        // is trivially clear
        driver
    }

    fn baseline() -> PriceTable {
        PriceTable::from_json_str(
            r#"{ "Test Product": { "Circle": [ { "width": 32, "height": 32, "5": 4.4 } ] } }"#,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_records_compares_and_exports() {
        let profile = mini_profile();
        let scenario = mini_scenario();
        let driver = full_page_driver(&profile, &scenario);
        let dir = tempfile::tempdir().unwrap();

        let runner = ScenarioRunner::new(&driver, &profile, &scenario, Environment::Dev)
            .with_export_base(dir.path().join("results"))
            .with_artifacts_dir(dir.path().join("shots"))
            .with_policy(RetryPolicy::new().with_visibility_timeout(200));
        let summary = runner.run(Some(&baseline())).await.unwrap();

        assert_eq!(summary.cart_additions, 2);
        assert_eq!(summary.tally.matches, 1); // qty 5: 4.50 vs 4.40
        assert_eq!(summary.tally.no_baseline, 1); // qty 10 has no entry
        assert_eq!(summary.tally.pending, 0);
        assert_eq!(driver.calls_matching("upload:"), 2);

        let artifacts = summary.artifacts.unwrap();
        assert!(artifacts.workbook.exists());
        let sidecar: Vec<serde_json::Value> =
            serde_json::from_slice(&std::fs::read(&artifacts.sidecar).unwrap()).unwrap();
        assert_eq!(sidecar.len(), 2);
        assert_eq!(sidecar[0]["Quantity"], "5");
        assert_eq!(sidecar[0]["Status"], "Match");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cart_limit_stops_early() {
        let profile = mini_profile();
        let scenario = mini_scenario();
        let driver = full_page_driver(&profile, &scenario);
        let dir = tempfile::tempdir().unwrap();

        let runner = ScenarioRunner::new(&driver, &profile, &scenario, Environment::Dev)
            .with_export_base(dir.path().join("results"))
            .with_artifacts_dir(dir.path().join("shots"))
            .with_limits(RunLimits::none().with_cart_limit(1))
            .with_policy(RetryPolicy::new().with_visibility_timeout(200));
        let summary = runner.run(Some(&baseline())).await.unwrap();

        assert_eq!(summary.cart_additions, 1);
        let tally = summary.tally;
        assert_eq!(
            tally.matches + tally.mismatches + tally.no_baseline + tally.skipped,
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_failure_is_fatal_but_still_exports() {
        let profile = mini_profile();
        let scenario = mini_scenario();
        // no login elements at all: the first click fails
        let driver = MockDriver::new();
        let dir = tempfile::tempdir().unwrap();
        let export_base = dir.path().join("results");

        let runner = ScenarioRunner::new(&driver, &profile, &scenario, Environment::Dev)
            .with_export_base(&export_base)
            .with_artifacts_dir(dir.path().join("shots"));
        let err = runner.run(None).await.unwrap_err();
        assert!(matches!(err, CartprobeError::Login { .. }));

        // the finally-phase export still produced an (empty) artifact
        let out_dir = SheetExporter::artifact_dir(&export_base, "ts", Environment::Dev);
        assert!(out_dir.exists());
        assert!(std::fs::read_dir(out_dir).unwrap().count() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_upload_modal_skips_combinations() {
        let profile = mini_profile();
        let scenario = mini_scenario();
        let driver = full_page_driver(&profile, &scenario);
        driver.remove_element(&scenario.cart.upload_modal);
        let dir = tempfile::tempdir().unwrap();

        let runner = ScenarioRunner::new(&driver, &profile, &scenario, Environment::Dev)
            .with_export_base(dir.path().join("results"))
            .with_artifacts_dir(dir.path().join("shots"))
            .with_policy(RetryPolicy::new().with_visibility_timeout(200).with_base_backoff(10));
        let summary = runner.run(Some(&baseline())).await.unwrap();

        assert_eq!(summary.cart_additions, 0);
        assert_eq!(summary.tally.skipped, 2);
        assert_eq!(summary.tally.pending, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prices_only_never_touches_the_cart() {
        let profile = mini_profile();
        let scenario = mini_scenario();
        let driver = full_page_driver(&profile, &scenario);
        let dir = tempfile::tempdir().unwrap();

        let runner = ScenarioRunner::new(&driver, &profile, &scenario, Environment::Dev)
            .with_export_base(dir.path().join("results"))
            .with_artifacts_dir(dir.path().join("shots"))
            .prices_only()
            .with_policy(RetryPolicy::new().with_visibility_timeout(200));
        let summary = runner.run(Some(&baseline())).await.unwrap();

        assert_eq!(summary.cart_additions, 0);
        assert_eq!(summary.tally.matches, 1);
        assert_eq!(driver.calls_matching("upload:"), 0);
    }

    #[test]
    fn test_upload_rotation_wraps() {
        let mut rotation = UploadRotation::new("Materials", 3);
        assert_eq!(rotation.advance(), PathBuf::from("Materials/1.png"));
        assert_eq!(rotation.advance(), PathBuf::from("Materials/2.png"));
        assert_eq!(rotation.advance(), PathBuf::from("Materials/3.png"));
        assert_eq!(rotation.advance(), PathBuf::from("Materials/1.png"));
    }
}
