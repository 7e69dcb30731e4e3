//! Storefront profiles: per-site selector tables, environments, scenarios.
//!
//! Both audited storefronts run the same commerce platform, so their header
//! and product-page locators are positional XPath twins; only URLs, branding
//! and product catalogues differ. Profiles can also be loaded from JSON for
//! out-of-tree sites.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{Credentials, EnvTargets, Environment};
use crate::locator::Selector;
use crate::matrix::ConfigOption;
use crate::result::{CartprobeError, CartprobeResult};
use crate::scenario::{CartSurface, ProductScenario, ShapeSpec};

/// Locators for the login flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSelectors {
    /// Account icon in the header
    pub login_icon: Selector,
    /// Dropdown that opens under the account icon
    pub dropdown_menu: Selector,
    /// "Sign in" entry in the dropdown
    pub sign_in_button: Selector,
    /// The login modal container
    pub modal: Selector,
    /// Email input inside the modal
    pub email_field: Selector,
    /// Password input inside the modal
    pub password_field: Selector,
    /// Submit button inside the modal
    pub submit: Selector,
    /// Inline error paragraph inside the modal
    pub error_message: Selector,
}

/// A complete site profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Display name (e.g. `SingaPrinting`)
    pub name: String,
    /// Short slug used in artifact paths (e.g. `sg`)
    pub slug: String,
    /// Deployments by environment
    pub environments: BTreeMap<Environment, EnvTargets>,
    /// Login account
    pub credentials: Credentials,
    /// Login flow locators
    pub login: LoginSelectors,
    /// Known blocking overlays on this site
    pub overlays: Vec<Selector>,
}

impl SiteProfile {
    /// Deployment targets for an environment
    pub fn targets(&self, env: Environment) -> CartprobeResult<&EnvTargets> {
        self.environments.get(&env).ok_or_else(|| {
            CartprobeError::scenario(format!("{} has no {env} deployment configured", self.name))
        })
    }

    /// Load a profile from a JSON file
    pub fn from_json_file(path: &Path) -> CartprobeResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CartprobeError::fixture(format!("site profile {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| CartprobeError::fixture(format!("site profile {}: {e}", path.display())))
    }
}

/// Slugs of the built-in profiles
#[must_use]
pub fn builtin_slugs() -> &'static [&'static str] {
    &["sg", "osp"]
}

/// Built-in profile by slug (`sg`, `osp`)
#[must_use]
pub fn builtin(slug: &str) -> Option<SiteProfile> {
    match slug {
        "sg" => Some(singaprinting()),
        "osp" => Some(ozstickerprinting()),
        _ => None,
    }
}

/// Built-in scenarios for a site, by product slug
#[must_use]
pub fn scenarios_for(site_slug: &str) -> Vec<ProductScenario> {
    match site_slug {
        "sg" | "osp" => vec![button_badges(), custom_magnets()],
        _ => Vec::new(),
    }
}

fn header_login_selectors() -> LoginSelectors {
    LoginSelectors {
        login_icon: Selector::xpath(
            "//*[@id=\"__layout\"]/div/div[1]/header/div[1]/div/div/div[2]/ul/li[2]/div/div/a",
        ),
        dropdown_menu: Selector::xpath(
            "//*[@id=\"__layout\"]/div/div[1]/header/div[1]/div/div/div[2]/ul/li[2]/div/div[2]",
        ),
        sign_in_button: Selector::xpath(
            "//*[@id=\"__layout\"]/div/div[1]/header/div[1]/div/div/div[2]/ul/li[2]/div/div[2]/ul/li[1]/button",
        ),
        modal: Selector::xpath("//*[@id=\"#modal\"]/div/div"),
        email_field: Selector::xpath("//*[@id=\"#modal\"]/div/div/div[2]/div/form/div[1]/div/input"),
        password_field: Selector::xpath(
            "//*[@id=\"#modal\"]/div/div/div[2]/div/form/div[2]/div/input",
        ),
        submit: Selector::xpath("//*[@id=\"#modal\"]/div/div/div[2]/div/form/div[4]/button"),
        error_message: Selector::xpath("//*[@id=\"#modal\"]/div/div/div[2]/div/form/p"),
    }
}

fn platform_overlays() -> Vec<Selector> {
    vec![
        Selector::xpath("//*[@id=\"__layout\"]/div/div[1]/header/div[3]/div"),
        Selector::css(".up_artwork_modal.active"),
        Selector::css(".modal--.active"),
        Selector::css(".modal--up_artwork_modal.active"),
        Selector::css("[class*=\"modal\"] .active"),
    ]
}

/// SingaPrinting profile
#[must_use]
pub fn singaprinting() -> SiteProfile {
    let mut environments = BTreeMap::new();
    environments.insert(
        Environment::Live,
        EnvTargets::new("https://www.singaprinting.com/").with_product(
            "magnetic-badges",
            "https://www.singaprinting.com/badges/magnetic",
        ),
    );
    environments.insert(
        Environment::Dev,
        EnvTargets::new("https://dev-new-product.singaprinting.com/").with_product(
            "magnetic-badges",
            "https://dev-new-product.singaprinting.com/badges/magnetic-badge",
        ),
    );
    SiteProfile {
        name: "SingaPrinting".to_string(),
        slug: "sg".to_string(),
        environments,
        credentials: Credentials::new("qa-bot@printops.example", "change-me").with_env_overrides(),
        login: header_login_selectors(),
        overlays: platform_overlays(),
    }
}

/// OzStickerPrinting profile
#[must_use]
pub fn ozstickerprinting() -> SiteProfile {
    let mut environments = BTreeMap::new();
    environments.insert(
        Environment::Live,
        EnvTargets::new("https://www.ozstickerprinting.com/"),
    );
    environments.insert(
        Environment::Dev,
        EnvTargets::new("https://dev-new-product.ozstickerprinting.com/"),
    );
    SiteProfile {
        name: "OzStickerPrinting".to_string(),
        slug: "osp".to_string(),
        environments,
        credentials: Credentials::new("qa-bot@printops.example", "change-me").with_env_overrides(),
        login: header_login_selectors(),
        overlays: platform_overlays(),
    }
}

// Product-details aside sections are positional; section 2 holds shapes,
// 3 sizes, 4 finishings (badges) or quantities (magnets), and so on.
fn aside(section: usize, rest: &str) -> Selector {
    Selector::xpath(format!(
        "//*[@id=\"product_details\"]/div[1]/aside/div[1]/section[{section}]{rest}"
    ))
}

fn shape_option(label: &str, index: usize) -> ConfigOption {
    ConfigOption::new(label, aside(2, &format!("/div/div[1]/ul/li[{index}]")))
}

fn size_option(label: &str, index: usize) -> ConfigOption {
    ConfigOption::new(label, aside(3, &format!("/div/div/ul/li[{index}]")))
}

fn cart_surface() -> CartSurface {
    CartSurface {
        add_to_cart: Selector::xpath(
            "//*[@id=\"product_details\"]/div[1]/aside/div[3]/div[2]/button[1]",
        ),
        upload_modal: Selector::xpath("//*[@id=\"__layout\"]/div/div[1]/header/div[3]/div"),
        // file input must stay CSS: CDP resolves it to a node for the upload
        artwork_input: Selector::css("#artwork_input_file"),
        special_instruction: Selector::xpath(
            "//*[@id=\"__layout\"]/div/div[1]/header/div[3]/div/div[2]/div[1]/textarea",
        ),
        continue_button: Selector::xpath(
            "//*[@id=\"__layout\"]/div/div[1]/header/div[3]/div/div[2]/div[2]/div/button",
        ),
        cart_modal: Selector::xpath(
            "//*[@id=\"__layout\"]/div/div[1]/header/div[1]/div/div/div[2]/ul/li[3]/div",
        ),
        cart_close: Selector::xpath(
            "//*[@id=\"__layout\"]/div/div[1]/header/div[1]/div/div/div[2]/ul/li[3]/div/a",
        ),
    }
}

/// Button Badges ordering scenario.
///
/// Circle carries the full size ladder and gloss only; Square and Heart are
/// single-size and take both finishes.
#[must_use]
pub fn button_badges() -> ProductScenario {
    let gloss = ConfigOption::new("Gloss", aside(4, "/div/div[1]/ul/li[1]"));
    let matte = ConfigOption::new("Matte", aside(4, "/div/div[1]/ul/li[2]"));

    let circle_sizes = vec![
        size_option("32x32mm", 1),
        size_option("44x44mm", 2),
        size_option("58x58mm", 3),
        size_option("75x75mm", 4),
    ];

    let shapes = vec![
        ShapeSpec {
            option: shape_option("Circle", 1),
            sizes: circle_sizes,
            finishes: vec![gloss.clone()],
        },
        ShapeSpec {
            option: shape_option("Square", 2),
            sizes: vec![size_option("37x37mm", 1)],
            finishes: vec![gloss.clone(), matte.clone()],
        },
        ShapeSpec {
            option: shape_option("Heart", 3),
            sizes: vec![size_option("52x57mm", 1)],
            finishes: vec![gloss, matte],
        },
    ];

    let quantity = |label: &str, rest: &str| {
        ConfigOption::new(label, aside(5, &format!("/div[2]/div[1]/ul{rest}")))
    };
    let quantities = vec![
        quantity("5", "/li[1]"),
        quantity("10", "/li[2]"),
        quantity("20", "/ul/li[1]"),
        quantity("30", "/ul/li[2]"),
        quantity("50", "/ul/li[3]"),
        quantity("100", "/ul/li[4]"),
        quantity("200", "/ul/li[5]"),
        quantity("300", "/ul/li[6]"),
        quantity("500", "/ul/li[7]"),
        quantity("1000", "/ul/li[8]"),
    ];

    let packaging = vec![
        ConfigOption::new("No", aside(6, "/div/div[1]/ul/li[1]")),
        ConfigOption::new("Yes", aside(6, "/div/div[1]/ul/li[2]")),
    ];

    ProductScenario {
        name: "Button Badges".to_string(),
        slug: "button-badges".to_string(),
        product_path: "badges/button-badge?featured=1".to_string(),
        product_ready: Selector::css("#product_details"),
        shapes,
        quantities,
        packaging: Some(packaging),
        see_more: Some(Selector::xpath(
            "//*[@id=\"product_details\"]/div[1]/aside/div[1]/section[5]//li[contains(@class,\"see_more\")] \
             | //*[@id=\"product_details\"]/div[1]/aside/div[1]/section[5]//a[contains(text(),\"See More\")]",
        )),
        price: Selector::xpath("//*[@id=\"product_details\"]/div[1]/aside/div[3]/div[1]/h2"),
        cart: cart_surface(),
        settle_ms: 800,
    }
}

/// Custom Magnets ordering scenario.
///
/// Quantities live in section 4 (no finishing section) and are matched by
/// text rather than position; the tiers overlap textually, hence the
/// exclusion predicates.
#[must_use]
pub fn custom_magnets() -> ProductScenario {
    let circle_sizes = vec![
        size_option("30x30mm", 1),
        size_option("35x35mm", 2),
        size_option("40x40mm", 3),
        size_option("45x45mm", 4),
        size_option("50x50mm", 5),
        size_option("55x55mm", 6),
    ];

    let shapes = vec![
        ShapeSpec {
            option: shape_option("Circle", 1),
            sizes: circle_sizes,
            finishes: Vec::new(),
        },
        ShapeSpec {
            option: shape_option("Rectangle", 2),
            sizes: vec![size_option("54x90mm", 1)],
            finishes: Vec::new(),
        },
        ShapeSpec {
            option: shape_option("Custom", 3),
            sizes: vec![size_option("50x50mm", 1)],
            finishes: Vec::new(),
        },
    ];

    let tier = |label: &str, predicate: &str| {
        ConfigOption::new(
            label,
            Selector::xpath(format!(
                "//*[@id=\"product_details\"]/div[1]/aside/div[1]/section[4]//li[{predicate}]"
            )),
        )
    };
    let quantities = vec![
        tier("50", "contains(text(), \"50\") and not(contains(text(), \"500\")) and not(contains(text(), \"5000\"))"),
        tier("100", "contains(text(), \"100\") and not(contains(text(), \"1000\"))"),
        tier("200", "contains(text(), \"200\") and not(contains(text(), \"2000\"))"),
        tier("300", "text()=\"300\" or starts-with(normalize-space(text()), \"300\")"),
        tier("500", "contains(text(), \"500\") and not(contains(text(), \"5000\"))"),
        tier("1000", "text()=\"1000\" or starts-with(normalize-space(text()), \"1000\")"),
        tier("2000", "text()=\"2000\" or starts-with(normalize-space(text()), \"2000\")"),
        tier("5000", "text()=\"5000\" or starts-with(normalize-space(text()), \"5000\")"),
    ];

    ProductScenario {
        name: "Custom Magnets".to_string(),
        slug: "custom-magnets".to_string(),
        product_path: "magnets/custom-magnet?featured=1".to_string(),
        product_ready: Selector::css("#product_details"),
        shapes,
        quantities,
        packaging: None,
        see_more: None,
        price: Selector::xpath("//*[@id=\"product_details\"]/div[1]/aside/div[3]/div[1]/h2"),
        cart: cart_surface(),
        settle_ms: 800,
    }
}
