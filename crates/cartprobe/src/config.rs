//! Run configuration: target environment, credentials, limits.
//!
//! The deployment target is picked by `CARTPROBE_ENV` (the CLI flag wins
//! when given), credentials can be overridden per run via
//! `CARTPROBE_EMAIL`/`CARTPROBE_PASSWORD`, and `CARTPROBE_CART_LIMIT` caps
//! how many cart additions a long ordering run performs before stopping.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable selecting the deployment target
pub const ENV_VAR: &str = "CARTPROBE_ENV";
/// Environment variable overriding the login email
pub const EMAIL_VAR: &str = "CARTPROBE_EMAIL";
/// Environment variable overriding the login password
pub const PASSWORD_VAR: &str = "CARTPROBE_PASSWORD";
/// Environment variable capping cart additions per run
pub const CART_LIMIT_VAR: &str = "CARTPROBE_CART_LIMIT";

/// Target deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development deployment
    #[default]
    Dev,
    /// Production deployment
    Live,
}

impl Environment {
    /// Lowercase name, as used in folder names and env values
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Live => "live",
        }
    }

    /// Read the target environment from `CARTPROBE_ENV`, defaulting to dev
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(ENV_VAR) {
            Ok(value) => value.parse().unwrap_or_else(|_| {
                warn!(%value, "unrecognised {ENV_VAR}; falling back to dev");
                Self::Dev
            }),
            Err(_) => Self::Dev,
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "live" | "prod" | "production" => Ok(Self::Live),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// URLs for one deployment of a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvTargets {
    /// Base URL, with trailing slash
    pub base_url: String,
    /// Product-slug overrides for deployments where paths differ
    #[serde(default)]
    pub products: BTreeMap<String, String>,
}

impl EnvTargets {
    /// Create targets for a base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            products: BTreeMap::new(),
        }
    }

    /// Register a full product URL for a slug (builder form)
    #[must_use]
    pub fn with_product(mut self, slug: impl Into<String>, url: impl Into<String>) -> Self {
        self.products.insert(slug.into(), url.into());
        self
    }

    /// Resolve a product URL: per-slug override first, else base + path
    #[must_use]
    pub fn product_url(&self, slug: &str, path: &str) -> String {
        self.products
            .get(slug)
            .cloned()
            .unwrap_or_else(|| format!("{}{}", self.base_url, path))
    }
}

/// Account credentials for the storefront login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email
    pub email: String,
    /// Login password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Apply `CARTPROBE_EMAIL`/`CARTPROBE_PASSWORD` overrides when set
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(email) = std::env::var(EMAIL_VAR) {
            self.email = email;
        }
        if let Ok(password) = std::env::var(PASSWORD_VAR) {
            self.password = password;
        }
        self
    }
}

/// Caps applied to a long ordering run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunLimits {
    /// Stop after this many successful cart additions
    pub cart_limit: Option<u32>,
}

impl RunLimits {
    /// No limits
    #[must_use]
    pub const fn none() -> Self {
        Self { cart_limit: None }
    }

    /// Read limits from `CARTPROBE_CART_LIMIT`
    #[must_use]
    pub fn from_env() -> Self {
        let cart_limit = std::env::var(CART_LIMIT_VAR)
            .ok()
            .and_then(|v| v.parse().ok());
        Self { cart_limit }
    }

    /// Set the cart cap
    #[must_use]
    pub const fn with_cart_limit(mut self, limit: u32) -> Self {
        self.cart_limit = Some(limit);
        self
    }

    /// Whether `cart_count` has reached the cap
    #[must_use]
    pub fn cart_limit_reached(&self, cart_count: u32) -> bool {
        self.cart_limit.is_some_and(|limit| cart_count >= limit)
    }
}
