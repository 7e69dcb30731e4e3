//! Baseline price table and the post-run comparison pass.
//!
//! The table is loaded once per run from a static JSON fixture:
//!
//! ```json
//! {
//!   "Button Badges": {
//!     "Circle": [
//!       { "width": 32, "height": 32, "5": 4.4, "10": 7.9 }
//!     ]
//!   }
//! }
//! ```
//!
//! Quantity keys sit beside `width`/`height` in each entry, exactly as the
//! pricing team maintains them.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::recorder::{Recorder, ResultRow, RowStatus, DIM_QUANTITY, DIM_SHAPE, DIM_SIZE};
use crate::result::{CartprobeError, CartprobeResult};

/// Default price tolerance in currency units
pub const DEFAULT_TOLERANCE: f64 = 0.5;

/// One size's expected prices by quantity tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineEntry {
    /// Width in the site's size unit (mm)
    pub width: f64,
    /// Height in the site's size unit (mm)
    pub height: f64,
    /// Expected price per quantity key
    #[serde(flatten)]
    pub prices: BTreeMap<String, f64>,
}

impl BaselineEntry {
    /// Expected price for a quantity key
    #[must_use]
    pub fn price_for(&self, quantity: &str) -> Option<f64> {
        self.prices.get(quantity).copied()
    }
}

/// Baseline table: product → shape → size entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable {
    products: BTreeMap<String, BTreeMap<String, Vec<BaselineEntry>>>,
}

impl PriceTable {
    /// Parse a table from JSON text
    pub fn from_json_str(json: &str) -> CartprobeResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CartprobeError::fixture(format!("baseline table: {e}")))
    }

    /// Load a table from a JSON file
    pub fn from_path(path: &Path) -> CartprobeResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CartprobeError::fixture(format!("baseline table {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Shape groups for a product
    #[must_use]
    pub fn product(&self, name: &str) -> Option<&BTreeMap<String, Vec<BaselineEntry>>> {
        self.products.get(name)
    }

    /// Size entries for a product shape; the shape key matches
    /// case-insensitively, as the scraped labels vary in casing
    #[must_use]
    pub fn shape_entries(&self, product: &str, shape: &str) -> Option<&[BaselineEntry]> {
        let shapes = self.product(product)?;
        let wanted = shape.trim().to_lowercase();
        shapes
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(_, entries)| entries.as_slice())
    }

    /// Product names present in the table
    pub fn product_names(&self) -> impl Iterator<Item = &str> {
        self.products.keys().map(String::as_str)
    }
}

/// Normalise a size label (`"32x32mm"`, `"52 x 57 mm"`) into width/height
#[must_use]
pub fn parse_size_label(label: &str) -> Option<(f64, f64)> {
    static SIZE_RE: OnceLock<Regex> = OnceLock::new();
    let re = SIZE_RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // pattern is a literal
        let re = Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*x\s*(\d+(?:\.\d+)?)").unwrap();
        re
    });
    let caps = re.captures(label)?;
    let width = caps.get(1)?.as_str().parse().ok()?;
    let height = caps.get(2)?.as_str().parse().ok()?;
    Some((width, height))
}

/// Extract a numeric price from decorated text (`"S$4.50"` → `4.5`)
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Comparator reconciling observed prices against the baseline table
#[derive(Debug, Clone)]
pub struct Comparator {
    product: String,
    tolerance: f64,
}

impl Comparator {
    /// Create a comparator for a product with the default tolerance
    #[must_use]
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Override the tolerance (currency units)
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// The active tolerance
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Classify one row against the table. Never panics; every missing
    /// piece of data degrades to `NoBaseline`.
    #[must_use]
    pub fn classify(&self, table: &PriceTable, row: &ResultRow) -> RowStatus {
        let Some(shape) = row.combination.get(DIM_SHAPE) else {
            return RowStatus::NoBaseline;
        };
        let Some(size) = row.combination.get(DIM_SIZE) else {
            return RowStatus::NoBaseline;
        };
        let Some(quantity) = row.combination.get(DIM_QUANTITY) else {
            return RowStatus::NoBaseline;
        };
        let Some(actual) = row.observed_price else {
            return RowStatus::NoBaseline;
        };
        let Some(entries) = table.shape_entries(&self.product, shape) else {
            return RowStatus::NoBaseline;
        };
        let Some((width, height)) = parse_size_label(size) else {
            return RowStatus::NoBaseline;
        };
        let Some(entry) = entries
            .iter()
            .find(|e| e.width == width && e.height == height)
        else {
            return RowStatus::NoBaseline;
        };
        let Some(expected) = entry.price_for(quantity) else {
            return RowStatus::NoBaseline;
        };

        if (expected - actual).abs() <= self.tolerance {
            RowStatus::Match
        } else {
            RowStatus::Mismatch { expected, actual }
        }
    }

    /// The comparison pass: total over every pending row. With no table
    /// (missing/malformed fixture) all pending rows become `NoBaseline`;
    /// `Skipped` rows keep their status.
    pub fn apply(&self, table: Option<&PriceTable>, recorder: &mut Recorder) {
        if table.is_none() {
            warn!(product = %self.product, "no baseline table; pending rows default to NoBaseline");
        }
        let mut compared = 0usize;
        for row in recorder.rows_mut() {
            if row.status.is_final() {
                continue;
            }
            row.status = match table {
                Some(t) => self.classify(t, row),
                None => RowStatus::NoBaseline,
            };
            compared += 1;
        }
        info!(product = %self.product, compared, "price comparison complete");
    }
}
