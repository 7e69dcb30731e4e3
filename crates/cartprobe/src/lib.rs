//! Cartprobe: end-to-end audit harness for print storefronts.
//!
//! Drives a real browser through login, product configuration, add-to-cart
//! and artwork upload, records the quoted price for every configuration
//! combination, reconciles the prices against a static baseline table, and
//! always exports a worksheet — even when a run dies halfway.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  ScenarioRunner                                                  │
//! │    login → product page → shape × size × finish × qty × pack     │
//! │      │            │                                              │
//! │      ▼            ▼                                              │
//! │  OverlayGuard  ActionExecutor ──▶ StoreDriver (CDP | mock)       │
//! │      │            │                                              │
//! │      ▼            ▼                                              │
//! │  Recorder ──▶ Comparator (baseline table) ──▶ SheetExporter      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The browser itself is a collaborator: everything above the
//! [`driver::StoreDriver`] seam is deterministic and unit-tested against a
//! scripted [`driver::MockDriver`].

#![warn(missing_docs)]

pub mod action;
pub mod baseline;
#[cfg(feature = "browser")]
pub mod browser;
pub mod config;
pub mod content;
pub mod dismiss;
pub mod driver;
pub mod export;
pub mod locator;
pub mod logging;
pub mod matrix;
pub mod recorder;
pub mod result;
pub mod scenario;
pub mod session;
pub mod sites;
pub mod wait;

pub use action::{ActionExecutor, ActionOutcome, ActionStrategy, RetryPolicy};
pub use baseline::{parse_price, parse_size_label, BaselineEntry, Comparator, PriceTable};
#[cfg(feature = "browser")]
pub use browser::{Browser, BrowserConfig, ChromiumDriver};
pub use config::{Credentials, EnvTargets, Environment, RunLimits};
pub use content::{ContentExpectation, ContentVerifier, SectionReport};
pub use dismiss::{DismissChain, DismissOutcome, DismissStrategy};
pub use driver::{MockDriver, MockElement, StoreDriver};
pub use export::{ExportArtifacts, SheetExporter, SheetRow};
pub use locator::Selector;
pub use logging::init_logging;
pub use matrix::{ConfigMatrix, ConfigOption, Dimension};
pub use recorder::{Combination, Recorder, ResultRow, RowStatus, RowTally};
pub use result::{CartprobeError, CartprobeResult};
pub use scenario::{
    CartSurface, ProductScenario, RunSummary, ScenarioRunner, ShapeSpec, UploadRotation,
};
pub use session::{LoginFlow, LoginStatus};
pub use sites::SiteProfile;
pub use wait::{OverlayGuard, WaitOptions};
