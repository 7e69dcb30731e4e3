//! Cartprobe CLI: run storefront ordering and content audits.
//!
//! ```bash
//! cartprobe list
//! cartprobe run --site sg --product button-badges --env dev --cart-limit 25
//! cartprobe content --site osp --fixture fixtures/ozstickerprinting/magnetic_badges_content.json
//! cartprobe check-baseline --file fixtures/singaprinting/baseline_prices.json
//! ```

#![warn(missing_docs)]

mod cli;
mod config;
mod error;

pub mod commands;
pub mod output;

pub use cli::{CheckBaselineArgs, Cli, Commands, ContentArgs, RunArgs};
pub use config::{CliConfig, Verbosity};
pub use error::{CliError, CliResult};
