//! Command-line interface definition

use std::path::PathBuf;

use cartprobe::Environment;
use clap::{Args, Parser, Subcommand};

fn parse_environment(s: &str) -> Result<Environment, String> {
    s.parse()
}

/// Storefront ordering and content audits
#[derive(Debug, Parser)]
#[command(name = "cartprobe", version, about)]
pub struct Cli {
    /// Reduce output to summary lines
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Per-attempt logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base directory for export artifacts and screenshots
    #[arg(long, global = true, default_value = "test-results")]
    pub output_dir: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run an ordering audit for one product
    Run(RunArgs),
    /// Verify a product page against an expected-content fixture
    Content(ContentArgs),
    /// List built-in sites and scenarios
    List,
    /// Validate a baseline price table and report its coverage
    CheckBaseline(CheckBaselineArgs),
}

/// Arguments for the `run` command
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Site slug (`sg`, `osp`) or path to a site profile JSON
    #[arg(long)]
    pub site: String,

    /// Product scenario slug (e.g. `button-badges`)
    #[arg(long)]
    pub product: String,

    /// Target deployment (defaults to $CARTPROBE_ENV, then dev)
    #[arg(long, value_parser = parse_environment)]
    pub env: Option<Environment>,

    /// Stop after this many cart additions (defaults to $CARTPROBE_CART_LIMIT)
    #[arg(long)]
    pub cart_limit: Option<u32>,

    /// Record prices without adding anything to the cart
    #[arg(long)]
    pub prices_only: bool,

    /// Run with a visible browser window
    #[arg(long)]
    pub headed: bool,

    /// Baseline price table (defaults to fixtures/<site>/baseline_prices.json)
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    /// Price tolerance in currency units
    #[arg(long, default_value_t = 0.5)]
    pub tolerance: f64,

    /// Chromium binary path (auto-detected when omitted)
    #[arg(long)]
    pub chromium: Option<String>,

    /// Artwork directory for uploads
    #[arg(long, default_value = "Materials")]
    pub uploads: PathBuf,

    /// Number of artwork files to rotate through
    #[arg(long, default_value_t = 10)]
    pub upload_files: u32,
}

/// Arguments for the `content` command
#[derive(Debug, Args)]
pub struct ContentArgs {
    /// Site slug (`sg`, `osp`) or path to a site profile JSON
    #[arg(long)]
    pub site: String,

    /// Expected-content fixture JSON
    #[arg(long)]
    pub fixture: PathBuf,

    /// Target deployment (defaults to $CARTPROBE_ENV, then dev)
    #[arg(long, value_parser = parse_environment)]
    pub env: Option<Environment>,

    /// Run with a visible browser window
    #[arg(long)]
    pub headed: bool,

    /// Chromium binary path (auto-detected when omitted)
    #[arg(long)]
    pub chromium: Option<String>,
}

/// Arguments for the `check-baseline` command
#[derive(Debug, Args)]
pub struct CheckBaselineArgs {
    /// Baseline price table to validate
    #[arg(long)]
    pub file: PathBuf,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::parse_from([
            "cartprobe",
            "run",
            "--site",
            "sg",
            "--product",
            "button-badges",
            "--env",
            "live",
            "--cart-limit",
            "25",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.site, "sg");
        assert_eq!(args.env, Some(Environment::Live));
        assert_eq!(args.cart_limit, Some(25));
        assert_eq!(args.tolerance, 0.5);
        assert!(!args.prices_only);
    }

    #[test]
    fn test_parse_check_baseline() {
        let cli = Cli::parse_from(["cartprobe", "check-baseline", "--file", "prices.json"]);
        assert!(matches!(cli.command, Commands::CheckBaseline(_)));
    }

    #[test]
    fn test_bad_environment_rejected() {
        let result = Cli::try_parse_from([
            "cartprobe",
            "run",
            "--site",
            "sg",
            "--product",
            "button-badges",
            "--env",
            "staging",
        ]);
        assert!(result.is_err());
    }
}
