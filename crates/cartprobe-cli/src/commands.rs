//! Command handlers

use std::path::{Path, PathBuf};

use cartprobe::{sites, PriceTable, SiteProfile};
use console::style;

use crate::cli::{CheckBaselineArgs, ContentArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Resolve a site argument: built-in slug first, then a profile JSON path
pub fn resolve_site(site: &str) -> CliResult<SiteProfile> {
    if let Some(profile) = sites::builtin(site) {
        return Ok(profile);
    }
    let path = Path::new(site);
    if path.exists() {
        return SiteProfile::from_json_file(path).map_err(CliError::from);
    }
    Err(CliError::invalid_argument(format!(
        "unknown site '{site}' (built-ins: {})",
        sites::builtin_slugs().join(", ")
    )))
}

/// Default baseline fixture location for a site
#[must_use]
pub fn default_baseline_path(profile: &SiteProfile) -> PathBuf {
    PathBuf::from("fixtures")
        .join(profile.name.to_lowercase())
        .join("baseline_prices.json")
}

/// `list`: show built-in sites and their scenarios
pub fn list(_config: &CliConfig) -> CliResult<()> {
    for slug in sites::builtin_slugs() {
        let Some(profile) = sites::builtin(slug) else {
            continue;
        };
        println!("{} ({slug})", style(&profile.name).bold());
        for scenario in sites::scenarios_for(slug) {
            println!(
                "  {}  {} — {} combinations",
                style(&scenario.slug).cyan(),
                scenario.name,
                scenario.combination_count()
            );
        }
    }
    Ok(())
}

/// `check-baseline`: parse the table and report its coverage
pub fn check_baseline(_config: &CliConfig, args: &CheckBaselineArgs) -> CliResult<()> {
    let table = PriceTable::from_path(&args.file)?;
    let mut products = 0usize;
    for name in table.product_names() {
        products += 1;
        let Some(shapes) = table.product(name) else {
            continue;
        };
        let entries: usize = shapes.values().map(Vec::len).sum();
        let tiers: usize = shapes
            .values()
            .flat_map(|entries| entries.iter().map(|e| e.prices.len()))
            .sum();
        println!(
            "{}: {} shape(s), {} size entr(ies), {} price(s)",
            style(name).bold(),
            shapes.len(),
            entries,
            tiers
        );
    }
    if products == 0 {
        return Err(CliError::invalid_argument(format!(
            "{} contains no products",
            args.file.display()
        )));
    }
    println!("{} baseline table is well-formed", style("✓").green());
    Ok(())
}

/// `run`: ordering audit (requires the `browser` feature)
pub fn run(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    #[cfg(feature = "browser")]
    {
        run_impl(config, args)
    }
    #[cfg(not(feature = "browser"))]
    {
        let _ = (config, args);
        Err(CliError::config(
            "browser control not compiled in; rebuild with --features browser",
        ))
    }
}

/// `content`: content audit (requires the `browser` feature)
pub fn content(config: &CliConfig, args: &ContentArgs) -> CliResult<()> {
    #[cfg(feature = "browser")]
    {
        content_impl(config, args)
    }
    #[cfg(not(feature = "browser"))]
    {
        let _ = (config, args);
        Err(CliError::config(
            "browser control not compiled in; rebuild with --features browser",
        ))
    }
}

#[cfg(feature = "browser")]
fn browser_config(headed: bool, chromium: Option<&str>) -> cartprobe::BrowserConfig {
    let mut browser = cartprobe::BrowserConfig::default().with_headless(!headed);
    if let Some(path) = chromium {
        browser = browser.with_chromium_path(path);
    }
    browser
}

#[cfg(feature = "browser")]
fn init_run_logging(config: &CliConfig) {
    let log_dir = PathBuf::from(&config.output_dir).join("logs");
    if let Err(e) = cartprobe::init_logging(config.verbosity.is_verbose(), Some(&log_dir)) {
        eprintln!("logging init failed: {e}");
    }
}

#[cfg(feature = "browser")]
fn run_impl(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    use cartprobe::{Browser, Environment, RunLimits, ScenarioRunner};

    let profile = resolve_site(&args.site)?;
    let scenario = sites::scenarios_for(&profile.slug)
        .into_iter()
        .find(|s| s.slug == args.product)
        .ok_or_else(|| {
            CliError::invalid_argument(format!(
                "no scenario '{}' for {} (available: {})",
                args.product,
                profile.name,
                sites::scenarios_for(&profile.slug)
                    .iter()
                    .map(|s| s.slug.clone())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;
    let env = args.env.unwrap_or_else(Environment::from_env);
    let limits = args
        .cart_limit
        .map_or_else(RunLimits::from_env, |n| RunLimits::none().with_cart_limit(n));

    init_run_logging(config);

    let baseline_path = args
        .baseline
        .clone()
        .unwrap_or_else(|| default_baseline_path(&profile));
    let table = match PriceTable::from_path(&baseline_path) {
        Ok(table) => Some(table),
        Err(e) => {
            eprintln!(
                "{} {e}; all rows will report NoBaseline",
                style("warning:").yellow()
            );
            None
        }
    };

    let output_dir = PathBuf::from(&config.output_dir);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let browser = Browser::launch(browser_config(args.headed, args.chromium.as_deref())).await?;
        let driver = browser.new_driver().await?;

        let progress = crate::output::spinner(format!(
            "{}: {} on {env} ({} combinations)",
            profile.name,
            scenario.name,
            scenario.combination_count()
        ));
        let mut runner = ScenarioRunner::new(&driver, &profile, &scenario, env)
            .with_limits(limits)
            .with_tolerance(args.tolerance)
            .with_export_base(output_dir.clone())
            .with_artifacts_dir(output_dir.join("screenshots"))
            .with_upload_source(&args.uploads, args.upload_files);
        if args.prices_only {
            runner = runner.prices_only();
        }
        let result = runner.run(table.as_ref()).await;
        progress.finish_and_clear();

        if let Err(e) = browser.close().await {
            eprintln!("{} browser shutdown: {e}", style("warning:").yellow());
        }

        let summary = result?;
        crate::output::print_summary(
            config,
            &format!("{} / {}", profile.name, scenario.name),
            &summary,
        );
        Ok(())
    })
}

#[cfg(feature = "browser")]
fn content_impl(config: &CliConfig, args: &ContentArgs) -> CliResult<()> {
    use cartprobe::{Browser, ContentExpectation, ContentVerifier, Environment, SheetExporter};

    let profile = resolve_site(&args.site)?;
    let expectation = ContentExpectation::from_path(&args.fixture)?;
    let env = args.env.unwrap_or_else(Environment::from_env);
    let targets = profile.targets(env)?.clone();

    init_run_logging(config);

    let output_dir = PathBuf::from(&config.output_dir);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let browser = Browser::launch(browser_config(args.headed, args.chromium.as_deref())).await?;
        let driver = browser.new_driver().await?;

        let progress = crate::output::spinner(format!(
            "{}: verifying {} content on {env}",
            profile.name, expectation.product
        ));
        let result = ContentVerifier::new(&expectation)
            .verify(&driver, &targets.base_url)
            .await;
        progress.finish_and_clear();

        if let Err(e) = browser.close().await {
            eprintln!("{} browser shutdown: {e}", style("warning:").yellow());
        }

        let reports = result?;
        let rows: Vec<cartprobe::SheetRow> =
            reports.iter().map(cartprobe::SectionReport::to_sheet_row).collect();
        let out_dir = SheetExporter::artifact_dir(&output_dir, &profile.slug, env);
        let sheet_name = format!("{}Content", expectation.product.replace(' ', ""));
        if let Err(e) = SheetExporter::new(out_dir, sheet_name).export(&rows) {
            eprintln!("{} export failed: {e}", style("warning:").yellow());
        }
        crate::output::print_content_reports(config, &expectation.product, &reports);
        Ok(())
    })
}
