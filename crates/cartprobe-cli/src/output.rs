//! Human-facing output: spinners and run summaries

use cartprobe::{RunSummary, SectionReport};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::CliConfig;

/// Spinner shown while the browser grinds through combinations
#[must_use]
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message.into());
    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(spinner_style);
    }
    bar.enable_steady_tick(std::time::Duration::from_millis(120));
    bar
}

/// Print the outcome of an ordering run
pub fn print_summary(config: &CliConfig, title: &str, summary: &RunSummary) {
    let tally = summary.tally;
    println!(
        "{} {}  {} match, {} mismatch, {} no-baseline, {} skipped ({} cart additions)",
        style("✓").green().bold(),
        style(title).bold(),
        style(tally.matches).green(),
        style(tally.mismatches).red(),
        style(tally.no_baseline).yellow(),
        style(tally.skipped).yellow(),
        summary.cart_additions,
    );
    if config.verbosity.is_quiet() {
        return;
    }
    if let Some(artifacts) = &summary.artifacts {
        println!("  results: {}", artifacts.workbook.display());
        println!("  sidecar: {}", artifacts.sidecar.display());
    } else {
        println!("  {}", style("no export artifact was produced").red());
    }
}

/// Print content verification reports, one line per section
pub fn print_content_reports(config: &CliConfig, product: &str, reports: &[SectionReport]) {
    let failed = reports.iter().filter(|r| !r.is_passed()).count();
    let marker = if failed == 0 {
        style("✓").green().bold()
    } else {
        style("✗").red().bold()
    };
    println!(
        "{marker} {}  {}/{} sections verified",
        style(product).bold(),
        reports.len() - failed,
        reports.len()
    );
    if config.verbosity.is_quiet() {
        return;
    }
    for report in reports {
        if report.is_passed() {
            println!("  {} {}", style("ok").green(), report.section);
        } else {
            println!(
                "  {} {} — missing: {}",
                style("!!").red(),
                report.section,
                report
                    .missing_texts
                    .iter()
                    .chain(report.missing_images.iter())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        }
    }
}
