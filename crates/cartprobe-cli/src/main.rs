//! Cartprobe CLI entry point

use std::process::ExitCode;

use cartprobe_cli::{commands, Cli, CliConfig, CliResult, Commands, Verbosity};
use clap::Parser;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };
    let config = CliConfig::new()
        .with_verbosity(verbosity)
        .with_output_dir(&cli.output_dir);

    match &cli.command {
        Commands::Run(args) => commands::run(&config, args),
        Commands::Content(args) => commands::content(&config, args),
        Commands::List => commands::list(&config),
        Commands::CheckBaseline(args) => commands::check_baseline(&config, args),
    }
}
