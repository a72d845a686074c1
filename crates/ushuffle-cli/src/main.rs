#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]

use std::io;
use std::process::ExitCode;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;
use ushuffle_core::RandomGroups;
use ushuffle_db::BackendRegistry;

mod cli_args;
mod prompt;
mod report;
mod run;
mod settings;

use crate::cli_args::Cli;
use crate::report::Reporter;
use crate::run::RunPlan;
use crate::settings::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.verbose) {
        eprintln!("ERROR: {err:#}");
        return ExitCode::FAILURE;
    }
    match run_cli(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::from_env();
    settings.apply_cli(&cli);

    let backend = match cli.backend {
        Some(backend) => backend,
        None => prompt::choose_backend(&mut io::stdin().lock(), &mut io::stdout())?,
    };
    let registry = BackendRegistry::from_options(&settings.backend_options());
    let plan = RunPlan {
        backend,
        strategy: cli.strategy,
        db_name: settings.db_name.clone(),
        schema: settings.schema_manager(),
    };
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut draw = RandomGroups::new(rng);
    let mut reporter = Reporter::new(io::stdout());
    run::run(&plan, &registry, &mut draw, &mut reporter).await
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
    Ok(())
}
