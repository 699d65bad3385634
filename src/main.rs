use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

use depgate::cli::{Cli, Commands};
use depgate::config::GateConfig;
use depgate::gate;

fn init_logging(verbose: bool, json: bool) {
    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(gate::EXIT_VALIDATION_FAILED)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let mut config = GateConfig::from_env().context("Invalid gate configuration")?;
    if let Some(ms) = cli.default_timeout_ms {
        config.default_timeout = Duration::from_millis(ms);
    }

    match cli.command {
        Commands::Check { json } => {
            let report = gate::run_gate(&config).await?;
            if json {
                gate::print_report(&report)?;
            }
            Ok(gate::verdict_exit_code(&report))
        }
        Commands::Run { json, command } => {
            let report = gate::run_gate(&config).await?;
            if json {
                gate::print_report(&report)?;
            }

            if !report.success {
                error!(
                    severity = "fatal",
                    "Refusing to start '{}': {} critical dependency failure(s)",
                    command.join(" "),
                    report.critical_failures.len()
                );
                return Ok(gate::EXIT_VALIDATION_FAILED);
            }

            match gate::launch(&command).await {
                Ok(code) => Ok(code),
                Err(e) => {
                    error!("{:#}", e);
                    Ok(gate::EXIT_LAUNCH_FAILED)
                }
            }
        }
    }
}
