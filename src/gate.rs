//! Verdict consumer: turns a validation report into a startup decision.
//!
//! ```text
//! load GateConfig -> standard_probes -> DependencyValidator::validate
//!   success -> launch service (or exit 0)
//!   failure -> exit 1 before anything binds a listener
//! ```

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{error, info};

use crate::checks::standard_probes;
use crate::config::GateConfig;
use crate::startup::{DependencyValidator, ValidationReport};

/// Exit status when validation blocks startup
pub const EXIT_VALIDATION_FAILED: u8 = 1;

/// Exit status when the service command cannot be spawned
pub const EXIT_LAUNCH_FAILED: u8 = 127;

/// Run the standard probe set once against `config`.
pub async fn run_gate(config: &GateConfig) -> Result<ValidationReport> {
    let probes = standard_probes(config).context("Failed to assemble dependency probes")?;
    let validator = DependencyValidator::new(config.default_timeout)
        .context("Invalid default probe timeout")?;

    info!(
        probes = probes.len(),
        default_timeout_ms = config.default_timeout.as_millis() as u64,
        "Validating startup dependencies"
    );
    Ok(validator.validate(probes).await)
}

/// Print the report as pretty JSON to stdout.
pub fn print_report(report: &ValidationReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}

/// Map a report to the process exit status for `check`.
pub fn verdict_exit_code(report: &ValidationReport) -> u8 {
    if report.success {
        0
    } else {
        EXIT_VALIDATION_FAILED
    }
}

fn child_exit_code(code: Option<i32>) -> u8 {
    match code {
        Some(code) => u8::try_from(code).unwrap_or(1),
        // Terminated by a signal
        None => 1,
    }
}

/// Start the service command with inherited stdio and wait for it.
///
/// Only called after a passing report.
pub async fn launch(command: &[String]) -> Result<u8> {
    let (program, args) = command
        .split_first()
        .context("No service command given")?;

    info!(command = %program, "Dependencies validated, starting service");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("Failed to start service command '{}'", program))?;

    let status = child
        .wait()
        .await
        .with_context(|| format!("Failed waiting for '{}'", program))?;

    if !status.success() {
        error!(command = %program, status = %status, "Service exited unsuccessfully");
    }
    Ok(child_exit_code(status.code()))
}
