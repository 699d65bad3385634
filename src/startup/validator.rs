//! Concurrent validation of a probe set.

use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use super::probe::{ProbeError, ProbeSet};
use super::report::ValidationReport;
use super::runner::ProbeRunner;

/// Fans a [`ProbeSet`] out concurrently and renders a single verdict.
///
/// # Example
/// ```ignore
/// let validator = DependencyValidator::new(Duration::from_secs(10))?;
/// let report = validator.validate(probes).await;
/// if !report.success {
///     std::process::exit(1);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyValidator {
    runner: ProbeRunner,
}

impl DependencyValidator {
    pub fn new(default_timeout: Duration) -> Result<Self, ProbeError> {
        Ok(Self {
            runner: ProbeRunner::new(default_timeout)?,
        })
    }

    pub fn default_timeout(&self) -> Duration {
        self.runner.default_timeout()
    }

    /// Run every probe concurrently and wait for all of them.
    ///
    /// There is no short-circuit on the first critical failure, so the report
    /// always covers every probe. Results keep input order. This never
    /// fails; the verdict is carried by [`ValidationReport::success`].
    pub async fn validate(&self, probes: ProbeSet) -> ValidationReport {
        let span = info_span!(
            "dependency_validation",
            component = "dependency-validator",
            run_id = %Uuid::new_v4(),
            probes = probes.len()
        );

        async move {
            let started_at = Utc::now();
            let started = Instant::now();

            let results = join_all(probes.into_iter().map(|probe| self.runner.run(probe))).await;
            let report = ValidationReport::from_results(results, started_at, started.elapsed());

            log_summary(&report);
            report
        }
        .instrument(span)
        .await
    }
}

fn log_summary(report: &ValidationReport) {
    let duration_ms = report.duration.as_millis() as u64;

    if report.success {
        info!(
            healthy = report.healthy_count(),
            unhealthy = report.unhealthy_count(),
            timeout = report.timeout_count(),
            duration_ms,
            "all critical dependencies validated"
        );
        return;
    }

    for result in report.results.iter().filter(|r| r.is_critical_failure()) {
        error!(
            probe = %result.name,
            status = %result.status,
            reason = result.error.as_deref().unwrap_or(result.status.as_str()),
            "critical dependency failed"
        );
    }

    // tracing has no fatal level
    error!(
        severity = "fatal",
        failures = ?report.critical_failures,
        healthy = report.healthy_count(),
        unhealthy = report.unhealthy_count(),
        timeout = report.timeout_count(),
        duration_ms,
        "dependency validation failed: {} critical failure(s)",
        report.critical_failures.len()
    );
}
