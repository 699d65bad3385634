//! Probe results and the aggregated validation report.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Error recorded when a check resolves `false`
pub const RETURNED_FALSE_MESSAGE: &str = "Health check returned false";

/// Error recorded when a check exceeds its deadline
pub const TIMEOUT_MESSAGE: &str = "Health check timeout";

/// Outcome classification of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Healthy,
    Unhealthy,
    Timeout,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Healthy => "healthy",
            ProbeStatus::Unhealthy => "unhealthy",
            ProbeStatus::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Result of running one probe. `error` is set for every non-healthy status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub name: String,
    pub status: ProbeStatus,
    pub critical: bool,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn healthy(name: impl Into<String>, critical: bool, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: ProbeStatus::Healthy,
            critical,
            duration,
            error: None,
        }
    }

    pub fn unhealthy(
        name: impl Into<String>,
        critical: bool,
        duration: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: ProbeStatus::Unhealthy,
            critical,
            duration,
            error: Some(error.into()),
        }
    }

    pub fn timeout(name: impl Into<String>, critical: bool, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: ProbeStatus::Timeout,
            critical,
            duration,
            error: Some(TIMEOUT_MESSAGE.to_string()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == ProbeStatus::Healthy
    }

    /// True when this result must block startup
    pub fn is_critical_failure(&self) -> bool {
        self.critical && !self.is_healthy()
    }

    /// `"{name}: {error or status}"`
    pub fn failure_line(&self) -> String {
        match &self.error {
            Some(error) => format!("{}: {}", self.name, error),
            None => format!("{}: {}", self.name, self.status),
        }
    }
}

/// Verdict of one validation run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub success: bool,
    /// One entry per submitted probe, in input order
    pub results: Vec<ProbeResult>,
    pub critical_failures: Vec<String>,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl ValidationReport {
    /// Classify a complete, ordered result list.
    pub fn from_results(
        results: Vec<ProbeResult>,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        let critical_failures: Vec<String> = results
            .iter()
            .filter(|r| r.is_critical_failure())
            .map(ProbeResult::failure_line)
            .collect();

        Self {
            success: critical_failures.is_empty(),
            results,
            critical_failures,
            started_at,
            duration,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    fn count(&self, status: ProbeStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn healthy_count(&self) -> usize {
        self.count(ProbeStatus::Healthy)
    }

    pub fn unhealthy_count(&self) -> usize {
        self.count(ProbeStatus::Unhealthy)
    }

    pub fn timeout_count(&self) -> usize {
        self.count(ProbeStatus::Timeout)
    }

    /// Look up a result by probe name
    pub fn result(&self, name: &str) -> Option<&ProbeResult> {
        self.results.iter().find(|r| r.name == name)
    }
}
