//! Probe definitions.
//!
//! A [`Probe`] is a named dependency check with a criticality flag and an
//! optional timeout override. The check itself is a [`DependencyCheck`]
//! trait object that receives a [`ProbeContext`] carrying its deadline.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

/// Errors raised while assembling probes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Probe name is empty or whitespace
    #[error("probe name must not be blank")]
    EmptyName,

    /// Probe timeout is zero
    #[error("probe '{name}' has a zero timeout")]
    InvalidTimeout { name: String },

    /// Validator default timeout is zero
    #[error("default probe timeout must be greater than zero")]
    InvalidDefaultTimeout,

    /// Two probes in one set share a name
    #[error("duplicate probe name: {0}")]
    DuplicateName(String),
}

/// Per-invocation context handed to a check.
///
/// I/O checks should bound their own transport timeouts with
/// [`ProbeContext::remaining`] so the underlying request stops at the
/// same deadline the runner enforces.
#[derive(Debug, Clone)]
pub struct ProbeContext {
    name: String,
    deadline: Instant,
    timeout: Duration,
}

impl ProbeContext {
    pub(super) fn new(name: impl Into<String>, started: Instant, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            deadline: started + timeout,
            timeout,
        }
    }

    /// Name of the probe being run
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instant at which the runner gives up on this check
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Effective timeout for this check
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time left before the deadline, saturating at zero
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// A single dependency check.
///
/// - `Ok(true)`: the dependency is healthy
/// - `Ok(false)`: a recognized unhealthy condition
/// - `Err(_)`: an unexpected failure; its message is reported
#[async_trait]
pub trait DependencyCheck: Send + Sync {
    async fn check(&self, ctx: ProbeContext) -> anyhow::Result<bool>;
}

/// Adapts a closure into a [`DependencyCheck`].
struct FnCheck<F> {
    check_fn: F,
}

#[async_trait]
impl<F, Fut> DependencyCheck for FnCheck<F>
where
    F: Fn(ProbeContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<bool>> + Send,
{
    async fn check(&self, ctx: ProbeContext) -> anyhow::Result<bool> {
        (self.check_fn)(ctx).await
    }
}

/// A named, independently timed dependency check.
#[derive(Clone)]
pub struct Probe {
    name: String,
    critical: bool,
    timeout: Option<Duration>,
    check: Arc<dyn DependencyCheck>,
}

impl Probe {
    /// Create a critical probe that uses the validator's default timeout.
    pub fn new(
        name: impl Into<String>,
        check: Arc<dyn DependencyCheck>,
    ) -> Result<Self, ProbeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProbeError::EmptyName);
        }

        Ok(Self {
            name,
            critical: true,
            timeout: None,
            check,
        })
    }

    /// Create a probe from an async closure.
    pub fn from_fn<F, Fut>(name: impl Into<String>, check_fn: F) -> Result<Self, ProbeError>
    where
        F: Fn(ProbeContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        Self::new(name, Arc::new(FnCheck { check_fn }))
    }

    /// Set whether a failure of this probe blocks startup.
    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    /// Override the validator's default timeout. Zero is rejected.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ProbeError> {
        if timeout.is_zero() {
            return Err(ProbeError::InvalidTimeout { name: self.name });
        }
        self.timeout = Some(timeout);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(super) fn into_parts(self) -> (String, bool, Option<Duration>, Arc<dyn DependencyCheck>) {
        (self.name, self.critical, self.timeout, self.check)
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe")
            .field("name", &self.name)
            .field("critical", &self.critical)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Ordered set of probes for one validation run. Names are unique.
#[derive(Debug, Default)]
pub struct ProbeSet {
    probes: Vec<Probe>,
    names: HashSet<String>,
}

impl ProbeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a probe, rejecting duplicate names.
    pub fn push(&mut self, probe: Probe) -> Result<(), ProbeError> {
        if !self.names.insert(probe.name.clone()) {
            return Err(ProbeError::DuplicateName(probe.name));
        }
        self.probes.push(probe);
        Ok(())
    }

    /// Builder-style [`ProbeSet::push`].
    pub fn with(mut self, probe: Probe) -> Result<Self, ProbeError> {
        self.push(probe)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Probe names in input order
    pub fn names(&self) -> Vec<&str> {
        self.probes.iter().map(Probe::name).collect()
    }
}

impl IntoIterator for ProbeSet {
    type Item = Probe;
    type IntoIter = std::vec::IntoIter<Probe>;

    fn into_iter(self) -> Self::IntoIter {
        self.probes.into_iter()
    }
}
