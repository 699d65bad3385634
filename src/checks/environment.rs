//! Required environment keys are present and non-blank.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{GateConfig, RequiredVar};
use crate::startup::{DependencyCheck, Probe, ProbeContext, ProbeError};

pub const PROBE_NAME: &str = "environment";
const TIMEOUT: Duration = Duration::from_secs(2);

pub struct EnvironmentCheck {
    required: Vec<RequiredVar>,
}

impl EnvironmentCheck {
    pub fn new(required: Vec<RequiredVar>) -> Self {
        Self { required }
    }

    fn missing(&self) -> Vec<&str> {
        self.required
            .iter()
            .filter(|var| !var.is_present())
            .map(|var| var.key.as_str())
            .collect()
    }
}

#[async_trait]
impl DependencyCheck for EnvironmentCheck {
    async fn check(&self, _ctx: ProbeContext) -> anyhow::Result<bool> {
        let missing = self.missing();
        if !missing.is_empty() {
            anyhow::bail!(
                "Missing required environment variables: {}",
                missing.join(", ")
            );
        }
        Ok(true)
    }
}

pub fn probe(config: &GateConfig) -> Result<Probe, ProbeError> {
    Probe::new(
        PROBE_NAME,
        Arc::new(EnvironmentCheck::new(config.required.clone())),
    )?
    .critical(true)
    .with_timeout(TIMEOUT)
}
