//! JWT signing secrets are long enough and distinct.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{GateConfig, JWT_REFRESH_SECRET_ENV, JWT_SECRET_ENV};
use crate::startup::{DependencyCheck, Probe, ProbeContext, ProbeError};

pub const PROBE_NAME: &str = "jwt-secrets";
pub const MIN_SECRET_LENGTH: usize = 32;
const TIMEOUT: Duration = Duration::from_secs(2);

pub struct SecretStrengthCheck {
    access: Option<String>,
    refresh: Option<String>,
}

impl SecretStrengthCheck {
    pub fn new(access: Option<String>, refresh: Option<String>) -> Self {
        Self { access, refresh }
    }
}

fn require_strong<'a>(key: &str, value: Option<&'a str>) -> anyhow::Result<&'a str> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        anyhow::bail!("{} is not set", key);
    };
    if value.chars().count() < MIN_SECRET_LENGTH {
        anyhow::bail!(
            "{} must be at least {} characters long",
            key,
            MIN_SECRET_LENGTH
        );
    }
    Ok(value)
}

#[async_trait]
impl DependencyCheck for SecretStrengthCheck {
    async fn check(&self, _ctx: ProbeContext) -> anyhow::Result<bool> {
        let access = require_strong(JWT_SECRET_ENV, self.access.as_deref())?;
        let refresh = require_strong(JWT_REFRESH_SECRET_ENV, self.refresh.as_deref())?;

        if access == refresh {
            anyhow::bail!(
                "{} and {} must be different",
                JWT_SECRET_ENV,
                JWT_REFRESH_SECRET_ENV
            );
        }
        Ok(true)
    }
}

pub fn probe(config: &GateConfig) -> Result<Probe, ProbeError> {
    let check = SecretStrengthCheck::new(
        config.jwt_secret.clone(),
        config.jwt_refresh_secret.clone(),
    );
    Probe::new(PROBE_NAME, Arc::new(check))?
        .critical(true)
        .with_timeout(TIMEOUT)
}
