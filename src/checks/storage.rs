//! Object storage bucket existence via `HEAD {endpoint}/{bucket}`.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::http::{build_url, client_for};
use crate::config::{default_user_agent, GateConfig, StorageConfig};
use crate::startup::{DependencyCheck, Probe, ProbeContext, ProbeError};

pub const PROBE_NAME: &str = "object-storage";

pub struct BucketExistsCheck {
    endpoint: String,
    bucket: String,
    user_agent: String,
}

impl BucketExistsCheck {
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            user_agent: default_user_agent(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[async_trait]
impl DependencyCheck for BucketExistsCheck {
    async fn check(&self, ctx: ProbeContext) -> anyhow::Result<bool> {
        let url = build_url(&self.endpoint, &self.bucket)?;
        let client = client_for(&ctx, &self.user_agent)?;

        debug!("HEAD {}", url);
        let response = client
            .head(url.clone())
            .send()
            .await
            .with_context(|| format!("Cannot reach object storage at {}", self.endpoint))?;

        let status = response.status();
        debug!("Object storage responded with HTTP {}", status.as_u16());

        // 403 means the bucket exists but this anonymous probe may not read it.
        if status.is_success() || status == StatusCode::FORBIDDEN {
            return Ok(true);
        }
        if status == StatusCode::NOT_FOUND {
            anyhow::bail!("bucket '{}' does not exist", self.bucket);
        }
        Ok(false)
    }
}

/// `None` when no bucket is configured.
pub fn probe(config: &GateConfig) -> Option<Result<Probe, ProbeError>> {
    let StorageConfig {
        endpoint,
        bucket,
        critical,
    } = &config.storage;
    let bucket = bucket.as_ref()?;
    let check = BucketExistsCheck::new(endpoint, bucket).with_user_agent(&config.user_agent);

    Some(
        Probe::new(PROBE_NAME, Arc::new(check))
            .map(|probe| probe.critical(*critical)),
    )
}
