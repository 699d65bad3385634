use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::startup::ProbeContext;

/// Slack past the probe deadline before the transport gives up on its own
const TRANSPORT_GRACE: Duration = Duration::from_millis(100);

/// Build a fresh HTTP client bounded by the probe's remaining budget.
///
/// The runner's deadline fires first and drops the in-flight request; the
/// transport timeout only backstops it. Each probe gets its own client so no
/// connection outlives the run.
pub(super) fn client_for(ctx: &ProbeContext, user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(ctx.remaining() + TRANSPORT_GRACE)
        .user_agent(user_agent)
        .build()
        .context("Failed to build HTTP client")
}

/// Join `segment` onto `base_url`, treating the base as a directory.
pub(super) fn build_url(base_url: &str, segment: &str) -> Result<Url> {
    let mut base =
        Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(segment)
        .with_context(|| format!("Failed to build URL for: {}", segment))
}
