//! LLM provider connectivity via `GET {base_url}/models`.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::http::{build_url, client_for};
use crate::config::{default_user_agent, GateConfig};
use crate::startup::{DependencyCheck, Probe, ProbeContext, ProbeError};

pub const PROBE_NAME: &str = "llm-provider";

pub struct LlmProviderCheck {
    base_url: String,
    api_key: String,
    user_agent: String,
}

impl LlmProviderCheck {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            user_agent: default_user_agent(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[async_trait]
impl DependencyCheck for LlmProviderCheck {
    async fn check(&self, ctx: ProbeContext) -> anyhow::Result<bool> {
        let url = build_url(&self.base_url, "models")?;
        let client = client_for(&ctx, &self.user_agent)?;

        debug!("GET {}", url);
        let response = client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .with_context(|| format!("Cannot connect to LLM provider at {}", self.base_url))?;

        let status = response.status();
        debug!("LLM provider responded with HTTP {}", status.as_u16());

        if status.is_success() {
            return Ok(true);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            anyhow::bail!(
                "LLM provider rejected credentials (HTTP {})",
                status.as_u16()
            );
        }
        Ok(false)
    }
}

/// `None` when no API key is configured.
pub fn probe(config: &GateConfig) -> Option<Result<Probe, ProbeError>> {
    let api_key = config.llm.api_key.as_ref()?;
    let check = LlmProviderCheck::new(&config.llm.base_url, api_key)
        .with_user_agent(&config.user_agent);

    Some(Probe::new(PROBE_NAME, Arc::new(check)).map(|probe| probe.critical(config.llm.critical)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::startup::{ProbeResult, ProbeRunner, ProbeStatus};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn run_against(base_url: &str, api_key: &str) -> ProbeResult {
        let probe = Probe::new(PROBE_NAME, Arc::new(LlmProviderCheck::new(base_url, api_key)))
            .unwrap()
            .with_timeout(Duration::from_secs(2))
            .unwrap();
        ProbeRunner::default().run(probe).await
    }

    #[tokio::test]
    async fn test_reachable_provider() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(header("user-agent", default_user_agent().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let result = run_against(&format!("{}/v1", server.uri()), "sk-test").await;
        assert_eq!(result.status, ProbeStatus::Healthy);
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = run_against(&format!("{}/v1", server.uri()), "sk-wrong").await;
        assert_eq!(result.status, ProbeStatus::Unhealthy);
        assert_eq!(
            result.error.as_deref(),
            Some("LLM provider rejected credentials (HTTP 401)")
        );
    }

    #[tokio::test]
    async fn test_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = run_against(&server.uri(), "sk-test").await;
        assert_eq!(result.error.as_deref(), Some("Health check returned false"));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let result = run_against("http://127.0.0.1:1/v1", "sk-test").await;
        assert_eq!(result.status, ProbeStatus::Unhealthy);
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .starts_with("Cannot connect to LLM provider at http://127.0.0.1:1/v1"));
    }

    #[test]
    fn test_probe_defaults_to_non_critical() {
        let config = GateConfig::from_lookup(|key| match key {
            "LLM_API_KEY" => Some("sk-test".to_string()),
            _ => None,
        })
        .unwrap();
        let probe = probe(&config).unwrap().unwrap();
        assert_eq!(probe.name(), "llm-provider");
        assert!(!probe.is_critical());
    }
}
