//! Postgres round-trip: connect, `SELECT 1`, close.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tracing::debug;
use url::Url;

use crate::config::{GateConfig, DATABASE_URL_ENV};
use crate::startup::{DependencyCheck, Probe, ProbeContext, ProbeError};

pub const PROBE_NAME: &str = "database";

/// `host:port/db` for logging, never the credentials
fn redacted_target(database_url: &str) -> String {
    match Url::parse(database_url) {
        Ok(url) => format!(
            "{}:{}{}",
            url.host_str().unwrap_or("localhost"),
            url.port().unwrap_or(5432),
            url.path()
        ),
        Err(_) => "<unparseable>".to_string(),
    }
}

/// Open a connection, giving up once `budget` has elapsed.
async fn connect_within(
    options: &PgConnectOptions,
    budget: Duration,
) -> anyhow::Result<PgConnection> {
    match tokio::time::timeout(budget, PgConnection::connect_with(options)).await {
        Ok(conn) => conn.context("Failed to connect to database"),
        Err(_) => anyhow::bail!(
            "Failed to connect to database: no response within {}ms",
            budget.as_millis()
        ),
    }
}

pub struct DatabaseCheck {
    database_url: Option<String>,
}

impl DatabaseCheck {
    pub fn new(database_url: Option<String>) -> Self {
        Self { database_url }
    }
}

#[async_trait]
impl DependencyCheck for DatabaseCheck {
    async fn check(&self, ctx: ProbeContext) -> anyhow::Result<bool> {
        let Some(database_url) = self.database_url.as_deref() else {
            anyhow::bail!("{} is not set", DATABASE_URL_ENV);
        };

        let options: PgConnectOptions = database_url
            .parse()
            .with_context(|| format!("Invalid {}", DATABASE_URL_ENV))?;

        debug!(
            target_db = %redacted_target(database_url),
            remaining_ms = ctx.remaining().as_millis() as u64,
            "Connecting to database"
        );

        let mut conn = connect_within(&options, ctx.remaining()).await?;

        let one: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&mut conn)
            .await
            .context("Database round-trip query failed")?;

        if let Err(e) = conn.close().await {
            debug!("Failed to close probe connection cleanly: {}", e);
        }

        Ok(one == 1)
    }
}

pub fn probe(config: &GateConfig) -> Result<Probe, ProbeError> {
    Ok(Probe::new(PROBE_NAME, Arc::new(DatabaseCheck::new(config.database_url.clone())))?
        .critical(true))
}
