//! Standard probe set.
//!
//! Thin adapters from each dependency kind into a [`Probe`]:
//! - `environment`: required keys present and non-blank
//! - `jwt-secrets`: secret length and distinctness
//! - `database`: Postgres round-trip
//! - `object-storage`: bucket existence
//! - `llm-provider`: provider connectivity
//!
//! Each adapter holds only the configuration it closes over and builds its
//! own client per run.

mod database;
mod environment;
mod http;
mod llm;
mod secrets;
mod storage;

pub use database::DatabaseCheck;
pub use environment::EnvironmentCheck;
pub use llm::LlmProviderCheck;
pub use secrets::{SecretStrengthCheck, MIN_SECRET_LENGTH};
pub use storage::BucketExistsCheck;

use crate::config::GateConfig;
use crate::startup::{ProbeError, ProbeSet};

/// Build the standard probes in reporting order.
///
/// Object storage and the LLM provider are only probed when configured.
pub fn standard_probes(config: &GateConfig) -> Result<ProbeSet, ProbeError> {
    let mut probes = ProbeSet::new();
    probes.push(environment::probe(config)?)?;
    probes.push(secrets::probe(config)?)?;
    probes.push(database::probe(config)?)?;
    if let Some(probe) = storage::probe(config) {
        probes.push(probe?)?;
    }
    if let Some(probe) = llm::probe(config) {
        probes.push(probe?)?;
    }
    Ok(probes)
}
