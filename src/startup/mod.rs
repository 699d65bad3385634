//! Startup dependency validation.
//!
//! Before the service starts, every dependency probe runs concurrently with
//! its own deadline:
//! - [`ProbeRunner`] runs one probe and turns every outcome into a [`ProbeResult`]
//! - [`DependencyValidator`] runs a whole [`ProbeSet`] and returns a [`ValidationReport`]
//!
//! The gate fails closed. If any critical probe is unhealthy or times out,
//! `success` is false and the caller must not start serving.

mod probe;
mod report;
mod runner;
mod validator;

pub use probe::{DependencyCheck, Probe, ProbeContext, ProbeError, ProbeSet};
pub use report::{ProbeResult, ProbeStatus, ValidationReport};
pub use runner::{ProbeRunner, DEFAULT_PROBE_TIMEOUT};
pub use validator::DependencyValidator;
