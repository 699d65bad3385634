//! depgate - startup dependency gate.
//!
//! Runs a set of dependency probes (configuration invariants, database,
//! object storage, LLM provider) concurrently, each against its own deadline,
//! and produces a single pass/fail [`startup::ValidationReport`]. A service
//! must not start serving unless the report passes.

pub mod checks;
pub mod cli;
pub mod config;
pub mod gate;
pub mod startup;
