#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Enrichment run: roster in, place search per institution, reconciled
//! campuses and reports out.

/// `campus.toml` loading.
#[path = "../config.rs"]
pub mod config;

/// Run telemetry handle.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Sequential enrichment loop.
#[path = "../runtime.rs"]
pub mod runtime;

pub use config::{EnrichConfig, ParserSettings};
pub use runtime::{EnrichmentRuntime, EnrichmentRuntimeBuilder, RunOutcome, RunStats};
pub use telemetry::{EnrichmentTelemetry, EnrichmentTelemetryBuilder};
