#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Roster ingestion (CSV export of the ministry list plus supplementary
//! metadata) and the report files an enrichment run produces.

/// `[input]` and `[output]` settings.
#[path = "../settings.rs"]
pub mod settings;

/// Roster errors.
#[path = "../error.rs"]
pub mod error;

/// CSV roster loading and name cleaning.
#[path = "../loader.rs"]
pub mod loader;

/// Supplementary metadata index.
#[path = "../supplementary.rs"]
pub mod supplementary;

/// JSON and CSV report writers.
#[path = "../reports.rs"]
pub mod reports;

pub use error::RosterError;
pub use loader::{clean_name, load_roster, normalize_id, Roster, RosterRow};
pub use reports::{write_json, ReportSummary, ReportWriter};
pub use settings::{InputSettings, OutputSettings, RosterField};
pub use supplementary::{SupplementaryIndex, SUPPLEMENTARY_FIELDS};
