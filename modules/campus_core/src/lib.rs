#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Campus core: turns place-search titles into campus names and decides
//! which institution owns each place.

/// Institutions, campuses, and raw place records.
#[path = "../model.rs"]
pub mod model;

/// Locale word lists driving the parser.
#[path = "../lexicon.rs"]
pub mod lexicon;

/// Title parsing (prefix match, anchor scan, normalization).
#[path = "../parser/main.rs"]
pub mod parser;

/// Ownership and slot reconciliation.
#[path = "../reconciler/main.rs"]
pub mod reconciler;

pub use lexicon::{CampusLexicon, LexiconKind};
pub use model::{Campus, GeoPoint, Institution, Location, RawPlace};
pub use parser::{CampusName, CampusParser};
pub use reconciler::{
    Decision, Ownership, ReconcileError, Reconciler, Reassignment, SharedReconciler, Slot,
    SpecificityRatio,
};
