//! Place ownership across institutions and campus-name slots within one.
//!
//! Every accepted campus is keyed by its source place id. A place belongs to
//! at most one institution at a time; an institution holds at most one place
//! per campus name. Conflicts are settled by specificity ratio (globally) and
//! title length (locally).

/// Assignment engine and decisions.
pub mod engine;
/// Exact name/title length ratios.
pub mod ratio;
/// Thread-safe handle.
pub mod shared;

pub use engine::{Decision, Ownership, ReconcileError, Reconciler, Reassignment, Slot};
pub use ratio::SpecificityRatio;
pub use shared::SharedReconciler;
