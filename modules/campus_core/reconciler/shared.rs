use std::sync::Arc;

use parking_lot::Mutex;

use super::engine::{Decision, ReconcileError, Reconciler};
use crate::{
    model::{Institution, RawPlace},
    parser::CampusName,
};

/// Cloneable handle serializing every check and mutation through one lock.
#[derive(Debug, Clone, Default)]
pub struct SharedReconciler {
    inner: Arc<Mutex<Reconciler>>,
}

impl SharedReconciler {
    /// Wraps an existing reconciler.
    #[must_use]
    pub fn new(reconciler: Reconciler) -> Self {
        Self {
            inner: Arc::new(Mutex::new(reconciler)),
        }
    }

    /// See [`Reconciler::register`].
    ///
    /// # Errors
    ///
    /// Propagates [`ReconcileError::DuplicateInstitution`].
    pub fn register(&self, institution: Institution) -> Result<(), ReconcileError> {
        self.inner.lock().register(institution)
    }

    /// See [`Reconciler::try_assign`]. The global and local checks and the
    /// mutation run under a single lock acquisition.
    ///
    /// # Errors
    ///
    /// Propagates [`ReconcileError::UnknownInstitution`].
    pub fn try_assign(
        &self,
        place: &RawPlace,
        institution: &str,
        outcome: CampusName,
    ) -> Result<Decision, ReconcileError> {
        self.inner.lock().try_assign(place, institution, outcome)
    }

    /// Runs `f` against a consistent view of the state.
    pub fn read<T>(&self, f: impl FnOnce(&Reconciler) -> T) -> T {
        f(&self.inner.lock())
    }

    /// Returns the reconciler if this is the last handle, otherwise a handle
    /// back.
    ///
    /// # Errors
    ///
    /// Returns `self` while other clones are alive.
    pub fn try_unwrap(self) -> Result<Reconciler, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl From<Reconciler> for SharedReconciler {
    fn from(reconciler: Reconciler) -> Self {
        Self::new(reconciler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_workers_keep_one_owner_per_place() {
        let shared = SharedReconciler::default();
        let names = ["山东大学", "山东大学威海分校", "山东大学青岛校区管理处"];
        for (idx, name) in names.iter().enumerate() {
            shared
                .register(Institution::new(idx.to_string(), *name))
                .unwrap();
        }
        std::thread::scope(|scope| {
            for name in names {
                let shared = shared.clone();
                scope.spawn(move || {
                    for round in 0..50 {
                        let place = RawPlace {
                            id: Some(format!("p{}", round % 5)),
                            title: Some("山东大学威海分校(威海校区)".into()),
                            ..RawPlace::default()
                        };
                        shared
                            .try_assign(&place, name, CampusName::Accepted(format!("校区{}", round % 5)))
                            .unwrap();
                    }
                });
            }
        });
        let reconciler = shared.try_unwrap().unwrap();
        assert!(reconciler.audit().is_empty(), "{:?}", reconciler.audit());
        let total: usize = reconciler.institutions().map(|i| i.campuses.len()).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn read_sees_committed_state() {
        let shared = SharedReconciler::from(Reconciler::new());
        shared.register(Institution::new("1", "南京大学")).unwrap();
        let place = RawPlace {
            id: Some("x".into()),
            title: Some("南京大学仙林校区".into()),
            ..RawPlace::default()
        };
        let decision = shared
            .try_assign(&place, "南京大学", CampusName::Accepted("仙林校区".into()))
            .unwrap();
        assert!(decision.is_accepted());
        assert_eq!(shared.read(|rec| rec.with_campuses().count()), 1);
    }
}
