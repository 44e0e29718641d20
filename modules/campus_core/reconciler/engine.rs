use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use thiserror::Error;

use super::ratio::SpecificityRatio;
use crate::{
    model::{Campus, Institution, RawPlace},
    parser::CampusName,
};

/// Errors raised by [`Reconciler`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// `try_assign` named an institution that was never registered.
    #[error("unknown institution: {0}")]
    UnknownInstitution(String),
    /// `register` was called twice with the same name.
    #[error("institution already registered: {0}")]
    DuplicateInstitution(String),
}

/// Current owner of a place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    /// Owning institution name.
    pub institution: String,
    /// Ratio the owner won with.
    pub ratio: SpecificityRatio,
}

/// Place currently holding a campus name inside one institution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Holder place id.
    pub place_id: String,
    /// Holder title length in chars.
    pub title_length: usize,
    /// Holder title.
    pub title: String,
}

/// Previous owner a place was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    /// Institution that lost the place.
    pub institution: String,
    /// Ratio it had held the place with.
    pub ratio: SpecificityRatio,
}

/// Result of [`Reconciler::try_assign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Missing id or title; dropped without a trace.
    Malformed,
    /// Parser rejected the title.
    Rejected,
    /// Title names the institution itself.
    NoCampus,
    /// Another institution holds the place with an equal or higher ratio.
    OwnedElsewhere {
        /// Current owner.
        owner: String,
        /// Owner's ratio.
        owner_ratio: SpecificityRatio,
        /// Ratio this attempt had.
        ratio: SpecificityRatio,
    },
    /// The campus name is held by a title at least as long.
    SlotTaken {
        /// Contested campus name.
        campus: String,
        /// Holder place id.
        holder: String,
        /// Holder title.
        holder_title: String,
    },
    /// Campus attached.
    Accepted {
        /// Campus name.
        campus: String,
        /// Ratio the place is now held with.
        ratio: SpecificityRatio,
        /// Other institution the place was moved from.
        reassigned_from: Option<Reassignment>,
        /// Place evicted from the campus-name slot.
        displaced: Option<String>,
    },
}

impl Decision {
    /// Stable label for logs and counters.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Rejected => "rejected",
            Self::NoCampus => "no_campus",
            Self::OwnedElsewhere { .. } => "owned_elsewhere",
            Self::SlotTaken { .. } => "slot_taken",
            Self::Accepted { .. } => "accepted",
        }
    }

    /// True for `Accepted`.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

struct Plan {
    prior: Option<Ownership>,
    displaced: Option<String>,
}

/// Institution registry plus the ownership and slot indexes over it.
#[derive(Debug, Default)]
pub struct Reconciler {
    institutions: IndexMap<String, Institution>,
    ownership: HashMap<String, Ownership>,
    slots: HashMap<String, HashMap<String, Slot>>,
}

impl Reconciler {
    /// Empty reconciler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an institution. Campuses it carries are dropped; campus lists
    /// are built only through [`Self::try_assign`].
    ///
    /// # Errors
    ///
    /// [`ReconcileError::DuplicateInstitution`] when the name is taken; the
    /// first registration stays.
    pub fn register(&mut self, mut institution: Institution) -> Result<(), ReconcileError> {
        if self.institutions.contains_key(&institution.name) {
            return Err(ReconcileError::DuplicateInstitution(institution.name));
        }
        institution.campuses.clear();
        self.slots.insert(institution.name.clone(), HashMap::new());
        self.institutions.insert(institution.name.clone(), institution);
        Ok(())
    }

    /// Registered institutions in registration order.
    pub fn institutions(&self) -> impl Iterator<Item = &Institution> {
        self.institutions.values()
    }

    /// Number of registered institutions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.institutions.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.institutions.is_empty()
    }

    /// Institution by name.
    #[must_use]
    pub fn institution(&self, name: &str) -> Option<&Institution> {
        self.institutions.get(name)
    }

    /// Current owner of `place_id`.
    #[must_use]
    pub fn owner_of(&self, place_id: &str) -> Option<&Ownership> {
        self.ownership.get(place_id)
    }

    /// Holder of `campus` inside `institution`.
    #[must_use]
    pub fn slot(&self, institution: &str, campus: &str) -> Option<&Slot> {
        self.slots.get(institution)?.get(campus)
    }

    /// Institutions with at least one campus.
    pub fn with_campuses(&self) -> impl Iterator<Item = &Institution> {
        self.institutions().filter(|inst| !inst.campuses.is_empty())
    }

    /// Institutions with no campus.
    pub fn without_campuses(&self) -> impl Iterator<Item = &Institution> {
        self.institutions().filter(|inst| inst.campuses.is_empty())
    }

    /// Consumes the reconciler, returning institutions in registration order.
    #[must_use]
    pub fn into_institutions(self) -> Vec<Institution> {
        self.institutions.into_values().collect()
    }

    /// Decides where `place` goes given the parser `outcome` for
    /// `institution`, and applies the decision.
    ///
    /// # Errors
    ///
    /// [`ReconcileError::UnknownInstitution`] when `institution` was never
    /// registered.
    pub fn try_assign(
        &mut self,
        place: &RawPlace,
        institution: &str,
        outcome: CampusName,
    ) -> Result<Decision, ReconcileError> {
        if !self.institutions.contains_key(institution) {
            return Err(ReconcileError::UnknownInstitution(institution.to_string()));
        }
        let (Some(place_id), Some(title)) = (place.place_id(), place.title_text()) else {
            return Ok(Decision::Malformed);
        };
        let campus = match outcome {
            CampusName::Rejected => return Ok(Decision::Rejected),
            CampusName::NoCampus => return Ok(Decision::NoCampus),
            CampusName::Accepted(name) => name,
        };
        let ratio = SpecificityRatio::of(institution, title);
        let title_length = title.chars().count();

        if let Some(owner) = self.ownership.get(place_id) {
            if owner.institution != institution && owner.ratio >= ratio {
                return Ok(Decision::OwnedElsewhere {
                    owner: owner.institution.clone(),
                    owner_ratio: owner.ratio,
                    ratio,
                });
            }
        }
        if let Some(slot) = self.slot(institution, &campus) {
            if slot.title_length >= title_length {
                return Ok(Decision::SlotTaken {
                    campus,
                    holder: slot.place_id.clone(),
                    holder_title: slot.title.clone(),
                });
            }
        }

        let plan = self.plan(place_id, institution, &campus);
        let reassigned_from = plan
            .prior
            .as_ref()
            .filter(|prior| prior.institution != institution)
            .map(|prior| Reassignment {
                institution: prior.institution.clone(),
                ratio: prior.ratio,
            });
        let displaced = plan.displaced.clone();
        self.apply(plan, place, place_id, institution, &campus, ratio, title);
        Ok(Decision::Accepted {
            campus,
            ratio,
            reassigned_from,
            displaced,
        })
    }

    fn plan(&self, place_id: &str, institution: &str, campus: &str) -> Plan {
        let prior = self.ownership.get(place_id).cloned();
        let displaced = self
            .slot(institution, campus)
            .map(|slot| slot.place_id.clone())
            .filter(|holder| holder != place_id);
        Plan { prior, displaced }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply(
        &mut self,
        plan: Plan,
        place: &RawPlace,
        place_id: &str,
        institution: &str,
        campus: &str,
        ratio: SpecificityRatio,
        title: &str,
    ) {
        if let Some(prior) = plan.prior {
            self.detach(&prior.institution, place_id);
        }
        if let Some(holder) = plan.displaced {
            self.detach(institution, &holder);
        }
        if let Some(target) = self.institutions.get_mut(institution) {
            target
                .campuses
                .push(Campus::from_place(place_id, campus, place));
        }
        self.ownership.insert(
            place_id.to_string(),
            Ownership {
                institution: institution.to_string(),
                ratio,
            },
        );
        self.slots.entry(institution.to_string()).or_default().insert(
            campus.to_string(),
            Slot {
                place_id: place_id.to_string(),
                title_length: title.chars().count(),
                title: title.to_string(),
            },
        );
    }

    /// Removes `place_id` from `institution`: its campus, its ownership
    /// entry and every slot pointing at it.
    fn detach(&mut self, institution: &str, place_id: &str) {
        if let Some(inst) = self.institutions.get_mut(institution) {
            inst.campuses.retain(|campus| campus.id != place_id);
        }
        if self
            .ownership
            .get(place_id)
            .is_some_and(|owner| owner.institution == institution)
        {
            self.ownership.remove(place_id);
        }
        if let Some(slots) = self.slots.get_mut(institution) {
            slots.retain(|_, slot| slot.place_id != place_id);
        }
    }

    /// Lists every broken invariant; empty when the state is consistent.
    #[must_use]
    pub fn audit(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for inst in self.institutions.values() {
            let mut names = HashSet::new();
            for campus in &inst.campuses {
                if let Some(other) = seen.insert(&campus.id, &inst.name) {
                    problems.push(format!(
                        "place {} attached to both {other} and {}",
                        campus.id, inst.name
                    ));
                }
                if let Some(name) = campus.name.as_deref() {
                    if !names.insert(name) {
                        problems.push(format!("{} lists campus {name} twice", inst.name));
                    }
                }
                match self.ownership.get(&campus.id) {
                    Some(owner) if owner.institution == inst.name => {}
                    _ => problems.push(format!(
                        "place {} in {} has no matching ownership entry",
                        campus.id, inst.name
                    )),
                }
            }
        }
        for (place_id, owner) in &self.ownership {
            if seen.get(place_id.as_str()) != Some(&owner.institution.as_str()) {
                problems.push(format!(
                    "ownership of {place_id} by {} has no campus",
                    owner.institution
                ));
            }
        }
        for (institution, slots) in &self.slots {
            for (name, slot) in slots {
                let held = self.institutions.get(institution).is_some_and(|inst| {
                    inst.campus(&slot.place_id)
                        .is_some_and(|campus| campus.name.as_deref() == Some(name.as_str()))
                });
                if !held {
                    problems.push(format!(
                        "slot {name} in {institution} points at missing place {}",
                        slot.place_id
                    ));
                }
            }
        }
        problems
    }
}
