//! Conflict classification.
//!
//! Given the change sets of both sides and the correspondence map, the
//! detector splits every touched (modified or deleted) identifier into
//! either a conflict, when the correspondent on the other side was touched
//! too, or a one-sided change that can be applied unconditionally.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, info};

use crate::changes::{ChangeKind, ChangeSet};
use crate::correspondence::CorrespondenceMap;
use crate::errors::SyncError;
use crate::models::{Identifier, Side};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A logical item touched on both sides within the same run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict<IdA, IdB> {
    pub id_a: IdA,
    pub id_b: IdB,
    pub change_a: ChangeKind,
    pub change_b: ChangeKind,
}

impl<IdA: Identifier, IdB: Identifier> fmt::Display for Conflict<IdA, IdB> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "- [B] {} / [A] {}\n  {} from B\n  {} from A",
            self.id_b, self.id_a, self.change_b, self.change_a
        )
    }
}

/// An item touched on one side only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneSidedChange<Id, Other> {
    /// Identifier on the side where the change happened.
    pub id: Id,
    /// Its correspondent on the other side.
    pub correspondent: Other,
    pub change: ChangeKind,
}

/// Result of splitting both change sets.
#[derive(Debug, Clone)]
pub struct Classification<IdA, IdB> {
    pub conflicts: Vec<Conflict<IdA, IdB>>,
    /// Touched on A only; to be applied to B.
    pub only_a: Vec<OneSidedChange<IdA, IdB>>,
    /// Touched on B only; to be applied to A.
    pub only_b: Vec<OneSidedChange<IdB, IdA>>,
}

impl<IdA, IdB> Classification<IdA, IdB> {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty() && self.only_a.is_empty() && self.only_b.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Stateless classifier over two change sets.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Split the touched identifiers of both sides.
    ///
    /// Every touched identifier must have a correspondent in `map`; a miss
    /// means the change sets are inconsistent with the map and aborts with
    /// [`SyncError::CorrespondenceLookup`].
    pub fn classify<IdA: Identifier, IdB: Identifier>(
        changes_a: &ChangeSet<IdA>,
        changes_b: &ChangeSet<IdB>,
        map: &CorrespondenceMap<IdA, IdB>,
    ) -> Result<Classification<IdA, IdB>, SyncError> {
        let touched_a = changes_a.touched();
        let touched_b = changes_b.touched();
        info!(
            touched_a = touched_a.len(),
            touched_b = touched_b.len(),
            "classifying touched items"
        );

        // A-touched identifiers expressed in B's identifier space, and vice versa.
        let touched_a_in_b: HashMap<IdB, IdA> = touched_a
            .iter()
            .map(|id_a| correspondent_of_a(map, id_a).map(|id_b| (id_b, id_a.clone())))
            .collect::<Result<_, _>>()?;
        let touched_b_in_a: HashMap<IdA, IdB> = touched_b
            .iter()
            .map(|id_b| correspondent_of_b(map, id_b).map(|id_a| (id_a, id_b.clone())))
            .collect::<Result<_, _>>()?;

        let conflict_ids: HashSet<&IdB> = touched_b
            .iter()
            .filter(|id_b| touched_a_in_b.contains_key(*id_b))
            .collect();

        let mut conflicts = Vec::with_capacity(conflict_ids.len());
        for id_b in &conflict_ids {
            let id_a = &touched_a_in_b[*id_b];
            let conflict = Conflict {
                id_a: id_a.clone(),
                id_b: (*id_b).clone(),
                change_a: kind_of(changes_a, id_a, Side::A)?,
                change_b: kind_of(changes_b, *id_b, Side::B)?,
            };
            debug!(id_a = %conflict.id_a, id_b = %conflict.id_b, "conflict detected");
            conflicts.push(conflict);
        }

        let mut only_b = Vec::new();
        for (id_a, id_b) in &touched_b_in_a {
            if conflict_ids.contains(id_b) {
                continue;
            }
            only_b.push(OneSidedChange {
                id: id_b.clone(),
                correspondent: id_a.clone(),
                change: kind_of(changes_b, id_b, Side::B)?,
            });
        }

        let mut only_a = Vec::new();
        for (id_b, id_a) in &touched_a_in_b {
            if touched_b_in_a.contains_key(id_a) {
                continue;
            }
            only_a.push(OneSidedChange {
                id: id_a.clone(),
                correspondent: id_b.clone(),
                change: kind_of(changes_a, id_a, Side::A)?,
            });
        }

        info!(
            conflicts = conflicts.len(),
            only_a = only_a.len(),
            only_b = only_b.len(),
            "classification complete"
        );

        Ok(Classification {
            conflicts,
            only_a,
            only_b,
        })
    }
}

fn correspondent_of_a<IdA: Identifier, IdB: Identifier>(
    map: &CorrespondenceMap<IdA, IdB>,
    id_a: &IdA,
) -> Result<IdB, SyncError> {
    map.lookup_by_a(id_a)
        .cloned()
        .map_err(|_| SyncError::CorrespondenceLookup {
            side: Side::A,
            id: id_a.to_string(),
        })
}

fn correspondent_of_b<IdA: Identifier, IdB: Identifier>(
    map: &CorrespondenceMap<IdA, IdB>,
    id_b: &IdB,
) -> Result<IdA, SyncError> {
    map.lookup_by_b(id_b)
        .cloned()
        .map_err(|_| SyncError::CorrespondenceLookup {
            side: Side::B,
            id: id_b.to_string(),
        })
}

fn kind_of<Id: Identifier>(
    changes: &ChangeSet<Id>,
    id: &Id,
    side: Side,
) -> Result<ChangeKind, SyncError> {
    changes
        .kind_of(id)
        .ok_or_else(|| SyncError::InvariantViolation {
            side,
            id: id.to_string(),
        })
}
