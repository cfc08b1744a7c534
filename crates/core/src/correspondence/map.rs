//! Bidirectional identifier map.
//!
//! [`CorrespondenceMap`] keeps a forward (A -> B) and a reverse (B -> A)
//! hash map in lockstep. Every mutation goes through methods that update
//! both directions, so the two halves are never exposed separately.

use std::collections::HashMap;

use tracing::warn;

use crate::errors::MapError;
use crate::models::{Identifier, Side};

/// Bijection between side-A and side-B identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrespondenceMap<IdA: Identifier, IdB: Identifier> {
    a_to_b: HashMap<IdA, IdB>,
    b_to_a: HashMap<IdB, IdA>,
}

impl<IdA: Identifier, IdB: Identifier> Default for CorrespondenceMap<IdA, IdB> {
    fn default() -> Self {
        Self {
            a_to_b: HashMap::new(),
            b_to_a: HashMap::new(),
        }
    }
}

impl<IdA: Identifier, IdB: Identifier> CorrespondenceMap<IdA, IdB> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.a_to_b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a_to_b.is_empty()
    }

    /// Look up the B correspondent of an A identifier.
    pub fn lookup_by_a(&self, id_a: &IdA) -> Result<&IdB, MapError> {
        self.a_to_b.get(id_a).ok_or_else(|| MapError::NotFound {
            side: Side::A,
            id: id_a.to_string(),
        })
    }

    /// Look up the A correspondent of a B identifier.
    pub fn lookup_by_b(&self, id_b: &IdB) -> Result<&IdA, MapError> {
        self.b_to_a.get(id_b).ok_or_else(|| MapError::NotFound {
            side: Side::B,
            id: id_b.to_string(),
        })
    }

    pub fn contains_a(&self, id_a: &IdA) -> bool {
        self.a_to_b.contains_key(id_a)
    }

    pub fn contains_b(&self, id_b: &IdB) -> bool {
        self.b_to_a.contains_key(id_b)
    }

    /// Record that `id_a` and `id_b` denote the same logical item.
    ///
    /// Any existing pair involving either identifier is dropped first, so the
    /// map stays a bijection. Returns `true` if a stale pair was replaced.
    pub fn insert(&mut self, id_a: IdA, id_b: IdB) -> bool {
        let mut replaced = false;

        if let Some(old_b) = self.a_to_b.remove(&id_a) {
            self.b_to_a.remove(&old_b);
            if old_b != id_b {
                warn!(id_a = %id_a, old_b = %old_b, new_b = %id_b, "overwriting stale correspondence");
                replaced = true;
            }
        }
        if let Some(old_a) = self.b_to_a.remove(&id_b) {
            self.a_to_b.remove(&old_a);
            warn!(id_b = %id_b, old_a = %old_a, new_a = %id_a, "overwriting stale correspondence");
            replaced = true;
        }

        self.a_to_b.insert(id_a.clone(), id_b.clone());
        self.b_to_a.insert(id_b, id_a);
        replaced
    }

    /// Drop the pair keyed by an A identifier, returning its B correspondent.
    pub fn remove_by_a(&mut self, id_a: &IdA) -> Option<IdB> {
        let id_b = self.a_to_b.remove(id_a)?;
        self.b_to_a.remove(&id_b);
        Some(id_b)
    }

    /// Drop the pair keyed by a B identifier, returning its A correspondent.
    pub fn remove_by_b(&mut self, id_b: &IdB) -> Option<IdA> {
        let id_a = self.b_to_a.remove(id_b)?;
        self.a_to_b.remove(&id_a);
        Some(id_a)
    }

    /// Iterate over all `(A, B)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&IdA, &IdB)> {
        self.a_to_b.iter()
    }

    /// Build a map from pairs, rejecting any identifier that repeats on
    /// either side.
    pub fn try_from_pairs<I>(pairs: I) -> Result<Self, MapError>
    where
        I: IntoIterator<Item = (IdA, IdB)>,
    {
        let mut map = Self::new();
        for (id_a, id_b) in pairs {
            if map.contains_a(&id_a) {
                return Err(MapError::DuplicateEntry {
                    side: Side::A,
                    id: id_a.to_string(),
                });
            }
            if map.contains_b(&id_b) {
                return Err(MapError::DuplicateEntry {
                    side: Side::B,
                    id: id_b.to_string(),
                });
            }
            map.insert(id_a, id_b);
        }
        Ok(map)
    }
}

impl<IdA: Identifier, IdB: Identifier> FromIterator<(IdA, IdB)> for CorrespondenceMap<IdA, IdB> {
    /// Later pairs overwrite earlier ones that share an identifier.
    fn from_iter<I: IntoIterator<Item = (IdA, IdB)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<IdA: Identifier, IdB: Identifier> Extend<(IdA, IdB)> for CorrespondenceMap<IdA, IdB> {
    fn extend<I: IntoIterator<Item = (IdA, IdB)>>(&mut self, iter: I) {
        for (id_a, id_b) in iter {
            self.insert(id_a, id_b);
        }
    }
}
