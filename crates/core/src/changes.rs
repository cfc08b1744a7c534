//! Per-side change sets.
//!
//! A [`ChangeSet`] holds the identifiers of one side that are new, modified
//! or deleted compared to the previous run. Identifiers listed as deleted
//! refer to items that are already gone from their store but whose
//! correspondence-map entry still exists; dropping that entry is the
//! engine's job.

use std::collections::HashSet;
use std::fmt;

use crate::errors::SyncError;
use crate::models::{Identifier, Side};

/// How a touched identifier changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Modified,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modified => write!(f, "Modified"),
            Self::Deleted => write!(f, "Deleted"),
        }
    }
}

/// Identifiers touched on one side since the last run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet<Id: Identifier> {
    pub new: HashSet<Id>,
    pub modified: HashSet<Id>,
    pub deleted: HashSet<Id>,
}

impl<Id: Identifier> Default for ChangeSet<Id> {
    fn default() -> Self {
        Self {
            new: HashSet::new(),
            modified: HashSet::new(),
            deleted: HashSet::new(),
        }
    }
}

impl<Id: Identifier> ChangeSet<Id> {
    /// An empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_new<I: IntoIterator<Item = Id>>(mut self, ids: I) -> Self {
        self.new.extend(ids);
        self
    }

    pub fn with_modified<I: IntoIterator<Item = Id>>(mut self, ids: I) -> Self {
        self.modified.extend(ids);
        self
    }

    pub fn with_deleted<I: IntoIterator<Item = Id>>(mut self, ids: I) -> Self {
        self.deleted.extend(ids);
        self
    }

    /// True when nothing changed on this side.
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// `modified ∪ deleted`.
    pub fn touched(&self) -> HashSet<Id> {
        self.modified.union(&self.deleted).cloned().collect()
    }

    /// Classify a touched identifier, or `None` if it is neither modified
    /// nor deleted.
    pub fn kind_of(&self, id: &Id) -> Option<ChangeKind> {
        if self.modified.contains(id) {
            Some(ChangeKind::Modified)
        } else if self.deleted.contains(id) {
            Some(ChangeKind::Deleted)
        } else {
            None
        }
    }

    /// Check that the three categories are pairwise disjoint.
    pub fn validate(&self, side: Side) -> Result<(), SyncError> {
        let overlap = self
            .new
            .intersection(&self.modified)
            .chain(self.new.intersection(&self.deleted))
            .chain(self.modified.intersection(&self.deleted))
            .next();

        match overlap {
            Some(id) => Err(SyncError::OverlappingChangeSet {
                side,
                id: id.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn write_category<Id: Identifier>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    ids: &HashSet<Id>,
) -> fmt::Result {
    let mut rendered: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    rendered.sort();
    writeln!(f, "{:<16}{}", format!("{title}:"), ids.len())?;
    for id in rendered {
        writeln!(f, "\t{id}")?;
    }
    Ok(())
}

impl<Id: Identifier> fmt::Display for ChangeSet<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_category(f, "New Items", &self.new)?;
        write_category(f, "Modified Items", &self.modified)?;
        write_category(f, "Deleted Items", &self.deleted)
    }
}
