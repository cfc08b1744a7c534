//! Bidirectional reconciliation engine.
//!
//! The [`SyncEngine`] brings two stores back into agreement given what
//! changed on each side since the previous run. Each `sync` call goes
//! through four phases:
//!
//! 1. Propagate new items to the opposite side and record the new pairs.
//! 2. Classify touched (modified / deleted) items into conflicts and
//!    one-sided changes.
//! 3. Resolve conflicts through the [`ResolutionStrategy`].
//! 4. Apply one-sided changes to the opposite side.
//!
//! Callback failures are isolated per identifier (unless disabled in the
//! config) and show up in the run's [`SyncStats`]. The reporter receives the
//! statistics exactly once per call, whether the run completed or aborted.

use std::fmt;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adapter::{Converters, SideAdapter};
use crate::changes::{ChangeKind, ChangeSet};
use crate::config::SyncConfig;
use crate::conflict::{
    Conflict, ConflictDetector, DateGetter, OneSidedChange, Resolution, ResolutionStrategy,
};
use crate::correspondence::{CorrespondenceMap, MapFile};
use crate::errors::{CoreError, MapError, SyncError};
use crate::models::{Operation, Side};
use crate::report::{OperationFailure, SyncReporter, SyncStats, TracingReporter};

/// Result of fetching one item through a getter.
enum Fetch<T> {
    Found(T),
    Absent,
    /// The getter failed and the failure was isolated.
    Failed,
}

impl<T> Fetch<T> {
    fn into_option(self) -> Option<T> {
        match self {
            Self::Found(item) => Some(item),
            Self::Absent | Self::Failed => None,
        }
    }
}

/// The bidirectional sync engine.
pub struct SyncEngine<A: SideAdapter, B: SideAdapter> {
    config: SyncConfig,
    side_a: A,
    side_b: B,
    converters: Converters<A::Item, B::Item>,
    strategy: Box<dyn ResolutionStrategy<A::Item, B::Item>>,
    map: CorrespondenceMap<A::Id, B::Id>,
    reporter: Box<dyn SyncReporter>,
    stats: SyncStats,
}

impl<A: SideAdapter, B: SideAdapter> SyncEngine<A, B> {
    /// Create a new engine with all required collaborators. The reporter
    /// defaults to [`TracingReporter`].
    pub fn new(
        config: SyncConfig,
        side_a: A,
        side_b: B,
        converters: Converters<A::Item, B::Item>,
        strategy: Box<dyn ResolutionStrategy<A::Item, B::Item>>,
        map: CorrespondenceMap<A::Id, B::Id>,
    ) -> Self {
        info!(
            side_a = %config.side_names.a,
            side_b = %config.side_names.b,
            strategy = strategy.name(),
            pairs = map.len(),
            "initializing sync engine"
        );
        let stats = SyncStats::start(&config.side_names.a, &config.side_names.b);
        Self {
            config,
            side_a,
            side_b,
            converters,
            strategy,
            map,
            reporter: Box::new(TracingReporter),
            stats,
        }
    }

    /// Replace the reporter.
    pub fn with_reporter<R: SyncReporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn side_a(&self) -> &A {
        &self.side_a
    }

    pub fn side_b(&self) -> &B {
        &self.side_b
    }

    /// The correspondence map as of the last run.
    pub fn map(&self) -> &CorrespondenceMap<A::Id, B::Id> {
        &self.map
    }

    /// Give back the correspondence map, e.g. to persist it.
    pub fn into_map(self) -> CorrespondenceMap<A::Id, B::Id> {
        self.map
    }

    /// Statistics of the last run.
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    // -----------------------------------------------------------------------
    // Main entry point
    // -----------------------------------------------------------------------

    /// Run a full bidirectional sync given the changes of both sides.
    ///
    /// Returns the run statistics. Per-item callback failures do not abort
    /// the run; the fatal conditions of [`SyncError`] do, leaving whatever
    /// was applied so far in place.
    pub fn sync(
        &mut self,
        changes_a: &ChangeSet<A::Id>,
        changes_b: &ChangeSet<B::Id>,
    ) -> Result<SyncStats, SyncError> {
        self.stats = SyncStats::start(&self.config.side_names.a, &self.config.side_names.b);
        info!(
            new_a = changes_a.new.len(),
            new_b = changes_b.new.len(),
            touched_a = changes_a.modified.len() + changes_a.deleted.len(),
            touched_b = changes_b.modified.len() + changes_b.deleted.len(),
            "starting sync"
        );

        let result = self.do_sync(changes_a, changes_b);

        self.stats.completed_at = Some(Utc::now());
        self.reporter
            .finished(&self.stats, result.as_ref().map(|_| ()));

        result.map(|()| self.stats.clone())
    }

    fn do_sync(
        &mut self,
        changes_a: &ChangeSet<A::Id>,
        changes_b: &ChangeSet<B::Id>,
    ) -> Result<(), SyncError> {
        changes_a.validate(Side::A)?;
        changes_b.validate(Side::B)?;

        // 1. New items.
        self.sync_new_items(changes_a, changes_b)?;

        // 2. Classification.
        let classification = ConflictDetector::classify(changes_a, changes_b, &self.map)?;
        if classification.is_empty() {
            debug!("no modified or deleted items to reconcile");
            return Ok(());
        }
        self.stats.conflicts_detected = classification.conflicts.len();

        // 3. Conflicts.
        if !classification.conflicts.is_empty() {
            if !self.strategy.can_resolve() {
                return Err(SyncError::StrategyNotReady {
                    strategy: self.strategy.name().to_string(),
                    pending: classification.conflicts.len(),
                });
            }

            let rendered: Vec<String> = classification
                .conflicts
                .iter()
                .map(|c| c.to_string())
                .collect();
            self.reporter
                .conflicts_detected(self.strategy.name(), &rendered);

            for conflict in &classification.conflicts {
                self.resolve_conflict(conflict, changes_a, changes_b)?;
            }
        }

        // 4. One-sided changes.
        for change in &classification.only_b {
            self.apply_to_a(change)?;
        }
        for change in &classification.only_a {
            self.apply_to_b(change)?;
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Phase 1: new items
    // -----------------------------------------------------------------------

    fn sync_new_items(
        &mut self,
        changes_a: &ChangeSet<A::Id>,
        changes_b: &ChangeSet<B::Id>,
    ) -> Result<(), SyncError> {
        for id_a in &changes_a.new {
            if let Some(id_b) = self.insert_into_b(id_a)? {
                self.map.insert(id_a.clone(), id_b);
            }
        }
        for id_b in &changes_b.new {
            if let Some(id_a) = self.insert_into_a(id_b)? {
                self.map.insert(id_a, id_b.clone());
            }
        }
        Ok(())
    }

    /// Fetch a new A item from A and insert its conversion into B.
    fn insert_into_b(&mut self, id_a: &A::Id) -> Result<Option<B::Id>, SyncError> {
        let Fetch::Found(item) = self.fetch_a(id_a)? else {
            debug!(id_a = %id_a, "new item no longer in A, skipping");
            return Ok(None);
        };
        let Some(converted) = self.convert_to_b(id_a, &item)? else {
            return Ok(None);
        };

        let result = self.side_b.insert(converted);
        let Some(id_b) = self.settle(Side::B, Operation::Insert, id_a, result)? else {
            return Ok(None);
        };
        self.stats.side_b.created += 1;
        debug!(id_a = %id_a, id_b = %id_b, "inserted into B");
        Ok(Some(id_b))
    }

    /// Fetch a new B item from B and insert its conversion into A.
    fn insert_into_a(&mut self, id_b: &B::Id) -> Result<Option<A::Id>, SyncError> {
        let Fetch::Found(item) = self.fetch_b(id_b)? else {
            debug!(id_b = %id_b, "new item no longer in B, skipping");
            return Ok(None);
        };
        let Some(converted) = self.convert_to_a(id_b, &item)? else {
            return Ok(None);
        };

        let result = self.side_a.insert(converted);
        let Some(id_a) = self.settle(Side::A, Operation::Insert, id_b, result)? else {
            return Ok(None);
        };
        self.stats.side_a.created += 1;
        debug!(id_b = %id_b, id_a = %id_a, "inserted into A");
        Ok(Some(id_a))
    }

    // -----------------------------------------------------------------------
    // Phase 3: conflicts
    // -----------------------------------------------------------------------

    fn resolve_conflict(
        &mut self,
        conflict: &Conflict<A::Id, B::Id>,
        changes_a: &ChangeSet<A::Id>,
        changes_b: &ChangeSet<B::Id>,
    ) -> Result<(), SyncError> {
        let Conflict { id_a, id_b, .. } = conflict;

        let fetched_a = self.fetch_a(id_a)?;
        let fetched_b = self.fetch_b(id_b)?;
        let (item_a, item_b) = match (fetched_a, fetched_b) {
            (Fetch::Failed, _) | (_, Fetch::Failed) => {
                warn!(id_a = %id_a, id_b = %id_b, "could not fetch conflicting items, leaving pair untouched");
                return Ok(());
            }
            (a, b) => (a.into_option(), b.into_option()),
        };

        let resolution = self.strategy.resolve(item_a, item_b);
        debug!(
            id_a = %id_a,
            id_b = %id_b,
            winner = ?resolution.winner(),
            deletion = resolution.is_deletion(),
            "conflict resolved"
        );

        match resolution {
            Resolution::Mix => Err(SyncError::MixedResolutionUnsupported {
                id_a: id_a.to_string(),
                id_b: id_b.to_string(),
            }),
            Resolution::A(Some(item)) => self.update_b(id_b, &item, id_a),
            Resolution::A(None) if changes_b.deleted.contains(id_b) => {
                self.map.remove_by_b(id_b);
                Ok(())
            }
            Resolution::A(None) => self.delete_b(id_b),
            Resolution::B(Some(item)) => self.update_a(id_a, &item, id_b),
            Resolution::B(None) if changes_a.deleted.contains(id_a) => {
                self.map.remove_by_a(id_a);
                Ok(())
            }
            Resolution::B(None) => self.delete_a(id_a),
        }
    }

    // -----------------------------------------------------------------------
    // Phase 4: one-sided changes
    // -----------------------------------------------------------------------

    fn apply_to_a(&mut self, change: &OneSidedChange<B::Id, A::Id>) -> Result<(), SyncError> {
        let OneSidedChange {
            id: id_b,
            correspondent: id_a,
            change,
        } = change;

        match change {
            ChangeKind::Modified => match self.fetch_b(id_b)? {
                Fetch::Found(item) => self.update_a(id_a, &item, id_b),
                Fetch::Absent => {
                    debug!(id_b = %id_b, "modified item no longer in B, skipping");
                    Ok(())
                }
                Fetch::Failed => Ok(()),
            },
            ChangeKind::Deleted => self.delete_a(id_a),
        }
    }

    fn apply_to_b(&mut self, change: &OneSidedChange<A::Id, B::Id>) -> Result<(), SyncError> {
        let OneSidedChange {
            id: id_a,
            correspondent: id_b,
            change,
        } = change;

        match change {
            ChangeKind::Modified => match self.fetch_a(id_a)? {
                Fetch::Found(item) => self.update_b(id_b, &item, id_a),
                Fetch::Absent => {
                    debug!(id_a = %id_a, "modified item no longer in A, skipping");
                    Ok(())
                }
                Fetch::Failed => Ok(()),
            },
            ChangeKind::Deleted => self.delete_b(id_b),
        }
    }

    // -----------------------------------------------------------------------
    // Guarded callbacks
    // -----------------------------------------------------------------------

    fn fetch_a(&mut self, id_a: &A::Id) -> Result<Fetch<A::Item>, SyncError> {
        let result = self.side_a.get(id_a);
        Ok(match self.settle(Side::A, Operation::Get, id_a, result)? {
            Some(Some(item)) => Fetch::Found(item),
            Some(None) => Fetch::Absent,
            None => Fetch::Failed,
        })
    }

    fn fetch_b(&mut self, id_b: &B::Id) -> Result<Fetch<B::Item>, SyncError> {
        let result = self.side_b.get(id_b);
        Ok(match self.settle(Side::B, Operation::Get, id_b, result)? {
            Some(Some(item)) => Fetch::Found(item),
            Some(None) => Fetch::Absent,
            None => Fetch::Failed,
        })
    }

    fn convert_to_b(
        &mut self,
        origin: &A::Id,
        item: &A::Item,
    ) -> Result<Option<B::Item>, SyncError> {
        let result = self.converters.to_b(item);
        let converted = self.settle(Side::B, Operation::Convert, origin, result)?;
        if let Some(None) = converted {
            debug!(id_a = %origin, "converter skipped item");
        }
        Ok(converted.flatten())
    }

    fn convert_to_a(
        &mut self,
        origin: &B::Id,
        item: &B::Item,
    ) -> Result<Option<A::Item>, SyncError> {
        let result = self.converters.to_a(item);
        let converted = self.settle(Side::A, Operation::Convert, origin, result)?;
        if let Some(None) = converted {
            debug!(id_b = %origin, "converter skipped item");
        }
        Ok(converted.flatten())
    }

    /// Convert a B item and write it over `id_a`.
    fn update_a(&mut self, id_a: &A::Id, item: &B::Item, origin: &B::Id) -> Result<(), SyncError> {
        let Some(converted) = self.convert_to_a(origin, item)? else {
            return Ok(());
        };
        let result = self.side_a.update(id_a, converted);
        if self.settle(Side::A, Operation::Update, id_a, result)?.is_some() {
            self.stats.side_a.updated += 1;
            debug!(id_a = %id_a, id_b = %origin, "updated A");
        }
        Ok(())
    }

    /// Convert an A item and write it over `id_b`.
    fn update_b(&mut self, id_b: &B::Id, item: &A::Item, origin: &A::Id) -> Result<(), SyncError> {
        let Some(converted) = self.convert_to_b(origin, item)? else {
            return Ok(());
        };
        let result = self.side_b.update(id_b, converted);
        if self.settle(Side::B, Operation::Update, id_b, result)?.is_some() {
            self.stats.side_b.updated += 1;
            debug!(id_b = %id_b, id_a = %origin, "updated B");
        }
        Ok(())
    }

    /// Delete `id_a` from A and, on success, drop its pair.
    fn delete_a(&mut self, id_a: &A::Id) -> Result<(), SyncError> {
        let result = self.side_a.delete(id_a);
        if self.settle(Side::A, Operation::Delete, id_a, result)?.is_some() {
            self.map.remove_by_a(id_a);
            self.stats.side_a.deleted += 1;
            debug!(id_a = %id_a, "deleted from A");
        }
        Ok(())
    }

    /// Delete `id_b` from B and, on success, drop its pair.
    fn delete_b(&mut self, id_b: &B::Id) -> Result<(), SyncError> {
        let result = self.side_b.delete(id_b);
        if self.settle(Side::B, Operation::Delete, id_b, result)?.is_some() {
            self.map.remove_by_b(id_b);
            self.stats.side_b.deleted += 1;
            debug!(id_b = %id_b, "deleted from B");
        }
        Ok(())
    }

    /// Turn a callback result into `Some(value)`, or `None` after recording
    /// an isolated failure. With isolation disabled the failure aborts the
    /// run instead.
    fn settle<T>(
        &mut self,
        side: Side,
        operation: Operation,
        id: &dyn fmt::Display,
        result: anyhow::Result<T>,
    ) -> Result<Option<T>, SyncError> {
        let source = match result {
            Ok(value) => return Ok(Some(value)),
            Err(source) => source,
        };

        let id = id.to_string();
        if !self.config.isolate_failures {
            return Err(SyncError::Callback {
                side,
                operation,
                id,
                source,
            });
        }

        self.reporter.operation_failed(&OperationFailure {
            side,
            operation,
            id: &id,
            reason: &source,
        });
        self.stats.side_mut(side).errors += 1;
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Configuration-driven construction
// ---------------------------------------------------------------------------

impl<A, B> SyncEngine<A, B>
where
    A: SideAdapter,
    B: SideAdapter,
    A::Id: Serialize + DeserializeOwned,
    B::Id: Serialize + DeserializeOwned,
    A::Item: 'static,
    B::Item: 'static,
{
    /// Build an engine whose strategy comes from `config.strategy` and whose
    /// map is loaded from `config.correspondence_file` (empty when unset or
    /// not written yet). Recency strategies need `dates`.
    pub fn from_config(
        config: SyncConfig,
        side_a: A,
        side_b: B,
        converters: Converters<A::Item, B::Item>,
        dates: Option<(DateGetter<A::Item>, DateGetter<B::Item>)>,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        if dates.is_some() && !config.strategy.needs_dates() {
            debug!(strategy = %config.strategy, "strategy ignores the date getters");
        }
        let strategy = config.strategy.build(dates)?;

        let map = match &config.correspondence_file {
            Some(path) => MapFile::load_or_default(path)?,
            None => CorrespondenceMap::new(),
        };

        Ok(Self::new(config, side_a, side_b, converters, strategy, map))
    }

    /// Persist the map to `config.correspondence_file`. Returns `false` when
    /// no file is configured.
    pub fn save_map(&self) -> Result<bool, MapError> {
        let Some(path) = &self.config.correspondence_file else {
            debug!("no correspondence file configured, map not saved");
            return Ok(false);
        };
        MapFile::save(path, &self.map)?;
        Ok(true)
    }
}
