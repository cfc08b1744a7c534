//! Shared fixtures for the integration tests: in-memory stores keyed by
//! string identifiers, closure adapters over them and a recording reporter.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::rc::Rc;

use itemsync_core::errors::SyncError;
use itemsync_core::report::{OperationFailure, SyncReporter, SyncStats};
use itemsync_core::{
    Converters, CorrespondenceMap, FnSide, Operation, ResolutionStrategy, Side, SyncConfig,
    SyncEngine,
};

pub type Store<T> = Rc<RefCell<BTreeMap<String, T>>>;
pub type Engine<A, B> = SyncEngine<FnSide<String, A>, FnSide<String, B>>;

/// Item carrying a single value. The inserter keys items by that value.
pub trait TestItem: Clone + Debug + 'static {
    fn from_val(val: String) -> Self;
    fn val(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ItemA(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ItemB(pub String);

impl TestItem for ItemA {
    fn from_val(val: String) -> Self {
        Self(val)
    }
    fn val(&self) -> &str {
        &self.0
    }
}

impl TestItem for ItemB {
    fn from_val(val: String) -> Self {
        Self(val)
    }
    fn val(&self) -> &str {
        &self.0
    }
}

/// A store holding `id -> item(id)` for every given id.
pub fn store<T: TestItem>(ids: impl IntoIterator<Item = impl ToString>) -> Store<T> {
    Rc::new(RefCell::new(
        ids.into_iter()
            .map(|id| {
                let id = id.to_string();
                (id.clone(), T::from_val(id))
            })
            .collect(),
    ))
}

/// A store with explicit `(id, value)` entries.
pub fn store_with<T: TestItem>(entries: &[(&str, &str)]) -> Store<T> {
    Rc::new(RefCell::new(
        entries
            .iter()
            .map(|(id, val)| (id.to_string(), T::from_val(val.to_string())))
            .collect(),
    ))
}

/// Store contents as `id -> value`, comparable across sides.
pub fn snapshot<T: TestItem>(store: &Store<T>) -> BTreeMap<String, String> {
    store
        .borrow()
        .iter()
        .map(|(id, item)| (id.clone(), item.val().to_string()))
        .collect()
}

pub fn ids(ids: impl IntoIterator<Item = impl ToString>) -> Vec<String> {
    ids.into_iter().map(|id| id.to_string()).collect()
}

/// Adapter over a store. Updates upsert; deleting a missing id fails.
pub fn side<T: TestItem>(store: &Store<T>) -> FnSide<String, T> {
    let (g, i, u, d) = (store.clone(), store.clone(), store.clone(), store.clone());
    FnSide::new(
        move |id: &String| Ok(g.borrow().get(id).cloned()),
        move |item: T| {
            let id = item.val().to_string();
            i.borrow_mut().insert(id.clone(), item);
            Ok(id)
        },
        move |id: &String, item: T| {
            u.borrow_mut().insert(id.clone(), item);
            Ok(())
        },
        move |id: &String| {
            d.borrow_mut()
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| anyhow::anyhow!("'{id}' is not in the store"))
        },
    )
}

pub fn converters<A: TestItem, B: TestItem>() -> Converters<A, B> {
    Converters::infallible(
        |b: &B| A::from_val(b.val().to_string()),
        |a: &A| B::from_val(a.val().to_string()),
    )
}

/// Identity map over every id present in either store plus `deleted`,
/// which still have pairs even though their items are gone.
pub fn identity_map<A: TestItem, B: TestItem>(
    store_a: &Store<A>,
    store_b: &Store<B>,
    deleted: &[&str],
) -> CorrespondenceMap<String, String> {
    store_a
        .borrow()
        .keys()
        .chain(store_b.borrow().keys())
        .cloned()
        .chain(deleted.iter().map(|id| id.to_string()))
        .map(|id| (id.clone(), id))
        .collect()
}

pub fn engine<A: TestItem, B: TestItem>(
    store_a: &Store<A>,
    store_b: &Store<B>,
    strategy: Box<dyn ResolutionStrategy<A, B>>,
    deleted: &[&str],
) -> Engine<A, B> {
    SyncEngine::new(
        SyncConfig::default(),
        side(store_a),
        side(store_b),
        converters(),
        strategy,
        identity_map(store_a, store_b, deleted),
    )
}

// ---------------------------------------------------------------------------
// Recording reporter
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Recorded {
    pub failures: Vec<(Side, Operation, String)>,
    pub conflicts: Vec<String>,
    /// Stats and whether the run completed, one entry per `sync` call.
    pub finished: Vec<(SyncStats, bool)>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    pub recorded: Rc<RefCell<Recorded>>,
}

impl SyncReporter for RecordingReporter {
    fn operation_failed(&self, failure: &OperationFailure<'_>) {
        self.recorded.borrow_mut().failures.push((
            failure.side,
            failure.operation,
            failure.id.to_string(),
        ));
    }

    fn conflicts_detected(&self, _strategy: &str, conflicts: &[String]) {
        self.recorded
            .borrow_mut()
            .conflicts
            .extend(conflicts.iter().cloned());
    }

    fn finished(&self, stats: &SyncStats, outcome: Result<(), &SyncError>) {
        self.recorded
            .borrow_mut()
            .finished
            .push((stats.clone(), outcome.is_ok()));
    }
}
