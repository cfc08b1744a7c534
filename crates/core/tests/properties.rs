//! Property-based tests.
//!
//! - The correspondence map stays a bijection under any sequence of
//!   inserts and removals.
//! - Classification partitions touched items into conflicts and one-sided
//!   changes.
//! - A sync run on stores that agreed before leaves them agreeing again.
//! - Recency strategies always pick the side with the winning date.

mod common;

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, TimeZone, Utc};
use itemsync_core::conflict::{ConflictDetector, Recency, Winner};
use itemsync_core::{AlwaysFirst, AlwaysSecond, ChangeSet, CorrespondenceMap, ResolutionStrategy};
use proptest::prelude::*;

use common::*;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

#[derive(Debug, Clone)]
enum MapOp {
    Insert(u8, u8),
    RemoveA(u8),
    RemoveB(u8),
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        3 => (0u8..16, 0u8..16).prop_map(|(a, b)| MapOp::Insert(a, b)),
        1 => (0u8..16).prop_map(MapOp::RemoveA),
        1 => (0u8..16).prop_map(MapOp::RemoveB),
    ]
}

/// What happened to one logical item on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Touch {
    None,
    Modified,
    Deleted,
}

fn touch_strategy() -> impl Strategy<Value = Touch> {
    prop_oneof![Just(Touch::None), Just(Touch::Modified), Just(Touch::Deleted)]
}

fn date_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn change_set(touches: &[Touch]) -> ChangeSet<String> {
    let mut changes = ChangeSet::new();
    for (i, touch) in touches.iter().enumerate() {
        match touch {
            Touch::None => {}
            Touch::Modified => {
                changes.modified.insert(i.to_string());
            }
            Touch::Deleted => {
                changes.deleted.insert(i.to_string());
            }
        }
    }
    changes
}

// =============================================================================
// CORRESPONDENCE MAP
// =============================================================================

proptest! {
    #[test]
    fn map_stays_bijective(ops in prop::collection::vec(map_op_strategy(), 0..64)) {
        let mut map: CorrespondenceMap<u8, u8> = CorrespondenceMap::new();
        for op in ops {
            match op {
                MapOp::Insert(a, b) => {
                    map.insert(a, b);
                    prop_assert_eq!(map.lookup_by_a(&a).ok(), Some(&b));
                    prop_assert_eq!(map.lookup_by_b(&b).ok(), Some(&a));
                }
                MapOp::RemoveA(a) => {
                    map.remove_by_a(&a);
                    prop_assert!(!map.contains_a(&a));
                }
                MapOp::RemoveB(b) => {
                    map.remove_by_b(&b);
                    prop_assert!(!map.contains_b(&b));
                }
            }

            let a_side: HashSet<u8> = map.iter().map(|(a, _)| *a).collect();
            let b_side: HashSet<u8> = map.iter().map(|(_, b)| *b).collect();
            prop_assert_eq!(a_side.len(), map.len());
            prop_assert_eq!(b_side.len(), map.len());
            for (a, b) in map.iter() {
                prop_assert_eq!(map.lookup_by_b(b).ok(), Some(a));
            }
        }
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

proptest! {
    #[test]
    fn classification_partitions_touched_items(
        touches in prop::collection::vec((touch_strategy(), touch_strategy()), 0..24)
    ) {
        let (touch_a, touch_b): (Vec<Touch>, Vec<Touch>) = touches.iter().copied().unzip();
        let changes_a = change_set(&touch_a);
        let changes_b = change_set(&touch_b);
        let map: CorrespondenceMap<String, String> =
            (0..touches.len()).map(|i| (i.to_string(), i.to_string())).collect();

        let result = ConflictDetector::classify(&changes_a, &changes_b, &map).unwrap();

        for (i, (a, b)) in touches.iter().enumerate() {
            let id = i.to_string();
            let in_conflicts = result.conflicts.iter().any(|c| c.id_a == id);
            let in_only_a = result.only_a.iter().any(|c| c.id == id);
            let in_only_b = result.only_b.iter().any(|c| c.id == id);

            let touched_a = *a != Touch::None;
            let touched_b = *b != Touch::None;
            prop_assert_eq!(in_conflicts, touched_a && touched_b);
            prop_assert_eq!(in_only_a, touched_a && !touched_b);
            prop_assert_eq!(in_only_b, touched_b && !touched_a);
        }
    }
}

// =============================================================================
// CONVERGENCE
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Both stores start identical, then each side independently modifies
    /// or deletes items. After the run both stores hold the same entries.
    #[test]
    fn sync_converges(
        touches in prop::collection::vec((touch_strategy(), touch_strategy()), 1..16),
        new_a in prop::collection::btree_set(100u32..120, 0..4),
        new_b in prop::collection::btree_set(200u32..220, 0..4),
        prefer_a in any::<bool>(),
    ) {
        let base: Vec<String> = (0..touches.len()).map(|i| i.to_string()).collect();
        let store_a: Store<ItemA> = store(&base);
        let store_b: Store<ItemB> = store(&base);

        for (i, (a, b)) in touches.iter().enumerate() {
            let id = i.to_string();
            match a {
                Touch::None => {}
                Touch::Modified => {
                    store_a.borrow_mut().insert(id.clone(), ItemA(format!("{i}_by_A")));
                }
                Touch::Deleted => {
                    store_a.borrow_mut().remove(&id);
                }
            }
            match b {
                Touch::None => {}
                Touch::Modified => {
                    store_b.borrow_mut().insert(id.clone(), ItemB(format!("{i}_by_B")));
                }
                Touch::Deleted => {
                    store_b.borrow_mut().remove(&id);
                }
            }
        }
        for id in &new_a {
            store_a.borrow_mut().insert(id.to_string(), ItemA(id.to_string()));
        }
        for id in &new_b {
            store_b.borrow_mut().insert(id.to_string(), ItemB(id.to_string()));
        }

        let (touch_a, touch_b): (Vec<Touch>, Vec<Touch>) = touches.iter().copied().unzip();
        let changes_a = change_set(&touch_a).with_new(ids(&new_a));
        let changes_b = change_set(&touch_b).with_new(ids(&new_b));

        let strategy: Box<dyn ResolutionStrategy<ItemA, ItemB>> = if prefer_a {
            Box::new(AlwaysFirst)
        } else {
            Box::new(AlwaysSecond)
        };
        let base_refs: Vec<&str> = base.iter().map(String::as_str).collect();
        let mut engine = engine(&store_a, &store_b, strategy, &base_refs);
        let stats = engine.sync(&changes_a, &changes_b).unwrap();

        prop_assert_eq!(snapshot(&store_a), snapshot(&store_b));
        prop_assert_eq!(stats.total_errors(), 0);

        let mapped: BTreeSet<String> = engine.map().iter().map(|(a, _)| a.clone()).collect();
        let stored: BTreeSet<String> = store_a.borrow().keys().cloned().collect();
        prop_assert_eq!(mapped, stored);
    }
}

// =============================================================================
// RECENCY
// =============================================================================

proptest! {
    #[test]
    fn recency_picks_winning_date(da in date_strategy(), db in date_strategy()) {
        let most = Recency::most_recent(
            Box::new(|d: &DateTime<Utc>| *d),
            Box::new(|d: &DateTime<Utc>| *d),
        );
        let least = Recency::least_recent(
            Box::new(|d: &DateTime<Utc>| *d),
            Box::new(|d: &DateTime<Utc>| *d),
        );

        let expected_most = if da >= db { Winner::A } else { Winner::B };
        let expected_least = if da <= db { Winner::A } else { Winner::B };
        prop_assert_eq!(most.resolve(Some(da), Some(db)).winner(), expected_most);
        prop_assert_eq!(least.resolve(Some(da), Some(db)).winner(), expected_least);

        // A surviving item always beats a deletion.
        prop_assert_eq!(most.resolve(Some(da), None).winner(), Winner::A);
        prop_assert_eq!(least.resolve(None, Some(db)).winner(), Winner::B);
    }
}
