//! Resolution strategies for items touched on both sides.
//!
//! A [`ResolutionStrategy`] receives the current item of each side (`None`
//! meaning the item is gone from that side) and decides which side wins.
//! A winner whose item is `None` means "the deletion wins": the engine
//! deletes the other side's item.
//!
//! Built-in strategies:
//! - [`AlwaysFirst`] / [`AlwaysSecond`]: a fixed side always wins.
//! - [`Recency`]: compares a date extracted from each item
//!   ([`Recency::most_recent`] or [`Recency::least_recent`]).
//!
//! [`StrategyKind`] names the built-ins so they can be picked from
//! configuration.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Resolution result
// ---------------------------------------------------------------------------

/// Which side a resolution picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    A,
    B,
    /// A synthesized item built from both sides. Reserved; the engine
    /// rejects it.
    Mix,
}

/// Outcome of resolving one conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<ItemA, ItemB> {
    /// Side A wins. `None` means A's deletion wins.
    A(Option<ItemA>),
    /// Side B wins. `None` means B's deletion wins.
    B(Option<ItemB>),
    /// Reserved for merged results.
    Mix,
}

impl<ItemA, ItemB> Resolution<ItemA, ItemB> {
    pub fn winner(&self) -> Winner {
        match self {
            Self::A(_) => Winner::A,
            Self::B(_) => Winner::B,
            Self::Mix => Winner::Mix,
        }
    }

    /// True when the winning side has no item, i.e. the conflict resolves to
    /// deleting the losing side.
    pub fn is_deletion(&self) -> bool {
        matches!(self, Self::A(None) | Self::B(None))
    }
}

// ---------------------------------------------------------------------------
// Strategy trait
// ---------------------------------------------------------------------------

/// Policy that picks a winner when both sides touched the same item.
///
/// `resolve` must be a pure function of its two inputs and must handle every
/// presence combination without failing.
pub trait ResolutionStrategy<ItemA, ItemB> {
    /// Name used in logs and reports.
    fn name(&self) -> &str;

    /// Whether the strategy is ready to resolve. Strategies that need
    /// external state can return `false` until it is available.
    fn can_resolve(&self) -> bool {
        true
    }

    fn resolve(&self, item_a: Option<ItemA>, item_b: Option<ItemB>) -> Resolution<ItemA, ItemB>;
}

// ---------------------------------------------------------------------------
// Fixed-side strategies
// ---------------------------------------------------------------------------

/// Side A always wins, including when A's item was deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFirst;

impl<ItemA, ItemB> ResolutionStrategy<ItemA, ItemB> for AlwaysFirst {
    fn name(&self) -> &str {
        "AlwaysFirst"
    }

    fn resolve(&self, item_a: Option<ItemA>, _item_b: Option<ItemB>) -> Resolution<ItemA, ItemB> {
        Resolution::A(item_a)
    }
}

/// Side B always wins, including when B's item was deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSecond;

impl<ItemA, ItemB> ResolutionStrategy<ItemA, ItemB> for AlwaysSecond {
    fn name(&self) -> &str {
        "AlwaysSecond"
    }

    fn resolve(&self, _item_a: Option<ItemA>, item_b: Option<ItemB>) -> Resolution<ItemA, ItemB> {
        Resolution::B(item_b)
    }
}

// ---------------------------------------------------------------------------
// Recency strategies
// ---------------------------------------------------------------------------

/// Extracts the date used to compare an item.
pub type DateGetter<Item> = Box<dyn Fn(&Item) -> DateTime<Utc>>;

/// Decides whether A's date beats B's date.
pub type DateComparator = fn(&DateTime<Utc>, &DateTime<Utc>) -> bool;

/// Date-based strategy.
///
/// - both items absent: A wins (stable fallback).
/// - one item absent: the present side wins; a deletion never overrides a
///   surviving item.
/// - both present: A wins when `a_wins(date_a, date_b)` holds, B otherwise.
pub struct Recency<ItemA, ItemB> {
    name: &'static str,
    date_a: DateGetter<ItemA>,
    date_b: DateGetter<ItemB>,
    a_wins: DateComparator,
}

impl<ItemA, ItemB> Recency<ItemA, ItemB> {
    pub fn new(
        name: &'static str,
        date_a: DateGetter<ItemA>,
        date_b: DateGetter<ItemB>,
        a_wins: DateComparator,
    ) -> Self {
        Self {
            name,
            date_a,
            date_b,
            a_wins,
        }
    }

    /// The item with the later date wins; ties go to A.
    pub fn most_recent(date_a: DateGetter<ItemA>, date_b: DateGetter<ItemB>) -> Self {
        Self::new("MostRecent", date_a, date_b, |a, b| a >= b)
    }

    /// The item with the earlier date wins; ties go to A.
    pub fn least_recent(date_a: DateGetter<ItemA>, date_b: DateGetter<ItemB>) -> Self {
        Self::new("LeastRecent", date_a, date_b, |a, b| a <= b)
    }
}

impl<ItemA, ItemB> fmt::Debug for Recency<ItemA, ItemB> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recency").field("name", &self.name).finish()
    }
}

impl<ItemA, ItemB> ResolutionStrategy<ItemA, ItemB> for Recency<ItemA, ItemB> {
    fn name(&self) -> &str {
        self.name
    }

    fn resolve(&self, item_a: Option<ItemA>, item_b: Option<ItemB>) -> Resolution<ItemA, ItemB> {
        match (item_a, item_b) {
            (None, None) => Resolution::A(None),
            (None, Some(b)) => Resolution::B(Some(b)),
            (Some(a), None) => Resolution::A(Some(a)),
            (Some(a), Some(b)) => {
                if (self.a_wins)(&(self.date_a)(&a), &(self.date_b)(&b)) {
                    Resolution::A(Some(a))
                } else {
                    Resolution::B(Some(b))
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Registry of built-ins
// ---------------------------------------------------------------------------

/// Names of the built-in strategies, as used in configuration files.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    AlwaysFirst,
    AlwaysSecond,
    MostRecent,
    LeastRecent,
}

impl StrategyKind {
    /// Every built-in strategy.
    pub const ALL: [StrategyKind; 4] = [
        Self::AlwaysFirst,
        Self::AlwaysSecond,
        Self::MostRecent,
        Self::LeastRecent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlwaysFirst => "always_first",
            Self::AlwaysSecond => "always_second",
            Self::MostRecent => "most_recent",
            Self::LeastRecent => "least_recent",
        }
    }

    /// Whether building this strategy needs date getters.
    pub fn needs_dates(self) -> bool {
        matches!(self, Self::MostRecent | Self::LeastRecent)
    }

    /// Instantiate the strategy. Recency strategies require `dates`; the
    /// fixed-side ones ignore it.
    pub fn build<ItemA: 'static, ItemB: 'static>(
        self,
        dates: Option<(DateGetter<ItemA>, DateGetter<ItemB>)>,
    ) -> Result<Box<dyn ResolutionStrategy<ItemA, ItemB>>, ConfigError> {
        match (self, dates) {
            (Self::AlwaysFirst, _) => Ok(Box::new(AlwaysFirst)),
            (Self::AlwaysSecond, _) => Ok(Box::new(AlwaysSecond)),
            (Self::MostRecent, Some((a, b))) => Ok(Box::new(Recency::most_recent(a, b))),
            (Self::LeastRecent, Some((a, b))) => Ok(Box::new(Recency::least_recent(a, b))),
            (kind, None) => Err(ConfigError::InvalidValue {
                field: "strategy".into(),
                detail: format!("'{kind}' needs a date getter for each side"),
            }),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "strategy".into(),
                detail: format!(
                    "unknown strategy '{s}', expected one of: {}",
                    Self::ALL.map(|k| k.as_str()).join(", ")
                ),
            })
    }
}
