//! Conflict classification and resolution.
//!
//! The conflict subsystem is responsible for:
//! 1. **Detection** -- mapping both sides' touched identifiers through the
//!    correspondence map to find items changed on both sides.
//! 2. **Resolution** -- pluggable strategies that pick the winning side.

pub mod detector;
pub mod resolver;

pub use detector::{Classification, Conflict, ConflictDetector, OneSidedChange};
pub use resolver::{
    AlwaysFirst, AlwaysSecond, DateGetter, Recency, Resolution, ResolutionStrategy, StrategyKind,
    Winner,
};
