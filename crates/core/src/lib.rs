//! itemsync core library.
//!
//! This crate reconciles two independent item stores bidirectionally:
//! change sets, the persistent correspondence map between both identifier
//! spaces, conflict classification and resolution strategies, caller-supplied
//! store adapters, run statistics and the sync engine that ties them together.

pub mod adapter;
pub mod changes;
pub mod config;
pub mod conflict;
pub mod correspondence;
pub mod errors;
pub mod models;
pub mod report;
pub mod sync_engine;

// Re-exports for convenience.
pub use adapter::{Converters, FnSide, SideAdapter};
pub use changes::{ChangeKind, ChangeSet};
pub use config::SyncConfig;
pub use conflict::{
    AlwaysFirst, AlwaysSecond, Recency, Resolution, ResolutionStrategy, StrategyKind,
};
pub use correspondence::{CorrespondenceMap, MapFile};
pub use errors::{CoreError, SyncError};
pub use models::{Identifier, Operation, Side};
pub use report::{SyncReporter, SyncStats, TracingReporter};
pub use sync_engine::SyncEngine;
