//! Error types for the itemsync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

use crate::models::{Operation, Side};

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Sync engine errors
// ---------------------------------------------------------------------------

/// Conditions that abort a reconciliation run.
///
/// Per-item callback failures are normally recovered inside the engine and
/// only show up in the run statistics; they surface here as
/// [`SyncError::Callback`] only when failure isolation is switched off.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The resolution strategy asked for a merged item, which is not supported.
    #[error("mixed resolution is not supported (conflict [A] {id_a} / [B] {id_b})")]
    MixedResolutionUnsupported { id_a: String, id_b: String },

    /// A touched identifier has no correspondent in the map.
    #[error("no correspondent for {side} side identifier '{id}'")]
    CorrespondenceLookup { side: Side, id: String },

    /// A touched identifier is neither modified nor deleted.
    #[error("identifier '{id}' on {side} side is touched but neither modified nor deleted")]
    InvariantViolation { side: Side, id: String },

    /// The same identifier appears in more than one category of a change set.
    #[error("identifier '{id}' appears in more than one category of the {side} side change set")]
    OverlappingChangeSet { side: Side, id: String },

    /// The resolution strategy is not ready while conflicts are pending.
    #[error("resolution strategy '{strategy}' is not ready to resolve {pending} conflict(s)")]
    StrategyNotReady { strategy: String, pending: usize },

    /// A callback failed and failure isolation is disabled.
    #[error("{operation} on {side} side failed for '{id}': {source}")]
    Callback {
        side: Side,
        operation: Operation,
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

// ---------------------------------------------------------------------------
// Correspondence map errors
// ---------------------------------------------------------------------------

/// Errors from the correspondence map and its file persistence.
#[derive(Debug, Error)]
pub enum MapError {
    /// No pair exists for the given identifier.
    #[error("{side} side identifier '{id}' not found in correspondence map")]
    NotFound { side: Side, id: String },

    /// The persisted map does not describe a bijection.
    #[error("duplicate {side} side identifier '{id}' in correspondence file")]
    DuplicateEntry { side: Side, id: String },

    /// The map file could not be loaded.
    #[error("correspondence file error at '{path}': {detail}")]
    FileError { path: String, detail: String },

    /// TOML / JSON (de)serialization failure.
    #[error("correspondence file parse error: {0}")]
    ParseError(String),

    /// Generic I/O error.
    #[error("correspondence I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SyncError {
    /// Whether this error came from a single failed callback rather than a
    /// programmatic inconsistency.
    pub fn is_callback_failure(&self) -> bool {
        matches!(self, Self::Callback { .. })
    }
}
