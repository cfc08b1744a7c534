//! Small domain types shared by the change sets, the correspondence map and
//! the sync engine.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// An opaque identifier, unique within one side.
///
/// Blanket-implemented for every type that can be hashed, compared, cloned
/// and rendered; `String` and the integer types all qualify.
pub trait Identifier: Clone + Eq + Hash + fmt::Debug + fmt::Display {}

impl<T> Identifier for T where T: Clone + Eq + Hash + fmt::Debug + fmt::Display {}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// One of the two stores being reconciled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// A caller-supplied callback the engine can invoke.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Get,
    Insert,
    Update,
    Delete,
    Convert,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Convert => write!(f, "convert"),
        }
    }
}
