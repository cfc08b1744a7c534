//! The correspondence map: the only state that survives between runs.
//!
//! - [`map`] holds the in-memory bijection between A and B identifiers.
//! - [`map_file`] loads and saves it as TOML or JSON.

pub mod map;
pub mod map_file;

pub use map::CorrespondenceMap;
pub use map_file::MapFile;
