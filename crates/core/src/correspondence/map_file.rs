//! File persistence for the correspondence map.
//!
//! The map is stored as a list of pairs. TOML is the default format:
//!
//! ```toml
//! [[pairs]]
//! a = "task-17"
//! b = "evt_8f2c"
//! ```
//!
//! Files with a `.json` extension are written as `{"pairs": [{"a": .., "b": ..}]}`.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::map::CorrespondenceMap;
use crate::errors::MapError;
use crate::models::Identifier;

/// A single persisted pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairEntry<IdA, IdB> {
    pub a: IdA,
    pub b: IdB,
}

/// Wrapper around the on-disk structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapFileData<IdA, IdB> {
    #[serde(default = "Vec::new")]
    pub pairs: Vec<PairEntry<IdA, IdB>>,
}

/// Utilities for loading and saving a [`CorrespondenceMap`].
pub struct MapFile;

impl MapFile {
    /// Load a map from disk. Fails if the file describes anything other
    /// than a bijection.
    pub fn load<IdA, IdB, P>(path: P) -> Result<CorrespondenceMap<IdA, IdB>, MapError>
    where
        IdA: Identifier + DeserializeOwned,
        IdB: Identifier + DeserializeOwned,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        info!(path = %path.display(), "loading correspondence file");

        if !path.exists() {
            return Err(MapError::FileError {
                path: path.display().to_string(),
                detail: "file not found".into(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let data: MapFileData<IdA, IdB> = if is_json(path) {
            serde_json::from_str(&contents).map_err(|e| MapError::ParseError(e.to_string()))?
        } else {
            toml::from_str(&contents).map_err(|e| MapError::ParseError(e.to_string()))?
        };

        let map = CorrespondenceMap::try_from_pairs(data.pairs.into_iter().map(|p| (p.a, p.b)))?;
        debug!(count = map.len(), "loaded correspondence pairs");
        Ok(map)
    }

    /// Load a map, or start an empty one if the file does not exist yet.
    pub fn load_or_default<IdA, IdB, P>(path: P) -> Result<CorrespondenceMap<IdA, IdB>, MapError>
    where
        IdA: Identifier + DeserializeOwned,
        IdB: Identifier + DeserializeOwned,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no correspondence file yet, starting empty");
            Ok(CorrespondenceMap::new())
        }
    }

    /// Write the map to disk, replacing any existing file.
    pub fn save<IdA, IdB, P>(path: P, map: &CorrespondenceMap<IdA, IdB>) -> Result<(), MapError>
    where
        IdA: Identifier + Serialize,
        IdB: Identifier + Serialize,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        info!(path = %path.display(), "saving correspondence file");

        let data = MapFileData {
            pairs: map
                .iter()
                .map(|(a, b)| PairEntry { a, b })
                .collect::<Vec<_>>(),
        };

        let contents = if is_json(path) {
            serde_json::to_string_pretty(&data).map_err(|e| MapError::ParseError(e.to_string()))?
        } else {
            toml::to_string_pretty(&data).map_err(|e| MapError::ParseError(e.to_string()))?
        };
        std::fs::write(path, contents)?;

        debug!(count = map.len(), "saved correspondence pairs");
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
