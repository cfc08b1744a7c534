//! TOML-based configuration for the sync engine.
//!
//! ```toml
//! isolate_failures = true
//! strategy = "most_recent"
//! correspondence_file = "/var/lib/itemsync/map.toml"
//!
//! [side_names]
//! a = "Taskwarrior"
//! b = "Google Calendar"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::conflict::StrategyKind;
use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Names used for each side in statistics and logs.
    #[serde(default)]
    pub side_names: SideNames,

    /// Recover from individual callback failures instead of aborting the run.
    #[serde(default = "default_true")]
    pub isolate_failures: bool,

    /// Built-in resolution strategy to use.
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Where the correspondence map is persisted between runs.
    #[serde(default)]
    pub correspondence_file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            side_names: SideNames::default(),
            isolate_failures: true,
            strategy: StrategyKind::default(),
            correspondence_file: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Side names
// ---------------------------------------------------------------------------

/// Display names for the two sides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SideNames {
    #[serde(default = "default_name_a")]
    pub a: String,

    #[serde(default = "default_name_b")]
    pub b: String,
}

fn default_name_a() -> String {
    "A Side".into()
}
fn default_name_b() -> String {
    "B Side".into()
}

impl Default for SideNames {
    fn default() -> Self {
        Self {
            a: default_name_a(),
            b: default_name_b(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl SyncConfig {
    /// Load a [`SyncConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: SyncConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Validate that the values are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.side_names.a.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "side_names.a".into(),
                detail: "side name must not be empty".into(),
            });
        }
        if self.side_names.b.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "side_names.b".into(),
                detail: "side name must not be empty".into(),
            });
        }
        if self.side_names.a == self.side_names.b {
            return Err(ConfigError::InvalidValue {
                field: "side_names".into(),
                detail: format!("both sides are named '{}'", self.side_names.a),
            });
        }
        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
isolate_failures = false
strategy = "least_recent"
correspondence_file = "/tmp/itemsync/map.toml"

[side_names]
a = "Taskwarrior"
b = "Google Calendar"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: SyncConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert!(!config.isolate_failures);
        assert_eq!(config.strategy, StrategyKind::LeastRecent);
        assert_eq!(config.side_names.b, "Google Calendar");
        assert_eq!(
            config.correspondence_file.as_deref(),
            Some(Path::new("/tmp/itemsync/map.toml"))
        );
    }

    #[test]
    fn test_defaults() {
        let config: SyncConfig = toml::from_str("").unwrap();
        assert!(config.isolate_failures);
        assert_eq!(config.strategy, StrategyKind::AlwaysFirst);
        assert_eq!(config.side_names, SideNames::default());
        assert_eq!(config.side_names.a, "A Side");
        assert!(config.correspondence_file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("itemsync.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = SyncConfig::load_and_validate(&path).expect("load failed");
        assert_eq!(config.side_names.a, "Taskwarrior");
    }

    #[test]
    fn test_file_not_found() {
        let result = SyncConfig::load_from_file("/nonexistent/itemsync.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_unknown_strategy_is_parse_error() {
        let result: Result<SyncConfig, _> = toml::from_str(r#"strategy = "coin_flip""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let mut config = SyncConfig::default();
        config.side_names.a = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "side_names.a"
        ));

        let mut config = SyncConfig::default();
        config.side_names.b = config.side_names.a.clone();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "side_names"
        ));
    }
}
