//! Configuration types.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default inline budget of a trampoline, in bytes (16 machine words).
pub const DEFAULT_INLINE_CAPACITY: usize = 16 * std::mem::size_of::<usize>();

/// Trampoline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrampolineConfig {
    /// Inline storage per closure, dispatch overhead included
    pub inline_capacity: usize,
}

impl Default for TrampolineConfig {
    fn default() -> Self {
        Self {
            inline_capacity: DEFAULT_INLINE_CAPACITY,
        }
    }
}

/// Top-level configuration (asmpatch.toml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    pub trampoline: TrampolineConfig,
}

impl PatchConfig {
    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PatchConfig::default();
        assert_eq!(config.trampoline.inline_capacity, DEFAULT_INLINE_CAPACITY);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(PatchConfig::from_toml_str("").unwrap(), PatchConfig::default());
    }

    #[test]
    fn test_parse_capacity() {
        let config = PatchConfig::from_toml_str("[trampoline]\ninline_capacity = 256\n").unwrap();
        assert_eq!(config.trampoline.inline_capacity, 256);
    }

    #[test]
    fn test_reject_bad_type() {
        let err = PatchConfig::from_toml_str("[trampoline]\ninline_capacity = \"big\"\n");
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asmpatch.toml");
        fs::write(&path, "[trampoline]\ninline_capacity = 64\n").unwrap();

        let config = PatchConfig::load(&path).unwrap();
        assert_eq!(config.trampoline.inline_capacity, 64);
        assert!(matches!(
            PatchConfig::load(&dir.path().join("missing.toml")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_round_trip_toml() {
        let config = PatchConfig {
            trampoline: TrampolineConfig {
                inline_capacity: 96,
            },
        };
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("inline_capacity = 96"));
        assert_eq!(PatchConfig::from_toml_str(&text).unwrap(), config);
    }
}
