//! Per-trace configuration
//!
//! A [`TracerConfig`] fixes the synthetic memory layout (stack and heap bases,
//! heap padding) and its limits. An array or block over `max_region_bytes`
//! is explained and skipped; running out of stack fails the trace. Every field has a default, so an empty
//! TOML document is a valid config.

use super::constants::{
    DEFAULT_MALLOC_BYTES, HEAP_BASE, HEAP_PADDING, MAX_REGION_BYTES, MAX_STACK_BYTES, STACK_BASE,
};
use super::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TracerConfig {
    pub stack_base: u64,
    pub heap_base: u64,
    pub heap_padding: u64,
    pub default_malloc_bytes: usize,
    pub max_region_bytes: usize,
    pub max_stack_bytes: usize,
}

impl Default for TracerConfig {
    fn default() -> Self {
        TracerConfig {
            stack_base: STACK_BASE,
            heap_base: HEAP_BASE,
            heap_padding: HEAP_PADDING,
            default_malloc_bytes: DEFAULT_MALLOC_BYTES,
            max_region_bytes: MAX_REGION_BYTES,
            max_stack_bytes: MAX_STACK_BYTES,
        }
    }
}

impl TracerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: TracerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stack_bytes as u64 > self.stack_base {
            return Err(ConfigError::Invalid {
                field: "max_stack_bytes",
                reason: format!(
                    "{} bytes of stack would run below address 0 from base {:#x}",
                    self.max_stack_bytes, self.stack_base
                ),
            });
        }
        if self.max_region_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_region_bytes",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = TracerConfig::from_toml_str("").unwrap();
        assert_eq!(config, TracerConfig::default());
        assert_eq!(config.stack_base, 0x7fff_ffff_de00);
        assert_eq!(config.heap_padding, 16);
    }

    #[test]
    fn test_partial_override() {
        let config = TracerConfig::from_toml_str("heap_padding = 0\ndefault_malloc_bytes = 8\n").unwrap();
        assert_eq!(config.heap_padding, 0);
        assert_eq!(config.default_malloc_bytes, 8);
        assert_eq!(config.heap_base, HEAP_BASE);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = TracerConfig::from_toml_str("stack_size = 4").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation() {
        let err = TracerConfig::from_toml_str("stack_base = 16\nmax_stack_bytes = 32").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "max_stack_bytes",
                ..
            }
        ));

        let err = TracerConfig::from_toml_str("max_region_bytes = 0").unwrap_err();
        assert!(err.to_string().contains("max_region_bytes"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "heap_base = 4096").unwrap();

        let config = TracerConfig::load(file.path()).unwrap();
        assert_eq!(config.heap_base, 4096);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TracerConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
