use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Default upper bound for an encoded payload.
pub const DEFAULT_MAX_BYTES: usize = 4 * 1024 * 1024;

/// Default nesting bound while decoding models.
pub const DEFAULT_MAX_DEPTH: usize = 64;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{field}': must be greater than zero")]
    ZeroLimit { field: &'static str },
}

///
/// DecodeConfig
///
/// Limits applied to untrusted input.
/// `max_bytes` bounds CBOR payloads; `max_depth` bounds nested model decode.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeConfig {
    pub max_bytes: usize,
    pub max_depth: usize,
}

impl DecodeConfig {
    /// Read limits from the optional `[decode]` table of a TOML document.
    /// Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        struct Document {
            #[serde(default)]
            decode: DecodeConfig,
        }

        let config = toml::from_str::<Document>(source)?.decode;
        config.validate()?;

        Ok(config)
    }

    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::ZeroLimit { field: "max_bytes" });
        }
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroLimit { field: "max_depth" });
        }

        Ok(())
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(DecodeConfig::from_toml_str("").expect("parse"), DecodeConfig::default());
    }

    #[test]
    fn partial_table_overrides_one_limit() {
        let config = DecodeConfig::from_toml_str("[decode]\nmax_depth = 8\n").expect("parse");

        assert_eq!(config.max_depth, 8);
        assert_eq!(config.max_bytes, DEFAULT_MAX_BYTES);
    }

    #[test]
    fn other_tables_are_ignored() {
        let config = DecodeConfig::from_toml_str("[server]\nport = 1\n").expect("parse");

        assert_eq!(config, DecodeConfig::default());
    }

    #[test]
    fn rejects_zero_and_unknown_keys() {
        assert!(matches!(
            DecodeConfig::from_toml_str("[decode]\nmax_bytes = 0\n"),
            Err(ConfigError::ZeroLimit { field: "max_bytes" })
        ));
        assert!(matches!(
            DecodeConfig::from_toml_str("[decode]\nmax_nodes = 3\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
