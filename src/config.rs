use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::literal::resolver::{CoercionMode, TypeResolver};

fn default_string_length_estimate() -> usize {
    32
}

fn default_growth_factor() -> usize {
    2
}

/// Settings for typing and building array literals, read from TOML.
///
/// ```toml
/// coercion = "symmetric"
/// string_length_estimate = 64
/// growth_factor = 2
/// memory_limit = 1048576
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LiteralConfig {
    #[serde(default)]
    pub coercion: CoercionMode,
    #[serde(default = "default_string_length_estimate")]
    pub string_length_estimate: usize,
    #[serde(default = "default_growth_factor")]
    pub growth_factor: usize,
    /// Byte limit of the buffer manager, unlimited when absent.
    #[serde(default)]
    pub memory_limit: Option<usize>,
}

impl LiteralConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| Error::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
            .map_err(|e| Error::ConfigError(format!("{}: {e}", path.display())))
    }

    pub fn validate(&self) -> Result<()> {
        if self.growth_factor < 2 {
            return Err(Error::ConfigError(format!(
                "growth_factor must be at least 2, got {}",
                self.growth_factor
            )));
        }
        if self.string_length_estimate == 0 {
            return Err(Error::ConfigError(
                "string_length_estimate must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn resolver(&self) -> TypeResolver {
        TypeResolver::new(self.coercion)
    }
}

impl Default for LiteralConfig {
    fn default() -> Self {
        Self {
            coercion: CoercionMode::default(),
            string_length_estimate: default_string_length_estimate(),
            growth_factor: default_growth_factor(),
            memory_limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::column_vector::VectorOptions;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() -> Result<()> {
        assert_eq!(LiteralConfig::from_toml_str("")?, LiteralConfig::default());
        Ok(())
    }

    #[test]
    fn test_parse_all_fields() -> Result<()> {
        let config = LiteralConfig::from_toml_str(
            r#"
            coercion = "symmetric"
            string_length_estimate = 8
            growth_factor = 3
            memory_limit = 4096
            "#,
        )?;
        assert_eq!(config.coercion, CoercionMode::Symmetric);
        assert_eq!(config.string_length_estimate, 8);
        assert_eq!(config.growth_factor, 3);
        assert_eq!(config.memory_limit, Some(4096));
        assert_eq!(config.resolver().mode(), CoercionMode::Symmetric);

        let options = VectorOptions::from_config(&config);
        assert!(options.manager.is_some());
        assert_eq!(options.growth_factor, 3);
        Ok(())
    }

    #[test]
    fn test_invalid_configs() {
        for s in [
            "growth_factor = 1",
            "string_length_estimate = 0",
            "coercion = \"lenient\"",
            "unknown = true",
        ] {
            assert!(
                matches!(LiteralConfig::from_toml_str(s), Err(Error::ConfigError(_))),
                "{s} should be rejected"
            );
        }
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "coercion = \"legacy\"\nmemory_limit = 10")?;
        let config = LiteralConfig::load_from_file(file.path())?;
        assert_eq!(config.memory_limit, Some(10));

        assert!(matches!(
            LiteralConfig::load_from_file(Path::new("/nonexistent/literal.toml")),
            Err(Error::IOError(_))
        ));
        Ok(())
    }
}
