use std::path::{Path, PathBuf};

use poemdown::ParseOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File looked up next to the input when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "poemdown.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {config_path} does not exist")]
    ConfigMissing { config_path: PathBuf },

    #[error("failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetsConfig {
    /// Facets seen fewer times than this are hidden.
    pub min_count: usize,
}

impl Default for FacetsConfig {
    fn default() -> Self {
        FacetsConfig { min_count: 2 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    /// Render tone digits as diacritics.
    pub tones: bool,
}

/// Contents of `poemdown.toml`. Every table is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub parse: ParseOptions,
    pub facets: FacetsConfig,
    pub html: HtmlConfig,
}

impl CliConfig {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
            config_path: config_path.to_path_buf(),
            source,
        })?;

        Ok(Some(config))
    }

    /// Load the explicit config if one was given, else `poemdown.toml` beside
    /// `input`, else defaults.
    pub fn resolve(explicit: Option<&Path>, input: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_path(path)?.ok_or_else(|| ConfigError::ConfigMissing {
                config_path: path.to_path_buf(),
            });
        }

        let Some(path) = input.and_then(Self::beside) else {
            return Ok(Self::default());
        };
        let config = Self::load_from_path(&path)?;
        if config.is_some() {
            log::debug!("using config {}", path.display());
        }
        Ok(config.unwrap_or_default())
    }

    fn beside(input: &Path) -> Option<PathBuf> {
        let dir = match input.parent() {
            Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
            Some(dir) => dir,
            None => return None,
        };
        Some(dir.join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let result = CliConfig::load_from_path(dir.path().join("nope.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn partial_tables_fill_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[parse]\ngfm = false\n\n[html]\ntones = true\n").unwrap();

        let config = CliConfig::load_from_path(&path).unwrap().unwrap();
        assert_eq!(
            config,
            CliConfig {
                parse: ParseOptions {
                    keep_attr_items: false,
                    gfm: false,
                },
                facets: FacetsConfig { min_count: 2 },
                html: HtmlConfig { tones: true },
            }
        );
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[facets]\nmin_count = \"many\"\n").unwrap();

        let err = CliConfig::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("failed to parse config file"));
    }

    #[test]
    fn resolve_finds_config_beside_input() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[facets]\nmin_count = 5\n").unwrap();
        let input = dir.path().join("poems.md");

        let config = CliConfig::resolve(None, Some(&input)).unwrap();
        assert_eq!(config.facets.min_count, 5);
        assert!(config.parse.gfm);
    }

    #[test]
    fn resolve_without_any_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("poems.md");
        assert_eq!(CliConfig::resolve(None, Some(&input)).unwrap(), CliConfig::default());
        assert_eq!(CliConfig::resolve(None, None).unwrap(), CliConfig::default());
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("custom.toml");
        let err = CliConfig::resolve(Some(&missing), None).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigMissing { .. }));
    }

    #[test]
    fn explicit_config_wins_over_neighbour() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[html]\ntones = true\n").unwrap();
        let custom = dir.path().join("custom.toml");
        std::fs::write(&custom, "[parse]\nkeep_attr_items = true\n").unwrap();
        let input = dir.path().join("poems.md");

        let config = CliConfig::resolve(Some(&custom), Some(&input)).unwrap();
        assert!(config.parse.keep_attr_items);
        assert!(!config.html.tones);
    }
}
