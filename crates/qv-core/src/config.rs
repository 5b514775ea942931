//! Engine configuration from quiver.yml

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::qualifier::Qualifier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file names searched by [`Config::load_from_dir`], in order
const CONFIG_FILE_NAMES: &[&str] = &["quiver.yml", "quiver.yaml"];

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Qualifier used by association expansion when the caller gives none
    #[serde(default)]
    pub default_qualifier: Qualifier,

    /// How alias removal treats joins that are still referenced
    #[serde(default)]
    pub removal: RemovalPolicy,

    /// Schema files making up the association catalog, relative to the
    /// directory holding the config file
    #[serde(default)]
    pub schema_paths: Vec<String>,
}

/// Alias removal policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    /// Remove without looking for dangling references; a later compile
    /// stage is responsible for referential integrity
    #[default]
    Permissive,
    /// Refuse to remove a join whose binding is still referenced
    Validating,
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory containing quiver.yml or quiver.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
            .map(|path| Self::load(&path))
            .unwrap_or_else(|| {
                Err(CoreError::ConfigNotFound {
                    path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
                })
            })
    }

    /// Absolute paths of the configured schema files
    pub fn schema_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.schema_paths.iter().map(|p| root.join(p)).collect()
    }

    /// Load every configured schema file into a single catalog
    pub fn load_catalog(&self, root: &Path) -> CoreResult<Catalog> {
        Catalog::load_all(&self.schema_paths_absolute(root))
    }

    fn validate(&self) -> CoreResult<()> {
        if self.default_qualifier == Qualifier::Cross {
            return Err(CoreError::ConfigInvalid {
                message: "default_qualifier cannot be 'cross': association joins need an ON condition"
                    .to_string(),
            });
        }

        if self.schema_paths.iter().any(|p| p.trim().is_empty()) {
            return Err(CoreError::ConfigInvalid {
                message: "schema_paths entries must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
