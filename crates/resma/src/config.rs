use crate::error::{BuildError, IoContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub resma: ResmaTable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResmaTable {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl ResmaTable {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.extra.is_empty()
    }
}

impl ProjectConfig {
    /// Reads `config.toml` under `root`. A missing file, or one without a
    /// non-empty `[resma]` table, is [`BuildError::NotAProject`].
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE_NAME);

        if !config_path.is_file() {
            return Err(BuildError::NotAProject { path: config_path });
        }

        let content =
            fs::read_to_string(&config_path).io_context("reading config", &config_path)?;
        let table: toml::Table =
            toml::from_str(&content).map_err(|error| BuildError::ConfigParse {
                path: config_path.clone(),
                message: error.to_string(),
            })?;

        let Some(resma) = table.get("resma") else {
            return Err(BuildError::NotAProject { path: config_path });
        };

        let resma: ResmaTable =
            resma
                .clone()
                .try_into()
                .map_err(|error: toml::de::Error| BuildError::ConfigParse {
                    path: config_path.clone(),
                    message: error.to_string(),
                })?;

        if resma.is_empty() {
            return Err(BuildError::NotAProject { path: config_path });
        }

        Ok(Self { resma })
    }
}

pub fn is_project(root: &Path) -> bool {
    ProjectConfig::load(root).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(config: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        if let Some(config) = config {
            fs::write(dir.path().join(CONFIG_FILE_NAME), config).unwrap();
        }
        dir
    }

    #[test]
    fn test_load_valid_project() {
        let dir = project(Some("[resma]\nname = \"blog\"\nauthor = \"Ana\"\n"));
        let config = ProjectConfig::load(dir.path()).unwrap();

        assert_eq!(config.resma.name.as_deref(), Some("blog"));
        assert_eq!(config.resma.extra["author"].as_str(), Some("Ana"));
        assert!(is_project(dir.path()));
    }

    #[test]
    fn test_missing_config_is_not_a_project() {
        let dir = project(None);
        assert!(matches!(
            ProjectConfig::load(dir.path()),
            Err(BuildError::NotAProject { .. })
        ));
        assert!(!is_project(dir.path()));
    }

    #[test]
    fn test_config_without_resma_table() {
        let dir = project(Some("[site]\ntitle = \"x\"\n"));
        assert!(matches!(
            ProjectConfig::load(dir.path()),
            Err(BuildError::NotAProject { .. })
        ));

        let dir = project(Some(""));
        assert!(!is_project(dir.path()));
    }

    #[test]
    fn test_empty_resma_table_is_not_a_project() {
        let dir = project(Some("[resma]\n"));
        assert!(!is_project(dir.path()));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = project(Some("[resma\nname = "));
        assert!(matches!(
            ProjectConfig::load(dir.path()),
            Err(BuildError::ConfigParse { .. })
        ));
    }
}
