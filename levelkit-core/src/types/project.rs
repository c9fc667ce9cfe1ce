//! Levelkit project configuration
//!
//! Defines the `levelkit.json` manifest format.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Manifest file name looked up in a project directory
pub const CONFIG_FILE: &str = "levelkit.json";

/// The main project configuration file (levelkit.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Project name (used for display)
    pub name: String,

    /// Where level documents are saved
    #[serde(default)]
    pub saves: SavesConfig,

    /// Where templates are loaded from
    #[serde(default)]
    pub content: ContentConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "MyLevels".to_string(),
            saves: SavesConfig::default(),
            content: ContentConfig::default(),
        }
    }
}

/// Save directory configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavesConfig {
    /// Save directory (default: the per-user data directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Template content configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentConfig {
    /// Include the built-in template catalogue
    #[serde(default = "default_true")]
    pub builtin: bool,

    /// Directories scanned for template files, in priority order
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            dirs: Vec::new(),
        }
    }
}

/// Errors that can occur when reading the manifest
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl ProjectConfig {
    /// Parse a levelkit.json file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ProjectConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Find levelkit.json in a project directory
    pub fn find<P: AsRef<Path>>(project_dir: P) -> Option<PathBuf> {
        let candidate = project_dir.as_ref().join(CONFIG_FILE);
        candidate.exists().then_some(candidate)
    }

    /// Resolve relative content directories against the project directory
    pub fn content_dirs(&self, project_dir: &Path) -> Vec<PathBuf> {
        self.content
            .dirs
            .iter()
            .map(|dir| {
                if dir.is_absolute() {
                    dir.clone()
                } else {
                    project_dir.join(dir)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProjectConfig::default();
        assert_eq!(config.name, "MyLevels");
        assert!(config.saves.dir.is_none());
        assert!(config.content.builtin);
        assert!(config.content.dirs.is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let config = ProjectConfig {
            name: "Obstacle Course".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: ProjectConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.name, deserialized.name);
        assert!(deserialized.content.builtin);
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{ "name": "Course", "content": { "dirs": ["templates"] } }"#;
        let config: ProjectConfig = serde_json::from_str(json).unwrap();
        assert!(config.content.builtin);
        assert_eq!(
            config.content_dirs(Path::new("/project")),
            vec![PathBuf::from("/project/templates")]
        );
    }

    #[test]
    fn test_load_and_find() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProjectConfig::find(dir.path()).is_none());

        std::fs::write(dir.path().join(CONFIG_FILE), r#"{ "name": "Course" }"#).unwrap();
        let path = ProjectConfig::find(dir.path()).unwrap();
        let config = ProjectConfig::load(path).unwrap();
        assert_eq!(config.name, "Course");
    }
}
