//! Template content sources
//!
//! A content source yields the templates and asset names the registry is
//! built from. Sources:
//! - [`BuiltinContent`]: the catalogue shipped with the crate
//! - [`DirectoryContent`]: one template per YAML/TOML file under a directory
//! - [`MemoryContent`]: templates held in memory
//! - [`LayeredContent`]: several sources, earlier ones taking priority

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::ObjectTemplate;

const BUILTIN_CATALOGUE: &str = include_str!("../content/builtin.yaml");

/// Sub-directory of a content directory holding asset files
const ASSETS_DIR: &str = "assets";

/// Errors that can occur while reading content
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Failed to read content at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML template {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid TOML template {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid built-in catalogue: {0}")]
    Builtin(#[from] serde_yaml::Error),
}

/// A template file that failed to parse and was left out of a scan
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Skipped template {}: {reason}", .path.display())]
pub struct SkippedTemplate {
    pub path: PathBuf,
    pub reason: String,
}

/// Templates a source yielded, plus the files it had to skip
#[derive(Debug, Default)]
pub struct ContentScan {
    pub templates: Vec<ObjectTemplate>,
    pub skipped: Vec<SkippedTemplate>,
}

/// Provider of templates and known asset names
pub trait ContentSource {
    /// Every template the source defines, in a stable order
    fn templates(&self) -> Result<Vec<ObjectTemplate>, ContentError>;

    /// Templates along with the entries that were skipped.
    ///
    /// An `Err` means the source as a whole could not be read.
    fn scan(&self) -> Result<ContentScan, ContentError> {
        Ok(ContentScan {
            templates: self.templates()?,
            skipped: Vec::new(),
        })
    }

    /// Names of the assets handles may refer to
    fn assets(&self) -> Vec<String>;
}

/// Catalogue file layout
#[derive(Debug, Default, Deserialize)]
struct Catalogue {
    #[serde(default)]
    assets: Vec<String>,
    #[serde(default)]
    templates: Vec<ObjectTemplate>,
}

// ============================================================================
// Builtin
// ============================================================================

/// Templates embedded in the crate
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinContent;

impl BuiltinContent {
    fn catalogue() -> Result<Catalogue, ContentError> {
        Ok(serde_yaml::from_str(BUILTIN_CATALOGUE)?)
    }
}

impl ContentSource for BuiltinContent {
    fn templates(&self) -> Result<Vec<ObjectTemplate>, ContentError> {
        Ok(Self::catalogue()?.templates)
    }

    fn assets(&self) -> Vec<String> {
        Self::catalogue().map(|c| c.assets).unwrap_or_default()
    }
}

// ============================================================================
// Directory
// ============================================================================

/// Template files under a directory
///
/// Every `*.yaml`, `*.yml` or `*.toml` file below `root` (outside `assets/`)
/// holds one template. Files under `root/assets/` are not parsed; their
/// stems are the known asset names.
#[derive(Debug, Clone)]
pub struct DirectoryContent {
    root: PathBuf,
}

impl DirectoryContent {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collect_files(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), ContentError> {
        let entries = fs::read_dir(dir).map_err(|source| ContentError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if path == self.root.join(ASSETS_DIR) {
                    continue;
                }
                self.collect_files(&path, files)?;
            } else if template_format(&path).is_some() {
                files.push(path);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateFormat {
    Yaml,
    Toml,
}

fn template_format(path: &Path) -> Option<TemplateFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Some(TemplateFormat::Yaml),
        Some("toml") => Some(TemplateFormat::Toml),
        _ => None,
    }
}

/// Parse a single template file
pub fn parse_template_file(path: &Path) -> Result<ObjectTemplate, ContentError> {
    let content = fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match template_format(path) {
        Some(TemplateFormat::Toml) => toml::from_str(&content).map_err(|source| ContentError::Toml {
            path: path.to_path_buf(),
            source,
        }),
        _ => serde_yaml::from_str(&content).map_err(|source| ContentError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl ContentSource for DirectoryContent {
    fn templates(&self) -> Result<Vec<ObjectTemplate>, ContentError> {
        Ok(self.scan()?.templates)
    }

    /// Parse every file on its own; a broken file is logged and skipped
    fn scan(&self) -> Result<ContentScan, ContentError> {
        let mut files = Vec::new();
        self.collect_files(&self.root, &mut files)?;
        files.sort();

        let mut scan = ContentScan::default();
        for path in files {
            match parse_template_file(&path) {
                Ok(template) => scan.templates.push(template),
                Err(e) => {
                    tracing::warn!("{}", e);
                    scan.skipped.push(SkippedTemplate {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(scan)
    }

    fn assets(&self) -> Vec<String> {
        let mut names = Vec::new();
        let Ok(entries) = fs::read_dir(self.root.join(ASSETS_DIR)) else {
            return names;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        names
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Templates supplied directly
#[derive(Debug, Clone, Default)]
pub struct MemoryContent {
    templates: Vec<ObjectTemplate>,
    assets: Vec<String>,
}

impl MemoryContent {
    pub fn new(templates: Vec<ObjectTemplate>) -> Self {
        Self {
            templates,
            assets: Vec::new(),
        }
    }

    pub fn with_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assets.extend(assets.into_iter().map(Into::into));
        self
    }
}

impl ContentSource for MemoryContent {
    fn templates(&self) -> Result<Vec<ObjectTemplate>, ContentError> {
        Ok(self.templates.clone())
    }

    fn assets(&self) -> Vec<String> {
        self.assets.clone()
    }
}

// ============================================================================
// Layered
// ============================================================================

/// Several sources concatenated in priority order.
///
/// Templates from earlier layers come first, so with the registry's
/// first-wins rule they shadow later layers on key collisions.
#[derive(Default)]
pub struct LayeredContent {
    layers: Vec<Box<dyn ContentSource + Send + Sync>>,
}

impl std::fmt::Debug for LayeredContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredContent")
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl LayeredContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S: ContentSource + Send + Sync + 'static>(&mut self, source: S) {
        self.layers.push(Box::new(source));
    }

    pub fn with<S: ContentSource + Send + Sync + 'static>(mut self, source: S) -> Self {
        self.push(source);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl ContentSource for LayeredContent {
    fn templates(&self) -> Result<Vec<ObjectTemplate>, ContentError> {
        Ok(self.scan()?.templates)
    }

    fn scan(&self) -> Result<ContentScan, ContentError> {
        let mut scan = ContentScan::default();
        for layer in &self.layers {
            let layer_scan = layer.scan()?;
            scan.templates.extend(layer_scan.templates);
            scan.skipped.extend(layer_scan.skipped);
        }
        Ok(scan)
    }

    fn assets(&self) -> Vec<String> {
        let mut assets: Vec<String> = self.layers.iter().flat_map(|l| l.assets()).collect();
        assets.sort();
        assets.dedup();
        assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TemplateKind, TemplateType, Value};

    #[test]
    fn test_builtin_catalogue_parses() {
        let templates = BuiltinContent.templates().unwrap();
        let keys: Vec<&str> = templates.iter().map(|t| t.logic_key.as_str()).collect();
        for key in [
            "StartArea",
            "FinishArea",
            "Checkpoint",
            "DeadZone",
            "StaticPlatform",
            "MovingPlatform",
            "Jumper",
            "Bumper",
            "Blower",
            "Launcher",
        ] {
            assert!(keys.contains(&key), "missing {}", key);
        }

        let assets = BuiltinContent.assets();
        for template in &templates {
            for name in template.asset_names() {
                assert!(assets.iter().any(|a| a == name), "unknown asset {}", name);
            }
        }
    }

    #[test]
    fn test_builtin_defaults_fill_in() {
        let templates = BuiltinContent.templates().unwrap();
        let moving = templates.iter().find(|t| t.logic_key == "MovingPlatform").unwrap();
        assert_eq!(moving.template_type(), TemplateType::MovingPlatform);
        assert_eq!(moving.default_value("_waitDelay"), Some(Value::Float(1.0)));

        let checkpoint = templates.iter().find(|t| t.logic_key == "Checkpoint").unwrap();
        assert_eq!(checkpoint.default_value("_checkpointIndex"), Some(Value::Int(0)));
    }

    #[test]
    fn test_directory_content() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("traps")).unwrap();
        fs::create_dir_all(root.join("assets")).unwrap();

        fs::write(
            root.join("traps/big_bumper.yaml"),
            "logicKey: BigBumper\nname: Big Bumper\nkind:\n  type: bumper\n  strength: 40\n",
        )
        .unwrap();
        fs::write(
            root.join("ramp.toml"),
            "logicKey = \"Ramp\"\nname = \"Ramp\"\n\n[kind]\ntype = \"staticPlatform\"\n",
        )
        .unwrap();
        fs::write(root.join("notes.txt"), "not a template").unwrap();
        fs::write(root.join("assets/ramp_mesh.fbx"), "").unwrap();
        fs::write(root.join("assets/bumper.yaml"), "not: parsed").unwrap();

        let content = DirectoryContent::new(root);
        let templates = content.templates().unwrap();
        assert_eq!(templates.len(), 2);
        assert!(templates
            .iter()
            .any(|t| t.logic_key == "BigBumper" && t.default_value("_strength") == Some(Value::Float(40.0))));
        assert!(templates
            .iter()
            .any(|t| t.logic_key == "Ramp" && t.kind == TemplateKind::StaticPlatform));

        assert_eq!(content.assets(), vec!["bumper".to_string(), "ramp_mesh".to_string()]);
    }

    #[test]
    fn test_parse_template_file_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "logicKey: [").unwrap();

        let err = parse_template_file(&path).unwrap_err();
        assert!(matches!(err, ContentError::Yaml { .. }));
    }

    #[test]
    fn test_directory_content_skips_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("good.yaml"),
            "logicKey: Ramp\nname: Ramp\nkind:\n  type: staticPlatform\n",
        )
        .unwrap();
        fs::write(dir.path().join("broken.yaml"), "logicKey: [").unwrap();
        fs::write(dir.path().join("broken.toml"), "logicKey = ").unwrap();

        let content = DirectoryContent::new(dir.path());
        let scan = content.scan().unwrap();
        assert_eq!(scan.templates.len(), 1);
        assert_eq!(scan.templates[0].logic_key, "Ramp");

        let skipped: Vec<PathBuf> = scan.skipped.iter().map(|s| s.path.clone()).collect();
        assert_eq!(
            skipped,
            vec![dir.path().join("broken.toml"), dir.path().join("broken.yaml")]
        );
        assert!(scan.skipped[1].reason.contains("Invalid YAML template"));

        assert_eq!(content.templates().unwrap().len(), 1);
    }

    #[test]
    fn test_layered_keeps_builtins_next_to_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("good.yaml"),
            "logicKey: Ramp\nname: Ramp\nkind:\n  type: staticPlatform\n",
        )
        .unwrap();
        fs::write(dir.path().join("broken.yaml"), "logicKey: [").unwrap();

        let layered = LayeredContent::new()
            .with(DirectoryContent::new(dir.path()))
            .with(BuiltinContent);
        let scan = layered.scan().unwrap();

        assert_eq!(scan.skipped.len(), 1);
        for key in ["Ramp", "StartArea", "FinishArea"] {
            assert!(scan.templates.iter().any(|t| t.logic_key == key), "missing {}", key);
        }
    }

    #[test]
    fn test_missing_directory() {
        let content = DirectoryContent::new("/nonexistent/levelkit/content");
        assert!(matches!(content.templates(), Err(ContentError::Io { .. })));
        assert!(content.assets().is_empty());
    }

    #[test]
    fn test_layered_order() {
        let first = MemoryContent::new(vec![ObjectTemplate::new("Bumper", "First", TemplateKind::StaticPlatform)])
            .with_assets(["a"]);
        let layered = LayeredContent::new()
            .with(first)
            .with(BuiltinContent);

        let templates = layered.templates().unwrap();
        assert_eq!(templates[0].name, "First");
        assert!(templates.iter().filter(|t| t.logic_key == "Bumper").count() == 2);
        assert!(layered.assets().contains(&"a".to_string()));
    }
}
