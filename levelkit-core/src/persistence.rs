//! Level documents and save files
//!
//! A level is stored as one pretty-printed JSON document holding the level
//! name and, per instance, its logic key, transform and overrides. Templates
//! are never embedded; they are looked up again by key after loading.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::level::{Level, UnresolvedTemplateError};
use crate::path_utils::{path_to_string, save_file_name, SAVE_EXTENSION};
use crate::registry::TemplateRegistry;
use crate::types::ObjectInstance;

/// Current document version
pub const DOCUMENT_VERSION: u32 = 1;

/// Errors that can occur when reading or writing levels
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Save file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create save directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid level document: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Invalid save name: '{0}'")]
    InvalidName(String),
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRef<'a> {
    version: u32,
    level_name: &'a str,
    objects: &'a [ObjectInstance],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelDocument {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    level_name: String,
    #[serde(default)]
    objects: Vec<ObjectInstance>,
}

/// Serialize a level to a JSON document
pub fn serialize(level: &Level) -> Result<String, PersistenceError> {
    let document = DocumentRef {
        version: DOCUMENT_VERSION,
        level_name: &level.name,
        objects: &level.objects,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Parse a JSON document into a level.
///
/// Every instance comes back with a pending template link; call
/// [`Level::relink`] to resolve them. An id already used by an earlier
/// object is replaced with a fresh one.
pub fn deserialize(text: &str) -> Result<Level, PersistenceError> {
    let mut document: LevelDocument = serde_json::from_str(text)?;
    if document.version > DOCUMENT_VERSION {
        tracing::warn!(
            "Level '{}' has document version {}, newer than {}",
            document.level_name,
            document.version,
            DOCUMENT_VERSION
        );
    }

    let mut seen = HashSet::with_capacity(document.objects.len());
    for instance in &mut document.objects {
        if !seen.insert(instance.id) {
            let fresh = Uuid::new_v4();
            tracing::warn!(
                "Level '{}' repeats object id {}, assigning {}",
                document.level_name,
                instance.id,
                fresh
            );
            instance.id = fresh;
            seen.insert(fresh);
        }
    }

    Ok(Level {
        name: document.level_name,
        objects: document.objects,
    })
}

/// A loaded level and the instances whose templates were not found
#[derive(Debug)]
pub struct LoadedLevel {
    pub level: Level,
    pub unresolved: Vec<UnresolvedTemplateError>,
}

/// Directory of named level documents
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Per-user save directory, or `./saves` when there is none
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("levelkit").join("saves"))
            .unwrap_or_else(|| PathBuf::from("saves"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a save called `name` is stored at
    pub fn path_for(&self, name: &str) -> Result<PathBuf, PersistenceError> {
        let file_name = save_file_name(name).ok_or_else(|| PersistenceError::InvalidName(name.to_string()))?;
        Ok(self.dir.join(file_name))
    }

    /// Write `level` as `name`, creating the directory on first use
    pub fn save(&self, name: &str, level: &Level) -> Result<PathBuf, PersistenceError> {
        let path = self.path_for(name)?;
        let json = serialize(level)?;

        fs::create_dir_all(&self.dir).map_err(|source| PersistenceError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| PersistenceError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::info!("Saved level '{}' to {}", level.name, path_to_string(&path));
        Ok(path)
    }

    /// Raw document text of save `name`
    pub fn load(&self, name: &str) -> Result<String, PersistenceError> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(PersistenceError::NotFound(path));
        }

        fs::read_to_string(&path).map_err(|source| PersistenceError::Read { path, source })
    }

    /// Load, parse and relink save `name`
    pub fn load_level(&self, name: &str, registry: &TemplateRegistry) -> Result<LoadedLevel, PersistenceError> {
        let text = self.load(name)?;
        let mut level = deserialize(&text)?;
        let unresolved = level.relink(registry);

        tracing::info!(
            "Loaded level '{}' ({} objects, {} unresolved)",
            level.name,
            level.objects.len(),
            unresolved.len()
        );
        Ok(LoadedLevel { level, unresolved })
    }

    /// File names of all saves, sorted; empty when the directory is missing
    pub fn list_saves(&self) -> Result<Vec<String>, PersistenceError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(SAVE_EXTENSION))
            })
            .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::BuiltinContent;
    use crate::types::{ParameterOverride, Quaternion, TemplateLink, Transform, Value, Vector3};

    fn sample_level() -> Level {
        let registry = TemplateRegistry::new(BuiltinContent);
        let mut level = Level::new("Tutorial");

        let start = ObjectInstance::new(registry.resolve("StartArea").unwrap(), Transform::IDENTITY);
        level.add_object(start);

        let mut platform = ObjectInstance::new(
            registry.resolve("MovingPlatform").unwrap(),
            Transform {
                position: Vector3::new(1.5, -2.0, 30.25),
                rotation: Quaternion::new(0.0, 0.7071068, 0.0, 0.7071068),
                scale: Vector3::new(2.0, 1.0, 2.0),
            },
        );
        platform.set_override_value("_travelTime", &Value::Float(4.5));
        platform.set_override_value("_endOffset", &Value::Vector3(Vector3::new(0.0, 3.0, 0.0)));
        level.add_object(platform);

        let mut ramp = ObjectInstance::unlinked("Ramp", Transform::at(Vector3::new(0.0, 0.0, 9.0)));
        ramp.set_override(ParameterOverride {
            name: "_angle".to_string(),
            type_tag: "float".to_string(),
            value: "12".to_string(),
        });
        level.add_object(ramp);
        level
    }

    #[test]
    fn test_round_trip() {
        let level = sample_level();
        let json = serialize(&level).unwrap();
        let loaded = deserialize(&json).unwrap();

        assert_eq!(loaded.name, level.name);
        assert_eq!(loaded.objects.len(), level.objects.len());
        for (a, b) in level.objects.iter().zip(&loaded.objects) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.logic_key, b.logic_key);
            assert_eq!(a.transform(), b.transform());
            assert_eq!(a.overrides, b.overrides);
            assert!(matches!(b.link(), TemplateLink::Pending));
        }
    }

    #[test]
    fn test_extreme_decoded_position_reloads() {
        let codec = crate::codec::ValueCodec::new();
        assert!(codec.decode("1e999,0,0", crate::types::ValueType::Vector3).is_err());

        let Some(Value::Vector3(position)) = codec
            .decode("3.4e38,0,-3.4e38", crate::types::ValueType::Vector3)
            .unwrap()
        else {
            panic!("expected a vector");
        };
        let mut level = Level::new("Far");
        let mut bumper = ObjectInstance::unlinked("Bumper", Transform::at(position));
        bumper.set_override_value("_visualScale", &Value::Vector3(position));
        level.add_object(bumper);

        let loaded = deserialize(&serialize(&level).unwrap()).unwrap();
        assert_eq!(loaded.objects[0].position, position);
        assert_eq!(loaded.objects[0].overrides, level.objects[0].overrides);
    }

    #[test]
    fn test_repeated_ids_get_fresh_ones() {
        let mut level = sample_level();
        let mut copy = level.objects[1].clone();
        copy.position = Vector3::new(0.0, 0.0, 80.0);
        // add_object would refuse the copy
        level.objects.push(copy);
        assert_eq!(level.objects[1].id, level.objects[3].id);

        let loaded = deserialize(&serialize(&level).unwrap()).unwrap();
        assert_eq!(loaded.objects.len(), 4);
        assert_eq!(loaded.objects[1].id, level.objects[1].id);
        assert_ne!(loaded.objects[3].id, level.objects[1].id);
        assert_eq!(loaded.objects[3].position, Vector3::new(0.0, 0.0, 80.0));

        let ids: HashSet<Uuid> = loaded.objects.iter().map(|o| o.id).collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_document_shape() {
        let json = serialize(&sample_level()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(doc["version"], 1);
        assert_eq!(doc["levelName"], "Tutorial");
        let platform = &doc["objects"][1];
        assert_eq!(platform["logicKey"], "MovingPlatform");
        assert_eq!(platform["position"]["z"], 30.25);
        assert_eq!(platform["overrides"][0]["name"], "_travelTime");
        assert_eq!(platform["overrides"][0]["type"], "float");
        assert_eq!(platform["overrides"][0]["value"], "4.5");
        // template data is never embedded
        assert!(platform.get("kind").is_none());
        assert!(platform.get("link").is_none());
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_deserialize_tolerates_unknown_fields() {
        let json = r#"{
            "levelName": "Old",
            "editorVersion": "2.1",
            "objects": [
                { "logicKey": "Bumper", "template": { "nested": true },
                  "position": { "x": 1, "y": 2, "z": 3 } }
            ]
        }"#;
        let level = deserialize(json).unwrap();
        assert_eq!(level.name, "Old");
        assert_eq!(level.objects[0].position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(level.objects[0].scale, Vector3::ONE);
        assert_eq!(level.objects[0].rotation, Quaternion::IDENTITY);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(matches!(deserialize("not json"), Err(PersistenceError::Format(_))));
    }

    #[test]
    fn test_save_load_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path().join("saves"));
        assert!(store.list_saves().unwrap().is_empty());

        let level = sample_level();
        let path = store.save("Tutorial", &level).unwrap();
        assert!(path.ends_with("Tutorial.json"));
        store.save("Bonus.json", &level).unwrap();
        fs::write(dir.path().join("saves/readme.txt"), "ignored").unwrap();

        assert_eq!(store.list_saves().unwrap(), vec!["Bonus.json", "Tutorial.json"]);

        let text = store.load("Tutorial").unwrap();
        assert_eq!(deserialize(&text).unwrap().objects.len(), 3);
        assert_eq!(store.load("Tutorial.json").unwrap(), text);
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path());
        assert!(matches!(store.load("Nope"), Err(PersistenceError::NotFound(_))));
    }

    #[test]
    fn test_invalid_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path());
        assert!(matches!(
            store.save("  ", &Level::new("x")),
            Err(PersistenceError::InvalidName(_))
        ));
    }

    #[test]
    fn test_load_level_keeps_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path());
        store.save("Tutorial", &sample_level()).unwrap();

        let registry = TemplateRegistry::new(BuiltinContent);
        let loaded = store.load_level("Tutorial", &registry).unwrap();
        assert_eq!(loaded.level.objects.len(), 3);
        assert_eq!(loaded.unresolved.len(), 1);
        assert_eq!(loaded.unresolved[0].logic_key, "Ramp");

        let ramp = &loaded.level.objects[2];
        assert!(ramp.is_unresolved());
        assert_eq!(ramp.get_override("_angle").unwrap().value, "12");

        // an unresolved instance survives another save unchanged
        let json = serialize(&loaded.level).unwrap();
        let again = deserialize(&json).unwrap();
        assert_eq!(again.objects[2].overrides, ramp.overrides);
        assert_eq!(again.objects[2].logic_key, "Ramp");
    }

    #[test]
    fn test_default_dir() {
        let dir = SaveStore::default_dir();
        assert!(dir.ends_with("saves"));
    }
}
