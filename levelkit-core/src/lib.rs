//! Levelkit Core Library
//!
//! This crate provides the core functionality for Levelkit:
//! - Object templates, placed instances and typed parameter values
//! - Override encoding and resolution against template defaults
//! - Template registry and content sources
//! - Level validation and checkpoint ordering
//! - Level documents and save files

pub mod codec;
pub mod content;
pub mod level;
pub mod path_utils;
pub mod persistence;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod types;

// Re-export commonly used types
pub use codec::{encode, AssetLookup, DecodeError, ValueCodec};
pub use content::{
    BuiltinContent, ContentError, ContentScan, ContentSource, DirectoryContent, LayeredContent, MemoryContent,
    SkippedTemplate,
};
pub use level::{Level, LevelDatabase, UnresolvedTemplateError, ValidationError};
pub use persistence::{deserialize, serialize, LoadedLevel, PersistenceError, SaveStore};
pub use registry::{DuplicateKeyWarning, TemplateRegistry};
pub use resolver::{OverrideResolver, ResolvedParameter};
pub use schema::{FieldDescriptor, ParameterSchema};
pub use types::{
    ConfigError, FromValue, ObjectInstance, ObjectTemplate, ParameterOverride, ProjectConfig, Quaternion,
    RaceRole, TemplateKind, TemplateLink, TemplateType, Transform, Value, ValueType, Vector2, Vector3, Vector4,
};
pub use path_utils::{normalize_path, path_to_string, sanitize_filename};
