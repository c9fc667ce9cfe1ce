//! Editable field discovery
//!
//! Each template type declares its fields once; the schema filters them down
//! to the ones carrying a [`LevelEditable`](crate::types::LevelEditable)
//! marker and caches the result per type.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::types::{TemplateType, ValueType};

/// An instance-overridable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub value_type: ValueType,
    pub show_in_inspector: bool,
}

/// Cache of editable fields per template type
#[derive(Debug, Default)]
pub struct ParameterSchema {
    cache: Mutex<HashMap<TemplateType, Arc<[FieldDescriptor]>>>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide schema
    pub fn global() -> &'static ParameterSchema {
        static SCHEMA: OnceLock<ParameterSchema> = OnceLock::new();
        SCHEMA.get_or_init(ParameterSchema::new)
    }

    /// Editable fields of `template_type` in declaration order
    pub fn editable_fields(&self, template_type: TemplateType) -> Arc<[FieldDescriptor]> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .entry(template_type)
            .or_insert_with(|| discover(template_type))
            .clone()
    }

    /// Look up one editable field by name
    pub fn field(&self, template_type: TemplateType, name: &str) -> Option<FieldDescriptor> {
        self.editable_fields(template_type)
            .iter()
            .find(|f| f.name == name)
            .copied()
    }

    /// Number of template types discovered so far
    pub fn cached_types(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

fn discover(template_type: TemplateType) -> Arc<[FieldDescriptor]> {
    let fields: Vec<FieldDescriptor> = template_type
        .declared_fields()
        .into_iter()
        .filter_map(|decl| {
            decl.editable.map(|marker| FieldDescriptor {
                name: decl.name,
                value_type: decl.value_type,
                show_in_inspector: marker.show_in_inspector,
            })
        })
        .collect();
    tracing::debug!(
        "Discovered {} editable fields for {}",
        fields.len(),
        template_type
    );
    fields.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CHECKPOINT_INDEX_FIELD;

    fn names(fields: &[FieldDescriptor]) -> Vec<&'static str> {
        fields.iter().map(|f| f.name).collect()
    }

    #[test]
    fn test_bumper_fields() {
        let schema = ParameterSchema::new();
        let fields = schema.editable_fields(TemplateType::Bumper);
        assert_eq!(names(&fields), vec!["_pivotCorrection", "_visualScale", "_strength"]);
    }

    #[test]
    fn test_fixed_fields_are_excluded() {
        let schema = ParameterSchema::new();
        let fields = schema.editable_fields(TemplateType::Launcher);
        let names = names(&fields);
        assert!(!names.contains(&"_bullet"));
        assert!(!names.contains(&"_visual"));
        assert!(!names.contains(&"_physicsSize"));
        assert!(names.contains(&"_fireRate"));
    }

    #[test]
    fn test_hidden_marker_is_still_editable() {
        let schema = ParameterSchema::new();
        let field = schema
            .field(TemplateType::Checkpoint, CHECKPOINT_INDEX_FIELD)
            .unwrap();
        assert_eq!(field.value_type, ValueType::Int);
        assert!(!field.show_in_inspector);
        assert!(schema.field(TemplateType::Checkpoint, "_shape").is_none());
    }

    #[test]
    fn test_stable_across_calls_and_order() {
        let first = ParameterSchema::new();
        let a = first.editable_fields(TemplateType::StartArea);
        let _ = first.editable_fields(TemplateType::Jumper);
        let b = first.editable_fields(TemplateType::StartArea);
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a, &b));

        // a fresh schema visiting types in a different order agrees
        let second = ParameterSchema::new();
        let _ = second.editable_fields(TemplateType::Jumper);
        assert_eq!(second.editable_fields(TemplateType::StartArea), a);
        assert_eq!(second.cached_types(), 2);
    }

    #[test]
    fn test_every_type_has_common_fields() {
        let schema = ParameterSchema::global();
        for ty in TemplateType::ALL {
            let fields = schema.editable_fields(*ty);
            assert_eq!(fields[0].name, "_pivotCorrection", "{}", ty);
            assert_eq!(fields[1].name, "_visualScale", "{}", ty);
        }
    }
}
