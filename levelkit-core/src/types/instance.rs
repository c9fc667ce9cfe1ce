//! Placed object instances
//!
//! An instance stores only what survives serialization: its logic key, its
//! transform and its overrides. The template it was placed from is a derived
//! link that the registry re-establishes after a load.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::math::{Quaternion, Transform, Vector3};
use super::template::{ObjectTemplate, RaceRole};
use super::value::Value;
use crate::codec;

/// Prefix the editor gives to spawned objects
const EDITOR_OBJECT_PREFIX: &str = "EditorObj_";

/// One designer-specified deviation from a template default
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterOverride {
    /// Field name, e.g. `_travelTime`
    pub name: String,

    /// Type tag of the stored value, e.g. `float`
    #[serde(rename = "type")]
    pub type_tag: String,

    /// Encoded value
    pub value: String,
}

impl ParameterOverride {
    pub fn new(name: &str, value: &Value) -> Self {
        Self {
            name: name.to_string(),
            type_tag: value.value_type().tag().into_owned(),
            value: codec::encode(value),
        }
    }
}

/// Link between an instance and its template
#[derive(Debug, Clone, Default)]
pub enum TemplateLink {
    /// Not looked up yet (fresh from a document)
    #[default]
    Pending,
    Resolved(Arc<ObjectTemplate>),
    /// The registry has no template for the logic key
    Unresolved,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A placed occurrence of a template
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInstance {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    #[serde(default)]
    pub logic_key: String,

    /// Set when the logic key was inferred from an object name rather than
    /// taken from a template
    #[serde(default, skip_serializing_if = "is_false")]
    pub key_guessed: bool,

    #[serde(default)]
    pub position: Vector3,

    #[serde(default)]
    pub rotation: Quaternion,

    #[serde(default = "unit_scale")]
    pub scale: Vector3,

    #[serde(default)]
    pub overrides: Vec<ParameterOverride>,

    #[serde(skip)]
    link: TemplateLink,
}

fn unit_scale() -> Vector3 {
    Vector3::ONE
}

impl ObjectInstance {
    /// Place a template
    pub fn new(template: Arc<ObjectTemplate>, transform: Transform) -> Self {
        let mut instance = Self::unlinked(&template.logic_key, transform);
        instance.link = TemplateLink::Resolved(template);
        instance
    }

    /// Instance known only by its logic key
    pub fn unlinked(logic_key: &str, transform: Transform) -> Self {
        Self {
            id: Uuid::new_v4(),
            logic_key: logic_key.to_string(),
            key_guessed: false,
            position: transform.position,
            rotation: transform.rotation,
            scale: transform.scale,
            overrides: Vec::new(),
            link: TemplateLink::Pending,
        }
    }

    /// Best-effort recovery for an object that lost its template link:
    /// derive the logic key from the scene object name.
    ///
    /// The result is flagged as guessed and never counts as a resolution.
    pub fn guess_from_object_name(object_name: &str, transform: Transform) -> Self {
        let key = object_name
            .strip_prefix(EDITOR_OBJECT_PREFIX)
            .unwrap_or(object_name)
            .trim();
        tracing::warn!(
            "Object '{}' has no template link, guessing logic key '{}'",
            object_name,
            key
        );

        let mut instance = Self::unlinked(key, transform);
        instance.key_guessed = true;
        instance
    }

    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Flush a live transform into the persisted data
    pub fn update_transform(&mut self, transform: Transform) {
        self.position = transform.position;
        self.rotation = transform.rotation;
        self.scale = transform.scale;
    }

    pub fn link(&self) -> &TemplateLink {
        &self.link
    }

    /// Resolved template, if the link has been established
    pub fn template(&self) -> Option<&Arc<ObjectTemplate>> {
        match &self.link {
            TemplateLink::Resolved(template) => Some(template),
            _ => None,
        }
    }

    pub fn set_link(&mut self, link: TemplateLink) {
        self.link = link;
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.link, TemplateLink::Unresolved)
    }

    /// Race role of the resolved template; unresolved instances have none
    pub fn race_role(&self) -> Option<RaceRole> {
        self.template().and_then(|t| t.race_role())
    }

    pub fn get_override(&self, name: &str) -> Option<&ParameterOverride> {
        self.overrides.iter().find(|o| o.name == name)
    }

    /// Insert an override, replacing any existing entry with the same name
    pub fn set_override(&mut self, entry: ParameterOverride) {
        match self.overrides.iter().position(|o| o.name == entry.name) {
            Some(index) => {
                let mut seen = 0;
                self.overrides.retain(|o| {
                    if o.name != entry.name {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
                self.overrides[index] = entry;
            }
            None => self.overrides.push(entry),
        }
    }

    /// Encode `value` and store it as an override for `name`
    pub fn set_override_value(&mut self, name: &str, value: &Value) {
        self.set_override(ParameterOverride::new(name, value));
    }

    pub fn remove_override(&mut self, name: &str) -> Option<ParameterOverride> {
        let index = self.overrides.iter().position(|o| o.name == name)?;
        let removed = self.overrides.remove(index);
        self.overrides.retain(|o| o.name != name);
        Some(removed)
    }
}
