//! Override resolution
//!
//! Computes the effective value of a parameter for one instance: the stored
//! override when it decodes to something convertible to the requested type,
//! the fallback otherwise. Resolution never fails.

use crate::codec::{AssetLookup, ValueCodec};
use crate::schema::{FieldDescriptor, ParameterSchema};
use crate::types::{FromValue, ObjectInstance, ObjectTemplate, Value, ValueType};

/// Effective value of one editable field
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameter {
    pub field: FieldDescriptor,
    pub value: Value,
    /// Whether the value came from an override rather than the template
    pub overridden: bool,
}

/// Resolves instance overrides against template defaults
#[derive(Debug, Clone, Copy)]
pub struct OverrideResolver<'a> {
    schema: &'a ParameterSchema,
    codec: ValueCodec<'a>,
}

impl Default for OverrideResolver<'static> {
    fn default() -> Self {
        Self::new(ParameterSchema::global())
    }
}

impl<'a> OverrideResolver<'a> {
    pub fn new(schema: &'a ParameterSchema) -> Self {
        Self {
            schema,
            codec: ValueCodec::new(),
        }
    }

    /// Check handle overrides against `assets`
    pub fn with_assets(mut self, assets: &'a dyn AssetLookup) -> Self {
        self.codec = ValueCodec::with_assets(assets);
        self
    }

    /// Resolve `field` as `T`, or `fallback`
    pub fn resolve<T: FromValue>(&self, instance: &ObjectInstance, field: &str, fallback: T) -> T {
        self.override_value(instance, field, None)
            .and_then(T::from_value)
            .unwrap_or(fallback)
    }

    /// Resolve `field` as a value of `value_type`, or `fallback`
    pub fn resolve_value(
        &self,
        instance: &ObjectInstance,
        field: &str,
        value_type: ValueType,
        fallback: Value,
    ) -> Value {
        self.override_value(instance, field, Some(value_type))
            .unwrap_or(fallback)
    }

    /// Resolve a declared editable field of `template`.
    ///
    /// Returns `None` when the field is not editable on this template type,
    /// or when neither an override nor a template default exists (unset
    /// handles).
    pub fn resolve_field(
        &self,
        instance: &ObjectInstance,
        template: &ObjectTemplate,
        field: &str,
    ) -> Option<Value> {
        let descriptor = self.schema.field(template.template_type(), field)?;
        self.resolve_descriptor(instance, template, &descriptor)
            .map(|resolved| resolved.value)
    }

    /// Resolve every editable field of `template` for `instance`
    pub fn resolve_all(&self, instance: &ObjectInstance, template: &ObjectTemplate) -> Vec<ResolvedParameter> {
        self.schema
            .editable_fields(template.template_type())
            .iter()
            .filter_map(|descriptor| self.resolve_descriptor(instance, template, descriptor))
            .collect()
    }

    fn resolve_descriptor(
        &self,
        instance: &ObjectInstance,
        template: &ObjectTemplate,
        descriptor: &FieldDescriptor,
    ) -> Option<ResolvedParameter> {
        if let Some(value) = self.override_value(instance, descriptor.name, Some(descriptor.value_type)) {
            return Some(ResolvedParameter {
                field: *descriptor,
                value,
                overridden: true,
            });
        }

        template
            .default_value(descriptor.name)
            .and_then(|value| value.coerce(descriptor.value_type))
            .map(|value| ResolvedParameter {
                field: *descriptor,
                value,
                overridden: false,
            })
    }

    /// Decode the override for `field`, coercing to `target` when given
    fn override_value(&self, instance: &ObjectInstance, field: &str, target: Option<ValueType>) -> Option<Value> {
        let entry = instance.get_override(field)?;

        let decoded = match self.codec.decode_tagged(&entry.value, &entry.type_tag) {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(
                    "Ignoring override {} on {}: {}",
                    field,
                    instance.logic_key,
                    e
                );
                return None;
            }
        };

        let Some(target) = target else {
            return Some(decoded);
        };

        let found = decoded.value_type();
        let coerced = decoded.coerce(target);
        if coerced.is_none() {
            tracing::debug!(
                "Ignoring override {} on {}: cannot convert {} to {}",
                field,
                instance.logic_key,
                found,
                target
            );
        }
        coerced
    }
}
