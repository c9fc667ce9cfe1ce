//! Typed parameter values
//!
//! Every template parameter and every override is one of a closed set of
//! value types. The type is fixed when a template field is declared, and the
//! codec dispatches on the type tag instead of inspecting values at runtime.

use std::borrow::Cow;
use std::fmt;

use super::math::{Quaternion, Vector2, Vector3, Vector4};

/// Enumerations that can appear as parameter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumKind {
    AreaShape,
}

impl EnumKind {
    pub const ALL: &'static [EnumKind] = &[EnumKind::AreaShape];

    pub fn name(self) -> &'static str {
        match self {
            EnumKind::AreaShape => "AreaShape",
        }
    }

    /// Declared variant spellings
    pub fn variants(self) -> &'static [&'static str] {
        match self {
            EnumKind::AreaShape => &["Box", "Sphere", "Capsule"],
        }
    }

    /// Case-insensitive lookup of a variant, returning the declared spelling
    pub fn canonical(self, text: &str) -> Option<&'static str> {
        let text = text.trim();
        self.variants()
            .iter()
            .copied()
            .find(|v| v.eq_ignore_ascii_case(text))
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    String,
    Vector2,
    Vector3,
    Vector4,
    Quaternion,
    /// Named reference to a content asset (mesh, prefab, particle system)
    Handle,
    Enum(EnumKind),
}

impl ValueType {
    /// Type tag written next to an override value
    pub fn tag(self) -> Cow<'static, str> {
        match self {
            ValueType::Bool => Cow::Borrowed("bool"),
            ValueType::Int => Cow::Borrowed("int"),
            ValueType::Float => Cow::Borrowed("float"),
            ValueType::String => Cow::Borrowed("string"),
            ValueType::Vector2 => Cow::Borrowed("vector2"),
            ValueType::Vector3 => Cow::Borrowed("vector3"),
            ValueType::Vector4 => Cow::Borrowed("vector4"),
            ValueType::Quaternion => Cow::Borrowed("quaternion"),
            ValueType::Handle => Cow::Borrowed("handle"),
            ValueType::Enum(kind) => Cow::Owned(format!("enum:{}", kind.name())),
        }
    }

    /// Parse a type tag.
    ///
    /// Besides the canonical tags this accepts the engine type names that
    /// older level files stored (`System.Single`, `UnityEngine.Vector3`, ...).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if let Some(name) = tag
            .strip_prefix("enum:")
            .or_else(|| tag.strip_prefix("Enum:"))
        {
            return EnumKind::from_name(name).map(ValueType::Enum);
        }

        let ty = match tag.to_ascii_lowercase().as_str() {
            "bool" | "boolean" | "system.boolean" => ValueType::Bool,
            "int" | "integer" | "system.int32" | "system.int64" => ValueType::Int,
            "float" | "single" | "double" | "system.single" | "system.double" => ValueType::Float,
            "string" | "system.string" => ValueType::String,
            "vector2" | "unityengine.vector2" => ValueType::Vector2,
            "vector3" | "unityengine.vector3" => ValueType::Vector3,
            "vector4" | "unityengine.vector4" => ValueType::Vector4,
            "quaternion" | "unityengine.quaternion" => ValueType::Quaternion,
            "handle" => ValueType::Handle,
            other => return EnumKind::from_name(other).map(ValueType::Enum),
        };
        Some(ty)
    }

    /// Number of numeric components for tuple types
    pub fn arity(self) -> Option<usize> {
        match self {
            ValueType::Vector2 => Some(2),
            ValueType::Vector3 => Some(3),
            ValueType::Vector4 | ValueType::Quaternion => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.tag())
    }
}

/// A typed parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f32),
    String(String),
    Vector2(Vector2),
    Vector3(Vector3),
    Vector4(Vector4),
    Quaternion(Quaternion),
    Handle(String),
    Enum(EnumKind, &'static str),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Vector2(_) => ValueType::Vector2,
            Value::Vector3(_) => ValueType::Vector3,
            Value::Vector4(_) => ValueType::Vector4,
            Value::Quaternion(_) => ValueType::Quaternion,
            Value::Handle(_) => ValueType::Handle,
            Value::Enum(kind, _) => ValueType::Enum(*kind),
        }
    }

    /// Convert to `target` when the conversion is lossless or a plain
    /// arity change between vector types. Returns `None` otherwise.
    pub fn coerce(self, target: ValueType) -> Option<Value> {
        if self.value_type() == target {
            return Some(self);
        }

        match (self, target) {
            (Value::Int(i), ValueType::Float) => Some(Value::Float(i as f32)),
            (Value::Float(f), ValueType::Int) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f32 {
                    Some(Value::Int(f as i64))
                } else {
                    None
                }
            }

            (Value::Vector3(v), ValueType::Vector2) => Some(Value::Vector2(Vector2::new(v.x, v.y))),
            (Value::Vector4(v), ValueType::Vector2) => Some(Value::Vector2(Vector2::new(v.x, v.y))),
            (Value::Vector2(v), ValueType::Vector3) => Some(Value::Vector3(Vector3::new(v.x, v.y, 0.0))),
            (Value::Vector4(v), ValueType::Vector3) => Some(Value::Vector3(Vector3::new(v.x, v.y, v.z))),
            (Value::Vector2(v), ValueType::Vector4) => {
                Some(Value::Vector4(Vector4::new(v.x, v.y, 0.0, 0.0)))
            }
            (Value::Vector3(v), ValueType::Vector4) => {
                Some(Value::Vector4(Vector4::new(v.x, v.y, v.z, 0.0)))
            }
            (Value::Quaternion(q), ValueType::Vector4) => {
                Some(Value::Vector4(Vector4::new(q.x, q.y, q.z, q.w)))
            }
            (Value::Vector4(v), ValueType::Quaternion) => {
                Some(Value::Quaternion(Quaternion::new(v.x, v.y, v.z, v.w)))
            }

            (Value::Enum(_, variant), ValueType::String) => Some(Value::String(variant.to_string())),
            (Value::Handle(name), ValueType::String) => Some(Value::String(name)),
            (Value::String(name), ValueType::Handle) => Some(Value::Handle(name)),
            (Value::String(text), ValueType::Enum(kind)) => {
                kind.canonical(&text).map(|v| Value::Enum(kind, v))
            }
            (Value::Enum(_, variant), ValueType::Enum(kind)) => {
                kind.canonical(variant).map(|v| Value::Enum(kind, v))
            }

            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::codec::encode(self))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<Vector2> for Value {
    fn from(v: Vector2) -> Self {
        Value::Vector2(v)
    }
}

impl From<Vector3> for Value {
    fn from(v: Vector3) -> Self {
        Value::Vector3(v)
    }
}

impl From<Vector4> for Value {
    fn from(v: Vector4) -> Self {
        Value::Vector4(v)
    }
}

impl From<Quaternion> for Value {
    fn from(v: Quaternion) -> Self {
        Value::Quaternion(v)
    }
}

/// Extraction of a concrete Rust type from a resolved value
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

macro_rules! impl_from_value {
    ($ty:ty, $value_type:expr, $variant:ident) => {
        impl FromValue for $ty {
            fn from_value(value: Value) -> Option<Self> {
                match value.coerce($value_type)? {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_from_value!(bool, ValueType::Bool, Bool);
impl_from_value!(i64, ValueType::Int, Int);
impl_from_value!(f32, ValueType::Float, Float);
impl_from_value!(String, ValueType::String, String);
impl_from_value!(Vector2, ValueType::Vector2, Vector2);
impl_from_value!(Vector3, ValueType::Vector3, Vector3);
impl_from_value!(Vector4, ValueType::Vector4, Vector4);
impl_from_value!(Quaternion, ValueType::Quaternion, Quaternion);

impl FromValue for i32 {
    fn from_value(value: Value) -> Option<Self> {
        i64::from_value(value).and_then(|v| i32::try_from(v).ok())
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        f32::from_value(value).map(f64::from)
    }
}
