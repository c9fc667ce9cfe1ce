//! String encoding of parameter values
//!
//! Overrides are persisted as `(type tag, text)` pairs. Encoding is
//! culture-invariant; decoding is lenient about decoration (labels,
//! parentheses) but strict about the number of components.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{Quaternion, Value, ValueType, Vector2, Vector3, Vector4};

/// Errors that can occur when decoding an override value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("Unknown value type: '{0}'")]
    UnknownType(String),

    #[error("Cannot parse '{text}' as {value_type}")]
    Malformed { value_type: ValueType, text: String },

    #[error("Expected {expected} components for {value_type}, found {found} in '{text}'")]
    Arity {
        value_type: ValueType,
        expected: usize,
        found: usize,
        text: String,
    },

    #[error("'{text}' is not a variant of {value_type}")]
    UnknownVariant { value_type: ValueType, text: String },

    #[error("No asset named '{0}'")]
    HandleNotFound(String),
}

/// Content lookup used to validate handle values
pub trait AssetLookup {
    fn contains_asset(&self, name: &str) -> bool;
}

/// Encode a value to its persisted text form
pub fn encode(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) | Value::Handle(s) => s.clone(),
        Value::Vector2(v) => format!("{},{}", v.x, v.y),
        Value::Vector3(v) => format!("{},{},{}", v.x, v.y, v.z),
        Value::Vector4(v) => format!("{},{},{},{}", v.x, v.y, v.z, v.w),
        Value::Quaternion(q) => format!("{},{},{},{}", q.x, q.y, q.z, q.w),
        Value::Enum(_, variant) => variant.to_string(),
    }
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").expect("number pattern is valid")
    })
}

/// Decoder for override values
#[derive(Clone, Copy, Default)]
pub struct ValueCodec<'a> {
    assets: Option<&'a dyn AssetLookup>,
}

impl std::fmt::Debug for ValueCodec<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueCodec")
            .field("assets", &self.assets.is_some())
            .finish()
    }
}

impl<'a> ValueCodec<'a> {
    /// Codec that accepts any handle name
    pub fn new() -> Self {
        Self { assets: None }
    }

    /// Codec that checks handle names against `assets`
    pub fn with_assets(assets: &'a dyn AssetLookup) -> Self {
        Self {
            assets: Some(assets),
        }
    }

    pub fn encode(&self, value: &Value) -> String {
        encode(value)
    }

    /// Decode using a stored type tag
    pub fn decode_tagged(&self, text: &str, type_tag: &str) -> Result<Option<Value>, DecodeError> {
        let value_type =
            ValueType::from_tag(type_tag).ok_or_else(|| DecodeError::UnknownType(type_tag.to_string()))?;
        self.decode(text, value_type)
    }

    /// Decode `text` as `value_type`.
    ///
    /// Empty text is `Ok(None)`: no value, as opposed to a malformed one.
    pub fn decode(&self, text: &str, value_type: ValueType) -> Result<Option<Value>, DecodeError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let malformed = || DecodeError::Malformed {
            value_type,
            text: text.to_string(),
        };

        let value = match value_type {
            ValueType::Bool => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Value::Bool(true)
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Value::Bool(false)
                } else {
                    return Err(malformed());
                }
            }
            ValueType::Int => Value::Int(trimmed.parse().map_err(|_| malformed())?),
            ValueType::Float => {
                let f: f32 = trimmed.parse().map_err(|_| malformed())?;
                if !f.is_finite() {
                    return Err(malformed());
                }
                Value::Float(f)
            }
            ValueType::String => Value::String(text.to_string()),
            ValueType::Enum(kind) => match kind.canonical(trimmed) {
                Some(variant) => Value::Enum(kind, variant),
                None => {
                    return Err(DecodeError::UnknownVariant {
                        value_type,
                        text: text.to_string(),
                    })
                }
            },
            ValueType::Handle => {
                if let Some(assets) = self.assets {
                    if !assets.contains_asset(trimmed) {
                        return Err(DecodeError::HandleNotFound(trimmed.to_string()));
                    }
                }
                Value::Handle(trimmed.to_string())
            }
            ValueType::Vector2 => {
                let c = components(text, value_type)?;
                Value::Vector2(Vector2::new(c[0], c[1]))
            }
            ValueType::Vector3 => {
                let c = components(text, value_type)?;
                Value::Vector3(Vector3::new(c[0], c[1], c[2]))
            }
            ValueType::Vector4 => {
                let c = components(text, value_type)?;
                Value::Vector4(Vector4::new(c[0], c[1], c[2], c[3]))
            }
            ValueType::Quaternion => {
                let c = components(text, value_type)?;
                Value::Quaternion(Quaternion::new(c[0], c[1], c[2], c[3]))
            }
        };

        Ok(Some(value))
    }
}

/// Extract exactly `value_type.arity()` numbers from `text`
fn components(text: &str, value_type: ValueType) -> Result<Vec<f32>, DecodeError> {
    let expected = value_type.arity().unwrap_or(0);
    let mut values = Vec::with_capacity(expected);
    for m in number_pattern().find_iter(text) {
        // overflowing literals parse to infinity, which JSON cannot store
        let v = m
            .as_str()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| DecodeError::Malformed {
                value_type,
                text: text.to_string(),
            })?;
        values.push(v);
    }

    if values.len() != expected {
        return Err(DecodeError::Arity {
            value_type,
            expected,
            found: values.len(),
            text: text.to_string(),
        });
    }
    Ok(values)
}
