//! The value union produced by the type registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Two-component vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

/// Three-component vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Two (scale, offset) pairs, one per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UDim2 {
    pub x_scale: f64,
    pub x_offset: f64,
    pub y_scale: f64,
    pub y_offset: f64,
}

/// Axis-aligned rectangle given by its min and max corners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Reads component `i`, or 0 when missing.
fn component(parts: &[f64], i: usize) -> f64 {
    parts.get(i).copied().unwrap_or(0.0)
}

impl Vector2 {
    pub fn from_components(parts: &[f64]) -> Self {
        Self {
            x: component(parts, 0),
            y: component(parts, 1),
        }
    }
}

impl Vector3 {
    pub fn from_components(parts: &[f64]) -> Self {
        Self {
            x: component(parts, 0),
            y: component(parts, 1),
            z: component(parts, 2),
        }
    }
}

impl UDim2 {
    pub fn from_components(parts: &[f64]) -> Self {
        Self {
            x_scale: component(parts, 0),
            x_offset: component(parts, 1),
            y_scale: component(parts, 2),
            y_offset: component(parts, 3),
        }
    }
}

impl Rect {
    pub fn from_components(parts: &[f64]) -> Self {
        Self {
            min_x: component(parts, 0),
            min_y: component(parts, 1),
            max_x: component(parts, 2),
            max_y: component(parts, 3),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A parsed sheet value. Immutable once built; equality is structural.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    Number(f64),
    Boolean(bool),
    String(String),
    Array(Vec<String>),
    Dictionary(BTreeMap<String, String>),
    Vector2(Vector2),
    Vector3(Vector3),
    #[serde(rename = "udim2")]
    UDim2(UDim2),
    Rect(Rect),
}

impl TypedValue {
    /// The type tag that produces this variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            TypedValue::Number(_) => "number",
            TypedValue::Boolean(_) => "boolean",
            TypedValue::String(_) => "string",
            TypedValue::Array(_) => "array",
            TypedValue::Dictionary(_) => "dictionary",
            TypedValue::Vector2(_) => "vector2",
            TypedValue::Vector3(_) => "vector3",
            TypedValue::UDim2(_) => "udim2",
            TypedValue::Rect(_) => "rect",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            TypedValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            TypedValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            TypedValue::Dictionary(map) => Some(map),
            _ => None,
        }
    }
}

impl From<f64> for TypedValue {
    fn from(n: f64) -> Self {
        TypedValue::Number(n)
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Boolean(b)
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::String(s.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::String(s)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Number(n) => write!(f, "{}", n),
            TypedValue::Boolean(b) => write!(f, "{}", b),
            TypedValue::String(s) => f.write_str(s),
            TypedValue::Array(items) => write!(f, "[{}]", items.join(", ")),
            TypedValue::Dictionary(map) => {
                let entries: Vec<String> = map.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{{{}}}", entries.join(", "))
            }
            TypedValue::Vector2(v) => write!(f, "({}, {})", v.x, v.y),
            TypedValue::Vector3(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            TypedValue::UDim2(u) => write!(
                f,
                "{{{}, {}}}, {{{}, {}}}",
                u.x_scale, u.x_offset, u.y_scale, u.y_offset
            ),
            TypedValue::Rect(r) => write!(f, "({}, {}) - ({}, {})", r.min_x, r.min_y, r.max_x, r.max_y),
        }
    }
}
