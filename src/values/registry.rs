//! Type tag to parser lookup.

use std::collections::{BTreeMap, HashMap};

use super::typed::{Rect, TypedValue, UDim2, Vector2, Vector3};

/// Turns raw cell text into a typed value. Never fails.
pub type ValueParser = fn(&str) -> TypedValue;

/// Maps case-insensitive type tags to parsers.
///
/// Unknown tags resolve to the string parser, so an unrecognized type column
/// degrades to raw text instead of dropping the row.
#[derive(Clone)]
pub struct TypeRegistry {
    parsers: HashMap<String, ValueParser>,
}

impl TypeRegistry {
    /// Registry with every built-in tag.
    pub fn new() -> Self {
        let mut registry = Self {
            parsers: HashMap::new(),
        };
        registry.register("number", parse_number);
        registry.register("boolean", parse_boolean);
        registry.register("string", parse_string);
        registry.register("array", parse_array);
        registry.register("dictionary", parse_dictionary);
        registry.register("vector2", parse_vector2);
        registry.register("vector3", parse_vector3);
        registry.register("udim2", parse_udim2);
        registry.register("rect", parse_rect);
        registry
    }

    /// Add or replace the parser for a tag.
    pub fn register(&mut self, tag: &str, parser: ValueParser) {
        self.parsers.insert(tag.to_lowercase(), parser);
    }

    /// Whether a tag has a dedicated parser.
    pub fn is_known(&self, tag: &str) -> bool {
        self.parsers.contains_key(&tag.to_lowercase())
    }

    /// Look up the parser for a tag, falling back to the string parser.
    pub fn resolve(&self, tag: &str) -> ValueParser {
        match self.parsers.get(&tag.to_lowercase()) {
            Some(parser) => *parser,
            None => {
                tracing::debug!(tag, "Unknown type tag, treating value as string");
                parse_string
            }
        }
    }

    /// Parse raw text according to its tag.
    pub fn parse(&self, tag: &str, raw: &str) -> TypedValue {
        (self.resolve(tag))(raw)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Numeric text to f64; anything unparseable (including NaN) becomes 0.
fn parse_f64(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| !n.is_nan())
        .unwrap_or(0.0)
}

fn parse_number(raw: &str) -> TypedValue {
    TypedValue::Number(parse_f64(raw))
}

fn parse_boolean(raw: &str) -> TypedValue {
    TypedValue::Boolean(raw.eq_ignore_ascii_case("true"))
}

fn parse_string(raw: &str) -> TypedValue {
    TypedValue::String(raw.to_string())
}

fn parse_array(raw: &str) -> TypedValue {
    if raw.is_empty() {
        return TypedValue::Array(Vec::new());
    }
    TypedValue::Array(raw.split(',').map(str::to_string).collect())
}

/// Strips at most one space from each end.
fn trim_one_space(s: &str) -> &str {
    let s = s.strip_prefix(' ').unwrap_or(s);
    s.strip_suffix(' ').unwrap_or(s)
}

fn parse_dictionary(raw: &str) -> TypedValue {
    let mut map = BTreeMap::new();
    for entry in raw.split(',') {
        // Entries without '=' carry no value and are skipped.
        if let Some((key, value)) = entry.split_once('=') {
            map.insert(trim_one_space(key).to_string(), value.to_string());
        }
    }
    TypedValue::Dictionary(map)
}

fn components(raw: &str) -> Vec<f64> {
    raw.split(',').map(parse_f64).collect()
}

fn parse_vector2(raw: &str) -> TypedValue {
    TypedValue::Vector2(Vector2::from_components(&components(raw)))
}

fn parse_vector3(raw: &str) -> TypedValue {
    TypedValue::Vector3(Vector3::from_components(&components(raw)))
}

fn parse_udim2(raw: &str) -> TypedValue {
    TypedValue::UDim2(UDim2::from_components(&components(raw)))
}

fn parse_rect(raw: &str) -> TypedValue {
    TypedValue::Rect(Rect::from_components(&components(raw)))
}
