//! Variable values supplied to templates.
//!
//! Code-generation handlers assemble a loosely-shaped bag of values: class
//! names, numeric defaults, feature flags and per-field lists. [`Value`] gives
//! that bag a closed set of shapes so formatting and truthiness are decided
//! by an exhaustive `match` instead of runtime type checks.

use std::collections::HashMap;

use crate::error::{Result, TemplateError};

/// A mapping from case-sensitive variable name to value.
pub type Variables = HashMap<String, Value>;

/// Suffix appended to floating-point numbers during substitution.
///
/// Matches the C# float-literal convention (`3.14f`).
pub const DEFAULT_FLOAT_SUFFIX: &str = "f";

/// A template variable value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Text, substituted verbatim.
    Str(String),
    /// Integral number.
    Int(i64),
    /// Floating-point number, substituted with a float suffix.
    Float(f64),
    /// Boolean, substituted as `true` / `false`.
    Bool(bool),
    /// Ordered sequence of items, the target of `FOREACH`.
    Seq(Vec<Value>),
    /// Nested mapping, typically one item of a sequence.
    Map(Variables),
    /// Explicit absence of a value.
    #[default]
    Null,
}

impl Value {
    /// Returns the truthiness used by `IF` blocks.
    ///
    /// - `Bool`: its own value
    /// - `Int` / `Float`: nonzero
    /// - `Str`: non-empty
    /// - `Seq` / `Map`: non-empty
    /// - `Null`: false
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Seq(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Null => false,
        }
    }

    /// Formats the value for substitution into generated source.
    ///
    /// Finite floats get `float_suffix` appended; sequences join their
    /// formatted items with `", "`; maps and null produce nothing.
    pub fn format(&self, float_suffix: &str) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Int(n) => n.to_string(),
            Value::Float(n) if n.is_finite() => format!("{}{}", n, float_suffix),
            Value::Float(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Seq(items) => items
                .iter()
                .map(|item| item.format(float_suffix))
                .collect::<Vec<_>>()
                .join(", "),
            Value::Map(_) | Value::Null => String::new(),
        }
    }

    /// Resolves a nested path through maps (by key) and sequences (by index).
    ///
    /// An empty path returns the value itself.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };

        let next = match self {
            Value::Map(map) => map.get(*first)?,
            Value::Seq(items) => {
                let index: usize = first.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
        next.get_path(rest)
    }

    /// Returns the name of this value's shape, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Null => "null",
        }
    }

    /// Extracts the sequence items, if this is a `Seq`.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Extracts the mapping, if this is a `Map`.
    pub fn as_map(&self) -> Option<&Variables> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Extracts the string, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON document into a value.
    ///
    /// Integers that fit in `i64` become `Int`; every other number becomes
    /// `Float`.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::Seq(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// Converts a JSON object into a variable mapping.
///
/// # Errors
///
/// Returns [`TemplateError::InvalidVariables`] if the document is not an object.
pub fn variables_from_json(json: serde_json::Value) -> Result<Variables> {
    match Value::from_json(json) {
        Value::Map(map) => Ok(map),
        other => Err(TemplateError::InvalidVariables(format!(
            "expected an object at the top level, found {}",
            other.kind()
        ))),
    }
}

/// Parses a JSON document into a variable mapping.
pub fn variables_from_json_str(source: &str) -> Result<Variables> {
    let json: serde_json::Value = serde_json::from_str(source)?;
    variables_from_json(json)
}

/// Parses a YAML document into a variable mapping.
pub fn variables_from_yaml_str(source: &str) -> Result<Variables> {
    let json: serde_json::Value = serde_yaml::from_str(source)?;
    variables_from_json(json)
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Int)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        // Widen through the shortest decimal form so 3.14f32 stays 3.14.
        Value::Float(n.to_string().parse().unwrap_or(n as f64))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<Variables> for Value {
    fn from(map: Variables) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}
