//! Statement descriptors and parameter values.
//!
//! A `StatementDescriptor` is the immutable unit the session sends to the
//! server: query text, named parameters and the "include statistics" flag.

use crate::error::SessionError;
use crate::transport::messages::WireStatement;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Parameter value bound to a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    /// NULL value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
    /// Binary data (sent as a list of byte values)
    Binary(Vec<u8>),
    /// List of values
    List(Vec<Parameter>),
    /// Map of values
    Map(BTreeMap<String, Parameter>),
}

impl Parameter {
    /// Convert to the JSON value sent on the wire.
    ///
    /// # Errors
    ///
    /// NaN and infinite floats have no JSON representation.
    pub fn to_json(&self) -> Result<Value, SessionError> {
        match self {
            Parameter::Null => Ok(Value::Null),
            Parameter::Boolean(b) => Ok(Value::Bool(*b)),
            Parameter::Integer(i) => Ok(Value::from(*i)),
            Parameter::Float(f) => Number::from_f64(*f).map(Value::Number).ok_or_else(|| {
                SessionError::InvalidState(format!(
                    "cannot bind non-finite float {}: NaN and Infinity are not supported",
                    f
                ))
            }),
            Parameter::String(s) => Ok(Value::String(s.clone())),
            Parameter::Binary(b) => Ok(Value::Array(b.iter().map(|x| Value::from(*x)).collect())),
            Parameter::List(items) => items
                .iter()
                .map(Parameter::to_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Parameter::Map(entries) => {
                let mut map = Map::new();
                for (k, v) in entries {
                    map.insert(k.clone(), v.to_json()?);
                }
                Ok(Value::Object(map))
            }
        }
    }
}

impl From<bool> for Parameter {
    fn from(value: bool) -> Self {
        Parameter::Boolean(value)
    }
}

impl From<i32> for Parameter {
    fn from(value: i32) -> Self {
        Parameter::Integer(value as i64)
    }
}

impl From<i64> for Parameter {
    fn from(value: i64) -> Self {
        Parameter::Integer(value)
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Float(value)
    }
}

impl From<String> for Parameter {
    fn from(value: String) -> Self {
        Parameter::String(value)
    }
}

impl From<&str> for Parameter {
    fn from(value: &str) -> Self {
        Parameter::String(value.to_string())
    }
}

impl From<Vec<u8>> for Parameter {
    fn from(value: Vec<u8>) -> Self {
        Parameter::Binary(value)
    }
}

impl From<Vec<Parameter>> for Parameter {
    fn from(value: Vec<Parameter>) -> Self {
        Parameter::List(value)
    }
}

impl<T: Into<Parameter>> From<Option<T>> for Parameter {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Parameter::Null)
    }
}

/// Parameters keyed by name. Positional parameters use the keys `"1"..`.
pub type ParameterMap = BTreeMap<String, Parameter>;

/// Immutable statement: text, parameters and statistics flag.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementDescriptor {
    text: String,
    parameters: ParameterMap,
    want_stats: bool,
}

impl StatementDescriptor {
    /// Create a descriptor with no parameters.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: ParameterMap::new(),
            want_stats: false,
        }
    }

    /// Create a descriptor with the given parameters and statistics flag.
    pub fn with_parameters(text: impl Into<String>, parameters: ParameterMap, want_stats: bool) -> Self {
        Self {
            text: text.into(),
            parameters,
            want_stats,
        }
    }

    /// Create a descriptor from text with `?` placeholders and positional
    /// values. Placeholders are rewritten to `$1..$n`.
    pub fn positional(text: &str, values: Vec<Parameter>, want_stats: bool) -> Self {
        let (text, _) = rewrite_placeholders(text);
        let parameters = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| ((i + 1).to_string(), v))
            .collect();
        Self {
            text,
            parameters,
            want_stats,
        }
    }

    /// Return a copy with a different statistics flag.
    pub fn stats(mut self, want_stats: bool) -> Self {
        self.want_stats = want_stats;
        self
    }

    /// Query text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bound parameters.
    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    /// Whether statistics were requested.
    pub fn want_stats(&self) -> bool {
        self.want_stats
    }

    /// Convert to the wire representation.
    pub(crate) fn to_wire(&self) -> Result<WireStatement, SessionError> {
        let mut parameters = Map::new();
        for (name, value) in &self.parameters {
            parameters.insert(name.clone(), value.to_json()?);
        }
        Ok(WireStatement::new(
            self.text.clone(),
            parameters,
            self.want_stats,
        ))
    }
}

/// Rewrite `?` placeholders outside quoted literals and backtick-quoted
/// identifiers into `$1`, `$2`, ... Returns the new text and the number of
/// placeholders found.
pub fn rewrite_placeholders(text: &str) -> (String, usize) {
    let mut out = String::with_capacity(text.len() + 8);
    let mut count = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' && q != '`' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    out.push(c);
                }
                '?' => {
                    count += 1;
                    out.push('$');
                    out.push_str(&count.to_string());
                }
                _ => out.push(c),
            },
        }
    }

    (out, count)
}
