//! Animated value kinds.
//!
//! Keyframes hold either numbers or text (hex colors, unit-suffixed strings). Slides map a
//! pair of values and an eased amount to a new value; setters write the result out.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Number,
    Text,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::Text,
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Number(_) => None,
            Value::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64's Display already drops a trailing ".0" (75.0 -> "75").
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_script_number_formatting() {
        assert_eq!(Value::Number(75.0).to_string(), "75");
        assert_eq!(Value::Number(62.5).to_string(), "62.5");
        assert_eq!(Value::Number(-3.0).to_string(), "-3");
        assert_eq!(Value::from("#ff00ff").to_string(), "#ff00ff");
    }

    #[test]
    fn untagged_json_shape() {
        let v: Value = serde_json::from_str("12.5").unwrap();
        assert_eq!(v, Value::Number(12.5));
        let v: Value = serde_json::from_str("\"#00ffff\"").unwrap();
        assert_eq!(v.kind(), ValueKind::Text);
    }
}
