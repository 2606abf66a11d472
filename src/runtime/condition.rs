//! Rule evaluation for `condition` nodes.
//!
//! Values live in the variable environment as JSON values; rules compare
//! against a literal string. Comparisons follow loose, script-like coercion:
//! `equals`/`contains` work on the textual rendering of the value, while
//! `greater`/`less` coerce both sides to numbers. A side that does not coerce
//! is `NaN` and the comparison is simply false.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    Contains,
    Greater,
    Less,
    Exists,
    /// Loaded from a document but not understood. Always evaluates to false.
    Other(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::Contains => "contains",
            Operator::Greater => "greater",
            Operator::Less => "less",
            Operator::Exists => "exists",
            Operator::Other(name) => name,
        }
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "equals" => Operator::Equals,
            "contains" => Operator::Contains,
            "greater" => Operator::Greater,
            "less" => Operator::Less,
            "exists" => Operator::Exists,
            _ => Operator::Other(value),
        }
    }
}

impl From<&str> for Operator {
    fn from(value: &str) -> Self {
        Operator::from(value.to_string())
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluates one rule. `actual` is `None` when the variable is not set.
///
/// Pure: never touches the environment and never fails.
pub fn evaluate(actual: Option<&Value>, operator: &Operator, expected: &str) -> bool {
    match operator {
        Operator::Equals => render(actual) == expected,
        Operator::Contains => render(actual).contains(expected),
        // NaN on either side makes both comparisons false.
        Operator::Greater => to_number(actual) > parse_number(expected),
        Operator::Less => to_number(actual) < parse_number(expected),
        Operator::Exists => !matches!(actual, None | Some(Value::Null)),
        Operator::Other(_) => false,
    }
}

/// Textual rendering used by `equals` and `contains`.
pub fn render(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(v) => render_value(v),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                render_float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => render_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn render_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Numeric coercion used by `greater` and `less`.
pub fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_number(s),
        Some(Value::Array(items)) => match items.as_slice() {
            [] => 0.0,
            [single] => parse_number(&render_value(single)),
            _ => f64::NAN,
        },
        Some(Value::Object(_)) => f64::NAN,
    }
}

/// Parses a literal the way a loose scripting runtime would: surrounding
/// whitespace is ignored, an empty string is zero, `0x`/`0o`/`0b` prefixes
/// are honoured, anything else unparseable is `NaN`.
pub fn parse_number(text: &str) -> f64 {
    let s = text.trim();
    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).map(|v| v as f64).unwrap_or(f64::NAN);
        }
    }

    // Rust accepts "inf"/"nan"/"infinity" spellings that must not coerce here.
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }

    s.parse::<f64>().unwrap_or(f64::NAN)
}
