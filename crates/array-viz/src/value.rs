//! Cell value model.
//!
//! A cell holds a number, a piece of text, or nothing at all. "Nothing" ([`CellValue::Empty`]) is
//! a real value: it is what growth backfills with, and what [`VisualArray::is_empty`] looks for.
//!
//! [`VisualArray::is_empty`]: crate::VisualArray::is_empty

use crate::error::{ArrayError, ArrayResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dynamically typed cell value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
    /// The "no value" sentinel (serialized as `null`).
    #[default]
    Empty,
}

impl CellValue {
    /// Returns `true` for [`CellValue::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric reading of the value.
    ///
    /// Numbers are returned as-is, text is parsed after trimming, anything else is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Empty => None,
        }
    }

    /// Loose equality, used when comparing arrays.
    ///
    /// - numbers compare numerically, also against numeric text
    /// - text compares as strings
    /// - `Empty` equals `Empty` and the empty string
    pub fn loosely_equals(&self, other: &CellValue) -> bool {
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => a == b,
            (CellValue::Number(n), CellValue::Text(s))
            | (CellValue::Text(s), CellValue::Number(n)) => {
                s.trim().parse::<f64>().is_ok_and(|parsed| parsed == *n)
            }
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Empty, CellValue::Empty) => true,
            (CellValue::Empty, CellValue::Text(s)) | (CellValue::Text(s), CellValue::Empty) => {
                s.is_empty()
            }
            (CellValue::Empty, CellValue::Number(_)) | (CellValue::Number(_), CellValue::Empty) => {
                false
            }
        }
    }

    /// Parse a raw string according to a value-type hint.
    ///
    /// An empty raw string always yields [`CellValue::Empty`].
    pub fn parse(raw: &str, hint: ValueType) -> ArrayResult<Self> {
        if raw.is_empty() {
            return Ok(CellValue::Empty);
        }
        match hint {
            ValueType::Number => raw
                .trim()
                .parse::<f64>()
                .map(CellValue::Number)
                .map_err(|_| ArrayError::InvalidValue {
                    raw: raw.to_string(),
                    hint: hint.name(),
                }),
            ValueType::Text => Ok(CellValue::Text(raw.to_string())),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(f64::from(value))
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Number(f64::from(value))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

/// Value-type hint attached to cells of a pre-built structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Parse as a number.
    Number,
    /// Keep as text.
    #[default]
    Text,
}

impl ValueType {
    /// Resolve a hint name. Unrecognized names fall back to [`ValueType::Text`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "number" | "num" | "float" | "int" => ValueType::Number,
            _ => ValueType::Text,
        }
    }

    /// Canonical hint name.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::Text => "string",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_drops_integral_fraction() {
        assert_eq!(CellValue::from(3).to_string(), "3");
        assert_eq!(CellValue::from(3.5).to_string(), "3.5");
        assert_eq!(CellValue::from("abc").to_string(), "abc");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn test_loose_equality() {
        assert!(CellValue::from(3).loosely_equals(&CellValue::from("3")));
        assert!(CellValue::from(" 3 ").loosely_equals(&CellValue::from(3)));
        assert!(!CellValue::from("x").loosely_equals(&CellValue::from(3)));
        assert!(CellValue::Empty.loosely_equals(&CellValue::from("")));
        assert!(!CellValue::Empty.loosely_equals(&CellValue::from(0)));
    }

    #[test]
    fn test_parse_with_hint() {
        assert_eq!(
            CellValue::parse("42", ValueType::Number).unwrap(),
            CellValue::Number(42.0)
        );
        assert_eq!(
            CellValue::parse("42", ValueType::Text).unwrap(),
            CellValue::Text("42".to_string())
        );
        assert_eq!(
            CellValue::parse("", ValueType::Number).unwrap(),
            CellValue::Empty
        );
        assert!(matches!(
            CellValue::parse("forty", ValueType::Number),
            Err(ArrayError::InvalidValue { hint: "number", .. })
        ));
        assert_eq!(ValueType::from_name("weird"), ValueType::Text);
    }

    #[test]
    fn test_json_shape() {
        let values = vec![CellValue::from(1), CellValue::from("a"), CellValue::Empty];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[1.0,"a",null]"#);
        let back: Vec<CellValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
