use crate::error::{Result, UcdmError};
use std::fmt;

/// Value of one (file, tag) pair in a scan
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScanValue {
    /// The file carries the tag; the value may be an empty string
    Present(String),
    /// The tag was requested but the file does not carry it
    Absent,
    /// The tag is outside the scanned tag set
    NotRequested,
}

impl ScanValue {
    /// Builds a value from the scanner's optional string
    pub fn from_option(value: Option<&str>) -> Self {
        match value {
            Some(v) => ScanValue::Present(v.to_string()),
            None => ScanValue::Absent,
        }
    }

    /// Returns the string if present
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScanValue::Present(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ScanValue::Present(_))
    }
}

/// Result of evaluating an attribute on a unit
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(untagged))]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl AttributeValue {
    /// Returns the text payload, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a text value to an integer value
    ///
    /// Leading/trailing whitespace is ignored. DICOM integer strings such as
    /// "+3" are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is text that does not parse, or a
    /// float/bool
    pub fn into_integer(self) -> Result<AttributeValue> {
        match self {
            AttributeValue::Integer(_) => Ok(self),
            AttributeValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(AttributeValue::Integer)
                .map_err(|e| UcdmError::InvalidValue(format!("'{}' is not an integer: {}", s, e))),
            other => Err(UcdmError::InvalidValue(format!(
                "cannot convert {:?} to an integer",
                other
            ))),
        }
    }

    /// Converts a text or integer value to a float value
    ///
    /// # Errors
    ///
    /// Returns an error if the value is text that does not parse, or a bool
    pub fn into_float(self) -> Result<AttributeValue> {
        match self {
            AttributeValue::Float(_) => Ok(self),
            AttributeValue::Integer(i) => Ok(AttributeValue::Float(i as f64)),
            AttributeValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(AttributeValue::Float)
                .map_err(|e| UcdmError::InvalidValue(format!("'{}' is not a number: {}", s, e))),
            other => Err(UcdmError::InvalidValue(format!(
                "cannot convert {:?} to a float",
                other
            ))),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(s) => write!(f, "{}", s),
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Float(x) => write!(f, "{}", x),
            AttributeValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}
