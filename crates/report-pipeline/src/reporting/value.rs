//! The report value tree.
//!
//! Every stage hands its output to the assembler as a [`ReportValue`]. The
//! tree has the seven JSON primitive shapes plus a handful of extended
//! variants that stages may emit freely (narrow/unsigned integers, `f32`,
//! timestamps, float vectors). Only
//! [`super::sanitize`] turns extended variants into primitives; serializing
//! an unsanitized tree is an error.

use chrono::NaiveDateTime;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;

/// A node in the report artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportValue {
    // JSON primitives
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<ReportValue>),
    /// Ordered key/value pairs; key order is preserved in the output.
    Object(Vec<(String, ReportValue)>),

    // Extended values, converted by the sanitizer
    Int32(i32),
    UInt64(u64),
    Float32(f32),
    Timestamp(NaiveDateTime),
    FloatArray(Vec<f64>),
}

impl ReportValue {
    /// Build an object from `(key, value)` pairs, keeping their order.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ReportValue)>,
    {
        ReportValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Whether this node (not its children) is a JSON primitive shape.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Null
                | Self::Bool(_)
                | Self::Int(_)
                | Self::Float(_)
                | Self::Str(_)
                | Self::Array(_)
                | Self::Object(_)
        )
    }

    /// Whether this node and every descendant is a JSON primitive shape.
    pub fn is_sanitized(&self) -> bool {
        match self {
            Self::Array(items) => items.iter().all(ReportValue::is_sanitized),
            Self::Object(entries) => entries.iter().all(|(_, v)| v.is_sanitized()),
            Self::Float(v) => v.is_finite(),
            other => other.is_primitive(),
        }
    }

    /// Look up a key in an object node.
    pub fn get(&self, key: &str) -> Option<&ReportValue> {
        match self {
            Self::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Walk a path of object keys.
    pub fn pointer(&self, path: &[&str]) -> Option<&ReportValue> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Keys of an object node, in order.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::Object(entries) => entries.iter().map(|(k, _)| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Int32(v) => Some(i64::from(*v)),
            Self::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Float32(v) => Some(f64::from(*v)),
            Self::Int(v) => Some(*v as f64),
            Self::Int32(v) => Some(f64::from(*v)),
            Self::UInt64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ReportValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Int32(_) => "int32",
            Self::UInt64(_) => "uint64",
            Self::Float32(_) => "float32",
            Self::Timestamp(_) => "timestamp",
            Self::FloatArray(_) => "float_array",
        }
    }
}

/// Conversion of stage outputs into the report tree.
pub trait ToReportValue {
    fn to_report_value(&self) -> ReportValue;
}

impl From<bool> for ReportValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ReportValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<usize> for ReportValue {
    fn from(v: usize) -> Self {
        Self::UInt64(v as u64)
    }
}

impl From<f64> for ReportValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ReportValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ReportValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<NaiveDateTime> for ReportValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<ReportValue>> From<Option<T>> for ReportValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<ReportValue>> From<Vec<T>> for ReportValue {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Str(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Float32(v) => write!(f, "{}", v),
            Self::Timestamp(v) => write!(f, "{}", v),
            other => write!(f, "<{}>", other.variant_name()),
        }
    }
}

impl Serialize for ReportValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Self::Float(v) => Err(S::Error::custom(format!(
                "non-finite float {} in unsanitized report",
                v
            ))),
            Self::Str(v) => serializer.serialize_str(v),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            other => Err(S::Error::custom(format!(
                "unsanitized {} value in report",
                other.variant_name()
            ))),
        }
    }
}
