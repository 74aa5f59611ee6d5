//! Populated records and the typed [`Record`] bridge.

use crate::error::{ConfigurationError, ExtractError};
use crate::schema::RecordType;
use crate::tree::NodeHandle;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Text(String),
    Integer(i64),
}

impl ScalarValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(text) => Some(text),
            ScalarValue::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ScalarValue::Integer(value) => Some(*value),
            ScalarValue::Text(_) => None,
        }
    }
}

impl Display for ScalarValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Text(text) => write!(f, "{text:?}"),
            ScalarValue::Integer(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(ScalarValue),
    Nested(PopulatedRecord),
    Handle(NodeHandle),
}

impl FieldValue {
    fn describe(&self) -> &'static str {
        match self {
            FieldValue::Scalar(ScalarValue::Text(_)) => "text",
            FieldValue::Scalar(ScalarValue::Integer(_)) => "an integer",
            FieldValue::Nested(_) => "a nested record",
            FieldValue::Handle(_) => "a node handle",
        }
    }
}

/// Handles compare equal to each other so that equality only ever looks at content.
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Scalar(a), FieldValue::Scalar(b)) => a == b,
            (FieldValue::Nested(a), FieldValue::Nested(b)) => a == b,
            (FieldValue::Handle(_), FieldValue::Handle(_)) => true,
            _ => false,
        }
    }
}

/// Immutable result of populating one record type.
///
/// Fields appear in declaration order. Nested fields skipped by the recursion
/// guard are absent.
#[derive(Clone, Debug)]
pub struct PopulatedRecord {
    record_type: String,
    fields: Vec<(String, FieldValue)>,
}

impl PopulatedRecord {
    pub fn new(record_type: impl Into<String>, fields: Vec<(String, FieldValue)>) -> Self {
        Self { record_type: record_type.into(), fields }
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(field, _)| field == name).map(|(_, value)| value)
    }

    fn require(&self, name: &str) -> Result<&FieldValue, ConfigurationError> {
        self.get(name).ok_or_else(|| ConfigurationError::UnknownField {
            record: self.record_type.clone(),
            field: name.to_owned(),
        })
    }

    fn mismatch(&self, name: &str, expected: &'static str, value: &FieldValue) -> ConfigurationError {
        ConfigurationError::FieldType {
            record: self.record_type.clone(),
            field: name.to_owned(),
            expected,
            actual: value.describe(),
        }
    }

    pub fn text(&self, name: &str) -> Result<&str, ConfigurationError> {
        match self.require(name)? {
            FieldValue::Scalar(ScalarValue::Text(text)) => Ok(text),
            other => Err(self.mismatch(name, "text", other)),
        }
    }

    pub fn integer(&self, name: &str) -> Result<i64, ConfigurationError> {
        match self.require(name)? {
            FieldValue::Scalar(ScalarValue::Integer(value)) => Ok(*value),
            other => Err(self.mismatch(name, "an integer", other)),
        }
    }

    /// Nested record, or `None` when the field was skipped by the recursion guard.
    pub fn nested(&self, name: &str) -> Result<Option<&PopulatedRecord>, ConfigurationError> {
        match self.get(name) {
            None => Ok(None),
            Some(FieldValue::Nested(record)) => Ok(Some(record)),
            Some(other) => Err(self.mismatch(name, "a nested record", other)),
        }
    }

    pub fn handle(&self, name: &str) -> Result<NodeHandle, ConfigurationError> {
        match self.require(name)? {
            FieldValue::Handle(handle) => Ok(*handle),
            other => Err(self.mismatch(name, "a node handle", other)),
        }
    }

    /// First handle field, if the record type declares one.
    pub fn anchor(&self) -> Option<NodeHandle> {
        self.fields.iter().find_map(|(_, value)| match value {
            FieldValue::Handle(handle) => Some(*handle),
            _ => None,
        })
    }

    pub fn ensure_type(&self, expected: &str) -> Result<(), ConfigurationError> {
        if self.record_type == expected {
            Ok(())
        } else {
            Err(ConfigurationError::RecordTypeMismatch {
                expected: expected.to_owned(),
                actual: self.record_type.clone(),
            })
        }
    }

    fn content(&self) -> impl Iterator<Item = &(String, FieldValue)> {
        self.fields.iter().filter(|(_, value)| !matches!(value, FieldValue::Handle(_)))
    }
}

/// Structural equality: same type and pairwise equal scalar and nested values.
impl PartialEq for PopulatedRecord {
    fn eq(&self, other: &Self) -> bool {
        self.record_type == other.record_type && self.content().eq(other.content())
    }
}

impl Serialize for PopulatedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Display for PopulatedRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {{", self.record_type)?;
        for (idx, (name, value)) in self.fields.iter().enumerate() {
            let sep = if idx == 0 { " " } else { ", " };
            match value {
                FieldValue::Scalar(scalar) => write!(f, "{sep}{name}: {scalar}")?,
                FieldValue::Nested(record) => write!(f, "{sep}{name}: {record}")?,
                FieldValue::Handle(handle) => write!(f, "{sep}{name}: {handle}")?,
            }
        }
        if self.fields.is_empty() { f.write_str("}") } else { f.write_str(" }") }
    }
}

/// A Rust type whose values are populated from a declared [`RecordType`].
pub trait Record: Sized {
    /// Binding table of this type, built once.
    fn record_type() -> &'static RecordType;

    /// Tables of the types this one nests, so they can be registered alongside.
    fn nested_types() -> Vec<&'static RecordType> {
        Vec::new()
    }

    fn from_record(record: PopulatedRecord) -> Result<Self, ExtractError>;
}
