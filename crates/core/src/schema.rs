//! Field Binding Tables.
//!
//! A [`RecordType`] is plain data: a name, a root [`Locator`] template and an
//! ordered list of [`FieldBinding`]s. Tables are declared once (in code or in a
//! JSON profile) and shared read-only afterwards. Nothing here is validated at
//! declaration time; the populator reports configuration problems when it
//! first touches a table.

use crate::error::ConfigurationError;
use crate::locator::{Dialect, Locator};
use crate::record::ScalarValue;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Declared schema of a record: root locator plus field bindings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordType {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    root: Option<Locator>,
    #[serde(default)]
    fields: Vec<FieldBinding>,
}

impl RecordType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), root: None, fields: Vec::new() }
    }

    pub fn with_root(mut self, root: impl Into<Locator>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_field(mut self, field: FieldBinding) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = FieldBinding>,
    {
        self.fields.extend(fields);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> Option<&Locator> {
        self.root.as_ref()
    }

    /// Root locator, or a configuration error when none (or a blank one) is declared.
    pub fn root_locator(&self) -> Result<&Locator, ConfigurationError> {
        match &self.root {
            Some(root) if !root.is_blank() => Ok(root),
            _ => Err(ConfigurationError::MissingRoot { record: self.name.clone() }),
        }
    }

    /// Dialect of the root locator, if one is declared.
    pub fn dialect(&self) -> Option<Dialect> {
        self.root.as_ref().map(Locator::dialect)
    }

    pub fn fields(&self) -> &[FieldBinding] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldBinding> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// One row of a Field Binding Table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldBinding {
    name: String,
    #[serde(default)]
    fragment: String,
    #[serde(default = "default_inherited")]
    inherited: bool,
    #[serde(default)]
    kind: FieldKind,
}

fn default_inherited() -> bool {
    true
}

impl FieldBinding {
    /// Text field resolved at `parent + fragment`.
    pub fn scalar(name: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fragment: fragment.into(),
            inherited: true,
            kind: FieldKind::Scalar(ScalarSpec::default()),
        }
    }

    /// Sub-record of type `record` anchored at `parent + fragment`.
    pub fn nested(
        name: impl Into<String>,
        fragment: impl Into<String>,
        record: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            fragment: fragment.into(),
            inherited: true,
            kind: FieldKind::Nested { record: record.into() },
        }
    }

    /// Node the enclosing record is anchored to.
    pub fn handle(name: impl Into<String>) -> Self {
        Self { name: name.into(), fragment: String::new(), inherited: true, kind: FieldKind::Handle }
    }

    /// Resolve the fragment on its own instead of appending it to the parent locator.
    pub fn absolute(mut self) -> Self {
        self.inherited = false;
        self
    }

    pub fn with_shape(mut self, shape: ScalarShape) -> Self {
        if let FieldKind::Scalar(spec) = &mut self.kind {
            spec.shape = shape;
        }
        self
    }

    /// Read the named attribute instead of the node text.
    pub fn from_attribute(mut self, attribute: impl Into<String>) -> Self {
        if let FieldKind::Scalar(spec) = &mut self.kind {
            spec.attribute = Some(attribute.into());
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Dialect implied by the fragment. Handles carry no fragment.
    pub fn dialect(&self) -> Option<Dialect> {
        match self.kind {
            FieldKind::Handle => None,
            _ if self.fragment.trim().is_empty() => None,
            _ => Some(Dialect::infer(&self.fragment)),
        }
    }

    /// Locator this field resolves at when its record is anchored at `base`.
    pub fn effective_locator(&self, base: &Locator) -> Locator {
        if self.inherited { base.join(&self.fragment) } else { Locator::new(self.fragment.as_str()) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Scalar(ScalarSpec),
    Nested { record: String },
    Handle,
}

impl Default for FieldKind {
    fn default() -> Self {
        FieldKind::Scalar(ScalarSpec::default())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarSpec {
    #[serde(default)]
    pub shape: ScalarShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

/// Expected shape of a scalar's text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarShape {
    #[default]
    Text,
    /// The whole trimmed text is a signed integer.
    Integer,
    /// The first run of digits anywhere in the text ("3 class comments").
    Count,
}

impl ScalarShape {
    /// Converts raw text; `None` means the text does not fit the shape.
    pub fn convert(self, text: &str) -> Option<ScalarValue> {
        match self {
            ScalarShape::Text => Some(ScalarValue::Text(text.to_owned())),
            ScalarShape::Integer => text.trim().parse::<i64>().ok().map(ScalarValue::Integer),
            ScalarShape::Count => {
                let digits: String = text
                    .chars()
                    .skip_while(|ch| !ch.is_ascii_digit())
                    .take_while(char::is_ascii_digit)
                    .collect();
                digits.parse::<i64>().ok().map(ScalarValue::Integer)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScalarShape::Text => "text",
            ScalarShape::Integer => "integer",
            ScalarShape::Count => "count",
        }
    }
}

impl Display for ScalarShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
