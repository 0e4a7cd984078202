//! Field schemas and built-in profiles

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Suffix marking a field as required in its textual form (`keyword!`)
const REQUIRED_MARKER: char = '!';

/// One named field in a schema
///
/// Serialized as a plain string: the field name, with a trailing `!` when the
/// field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
}

impl FieldSpec {
    /// An optional field
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }

    /// A field that must be non-empty for the record to be importable
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }
}

impl TryFrom<String> for FieldSpec {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldSpec> for String {
    fn from(spec: FieldSpec) -> Self {
        spec.to_string()
    }
}

impl std::str::FromStr for FieldSpec {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (name, required) = match trimmed.strip_suffix(REQUIRED_MARKER) {
            Some(name) => (name.trim(), true),
            None => (trimmed, false),
        };
        if name.is_empty() {
            return Err(SchemaError::EmptyFieldName);
        }
        Ok(Self {
            name: name.to_string(),
            required,
        })
    }
}

impl std::fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.required {
            write!(f, "{}{}", self.name, REQUIRED_MARKER)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Ordered, non-empty list of uniquely named fields
///
/// Defines how a split line maps onto a record: the n-th value of a line is
/// the n-th field of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
}

impl FieldSchema {
    /// Build a schema, rejecting empty lists and duplicate names
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyFieldName);
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }

        Ok(Self { fields })
    }

    /// Build a schema from textual field specs (`name` or `name!`)
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self, SchemaError> {
        let fields = specs
            .iter()
            .map(|s| s.as_ref().parse())
            .collect::<Result<Vec<FieldSpec>, _>>()?;
        Self::new(fields)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false: a schema holds at least one field
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Position of a field by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

impl TryFrom<Vec<FieldSpec>> for FieldSchema {
    type Error = SchemaError;

    fn try_from(fields: Vec<FieldSpec>) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl From<FieldSchema> for Vec<FieldSpec> {
    fn from(schema: FieldSchema) -> Self {
        schema.fields
    }
}

/// Built-in schemas for the two supported import flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Autofill address entries, nine optional fields
    #[default]
    Address,
    /// Muted keywords, one required field
    Keyword,
}

/// Field order of the address profile, matching the input column order
pub const ADDRESS_FIELDS: [&str; 9] = [
    "name", "company", "address", "state", "city", "postal", "country", "phone", "email",
];

impl Profile {
    /// The schema this profile stands for
    pub fn schema(&self) -> FieldSchema {
        let fields = match self {
            Self::Address => ADDRESS_FIELDS.iter().map(|n| FieldSpec::optional(*n)).collect(),
            Self::Keyword => vec![FieldSpec::required("keyword")],
        };
        FieldSchema { fields }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Address => write!(f, "address"),
            Self::Keyword => write!(f, "keyword"),
        }
    }
}

impl std::str::FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "address" => Ok(Self::Address),
            "keyword" => Ok(Self::Keyword),
            _ => Err(format!("Unknown profile: {}", s)),
        }
    }
}
