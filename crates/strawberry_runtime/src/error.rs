//! Error types and the response envelope.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strawberry_core::{Diagnostic, LineIndex, Location};

/// Errors raised while building a schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to parse schema: {0}")]
    Syntax(String),

    #[error("schema documents cannot contain {0}")]
    InvalidDefinition(String),

    #[error("type '{0}' is defined more than once")]
    DuplicateType(String),

    #[error("field '{field}' is defined more than once on '{type_name}'")]
    DuplicateField { type_name: String, field: String },

    #[error("enum '{enum_name}' defines value '{value}' more than once")]
    DuplicateEnumValue { enum_name: String, value: String },

    #[error("field '{field}' on '{type_name}' has no type")]
    MissingFieldType { type_name: String, field: String },

    #[error("unknown type '{name}' referenced by '{referenced_by}'")]
    UnknownType { name: String, referenced_by: String },

    #[error("schema has no query type")]
    MissingQueryType,

    #[error("{operation} root type '{name}' must be an object type")]
    InvalidRootType { operation: String, name: String },

    #[error("type '{0}' must define at least one field")]
    EmptyFields(String),

    #[error("'{referenced_by}' uses '{name}' as an output type, but it is an input type")]
    NotOutputType { name: String, referenced_by: String },

    #[error("'{referenced_by}' uses '{name}' as an input type, but it is an output type")]
    NotInputType { name: String, referenced_by: String },

    #[error("'{type_name}' implements '{interface}', which is not an interface")]
    InvalidImplements { type_name: String, interface: String },

    #[error("'{type_name}' does not define field '{field}' required by interface '{interface}'")]
    MissingInterfaceField {
        type_name: String,
        interface: String,
        field: String,
    },

    #[error("union '{union}' includes '{member}', which is not an object type")]
    InvalidUnionMember { union: String, member: String },
}

/// A segment of a response path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(field: &str) -> Self {
        Self::Field(field.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// An entry of a response's `errors` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<IndexMap<String, Value>>,
}

impl GraphQLError {
    /// Creates a new error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: None,
            extensions: None,
        }
    }

    /// Converts a syntax or validation diagnostic.
    #[must_use]
    pub fn from_diagnostic(diagnostic: &Diagnostic, index: &LineIndex) -> Self {
        let mut error = Self::new(diagnostic.title.clone());
        if let Some(span) = diagnostic.primary_span() {
            error.locations.push(index.span_location(span));
        }
        error
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = Some(path);
        self
    }

    /// Adds an extension entry.
    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value);
        self
    }

    /// Sets the `code` extension.
    #[must_use]
    pub fn with_code(self, code: impl Into<String>) -> Self {
        self.with_extension("code", Value::String(code.into()))
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(path) = &self.path {
            let path: Vec<_> = path.iter().map(ToString::to_string).collect();
            write!(f, " (at {})", path.join("."))?;
        }
        Ok(())
    }
}

impl std::error::Error for GraphQLError {}

/// A GraphQL response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// `None` when the request failed before execution started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQLError>>,
}

impl Response {
    /// Creates a successful response.
    #[must_use]
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// Creates a response that carries only errors.
    #[must_use]
    pub fn errors(errors: Vec<GraphQLError>) -> Self {
        Self {
            data: None,
            errors: Some(errors),
        }
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }

    /// Returns the error messages in order.
    #[must_use]
    pub fn error_messages(&self) -> Vec<&str> {
        self.errors
            .iter()
            .flatten()
            .map(|error| error.message.as_str())
            .collect()
    }
}
