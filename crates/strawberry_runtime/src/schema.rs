//! Schema model.
//!
//! A [`Schema`] is the finished, validated form produced by
//! [`SchemaBuilder::finish`](crate::SchemaBuilder::finish) or
//! [`Schema::from_sdl`]. It owns the type map together with the resolvers,
//! permissions and validation rules used to execute requests.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strawberry_validation::ValidationRule;

use crate::builder::SchemaBuilder;
use crate::field::FederationField;
use crate::permission::BoxedPermission;
use crate::resolver::ResolverMap;
use crate::types::{TypeRef, BUILTIN_SCALARS};

/// Reason printed when `@deprecated` carries no argument.
pub const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// Schema-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaConfig {
    /// Camel-case field and argument names derived from Rust names.
    pub auto_camel_case: bool,
    /// Rejects operations nested deeper than this.
    pub max_depth: Option<usize>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            auto_camel_case: true,
            max_depth: None,
        }
    }
}

impl SchemaConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn auto_camel_case(mut self, enabled: bool) -> Self {
        self.auto_camel_case = enabled;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// A GraphQL schema.
#[derive(Clone)]
pub struct Schema {
    pub(crate) query_type: String,
    pub(crate) mutation_type: Option<String>,
    pub(crate) subscription_type: Option<String>,
    pub(crate) types: IndexMap<String, TypeDef>,
    pub(crate) config: SchemaConfig,
    pub(crate) resolvers: Arc<ResolverMap>,
    pub(crate) permissions: Arc<HashMap<String, Vec<BoxedPermission>>>,
    pub(crate) validation_rules: Vec<Arc<dyn ValidationRule>>,
}

impl Schema {
    /// Starts building a schema.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    #[must_use]
    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    #[must_use]
    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_deref()
    }

    #[must_use]
    pub fn subscription_type(&self) -> Option<&str> {
        self.subscription_type.as_deref()
    }

    /// Gets a type by name.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Returns all types, built-in scalars first, then in registration order.
    pub fn types(&self) -> impl Iterator<Item = (&String, &TypeDef)> {
        self.types.iter()
    }

    #[must_use]
    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    #[must_use]
    pub fn resolvers(&self) -> &ResolverMap {
        &self.resolvers
    }

    #[must_use]
    pub fn validation_rules(&self) -> &[Arc<dyn ValidationRule>] {
        &self.validation_rules
    }

    /// Looks up a field of an object or interface type.
    #[must_use]
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        self.get_type(type_name)?.fields()?.get(field_name)
    }

    /// Returns the permissions checked before `type_name.field_name` resolves.
    #[must_use]
    pub fn permissions(&self, type_name: &str, field_name: &str) -> &[BoxedPermission] {
        self.permissions
            .get(&format!("{type_name}.{field_name}"))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the object types an abstract type can resolve to.
    #[must_use]
    pub fn possible_types(&self, abstract_type: &str) -> Vec<&str> {
        match self.get_type(abstract_type) {
            Some(TypeDef::Union(def)) => def.members.iter().map(String::as_str).collect(),
            Some(TypeDef::Interface(_)) => self
                .types
                .values()
                .filter_map(|ty| match ty {
                    TypeDef::Object(object)
                        if object.implements.iter().any(|name| name == abstract_type) =>
                    {
                        Some(object.name.as_str())
                    }
                    _ => None,
                })
                .collect(),
            Some(TypeDef::Object(def)) => vec![def.name.as_str()],
            _ => Vec::new(),
        }
    }

    /// Returns true if an object of type `object_type` satisfies the type
    /// condition `condition`.
    #[must_use]
    pub fn is_subtype(&self, condition: &str, object_type: &str) -> bool {
        condition == object_type || self.possible_types(condition).contains(&object_type)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("query_type", &self.query_type)
            .field("mutation_type", &self.mutation_type)
            .field("subscription_type", &self.subscription_type)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .field("resolvers", &self.resolvers)
            .field("validation_rules", &self.validation_rules.len())
            .finish()
    }
}

/// A type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDef {
    Scalar(ScalarDef),
    Object(ObjectDef),
    Interface(InterfaceDef),
    Union(UnionDef),
    Enum(EnumDef),
    InputObject(InputObjectDef),
}

impl TypeDef {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(def) => &def.name,
            Self::Object(def) => &def.name,
            Self::Interface(def) => &def.name,
            Self::Union(def) => &def.name,
            Self::Enum(def) => &def.name,
            Self::InputObject(def) => &def.name,
        }
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Scalar(def) => def.description.as_deref(),
            Self::Object(def) => def.description.as_deref(),
            Self::Interface(def) => def.description.as_deref(),
            Self::Union(def) => def.description.as_deref(),
            Self::Enum(def) => def.description.as_deref(),
            Self::InputObject(def) => def.description.as_deref(),
        }
    }

    /// Returns the output fields of object and interface types.
    #[must_use]
    pub fn fields(&self) -> Option<&IndexMap<String, FieldDef>> {
        match self {
            Self::Object(def) => Some(&def.fields),
            Self::Interface(def) => Some(&def.fields),
            _ => None,
        }
    }

    /// Scalars, enums and input objects.
    #[must_use]
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_))
    }

    /// Everything except input objects.
    #[must_use]
    pub fn is_output(&self) -> bool {
        !matches!(self, Self::InputObject(_))
    }

    /// Scalars and enums.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    /// Interfaces and unions.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(_) | Self::Union(_))
    }

    #[must_use]
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Scalar(def) if BUILTIN_SCALARS.contains(&def.name.as_str()))
    }

    /// Lower-case kind name used in messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Object(_) => "object",
            Self::Interface(_) => "interface",
            Self::Union(_) => "union",
            Self::Enum(_) => "enum",
            Self::InputObject(_) => "input object",
        }
    }
}

/// Scalar type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarDef {
    pub name: String,
    pub description: Option<String>,
    pub specified_by_url: Option<String>,
}

/// Object type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
    pub implements: Vec<String>,
}

/// Interface type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
    pub implements: Vec<String>,
}

/// Union type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionDef {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
}

/// Enum type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValueDef>,
}

impl EnumDef {
    /// Creates an enum with no values.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a value.
    #[must_use]
    pub fn value(mut self, value: EnumValueDef) -> Self {
        self.values.push(value);
        self
    }

    /// Finds a value by GraphQL name.
    #[must_use]
    pub fn find_value(&self, name: &str) -> Option<&EnumValueDef> {
        self.values.iter().find(|value| value.name == name)
    }
}

/// Enum value definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
}

impl EnumValueDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            deprecation_reason: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecation_reason(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecation_reason.is_some()
    }
}

/// Input object type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputValueDef>,
}

/// Field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// Rust-side name; resolvers see the parent value keyed by it.
    pub origin_name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: IndexMap<String, InputValueDef>,
    pub deprecation_reason: Option<String>,
    pub default_value: Option<Value>,
    pub is_subscription: bool,
    pub federation: FederationField,
}

impl FieldDef {
    /// Creates a field whose origin name equals its GraphQL name.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        let name = name.into();
        Self {
            origin_name: name.clone(),
            name,
            description: None,
            ty,
            arguments: IndexMap::new(),
            deprecation_reason: None,
            default_value: None,
            is_subscription: false,
            federation: FederationField::default(),
        }
    }

    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecation_reason.is_some()
    }
}

/// Argument or input field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputValueDef {
    pub name: String,
    /// Rust-side name; resolvers receive the value under it.
    pub origin_name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
}

impl InputValueDef {
    /// Creates an input value whose origin name equals its GraphQL name.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        let name = name.into();
        Self {
            origin_name: name.clone(),
            name,
            description: None,
            ty,
            default_value: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Interface, Object, Union};
    use crate::field::field;

    fn schema() -> Schema {
        Schema::builder()
            .interface(Interface::new("Node").field("id", field().ty("ID!")))
            .object(
                Object::new("User")
                    .implements("Node")
                    .field("id", field().ty("ID!")),
            )
            .object(Object::new("Post").field("title", field().ty("String")))
            .union(Union::new("SearchResult").member("User").member("Post"))
            .object(Object::new("Query").field("node", field().ty("Node")))
            .finish()
            .unwrap()
    }

    #[test]
    fn test_lookup() {
        let schema = schema();
        assert_eq!(schema.query_type(), "Query");
        assert_eq!(schema.mutation_type(), None);
        assert_eq!(schema.field("User", "id").unwrap().ty.to_string(), "ID!");
        assert!(schema.field("SearchResult", "id").is_none());
        assert!(schema.get_type("String").unwrap().is_builtin());
        assert_eq!(schema.get_type("SearchResult").unwrap().kind(), "union");
    }

    #[test]
    fn test_possible_types() {
        let schema = schema();
        assert_eq!(schema.possible_types("Node"), vec!["User"]);
        assert_eq!(schema.possible_types("SearchResult"), vec!["User", "Post"]);
        assert!(schema.is_subtype("Node", "User"));
        assert!(schema.is_subtype("Post", "Post"));
        assert!(!schema.is_subtype("Node", "Post"));
    }

    #[test]
    fn test_enum_def() {
        let def = EnumDef::new("Color")
            .description("Colors")
            .value(EnumValueDef::new("RED"))
            .value(EnumValueDef::new("BLUE").deprecation_reason("gone"));
        assert!(def.find_value("BLUE").unwrap().is_deprecated());
        assert!(def.find_value("GREEN").is_none());
    }
}
