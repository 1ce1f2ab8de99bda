//! Enum wrapping.
//!
//! Enums enter a schema in one of two shapes. A Rust enum implementing
//! [`GraphQLEnum`] (usually through `#[derive(GraphQLEnum)]`) is wrapped by
//! [`enum_type`], and the wrapper keeps the enum as its type parameter:
//! parsing a value name yields the original enum. An enum known only as a
//! runtime [`EnumDef`] is wrapped by [`enum_from_definition`] and parses to
//! plain JSON values, since no Rust type stands behind it.

use std::fmt;
use std::marker::PhantomData;

use serde_json::Value;

use crate::schema::{EnumDef, EnumValueDef};

/// A Rust enum exposed as a GraphQL enum.
pub trait GraphQLEnum: Sized + 'static {
    /// The GraphQL type name.
    const NAME: &'static str;

    const DESCRIPTION: Option<&'static str> = None;

    /// The GraphQL values, in declaration order.
    fn values() -> Vec<EnumValueDef>;

    /// Returns the GraphQL name of this value.
    fn value_name(&self) -> &'static str;

    /// Looks up a value by GraphQL name.
    fn from_value_name(name: &str) -> Option<Self>;
}

/// Wraps `E` for schema inclusion.
#[must_use]
pub fn enum_type<E: GraphQLEnum>() -> EnumType<E> {
    EnumType {
        name: None,
        description: None,
        marker: PhantomData,
    }
}

/// Wraps an enum that exists only as a definition.
#[must_use]
pub fn enum_from_definition(definition: EnumDef) -> AnyEnumType {
    AnyEnumType { definition }
}

/// A GraphQL enum backed by the Rust enum `E`.
pub struct EnumType<E> {
    name: Option<String>,
    description: Option<String>,
    marker: PhantomData<fn() -> E>,
}

impl<E: GraphQLEnum> EnumType<E> {
    /// Overrides the GraphQL name. The Rust type is unchanged.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn graphql_name(&self) -> &str {
        self.name.as_deref().unwrap_or(E::NAME)
    }

    /// Parses a GraphQL value name into `E`.
    #[must_use]
    pub fn parse(&self, value: &str) -> Option<E> {
        E::from_value_name(value)
    }

    /// Serializes a value as its GraphQL name.
    #[must_use]
    pub fn serialize(&self, value: &E) -> Value {
        Value::String(value.value_name().to_string())
    }

    /// Returns the schema definition.
    #[must_use]
    pub fn definition(&self) -> EnumDef {
        EnumDef {
            name: self.graphql_name().to_string(),
            description: self
                .description
                .clone()
                .or_else(|| E::DESCRIPTION.map(str::to_string)),
            values: E::values(),
        }
    }

    /// Forgets the Rust type, keeping only the definition.
    #[must_use]
    pub fn erase(self) -> AnyEnumType {
        AnyEnumType {
            definition: self.definition(),
        }
    }
}

impl<E> Clone for EnumType<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            marker: PhantomData,
        }
    }
}

impl<E: GraphQLEnum> fmt::Debug for EnumType<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumType")
            .field("name", &self.graphql_name())
            .finish()
    }
}

impl<E: GraphQLEnum> From<EnumType<E>> for EnumDef {
    fn from(wrapper: EnumType<E>) -> Self {
        wrapper.definition()
    }
}

/// A GraphQL enum without a Rust type behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyEnumType {
    definition: EnumDef,
}

impl AnyEnumType {
    /// Overrides the GraphQL name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.definition.name = name.into();
        self
    }

    #[must_use]
    pub fn graphql_name(&self) -> &str {
        &self.definition.name
    }

    /// Parses a value name. The result is unconstrained JSON.
    #[must_use]
    pub fn parse(&self, value: &str) -> Option<Value> {
        self.definition
            .find_value(value)
            .map(|def| Value::String(def.name.clone()))
    }

    /// Checks that `value` names one of the enum's values.
    #[must_use]
    pub fn serialize(&self, value: &Value) -> Option<Value> {
        value.as_str().and_then(|name| self.parse(name))
    }

    #[must_use]
    pub fn definition(&self) -> &EnumDef {
        &self.definition
    }
}

impl From<AnyEnumType> for EnumDef {
    fn from(wrapper: AnyEnumType) -> Self {
        wrapper.definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Flavour {
        Vanilla,
        Strawberry,
    }

    impl GraphQLEnum for Flavour {
        const NAME: &'static str = "Flavour";

        fn values() -> Vec<EnumValueDef> {
            vec![EnumValueDef::new("VANILLA"), EnumValueDef::new("STRAWBERRY")]
        }

        fn value_name(&self) -> &'static str {
            match self {
                Self::Vanilla => "VANILLA",
                Self::Strawberry => "STRAWBERRY",
            }
        }

        fn from_value_name(name: &str) -> Option<Self> {
            match name {
                "VANILLA" => Some(Self::Vanilla),
                "STRAWBERRY" => Some(Self::Strawberry),
                _ => None,
            }
        }
    }

    #[test]
    fn test_enum_type_parses_to_original_type() {
        let wrapped = enum_type::<Flavour>();
        let value: Flavour = wrapped.parse("STRAWBERRY").unwrap();
        assert_eq!(value, Flavour::Strawberry);
        assert_eq!(wrapped.parse("CHOCOLATE"), None);
        assert_eq!(wrapped.serialize(&Flavour::Vanilla), Value::from("VANILLA"));
    }

    #[test]
    fn test_name_override() {
        let wrapped = enum_type::<Flavour>().name("IceCreamFlavour");
        assert_eq!(wrapped.graphql_name(), "IceCreamFlavour");
        let definition = wrapped.definition();
        assert_eq!(definition.name, "IceCreamFlavour");
        assert_eq!(definition.values.len(), 2);
    }

    #[test]
    fn test_erase() {
        let erased = enum_type::<Flavour>().description("Flavours").erase();
        assert_eq!(erased.graphql_name(), "Flavour");
        assert_eq!(erased.definition().description.as_deref(), Some("Flavours"));
        assert_eq!(erased.parse("VANILLA"), Some(Value::from("VANILLA")));
    }

    #[test]
    fn test_enum_from_definition() {
        let definition = EnumDef::new("Color")
            .value(EnumValueDef::new("RED"))
            .value(EnumValueDef::new("GREEN"));
        let wrapped = enum_from_definition(definition);
        assert_eq!(wrapped.parse("RED"), Some(Value::from("RED")));
        assert_eq!(wrapped.parse("BLUE"), None);
        assert_eq!(wrapped.serialize(&Value::from("GREEN")), Some(Value::from("GREEN")));
        assert_eq!(wrapped.serialize(&Value::from(1)), None);
    }
}
