//! Abstract Syntax Tree types for GraphQL documents.
//!
//! One tree covers both executable documents (operations and fragments)
//! and type system documents (SDL).

use std::borrow::Cow;

use crate::token::DirectiveLocation;
use strawberry_core::{Interner, Span, Text};

/// A complete document.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    pub definitions: Vec<Definition<'a>>,
    pub span: Span,
}

impl<'a> Document<'a> {
    /// Returns the operation definitions in document order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationDefinition<'a>> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Operation(op) => Some(op),
            _ => None,
        })
    }

    /// Returns the fragment definitions in document order.
    pub fn fragments(&self) -> impl Iterator<Item = &FragmentDefinition<'a>> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Fragment(fragment) => Some(fragment),
            _ => None,
        })
    }

    /// Returns true if the document contains type system definitions.
    #[must_use]
    pub fn has_type_system_definitions(&self) -> bool {
        self.definitions.iter().any(|def| {
            matches!(
                def,
                Definition::Schema(_) | Definition::Type(_) | Definition::Directive(_)
            )
        })
    }
}

/// A top-level definition.
#[derive(Debug, Clone)]
pub enum Definition<'a> {
    Schema(SchemaDefinition<'a>),
    Type(TypeDefinition<'a>),
    Directive(DirectiveDefinition<'a>),
    Operation(OperationDefinition<'a>),
    Fragment(FragmentDefinition<'a>),
}

/// Schema definition.
#[derive(Debug, Clone)]
pub struct SchemaDefinition<'a> {
    pub description: Option<Description<'a>>,
    pub directives: Vec<Directive<'a>>,
    pub operations: Vec<OperationTypeDefinition>,
    pub span: Span,
}

/// Root operation type in a schema definition (`query: Query`).
#[derive(Debug, Clone)]
pub struct OperationTypeDefinition {
    pub operation: OperationType,
    pub type_name: Name,
    pub span: Span,
}

/// Type of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type definitions.
#[derive(Debug, Clone)]
pub enum TypeDefinition<'a> {
    Scalar(ScalarTypeDefinition<'a>),
    Object(ObjectTypeDefinition<'a>),
    Interface(InterfaceTypeDefinition<'a>),
    Union(UnionTypeDefinition<'a>),
    Enum(EnumTypeDefinition<'a>),
    InputObject(InputObjectTypeDefinition<'a>),
}

impl TypeDefinition<'_> {
    /// Returns the defined type's name.
    #[must_use]
    pub fn name(&self) -> Name {
        match self {
            Self::Scalar(def) => def.name,
            Self::Object(def) => def.name,
            Self::Interface(def) => def.name,
            Self::Union(def) => def.name,
            Self::Enum(def) => def.name,
            Self::InputObject(def) => def.name,
        }
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Scalar(def) => def.span,
            Self::Object(def) => def.span,
            Self::Interface(def) => def.span,
            Self::Union(def) => def.span,
            Self::Enum(def) => def.span,
            Self::InputObject(def) => def.span,
        }
    }
}

/// Scalar type definition.
#[derive(Debug, Clone)]
pub struct ScalarTypeDefinition<'a> {
    pub description: Option<Description<'a>>,
    pub name: Name,
    pub directives: Vec<Directive<'a>>,
    pub span: Span,
}

/// Object type definition.
#[derive(Debug, Clone)]
pub struct ObjectTypeDefinition<'a> {
    pub description: Option<Description<'a>>,
    pub name: Name,
    pub implements: Vec<Name>,
    pub directives: Vec<Directive<'a>>,
    pub fields: Vec<FieldDefinition<'a>>,
    pub span: Span,
}

/// Interface type definition.
#[derive(Debug, Clone)]
pub struct InterfaceTypeDefinition<'a> {
    pub description: Option<Description<'a>>,
    pub name: Name,
    pub implements: Vec<Name>,
    pub directives: Vec<Directive<'a>>,
    pub fields: Vec<FieldDefinition<'a>>,
    pub span: Span,
}

/// Union type definition.
#[derive(Debug, Clone)]
pub struct UnionTypeDefinition<'a> {
    pub description: Option<Description<'a>>,
    pub name: Name,
    pub directives: Vec<Directive<'a>>,
    pub members: Vec<Name>,
    pub span: Span,
}

/// Enum type definition.
#[derive(Debug, Clone)]
pub struct EnumTypeDefinition<'a> {
    pub description: Option<Description<'a>>,
    pub name: Name,
    pub directives: Vec<Directive<'a>>,
    pub values: Vec<EnumValueDefinition<'a>>,
    pub span: Span,
}

/// Enum value definition.
#[derive(Debug, Clone)]
pub struct EnumValueDefinition<'a> {
    pub description: Option<Description<'a>>,
    pub name: Name,
    pub directives: Vec<Directive<'a>>,
    pub span: Span,
}

/// Input object type definition.
#[derive(Debug, Clone)]
pub struct InputObjectTypeDefinition<'a> {
    pub description: Option<Description<'a>>,
    pub name: Name,
    pub directives: Vec<Directive<'a>>,
    pub fields: Vec<InputValueDefinition<'a>>,
    pub span: Span,
}

/// Field definition.
#[derive(Debug, Clone)]
pub struct FieldDefinition<'a> {
    pub description: Option<Description<'a>>,
    pub name: Name,
    pub arguments: Vec<InputValueDefinition<'a>>,
    pub ty: Type,
    pub directives: Vec<Directive<'a>>,
    pub span: Span,
}

/// Input value definition (arguments, input fields).
#[derive(Debug, Clone)]
pub struct InputValueDefinition<'a> {
    pub description: Option<Description<'a>>,
    pub name: Name,
    pub ty: Type,
    pub default_value: Option<Value<'a>>,
    pub directives: Vec<Directive<'a>>,
    pub span: Span,
}

/// Type reference.
#[derive(Debug, Clone)]
pub enum Type {
    /// Named type: `User`
    Named(Name),
    /// List type: `[User]`
    List(Box<Type>, Span),
    /// Non-null type: `User!`
    NonNull(Box<Type>, Span),
}

impl Type {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Named(name) => name.span,
            Self::List(_, span) | Self::NonNull(_, span) => *span,
        }
    }

    /// Returns the innermost named type.
    #[must_use]
    pub fn named(&self) -> Name {
        match self {
            Self::Named(name) => *name,
            Self::List(inner, _) | Self::NonNull(inner, _) => inner.named(),
        }
    }

    #[must_use]
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(..))
    }
}

/// Directive definition.
#[derive(Debug, Clone)]
pub struct DirectiveDefinition<'a> {
    pub description: Option<Description<'a>>,
    pub name: Name,
    pub arguments: Vec<InputValueDefinition<'a>>,
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
    pub span: Span,
}

/// Directive usage.
#[derive(Debug, Clone)]
pub struct Directive<'a> {
    pub name: Name,
    pub arguments: Vec<Argument<'a>>,
    pub span: Span,
}

impl<'a> Directive<'a> {
    /// Returns the value of the argument named `name`.
    #[must_use]
    pub fn argument(&self, interner: &Interner, name: &str) -> Option<&Value<'a>> {
        self.arguments
            .iter()
            .find(|arg| interner.is(arg.name.value, name))
            .map(|arg| &arg.value)
    }
}

/// Argument.
#[derive(Debug, Clone)]
pub struct Argument<'a> {
    pub name: Name,
    pub value: Value<'a>,
    pub span: Span,
}

/// Operation definition.
#[derive(Debug, Clone)]
pub struct OperationDefinition<'a> {
    pub operation: OperationType,
    pub name: Option<Name>,
    pub variables: Vec<VariableDefinition<'a>>,
    pub directives: Vec<Directive<'a>>,
    pub selection_set: SelectionSet<'a>,
    pub span: Span,
}

/// Variable definition.
#[derive(Debug, Clone)]
pub struct VariableDefinition<'a> {
    pub name: Name,
    pub ty: Type,
    pub default_value: Option<Value<'a>>,
    pub directives: Vec<Directive<'a>>,
    pub span: Span,
}

/// Fragment definition.
#[derive(Debug, Clone)]
pub struct FragmentDefinition<'a> {
    pub name: Name,
    pub type_condition: Name,
    pub directives: Vec<Directive<'a>>,
    pub selection_set: SelectionSet<'a>,
    pub span: Span,
}

/// Selection set.
#[derive(Debug, Clone)]
pub struct SelectionSet<'a> {
    pub selections: Vec<Selection<'a>>,
    pub span: Span,
}

/// Selection.
#[derive(Debug, Clone)]
pub enum Selection<'a> {
    Field(FieldSelection<'a>),
    FragmentSpread(FragmentSpread<'a>),
    InlineFragment(InlineFragment<'a>),
}

impl<'a> Selection<'a> {
    #[must_use]
    pub fn directives(&self) -> &[Directive<'a>] {
        match self {
            Self::Field(field) => &field.directives,
            Self::FragmentSpread(spread) => &spread.directives,
            Self::InlineFragment(fragment) => &fragment.directives,
        }
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Field(field) => field.span,
            Self::FragmentSpread(spread) => spread.span,
            Self::InlineFragment(fragment) => fragment.span,
        }
    }
}

/// Field selection.
#[derive(Debug, Clone)]
pub struct FieldSelection<'a> {
    pub alias: Option<Name>,
    pub name: Name,
    pub arguments: Vec<Argument<'a>>,
    pub directives: Vec<Directive<'a>>,
    pub selection_set: Option<SelectionSet<'a>>,
    pub span: Span,
}

impl FieldSelection<'_> {
    /// Returns the key this field is reported under in a response.
    #[must_use]
    pub fn response_key(&self) -> Name {
        self.alias.unwrap_or(self.name)
    }
}

/// Fragment spread.
#[derive(Debug, Clone)]
pub struct FragmentSpread<'a> {
    pub name: Name,
    pub directives: Vec<Directive<'a>>,
    pub span: Span,
}

/// Inline fragment.
#[derive(Debug, Clone)]
pub struct InlineFragment<'a> {
    pub type_condition: Option<Name>,
    pub directives: Vec<Directive<'a>>,
    pub selection_set: SelectionSet<'a>,
    pub span: Span,
}

/// Value.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    Variable(Name),
    Int(i64, Span),
    Float(f64, Span),
    String(Cow<'a, str>, Span),
    Boolean(bool, Span),
    Null(Span),
    Enum(Name),
    List(Vec<Value<'a>>, Span),
    Object(Vec<(Name, Value<'a>)>, Span),
}

impl Value<'_> {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Variable(name) | Self::Enum(name) => name.span,
            Self::Int(_, span)
            | Self::Float(_, span)
            | Self::String(_, span)
            | Self::Boolean(_, span)
            | Self::Null(span)
            | Self::List(_, span)
            | Self::Object(_, span) => *span,
        }
    }
}

/// Name with span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name {
    pub value: Text,
    pub span: Span,
}

impl Name {
    #[must_use]
    pub fn new(value: Text, span: Span) -> Self {
        Self { value, span }
    }
}

/// Description (documentation string), already unescaped or dedented.
#[derive(Debug, Clone)]
pub struct Description<'a> {
    pub value: Cow<'a, str>,
    /// True when written as a `"""block string"""`.
    pub block: bool,
    pub span: Span,
}

impl<'a> Description<'a> {
    pub fn new(value: impl Into<Cow<'a, str>>, block: bool, span: Span) -> Self {
        Self {
            value: value.into(),
            block,
            span,
        }
    }
}
