//! Type references.

use std::fmt;

use serde::{Deserialize, Serialize};
use strawberry_core::Interner;
use strawberry_syntax::Type;

/// Built-in scalar names.
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// A reference to a type, with list and non-null wrappers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// `name!`
    pub fn named_non_null(name: impl Into<String>) -> Self {
        Self::non_null(Self::named(name))
    }

    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    /// Wraps `inner` as non-null. Already non-null types are returned as is.
    #[must_use]
    pub fn non_null(inner: TypeRef) -> Self {
        match inner {
            Self::NonNull(_) => inner,
            other => Self::NonNull(Box::new(other)),
        }
    }

    /// Parses GraphQL type syntax such as `[String!]!`.
    ///
    /// Returns `None` for malformed input.
    #[must_use]
    pub fn parse(source: &str) -> Option<Self> {
        let source = source.trim();
        if let Some(inner) = source.strip_suffix('!') {
            let inner = Self::parse(inner)?;
            return match inner {
                Self::NonNull(_) => None,
                inner => Some(Self::NonNull(Box::new(inner))),
            };
        }
        if let Some(inner) = source.strip_prefix('[') {
            let inner = inner.strip_suffix(']')?;
            return Some(Self::list(Self::parse(inner)?));
        }
        let mut chars = source.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
            && chars.all(|c| c == '_' || c.is_ascii_alphanumeric());
        valid.then(|| Self::named(source))
    }

    /// Returns the innermost named type.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.name(),
        }
    }

    #[must_use]
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Returns the type with an outer non-null wrapper removed.
    #[must_use]
    pub fn nullable(&self) -> &TypeRef {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }

    /// Returns true for `[T]` and `[T]!`.
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self.nullable(), Self::List(_))
    }

    /// Returns the item type of a list type.
    #[must_use]
    pub fn list_item(&self) -> Option<&TypeRef> {
        match self.nullable() {
            Self::List(inner) => Some(inner),
            _ => None,
        }
    }

    pub(crate) fn from_ast(ty: &Type, interner: &Interner) -> Self {
        match ty {
            Type::Named(name) => Self::Named(interner.get(name.value)),
            Type::List(inner, _) => Self::list(Self::from_ast(inner, interner)),
            Type::NonNull(inner, _) => Self::NonNull(Box::new(Self::from_ast(inner, interner))),
        }
    }
}

/// Parses type syntax. Malformed input becomes a named type carrying the
/// raw text, which schema construction reports as unknown.
impl From<&str> for TypeRef {
    fn from(source: &str) -> Self {
        Self::parse(source).unwrap_or_else(|| Self::named(source))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for source in ["String", "String!", "[String]", "[String!]!", "[[Int]!]"] {
            let ty = TypeRef::parse(source).unwrap();
            assert_eq!(ty.to_string(), source);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(TypeRef::parse("[String"), None);
        assert_eq!(TypeRef::parse("String!!"), None);
        assert_eq!(TypeRef::parse("1abc"), None);
        assert_eq!(TypeRef::parse(""), None);
    }

    #[test]
    fn test_from_str_keeps_raw_name() {
        assert_eq!(TypeRef::from("[Foo"), TypeRef::named("[Foo"));
        assert_eq!(TypeRef::from("Foo!"), TypeRef::named_non_null("Foo"));
    }

    #[test]
    fn test_wrappers() {
        let ty = TypeRef::from("[User!]!");
        assert!(ty.is_non_null());
        assert!(ty.is_list());
        assert_eq!(ty.name(), "User");
        assert_eq!(ty.list_item(), Some(&TypeRef::named_non_null("User")));
        assert_eq!(TypeRef::non_null(ty.clone()), ty);
    }
}
