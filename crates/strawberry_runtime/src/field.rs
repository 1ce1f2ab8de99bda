//! Field and argument declarations.
//!
//! A [`StrawberryField`] carries everything a GraphQL field needs besides
//! its parent: type, resolver, arguments, permissions and metadata. It is
//! attached to an object with [`Object::field`](crate::Object::field),
//! which binds it to the Rust-side (origin) name.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Context;
use crate::naming::to_camel_case;
use crate::permission::{BoxedPermission, Permission};
use crate::resolver::{
    AsyncFnResolver, BoxedResolver, FnResolver, Resolver, ResolverArgs, ResolverInfo,
    ResolverResult,
};
use crate::types::TypeRef;

/// Federation directives on a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationField {
    pub provides: Vec<String>,
    pub requires: Vec<String>,
    pub external: bool,
}

impl FederationField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the field `@external`.
    #[must_use]
    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    #[must_use]
    pub fn provides(mut self, field: impl Into<String>) -> Self {
        self.provides.push(field.into());
        self
    }

    #[must_use]
    pub fn requires(mut self, field: impl Into<String>) -> Self {
        self.requires.push(field.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.external && self.provides.is_empty() && self.requires.is_empty()
    }
}

/// Creates a field declaration with no resolver.
#[must_use]
pub fn field() -> StrawberryField {
    StrawberryField::default()
}

/// A field declaration.
#[derive(Clone, Default)]
pub struct StrawberryField {
    name: Option<String>,
    origin_name: Option<String>,
    ty: Option<TypeRef>,
    description: Option<String>,
    deprecation_reason: Option<String>,
    default_value: Option<Value>,
    is_subscription: bool,
    permission_classes: Vec<BoxedPermission>,
    federation: FederationField,
    arguments: Vec<StrawberryArgument>,
    base_resolver: Option<BoxedResolver>,
}

impl StrawberryField {
    /// Sets an explicit GraphQL name. Binding never overrides it.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the field type, written in GraphQL syntax or as a [`TypeRef`].
    #[must_use]
    pub fn ty(mut self, ty: impl Into<TypeRef>) -> Self {
        self.ty = Some(ty.into());
        self
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

    /// Value used when the parent carries no value for this field.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Marks the field as a subscription field.
    #[must_use]
    pub fn subscription(mut self) -> Self {
        self.is_subscription = true;
        self
    }

    /// Adds a permission checked before the resolver runs.
    #[must_use]
    pub fn permission(mut self, permission: impl Permission + 'static) -> Self {
        self.permission_classes.push(Arc::new(permission));
        self
    }

    /// Replaces the permissions of this field.
    #[must_use]
    pub fn permission_classes(mut self, permissions: Vec<BoxedPermission>) -> Self {
        self.permission_classes = permissions;
        self
    }

    #[must_use]
    pub fn federation(mut self, federation: FederationField) -> Self {
        self.federation = federation;
        self
    }

    /// Declares an argument.
    #[must_use]
    pub fn argument(mut self, argument: StrawberryArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Attaches a resolver. Fields with a resolver are not part of the
    /// parent's value.
    #[must_use]
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.base_resolver = Some(Arc::new(resolver));
        self
    }

    /// Attaches a synchronous function as the resolver.
    #[must_use]
    pub fn resolver_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        self.resolver(FnResolver::new(f))
    }

    /// Attaches an async function as the resolver.
    #[must_use]
    pub fn resolver_async<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        self.resolver(AsyncFnResolver::new(f))
    }

    /// Binds the field to the Rust name it was declared under.
    #[must_use]
    pub fn bind(mut self, origin_name: impl Into<String>) -> Self {
        self.origin_name = Some(origin_name.into());
        self
    }

    /// Returns the GraphQL name: the explicit name, or the camel-cased
    /// origin name once bound.
    #[must_use]
    pub fn graphql_name(&self) -> Option<String> {
        self.resolved_name(true)
    }

    pub(crate) fn resolved_name(&self, auto_camel_case: bool) -> Option<String> {
        if let Some(name) = &self.name {
            return Some(name.clone());
        }
        let origin = self.origin_name.as_deref()?;
        Some(if auto_camel_case {
            to_camel_case(origin)
        } else {
            origin.to_string()
        })
    }

    #[must_use]
    pub fn origin_name(&self) -> Option<&str> {
        self.origin_name.as_deref()
    }

    #[must_use]
    pub fn type_ref(&self) -> Option<&TypeRef> {
        self.ty.as_ref()
    }

    /// Returns true if the field is filled from the parent's value rather
    /// than computed by a resolver.
    #[must_use]
    pub fn is_init(&self) -> bool {
        self.base_resolver.is_none()
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        self.ty.as_ref().is_some_and(TypeRef::is_list)
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.ty.as_ref().is_some_and(|ty| !ty.is_non_null())
    }

    /// Returns the item type of a list field.
    #[must_use]
    pub fn child(&self) -> Option<&TypeRef> {
        self.ty.as_ref().and_then(TypeRef::list_item)
    }

    #[must_use]
    pub fn is_child_optional(&self) -> bool {
        self.child().is_some_and(|child| !child.is_non_null())
    }

    #[must_use]
    pub fn is_subscription(&self) -> bool {
        self.is_subscription
    }

    #[must_use]
    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn get_default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    #[must_use]
    pub fn get_deprecation_reason(&self) -> Option<&str> {
        self.deprecation_reason.as_deref()
    }

    #[must_use]
    pub fn arguments(&self) -> &[StrawberryArgument] {
        &self.arguments
    }

    #[must_use]
    pub fn get_permission_classes(&self) -> &[BoxedPermission] {
        &self.permission_classes
    }

    #[must_use]
    pub fn get_federation(&self) -> &FederationField {
        &self.federation
    }

    #[must_use]
    pub fn base_resolver(&self) -> Option<&BoxedResolver> {
        self.base_resolver.as_ref()
    }
}

impl fmt::Debug for StrawberryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrawberryField")
            .field("name", &self.name)
            .field("origin_name", &self.origin_name)
            .field("ty", &self.ty)
            .field("is_subscription", &self.is_subscription)
            .field("arguments", &self.arguments)
            .field("permissions", &self.permission_classes.len())
            .field("has_resolver", &self.base_resolver.is_some())
            .finish_non_exhaustive()
    }
}

/// Declares an argument or input field under its Rust name.
pub fn argument(origin_name: impl Into<String>, ty: impl Into<TypeRef>) -> StrawberryArgument {
    StrawberryArgument {
        origin_name: origin_name.into(),
        name: None,
        ty: ty.into(),
        description: None,
        default_value: None,
    }
}

/// An argument or input field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct StrawberryArgument {
    origin_name: String,
    name: Option<String>,
    ty: TypeRef,
    description: Option<String>,
    default_value: Option<Value>,
}

impl StrawberryArgument {
    /// Sets an explicit GraphQL name.
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
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    #[must_use]
    pub fn origin_name(&self) -> &str {
        &self.origin_name
    }

    #[must_use]
    pub fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    pub(crate) fn resolved_name(&self, auto_camel_case: bool) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None if auto_camel_case => to_camel_case(&self.origin_name),
            None => self.origin_name.clone(),
        }
    }

    pub(crate) fn into_parts(self) -> (String, TypeRef, Option<String>, Option<Value>) {
        (self.origin_name, self.ty, self.description, self.default_value)
    }
}
