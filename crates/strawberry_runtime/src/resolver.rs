//! Resolver system.
//!
//! Resolvers produce JSON values for fields. They are registered per
//! `Type.field` in a [`ResolverMap`]; fields without one fall back to
//! [`DefaultResolver`], which reads the value off the parent object.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::context::Context;
use crate::enums::GraphQLEnum;
use crate::error::PathSegment;
use crate::naming::to_snake_case;

/// Arguments passed to a resolver, keyed by origin name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverArgs {
    args: IndexMap<String, Value>,
}

impl ResolverArgs {
    /// Creates new resolver args.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates resolver args from a list of (name, value) pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            args: pairs.into_iter().collect(),
        }
    }

    /// Gets an argument by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Gets an argument as a specific type.
    #[must_use]
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.args
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Gets an enum argument.
    #[must_use]
    pub fn get_enum<E: GraphQLEnum>(&self, name: &str) -> Option<E> {
        self.args
            .get(name)
            .and_then(Value::as_str)
            .and_then(E::from_value_name)
    }

    /// Gets a required argument, returning an error if not found.
    pub fn require<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, ResolverError> {
        self.args
            .get(name)
            .ok_or_else(|| ResolverError::MissingArgument(name.to_string()))
            .and_then(|v| {
                serde_json::from_value(v.clone())
                    .map_err(|e| ResolverError::ArgumentParse(name.to_string(), e.to_string()))
            })
    }

    /// Returns all arguments.
    #[must_use]
    pub fn all(&self) -> &IndexMap<String, Value> {
        &self.args
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Sets an argument.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.args.insert(name.into(), value);
    }
}

/// Info about the field being resolved.
#[derive(Debug, Clone)]
pub struct ResolverInfo {
    /// The GraphQL field name.
    pub field_name: String,

    /// The name the field was declared with in Rust.
    pub origin_name: String,

    /// The return type, in GraphQL syntax.
    pub return_type: String,

    /// The parent type name.
    pub parent_type: String,

    /// Path to this field.
    pub path: Vec<PathSegment>,

    /// Selected sub-fields (for object types).
    pub selected_fields: Vec<String>,
}

impl ResolverInfo {
    /// Creates new resolver info.
    pub fn new(field_name: impl Into<String>, parent_type: impl Into<String>) -> Self {
        let field_name = field_name.into();
        Self {
            origin_name: field_name.clone(),
            field_name,
            return_type: String::new(),
            parent_type: parent_type.into(),
            path: Vec::new(),
            selected_fields: Vec::new(),
        }
    }

    /// Sets the origin name.
    #[must_use]
    pub fn with_origin_name(mut self, name: impl Into<String>) -> Self {
        self.origin_name = name.into();
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn with_return_type(mut self, ty: impl Into<String>) -> Self {
        self.return_type = ty.into();
        self
    }

    /// Sets the path.
    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Sets the selected fields.
    #[must_use]
    pub fn with_selected_fields(mut self, fields: Vec<String>) -> Self {
        self.selected_fields = fields;
        self
    }
}

/// Result type for resolvers.
pub type ResolverResult = Result<Value, ResolverError>;

/// Future type for async resolvers.
pub type ResolverFuture<'a> = Pin<Box<dyn Future<Output = ResolverResult> + Send + 'a>>;

/// Error from a resolver.
///
/// The display text becomes the `message` of the field's GraphQL error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolverError {
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Failed to parse argument '{0}': {1}")]
    ArgumentParse(String, String),

    #[error("{0}")]
    Custom(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResolverError {
    /// Creates an error whose message is shown as is.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// Trait for field resolvers.
pub trait Resolver: Send + Sync {
    /// Resolves a field value.
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a>;
}

/// A shared resolver.
pub type BoxedResolver = Arc<dyn Resolver>;

/// A sync resolver function.
pub type SyncResolverFn =
    Arc<dyn Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult + Send + Sync>;

/// A wrapper for sync resolver functions.
pub struct FnResolver {
    func: SyncResolverFn,
}

impl FnResolver {
    /// Creates a new function resolver.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        Self { func: Arc::new(f) }
    }
}

impl Resolver for FnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let result = (self.func)(parent, args, ctx, info);
        Box::pin(async move { result })
    }
}

/// An async resolver function type.
pub type AsyncResolverFn = Arc<
    dyn Fn(Value, ResolverArgs, Context, ResolverInfo) -> ResolverFuture<'static> + Send + Sync,
>;

/// A wrapper for async resolver functions.
///
/// The closure receives owned copies of its inputs so its future can be
/// `'static`.
pub struct AsyncFnResolver {
    func: AsyncResolverFn,
}

impl AsyncFnResolver {
    /// Creates a new async function resolver.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self {
            func: Arc::new(move |parent, args, ctx, info| Box::pin(f(parent, args, ctx, info))),
        }
    }
}

impl Resolver for AsyncFnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let fut = (self.func)(parent.clone(), args.clone(), ctx.clone(), info.clone());
        Box::pin(fut)
    }
}

/// Reads the field off the parent object.
///
/// Looks up the origin name first, then the GraphQL name, then the
/// snake_case form of the GraphQL name. Missing keys resolve to null.
pub struct DefaultResolver;

impl Resolver for DefaultResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        _args: &'a ResolverArgs,
        _ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let result = match parent {
            Value::Object(map) => Ok(map
                .get(&info.origin_name)
                .or_else(|| map.get(&info.field_name))
                .or_else(|| map.get(&to_snake_case(&info.field_name)))
                .cloned()
                .unwrap_or(Value::Null)),
            Value::Null => Ok(Value::Null),
            _ => Err(ResolverError::FieldNotFound(info.field_name.clone())),
        };
        Box::pin(async move { result })
    }
}

/// Storage for resolvers organized by type and field.
#[derive(Clone)]
pub struct ResolverMap {
    /// Resolvers indexed by "TypeName.fieldName".
    resolvers: HashMap<String, BoxedResolver>,

    /// Default resolver for unregistered fields.
    default_resolver: Option<BoxedResolver>,
}

impl Default for ResolverMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverMap {
    /// Creates a new resolver map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolvers: HashMap::new(),
            default_resolver: Some(Arc::new(DefaultResolver)),
        }
    }

    /// Registers a resolver for a specific type and field.
    pub fn register<R: Resolver + 'static>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: R,
    ) {
        self.register_shared(type_name, field_name, Arc::new(resolver));
    }

    /// Registers an already shared resolver.
    pub fn register_shared(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: BoxedResolver,
    ) {
        let key = format!("{}.{}", type_name.into(), field_name.into());
        self.resolvers.insert(key, resolver);
    }

    /// Registers a sync function as a resolver.
    pub fn register_fn<F>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        self.register(type_name, field_name, FnResolver::new(f));
    }

    /// Registers an async function as a resolver.
    pub fn register_async<F, Fut>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        self.register(type_name, field_name, AsyncFnResolver::new(f));
    }

    /// Gets a resolver for a type and field.
    #[must_use]
    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&dyn Resolver> {
        let key = format!("{type_name}.{field_name}");
        self.resolvers
            .get(&key)
            .or(self.default_resolver.as_ref())
            .map(|resolver| &**resolver)
    }

    /// Returns true if a resolver was registered for this exact field.
    #[must_use]
    pub fn contains(&self, type_name: &str, field_name: &str) -> bool {
        self.resolvers.contains_key(&format!("{type_name}.{field_name}"))
    }

    /// Sets the default resolver.
    pub fn set_default<R: Resolver + 'static>(&mut self, resolver: R) {
        self.default_resolver = Some(Arc::new(resolver));
    }

    /// Removes the default resolver.
    pub fn remove_default(&mut self) {
        self.default_resolver = None;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl Debug for ResolverMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverMap")
            .field("resolver_count", &self.resolvers.len())
            .field("has_default", &self.default_resolver.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolver_args() {
        let mut args = ResolverArgs::new();
        args.set("id", json!(123));
        args.set("name", json!("test"));

        assert_eq!(args.get_as::<i64>("id"), Some(123));
        assert_eq!(args.get_as::<String>("name"), Some("test".to_string()));
        assert_eq!(args.get_as::<i64>("missing"), None);
        assert_eq!(
            args.require::<i64>("missing"),
            Err(ResolverError::MissingArgument("missing".to_string()))
        );
        assert!(matches!(
            args.require::<i64>("name"),
            Err(ResolverError::ArgumentParse(..))
        ));
    }

    #[tokio::test]
    async fn test_default_resolver_prefers_origin_name() {
        let resolver = DefaultResolver;
        let parent = json!({"first_name": "Alice", "firstName": "ignored", "age": 30});
        let args = ResolverArgs::new();
        let ctx = Context::new();

        let info = ResolverInfo::new("firstName", "User").with_origin_name("first_name");
        let result = resolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(result.unwrap(), json!("Alice"));

        let info = ResolverInfo::new("age", "User");
        let result = resolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(result.unwrap(), json!(30));

        let info = ResolverInfo::new("missing", "User");
        let result = resolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(result.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_default_resolver_snake_case_fallback() {
        let parent = json!({"last_name": "Smith"});
        let info = ResolverInfo::new("lastName", "User");
        let result = DefaultResolver
            .resolve(&parent, &ResolverArgs::new(), &Context::new(), &info)
            .await;
        assert_eq!(result.unwrap(), json!("Smith"));
    }

    #[tokio::test]
    async fn test_default_resolver_rejects_scalars() {
        let parent = json!(42);
        let info = ResolverInfo::new("name", "User");
        let result = DefaultResolver
            .resolve(&parent, &ResolverArgs::new(), &Context::new(), &info)
            .await;
        assert_eq!(result, Err(ResolverError::FieldNotFound("name".to_string())));
    }

    #[tokio::test]
    async fn test_fn_resolver() {
        let resolver = FnResolver::new(|_parent, args, _ctx, _info| {
            let id: i64 = args.require("id")?;
            Ok(json!({"id": id, "name": "User"}))
        });

        let parent = json!({});
        let mut args = ResolverArgs::new();
        args.set("id", json!(42));
        let ctx = Context::new();
        let info = ResolverInfo::new("user", "Query");

        let result = resolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(result.unwrap(), json!({"id": 42, "name": "User"}));
    }

    #[tokio::test]
    async fn test_async_fn_resolver() {
        let resolver = AsyncFnResolver::new(|_parent, args, _ctx, _info| async move {
            let name: String = args.require("name")?;
            Ok(json!(format!("Hello, {name}!")))
        });

        let mut args = ResolverArgs::new();
        args.set("name", json!("Bob"));
        let info = ResolverInfo::new("greet", "Query");

        let result = resolver
            .resolve(&Value::Null, &args, &Context::new(), &info)
            .await;
        assert_eq!(result.unwrap(), json!("Hello, Bob!"));
    }

    #[tokio::test]
    async fn test_resolver_map() {
        let mut map = ResolverMap::new();

        map.register_fn("Query", "hello", |_parent, _args, _ctx, _info| {
            Ok(json!("Hello, World!"))
        });
        assert!(map.contains("Query", "hello"));
        assert!(!map.contains("User", "name"));

        let resolver = map.get("Query", "hello").unwrap();
        let parent = json!({});
        let args = ResolverArgs::new();
        let ctx = Context::new();
        let info = ResolverInfo::new("hello", "Query");

        let result = resolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(result.unwrap(), json!("Hello, World!"));
    }

    #[tokio::test]
    async fn test_resolver_map_default_fallback() {
        let mut map = ResolverMap::new();

        let resolver = map.get("User", "name").unwrap();
        let parent = json!({"name": "Bob"});
        let args = ResolverArgs::new();
        let ctx = Context::new();
        let info = ResolverInfo::new("name", "User");

        let result = resolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(result.unwrap(), json!("Bob"));

        map.remove_default();
        assert!(map.get("User", "name").is_none());
    }
}
