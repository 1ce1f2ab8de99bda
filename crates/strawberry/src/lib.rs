//! Strawberry: GraphQL schemas from Rust types.
//!
//! Declare enums with `#[derive(GraphQLEnum)]`, objects and fields with the
//! builder API, then execute requests against the finished [`Schema`].
//!
//! ```ignore
//! use strawberry::{field, enum_type, Context, GraphQLEnum, Object, Schema};
//!
//! #[derive(Clone, Copy, GraphQLEnum)]
//! enum IceCreamFlavour {
//!     Vanilla,
//!     Strawberry,
//! }
//!
//! let schema = Schema::builder()
//!     .register_enum(enum_type::<IceCreamFlavour>())
//!     .object(
//!         Object::new("Query").field(
//!             "favourite_flavour",
//!             field()
//!                 .ty("IceCreamFlavour!")
//!                 .resolver_fn(|_, _, _, _| Ok(IceCreamFlavour::Strawberry.value_name().into())),
//!         ),
//!     )
//!     .finish()?;
//!
//! let response = schema.execute("{ favouriteFlavour }", Context::new()).await;
//! ```
//!
//! # Features
//!
//! - `debug-server`: an HTTP server with a GraphiQL page ([`server`])
//! - `opentelemetry`: a tracing span around every resolver call

#[cfg(feature = "debug-server")]
pub mod server;

pub use strawberry_macros::GraphQLEnum;

pub use strawberry_runtime::{
    argument, enum_from_definition, enum_type, field, AnyEnumType, AsyncFnResolver,
    BoxedPermission, BoxedResolver, Context, DefaultResolver, EnumDef, EnumType, EnumValueDef,
    FederationField, FieldDef, FnPermission, FnResolver, GraphQLEnum, GraphQLError, InputObject,
    InputObjectDef, InputValueDef, Interface, InterfaceDef, Object, ObjectDef, PathSegment,
    Permission, QueryPlan, QueryPlanner, Request, Resolver, ResolverArgs, ResolverError,
    ResolverFuture, ResolverInfo, ResolverMap, ResolverResult, Response, Scalar, ScalarDef,
    Schema, SchemaBuilder, SchemaConfig, SchemaError, StrawberryArgument, StrawberryField,
    TypeDef, TypeRef, Union, UnionDef, DEFAULT_DEPRECATION_REASON, DEFAULT_PERMISSION_MESSAGE,
};

/// Validation rules that can be added to a schema.
pub mod validation {
    pub use strawberry_validation::{
        default_rules, depth_limit_validator, validate, DepthCallback, DepthLimitValidator,
        IgnoreRule, ValidationContext, ValidationRule,
    };
}

pub use validation::{depth_limit_validator, IgnoreRule};

#[doc(hidden)]
pub use strawberry_runtime::serde_json;
