//! Runtime for Strawberry.
//!
//! This crate provides the GraphQL execution runtime:
//! - `field`: Field and argument declarations
//! - `builder`: Schema building and checking
//! - `schema`: The finished schema model
//! - `sdl` / `printer`: SDL import and export
//! - `enums`: Typed enum wrappers
//! - `resolver` / `permission`: Field resolution and access checks
//! - `query`: Query planning
//! - `executor`: Query execution

pub mod builder;
mod coerce;
pub mod context;
pub mod enums;
pub mod error;
pub mod executor;
pub mod field;
pub mod naming;
pub mod permission;
mod printer;
pub mod query;
pub mod resolver;
pub mod schema;
mod sdl;
pub mod types;

pub use builder::{InputObject, Interface, Object, Scalar, SchemaBuilder, Union};
pub use context::Context;
pub use enums::{enum_from_definition, enum_type, AnyEnumType, EnumType, GraphQLEnum};
pub use error::{GraphQLError, PathSegment, Response, SchemaError};
pub use executor::Request;
pub use field::{argument, field, FederationField, StrawberryArgument, StrawberryField};
pub use permission::{BoxedPermission, FnPermission, Permission, DEFAULT_PERMISSION_MESSAGE};
pub use query::{QueryPlan, QueryPlanner};
pub use resolver::{
    AsyncFnResolver, BoxedResolver, DefaultResolver, FnResolver, Resolver, ResolverArgs,
    ResolverError, ResolverFuture, ResolverInfo, ResolverMap, ResolverResult,
};
pub use schema::{
    EnumDef, EnumValueDef, FieldDef, InputObjectDef, InputValueDef, InterfaceDef, ObjectDef,
    ScalarDef, Schema, SchemaConfig, TypeDef, UnionDef, DEFAULT_DEPRECATION_REASON,
};
pub use types::TypeRef;

// Used by `#[derive(GraphQLEnum)]` expansions.
#[doc(hidden)]
pub use serde_json;
