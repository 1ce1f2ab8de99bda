//! Query execution.
//!
//! [`Schema::execute`] plans a request synchronously, then walks the plan.
//! Fields resolve one at a time in document order. A resolver error or a
//! null in a non-null position is recorded once and nulls out the nearest
//! nullable ancestor.

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::coerce::{coerce_arguments, serialize_leaf};
use crate::context::Context;
use crate::error::{GraphQLError, PathSegment, Response};
use crate::permission::BoxedPermission;
use crate::query::{Field, QueryPlan, QueryPlanner, Selection, SelectionSet};
use crate::resolver::{Resolver, ResolverInfo};
use crate::schema::{FieldDef, Schema, TypeDef};
use crate::types::TypeRef;

/// A GraphQL request, as posted over HTTP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
    #[serde(
        default,
        rename = "operationName",
        skip_serializing_if = "Option::is_none"
    )]
    pub operation_name: Option<String>,
}

impl Request {
    /// Creates a new request.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Sets the variables. Values other than objects are ignored.
    #[must_use]
    pub fn variables(mut self, variables: Value) -> Self {
        if let Value::Object(variables) = variables {
            self.variables = Some(variables);
        }
        self
    }

    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

impl From<&str> for Request {
    fn from(query: &str) -> Self {
        Self::new(query)
    }
}

impl From<String> for Request {
    fn from(query: String) -> Self {
        Self::new(query)
    }
}

impl Schema {
    /// Executes a query or mutation.
    ///
    /// Subscriptions are rejected. Errors raised before execution starts
    /// produce a response without `data`.
    pub async fn execute(&self, request: impl Into<Request>, ctx: Context) -> Response {
        let request = request.into();
        let variables = request.variables.unwrap_or_default();
        let plan = match QueryPlanner::new(self).plan(
            &request.query,
            request.operation_name.as_deref(),
            &variables,
        ) {
            Ok(plan) => plan,
            Err(errors) => {
                tracing::debug!(errors = errors.len(), "request rejected before execution");
                return Response::errors(errors);
            }
        };

        let span = tracing::info_span!(
            "graphql.execute",
            operation = plan.operation.as_str(),
            name = plan.name.as_deref().unwrap_or_default(),
        );
        self.execute_plan(plan, ctx).instrument(span).await
    }

    /// Executes an already planned operation.
    pub async fn execute_plan(&self, plan: QueryPlan, mut ctx: Context) -> Response {
        ctx.set_variables(plan.variables);
        let executor = Executor {
            schema: self,
            ctx,
            errors: Mutex::new(Vec::new()),
        };
        let root = Value::Object(Map::new());
        let data = executor
            .execute_selection_set(&plan.root_type, &root, &plan.selection_set, &[])
            .await;
        let errors = executor.errors.into_inner();
        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "execution finished with errors");
        }
        Response {
            data: Some(data.map_or(Value::Null, Value::Object)),
            errors: (!errors.is_empty()).then_some(errors),
        }
    }
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A null reached a non-null position; the nearest nullable ancestor
/// becomes null. The error has already been recorded.
struct Propagate;

struct Executor<'s> {
    schema: &'s Schema,
    ctx: Context,
    errors: Mutex<Vec<GraphQLError>>,
}

impl<'s> Executor<'s> {
    async fn record(&self, error: GraphQLError) {
        self.errors.lock().await.push(error);
    }

    fn execute_selection_set<'a>(
        &'a self,
        type_name: &'a str,
        parent: &'a Value,
        selection_set: &'a SelectionSet,
        path: &'a [PathSegment],
    ) -> BoxFuture<'a, Result<Map<String, Value>, Propagate>> {
        Box::pin(async move {
            let mut grouped: IndexMap<&str, Vec<&Field>> = IndexMap::new();
            self.collect_fields(type_name, selection_set, &mut grouped);

            let mut data = Map::new();
            for (response_key, fields) in grouped {
                let value = self.execute_field(type_name, parent, &fields, path).await?;
                data.insert(response_key.to_string(), value);
            }
            Ok(data)
        })
    }

    fn collect_fields<'a>(
        &self,
        type_name: &str,
        selection_set: &'a SelectionSet,
        grouped: &mut IndexMap<&'a str, Vec<&'a Field>>,
    ) {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => grouped
                    .entry(field.response_key.as_str())
                    .or_default()
                    .push(field),
                Selection::Fragment(fragment) => {
                    let applies = fragment
                        .type_condition
                        .as_deref()
                        .map_or(true, |condition| self.schema.is_subtype(condition, type_name));
                    if applies {
                        self.collect_fields(type_name, &fragment.selection_set, grouped);
                    }
                }
            }
        }
    }

    async fn execute_field(
        &self,
        type_name: &str,
        parent: &Value,
        fields: &[&Field],
        path: &[PathSegment],
    ) -> Result<Value, Propagate> {
        let field = fields[0];
        let mut path = path.to_vec();
        path.push(PathSegment::Field(field.response_key.clone()));

        if field.name == "__typename" {
            return Ok(Value::String(type_name.to_string()));
        }
        let Some(def) = self.schema.field(type_name, &field.name) else {
            self.record(
                GraphQLError::new(format!(
                    "Cannot query field '{}' on type '{type_name}'.",
                    field.name
                ))
                .with_location(field.location)
                .with_path(path),
            )
            .await;
            return Ok(Value::Null);
        };

        let selection_set = merge_selection_sets(fields);
        let completed = match self.resolve_field(type_name, def, field, parent, &path).await {
            Ok(value) => {
                self.complete_value(&def.ty, value, &selection_set, field, type_name, &path)
                    .await
            }
            Err(error) => {
                self.record(error.with_location(field.location).with_path(path))
                    .await;
                Err(Propagate)
            }
        };

        match completed {
            Ok(value) => Ok(value),
            Err(Propagate) if def.ty.is_non_null() => Err(Propagate),
            Err(Propagate) => Ok(Value::Null),
        }
    }

    async fn resolve_field(
        &self,
        type_name: &str,
        def: &FieldDef,
        field: &Field,
        parent: &Value,
        path: &[PathSegment],
    ) -> Result<Value, GraphQLError> {
        let args = coerce_arguments(self.schema, &def.arguments, &field.arguments)
            .map_err(GraphQLError::new)?;
        let info = ResolverInfo::new(&def.name, type_name)
            .with_origin_name(&def.origin_name)
            .with_return_type(def.ty.to_string())
            .with_path(path.to_vec())
            .with_selected_fields(field.selection_set.field_names());

        for permission in self.permissions_for(type_name, &def.name) {
            if !permission.has_permission(parent, &info, &self.ctx).await {
                tracing::debug!(
                    field = %format!("{type_name}.{}", def.name),
                    "permission denied"
                );
                return Err(GraphQLError::new(permission.message()));
            }
        }

        let resolver = self.resolver_for(type_name, &def.name).ok_or_else(|| {
            GraphQLError::new(format!("No resolver for '{type_name}.{}'.", def.name))
        })?;
        let resolved = resolver.resolve(parent, &args, &self.ctx, &info);
        #[cfg(feature = "opentelemetry")]
        let resolved = resolved.instrument(tracing::info_span!(
            "graphql.resolve",
            parent_type = type_name,
            field = def.name.as_str(),
        ));
        let value = resolved
            .await
            .map_err(|error| GraphQLError::new(error.to_string()))?;

        match (&value, &def.default_value) {
            (Value::Null, Some(default)) => Ok(default.clone()),
            _ => Ok(value),
        }
    }

    /// Resolvers registered on the type win over ones registered on an
    /// interface it implements.
    fn resolver_for(&self, type_name: &str, field_name: &str) -> Option<&'s dyn Resolver> {
        let resolvers = self.schema.resolvers();
        if resolvers.contains(type_name, field_name) {
            return resolvers.get(type_name, field_name);
        }
        if let Some(TypeDef::Object(object)) = self.schema.get_type(type_name) {
            if let Some(interface) = object
                .implements
                .iter()
                .find(|interface| resolvers.contains(interface, field_name))
            {
                return resolvers.get(interface, field_name);
            }
        }
        resolvers.get(type_name, field_name)
    }

    fn permissions_for(&self, type_name: &str, field_name: &str) -> &'s [BoxedPermission] {
        let schema = self.schema;
        let own = schema.permissions(type_name, field_name);
        if !own.is_empty() {
            return own;
        }
        match schema.get_type(type_name) {
            Some(TypeDef::Object(object)) => object
                .implements
                .iter()
                .map(|interface| schema.permissions(interface, field_name))
                .find(|permissions| !permissions.is_empty())
                .unwrap_or_default(),
            _ => own,
        }
    }

    fn complete_value<'a>(
        &'a self,
        ty: &'a TypeRef,
        value: Value,
        selection_set: &'a SelectionSet,
        field: &'a Field,
        parent_type: &'a str,
        path: &'a [PathSegment],
    ) -> BoxFuture<'a, Result<Value, Propagate>> {
        Box::pin(async move {
            match ty {
                TypeRef::NonNull(inner) => {
                    let completed = self
                        .complete_value(inner, value, selection_set, field, parent_type, path)
                        .await?;
                    if completed.is_null() {
                        self.field_error(
                            format!(
                                "Cannot return null for non-nullable field {parent_type}.{}.",
                                field.name
                            ),
                            field,
                            path,
                        )
                        .await;
                        return Err(Propagate);
                    }
                    Ok(completed)
                }
                _ if value.is_null() => Ok(Value::Null),
                TypeRef::List(inner) => {
                    let Value::Array(items) = value else {
                        self.field_error(
                            format!(
                                "Expected Iterable, but did not find one for field {parent_type}.{}.",
                                field.name
                            ),
                            field,
                            path,
                        )
                        .await;
                        return Err(Propagate);
                    };
                    let mut completed = Vec::with_capacity(items.len());
                    for (index, item) in items.into_iter().enumerate() {
                        let mut item_path = path.to_vec();
                        item_path.push(PathSegment::Index(index));
                        let item = self
                            .complete_value(
                                inner,
                                item,
                                selection_set,
                                field,
                                parent_type,
                                &item_path,
                            )
                            .await;
                        match item {
                            Ok(item) => completed.push(item),
                            Err(propagate) if inner.is_non_null() => return Err(propagate),
                            Err(Propagate) => completed.push(Value::Null),
                        }
                    }
                    Ok(Value::Array(completed))
                }
                TypeRef::Named(name) => match self.schema.get_type(name) {
                    Some(def @ (TypeDef::Scalar(_) | TypeDef::Enum(_))) => {
                        match serialize_leaf(def, &value) {
                            Ok(value) => Ok(value),
                            Err(message) => {
                                self.field_error(message, field, path).await;
                                Err(Propagate)
                            }
                        }
                    }
                    Some(TypeDef::Object(_)) => self
                        .execute_selection_set(name, &value, selection_set, path)
                        .await
                        .map(Value::Object),
                    Some(TypeDef::Interface(_) | TypeDef::Union(_)) => {
                        let object_type = match self.resolve_type(name, &value, field, parent_type) {
                            Ok(object_type) => object_type,
                            Err(message) => {
                                self.field_error(message, field, path).await;
                                return Err(Propagate);
                            }
                        };
                        self.execute_selection_set(&object_type, &value, selection_set, path)
                            .await
                            .map(Value::Object)
                    }
                    _ => {
                        self.field_error(
                            format!("Type '{name}' cannot be used as an output type."),
                            field,
                            path,
                        )
                        .await;
                        Err(Propagate)
                    }
                },
            }
        })
    }

    /// Picks the object type of a value in an abstract position, from its
    /// `__typename` or from the only possible type.
    fn resolve_type(
        &self,
        abstract_type: &str,
        value: &Value,
        field: &Field,
        parent_type: &str,
    ) -> Result<String, String> {
        let possible = self.schema.possible_types(abstract_type);
        match value.get("__typename").and_then(Value::as_str) {
            Some(object_type) if possible.contains(&object_type) => Ok(object_type.to_string()),
            Some(object_type) => Err(format!(
                "Runtime Object type '{object_type}' is not a possible type for '{abstract_type}'."
            )),
            None => match possible.as_slice() {
                [only] => Ok((*only).to_string()),
                _ => Err(format!(
                    "Abstract type '{abstract_type}' must resolve to an Object type at runtime for field '{parent_type}.{}'. Include '__typename' in the resolved value.",
                    field.name
                )),
            },
        }
    }

    async fn field_error(&self, message: String, field: &Field, path: &[PathSegment]) {
        self.record(
            GraphQLError::new(message)
                .with_location(field.location)
                .with_path(path.to_vec()),
        )
        .await;
    }
}

/// Fields sharing a response key are merged into one selection set.
fn merge_selection_sets<'a>(fields: &[&'a Field]) -> Cow<'a, SelectionSet> {
    match fields {
        [field] => Cow::Borrowed(&field.selection_set),
        _ => Cow::Owned(SelectionSet {
            items: fields
                .iter()
                .flat_map(|field| field.selection_set.items.iter().cloned())
                .collect(),
        }),
    }
}
