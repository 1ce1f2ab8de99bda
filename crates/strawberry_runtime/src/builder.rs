//! Schema construction.
//!
//! Types are declared with the builders in this module and collected by a
//! [`SchemaBuilder`]. Names are resolved and the schema is checked in
//! [`SchemaBuilder::finish`], so declaration order does not matter.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde_json::Value;
use strawberry_validation::{default_rules, depth_limit_validator, ValidationRule};

use crate::context::Context;
use crate::error::SchemaError;
use crate::field::{StrawberryArgument, StrawberryField};
use crate::permission::BoxedPermission;
use crate::resolver::{Resolver, ResolverArgs, ResolverInfo, ResolverMap, ResolverResult};
use crate::schema::{
    EnumDef, FieldDef, InputObjectDef, InputValueDef, InterfaceDef, ObjectDef, ScalarDef, Schema,
    SchemaConfig, TypeDef, UnionDef,
};
use crate::types::{TypeRef, BUILTIN_SCALARS};

/// An object type declaration.
#[derive(Debug, Clone)]
pub struct Object {
    name: String,
    description: Option<String>,
    implements: Vec<String>,
    fields: Vec<StrawberryField>,
}

impl Object {
    /// Creates a new object type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            implements: Vec::new(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares an implemented interface.
    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.implements.push(interface.into());
        self
    }

    /// Adds a field under its Rust name.
    #[must_use]
    pub fn field(mut self, origin_name: impl Into<String>, field: StrawberryField) -> Self {
        self.fields.push(field.bind(origin_name));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An interface type declaration.
#[derive(Debug, Clone)]
pub struct Interface {
    name: String,
    description: Option<String>,
    implements: Vec<String>,
    fields: Vec<StrawberryField>,
}

impl Interface {
    /// Creates a new interface type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            implements: Vec::new(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.implements.push(interface.into());
        self
    }

    /// Adds a field under its Rust name.
    #[must_use]
    pub fn field(mut self, origin_name: impl Into<String>, field: StrawberryField) -> Self {
        self.fields.push(field.bind(origin_name));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An input object type declaration.
#[derive(Debug, Clone)]
pub struct InputObject {
    name: String,
    description: Option<String>,
    fields: Vec<StrawberryArgument>,
}

impl InputObject {
    /// Creates a new input object type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an input field, declared like an argument.
    #[must_use]
    pub fn field(mut self, field: StrawberryArgument) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A union type declaration.
#[derive(Debug, Clone)]
pub struct Union {
    def: UnionDef,
}

impl Union {
    /// Creates a new union type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: UnionDef {
                name: name.into(),
                description: None,
                members: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.def.description = Some(description.into());
        self
    }

    /// Adds a member object type.
    #[must_use]
    pub fn member(mut self, name: impl Into<String>) -> Self {
        self.def.members.push(name.into());
        self
    }
}

/// A custom scalar declaration. Values pass through unchanged.
#[derive(Debug, Clone)]
pub struct Scalar {
    def: ScalarDef,
}

impl Scalar {
    /// Creates a new scalar type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: ScalarDef {
                name: name.into(),
                description: None,
                specified_by_url: None,
            },
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.def.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn specified_by_url(mut self, url: impl Into<String>) -> Self {
        self.def.specified_by_url = Some(url.into());
        self
    }
}

#[derive(Debug, Clone)]
enum Declared {
    Type(TypeDef),
    Object(Object),
    Interface(Interface),
    InputObject(InputObject),
}

/// Schema builder.
#[derive(Default)]
pub struct SchemaBuilder {
    config: SchemaConfig,
    query_type: Option<String>,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    types: IndexMap<String, Declared>,
    resolvers: ResolverMap,
    validation_rules: Vec<Arc<dyn ValidationRule>>,
    errors: Vec<SchemaError>,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn config(mut self, config: SchemaConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn auto_camel_case(mut self, enabled: bool) -> Self {
        self.config.auto_camel_case = enabled;
        self
    }

    /// Rejects operations nested deeper than `depth`.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    /// Sets the query type. Defaults to `Query`.
    #[must_use]
    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.query_type = Some(name.into());
        self
    }

    /// Sets the mutation type. Defaults to `Mutation` when defined.
    #[must_use]
    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.mutation_type = Some(name.into());
        self
    }

    /// Sets the subscription type. Defaults to `Subscription` when defined.
    #[must_use]
    pub fn subscription_type(mut self, name: impl Into<String>) -> Self {
        self.subscription_type = Some(name.into());
        self
    }

    #[must_use]
    pub fn object(mut self, object: Object) -> Self {
        self.declare(object.name.clone(), Declared::Object(object));
        self
    }

    #[must_use]
    pub fn interface(mut self, interface: Interface) -> Self {
        self.declare(interface.name.clone(), Declared::Interface(interface));
        self
    }

    #[must_use]
    pub fn input_object(mut self, input: InputObject) -> Self {
        self.declare(input.name.clone(), Declared::InputObject(input));
        self
    }

    #[must_use]
    pub fn union(self, union: Union) -> Self {
        self.add_type(TypeDef::Union(union.def))
    }

    #[must_use]
    pub fn scalar(self, scalar: Scalar) -> Self {
        self.add_type(TypeDef::Scalar(scalar.def))
    }

    /// Registers an enum. Registering the same definition twice is a no-op.
    #[must_use]
    pub fn register_enum(self, definition: impl Into<EnumDef>) -> Self {
        self.add_type(TypeDef::Enum(definition.into()))
    }

    /// Adds a finished type definition.
    #[must_use]
    pub fn add_type(mut self, def: TypeDef) -> Self {
        self.declare(def.name().to_string(), Declared::Type(def));
        self
    }

    /// Registers a resolver for `type_name.field_name`.
    #[must_use]
    pub fn resolver(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: impl Resolver + 'static,
    ) -> Self {
        self.resolvers.register(type_name, field_name, resolver);
        self
    }

    /// Registers a sync function as the resolver for `type_name.field_name`.
    #[must_use]
    pub fn resolver_fn<F>(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) -> Self
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        self.resolvers.register_fn(type_name, field_name, f);
        self
    }

    /// Registers an async function as the resolver for `type_name.field_name`.
    #[must_use]
    pub fn resolver_async<F, Fut>(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) -> Self
    where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        self.resolvers.register_async(type_name, field_name, f);
        self
    }

    /// Adds a validation rule run after the built-in ones.
    #[must_use]
    pub fn validation_rule(mut self, rule: Arc<dyn ValidationRule>) -> Self {
        self.validation_rules.push(rule);
        self
    }

    fn declare(&mut self, name: String, declared: Declared) {
        if BUILTIN_SCALARS.contains(&name.as_str()) {
            self.errors.push(SchemaError::DuplicateType(name));
            return;
        }
        let duplicate = match (self.types.get(&name), &declared) {
            (None, _) => false,
            (Some(Declared::Type(TypeDef::Enum(existing))), Declared::Type(TypeDef::Enum(new))) => {
                existing != new
            }
            (Some(_), _) => true,
        };
        if duplicate {
            self.errors.push(SchemaError::DuplicateType(name));
        } else {
            self.types.entry(name).or_insert(declared);
        }
    }

    /// Resolves names, checks the schema and returns it.
    pub fn finish(self) -> Result<Schema, SchemaError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }

        let config = self.config;
        let mut resolvers = self.resolvers;
        let mut permissions = HashMap::new();
        let mut types: IndexMap<String, TypeDef> = BUILTIN_SCALARS
            .iter()
            .map(|name| {
                let def = ScalarDef {
                    name: (*name).to_string(),
                    description: None,
                    specified_by_url: None,
                };
                ((*name).to_string(), TypeDef::Scalar(def))
            })
            .collect();

        for (name, declared) in self.types {
            let def = match declared {
                Declared::Type(def) => def,
                Declared::Object(object) => {
                    let fields = lower_fields(
                        &name,
                        object.fields,
                        &config,
                        &mut resolvers,
                        &mut permissions,
                    )?;
                    TypeDef::Object(ObjectDef {
                        name: object.name,
                        description: object.description,
                        fields,
                        implements: object.implements,
                    })
                }
                Declared::Interface(interface) => {
                    let fields = lower_fields(
                        &name,
                        interface.fields,
                        &config,
                        &mut resolvers,
                        &mut permissions,
                    )?;
                    TypeDef::Interface(InterfaceDef {
                        name: interface.name,
                        description: interface.description,
                        fields,
                        implements: interface.implements,
                    })
                }
                Declared::InputObject(input) => {
                    let mut fields = IndexMap::new();
                    for field in input.fields {
                        let def = lower_input_value(field, &config);
                        if fields.contains_key(&def.name) {
                            return Err(SchemaError::DuplicateField {
                                type_name: name,
                                field: def.name,
                            });
                        }
                        fields.insert(def.name.clone(), def);
                    }
                    TypeDef::InputObject(InputObjectDef {
                        name: input.name,
                        description: input.description,
                        fields,
                    })
                }
            };
            types.insert(name, def);
        }

        let query_type = root_type(&types, "query", self.query_type, "Query")?
            .ok_or(SchemaError::MissingQueryType)?;
        let mutation_type = root_type(&types, "mutation", self.mutation_type, "Mutation")?;
        let subscription_type =
            root_type(&types, "subscription", self.subscription_type, "Subscription")?;

        for def in types.values() {
            check_type(&types, def)?;
        }

        let mut validation_rules = default_rules();
        if let Some(max_depth) = config.max_depth {
            validation_rules.push(Arc::new(depth_limit_validator(max_depth)));
        }
        validation_rules.extend(self.validation_rules);

        tracing::debug!(
            types = types.len(),
            resolvers = resolvers.len(),
            query = %query_type,
            "schema built"
        );

        Ok(Schema {
            query_type,
            mutation_type,
            subscription_type,
            types,
            config,
            resolvers: Arc::new(resolvers),
            permissions: Arc::new(permissions),
            validation_rules,
        })
    }
}

impl fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("config", &self.config)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("resolvers", &self.resolvers)
            .field("validation_rules", &self.validation_rules.len())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

fn lower_fields(
    type_name: &str,
    fields: Vec<StrawberryField>,
    config: &SchemaConfig,
    resolvers: &mut ResolverMap,
    permissions: &mut HashMap<String, Vec<BoxedPermission>>,
) -> Result<IndexMap<String, FieldDef>, SchemaError> {
    let mut lowered = IndexMap::new();
    for field in fields {
        let origin_name = field.origin_name().unwrap_or_default().to_string();
        let name = field
            .resolved_name(config.auto_camel_case)
            .unwrap_or_else(|| origin_name.clone());
        let Some(ty) = field.type_ref().cloned() else {
            return Err(SchemaError::MissingFieldType {
                type_name: type_name.to_string(),
                field: name,
            });
        };
        if lowered.contains_key(&name) {
            return Err(SchemaError::DuplicateField {
                type_name: type_name.to_string(),
                field: name,
            });
        }

        let mut arguments = IndexMap::new();
        for argument in field.arguments().iter().cloned() {
            let def = lower_input_value(argument, config);
            if arguments.contains_key(&def.name) {
                return Err(SchemaError::DuplicateField {
                    type_name: format!("{type_name}.{name}"),
                    field: def.name,
                });
            }
            arguments.insert(def.name.clone(), def);
        }

        if let Some(resolver) = field.base_resolver() {
            resolvers.register_shared(type_name, name.clone(), Arc::clone(resolver));
        }
        if !field.get_permission_classes().is_empty() {
            permissions.insert(
                format!("{type_name}.{name}"),
                field.get_permission_classes().to_vec(),
            );
        }

        let def = FieldDef {
            name: name.clone(),
            origin_name,
            description: field.get_description().map(str::to_string),
            ty,
            arguments,
            deprecation_reason: field.get_deprecation_reason().map(str::to_string),
            default_value: field.get_default_value().cloned(),
            is_subscription: field.is_subscription(),
            federation: field.get_federation().clone(),
        };
        lowered.insert(name, def);
    }
    Ok(lowered)
}

fn lower_input_value(argument: StrawberryArgument, config: &SchemaConfig) -> InputValueDef {
    let name = argument.resolved_name(config.auto_camel_case);
    let (origin_name, ty, description, default_value) = argument.into_parts();
    InputValueDef {
        name,
        origin_name,
        description,
        ty,
        default_value,
    }
}

fn root_type(
    types: &IndexMap<String, TypeDef>,
    operation: &str,
    explicit: Option<String>,
    conventional: &str,
) -> Result<Option<String>, SchemaError> {
    let name = match explicit {
        Some(name) => name,
        None if types.contains_key(conventional) => conventional.to_string(),
        None => return Ok(None),
    };
    match types.get(&name) {
        Some(TypeDef::Object(_)) => Ok(Some(name)),
        Some(_) => Err(SchemaError::InvalidRootType {
            operation: operation.to_string(),
            name,
        }),
        None => Err(SchemaError::UnknownType {
            name,
            referenced_by: "schema".to_string(),
        }),
    }
}

fn check_type(types: &IndexMap<String, TypeDef>, def: &TypeDef) -> Result<(), SchemaError> {
    match def {
        TypeDef::Scalar(_) => Ok(()),
        TypeDef::Enum(def) => {
            let mut seen = FxHashSet::default();
            match def.values.iter().find(|value| !seen.insert(value.name.as_str())) {
                Some(value) => Err(SchemaError::DuplicateEnumValue {
                    enum_name: def.name.clone(),
                    value: value.name.clone(),
                }),
                None => Ok(()),
            }
        }
        TypeDef::Object(object) => {
            check_fields(types, &object.name, &object.fields)?;
            check_implements(types, &object.name, &object.fields, &object.implements)
        }
        TypeDef::Interface(interface) => {
            check_fields(types, &interface.name, &interface.fields)?;
            check_implements(types, &interface.name, &interface.fields, &interface.implements)
        }
        TypeDef::Union(union) => {
            for member in &union.members {
                match types.get(member) {
                    Some(TypeDef::Object(_)) => {}
                    Some(_) => {
                        return Err(SchemaError::InvalidUnionMember {
                            union: union.name.clone(),
                            member: member.clone(),
                        })
                    }
                    None => return Err(unknown(member, &union.name)),
                }
            }
            Ok(())
        }
        TypeDef::InputObject(input) => {
            if input.fields.is_empty() {
                return Err(SchemaError::EmptyFields(input.name.clone()));
            }
            for field in input.fields.values() {
                check_input_type(types, &field.ty, &format!("{}.{}", input.name, field.name))?;
            }
            Ok(())
        }
    }
}

fn check_fields(
    types: &IndexMap<String, TypeDef>,
    type_name: &str,
    fields: &IndexMap<String, FieldDef>,
) -> Result<(), SchemaError> {
    if fields.is_empty() {
        return Err(SchemaError::EmptyFields(type_name.to_string()));
    }
    for field in fields.values() {
        let owner = format!("{type_name}.{}", field.name);
        match types.get(field.ty.name()) {
            Some(TypeDef::InputObject(_)) => {
                return Err(SchemaError::NotOutputType {
                    name: field.ty.name().to_string(),
                    referenced_by: owner,
                })
            }
            Some(_) => {}
            None => return Err(unknown(field.ty.name(), &owner)),
        }
        for argument in field.arguments.values() {
            check_input_type(types, &argument.ty, &format!("{owner}({}:)", argument.name))?;
        }
    }
    Ok(())
}

fn check_input_type(
    types: &IndexMap<String, TypeDef>,
    ty: &TypeRef,
    owner: &str,
) -> Result<(), SchemaError> {
    match types.get(ty.name()) {
        Some(def) if def.is_input() => Ok(()),
        Some(_) => Err(SchemaError::NotInputType {
            name: ty.name().to_string(),
            referenced_by: owner.to_string(),
        }),
        None => Err(unknown(ty.name(), owner)),
    }
}

fn check_implements(
    types: &IndexMap<String, TypeDef>,
    type_name: &str,
    fields: &IndexMap<String, FieldDef>,
    implements: &[String],
) -> Result<(), SchemaError> {
    for interface in implements {
        let def = match types.get(interface) {
            Some(TypeDef::Interface(def)) => def,
            Some(_) => {
                return Err(SchemaError::InvalidImplements {
                    type_name: type_name.to_string(),
                    interface: interface.clone(),
                })
            }
            None => return Err(unknown(interface, type_name)),
        };
        if let Some(missing) = def.fields.keys().find(|name| !fields.contains_key(*name)) {
            return Err(SchemaError::MissingInterfaceField {
                type_name: type_name.to_string(),
                interface: interface.clone(),
                field: missing.clone(),
            });
        }
    }
    Ok(())
}

fn unknown(name: &str, referenced_by: &str) -> SchemaError {
    SchemaError::UnknownType {
        name: name.to_string(),
        referenced_by: referenced_by.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::enum_from_definition;
    use crate::field::{argument, field};
    use crate::schema::EnumValueDef;

    fn query() -> Object {
        Object::new("Query").field("hello", field().ty("String"))
    }

    fn color() -> EnumDef {
        EnumDef::new("Color")
            .value(EnumValueDef::new("RED"))
            .value(EnumValueDef::new("GREEN"))
    }

    #[test]
    fn test_minimal_schema() {
        let schema = SchemaBuilder::new().object(query()).finish().unwrap();
        assert_eq!(schema.query_type(), "Query");
        assert_eq!(schema.types().count(), BUILTIN_SCALARS.len() + 1);
        assert_eq!(schema.validation_rules().len(), default_rules().len());
    }

    #[test]
    fn test_camel_case_names() {
        let schema = SchemaBuilder::new()
            .object(
                Object::new("Query").field(
                    "user_name",
                    field()
                        .ty("String")
                        .argument(argument("user_id", "ID!")),
                ),
            )
            .finish()
            .unwrap();

        let def = schema.field("Query", "userName").unwrap();
        assert_eq!(def.origin_name, "user_name");
        let arg = &def.arguments["userId"];
        assert_eq!(arg.origin_name, "user_id");
    }

    #[test]
    fn test_auto_camel_case_disabled() {
        let schema = SchemaBuilder::new()
            .auto_camel_case(false)
            .object(Object::new("Query").field("user_name", field().ty("String")))
            .finish()
            .unwrap();
        assert!(schema.field("Query", "user_name").is_some());
    }

    #[test]
    fn test_missing_query_type() {
        let error = SchemaBuilder::new()
            .object(Object::new("User").field("id", field().ty("ID")))
            .finish()
            .unwrap_err();
        assert_eq!(error, SchemaError::MissingQueryType);
    }

    #[test]
    fn test_explicit_root_types() {
        let schema = SchemaBuilder::new()
            .query_type("Root")
            .object(Object::new("Root").field("a", field().ty("Int")))
            .finish()
            .unwrap();
        assert_eq!(schema.query_type(), "Root");

        let error = SchemaBuilder::new()
            .object(query())
            .mutation_type("Missing")
            .finish()
            .unwrap_err();
        assert_eq!(
            error,
            SchemaError::UnknownType {
                name: "Missing".to_string(),
                referenced_by: "schema".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_field_type() {
        let error = SchemaBuilder::new()
            .object(Object::new("Query").field("user", field().ty("User")))
            .finish()
            .unwrap_err();
        assert_eq!(
            error,
            SchemaError::UnknownType {
                name: "User".to_string(),
                referenced_by: "Query.user".to_string()
            }
        );
    }

    #[test]
    fn test_missing_field_type() {
        let error = SchemaBuilder::new()
            .object(Object::new("Query").field("user", field()))
            .finish()
            .unwrap_err();
        assert!(matches!(error, SchemaError::MissingFieldType { .. }));
    }

    #[test]
    fn test_empty_object() {
        let error = SchemaBuilder::new()
            .object(query())
            .object(Object::new("Empty"))
            .finish()
            .unwrap_err();
        assert_eq!(error, SchemaError::EmptyFields("Empty".to_string()));
    }

    #[test]
    fn test_duplicate_types() {
        let error = SchemaBuilder::new()
            .object(query())
            .object(query())
            .finish()
            .unwrap_err();
        assert_eq!(error, SchemaError::DuplicateType("Query".to_string()));

        let error = SchemaBuilder::new()
            .object(query())
            .scalar(Scalar::new("String"))
            .finish()
            .unwrap_err();
        assert_eq!(error, SchemaError::DuplicateType("String".to_string()));
    }

    #[test]
    fn test_duplicate_field_names() {
        let error = SchemaBuilder::new()
            .object(
                Object::new("Query")
                    .field("first_name", field().ty("String"))
                    .field("other", field().name("firstName").ty("String")),
            )
            .finish()
            .unwrap_err();
        assert_eq!(
            error,
            SchemaError::DuplicateField {
                type_name: "Query".to_string(),
                field: "firstName".to_string()
            }
        );
    }

    #[test]
    fn test_enum_registration_is_idempotent() {
        let schema = SchemaBuilder::new()
            .object(query())
            .register_enum(color())
            .register_enum(enum_from_definition(color()))
            .finish()
            .unwrap();
        assert!(matches!(schema.get_type("Color"), Some(TypeDef::Enum(_))));

        let error = SchemaBuilder::new()
            .object(query())
            .register_enum(color())
            .register_enum(EnumDef::new("Color").value(EnumValueDef::new("BLUE")))
            .finish()
            .unwrap_err();
        assert_eq!(error, SchemaError::DuplicateType("Color".to_string()));
    }

    #[test]
    fn test_duplicate_enum_values() {
        let error = SchemaBuilder::new()
            .object(query())
            .register_enum(color().value(EnumValueDef::new("RED")))
            .finish()
            .unwrap_err();
        assert_eq!(
            error,
            SchemaError::DuplicateEnumValue {
                enum_name: "Color".to_string(),
                value: "RED".to_string()
            }
        );

        let error = Schema::from_sdl("type Query { a: Color } enum Color { RED GREEN RED }")
            .unwrap_err();
        assert!(matches!(error, SchemaError::DuplicateEnumValue { .. }));
    }

    #[test]
    fn test_input_and_output_positions() {
        let error = SchemaBuilder::new()
            .input_object(InputObject::new("UserInput").field(argument("name", "String!")))
            .object(Object::new("Query").field("user", field().ty("UserInput")))
            .finish()
            .unwrap_err();
        assert!(matches!(error, SchemaError::NotOutputType { .. }));

        let error = SchemaBuilder::new()
            .object(
                Object::new("Query")
                    .field("user", field().ty("Query").argument(argument("filter", "Query"))),
            )
            .finish()
            .unwrap_err();
        assert_eq!(
            error,
            SchemaError::NotInputType {
                name: "Query".to_string(),
                referenced_by: "Query.user(filter:)".to_string()
            }
        );
    }

    #[test]
    fn test_interface_checks() {
        let error = SchemaBuilder::new()
            .interface(Interface::new("Node").field("id", field().ty("ID!")))
            .object(Object::new("Query").implements("Node").field("a", field().ty("Int")))
            .finish()
            .unwrap_err();
        assert_eq!(
            error,
            SchemaError::MissingInterfaceField {
                type_name: "Query".to_string(),
                interface: "Node".to_string(),
                field: "id".to_string()
            }
        );

        let error = SchemaBuilder::new()
            .object(query())
            .object(Object::new("User").implements("Query").field("id", field().ty("ID")))
            .finish()
            .unwrap_err();
        assert!(matches!(error, SchemaError::InvalidImplements { .. }));
    }

    #[test]
    fn test_union_members_must_be_objects() {
        let error = SchemaBuilder::new()
            .object(query())
            .union(Union::new("Result").member("String"))
            .finish()
            .unwrap_err();
        assert_eq!(
            error,
            SchemaError::InvalidUnionMember {
                union: "Result".to_string(),
                member: "String".to_string()
            }
        );
    }

    #[test]
    fn test_field_resolvers_and_permissions_are_registered() {
        use crate::permission::FnPermission;

        let schema = SchemaBuilder::new()
            .object(
                Object::new("Query").field(
                    "secret",
                    field()
                        .ty("String")
                        .resolver_fn(|_, _, _, _| Ok(Value::from("hidden")))
                        .permission(FnPermission::new(|_: &Value, _: &ResolverInfo, _: &Context| {
                            false
                        })),
                ),
            )
            .finish()
            .unwrap();

        assert!(schema.resolvers().contains("Query", "secret"));
        assert_eq!(schema.permissions("Query", "secret").len(), 1);
        assert!(schema.permissions("Query", "other").is_empty());
    }

    #[test]
    fn test_max_depth_adds_rule() {
        let schema = SchemaBuilder::new()
            .object(query())
            .max_depth(3)
            .finish()
            .unwrap();
        assert_eq!(schema.config().max_depth, Some(3));
        assert_eq!(schema.validation_rules().len(), default_rules().len() + 1);
    }
}
