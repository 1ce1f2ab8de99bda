//! Query planning.
//!
//! The planner parses and validates a request, picks the operation to run,
//! coerces its variables and lowers the selection set into an owned plan.
//! Fragments are inlined under their type conditions and `@skip` /
//! `@include` are applied, so the executor never sees the syntax tree.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use strawberry_core::{Interner, LineIndex, Location, Span, Text};
use strawberry_syntax::{
    self as ast, parse, Directive, FragmentDefinition, OperationDefinition, OperationType,
};
use strawberry_validation::validate;

use crate::coerce::{coerce_input, Keys};
use crate::error::GraphQLError;
use crate::schema::{Schema, TypeDef};
use crate::types::TypeRef;

/// An operation ready to execute.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub operation: OperationType,
    pub name: Option<String>,
    /// The root object type the operation runs against.
    pub root_type: String,
    pub selection_set: SelectionSet,
    /// Coerced variables. Variables that were neither provided nor
    /// defaulted are absent.
    pub variables: Map<String, Value>,
}

/// Lowered selections.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    pub items: Vec<Selection>,
}

impl SelectionSet {
    /// Names of the fields selected directly, fragments included.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut Vec<String>) {
        for item in &self.items {
            match item {
                Selection::Field(field) => {
                    if !names.contains(&field.name) {
                        names.push(field.name.clone());
                    }
                }
                Selection::Fragment(fragment) => fragment.selection_set.collect_names(names),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Selection {
    Field(Field),
    /// An inline fragment or an inlined fragment spread.
    Fragment(Fragment),
}

/// A selected field.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub response_key: String,
    /// Argument values with variables substituted. Arguments bound to
    /// absent variables are omitted.
    pub arguments: IndexMap<String, Value>,
    pub selection_set: SelectionSet,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct Fragment {
    pub type_condition: Option<String>,
    pub selection_set: SelectionSet,
}

/// Plans requests against a schema.
#[derive(Debug, Clone, Copy)]
pub struct QueryPlanner<'s> {
    schema: &'s Schema,
}

impl<'s> QueryPlanner<'s> {
    /// Creates a new query planner.
    #[must_use]
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// Plans `source` for execution.
    pub fn plan(
        &self,
        source: &str,
        operation_name: Option<&str>,
        variables: &Map<String, Value>,
    ) -> Result<QueryPlan, Vec<GraphQLError>> {
        let interner = Interner::new();
        let index = LineIndex::new(source);
        let result = parse(source, &interner);
        if result.has_errors() {
            return Err(result
                .diagnostics
                .errors()
                .map(|diagnostic| GraphQLError::from_diagnostic(diagnostic, &index))
                .collect());
        }
        let document = result.document;

        let diagnostics = validate(&document, &interner, self.schema.validation_rules());
        if diagnostics.has_errors() {
            return Err(diagnostics
                .errors()
                .map(|diagnostic| GraphQLError::from_diagnostic(diagnostic, &index))
                .collect());
        }

        let operation = select_operation(&document, &interner, operation_name)?;
        let root_type = self.root_type(operation, &index)?;
        let variables = self.coerce_variables(operation, &interner, &index, variables)?;

        let mut lowering = Lowering {
            schema: self.schema,
            interner: &interner,
            index: &index,
            fragments: document
                .fragments()
                .map(|fragment| (fragment.name.value, fragment))
                .collect(),
            variables: &variables,
            spreads: Vec::new(),
            errors: Vec::new(),
        };
        let selection_set = lowering.selection_set(&root_type, &operation.selection_set);
        if !lowering.errors.is_empty() {
            return Err(lowering.errors);
        }

        Ok(QueryPlan {
            operation: operation.operation,
            name: operation.name.map(|name| interner.get(name.value)),
            root_type,
            selection_set,
            variables,
        })
    }

    fn root_type(
        &self,
        operation: &OperationDefinition<'_>,
        index: &LineIndex,
    ) -> Result<String, Vec<GraphQLError>> {
        let error = |message: &str| {
            vec![GraphQLError::new(message).with_location(index.span_location(operation.span))]
        };
        match operation.operation {
            OperationType::Query => Ok(self.schema.query_type().to_string()),
            OperationType::Mutation => self
                .schema
                .mutation_type()
                .map(str::to_string)
                .ok_or_else(|| error("Schema is not configured for mutations.")),
            OperationType::Subscription => Err(error(
                "Subscription operations cannot be executed as a single request.",
            )),
        }
    }

    fn coerce_variables(
        &self,
        operation: &OperationDefinition<'_>,
        interner: &Interner,
        index: &LineIndex,
        provided: &Map<String, Value>,
    ) -> Result<Map<String, Value>, Vec<GraphQLError>> {
        let mut coerced = Map::new();
        let mut errors = Vec::new();
        for definition in &operation.variables {
            let name = interner.get(definition.name.value);
            let ty = TypeRef::from_ast(&definition.ty, interner);
            let location = index.span_location(definition.span);
            let error = |message: String| GraphQLError::new(message).with_location(location);

            if !self
                .schema
                .get_type(ty.name())
                .is_some_and(TypeDef::is_input)
            {
                errors.push(error(format!(
                    "Variable '${name}' expected value of type '{ty}' which cannot be used as an input type."
                )));
                continue;
            }

            let value = match provided.get(&name) {
                Some(value) => value.clone(),
                None => match &definition.default_value {
                    Some(default) => value_to_json(default, interner, None).unwrap_or(Value::Null),
                    None if ty.is_non_null() => {
                        errors.push(error(format!(
                            "Variable '${name}' of required type '{ty}' was not provided."
                        )));
                        continue;
                    }
                    None => continue,
                },
            };
            match coerce_input(self.schema, &value, &ty, Keys::GraphQL) {
                Ok(value) => {
                    coerced.insert(name, value);
                }
                Err(message) => errors.push(error(format!(
                    "Variable '${name}' got invalid value {value}; {message}"
                ))),
            }
        }
        if errors.is_empty() {
            Ok(coerced)
        } else {
            Err(errors)
        }
    }
}

fn select_operation<'d, 'a>(
    document: &'d ast::Document<'a>,
    interner: &Interner,
    operation_name: Option<&str>,
) -> Result<&'d OperationDefinition<'a>, Vec<GraphQLError>> {
    match operation_name {
        Some(name) => document
            .operations()
            .find(|operation| {
                operation
                    .name
                    .is_some_and(|operation_name| interner.is(operation_name.value, name))
            })
            .ok_or_else(|| vec![GraphQLError::new(format!("Unknown operation named '{name}'."))]),
        None => {
            let mut operations = document.operations();
            match (operations.next(), operations.next()) {
                (Some(operation), None) => Ok(operation),
                (None, _) => Err(vec![GraphQLError::new("Must provide an operation.")]),
                (Some(_), Some(_)) => Err(vec![GraphQLError::new(
                    "Must provide operation name if query contains multiple operations.",
                )]),
            }
        }
    }
}

/// Converts a syntax value to JSON.
///
/// Enum literals become strings. Returns `None` for a variable that is not
/// in `variables`; list items and object fields bound to absent variables
/// become null and are dropped respectively.
pub(crate) fn value_to_json(
    value: &ast::Value<'_>,
    interner: &Interner,
    variables: Option<&Map<String, Value>>,
) -> Option<Value> {
    Some(match value {
        ast::Value::Variable(name) => return variables?.get(&interner.get(name.value)).cloned(),
        ast::Value::Int(int, _) => Value::from(*int),
        ast::Value::Float(float, _) => {
            serde_json::Number::from_f64(*float).map_or(Value::Null, Value::Number)
        }
        ast::Value::String(text, _) => Value::String(text.to_string()),
        ast::Value::Boolean(flag, _) => Value::Bool(*flag),
        ast::Value::Null(_) => Value::Null,
        ast::Value::Enum(name) => Value::String(interner.get(name.value)),
        ast::Value::List(items, _) => Value::Array(
            items
                .iter()
                .map(|item| value_to_json(item, interner, variables).unwrap_or(Value::Null))
                .collect(),
        ),
        ast::Value::Object(fields, _) => Value::Object(
            fields
                .iter()
                .filter_map(|(name, value)| {
                    Some((
                        interner.get(name.value),
                        value_to_json(value, interner, variables)?,
                    ))
                })
                .collect(),
        ),
    })
}

/// Checks that enum and string literals agree with `ty`.
///
/// Both become JSON strings, so this is the only place the distinction
/// exists. Enum types take enum literals only (strings reach them through
/// variables), and built-in scalars never take enum literals.
fn literal_kind(
    schema: &Schema,
    interner: &Interner,
    value: &ast::Value<'_>,
    ty: &TypeRef,
) -> Result<(), String> {
    match (value, ty) {
        (_, TypeRef::NonNull(inner)) => literal_kind(schema, interner, value, inner),
        (ast::Value::List(items, _), TypeRef::List(inner)) => items
            .iter()
            .try_for_each(|item| literal_kind(schema, interner, item, inner)),
        (_, TypeRef::List(inner)) => literal_kind(schema, interner, value, inner),
        (_, TypeRef::Named(name)) => match (value, schema.get_type(name)) {
            (ast::Value::String(text, _), Some(TypeDef::Enum(_))) => Err(format!(
                "Enum '{name}' cannot represent non-enum value: {}.",
                Value::String(text.to_string())
            )),
            (ast::Value::Enum(literal), Some(TypeDef::Scalar(_))) => {
                let literal = interner.get(literal.value);
                match name.as_str() {
                    "String" => Err(format!(
                        "String cannot represent a non string value: {literal}"
                    )),
                    "ID" => Err(format!(
                        "ID cannot represent a non-string and non-integer value: {literal}"
                    )),
                    "Int" => Err(format!("Int cannot represent non-integer value: {literal}")),
                    "Float" => Err(format!("Float cannot represent non numeric value: {literal}")),
                    "Boolean" => Err(format!(
                        "Boolean cannot represent a non boolean value: {literal}"
                    )),
                    _ => Ok(()),
                }
            }
            (ast::Value::Object(fields, _), Some(TypeDef::InputObject(def))) => {
                fields.iter().try_for_each(|(field, value)| {
                    match def.fields.get(&interner.get(field.value)) {
                        Some(field) => literal_kind(schema, interner, value, &field.ty)
                            .map_err(|message| format!("In field '{}': {message}", field.name)),
                        None => Ok(()),
                    }
                })
            }
            _ => Ok(()),
        },
    }
}

struct Lowering<'p, 'd, 'a> {
    schema: &'p Schema,
    interner: &'p Interner,
    index: &'p LineIndex,
    fragments: FxHashMap<Text, &'d FragmentDefinition<'a>>,
    variables: &'p Map<String, Value>,
    /// Fragments currently being inlined.
    spreads: Vec<Text>,
    errors: Vec<GraphQLError>,
}

impl<'d, 'a> Lowering<'_, 'd, 'a> {
    fn error(&mut self, message: String, span: Span) {
        self.errors
            .push(GraphQLError::new(message).with_location(self.index.span_location(span)));
    }

    fn selection_set(
        &mut self,
        parent_type: &str,
        selection_set: &'d ast::SelectionSet<'a>,
    ) -> SelectionSet {
        let mut items = Vec::new();
        for selection in &selection_set.selections {
            if !self.included(selection.directives()) {
                continue;
            }
            match selection {
                ast::Selection::Field(field) => {
                    if let Some(field) = self.field(parent_type, field) {
                        items.push(Selection::Field(field));
                    }
                }
                ast::Selection::FragmentSpread(spread) => {
                    let Some(fragment) = self.fragments.get(&spread.name.value).copied() else {
                        continue;
                    };
                    if self.spreads.contains(&spread.name.value) {
                        continue;
                    }
                    let Some(condition) =
                        self.type_condition(fragment.type_condition, spread.span)
                    else {
                        continue;
                    };
                    self.spreads.push(spread.name.value);
                    let selection_set = self.selection_set(&condition, &fragment.selection_set);
                    self.spreads.pop();
                    items.push(Selection::Fragment(Fragment {
                        type_condition: Some(condition),
                        selection_set,
                    }));
                }
                ast::Selection::InlineFragment(fragment) => {
                    let condition = match fragment.type_condition {
                        Some(name) => match self.type_condition(name, fragment.span) {
                            Some(condition) => Some(condition),
                            None => continue,
                        },
                        None => None,
                    };
                    let selection_set = self.selection_set(
                        condition.as_deref().unwrap_or(parent_type),
                        &fragment.selection_set,
                    );
                    items.push(Selection::Fragment(Fragment {
                        type_condition: condition,
                        selection_set,
                    }));
                }
            }
        }
        SelectionSet { items }
    }

    fn type_condition(&mut self, name: ast::Name, span: Span) -> Option<String> {
        let condition = self.interner.get(name.value);
        match self.schema.get_type(&condition) {
            Some(TypeDef::Object(_) | TypeDef::Interface(_) | TypeDef::Union(_)) => {
                Some(condition)
            }
            Some(_) => {
                self.error(
                    format!("Fragment cannot condition on non composite type '{condition}'."),
                    span,
                );
                None
            }
            None => {
                self.error(format!("Unknown type '{condition}'."), span);
                None
            }
        }
    }

    fn field(&mut self, parent_type: &str, field: &'d ast::FieldSelection<'a>) -> Option<Field> {
        let name = self.interner.get(field.name.value);
        let response_key = self.interner.get(field.response_key().value);
        let location = self.index.span_location(field.span);
        let arguments = field
            .arguments
            .iter()
            .filter_map(|argument| {
                Some((
                    self.interner.get(argument.name.value),
                    value_to_json(&argument.value, self.interner, Some(self.variables))?,
                ))
            })
            .collect();

        if name == "__typename" {
            return Some(Field {
                name,
                response_key,
                arguments,
                selection_set: SelectionSet::default(),
                location,
            });
        }

        let schema = self.schema;
        let Some(def) = schema.field(parent_type, &name) else {
            self.error(
                format!("Cannot query field '{name}' on type '{parent_type}'."),
                field.span,
            );
            return None;
        };
        for argument in &field.arguments {
            let argument_name = self.interner.get(argument.name.value);
            let Some(argument_def) = def.arguments.get(&argument_name) else {
                continue;
            };
            if let Err(message) =
                literal_kind(schema, self.interner, &argument.value, &argument_def.ty)
            {
                self.error(
                    format!("Argument '{argument_name}' has invalid value. {message}"),
                    argument.value.span(),
                );
                return None;
            }
        }
        let field_type = def.ty.name().to_string();
        let is_leaf = schema.get_type(&field_type).is_some_and(TypeDef::is_leaf);

        let selection_set = match (&field.selection_set, is_leaf) {
            (Some(_), true) => {
                self.error(
                    format!(
                        "Field '{name}' must not have a selection since type '{}' has no subfields.",
                        def.ty
                    ),
                    field.span,
                );
                return None;
            }
            (None, false) => {
                self.error(
                    format!(
                        "Field '{name}' of type '{}' must have a selection of subfields. Did you mean '{name} {{ ... }}'?",
                        def.ty
                    ),
                    field.span,
                );
                return None;
            }
            (Some(selection_set), false) => self.selection_set(&field_type, selection_set),
            (None, true) => SelectionSet::default(),
        };

        Some(Field {
            name,
            response_key,
            arguments,
            selection_set,
            location,
        })
    }

    /// Applies `@skip` and `@include`.
    fn included(&mut self, directives: &[Directive<'a>]) -> bool {
        for directive in directives {
            let skip = self.interner.is(directive.name.value, "skip");
            if !skip && !self.interner.is(directive.name.value, "include") {
                continue;
            }
            let condition = directive
                .argument(self.interner, "if")
                .and_then(|value| value_to_json(value, self.interner, Some(self.variables)));
            match condition {
                Some(Value::Bool(flag)) => {
                    if flag == skip {
                        return false;
                    }
                }
                _ => {
                    let directive_name = if skip { "skip" } else { "include" };
                    self.error(
                        format!("Argument 'if' of directive '@{directive_name}' must be a Boolean."),
                        directive.span,
                    );
                }
            }
        }
        true
    }
}
