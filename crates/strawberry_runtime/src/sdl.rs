//! Building schemas from SDL.

use indexmap::IndexMap;
use serde_json::Value;
use strawberry_core::{Interner, LineIndex};
use strawberry_syntax::{
    parse, Definition, Description, Directive, FieldDefinition, InputValueDefinition,
    OperationType, TypeDefinition,
};

use crate::builder::SchemaBuilder;
use crate::error::SchemaError;
use crate::field::FederationField;
use crate::query::value_to_json;
use crate::schema::{
    EnumDef, EnumValueDef, FieldDef, InputObjectDef, InputValueDef, InterfaceDef, ObjectDef,
    ScalarDef, Schema, TypeDef, UnionDef, DEFAULT_DEPRECATION_REASON,
};
use crate::types::{TypeRef, BUILTIN_SCALARS};

impl Schema {
    /// Builds a schema from SDL. Fields resolve through the default
    /// resolver; use [`SchemaBuilder::from_sdl`] to attach resolvers.
    pub fn from_sdl(sdl: &str) -> Result<Self, SchemaError> {
        SchemaBuilder::from_sdl(sdl)?.finish()
    }
}

impl SchemaBuilder {
    /// Starts a builder with the types and root operations of an SDL
    /// document.
    ///
    /// Directive definitions are accepted and ignored. Built-in scalar
    /// definitions are skipped.
    pub fn from_sdl(sdl: &str) -> Result<Self, SchemaError> {
        let interner = Interner::new();
        let result = parse(sdl, &interner);
        if let Some(diagnostic) = result.diagnostics.errors().next() {
            let index = LineIndex::new(sdl);
            let message = match diagnostic.primary_span() {
                Some(span) => {
                    let location = index.span_location(span);
                    format!("{} ({}:{})", diagnostic.title, location.line, location.column)
                }
                None => diagnostic.title.clone(),
            };
            return Err(SchemaError::Syntax(message));
        }

        let lower = SdlLowering {
            interner: &interner,
        };
        let mut builder = SchemaBuilder::new();
        for definition in &result.document.definitions {
            match definition {
                Definition::Operation(_) => {
                    return Err(SchemaError::InvalidDefinition("operations".to_string()))
                }
                Definition::Fragment(_) => {
                    return Err(SchemaError::InvalidDefinition("fragments".to_string()))
                }
                Definition::Directive(directive) => {
                    tracing::debug!(
                        directive = %interner.get(directive.name.value),
                        "ignoring directive definition"
                    );
                }
                Definition::Schema(schema) => {
                    for operation in &schema.operations {
                        let name = interner.get(operation.type_name.value);
                        builder = match operation.operation {
                            OperationType::Query => builder.query_type(name),
                            OperationType::Mutation => builder.mutation_type(name),
                            OperationType::Subscription => builder.subscription_type(name),
                        };
                    }
                }
                Definition::Type(ty) => {
                    let name = interner.get(ty.name().value);
                    if BUILTIN_SCALARS.contains(&name.as_str()) {
                        continue;
                    }
                    builder = builder.add_type(lower.type_definition(ty)?);
                }
            }
        }
        Ok(builder)
    }
}

struct SdlLowering<'i> {
    interner: &'i Interner,
}

impl SdlLowering<'_> {
    fn type_definition(&self, ty: &TypeDefinition<'_>) -> Result<TypeDef, SchemaError> {
        let name = self.interner.get(ty.name().value);
        Ok(match ty {
            TypeDefinition::Scalar(def) => TypeDef::Scalar(ScalarDef {
                name,
                description: description(def.description.as_ref()),
                specified_by_url: self
                    .directive(&def.directives, "specifiedBy")
                    .and_then(|directive| self.string_argument(directive, "url")),
            }),
            TypeDefinition::Object(def) => {
                let fields = self.fields(&name, &def.fields)?;
                TypeDef::Object(ObjectDef {
                    name,
                    description: description(def.description.as_ref()),
                    fields,
                    implements: self.names(&def.implements),
                })
            }
            TypeDefinition::Interface(def) => {
                let fields = self.fields(&name, &def.fields)?;
                TypeDef::Interface(InterfaceDef {
                    name,
                    description: description(def.description.as_ref()),
                    fields,
                    implements: self.names(&def.implements),
                })
            }
            TypeDefinition::Union(def) => TypeDef::Union(UnionDef {
                name,
                description: description(def.description.as_ref()),
                members: self.names(&def.members),
            }),
            TypeDefinition::Enum(def) => TypeDef::Enum(EnumDef {
                name,
                description: description(def.description.as_ref()),
                values: def
                    .values
                    .iter()
                    .map(|value| EnumValueDef {
                        name: self.interner.get(value.name.value),
                        description: description(value.description.as_ref()),
                        deprecation_reason: self.deprecation_reason(&value.directives),
                    })
                    .collect(),
            }),
            TypeDefinition::InputObject(def) => {
                let fields = self.input_values(&name, &def.fields)?;
                TypeDef::InputObject(InputObjectDef {
                    name,
                    description: description(def.description.as_ref()),
                    fields,
                })
            }
        })
    }

    fn fields(
        &self,
        type_name: &str,
        fields: &[FieldDefinition<'_>],
    ) -> Result<IndexMap<String, FieldDef>, SchemaError> {
        let mut out = IndexMap::with_capacity(fields.len());
        for field in fields {
            let mut def = FieldDef::new(
                self.interner.get(field.name.value),
                TypeRef::from_ast(&field.ty, self.interner),
            );
            def.description = description(field.description.as_ref());
            def.arguments =
                self.input_values(&format!("{type_name}.{}", def.name), &field.arguments)?;
            def.deprecation_reason = self.deprecation_reason(&field.directives);
            def.federation = self.federation(&field.directives);
            if out.contains_key(&def.name) {
                return Err(SchemaError::DuplicateField {
                    type_name: type_name.to_string(),
                    field: def.name,
                });
            }
            out.insert(def.name.clone(), def);
        }
        Ok(out)
    }

    /// Lowers arguments or input fields; `owner` names them in errors.
    fn input_values(
        &self,
        owner: &str,
        values: &[InputValueDefinition<'_>],
    ) -> Result<IndexMap<String, InputValueDef>, SchemaError> {
        let mut out = IndexMap::with_capacity(values.len());
        for value in values {
            let mut def = InputValueDef::new(
                self.interner.get(value.name.value),
                TypeRef::from_ast(&value.ty, self.interner),
            );
            def.description = description(value.description.as_ref());
            def.default_value = value
                .default_value
                .as_ref()
                .and_then(|default| value_to_json(default, self.interner, None));
            if out.contains_key(&def.name) {
                return Err(SchemaError::DuplicateField {
                    type_name: owner.to_string(),
                    field: def.name,
                });
            }
            out.insert(def.name.clone(), def);
        }
        Ok(out)
    }

    fn names(&self, names: &[strawberry_syntax::Name]) -> Vec<String> {
        names
            .iter()
            .map(|name| self.interner.get(name.value))
            .collect()
    }

    fn directive<'d, 'a>(
        &self,
        directives: &'d [Directive<'a>],
        name: &str,
    ) -> Option<&'d Directive<'a>> {
        directives
            .iter()
            .find(|directive| self.interner.is(directive.name.value, name))
    }

    fn string_argument(&self, directive: &Directive<'_>, name: &str) -> Option<String> {
        match directive.argument(self.interner, name) {
            Some(value) => match value_to_json(value, self.interner, None) {
                Some(Value::String(text)) => Some(text),
                _ => None,
            },
            None => None,
        }
    }

    fn deprecation_reason(&self, directives: &[Directive<'_>]) -> Option<String> {
        self.directive(directives, "deprecated").map(|directive| {
            self.string_argument(directive, "reason")
                .unwrap_or_else(|| DEFAULT_DEPRECATION_REASON.to_string())
        })
    }

    fn federation(&self, directives: &[Directive<'_>]) -> FederationField {
        let field_set = |name: &str| -> Vec<String> {
            self.directive(directives, name)
                .and_then(|directive| self.string_argument(directive, "fields"))
                .map(|fields| fields.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default()
        };
        FederationField {
            provides: field_set("provides"),
            requires: field_set("requires"),
            external: self.directive(directives, "external").is_some(),
        }
    }
}

fn description(description: Option<&Description<'_>>) -> Option<String> {
    description.map(|description| description.value.to_string())
}
