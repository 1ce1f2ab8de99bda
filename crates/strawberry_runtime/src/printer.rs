//! SDL printing.

use std::fmt::Write;

use indexmap::IndexMap;
use serde_json::Value;

use crate::field::FederationField;
use crate::schema::{FieldDef, InputValueDef, Schema, TypeDef, DEFAULT_DEPRECATION_REASON};
use crate::types::TypeRef;

const INDENT: &str = "  ";

impl Schema {
    /// Prints the schema as SDL.
    ///
    /// Built-in scalars are omitted and custom types appear in registration
    /// order. A `schema` block is printed only when a root type does not
    /// use its conventional name.
    #[must_use]
    pub fn to_sdl(&self) -> String {
        let printer = Printer { schema: self };
        let mut blocks = Vec::new();
        if let Some(block) = printer.schema_block() {
            blocks.push(block);
        }
        blocks.extend(
            self.types
                .values()
                .filter(|def| !def.is_builtin())
                .map(|def| printer.type_definition(def)),
        );
        blocks.join("\n\n")
    }
}

struct Printer<'s> {
    schema: &'s Schema,
}

impl Printer<'_> {
    fn schema_block(&self) -> Option<String> {
        let schema = self.schema;
        let conventional = schema.query_type == "Query"
            && schema
                .mutation_type
                .as_deref()
                .map_or(true, |name| name == "Mutation")
            && schema
                .subscription_type
                .as_deref()
                .map_or(true, |name| name == "Subscription");
        if conventional {
            return None;
        }

        let mut out = String::from("schema {\n");
        let _ = writeln!(out, "{INDENT}query: {}", schema.query_type);
        if let Some(mutation) = &schema.mutation_type {
            let _ = writeln!(out, "{INDENT}mutation: {mutation}");
        }
        if let Some(subscription) = &schema.subscription_type {
            let _ = writeln!(out, "{INDENT}subscription: {subscription}");
        }
        out.push('}');
        Some(out)
    }

    fn type_definition(&self, def: &TypeDef) -> String {
        let mut out = String::new();
        description(&mut out, def.description(), "");
        match def {
            TypeDef::Scalar(scalar) => {
                let _ = write!(out, "scalar {}", scalar.name);
                if let Some(url) = &scalar.specified_by_url {
                    let _ = write!(out, " @specifiedBy(url: {})", string_literal(url));
                }
            }
            TypeDef::Object(object) => {
                let _ = write!(out, "type {}", object.name);
                implements(&mut out, &object.implements);
                self.fields(&mut out, &object.fields);
            }
            TypeDef::Interface(interface) => {
                let _ = write!(out, "interface {}", interface.name);
                implements(&mut out, &interface.implements);
                self.fields(&mut out, &interface.fields);
            }
            TypeDef::Union(union) => {
                let _ = write!(out, "union {}", union.name);
                if !union.members.is_empty() {
                    let _ = write!(out, " = {}", union.members.join(" | "));
                }
            }
            TypeDef::Enum(def) => {
                let _ = writeln!(out, "enum {} {{", def.name);
                for value in &def.values {
                    description(&mut out, value.description.as_deref(), INDENT);
                    let _ = write!(out, "{INDENT}{}", value.name);
                    deprecated(&mut out, value.deprecation_reason.as_deref());
                    out.push('\n');
                }
                out.push('}');
            }
            TypeDef::InputObject(input) => {
                let _ = writeln!(out, "input {} {{", input.name);
                for field in input.fields.values() {
                    description(&mut out, field.description.as_deref(), INDENT);
                    let _ = writeln!(out, "{INDENT}{}", self.input_value(field));
                }
                out.push('}');
            }
        }
        out
    }

    fn fields(&self, out: &mut String, fields: &IndexMap<String, FieldDef>) {
        out.push_str(" {\n");
        for field in fields.values() {
            description(out, field.description.as_deref(), INDENT);
            let _ = write!(out, "{INDENT}{}", field.name);
            self.arguments(out, &field.arguments);
            let _ = write!(out, ": {}", field.ty);
            deprecated(out, field.deprecation_reason.as_deref());
            federation(out, &field.federation);
            out.push('\n');
        }
        out.push('}');
    }

    fn arguments(&self, out: &mut String, arguments: &IndexMap<String, InputValueDef>) {
        if arguments.is_empty() {
            return;
        }
        if arguments.values().all(|arg| arg.description.is_none()) {
            let printed: Vec<String> = arguments
                .values()
                .map(|arg| self.input_value(arg))
                .collect();
            let _ = write!(out, "({})", printed.join(", "));
            return;
        }

        let nested = format!("{INDENT}{INDENT}");
        out.push_str("(\n");
        for arg in arguments.values() {
            description(out, arg.description.as_deref(), &nested);
            let _ = writeln!(out, "{nested}{}", self.input_value(arg));
        }
        let _ = write!(out, "{INDENT})");
    }

    fn input_value(&self, def: &InputValueDef) -> String {
        let mut out = format!("{}: {}", def.name, def.ty);
        if let Some(default) = &def.default_value {
            let _ = write!(out, " = {}", self.value(default, &def.ty));
        }
        out
    }

    /// Prints a JSON value as a GraphQL literal of type `ty`.
    fn value(&self, value: &Value, ty: &TypeRef) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Number(number) => number.to_string(),
            Value::String(text) => {
                if matches!(self.schema.get_type(ty.name()), Some(TypeDef::Enum(_))) {
                    text.clone()
                } else {
                    string_literal(text)
                }
            }
            Value::Array(items) => {
                let item_ty = ty.list_item().unwrap_or(ty);
                let printed: Vec<String> =
                    items.iter().map(|item| self.value(item, item_ty)).collect();
                format!("[{}]", printed.join(", "))
            }
            Value::Object(fields) => {
                let input_fields = match self.schema.get_type(ty.name()) {
                    Some(TypeDef::InputObject(input)) => Some(&input.fields),
                    _ => None,
                };
                let printed: Vec<String> = fields
                    .iter()
                    .map(|(name, field_value)| {
                        let printed = match input_fields.and_then(|fields| fields.get(name)) {
                            Some(def) => self.value(field_value, &def.ty),
                            None => self.value(field_value, &TypeRef::named("String")),
                        };
                        format!("{name}: {printed}")
                    })
                    .collect();
                format!("{{{}}}", printed.join(", "))
            }
        }
    }
}

fn implements(out: &mut String, interfaces: &[String]) {
    if !interfaces.is_empty() {
        let _ = write!(out, " implements {}", interfaces.join(" & "));
    }
}

fn deprecated(out: &mut String, reason: Option<&str>) {
    match reason {
        Some(DEFAULT_DEPRECATION_REASON) => out.push_str(" @deprecated"),
        Some(reason) => {
            let _ = write!(out, " @deprecated(reason: {})", string_literal(reason));
        }
        None => {}
    }
}

fn federation(out: &mut String, federation: &FederationField) {
    if federation.external {
        out.push_str(" @external");
    }
    if !federation.requires.is_empty() {
        let fields = federation.requires.join(" ");
        let _ = write!(out, " @requires(fields: {})", string_literal(&fields));
    }
    if !federation.provides.is_empty() {
        let fields = federation.provides.join(" ");
        let _ = write!(out, " @provides(fields: {})", string_literal(&fields));
    }
}

fn description(out: &mut String, description: Option<&str>, indent: &str) {
    let Some(description) = description else {
        return;
    };
    let escaped = description.replace("\"\"\"", "\\\"\"\"");
    if escaped.contains('\n') || escaped.ends_with('"') || escaped.ends_with('\\') {
        let _ = writeln!(out, "{indent}\"\"\"");
        for line in escaped.lines() {
            if line.is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(out, "{indent}{line}");
            }
        }
        let _ = writeln!(out, "{indent}\"\"\"");
    } else {
        let _ = writeln!(out, "{indent}\"\"\"{escaped}\"\"\"");
    }
}

fn string_literal(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}
