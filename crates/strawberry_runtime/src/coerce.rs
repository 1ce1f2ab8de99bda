//! Input coercion and leaf serialization.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::resolver::ResolverArgs;
use crate::schema::{InputValueDef, Schema, TypeDef};
use crate::types::TypeRef;

/// How input object keys come out of coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keys {
    /// Keep GraphQL names. Used for variables, which are coerced again
    /// when they reach an argument.
    GraphQL,
    /// Rename to origin names, as resolvers see them.
    Origin,
}

/// Coerces an input value against `ty`.
pub(crate) fn coerce_input(
    schema: &Schema,
    value: &Value,
    ty: &TypeRef,
    keys: Keys,
) -> Result<Value, String> {
    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return Err(format!("Expected non-nullable type '{ty}' not to be null."));
            }
            coerce_input(schema, value, inner, keys)
        }
        _ if value.is_null() => Ok(Value::Null),
        TypeRef::List(inner) => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| coerce_input(schema, item, inner, keys))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            single => Ok(Value::Array(vec![coerce_input(schema, single, inner, keys)?])),
        },
        TypeRef::Named(name) => match schema.get_type(name) {
            Some(TypeDef::Scalar(_)) => coerce_scalar(name, value),
            Some(TypeDef::Enum(def)) => match value.as_str() {
                Some(text) if def.find_value(text).is_some() => Ok(value.clone()),
                _ => Err(format!(
                    "Value {} does not exist in '{name}' enum.",
                    display(value)
                )),
            },
            Some(TypeDef::InputObject(def)) => {
                let Value::Object(provided) = value else {
                    return Err(format!("Expected type '{name}' to be an object."));
                };
                if let Some(unknown) = provided.keys().find(|key| !def.fields.contains_key(*key)) {
                    return Err(format!("Field '{unknown}' is not defined by type '{name}'."));
                }
                let mut out = Map::new();
                for field in def.fields.values() {
                    let coerced = match provided.get(&field.name) {
                        Some(value) => coerce_input(schema, value, &field.ty, keys)
                            .map_err(|message| format!("In field '{}': {message}", field.name))?,
                        None => match &field.default_value {
                            Some(default) => default.clone(),
                            None if field.ty.is_non_null() => {
                                return Err(format!(
                                    "Field '{}' of required type '{}' was not provided.",
                                    field.name, field.ty
                                ))
                            }
                            None => continue,
                        },
                    };
                    let key = match keys {
                        Keys::GraphQL => field.name.clone(),
                        Keys::Origin => field.origin_name.clone(),
                    };
                    out.insert(key, coerced);
                }
                Ok(Value::Object(out))
            }
            _ => Err(format!("Type '{name}' is not an input type.")),
        },
    }
}

fn coerce_scalar(name: &str, value: &Value) -> Result<Value, String> {
    match name {
        "Int" => match value.as_i64() {
            Some(int) if i32::try_from(int).is_ok() => Ok(value.clone()),
            Some(_) => Err(format!(
                "Int cannot represent non 32-bit signed integer value: {}",
                display(value)
            )),
            None => Err(format!(
                "Int cannot represent non-integer value: {}",
                display(value)
            )),
        },
        "Float" => match value {
            Value::Number(_) => Ok(value.clone()),
            _ => Err(format!(
                "Float cannot represent non numeric value: {}",
                display(value)
            )),
        },
        "String" => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(format!(
                "String cannot represent a non string value: {}",
                display(value)
            )),
        },
        "Boolean" => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(format!(
                "Boolean cannot represent a non boolean value: {}",
                display(value)
            )),
        },
        "ID" => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(number) if number.is_i64() || number.is_u64() => {
                Ok(Value::String(number.to_string()))
            }
            _ => Err(format!(
                "ID cannot represent a non-string and non-integer value: {}",
                display(value)
            )),
        },
        _ => Ok(value.clone()),
    }
}

/// Coerces provided field arguments and renames them to origin names.
pub(crate) fn coerce_arguments(
    schema: &Schema,
    definitions: &IndexMap<String, InputValueDef>,
    provided: &IndexMap<String, Value>,
) -> Result<ResolverArgs, String> {
    if let Some(unknown) = provided.keys().find(|name| !definitions.contains_key(*name)) {
        return Err(format!("Unknown argument '{unknown}'."));
    }

    let mut args = ResolverArgs::new();
    for def in definitions.values() {
        let value = match provided.get(&def.name) {
            Some(value) => coerce_input(schema, value, &def.ty, Keys::Origin).map_err(|message| {
                format!("Argument '{}' has invalid value. {message}", def.name)
            })?,
            None => match &def.default_value {
                Some(default) => coerce_input(schema, default, &def.ty, Keys::Origin)
                    .unwrap_or_else(|_| default.clone()),
                None if def.ty.is_non_null() => {
                    return Err(format!(
                        "Argument '{}' of required type '{}' was not provided.",
                        def.name, def.ty
                    ))
                }
                None => continue,
            },
        };
        args.set(def.origin_name.clone(), value);
    }
    Ok(args)
}

/// Serializes a resolved value of a scalar or enum type.
pub(crate) fn serialize_leaf(def: &TypeDef, value: &Value) -> Result<Value, String> {
    match def {
        TypeDef::Enum(enum_def) => match value.as_str() {
            Some(text) if enum_def.find_value(text).is_some() => Ok(value.clone()),
            _ => Err(format!(
                "Enum '{}' cannot represent value: {}",
                enum_def.name,
                display(value)
            )),
        },
        TypeDef::Scalar(scalar) => serialize_scalar(&scalar.name, value),
        other => Err(format!("Type '{}' is not a leaf type.", other.name())),
    }
}

fn serialize_scalar(name: &str, value: &Value) -> Result<Value, String> {
    match name {
        "Int" => {
            let int = match value {
                Value::Number(number) => number.as_i64().or_else(|| {
                    number
                        .as_f64()
                        .filter(|float| float.fract() == 0.0)
                        .map(|float| float as i64)
                }),
                Value::Bool(flag) => Some(i64::from(*flag)),
                _ => None,
            };
            match int {
                Some(int) if i32::try_from(int).is_ok() => Ok(Value::from(int)),
                Some(_) => Err(format!(
                    "Int cannot represent non 32-bit signed integer value: {}",
                    display(value)
                )),
                None => Err(format!(
                    "Int cannot represent non-integer value: {}",
                    display(value)
                )),
            }
        }
        "Float" => match value {
            Value::Number(_) => Ok(value.clone()),
            Value::Bool(flag) => Ok(Value::from(if *flag { 1.0 } else { 0.0 })),
            _ => Err(format!(
                "Float cannot represent non numeric value: {}",
                display(value)
            )),
        },
        "String" => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(number) => Ok(Value::String(number.to_string())),
            Value::Bool(flag) => Ok(Value::String(flag.to_string())),
            _ => Err(format!(
                "String cannot represent value: {}",
                display(value)
            )),
        },
        "Boolean" => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(format!(
                "Boolean cannot represent a non boolean value: {}",
                display(value)
            )),
        },
        "ID" => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(number) if number.is_i64() || number.is_u64() => {
                Ok(Value::String(number.to_string()))
            }
            _ => Err(format!("ID cannot represent value: {}", display(value))),
        },
        _ => Ok(value.clone()),
    }
}

fn display(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::from_sdl(
            r#"
            type Query { a(x: Int): Int }
            enum Color { RED GREEN }
            input Filter { limit: Int = 10, term: String!, colors: [Color!] }
            "#,
        )
        .unwrap()
    }

    fn coerce(value: Value, ty: &str) -> Result<Value, String> {
        coerce_input(&schema(), &value, &TypeRef::from(ty), Keys::Origin)
    }

    #[test]
    fn test_coerce_scalars() {
        assert_eq!(coerce(json!(3), "Int").unwrap(), json!(3));
        assert_eq!(coerce(json!(1.5), "Float").unwrap(), json!(1.5));
        assert_eq!(coerce(json!(7), "ID").unwrap(), json!("7"));
        assert_eq!(coerce(json!(null), "Int").unwrap(), json!(null));
        assert_eq!(
            coerce(json!(1.5), "Int").unwrap_err(),
            "Int cannot represent non-integer value: 1.5"
        );
        assert_eq!(
            coerce(json!(3_000_000_000_i64), "Int").unwrap_err(),
            "Int cannot represent non 32-bit signed integer value: 3000000000"
        );
        assert_eq!(
            coerce(json!(true), "String").unwrap_err(),
            "String cannot represent a non string value: true"
        );
    }

    #[test]
    fn test_coerce_wrappers() {
        assert_eq!(coerce(json!(1), "[Int]").unwrap(), json!([1]));
        assert_eq!(coerce(json!([1, null]), "[Int]").unwrap(), json!([1, null]));
        assert_eq!(
            coerce(json!(null), "Int!").unwrap_err(),
            "Expected non-nullable type 'Int!' not to be null."
        );
        assert!(coerce(json!([1, null]), "[Int!]").is_err());
    }

    #[test]
    fn test_coerce_enum() {
        assert_eq!(coerce(json!("RED"), "Color").unwrap(), json!("RED"));
        assert_eq!(
            coerce(json!("BLUE"), "Color").unwrap_err(),
            "Value \"BLUE\" does not exist in 'Color' enum."
        );
    }

    #[test]
    fn test_coerce_input_object() {
        assert_eq!(
            coerce(json!({"term": "x", "colors": "RED"}), "Filter").unwrap(),
            json!({"limit": 10, "term": "x", "colors": ["RED"]})
        );
        assert_eq!(
            coerce(json!({"limit": 1}), "Filter").unwrap_err(),
            "Field 'term' of required type 'String!' was not provided."
        );
        assert_eq!(
            coerce(json!({"term": "x", "other": 1}), "Filter").unwrap_err(),
            "Field 'other' is not defined by type 'Filter'."
        );
    }

    #[test]
    fn test_coerce_arguments() {
        let schema = schema();
        let definitions = &schema.field("Query", "a").unwrap().arguments;

        let args = coerce_arguments(&schema, definitions, &IndexMap::new()).unwrap();
        assert!(args.is_empty());

        let mut provided = IndexMap::new();
        provided.insert("y".to_string(), json!(1));
        assert_eq!(
            coerce_arguments(&schema, definitions, &provided).unwrap_err(),
            "Unknown argument 'y'."
        );
    }

    #[test]
    fn test_serialize_leaf() {
        let schema = schema();
        let int = schema.get_type("Int").unwrap();
        assert_eq!(serialize_leaf(int, &json!(2.0)).unwrap(), json!(2));
        assert!(serialize_leaf(int, &json!("2")).is_err());

        let id = schema.get_type("ID").unwrap();
        assert_eq!(serialize_leaf(id, &json!(5)).unwrap(), json!("5"));

        let string = schema.get_type("String").unwrap();
        assert_eq!(serialize_leaf(string, &json!(5)).unwrap(), json!("5"));

        let color = schema.get_type("Color").unwrap();
        assert_eq!(
            serialize_leaf(color, &json!("PINK")).unwrap_err(),
            "Enum 'Color' cannot represent value: \"PINK\""
        );
    }
}
