//! Type-level behavior of enum wrapping.
//!
//! Most assertions here are checked by the compiler: `assert_type::<T>`
//! only accepts a value of exactly `T`.

use serde_json::Value;
use strawberry::{
    enum_from_definition, enum_type, AnyEnumType, EnumDef, EnumType, EnumValueDef, GraphQLEnum,
};

fn assert_type<T>(_: &T) {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, GraphQLEnum)]
enum IceCreamFlavour {
    Vanilla,
    Strawberry,
    Chocolate,
}

/// Flavours, as decorated without arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, GraphQLEnum)]
enum DecoratedFlavour {
    Vanilla,
    /// The best one.
    Strawberry,
    #[graphql(deprecation_reason = "Out of stock")]
    Chocolate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, GraphQLEnum)]
#[graphql(name = "IceCreamFlavour", description = "Renamed flavours")]
enum NamedFlavour {
    #[graphql(name = "VANILLA_BEAN")]
    Vanilla,
    Strawberry,
}

/// Returns an enum whose Rust type is not known statically.
fn flavours_from_config() -> EnumDef {
    EnumDef::new("IceCreamFlavour")
        .value(EnumValueDef::new("VANILLA"))
        .value(EnumValueDef::new("STRAWBERRY"))
}

#[test]
fn plain_call_keeps_the_enum_type() {
    let wrapped = enum_type::<IceCreamFlavour>();
    assert_type::<EnumType<IceCreamFlavour>>(&wrapped);

    let flavour = wrapped.parse("STRAWBERRY").unwrap();
    assert_type::<IceCreamFlavour>(&flavour);
    assert_eq!(flavour, IceCreamFlavour::Strawberry);
    assert_eq!(wrapped.graphql_name(), "IceCreamFlavour");
}

#[test]
fn dynamically_returned_enum_is_unconstrained() {
    let wrapped = enum_from_definition(flavours_from_config());
    assert_type::<AnyEnumType>(&wrapped);

    let flavour = wrapped.parse("VANILLA").unwrap();
    assert_type::<Value>(&flavour);
    assert_eq!(flavour, Value::from("VANILLA"));
    assert_eq!(wrapped.parse("CHOCOLATE"), None);
}

#[test]
fn erased_wrapper_is_unconstrained_but_values_keep_their_type() {
    let flavour: IceCreamFlavour = IceCreamFlavour::Chocolate;
    let wrapped = enum_type::<IceCreamFlavour>().erase();
    assert_type::<AnyEnumType>(&wrapped);
    assert_type::<IceCreamFlavour>(&flavour);

    let parsed = wrapped.parse(flavour.value_name()).unwrap();
    assert_type::<Value>(&parsed);
    assert_eq!(parsed, Value::from("CHOCOLATE"));
}

#[test]
fn bare_derive_resolves_to_the_original_type() {
    let flavour = DecoratedFlavour::from_value_name("STRAWBERRY");
    assert_type::<Option<DecoratedFlavour>>(&flavour);
    assert_eq!(flavour, Some(DecoratedFlavour::Strawberry));

    assert_eq!(DecoratedFlavour::NAME, "DecoratedFlavour");
    assert_eq!(
        DecoratedFlavour::DESCRIPTION,
        Some("Flavours, as decorated without arguments.")
    );
    let values = DecoratedFlavour::values();
    assert_eq!(values[1].description.as_deref(), Some("The best one."));
    assert_eq!(values[2].deprecation_reason.as_deref(), Some("Out of stock"));
}

#[test]
fn name_argument_does_not_change_the_type() {
    let wrapped = enum_type::<NamedFlavour>();
    assert_type::<EnumType<NamedFlavour>>(&wrapped);
    assert_eq!(wrapped.parse("VANILLA_BEAN"), Some(NamedFlavour::Vanilla));
    assert_eq!(wrapped.parse("VANILLA"), None);

    let definition = wrapped.definition();
    assert_eq!(definition.name, "IceCreamFlavour");
    assert_eq!(definition.description.as_deref(), Some("Renamed flavours"));
}

#[test]
fn name_override_on_the_wrapper() {
    let wrapped = enum_type::<IceCreamFlavour>().name("Flavour");
    assert_type::<EnumType<IceCreamFlavour>>(&wrapped);
    assert_eq!(wrapped.graphql_name(), "Flavour");
    assert_eq!(
        wrapped.serialize(&IceCreamFlavour::Vanilla),
        Value::from("VANILLA")
    );
}
