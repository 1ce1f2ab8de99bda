//! Derived enums and builder-declared types, executed end to end.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use strawberry::{
    argument, enum_type, field, Context, GraphQLEnum, InputObject, Object, Request, Schema,
};

/// Flavours on offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, GraphQLEnum)]
enum IceCreamFlavour {
    Vanilla,
    Strawberry,
    #[graphql(deprecation_reason = "Out of stock")]
    Chocolate,
}

#[derive(Default)]
struct Orders(AtomicUsize);

fn shop() -> Schema {
    let flavours = enum_type::<IceCreamFlavour>();
    Schema::builder()
        .register_enum(flavours.clone())
        .object(
            Object::new("Query")
                .field(
                    "flavours",
                    field()
                        .ty("[IceCreamFlavour!]!")
                        .argument(
                            argument("include_deprecated", "Boolean").default_value(json!(false)),
                        )
                        .resolver_fn(move |_, args, _, _| {
                            let include_deprecated: bool =
                                args.get_as("include_deprecated").unwrap_or_default();
                            let mut all = vec![IceCreamFlavour::Vanilla, IceCreamFlavour::Strawberry];
                            if include_deprecated {
                                all.push(IceCreamFlavour::Chocolate);
                            }
                            Ok(all.iter().map(|f| flavours.serialize(f)).collect())
                        }),
                )
                .field(
                    "is_favourite",
                    field()
                        .ty("Boolean!")
                        .argument(argument("flavour", "IceCreamFlavour!"))
                        .resolver_fn(|_, args, _, _| {
                            let flavour = args.get_enum::<IceCreamFlavour>("flavour");
                            Ok(json!(flavour == Some(IceCreamFlavour::Strawberry)))
                        }),
                ),
        )
        .object(
            Object::new("Mutation").field(
                "place_order",
                field()
                    .ty("Order!")
                    .argument(argument("order", "OrderInput!"))
                    .resolver_fn(|_, args, ctx, _| {
                        let order_id = ctx
                            .extension::<Arc<Orders>>()
                            .map_or(0, |orders| orders.0.fetch_add(1, Ordering::SeqCst) + 1);
                        let order = args.get("order").cloned().unwrap_or_default();
                        Ok(json!({
                            "order_id": order_id.to_string(),
                            "flavour": order["flavour"],
                            "scoops": order["scoops"],
                        }))
                    }),
            ),
        )
        .input_object(
            InputObject::new("OrderInput")
                .field(argument("flavour", "IceCreamFlavour!"))
                .field(argument("scoops", "Int").default_value(json!(1))),
        )
        .object(
            Object::new("Order")
                .field("order_id", field().ty("ID!"))
                .field("flavour", field().ty("IceCreamFlavour!"))
                .field("scoops", field().ty("Int!")),
        )
        .finish()
        .unwrap()
}

#[tokio::test]
async fn derived_enums_serialize_and_parse() {
    let schema = shop();
    let response = schema
        .execute(
            "{ flavours all: flavours(includeDeprecated: true) isFavourite(flavour: STRAWBERRY) }",
            Context::new(),
        )
        .await;
    assert!(response.errors.is_none(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        Some(json!({
            "flavours": ["VANILLA", "STRAWBERRY"],
            "all": ["VANILLA", "STRAWBERRY", "CHOCOLATE"],
            "isFavourite": true,
        }))
    );
}

#[tokio::test]
async fn mutations_receive_coerced_input_objects() {
    let schema = shop();
    let orders = Arc::new(Orders::default());
    let request = Request::new(
        r#"mutation Order($order: OrderInput!) {
            first: placeOrder(order: $order) { orderId flavour scoops }
            second: placeOrder(order: { flavour: VANILLA, scoops: 3 }) { orderId scoops }
        }"#,
    )
    .variables(json!({"order": {"flavour": "STRAWBERRY"}}));

    let response = schema
        .execute(request, Context::new().with(Arc::clone(&orders)))
        .await;
    assert!(response.errors.is_none(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        Some(json!({
            "first": {"orderId": "1", "flavour": "STRAWBERRY", "scoops": 1},
            "second": {"orderId": "2", "scoops": 3},
        }))
    );
    assert_eq!(orders.0.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn selects_operations_by_name() {
    let schema = shop();
    let source = "query A { flavours } query B { isFavourite(flavour: VANILLA) }";

    let b = schema
        .execute(Request::new(source).operation_name("B"), Context::new())
        .await;
    assert_eq!(b.data, Some(json!({"isFavourite": false})));

    let missing = schema.execute(source, Context::new()).await;
    assert!(missing.data.is_none());
    assert_eq!(
        missing.error_messages(),
        vec!["Must provide operation name if query contains multiple operations."]
    );
}

#[tokio::test]
async fn enum_arguments_reject_string_literals() {
    let schema = shop();
    let response = schema
        .execute(r#"{ isFavourite(flavour: "STRAWBERRY") }"#, Context::new())
        .await;
    assert!(response.data.is_none());
    assert_eq!(
        response.error_messages(),
        vec![r#"Argument 'flavour' has invalid value. Enum 'IceCreamFlavour' cannot represent non-enum value: "STRAWBERRY"."#]
    );

    let from_variable = schema
        .execute(
            Request::new("query ($f: IceCreamFlavour!) { isFavourite(flavour: $f) }")
                .variables(json!({"f": "STRAWBERRY"})),
            Context::new(),
        )
        .await;
    assert_eq!(from_variable.data, Some(json!({"isFavourite": true})));
}

#[tokio::test]
async fn undefined_variables_are_rejected() {
    let response = shop()
        .execute(
            Request::new("query Pick { isFavourite(flavour: $flavour) }")
                .variables(json!({"flavour": "VANILLA"})),
            Context::new(),
        )
        .await;
    assert!(response.data.is_none());
    assert_eq!(
        response.error_messages(),
        vec!["Variable '$flavour' is not defined by operation 'Pick'."]
    );
}

#[tokio::test]
async fn fragments_merge_into_the_selection() {
    let response = shop()
        .execute(
            r#"
            mutation { placeOrder(order: { flavour: VANILLA }) { ...Summary scoops } }
            fragment Summary on Order { flavour }
            "#,
            Context::new(),
        )
        .await;
    assert!(response.errors.is_none(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        Some(json!({"placeOrder": {"flavour": "VANILLA", "scoops": 1}}))
    );
}

#[test]
fn exported_sdl_lists_derived_enum_values() {
    let sdl = shop().to_sdl();
    assert!(sdl.contains(
        "enum IceCreamFlavour {\n  VANILLA\n  STRAWBERRY\n  CHOCOLATE @deprecated(reason: \"Out of stock\")\n}"
    ));
    assert!(sdl.contains("placeOrder(order: OrderInput!): Order!"));
    assert!(sdl.contains("scoops: Int = 1"));

    let reparsed = Schema::from_sdl(&sdl).unwrap();
    assert_eq!(reparsed.to_sdl(), sdl);
}
