//! End-to-end execution tests.

use serde_json::json;
use strawberry_runtime::{
    argument, enum_from_definition, field, Context, EnumDef, EnumValueDef, FnPermission,
    Interface, Object, Request, ResolverError, Schema, SchemaBuilder, Union,
};

fn library() -> Schema {
    SchemaBuilder::new()
        .object(
            Object::new("Query")
                .field(
                    "book",
                    field()
                        .ty("Book")
                        .argument(argument("book_id", "ID!"))
                        .resolver_fn(|_, args, _, _| {
                            let id: String = args.require("book_id")?;
                            Ok(json!({
                                "id": id,
                                "title": "Dune",
                                "page_count": 412,
                                "genre": "SCIENCE_FICTION",
                                "__typename": "Book",
                            }))
                        }),
                )
                .field(
                    "books",
                    field()
                        .ty("[Book!]")
                        .argument(argument("genre", "Genre"))
                        .resolver_fn(|_, args, _, _| {
                            let books = json!([
                                {"id": "1", "title": "Dune", "genre": "SCIENCE_FICTION"},
                                {"id": "2", "title": "Emma", "genre": "ROMANCE"},
                            ]);
                            match args.get("genre") {
                                Some(genre) => Ok(json!(books
                                    .as_array()
                                    .into_iter()
                                    .flatten()
                                    .filter(|book| &book["genre"] == genre)
                                    .collect::<Vec<_>>())),
                                None => Ok(books),
                            }
                        }),
                )
                .field(
                    "search",
                    field().ty("[SearchResult]").resolver_fn(|_, _, _, _| {
                        Ok(json!([
                            {"__typename": "Book", "id": "1", "title": "Dune"},
                            {"__typename": "Author", "id": "9", "name": "Frank"},
                        ]))
                    }),
                )
                .field(
                    "node",
                    field().ty("Node").resolver_fn(|_, _, _, _| {
                        Ok(json!({"__typename": "Author", "id": "9", "name": "Frank"}))
                    }),
                )
                .field(
                    "secret",
                    field()
                        .ty("String")
                        .permission(
                            FnPermission::new(|_, _, ctx: &Context| {
                                ctx.get::<String>("role").as_deref() == Some("admin")
                            })
                            .with_message("Admins only"),
                        )
                        .resolver_fn(|_, _, _, _| Ok(json!("42"))),
                )
                .field(
                    "broken",
                    field()
                        .ty("String")
                        .resolver_fn(|_, _, _, _| Err(ResolverError::custom("boom"))),
                )
                .field(
                    "strict_shelf",
                    field().ty("[Book!]").resolver_fn(|_, _, _, _| {
                        Ok(json!([{"id": "1", "title": "Dune"}, {"id": "2", "title": null}]))
                    }),
                )
                .field(
                    "loose_shelf",
                    field().ty("[Book]").resolver_fn(|_, _, _, _| {
                        Ok(json!([{"id": "1", "title": "Dune"}, {"id": "2", "title": null}]))
                    }),
                )
                .field(
                    "greeting",
                    field().ty("String!").resolver_async(|_, _, _, _| async {
                        Ok(json!("hello"))
                    }),
                ),
        )
        .interface(Interface::new("Node").field("id", field().ty("ID!")))
        .object(
            Object::new("Book")
                .implements("Node")
                .field("id", field().ty("ID!"))
                .field("title", field().ty("String!"))
                .field("page_count", field().ty("Int"))
                .field("genre", field().ty("Genre")),
        )
        .object(
            Object::new("Author")
                .implements("Node")
                .field("id", field().ty("ID!"))
                .field("name", field().ty("String")),
        )
        .union(Union::new("SearchResult").member("Book").member("Author"))
        .register_enum(enum_from_definition(
            EnumDef::new("Genre")
                .value(EnumValueDef::new("SCIENCE_FICTION"))
                .value(EnumValueDef::new("ROMANCE")),
        ))
        .finish()
        .unwrap()
}

#[tokio::test]
async fn resolves_arguments_and_camel_cased_fields() {
    let response = library()
        .execute(
            r#"{ book(bookId: "7") { id title pageCount genre } }"#,
            Context::new(),
        )
        .await;
    assert!(response.errors.is_none(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        Some(json!({
            "book": {"id": "7", "title": "Dune", "pageCount": 412, "genre": "SCIENCE_FICTION"}
        }))
    );
}

#[tokio::test]
async fn passes_enum_arguments_and_variables() {
    let schema = library();
    let literal = schema
        .execute("{ books(genre: ROMANCE) { title } }", Context::new())
        .await;
    assert_eq!(literal.data, Some(json!({"books": [{"title": "Emma"}]})));

    let request = Request::new("query ($genre: Genre) { books(genre: $genre) { title } }")
        .variables(json!({"genre": "SCIENCE_FICTION"}));
    let variable = schema.execute(request, Context::new()).await;
    assert_eq!(variable.data, Some(json!({"books": [{"title": "Dune"}]})));

    let unset = schema
        .execute(
            "query ($genre: Genre) { books(genre: $genre) { id } }",
            Context::new(),
        )
        .await;
    assert_eq!(unset.data, Some(json!({"books": [{"id": "1"}, {"id": "2"}]})));
}

#[tokio::test]
async fn rejects_unknown_enum_values() {
    let response = library()
        .execute(
            Request::new("query ($genre: Genre) { books(genre: $genre) { id } }")
                .variables(json!({"genre": "HORROR"})),
            Context::new(),
        )
        .await;
    assert!(response.data.is_none());
    assert_eq!(
        response.error_messages(),
        vec!["Variable '$genre' got invalid value \"HORROR\"; Value \"HORROR\" does not exist in 'Genre' enum."]
    );
}

#[tokio::test]
async fn resolves_abstract_types() {
    let response = library()
        .execute(
            r#"{
                search {
                    __typename
                    ... on Book { title }
                    ... on Author { name }
                }
                node { id ... on Author { name } }
            }"#,
            Context::new(),
        )
        .await;
    assert!(response.errors.is_none(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        Some(json!({
            "search": [
                {"__typename": "Book", "title": "Dune"},
                {"__typename": "Author", "name": "Frank"}
            ],
            "node": {"id": "9", "name": "Frank"}
        }))
    );
}

#[tokio::test]
async fn checks_permissions_before_resolving() {
    let schema = library();

    let denied = schema.execute("{ secret }", Context::new()).await;
    assert_eq!(denied.data, Some(json!({"secret": null})));
    assert_eq!(denied.error_messages(), vec!["Admins only"]);
    let error = &denied.errors.as_ref().unwrap()[0];
    assert_eq!(error.path.as_ref().unwrap()[0].to_string(), "secret");

    let mut ctx = Context::new();
    ctx.set("role", "admin");
    let allowed = schema.execute("{ secret }", ctx).await;
    assert_eq!(allowed.data, Some(json!({"secret": "42"})));
    assert!(allowed.errors.is_none());
}

#[tokio::test]
async fn resolver_errors_null_the_field() {
    let response = library()
        .execute("{ broken greeting }", Context::new())
        .await;
    assert_eq!(
        response.data,
        Some(json!({"broken": null, "greeting": "hello"}))
    );
    assert_eq!(response.error_messages(), vec!["boom"]);
}

#[tokio::test]
async fn nulls_propagate_to_the_nearest_nullable_parent() {
    let schema = library();

    let strict = schema
        .execute("{ strictShelf { title } }", Context::new())
        .await;
    assert_eq!(strict.data, Some(json!({"strictShelf": null})));
    assert_eq!(
        strict.error_messages(),
        vec!["Cannot return null for non-nullable field Book.title."]
    );
    let path: Vec<String> = strict.errors.as_ref().unwrap()[0]
        .path
        .iter()
        .flatten()
        .map(ToString::to_string)
        .collect();
    assert_eq!(path, vec!["strictShelf", "1", "title"]);

    let loose = schema
        .execute("{ looseShelf { title } }", Context::new())
        .await;
    assert_eq!(
        loose.data,
        Some(json!({"looseShelf": [{"title": "Dune"}, null]}))
    );
}

#[tokio::test]
async fn typename_on_root() {
    let response = library().execute("{ __typename }", Context::new()).await;
    assert_eq!(response.data, Some(json!({"__typename": "Query"})));
}

#[tokio::test]
async fn missing_required_argument_is_a_field_error() {
    let response = library()
        .execute("{ book { id } }", Context::new())
        .await;
    assert_eq!(response.data, Some(json!({"book": null})));
    assert_eq!(
        response.error_messages(),
        vec!["Argument 'bookId' of required type 'ID!' was not provided."]
    );
}

#[tokio::test]
async fn depth_limit_rejects_deep_queries() {
    let schema = Schema::builder()
        .max_depth(2)
        .object(Object::new("Query").field("user", field().ty("User")))
        .object(
            Object::new("User")
                .field("name", field().ty("String"))
                .field("friend", field().ty("User")),
        )
        .finish()
        .unwrap();

    let shallow = schema
        .execute("{ user { name } }", Context::new())
        .await;
    assert!(shallow.errors.is_none());
    assert_eq!(shallow.data, Some(json!({"user": null})));

    let deep = schema
        .execute("query Deep { user { friend { friend { name } } } }", Context::new())
        .await;
    assert!(deep.data.is_none());
    assert_eq!(
        deep.error_messages(),
        vec!["'Deep' exceeds maximum operation depth of 2"]
    );
}

#[tokio::test]
async fn default_resolver_reads_parent_values() {
    let schema = SchemaBuilder::from_sdl(
        "type Query { me: User } type User { fullName: String, age: Int }",
    )
    .unwrap()
    .resolver_fn("Query", "me", |_, _, _, _| {
        Ok(json!({"full_name": "Ada Lovelace", "age": 36}))
    })
    .finish()
    .unwrap();

    let response = schema
        .execute("{ me { fullName age } }", Context::new())
        .await;
    assert_eq!(
        response.data,
        Some(json!({"me": {"fullName": "Ada Lovelace", "age": 36}}))
    );
}
