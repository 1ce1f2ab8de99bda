use std::sync::{Arc, Mutex};

use serde_json::json;
use strawberry::{depth_limit_validator, Context, IgnoreRule, Schema, SchemaBuilder};

const SDL: &str = r#"
type Query {
  user: User
}

type User {
  name: String
  pets: [Pet!]
  friends: [User!]
  internalNotes: [User!]
}

type Pet {
  name: String
  owner: User
}
"#;

fn schema(rule: strawberry::validation::DepthLimitValidator) -> Schema {
    SchemaBuilder::from_sdl(SDL)
        .unwrap()
        .validation_rule(Arc::new(rule))
        .resolver_fn("Query", "user", |_, _, _, _| {
            Ok(json!({"name": "Ada", "pets": [], "friends": [], "internal_notes": []}))
        })
        .finish()
        .unwrap()
}

#[tokio::test]
async fn rejects_operations_past_the_limit() {
    let schema = schema(depth_limit_validator(2));

    let ok = schema
        .execute("query Shallow { user { pets { name } } }", Context::new())
        .await;
    assert!(ok.errors.is_none(), "{:?}", ok.errors);
    assert_eq!(ok.data, Some(json!({"user": {"pets": []}})));

    let deep = schema
        .execute(
            "query Deep { user { pets { owner { name } } } }",
            Context::new(),
        )
        .await;
    assert!(deep.data.is_none());
    assert_eq!(
        deep.error_messages(),
        vec!["'Deep' exceeds maximum operation depth of 2"]
    );
}

#[tokio::test]
async fn ignored_fields_do_not_count() {
    let rule = depth_limit_validator(1)
        .ignore("friends")
        .ignore(IgnoreRule::Pattern(regex::Regex::new("^internal").unwrap()));
    let schema = schema(rule);

    let response = schema
        .execute(
            "{ user { name friends { friends { name } } internalNotes { friends { name } } } }",
            Context::new(),
        )
        .await;
    assert!(response.errors.is_none(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        Some(json!({"user": {"name": "Ada", "friends": [], "internalNotes": []}}))
    );
}

#[tokio::test]
async fn callback_receives_every_operation_depth() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let rule = depth_limit_validator(10).callback(move |depths| {
        let mut seen = sink.lock().unwrap();
        seen.extend(depths.iter().map(|(name, depth)| (name.clone(), *depth)));
    });
    let schema = schema(rule);

    let response = schema
        .execute(
            strawberry::Request::new(
                "query A { user { name } } query B { user { pets { owner { name } } } }",
            )
            .operation_name("A"),
            Context::new(),
        )
        .await;
    assert!(response.errors.is_none(), "{:?}", response.errors);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![("A".to_string(), 1), ("B".to_string(), 3)]
    );
}
