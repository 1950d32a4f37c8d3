use futures::{
    FutureExt,
    executor::block_on,
    future::{BoxFuture, poll_fn},
};
use proptest::prelude::*;
use std::{
    sync::{Arc, Mutex},
    task::Poll,
};
use strata::{
    core::{
        config::DecodeConfig,
        serialize::{
            AsyncExtraConfig, DeserializeError, ExtraConfig, ItemConfig, Resolve, decode_cbor,
            deserialize_array, deserialize_async_array, deserialize_async_map, encode_cbor,
            from_json, to_json,
        },
    },
    prelude::*,
};

fn json(text: &str) -> SerializedValue {
    from_json(text, &DecodeConfig::default()).expect("json")
}

fn person_schema() -> Schema {
    Schema::builder("Person")
        .required("id")
        .default("name", "")
        .default("tags", List::<Value>::new())
        .derived(
            "label",
            has_changed(["name"]),
            compute(|fields| fields.text("name").unwrap_or_default().to_uppercase()),
        )
        .build()
        .expect("person schema")
}

#[test]
fn deserialize_array_keeps_input_order() {
    let person = person_schema();
    let wire = json(r#"[{"id":"u1"},{"id":"u2"}]"#);

    let people =
        deserialize_array(&person, &wire, ItemConfig::Shared(&ExtraConfig::new())).expect("decode");

    let ids: Vec<String> = people
        .iter()
        .map(|p| p.get_as::<String>("id").expect("id"))
        .collect();
    assert_eq!(ids, ["u1", "u2"]);
}

/// Resolver that holds back the first key for a few polls so later items
/// finish first.
fn delayed_directory(person: &Schema, order: Arc<Mutex<Vec<String>>>) -> impl Resolve + 'static {
    let directory: Map<Arc<str>, Model> = ["u1", "u2", "u3"]
        .into_iter()
        .map(|id| (Arc::from(id), person.create([("id", id)]).expect("person")))
        .collect();

    move |schema: &Schema,
          key: SerializedValue|
          -> BoxFuture<'static, Result<Model, DeserializeError>> {
        let id = key.as_text().unwrap_or_default().to_string();
        let lookup = directory.resolve(schema, key);
        let order = Arc::clone(&order);
        let mut delay = if id == "u1" { 3 } else { 0 };

        async move {
            poll_fn(|cx| {
                if delay == 0 {
                    Poll::Ready(())
                } else {
                    delay -= 1;
                    cx.waker().wake_by_ref();
                    Poll::Pending
                }
            })
            .await;

            let model = lookup.await?;
            order.lock().expect("order lock").push(id);

            Ok(model)
        }
        .boxed()
    }
}

#[test]
fn async_array_keeps_order_when_items_finish_out_of_order() {
    let person = person_schema();
    let membership = Schema::builder("Membership")
        .required_shaped("user", Shape::reference(person.clone(), "id"))
        .build()
        .expect("membership schema");

    let order = Arc::new(Mutex::new(Vec::new()));
    let config =
        AsyncExtraConfig::new().with_resolver(delayed_directory(&person, Arc::clone(&order)));
    let wire = json(r#"[{"user":"u1"},{"user":"u2"},{"user":"u3"}]"#);

    let members = block_on(deserialize_async_array(
        &membership,
        wire,
        ItemConfig::Shared(&config),
    ))
    .expect("decode");

    let users: Vec<String> = members
        .iter()
        .map(|m| {
            m.get_as::<Model>("user")
                .and_then(|u| u.get_as::<String>("id"))
                .expect("user id")
        })
        .collect();
    assert_eq!(users, ["u1", "u2", "u3"]);
    assert_eq!(*order.lock().expect("order lock"), ["u2", "u3", "u1"]);
}

#[test]
fn async_array_fails_as_a_whole() {
    let person = person_schema();
    let membership = Schema::builder("Membership")
        .required_shaped("user", Shape::reference(person.clone(), "id"))
        .build()
        .expect("membership schema");

    let order = Arc::new(Mutex::new(Vec::new()));
    let config = AsyncExtraConfig::new().with_resolver(delayed_directory(&person, order));
    let wire = json(r#"[{"user":"u1"},{"user":"nobody"}]"#);

    let err = block_on(deserialize_async_array(
        &membership,
        wire,
        ItemConfig::Shared(&config),
    ))
    .expect_err("unknown user");

    assert_eq!(err.path(), Some("[1].user"));
    assert_eq!(
        err.leaf(),
        &DeserializeError::MissingKey {
            key: "nobody".to_string(),
        }
    );
}

#[test]
fn async_map_keeps_key_order_when_items_finish_out_of_order() {
    let person = person_schema();
    let membership = Schema::builder("Membership")
        .required_shaped("user", Shape::reference(person.clone(), "id"))
        .build()
        .expect("membership schema");

    let order = Arc::new(Mutex::new(Vec::new()));
    let config =
        AsyncExtraConfig::new().with_resolver(delayed_directory(&person, Arc::clone(&order)));
    let wire = json(r#"{"lead":{"user":"u1"},"dev":{"user":"u2"},"ops":{"user":"u3"}}"#);

    let members = block_on(deserialize_async_map(
        &membership,
        wire,
        ItemConfig::Shared(&config),
    ))
    .expect("decode");

    assert_eq!(members.keys().map(String::as_str).collect::<Vec<_>>(), ["lead", "dev", "ops"]);
    let lead = members
        .get("lead")
        .and_then(|m| m.get_as::<Model>("user").ok())
        .and_then(|u| u.get_as::<String>("id").ok());
    assert_eq!(lead.as_deref(), Some("u1"));
    assert_eq!(*order.lock().expect("order lock"), ["u2", "u3", "u1"]);
}

#[test]
fn async_map_fails_as_a_whole() {
    let person = person_schema();
    let membership = Schema::builder("Membership")
        .required_shaped("user", Shape::reference(person.clone(), "id"))
        .build()
        .expect("membership schema");

    let order = Arc::new(Mutex::new(Vec::new()));
    let config = AsyncExtraConfig::new().with_resolver(delayed_directory(&person, order));
    let wire = json(r#"{"lead":{"user":"u1"},"guest":{"user":"nobody"}}"#);

    let err = block_on(deserialize_async_map(
        &membership,
        wire,
        ItemConfig::Shared(&config),
    ))
    .expect_err("unknown user");

    assert_eq!(err.path(), Some("guest.user"));
    assert_eq!(
        err.leaf(),
        &DeserializeError::MissingKey {
            key: "nobody".to_string(),
        }
    );
}

#[test]
fn async_matches_sync_for_plain_schemas() {
    let person = person_schema();
    let wire = SerializedValue::map([("id", "u1"), ("name", "ann")]);

    let sync = person.deserialize(&wire, &ExtraConfig::new()).expect("sync");
    let future = person.deserialize_async(wire, AsyncExtraConfig::new());
    let async_model = block_on(future).expect("async");

    assert_eq!(sync, async_model);
    assert_eq!(async_model.get_as::<String>("label"), Ok("ANN".to_string()));
}

fn tags() -> impl Strategy<Value = Vec<i64>> {
    proptest::collection::vec(any::<i64>(), 0..6)
}

proptest! {
    #[test]
    fn round_trip_reproduces_base_fields(
        id in "[a-z0-9]{1,10}",
        name in "\\PC{0,16}",
        tags in tags(),
    ) {
        let person = person_schema();
        let original = person
            .create([
                ("id", Value::text(id.as_str())),
                ("name", Value::text(name.as_str())),
                ("tags", Value::list(tags)),
            ])
            .expect("create");

        let wire = original.serialize();
        let direct = person.deserialize(&wire, &ExtraConfig::new()).expect("decode");
        prop_assert_eq!(&direct, &original);
        prop_assert_eq!(direct.get("label"), original.get("label"));

        let text = to_json(&wire).expect("to json");
        let json = from_json(&text, &DecodeConfig::default()).expect("from json");
        prop_assert_eq!(&json, &wire);

        let cbor = decode_cbor(&encode_cbor(&wire).expect("encode"), &DecodeConfig::default())
            .expect("decode");
        prop_assert_eq!(&cbor, &wire);
    }
}

#[test]
fn serialized_shape_is_plain_json() {
    let person = person_schema();
    let model = person
        .create([("id", Value::text("u1")), ("tags", Value::list([1, 2]))])
        .expect("create");

    let json = to_json(&model.serialize()).expect("json");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");

    assert_eq!(parsed, serde_json::json!({"id": "u1", "name": "", "tags": [1, 2]}));
    assert!(parsed.get("label").is_none());

    let limits = DecodeConfig {
        max_bytes: 16,
        ..DecodeConfig::default()
    };
    let bytes = encode_cbor(&model.serialize()).expect("encode");
    assert!(decode_cbor(&bytes, &limits).is_err());
}
