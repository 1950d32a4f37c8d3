use proptest::prelude::*;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use strata::{ErrorKind, core::model::ModelError, prelude::*};

fn person_schema(calls: Arc<AtomicUsize>) -> Schema {
    Schema::builder("Person")
        .required("id")
        .default("name", "")
        .derived(
            "label",
            has_changed(["name"]),
            compute(move |fields| {
                calls.fetch_add(1, Ordering::SeqCst);
                match fields.text("name") {
                    Some(name) if !name.is_empty() => name.to_string(),
                    _ => fields.text("id").unwrap_or_default().to_string(),
                }
            }),
        )
        .build()
        .expect("person schema")
}

struct Org {
    role: Schema,
    roles: Schema,
    group: Schema,
}

fn org() -> Org {
    let role = Schema::builder("Role")
        .required("name")
        .build()
        .expect("role schema");
    let roles = Schema::builder("Roles")
        .default_shaped(
            "default_roles",
            List::<Value>::new(),
            Shape::ListOf(role.clone()),
        )
        .default("admins", List::<Value>::new())
        .build()
        .expect("roles schema");
    let group = Schema::builder("Group")
        .required("name")
        .required_shaped("roles", Shape::Model(roles.clone()))
        .default("owner", "")
        .build()
        .expect("group schema");

    Org { role, roles, group }
}

impl Org {
    fn role(&self, name: &str) -> Value {
        self.role.create([("name", name)]).expect("role").into()
    }
}

#[test]
fn derived_label_follows_name() {
    let calls = Arc::new(AtomicUsize::new(0));
    let person = person_schema(Arc::clone(&calls));

    let anon = person.create([("id", "u1")]).expect("create");
    assert_eq!(anon.get_as::<String>("label"), Ok("u1".to_string()));

    let bob = anon.set("name", "Bob").expect("set");
    assert_eq!(bob.get_as::<String>("label"), Ok("Bob".to_string()));
    assert_eq!(anon.get_as::<String>("label"), Ok("u1".to_string()));

    let _ = bob.set("id", "u2").expect("set");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn map_set_appends_in_order() {
    let map = Map::create([("a", 1), ("b", 2)]).set("c", 3);

    assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["a", "b", "c"]);
}

#[test]
fn list_find_and_delete() {
    let list = List::create([1, 2, 3]).find_and_delete(|x| *x == 2);

    assert_eq!(list.array_view(), vec![1, 3]);
}

#[test]
fn deep_update_keeps_siblings_shared() {
    let org = org();
    let roles = org
        .roles
        .create([("default_roles", Value::list([org.role("viewer")]))])
        .expect("roles");
    let group = org
        .group
        .create([
            ("name", Value::text("core")),
            ("roles", roles.into()),
            ("owner", Value::text("ada")),
        ])
        .expect("group");

    let new_list = Value::list([org.role("editor"), org.role("viewer")]);
    let updated = group
        .deep_update()
        .field("roles")
        .expect("roles")
        .set("default_roles", new_list.clone())
        .expect("deep update");

    for field in ["name", "owner"] {
        assert!(updated.get(field).expect(field).same(group.get(field).expect(field)));
    }

    let before = group.get_as::<Model>("roles").expect("roles");
    let after = updated.get_as::<Model>("roles").expect("roles");
    assert!(after.get("admins").expect("admins").same(before.get("admins").expect("admins")));
    assert!(after.get("default_roles").expect("roles").same(&new_list));
    assert!(!before.ptr_eq(&after));
}

#[test]
fn missing_required_field_is_reported() {
    let person = person_schema(Arc::default());
    let err = person
        .create(Vec::<(&str, Value)>::new())
        .expect_err("id required");

    assert_eq!(
        err,
        ModelError::MissingRequiredField {
            schema: "Person".to_string(),
            field: "id".to_string(),
        }
    );
    assert_eq!(strata::Error::from(err).kind(), ErrorKind::MissingRequiredField);
}

#[test]
fn batch_update_computes_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let schema = Schema::builder("Box")
        .default("w", 1)
        .default("h", 1)
        .derived(
            "area",
            has_changed(["w", "h"]),
            compute(move |fields| {
                counted.fetch_add(1, Ordering::SeqCst);
                fields.get_as::<i64>("w").unwrap_or_default()
                    * fields.get_as::<i64>("h").unwrap_or_default()
            }),
        )
        .build()
        .expect("schema");

    let shape = schema.create(Vec::<(&str, Value)>::new()).expect("create");
    let resized = shape.model_values([("w", 4), ("h", 5)]).expect("update");

    assert_eq!(resized.get_as::<i64>("area"), Ok(20));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn nested_path_tracks_identity() {
    let org = org();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let team = Schema::builder("Team")
        .required_shaped("group", Shape::Model(org.group.clone()))
        .derived(
            "group_name",
            has_changed(["group.name"]),
            compute(move |fields| {
                counted.fetch_add(1, Ordering::SeqCst);
                fields
                    .get_as::<Model>("group")
                    .ok()
                    .and_then(|group| group.get_as::<String>("name").ok())
                    .unwrap_or_default()
            }),
        )
        .build()
        .expect("team schema");

    let roles = org
        .roles
        .create(Vec::<(&str, Value)>::new())
        .expect("roles");
    let group = org
        .group
        .create([("name", Value::text("core")), ("roles", roles.into())])
        .expect("group");
    let team = team.create([("group", group)]).expect("team");

    let reowned = team
        .deep_update()
        .field("group")
        .expect("group")
        .set("owner", "grace")
        .expect("update");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let renamed = reowned
        .deep_update()
        .field("group")
        .expect("group")
        .set("name", "infra")
        .expect("update");
    assert_eq!(renamed.get_as::<String>("group_name"), Ok("infra".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let path = renamed.schema().key_path("group.name").expect("path");
    let again = renamed.deep_set(&path, "infra").expect("deep set");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(again.get("group_name"), renamed.get("group_name"));
}

#[test]
fn list_push_shares_storage() {
    let list = List::create([String::from("a"), String::from("b")]);
    let pushed = list.push(String::from("c"));

    assert!(Arc::ptr_eq(
        &list.get_shared(0).expect("first"),
        &pushed.get_shared(0).expect("first"),
    ));
    assert_eq!(list.size(), 2);
}

proptest! {
    #[test]
    fn set_never_mutates_the_source(id in "[a-z0-9]{1,8}", name in ".{0,12}", renamed in ".{0,12}") {
        let person = person_schema(Arc::default());
        let original = person.create([("id", id.as_str()), ("name", name.as_str())]).expect("create");
        let updated = original.set("name", renamed.as_str()).expect("set");

        prop_assert_eq!(original.get_as::<String>("name"), Ok(name.clone()));
        prop_assert_eq!(updated.get_as::<String>("name"), Ok(renamed.clone()));
        prop_assert!(updated.get("id").expect("id").same(original.get("id").expect("id")));
    }

    #[test]
    fn has_changed_matches_identity(first in 0i64..4, second in 0i64..4) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let schema = Schema::builder("Counter")
            .default("n", 0)
            .default("other", 0)
            .derived("seen", has_changed(["n"]), compute(move |fields| {
                counted.fetch_add(1, Ordering::SeqCst);
                fields.get("n").cloned().unwrap_or_default()
            }))
            .build()
            .expect("schema");

        let a = schema.create([("n", first)]).expect("create");
        let b = a.set("n", second).expect("set");
        let expected = if first == second { 1 } else { 2 };

        prop_assert_eq!(calls.load(Ordering::SeqCst), expected);
        prop_assert_eq!(b.get("seen"), Ok(&Value::Int(second)));
    }
}
