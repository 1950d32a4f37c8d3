//! Shared schema fixtures for unit tests.

use crate::{
    collection::List,
    derive::{compute, has_changed},
    model::{Schema, Shape},
    value::Value,
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

///
/// Counter
///

#[derive(Clone, Debug, Default)]
pub(crate) struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub(crate) fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// `Person { id, name = "", label = name or id }`.
pub(crate) fn person() -> (Schema, Counter) {
    let calls = Counter::default();
    let counted = calls.clone();

    let schema = Schema::builder("Person")
        .required("id")
        .default("name", "")
        .derived(
            "label",
            has_changed(["name"]),
            compute(move |fields| {
                counted.bump();
                match fields.text("name") {
                    Some(name) if !name.is_empty() => Value::text(name),
                    _ => fields.get("id").cloned().unwrap_or_default(),
                }
            }),
        )
        .build()
        .expect("person schema");

    (schema, calls)
}

///
/// Groups
///
/// `Group { id, roles: Roles { default_roles: [Role], title }, tags,
/// role_count }`.
///

pub(crate) struct Groups {
    pub(crate) role: Schema,
    pub(crate) roles: Schema,
    pub(crate) group: Schema,
    pub(crate) role_count_calls: Counter,
}

impl Groups {
    pub(crate) fn new() -> Self {
        let role = Schema::builder("Role")
            .required("name")
            .default("level", 0)
            .build()
            .expect("role schema");

        let roles = Schema::builder("Roles")
            .default_shaped(
                "default_roles",
                List::<Value>::new(),
                Shape::ListOf(role.clone()),
            )
            .default("title", "")
            .build()
            .expect("roles schema");

        let role_count_calls = Counter::default();
        let counted = role_count_calls.clone();

        let group = Schema::builder("Group")
            .required("id")
            .required_shaped("roles", Shape::Model(roles.clone()))
            .default("tags", List::<Value>::new())
            .derived(
                "role_count",
                has_changed(["roles.default_roles"]),
                compute(move |fields| {
                    counted.bump();
                    fields
                        .get("roles")
                        .ok()
                        .and_then(Value::as_model)
                        .and_then(|roles| roles.get("default_roles").ok())
                        .and_then(Value::as_list)
                        .map_or(0, |list| i64::try_from(list.size()).unwrap_or(i64::MAX))
                }),
            )
            .build()
            .expect("group schema");

        Self {
            role,
            roles,
            group,
            role_count_calls,
        }
    }

    pub(crate) fn role(&self, name: &str) -> Value {
        self.role
            .create([("name", name)])
            .expect("role instance")
            .into()
    }

    /// A group holding `roles` as its default roles.
    pub(crate) fn group_with(&self, id: &str, roles: &[&str]) -> crate::model::Model {
        let default_roles = Value::list(roles.iter().map(|name| self.role(name)));
        let roles = self
            .roles
            .create([("default_roles", default_roles), ("title", Value::text("staff"))])
            .expect("roles instance");

        self.group
            .create([("id", Value::text(id)), ("roles", roles.into())])
            .expect("group instance")
    }
}
