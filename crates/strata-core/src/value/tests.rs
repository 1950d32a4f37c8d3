use super::*;

#[test]
fn same_compares_scalars_by_value() {
    assert!(Value::from(3).same(&Value::Int(3)));
    assert!(Value::text("a").same(&Value::from("a")));
    assert!(Value::Null.same(&Value::Null));
    assert!(!Value::from(3).same(&Value::from(3.0)));
    assert!(!Value::Float(f64::NAN).same(&Value::Float(f64::NAN)));
}

#[test]
fn same_compares_collections_by_reference() {
    let list = Value::list([1, 2]);
    let rebuilt = Value::list([1, 2]);

    assert!(list.same(&list.clone()));
    assert!(!list.same(&rebuilt));
    assert_eq!(list, rebuilt);
}

#[test]
fn contains_model_looks_through_collections() {
    assert!(!Value::list([Value::map([("a", 1)])]).contains_model());
}

#[test]
fn from_value_projections() {
    assert_eq!(String::from_value(&Value::text("x")), Some("x".to_string()));
    assert_eq!(i64::from_value(&Value::text("x")), None);
    assert_eq!(f64::from_value(&Value::Int(2)), Some(2.0));
    assert_eq!(Option::<i64>::from_value(&Value::Null), Some(None));
    assert_eq!(Option::<i64>::from_value(&Value::Int(4)), Some(Some(4)));
}

#[test]
fn values_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<Value>();
    assert_send_sync::<crate::model::Model>();
    assert_send_sync::<crate::model::Schema>();
}
