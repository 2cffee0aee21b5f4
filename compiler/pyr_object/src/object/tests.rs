use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_attribute_set_get_delete() {
    let object = Object::namespace();
    assert!(!object.has_attribute("x"));

    let value = Object::new(Payload::Int(7), None);
    object.set_attribute("x", value.clone());
    assert!(object.has_attribute("x"));
    assert!(object.get_attribute("x").is_some_and(|got| got.is(&value)));

    let removed = object.delete_attribute("x");
    assert!(removed.is_some_and(|got| got.is(&value)));
    assert!(!object.has_attribute("x"));
    assert!(object.delete_attribute("x").is_none());
}

#[test]
fn test_dir_is_sorted_and_counted() {
    let object = Object::namespace();
    object.set_attribute("b", Object::namespace());
    object.set_attribute("a", Object::namespace());
    object.set_attribute("c", Object::namespace());

    let names: Vec<String> = object.dir().iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(object.dir_size(), 3);
}

#[test]
fn test_identity_is_not_value_equality() {
    let one = Object::new(Payload::Int(1), None);
    let other_one = Object::new(Payload::Int(1), None);
    assert_ne!(one, other_one);
    assert_ne!(one.id(), other_one.id());
    assert_eq!(one, one.clone());
}

#[test]
fn test_mro_walk_helpers() {
    let base = Object::namespace();
    let middle = Object::namespace();
    let leaf = Object::namespace();
    base.set_attribute("__mro__", Object::new(Payload::Tuple(vec![base.clone()]), None));
    middle.set_attribute(
        "__mro__",
        Object::new(Payload::Tuple(vec![middle.clone(), base.clone()]), None),
    );
    leaf.set_attribute(
        "__mro__",
        Object::new(
            Payload::Tuple(vec![leaf.clone(), middle.clone(), base.clone()]),
            None,
        ),
    );
    let instance = Object::new(Payload::Plain, Some(&leaf));

    assert!(leaf.is_type());
    assert!(!instance.is_type());
    assert_eq!(instance.type_mro().len(), 3);
    assert!(leaf.is_subclass(&base));
    assert!(!base.is_subclass(&leaf));
    assert!(instance.is_instance(&middle));
}

#[test]
fn test_native_truth() {
    assert_eq!(Object::new(Payload::None, None).native_truth(), Some(false));
    assert_eq!(Object::new(Payload::Int(0), None).native_truth(), Some(false));
    assert_eq!(Object::new(Payload::Int(3), None).native_truth(), Some(true));
    assert_eq!(
        Object::new(Payload::Str("".into()), None).native_truth(),
        Some(false)
    );
    assert_eq!(Object::namespace().native_truth(), None);
}

#[test]
fn test_display_strings() {
    let items = vec![
        Object::new(Payload::Int(1), None),
        Object::new(Payload::Str("a".into()), None),
    ];
    assert_eq!(
        Object::new(Payload::Tuple(items), None).display_string(),
        "(1, 'a')"
    );
    assert_eq!(Object::new(Payload::Float(2.0), None).display_string(), "2.0");
    assert_eq!(Object::new(Payload::Bool(true), None).display_string(), "True");
    let single = vec![Object::new(Payload::Int(5), None)];
    assert_eq!(
        Object::new(Payload::Tuple(single), None).display_string(),
        "(5,)"
    );
}

#[test]
fn test_pinning() {
    let object = Object::namespace();
    assert!(!object.is_pinned());
    object.pin();
    assert!(object.is_pinned());
}

#[test]
fn test_debug_does_not_follow_attributes() {
    let object = Object::namespace();
    object.set_attribute("me", object.clone());
    let rendered = format!("{object:?}");
    assert!(rendered.starts_with("Object"));
    // Break the cycle so the test does not leak.
    object.delete_attribute("me");
}
