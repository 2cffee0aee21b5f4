use super::*;
use pretty_assertions::assert_eq;
use std::collections::HashMap;

#[test]
fn test_name_equality_is_by_content() {
    assert_eq!(Name::new("spam"), Name::from("spam".to_string()));
    assert_ne!(Name::new("spam"), Name::new("eggs"));
}

#[test]
fn test_name_borrows_as_str_for_map_lookup() {
    let mut table = HashMap::new();
    table.insert(Name::new("x"), 1);
    assert_eq!(table.get("x"), Some(&1));
}

#[test]
fn test_name_display_and_debug() {
    let name = Name::new("value");
    assert_eq!(name.to_string(), "value");
    assert_eq!(format!("{name:?}"), "Name(\"value\")");
}
