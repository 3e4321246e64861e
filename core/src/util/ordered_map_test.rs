use super::ordered_map::OrderedMap;

#[test]
fn test_insertion_order_survives_overwrite() {
    let mut map = OrderedMap::default();
    map.insert("b".to_string(), 1);
    map.insert("a".to_string(), 2);
    map.insert("c".to_string(), 3);
    assert_eq!(map.insert("a".to_string(), 20), Some(2));

    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["b", "a", "c"]);
    assert_eq!(map.get("a"), Some(&20));
    assert_eq!(map.get_index(1).map(|(k, v)| (k.as_str(), *v)), Some(("a", 20)));
}

#[test]
fn test_shift_remove_keeps_order_of_survivors() {
    let mut map = OrderedMap::default();
    for (i, key) in ["x", "y", "z", "w"].iter().enumerate() {
        map.insert(key.to_string(), i);
    }
    assert_eq!(map.shift_remove("y"), Some(1));
    assert_eq!(map.shift_remove("missing"), None);
    assert_eq!(map.len(), 3);
    assert_eq!(map.get_index(2).map(|(k, _)| k.as_str()), Some("w"));

    map.insert("y".to_string(), 9);
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["x", "z", "w", "y"]);
}
