//! Path-addressed access to form values
//!
//! Form values are typed (`T`), but the rendering layer addresses fields by
//! [`FieldPath`]. Edits go through the serde data model: the value is
//! serialized to a JSON tree, the addressed node is replaced, and the tree is
//! deserialized back into `T`, which rejects values of the wrong shape.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use weft_core::FieldPath;

use crate::errors::FormError;

/// Serialize form values into a JSON tree.
pub(crate) fn to_tree<T: Serialize>(values: &T) -> Result<Value, FormError> {
    serde_json::to_value(values).map_err(FormError::Serialize)
}

/// Rebuild typed values from an edited tree.
pub(crate) fn from_tree<T: DeserializeOwned>(tree: Value, path: &FieldPath) -> Result<T, FormError> {
    serde_json::from_value(tree).map_err(|source| FormError::IncompatibleValue {
        path: path.clone(),
        source,
    })
}

/// Borrow the node at `path`, if it exists.
pub fn read_path<'a>(tree: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments().try_fold(tree, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Replace the node at `path` with `value`.
///
/// Missing object keys are created along the way. Sequence indices must
/// address an existing element or the position just past the end (append).
pub fn write_path(tree: &mut Value, path: &FieldPath, value: Value) -> Result<(), FormError> {
    let segments: Vec<&str> = path.segments().collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(FormError::invalid_path(path, "path is empty"));
    };

    let mut node = tree;
    for segment in parents {
        node = descend(node, segment, path)?;
    }

    match node {
        Value::Object(map) => {
            map.insert((*last).to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = parse_index(last, path)?;
            if index < items.len() {
                items[index] = value;
                Ok(())
            } else if index == items.len() {
                items.push(value);
                Ok(())
            } else {
                Err(FormError::invalid_path(
                    path,
                    format!("index {index} is past the end of a sequence of {}", items.len()),
                ))
            }
        }
        Value::Null => {
            let mut map = Map::new();
            map.insert((*last).to_string(), value);
            *node = Value::Object(map);
            Ok(())
        }
        _ => Err(FormError::invalid_path(path, format!("`{last}` has a scalar parent"))),
    }
}

fn descend<'a>(node: &'a mut Value, segment: &str, path: &FieldPath) -> Result<&'a mut Value, FormError> {
    if node.is_null() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => Ok(map.entry(segment.to_string()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = parse_index(segment, path)?;
            let len = items.len();
            items.get_mut(index).ok_or_else(|| {
                FormError::invalid_path(path, format!("index {index} out of bounds for length {len}"))
            })
        }
        _ => Err(FormError::invalid_path(path, format!("`{segment}` has a scalar parent"))),
    }
}

fn parse_index(segment: &str, path: &FieldPath) -> Result<usize, FormError> {
    segment
        .parse()
        .map_err(|_| FormError::invalid_path(path, format!("`{segment}` is not a sequence index")))
}

/// Top-level keys whose values differ between two trees.
pub(crate) fn changed_fields(before: &Value, after: &Value) -> BTreeSet<FieldPath> {
    match (before, after) {
        (Value::Object(old), Value::Object(new)) => old
            .keys()
            .chain(new.keys())
            .filter(|key| old.get(*key) != new.get(*key))
            .map(|key| FieldPath::new(key.as_str()))
            .collect(),
        _ if before != after => BTreeSet::from([FieldPath::root()]),
        _ => BTreeSet::new(),
    }
}

/// Top-level keys of a tree.
pub(crate) fn top_level_fields(tree: &Value) -> BTreeSet<FieldPath> {
    match tree {
        Value::Object(map) => map.keys().map(|key| FieldPath::new(key.as_str())).collect(),
        _ => BTreeSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_nested_and_indexed() {
        let tree = json!({"address": {"city": "Oslo"}, "tags": ["a", "b"]});
        assert_eq!(read_path(&tree, &"address.city".into()), Some(&json!("Oslo")));
        assert_eq!(read_path(&tree, &"tags.1".into()), Some(&json!("b")));
        assert_eq!(read_path(&tree, &"tags.9".into()), None);
        assert_eq!(read_path(&tree, &"address.city.zip".into()), None);
    }

    #[test]
    fn test_write_creates_missing_objects() {
        let mut tree = json!({});
        write_path(&mut tree, &"address.city".into(), json!("Oslo")).unwrap();
        assert_eq!(tree, json!({"address": {"city": "Oslo"}}));
    }

    #[test]
    fn test_write_appends_at_end_of_sequence() {
        let mut tree = json!({"tags": ["a"]});
        write_path(&mut tree, &"tags.1".into(), json!("b")).unwrap();
        write_path(&mut tree, &"tags.0".into(), json!("z")).unwrap();
        assert_eq!(tree, json!({"tags": ["z", "b"]}));
    }

    #[test]
    fn test_write_rejects_gaps_and_scalars() {
        let mut tree = json!({"tags": [], "age": 3});
        assert!(matches!(
            write_path(&mut tree, &"tags.4".into(), json!("x")),
            Err(FormError::InvalidPath { .. })
        ));
        assert!(matches!(
            write_path(&mut tree, &"age.years".into(), json!(1)),
            Err(FormError::InvalidPath { .. })
        ));
        assert!(matches!(
            write_path(&mut tree, &"".into(), json!(1)),
            Err(FormError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_changed_fields() {
        let before = json!({"email": "", "age": 20});
        let after = json!({"email": "a@b.com", "age": 20});
        let changed = changed_fields(&before, &after);
        assert_eq!(changed, BTreeSet::from([FieldPath::new("email")]));
    }
}
