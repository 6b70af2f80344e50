//! Path-based navigation over a [`Value`] tree.
//!
//! Reads are forgiving: a path that does not fit the document shape simply
//! resolves to nothing. Writes are strict and report the first step that
//! disagrees with the document.

use super::error::{Result, YeditError};
use crate::fieldpath::{resolve_index, Path, PathElement};
use crate::value::{Map, Value};

/// Follows `path` from `data`, returning the addressed node.
pub fn get_path<'a>(data: &'a Value, path: &Path) -> Option<&'a Value> {
    path.iter().try_fold(data, |node, element| match (element, node) {
        (PathElement::Field(name), Value::Map(map)) => map.get(name),
        (PathElement::Index(i), Value::List(list)) => {
            resolve_index(*i, list.len()).map(|idx| &list[idx])
        }
        _ => None,
    })
}

/// Mutable variant of [`get_path`].
pub fn get_path_mut<'a>(data: &'a mut Value, path: &[PathElement]) -> Option<&'a mut Value> {
    let mut node = data;
    for element in path {
        node = match element {
            PathElement::Field(name) => match node {
                Value::Map(map) => map.get_mut(name)?,
                _ => return None,
            },
            PathElement::Index(i) => match node {
                Value::List(list) => {
                    let idx = resolve_index(*i, list.len())?;
                    &mut list[idx]
                }
                _ => return None,
            },
        };
    }
    Some(node)
}

/// Returns the node at `key`, or `None` when the key is malformed or does not
/// resolve against the document.
pub fn get_entry<'a>(data: &'a Value, key: &str, separator: char) -> Option<&'a Value> {
    let path = Path::parse(key, separator).ok()?;
    get_path(data, &path)
}

/// Writes `item` at `key`, creating intermediate mappings as needed.
///
/// Intermediate field steps descend into an existing non-empty value or
/// replace an absent/empty one with a new mapping. Index steps must address
/// an existing slot: sequences are never grown by indexing.
pub fn add_entry(data: &mut Value, key: &str, item: Value, separator: char) -> Result<()> {
    let path = Path::parse(key, separator)?;
    add_path(data, &path, item).map_err(|reason| YeditError::invalid_path(key, reason))
}

/// Writes `item` at an already parsed path. The error carries a human
/// readable reason for the first incompatible step.
pub fn add_path(data: &mut Value, path: &Path, item: Value) -> std::result::Result<(), String> {
    let Some((last, parents)) = path.split_last() else {
        *data = item;
        return Ok(());
    };

    let mut node = data;
    for element in parents {
        node = match element {
            PathElement::Field(name) => match node {
                Value::Map(map) => {
                    let child = map.fields.entry(name.clone()).or_insert(Value::Null);
                    if !child.is_truthy() {
                        *child = Value::Map(Map::new());
                    }
                    child
                }
                other => {
                    return Err(format!(
                        "unexpected {} while going through key path (at key: {})",
                        other.type_name(),
                        name
                    ))
                }
            },
            PathElement::Index(i) => match node {
                Value::List(list) => {
                    let len = list.len();
                    let idx = resolve_index(*i, len)
                        .ok_or_else(|| format!("index {} out of range for list of {}", i, len))?;
                    &mut list[idx]
                }
                other => {
                    return Err(format!(
                        "unexpected {} while going through key path (at index: {})",
                        other.type_name(),
                        i
                    ))
                }
            },
        };
    }

    match last {
        PathElement::Field(name) => match node {
            Value::Map(map) => {
                map.set(name.clone(), item);
                Ok(())
            }
            other => Err(format!(
                "cannot set key '{}' on {}",
                name,
                other.type_name()
            )),
        },
        PathElement::Index(i) => match node {
            Value::List(list) => {
                let len = list.len();
                let idx = resolve_index(*i, len).ok_or_else(|| {
                    format!("index {} out of range for list of {}; initialize the list first", i, len)
                })?;
                list[idx] = item;
                Ok(())
            }
            other => Err(format!("cannot index {} with [{}]", other.type_name(), i)),
        },
    }
}

/// Removes the node at `key`. The empty key clears the whole document.
///
/// Returns whether something was removed; malformed keys and paths that do
/// not resolve are no-ops.
pub fn remove_entry(data: &mut Value, key: &str, separator: char) -> bool {
    if key.is_empty() {
        return match data {
            Value::Map(map) => {
                map.clear();
                true
            }
            Value::List(list) => {
                list.clear();
                true
            }
            _ => false,
        };
    }

    let Ok(path) = Path::parse(key, separator) else {
        return false;
    };
    let Some((last, parents)) = path.split_last() else {
        return false;
    };
    let Some(parent) = get_path_mut(data, parents) else {
        return false;
    };

    match (last, parent) {
        (PathElement::Field(name), Value::Map(map)) => map.delete(name).is_some(),
        (PathElement::Index(i), Value::List(list)) => match resolve_index(*i, list.len()) {
            Some(idx) => {
                list.remove(idx);
                true
            }
            None => false,
        },
        _ => false,
    }
}
