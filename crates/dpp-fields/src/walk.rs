//! Depth-first traversal over object nodes with their JSON Pointers.
//!
//! Pre-order: a node is visited before its children, so a visitor that
//! rewrites a child (e.g. swaps `value` for a marker) sees the rewritten
//! child on descent. Object keys are walked in document order, array
//! elements by ascending index.

use serde_json::{Map, Value};

use crate::pointer::push_segment;

/// Visit every object node in `root`, mutably.
pub fn walk_objects_mut<E, F>(root: &mut Value, visit: &mut F) -> Result<(), E>
where
    F: FnMut(&str, &mut Map<String, Value>) -> Result<(), E>,
{
    let mut pointer = String::new();
    walk_mut(root, &mut pointer, visit)
}

fn walk_mut<E, F>(node: &mut Value, pointer: &mut String, visit: &mut F) -> Result<(), E>
where
    F: FnMut(&str, &mut Map<String, Value>) -> Result<(), E>,
{
    match node {
        Value::Object(map) => {
            visit(pointer.as_str(), &mut *map)?;
            for (key, child) in map.iter_mut() {
                let len = pointer.len();
                push_segment(pointer, key);
                walk_mut(child, pointer, visit)?;
                pointer.truncate(len);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter_mut().enumerate() {
                let len = pointer.len();
                push_segment(pointer, &index.to_string());
                walk_mut(child, pointer, visit)?;
                pointer.truncate(len);
            }
        }
        _ => {}
    }
    Ok(())
}

/// What the read-only walk does after visiting an object node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    /// Walk every child.
    All,
    /// Walk every child except the one under this key.
    Skip(&'static str),
}

/// Visit every object node in `root`, read-only.
pub fn walk_objects<F>(root: &Value, visit: &mut F)
where
    F: FnMut(&str, &Map<String, Value>) -> Descend,
{
    let mut pointer = String::new();
    walk(root, &mut pointer, visit);
}

fn walk<F>(node: &Value, pointer: &mut String, visit: &mut F)
where
    F: FnMut(&str, &Map<String, Value>) -> Descend,
{
    match node {
        Value::Object(map) => {
            let descend = visit(pointer.as_str(), map);
            for (key, child) in map {
                if matches!(descend, Descend::Skip(skip) if key == skip) {
                    continue;
                }
                let len = pointer.len();
                push_segment(pointer, key);
                walk(child, pointer, visit);
                pointer.truncate(len);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let len = pointer.len();
                push_segment(pointer, &index.to_string());
                walk(child, pointer, visit);
                pointer.truncate(len);
            }
        }
        _ => {}
    }
}
