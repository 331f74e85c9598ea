//! Dotted-path access into nested mappings.
//!
//! A path such as `test_settings.nested.value` names one mapping key per
//! segment. Reads treat any missing or non-mapping step as absence; writes
//! create missing intermediate mappings.

use crate::document::{Mapping, Node};
use crate::{Error, Result};

/// Split a dotted path into its segments.
///
/// Rejects empty paths and empty segments (`a..b`, `.a`, `a.`).
pub fn segments(path: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|s| s.is_empty()) {
        return Err(Error::InvalidPath(path.to_string()));
    }
    Ok(parts)
}

/// Look up the node at `path`.
///
/// Returns `Ok(None)` when any segment is missing or an intermediate value is
/// not a mapping.
pub fn get<'a>(root: &'a Node, path: &str) -> Result<Option<&'a Node>> {
    let mut current = root;
    for segment in segments(path)? {
        match current {
            Node::Mapping(map) => match map.get(segment) {
                Some(child) => current = child,
                None => return Ok(None),
            },
            _ => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Store `value` at `path`, creating intermediate mappings as needed.
///
/// A null root or null intermediate is replaced by an empty mapping. Any other
/// non-mapping value along the way is left untouched and reported as
/// [`Error::PathConflict`].
pub fn set(root: &mut Node, path: &str, value: Node) -> Result<()> {
    let parts = segments(path)?;
    let Some((last, parents)) = parts.split_last() else {
        return Err(Error::InvalidPath(path.to_string()));
    };

    if root.is_null() {
        *root = Node::Mapping(Mapping::new());
    }
    let mut current = match root {
        Node::Mapping(map) => map,
        _ => {
            return Err(Error::PathConflict {
                path: path.to_string(),
                segment: "(root)".to_string(),
            });
        }
    };

    for segment in parents {
        let child = current
            .entry(Node::String((*segment).to_string()))
            .or_insert(Node::Null);
        if child.is_null() {
            *child = Node::Mapping(Mapping::new());
        }
        current = match child {
            Node::Mapping(map) => map,
            _ => {
                return Err(Error::PathConflict {
                    path: path.to_string(),
                    segment: (*segment).to_string(),
                });
            }
        };
    }

    current.insert(Node::String((*last).to_string()), value);
    Ok(())
}
