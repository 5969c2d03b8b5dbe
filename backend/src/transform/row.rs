//! Row transformer: one [`RawRow`] in, one nested [`Node`] out.
//!
//! For each mapped column (in row order) the target path is parsed, the
//! intermediate objects are created on demand and the stringified cell is
//! coerced to a [`Scalar`] at the leaf. Unmapped columns are dropped.
//!
//! ```text
//! {"USER_ID": "42", "USERNAME": "bob"}
//!   + USER_ID -> $.user.id, USERNAME -> $.user.name
//!   = {"user": {"id": 42, "name": "bob"}}
//! ```

use std::collections::BTreeMap;

use super::mapping::MappingTable;
use super::path::TargetPath;
use crate::error::{TransformError, TransformResult};
use crate::models::{Node, RawRow, Scalar};

/// Transform one row into a fresh object.
///
/// Later columns overwrite earlier ones at the same path, and a deeper path
/// replaces a scalar sitting on one of its intermediate segments (and the
/// other way round): the last assignment wins.
///
/// # Errors
/// [`TransformError::InvalidMapping`] when a column present in the row is
/// mapped to an empty or root-only path.
pub fn transform_row(row: &RawRow, mappings: &MappingTable) -> TransformResult<Node> {
    let mut root = BTreeMap::new();

    for (column, value) in row.iter() {
        let Some(raw_path) = mappings.path_for(column) else {
            continue;
        };

        let path = TargetPath::parse(raw_path).map_err(|reason| TransformError::InvalidMapping {
            column: column.to_string(),
            path: raw_path.to_string(),
            reason,
        })?;

        assign(&mut root, &path, coerce(&value.to_raw_string()));
    }

    Ok(Node::Object(root))
}

/// Infer a scalar from its string form.
///
/// `true`/`false` in any case become booleans, base-10 integers (sign
/// allowed, leading zeros ignored) become integers, anything else stays a
/// string.
pub fn coerce(raw: &str) -> Scalar {
    if raw.eq_ignore_ascii_case("true") {
        Scalar::Bool(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Scalar::Bool(false)
    } else if let Ok(n) = raw.parse::<i64>() {
        Scalar::Integer(n)
    } else {
        Scalar::String(raw.to_string())
    }
}

/// Place `scalar` at `path` below `root`, creating objects along the way.
pub fn assign(root: &mut BTreeMap<String, Node>, path: &TargetPath, scalar: Scalar) {
    insert_at(root, path.parents(), path.leaf(), scalar);
}

/// Walk `parents` below `map` and set `leaf`. A scalar sitting on an
/// intermediate segment is replaced by a fresh object.
fn insert_at(map: &mut BTreeMap<String, Node>, parents: &[String], leaf: &str, scalar: Scalar) {
    let Some((segment, rest)) = parents.split_first() else {
        map.insert(leaf.to_string(), Node::Scalar(scalar));
        return;
    };

    let slot = map.entry(segment.clone()).or_insert_with(Node::object);
    match slot {
        Node::Object(child) => insert_at(child, rest, leaf, scalar),
        Node::Scalar(_) => {
            let mut child = BTreeMap::new();
            insert_at(&mut child, rest, leaf, scalar);
            *slot = Node::Object(child);
        }
    }
}
