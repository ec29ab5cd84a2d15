//! JSON Patch construction for Pod annotations
//!
//! A JSON Patch `add` on `/metadata/annotations/<key>` fails when the
//! annotations object does not exist yet, so the builder adds the whole map
//! in that case. Keys are escaped through [`PointerBuf::from_tokens`], which
//! matters for the `/` in a domain-qualified annotation key.

use std::collections::BTreeMap;

use json_patch::{AddOperation, Patch, PatchOperation};
use jsonptr::PointerBuf;
use serde_json::{Map, Value};

/// Build the patch that adds `key: value` to a Pod's annotations
///
/// - No annotations (or an empty map): one `add` of `/metadata/annotations`
///   holding only the new key.
/// - Annotations without `key`: one `add` of `/metadata/annotations/<key>`.
/// - Annotations already holding `key`: an empty patch. Existing values are
///   never replaced.
pub fn build_annotation_patch(
    existing: Option<&BTreeMap<String, String>>,
    key: &str,
    value: &str,
) -> Patch {
    let ops = match existing {
        Some(annotations) if annotations.contains_key(key) => Vec::new(),
        Some(annotations) if !annotations.is_empty() => {
            vec![PatchOperation::Add(AddOperation {
                path: PointerBuf::from_tokens(["metadata", "annotations", key]),
                value: Value::String(value.to_string()),
            })]
        }
        _ => {
            let mut annotations = Map::new();
            annotations.insert(key.to_string(), Value::String(value.to_string()));
            vec![PatchOperation::Add(AddOperation {
                path: PointerBuf::from_tokens(["metadata", "annotations"]),
                value: Value::Object(annotations),
            })]
        }
    };

    Patch(ops)
}
