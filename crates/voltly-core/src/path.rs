// ── Dotted-path access into dynamic JSON trees ──

use serde_json::Value;

/// Resolve a `.`-separated path against a dynamic JSON tree.
///
/// Objects are indexed by key, arrays by non-negative integer segment.
/// Returns `None` for an absent key, an unparseable or out-of-range
/// index, or a null/scalar node hit before the path is exhausted --
/// callers substitute their own default. Never panics.
pub fn get_value<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.split('.') {
        match node {
            Value::Object(map) => node = map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                node = items.get(index)?;
            }
            _ => return None,
        }
    }
    Some(node)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> Value {
        json!({
            "a": { "b": { "c": 42 } },
            "list": [ { "name": "first" }, { "name": "second" } ],
            "nil": null,
            "scalar": 7,
        })
    }

    #[test]
    fn resolves_nested_object_path() {
        assert_eq!(get_value(&tree(), "a.b.c"), Some(&json!(42)));
    }

    #[test]
    fn resolves_array_index_path() {
        assert_eq!(get_value(&tree(), "list.1.name"), Some(&json!("second")));
    }

    #[test]
    fn absent_key_is_none() {
        assert_eq!(get_value(&tree(), "a.b.missing"), None);
        assert_eq!(get_value(&tree(), "nope"), None);
    }

    #[test]
    fn out_of_range_index_is_none() {
        assert_eq!(get_value(&tree(), "list.5.name"), None);
    }

    #[test]
    fn non_numeric_index_is_none() {
        assert_eq!(get_value(&tree(), "list.first.name"), None);
        assert_eq!(get_value(&tree(), "list.-1.name"), None);
    }

    #[test]
    fn null_intermediate_never_faults() {
        assert_eq!(get_value(&tree(), "nil.anything.deeper"), None);
    }

    #[test]
    fn scalar_mid_path_is_none() {
        assert_eq!(get_value(&tree(), "scalar.deeper"), None);
    }

    #[test]
    fn single_segment_hits_top_level() {
        assert_eq!(get_value(&tree(), "scalar"), Some(&json!(7)));
    }
}
