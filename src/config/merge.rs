//! Deep merge of configuration trees.
//!
//! Mappings are merged key by key; everything else, sequences included, is
//! replaced by the overlay. A sequence is never merged element-wise or
//! concatenated.

use serde_json::Value;

/// Deep merge two values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans and nulls in overlay replace base
/// - Keys present only in base are kept in their original position
///
/// # Example
/// ```
/// use serde_json::json;
/// use layered_conf::config::deep_merge;
///
/// let base = json!({
///     "server": { "port": 8080, "host": "localhost" },
///     "features": ["a", "b"]
/// });
/// let overlay = json!({
///     "server": { "port": 9000 },
///     "features": ["c"]
/// });
/// let result = deep_merge(base, overlay);
/// assert_eq!(
///     result,
///     json!({ "server": { "port": 9000, "host": "localhost" }, "features": ["c"] })
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                // get_mut keeps the key's slot so merged keys don't move to the end
                match base_map.get_mut(&key) {
                    Some(slot) => {
                        let base_value = slot.take();
                        *slot = deep_merge(base_value, overlay_value);
                    }
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge multiple values in order, with later values taking precedence.
///
/// Equivalent to folding `deep_merge` over the list, starting from an empty
/// object.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values
        .into_iter()
        .fold(Value::Object(Default::default()), deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_simple_objects() {
        let base = json!({"a": 1, "b": 2});
        let overlay = json!({"b": 3, "c": 4});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_merge_nested_objects() {
        let base = json!({
            "api": {"credentials": {"id": "base-api-id", "key": "base-api-key"}, "retries": 3},
            "debug": true
        });
        let overlay = json!({
            "api": {"credentials": {"key": "override-a-api-key"}}
        });
        let result = deep_merge(base, overlay);
        assert_eq!(
            result,
            json!({
                "api": {"credentials": {"id": "base-api-id", "key": "override-a-api-key"}, "retries": 3},
                "debug": true
            })
        );
    }

    #[test]
    fn test_arrays_replaced_not_merged() {
        let result = deep_merge(json!({"a": [1, 2]}), json!({"a": [3]}));
        assert_eq!(result, json!({"a": [3]}));
    }

    #[test]
    fn test_nested_arrays_replaced() {
        let base = json!({"hosts": [{"name": "a", "port": 1}, {"name": "b", "port": 2}]});
        let overlay = json!({"hosts": [{"name": "c"}]});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"hosts": [{"name": "c"}]}));
    }

    #[test]
    fn test_empty_array_clears_target() {
        let result = deep_merge(json!({"a": [1, 2]}), json!({"a": []}));
        assert_eq!(result, json!({"a": []}));
    }

    #[test]
    fn test_null_overlay_overwrites() {
        let result = deep_merge(json!({"a": 1, "b": 2}), json!({"a": null}));
        assert_eq!(result, json!({"a": null, "b": 2}));
    }

    #[test]
    fn test_key_order_preserved() {
        let base = json!({"name": "app", "port": 8080, "uuid": "01A0"});
        let overlay = json!({"port": 8082, "version": "0.0.2"});
        let result = deep_merge(base, overlay);
        let keys: Vec<&str> = result
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["name", "port", "uuid", "version"]);
    }

    #[test]
    fn test_merge_all() {
        let values = vec![json!({"a": 1}), json!({"b": 2}), json!({"a": 3, "c": 4})];
        let result = deep_merge_all(values);
        assert_eq!(result, json!({"a": 3, "b": 2, "c": 4}));
    }

    #[test]
    fn test_merge_all_empty_is_empty_object() {
        assert_eq!(deep_merge_all(Vec::new()), json!({}));
    }

    #[test]
    fn test_overlay_replaces_primitive_with_object() {
        let result = deep_merge(json!({"value": 42}), json!({"value": {"nested": true}}));
        assert_eq!(result, json!({"value": {"nested": true}}));
    }

    #[test]
    fn test_overlay_replaces_object_with_array() {
        let result = deep_merge(json!({"value": {"nested": true}}), json!({"value": [1]}));
        assert_eq!(result, json!({"value": [1]}));
    }
}
