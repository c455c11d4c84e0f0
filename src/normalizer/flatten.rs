// Flattening of nested detail records.
use std::collections::HashMap;

use serde_json::Value;

/// Flatten a nested JSON tree into `path -> scalar`, joining object keys
/// and array indices with `_`:
/// `{"autoData": {"raceInt": 15}}` becomes `"autoData_raceInt": 15`.
pub fn flatten(value: &Value) -> HashMap<String, Value> {
    let mut flat = HashMap::new();
    walk(value, None, &mut flat);
    flat
}

fn walk(value: &Value, prefix: Option<&str>, flat: &mut HashMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = match prefix {
                    Some(prefix) => format!("{prefix}_{key}"),
                    None => key.clone(),
                };
                walk(child, Some(&path), flat);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let path = match prefix {
                    Some(prefix) => format!("{prefix}_{index}"),
                    None => index.to_string(),
                };
                walk(child, Some(&path), flat);
            }
        }
        scalar => {
            if let Some(path) = prefix {
                flat.insert(path.to_string(), scalar.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_nested_objects() {
        let flat = flatten(&json!({
            "autoData": {"raceInt": 15, "fuelName": "Diesel"},
            "title": "Ford Focus"
        }));
        assert_eq!(flat["autoData_raceInt"], json!(15));
        assert_eq!(flat["autoData_fuelName"], json!("Diesel"));
        assert_eq!(flat["title"], json!("Ford Focus"));
    }

    #[test]
    fn flattens_arrays_by_index() {
        let flat = flatten(&json!({"photos": [{"url": "a"}, {"url": "b"}]}));
        assert_eq!(flat["photos_0_url"], json!("a"));
        assert_eq!(flat["photos_1_url"], json!("b"));
    }

    #[test]
    fn keeps_scalar_types() {
        let flat = flatten(&json!({"a": {"b": true, "c": null, "d": 1.5}}));
        assert_eq!(flat["a_b"], json!(true));
        assert_eq!(flat["a_c"], Value::Null);
        assert_eq!(flat["a_d"], json!(1.5));
    }
}
