//! Structural comparison between an original value and its translation.
//!
//! Two values have the same shape when they have the same JSON type at every node,
//! objects carry the same key sets, and arrays have the same lengths. Only string leaves
//! may differ; numbers, booleans and nulls must be identical.

use serde_json::Value;

/// Returns the JSON path of the first difference, e.g. `$.prominentFeatures[1].feature`.
pub fn verify_same_shape(original: &Value, translated: &Value) -> Result<(), String> {
    compare(original, translated, &mut String::from("$"))
}

fn compare(original: &Value, translated: &Value, path: &mut String) -> Result<(), String> {
    match (original, translated) {
        (Value::String(_), Value::String(_)) => Ok(()),
        (Value::Number(a), Value::Number(b)) if a == b => Ok(()),
        (Value::Bool(a), Value::Bool(b)) if a == b => Ok(()),
        (Value::Null, Value::Null) => Ok(()),
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Err(path.clone());
            }
            for (i, (x, y)) in a.iter().zip(b).enumerate() {
                let len = path.len();
                path.push_str(&format!("[{i}]"));
                compare(x, y, path)?;
                path.truncate(len);
            }
            Ok(())
        }
        (Value::Object(a), Value::Object(b)) => {
            if a.len() != b.len() {
                return Err(path.clone());
            }
            for (key, x) in a {
                let len = path.len();
                path.push('.');
                path.push_str(key);
                let y = b.get(key).ok_or_else(|| path.clone())?;
                compare(x, y, path)?;
                path.truncate(len);
            }
            Ok(())
        }
        _ => Err(path.clone()),
    }
}
