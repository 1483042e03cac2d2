//! JSON response envelopes: `{"message": ..., "<field>": ...}`.

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};

/// Print a message with one payload field, pretty-printed to stdout.
pub fn print_envelope<T: Serialize>(message: &str, field: &str, payload: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&envelope(message, field, payload)?)?);
    Ok(())
}

pub fn envelope<T: Serialize>(message: &str, field: &str, payload: &T) -> Result<Value> {
    let mut body = Map::new();
    body.insert("message".to_string(), Value::String(message.to_string()));
    body.insert(field.to_string(), serde_json::to_value(payload)?);
    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let value = envelope("Folders retrieved successfully", "folders", &vec![1, 2]).unwrap();
        assert_eq!(value["message"], "Folders retrieved successfully");
        assert_eq!(value["folders"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_empty_payload_is_array_not_null() {
        let empty: Vec<String> = Vec::new();
        let value = envelope("Scenarios retrieved successfully", "scenarios", &empty).unwrap();
        assert_eq!(value["scenarios"], serde_json::json!([]));
    }
}
