//! Lenient field readers for sibling track data.
//!
//! Property editors have stored `null`, strings and booleans where numbers
//! belong. These readers coerce such values instead of failing the whole
//! project load.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// A number, zero when absent or unreadable.
pub fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number(&value).unwrap_or(0.0))
}

/// A number, `None` when absent or unreadable.
pub fn optional_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number(&value))
}

pub fn seconds_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().filter_map(number).collect(),
        _ => Vec::new(),
    })
}

/// A non-negative integer id, zero when unreadable.
pub fn id_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number(&value)
        .filter(|n| *n >= 0.0)
        .map_or(0, |n| n.trunc() as u64))
}

/// A string id; numbers are stringified and anything else is empty.
pub fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "seconds")]
        at: f64,
        #[serde(default, deserialize_with = "optional_seconds")]
        start: Option<f64>,
        #[serde(default, deserialize_with = "id_number")]
        upload: u64,
        #[serde(default, deserialize_with = "id_string")]
        id: String,
    }

    fn read(value: Value) -> Fields {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_numbers_and_numeric_strings() {
        let p = read(json!({"at": "2.5", "start": 4, "upload": "12", "id": 7}));
        assert_eq!(p.at, 2.5);
        assert_eq!(p.start, Some(4.0));
        assert_eq!(p.upload, 12);
        assert_eq!(p.id, "7");
    }

    #[test]
    fn test_unreadable_values_fall_back() {
        let p = read(json!({"at": null, "start": "soon", "upload": -3, "id": null}));
        assert_eq!(p.at, 0.0);
        assert_eq!(p.start, None);
        assert_eq!(p.upload, 0);
        assert_eq!(p.id, "");
        let missing = read(json!({}));
        assert_eq!(missing.at, 0.0);
        assert_eq!(missing.start, None);
    }
}
