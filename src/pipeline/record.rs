//! Alert records exchanged with the surrounding pipeline.

use serde_json::{Map, Value};

use crate::detection::DropResult;
use crate::error::{DropError, Result};

/// A flat mapping of field names to JSON values.
pub type Record = Map<String, Value>;

/// Read a numeric array field.
pub fn read_series(data: &Record, field: &str) -> Result<Vec<f64>> {
    let value = data
        .get(field)
        .ok_or_else(|| DropError::MissingField(field.to_string()))?;
    let items = value.as_array().ok_or_else(|| {
        DropError::InvalidInput(format!("field '{field}' is not an array"))
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64().ok_or_else(|| {
                DropError::InvalidInput(format!("field '{field}' entry {i} is not a number"))
            })
        })
        .collect()
}

/// Write `result` into `data`, nested under `out_field` when given.
///
/// `max_drop` is written only when `with_max_drop` is set; absent values
/// become JSON `null`.
pub fn write_result(
    data: &mut Record,
    result: &DropResult,
    out_field: Option<&str>,
    with_max_drop: bool,
) {
    let mut fields = Record::new();
    fields.insert("has_drop".to_string(), Value::Bool(result.has_drop));
    fields.insert("drop_time".to_string(), optional_number(result.drop_time));
    if with_max_drop {
        fields.insert("max_drop".to_string(), optional_number(result.max_drop));
    }

    match out_field {
        Some(name) => {
            data.insert(name.to_string(), Value::Object(fields));
        }
        None => data.extend(fields),
    }
}

fn optional_number(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map_or(Value::Null, Value::Number)
}
