//! Attribute marshalling.
//!
//! Pure conversions between serde-serializable values and DynamoDB
//! attribute maps, testable without touching DynamoDB.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, StoreError};

/// Serialize `value` into a DynamoDB item map.
///
/// The value must serialize to a JSON object; each entry becomes one
/// attribute.
pub fn to_item<T: Serialize>(value: &T) -> Result<HashMap<String, AttributeValue>> {
    let json = serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))?;

    match json {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| Ok((key, value_to_attr(value)?)))
            .collect(),
        other => Err(StoreError::Serialization(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Rebuild a typed value from a DynamoDB item map.
pub fn from_item<T: DeserializeOwned>(item: &HashMap<String, AttributeValue>) -> Result<T> {
    let mut map = serde_json::Map::with_capacity(item.len());
    for (key, attr) in item {
        map.insert(key.clone(), attr_to_value(attr)?);
    }

    serde_json::from_value(Value::Object(map)).map_err(|e| StoreError::Deserialization(e.to_string()))
}

fn value_to_attr(value: Value) -> Result<AttributeValue> {
    match value {
        Value::String(s) => Ok(AttributeValue::S(s)),
        Value::Number(n) => Ok(AttributeValue::N(n.to_string())),
        Value::Bool(b) => Ok(AttributeValue::Bool(b)),
        Value::Null => Ok(AttributeValue::Null(true)),
        Value::Array(values) => values
            .into_iter()
            .map(value_to_attr)
            .collect::<Result<Vec<_>>>()
            .map(AttributeValue::L),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| Ok((key, value_to_attr(value)?)))
            .collect::<Result<HashMap<_, _>>>()
            .map(AttributeValue::M),
    }
}

fn attr_to_value(attr: &AttributeValue) -> Result<Value> {
    match attr {
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        AttributeValue::N(n) => n
            .parse::<serde_json::Number>()
            .map(Value::Number)
            .map_err(|_| StoreError::Deserialization(format!("bad number attribute: {n}"))),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::L(values) => values
            .iter()
            .map(attr_to_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        AttributeValue::M(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, attr) in map {
                out.insert(key.clone(), attr_to_value(attr)?);
            }
            Ok(Value::Object(out))
        }
        other => Err(StoreError::Deserialization(format!(
            "unsupported attribute type: {other:?}"
        ))),
    }
}
