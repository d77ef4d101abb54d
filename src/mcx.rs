//! Flattening of a Directory Services `MCXSettings` attribute.
//!
//! The attribute value is an array whose items are themselves property lists,
//! encoded once more inside the outer document. Each decoded item carries one
//! ready-made payload body under `mcx_application_data`.

use std::io::Cursor;

use plist::Value;

use crate::error::AppError;
use crate::profile::PayloadContentBody;

/// Key of the payload body inside each decoded MCX item.
pub const APPLICATION_DATA_KEY: &str = "mcx_application_data";

/// Decode every item of an `MCXSettings` attribute and extract its payload
/// body, preserving item order.
///
/// A single malformed item fails the whole attribute.
pub fn flatten_mcx_settings(attribute: &Value) -> Result<Vec<PayloadContentBody>, AppError> {
    let items = match attribute {
        Value::Array(items) => items.as_slice(),
        // A single-valued attribute may come back unwrapped.
        Value::String(_) | Value::Data(_) => std::slice::from_ref(attribute),
        other => {
            return Err(AppError::Decode(format!(
                "unexpected MCXSettings attribute value: {other:?}"
            )))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| application_data(index, item))
        .collect()
}

fn application_data(index: usize, item: &Value) -> Result<PayloadContentBody, AppError> {
    let bytes = match item {
        Value::String(text) => text.as_bytes(),
        Value::Data(data) => data.as_slice(),
        other => {
            return Err(AppError::Decode(format!(
                "unexpected mcx_settings format in MCXSettings array item {index}: {other:?}"
            )))
        }
    };

    let decoded = Value::from_reader(Cursor::new(bytes)).map_err(|e| {
        AppError::Decode(format!(
            "cannot decode MCXSettings array item {index}: {e}"
        ))
    })?;

    match decoded {
        Value::Dictionary(mut dict) => match dict.remove(APPLICATION_DATA_KEY) {
            Some(Value::Dictionary(body)) => {
                tracing::debug!(index, domains = body.len(), "flattened MCX item");
                Ok(body)
            }
            Some(_) => Err(AppError::Decode(format!(
                "{APPLICATION_DATA_KEY} in MCXSettings array item {index} is not a dictionary"
            ))),
            None => Err(AppError::Decode(format!(
                "unexpected mcx_settings format in MCXSettings array item {index}: \
                 no {APPLICATION_DATA_KEY}"
            ))),
        },
        _ => Err(AppError::Decode(format!(
            "MCXSettings array item {index} is not a dictionary"
        ))),
    }
}
