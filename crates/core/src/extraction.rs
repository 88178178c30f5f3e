//! Recovery of a [`Quote`] from best-effort model output.
//!
//! The completion service is asked for strict JSON but routinely wraps it in
//! prose or markdown fences. [`extract_quote`] tolerates that noise and
//! rejects anything that is not structurally a quote. It never panics.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::quote::Quote;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no JSON object found in model output")]
    MissingObject,
    #[error("model output is not a valid JSON object: {0}")]
    MalformedJson(String),
    #[error("field `{field}` is missing or not a string")]
    MissingField { field: &'static str },
    #[error("price is missing or not a finite number")]
    InvalidPrice,
}

pub fn extract_quote(raw: &str) -> Result<Quote, ExtractionError> {
    let candidate = object_span(raw).ok_or(ExtractionError::MissingObject)?;
    let parsed: Value = serde_json::from_str(candidate)
        .map_err(|error| ExtractionError::MalformedJson(error.to_string()))?;
    let Value::Object(object) = parsed else {
        return Err(ExtractionError::MalformedJson("top-level value is not an object".to_owned()));
    };

    Ok(Quote {
        task: string_field(&object, "task")?,
        price: coerce_price(object.get("price"))?,
        eta: string_field(&object, "eta")?,
        category: string_field(&object, "category")?,
        justification: string_field(&object, "justification")?,
    })
}

/// Slice from the first `{` to the last `}`, inclusive.
///
/// Fence markers and their language tags never contain braces, so prose and
/// fences around the object fall outside the span without being rewritten.
/// Text inside the object, string values included, is passed through as is.
fn object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn string_field(object: &Map<String, Value>, field: &'static str) -> Result<String, ExtractionError> {
    match object.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        _ => Err(ExtractionError::MissingField { field }),
    }
}

fn coerce_price(value: Option<&Value>) -> Result<f64, ExtractionError> {
    let price = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    match price {
        Some(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(ExtractionError::InvalidPrice),
    }
}
