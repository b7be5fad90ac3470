// Presence checks for incoming JSON bodies. Only presence is enforced here;
// type mismatches surface later when the body is deserialized.

use rocket::serde::json::{self, Json};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

pub const PRODUCT_REQUIRED: [&str; 8] = [
    "index",
    "description",
    "imageUrl",
    "inStock",
    "category",
    "product_name",
    "price",
    "rating",
];

pub const REVIEW_REQUIRED: [&str; 5] = ["id", "username", "text", "rating", "date"];

/// A key counts as present when it exists and is not `null`.
pub fn is_present(body: &Map<String, Value>, key: &str) -> bool {
    body.get(key).map_or(false, |v| !v.is_null())
}

/// Fails with the first missing field, in the order given.
pub fn require_fields(body: &Map<String, Value>, fields: &[&str]) -> ApiResult<()> {
    match fields.iter().find(|f| !is_present(body, f)) {
        Some(missing) => Err(ApiError::Validation(format!("{missing} is required"))),
        None => Ok(()),
    }
}

/// Unwraps a JSON data guard result into an object. Unparseable bodies and
/// non-object payloads are internal failures.
pub fn object_body(body: Result<Json<Value>, json::Error<'_>>) -> ApiResult<Map<String, Value>> {
    match body.map_err(|e| ApiError::Internal(e.to_string()))?.into_inner() {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::Internal(format!("expected a JSON object, got {other}"))),
    }
}

pub fn parse<T: DeserializeOwned>(body: Map<String, Value>) -> ApiResult<T> {
    serde_json::from_value(Value::Object(body)).map_err(|e| ApiError::Internal(e.to_string()))
}
