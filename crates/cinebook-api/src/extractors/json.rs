//! JSON body extractor that runs `validator` rules.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use cinebook_core::error::AppError;

use crate::error::ApiError;

/// Deserialized and validated request body.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(rejection.body_text()))?;

        value.validate().map_err(validation_error)?;
        Ok(Self(value))
    }
}

/// Flatten field errors into one message plus per-field details.
fn validation_error(errors: ValidationErrors) -> AppError {
    let mut fields = serde_json::Map::new();
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        let reasons: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        messages.push(format!("{}: {}", field, reasons.join(", ")));
        fields.insert(field.to_string(), serde_json::json!(reasons));
    }
    messages.sort();

    AppError::validation(messages.join("; ")).with_details(serde_json::Value::Object(fields))
}

/// Parse an optional JSON body: an empty body yields `T::default()`.
pub fn parse_optional<T>(body: &[u8]) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    let value: T = serde_json::from_slice(body)
        .map_err(|e| AppError::validation(format!("Invalid JSON body: {e}")))?;
    value.validate().map_err(validation_error)?;
    Ok(value)
}
