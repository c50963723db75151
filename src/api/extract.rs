//! Request extractors that reject with the API's `{error}` JSON body.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::error::ApiError;

/// Like `Json<T>`, but runs `validator` rules and reports failures as 400 `{error}`.
/// Rejection messages never echo the submitted values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_error)?;
        value.validate().map_err(validation_error)?;
        Ok(ValidJson(value))
    }
}

/// Like `Path<T>`, but a parameter that fails to parse is a 400 `{error}`.
#[derive(Debug, Clone, Copy)]
pub struct ValidPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::bad_request("Invalid path parameter"))?;
        Ok(ValidPath(value))
    }
}

/// Like `Query<T>`, but a malformed query string is a 400 `{error}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::bad_request("Invalid query parameter"))?;
        Ok(ValidQuery(value))
    }
}

fn rejection_error(rejection: JsonRejection) -> ApiError {
    let message = match rejection {
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
        JsonRejection::JsonSyntaxError(_) => "Malformed JSON body",
        JsonRejection::JsonDataError(_) => "Missing or invalid fields in request body",
        _ => "Invalid request body",
    };
    ApiError::bad_request(message)
}

/// First failing field, as `field: message`.
fn validation_error(errors: ValidationErrors) -> ApiError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let message = fields
        .into_iter()
        .find_map(|(field, errors)| {
            errors.first().map(|e| {
                let text = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{}: {}", field, text)
            })
        })
        .unwrap_or_else(|| "Validation failed".to_string());

    ApiError::bad_request(message)
}
