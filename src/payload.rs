//! Request extractors whose rejections use the API error envelope.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::bad_request("Request body is required"));
        }

        let deserializer = &mut serde_json::Deserializer::from_slice(&bytes);
        serde_path_to_error::deserialize(deserializer)
            .map(Payload)
            .map_err(|err| {
                let path = err.path().to_string();
                if path == "." {
                    AppError::bad_request(format!("Invalid request body: {}", err.inner()))
                } else {
                    AppError::bad_request(format!("Invalid value for `{path}`: {}", err.inner()))
                }
            })
    }
}

/// Query string filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filters<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Filters<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(Filters(value))
    }
}
