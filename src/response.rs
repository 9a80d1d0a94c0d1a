//! Uniform response envelope.
//!
//! Every response, success or failure, is shaped as
//! `{ success, data?, error?, message?, count? }` with absent fields omitted.

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            count: None,
        })
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(message.into()),
            count: None,
        })
    }

    pub fn created(data: T, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Self::ok_with_message(data, message))
    }

    pub fn failure(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: Some(message.into()),
            count: None,
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn list(items: Vec<T>) -> Json<Self> {
        let count = items.len();
        Json(Self {
            success: true,
            data: Some(items),
            error: None,
            message: None,
            count: Some(count),
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            error: None,
            message: Some(message.into()),
            count: None,
        })
    }
}
