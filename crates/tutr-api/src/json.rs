//! JSON request bodies whose rejections are reported as [`ApiError`].

use axum::{Json, extract::FromRequest};

use crate::error::ApiError;

/// Like [`axum::Json`], but a malformed body becomes a `400` with the same
/// `{"message": ...}` shape as every other error.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
