// 🚨 HTTP errors - what a failed request turns into

use crate::error::DbError;
use crate::web::html;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rendered as a 500 page; only the generic message reaches the browser
    #[error(transparent)]
    Database(#[from] DbError),

    /// 404 page with a message and a link back to `back`
    #[error("{message}")]
    NotFound { message: String, back: String },

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    /// JSON 500 for the maintenance endpoints
    #[error("{0}")]
    Failed(&'static str),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>, back: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
            back: back.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Database(_) | ApiError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Database(err) => (status, Html(html::error_page(&err.to_string()))).into_response(),
            ApiError::NotFound { message, back } => {
                (status, Html(html::not_found(&message, &back))).into_response()
            }
            ApiError::Unauthorized(message) | ApiError::Forbidden(message) | ApiError::Failed(message) => {
                (status, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}
