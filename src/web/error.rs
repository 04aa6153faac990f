//! HTTP response mapping for crate errors.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;

/// Error returned from handlers; renders as a JSON error body or a login redirect.
#[derive(Debug)]
pub struct WebError(pub Error);

impl From<Error> for WebError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            Error::Unauthenticated => return Redirect::to("/login").into_response(),
            Error::Validation { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": self.0.to_string(), "field": field, "message": message }),
            ),
            Error::NotFound { .. } => (StatusCode::NOT_FOUND, json!({ "error": self.0.to_string() })),
            Error::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, json!({ "error": self.0.to_string() }))
            }
            Error::Forbidden { .. } | Error::SelfModificationDenied { .. } => {
                (StatusCode::FORBIDDEN, json!({ "error": self.0.to_string() }))
            }
            err if err.is_business_rule() => {
                (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
            }
            err => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
