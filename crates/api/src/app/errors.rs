use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use eduhub_core::{DomainError, ErrorClass};

/// Handler error: a domain failure rendered as a JSON error body.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        domain_error_to_response(self.0)
    }
}

/// Unwrap a JSON body, reporting a malformed one as a validation failure.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| DomainError::validation("body", rejection.body_text()).into())
}

pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| DomainError::validation("query", rejection.body_text()).into())
}

pub fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Forbidden => StatusCode::FORBIDDEN,
        ErrorClass::Conflict => StatusCode::CONFLICT,
        ErrorClass::BadRequest => StatusCode::BAD_REQUEST,
        ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    let status = status_for(err.class());
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "request failed");
        return json_error(status, err.code(), "Server error");
    }

    if let DomainError::Validation(fields) = &err {
        return (
            status,
            axum::Json(json!({
                "error": err.code(),
                "message": err.to_string(),
                "errors": fields,
            })),
        )
            .into_response();
    }

    json_error(status, err.code(), err.to_string())
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
