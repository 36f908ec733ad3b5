use std::collections::BTreeMap;

use axum::{
    extract::rejection::QueryRejection,
    response::{IntoResponse, Response},
    Json,
};
use greenlight_types::ValidationError;
use http::{Method, StatusCode};
use serde_json::json;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("the requested resource could not be found")]
    ResourceNotFound,

    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("the {0} method is not supported for this resource")]
    MethodNotAllowed(Method),

    #[error("Database error: {0}")]
    DatabaseError(#[source] greenlight_dal::Error),
}

impl From<greenlight_dal::Error> for ApiError {
    fn from(error: greenlight_dal::Error) -> Self {
        use greenlight_dal::Error as E;
        match error {
            e if e.is_store_error() => ApiError::DatabaseError(e),
            E::RecordNotFound(_) => ApiError::ResourceNotFound,
            E::EditConflict { .. } => ApiError::EditConflict,
            E::Validation(e) => ApiError::Validation(e),
            E::InvalidOrderByField(_) => ApiError::Validation(ValidationError::from(
                BTreeMap::from([("sort".to_string(), "invalid sort value".to_string())]),
            )),
            other => ApiError::DatabaseError(other),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ResourceNotFound => StatusCode::NOT_FOUND,
            ApiError::EditConflict => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(errors) => json!({ "error": errors }),
            ApiError::DatabaseError(e) => {
                tracing::error!(error = %e, "Request failed");
                json!({ "error": SERVER_ERROR_MESSAGE })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
