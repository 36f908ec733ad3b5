use axum::{
    extract::{DefaultBodyLimit, FromRequestParts, Path},
    routing::get,
};
use http::{request::Parts, Method};

use crate::{error::ApiError, healthcheck::healthcheck, json::MAX_BODY_BYTES, state::AppState};

pub mod movie;
pub mod paging;

pub use paging::{Listing, MovieQuery};

/// Record id taken from the `{id}` path segment, anything but a positive integer is a 404.
#[derive(Debug, Clone, Copy)]
pub struct IdParam(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for IdParam {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::ResourceNotFound)?;
        match raw.parse::<i64>() {
            Ok(id) if id >= 1 => Ok(IdParam(id)),
            _ => Err(ApiError::ResourceNotFound),
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::ResourceNotFound
}

pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/v1/healthcheck", get(healthcheck))
        .merge(movie::router())
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
