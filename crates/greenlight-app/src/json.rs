use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::ApiError;

pub const MAX_BODY_BYTES: usize = 1_048_576;

/// JSON request body, decoded strictly: a single value, at most [`MAX_BODY_BYTES`],
/// with failures reported as client friendly `400` messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadJson<T>(pub T);

impl<T, S> FromRequest<S> for ReadJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| {
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    ApiError::BadRequest(format!(
                        "body must not be larger than {MAX_BODY_BYTES} bytes"
                    ))
                } else {
                    ApiError::BadRequest(rejection.body_text())
                }
            })?;
        decode(&body).map(ReadJson)
    }
}

pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("body must not be empty".to_string()));
    }

    let mut de = serde_json::Deserializer::from_slice(body);
    let value = T::deserialize(&mut de).map_err(classify)?;
    de.end().map_err(|_| {
        ApiError::BadRequest("body must only contain a single JSON value".to_string())
    })?;
    Ok(value)
}

fn classify(e: serde_json::Error) -> ApiError {
    let message = match e.classify() {
        Category::Syntax => format!(
            "body contains badly-formed JSON (at line {} column {})",
            e.line(),
            e.column()
        ),
        Category::Eof => "body contains badly-formed JSON".to_string(),
        Category::Data => format!("body contains invalid JSON value: {e}"),
        Category::Io => "body could not be read".to_string(),
    };
    ApiError::BadRequest(message)
}
