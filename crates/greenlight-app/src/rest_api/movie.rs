use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use greenlight_dal::{
    movie::{CreateMovie, MovieRepository, UpdateMovie},
    Metadata,
};
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    json::ReadJson,
    rest_api::{IdParam, MovieQuery},
    state::AppState,
    validate::Garde,
};

crate::repository_from_request!(MovieRepository);

pub const EXPECTED_VERSION_HEADER: &str = "X-Expected-Version";

pub async fn list(
    repository: MovieRepository,
    State(state): State<AppState>,
    Garde(Query(query)): Garde<Query<MovieQuery>>,
) -> ApiResult<impl IntoResponse> {
    let listing = query.into_listing(state.config().default_page_size)?;
    let batch = repository
        .list(&listing.title, &listing.genres, &listing.filters)
        .await?;
    let metadata = Metadata::calculate(
        batch.total,
        listing.filters.page,
        listing.filters.page_size,
    );
    Ok((
        StatusCode::OK,
        Json(json!({ "metadata": metadata, "movies": batch.rows })),
    ))
}

pub async fn create(
    repository: MovieRepository,
    ReadJson(payload): ReadJson<CreateMovie>,
) -> ApiResult<impl IntoResponse> {
    let movie = repository.create(payload).await?;
    debug!(id = movie.id, "Created movie");
    let location = HeaderValue::from_str(&format!("/v1/movies/{}", movie.id))
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(json!({ "movie": movie })),
    ))
}

pub async fn show(
    IdParam(id): IdParam,
    repository: MovieRepository,
) -> ApiResult<impl IntoResponse> {
    let movie = repository.get(id).await?;
    Ok((StatusCode::OK, Json(json!({ "movie": movie }))))
}

fn expected_version(headers: &HeaderMap) -> ApiResult<Option<i32>> {
    headers
        .get(EXPECTED_VERSION_HEADER)
        .map(|value| {
            value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<i32>().ok())
                .ok_or_else(|| {
                    ApiError::BadRequest(format!("invalid {EXPECTED_VERSION_HEADER} header"))
                })
        })
        .transpose()
}

pub async fn update(
    IdParam(id): IdParam,
    repository: MovieRepository,
    headers: HeaderMap,
    ReadJson(payload): ReadJson<UpdateMovie>,
) -> ApiResult<impl IntoResponse> {
    let mut movie = repository.get(id).await?;
    if let Some(expected) = expected_version(&headers)? {
        if expected != movie.version {
            return Err(ApiError::EditConflict);
        }
    }
    payload.apply(&mut movie);
    repository.update(&mut movie).await?;
    debug!(id, version = movie.version, "Updated movie");
    Ok((StatusCode::OK, Json(json!({ "movie": movie }))))
}

pub async fn delete(
    IdParam(id): IdParam,
    repository: MovieRepository,
) -> ApiResult<impl IntoResponse> {
    repository.delete(id).await?;
    debug!(id, "Deleted movie");
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "movie successfully deleted" })),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/movies", get(list).post(create))
        .route("/v1/movies/{id}", get(show).patch(update).delete(delete))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_version() {
        let mut headers = HeaderMap::new();
        assert_eq!(None, expected_version(&headers).unwrap());

        headers.insert(EXPECTED_VERSION_HEADER, HeaderValue::from_static("3"));
        assert_eq!(Some(3), expected_version(&headers).unwrap());

        headers.insert(EXPECTED_VERSION_HEADER, HeaderValue::from_static("three"));
        assert!(matches!(
            expected_version(&headers),
            Err(ApiError::BadRequest(_))
        ));
    }
}
