use axum::{body::Body, Router};
use greenlight_app::{
    rest_api,
    state::{AppConfig, AppState},
};
use greenlight_dal::PoolSettings;
use http::{header, Request, StatusCode};
use http_body_util::BodyExt as _;
use serde_json::{json, Value};
use tower::ServiceExt as _;
use tracing_test::traced_test;

async fn app() -> Router {
    let settings = PoolSettings {
        max_connections: 1,
        idle_timeout: None,
        ..Default::default()
    };
    let pool = greenlight_dal::new_pool_with("sqlite::memory:", &settings)
        .await
        .unwrap();
    rest_api::router().with_state(AppState::new(AppConfig::default(), pool))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn moana() -> Value {
    json!({"title": "Moana", "year": 2016, "runtime": "107 mins", "genres": ["animation", "adventure"]})
}

#[tokio::test]
#[traced_test]
async fn test_healthcheck() {
    let app = app().await;
    let (status, body) = call(&app, "GET", "/v1/healthcheck", None).await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!("available", body["status"]);
    assert_eq!("development", body["system_info"]["environment"]);
}

#[tokio::test]
#[traced_test]
async fn test_movie_lifecycle() {
    let app = app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/movies")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(moana().to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(StatusCode::CREATED, response.status());
    assert_eq!("/v1/movies/1", response.headers()[header::LOCATION]);

    let (status, body) = call(&app, "GET", "/v1/movies/1", None).await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!("107 mins", body["movie"]["runtime"]);
    assert_eq!(1, body["movie"]["version"]);
    assert!(body["movie"].get("created_at").is_none());

    let (status, body) = call(&app, "PATCH", "/v1/movies/1", Some(json!({"year": 2017}))).await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!(2017, body["movie"]["year"]);
    assert_eq!("Moana", body["movie"]["title"]);
    assert_eq!(2, body["movie"]["version"]);

    let (status, body) = call(&app, "DELETE", "/v1/movies/1", None).await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!("movie successfully deleted", body["message"]);

    let (status, body) = call(&app, "GET", "/v1/movies/1", None).await;
    assert_eq!(StatusCode::NOT_FOUND, status);
    assert_eq!("the requested resource could not be found", body["error"]);
}

#[tokio::test]
#[traced_test]
async fn test_expected_version_conflict() {
    let app = app().await;
    let (status, _) = call(&app, "POST", "/v1/movies", Some(moana())).await;
    assert_eq!(StatusCode::CREATED, status);

    let request = Request::builder()
        .method("PATCH")
        .uri("/v1/movies/1")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Expected-Version", "7")
        .body(Body::from(json!({"title": "Moana 2"}).to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(StatusCode::CONFLICT, status);
    assert_eq!(
        "unable to update the record due to an edit conflict, please try again",
        body["error"]
    );

    let (_, body) = call(&app, "GET", "/v1/movies/1", None).await;
    assert_eq!("Moana", body["movie"]["title"]);
    assert_eq!(1, body["movie"]["version"]);
}

#[tokio::test]
#[traced_test]
async fn test_client_errors() {
    let app = app().await;

    let (status, body) = call(
        &app,
        "POST",
        "/v1/movies",
        Some(json!({"title": "", "year": 1500, "runtime": "90 mins", "genres": []})),
    )
    .await;
    assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, status);
    assert_eq!("must be provided", body["error"]["title"]);
    assert_eq!("must be greater than 1888", body["error"]["year"]);
    assert_eq!("must contain at least 1 genre", body["error"]["genres"]);

    let (status, body) = call(&app, "POST", "/v1/movies", Some(json!({"rating": 5}))).await;
    assert_eq!(StatusCode::BAD_REQUEST, status);
    assert!(body["error"].as_str().unwrap().contains("unknown field"));

    let (status, body) = call(&app, "POST", "/v1/movies", None).await;
    assert_eq!(StatusCode::BAD_REQUEST, status);
    assert_eq!("body must not be empty", body["error"]);

    let too_big = format!(r#"{{"title": "{}"}}"#, "x".repeat(1_048_577));
    let request = Request::builder()
        .method("POST")
        .uri("/v1/movies")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(too_big))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(StatusCode::BAD_REQUEST, status);
    assert_eq!("body must not be larger than 1048576 bytes", body["error"]);

    for uri in ["/v1/movies/abc", "/v1/movies/0", "/v1/movies/-3", "/v1/nothing"] {
        let (status, _) = call(&app, "GET", uri, None).await;
        assert_eq!(StatusCode::NOT_FOUND, status, "{uri}");
    }

    let (status, body) = call(&app, "PUT", "/v1/movies/1", Some(moana())).await;
    assert_eq!(StatusCode::METHOD_NOT_ALLOWED, status);
    assert_eq!(
        "the PUT method is not supported for this resource",
        body["error"]
    );

    let (status, body) = call(&app, "GET", "/v1/movies?page=abc&sort=bogus", None).await;
    assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, status);
    assert_eq!("must be an integer value", body["error"]["page"]);
    assert_eq!("invalid sort value", body["error"]["sort"]);

    let (status, body) = call(&app, "GET", "/v1/movies?page=1&page=2", None).await;
    assert_eq!(StatusCode::BAD_REQUEST, status);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to deserialize query string"));
}

#[tokio::test]
#[traced_test]
async fn test_list_movies() {
    let app = app().await;
    for (title, year, genres) in [
        ("Moana", 2016, json!(["animation", "adventure"])),
        ("Black Panther", 2018, json!(["action", "adventure"])),
        ("Apocalypse Now", 1979, json!(["drama", "war"])),
    ] {
        let movie = json!({"title": title, "year": year, "runtime": "100 mins", "genres": genres});
        let (status, _) = call(&app, "POST", "/v1/movies", Some(movie)).await;
        assert_eq!(StatusCode::CREATED, status);
    }

    let (status, body) = call(&app, "GET", "/v1/movies", None).await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!(3, body["movies"].as_array().unwrap().len());
    assert_eq!(
        json!({"current_page": 1, "page_size": 20, "first_page": 1, "last_page": 1, "total_records": 3}),
        body["metadata"]
    );

    let (_, body) = call(&app, "GET", "/v1/movies?genres=adventure&sort=-year", None).await;
    let titles: Vec<_> = body["movies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(vec!["Black Panther", "Moana"], titles);

    let (_, body) = call(&app, "GET", "/v1/movies?page=2&page_size=2", None).await;
    assert_eq!(1, body["movies"].as_array().unwrap().len());
    assert_eq!(2, body["metadata"]["last_page"]);

    let (_, body) = call(&app, "GET", "/v1/movies?title=nothing", None).await;
    assert!(body["movies"].as_array().unwrap().is_empty());
    assert_eq!(json!({}), body["metadata"]);
}
