use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use tabula_core::AppError;

async fn error_parts(err: AppError) -> (StatusCode, serde_json::Value) {
    let resp = err.into_response();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_renders_404_with_message() {
    let (status, body) = error_parts(AppError::NotFound("User with ID 9 not found.".into())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User with ID 9 not found.");
}

#[tokio::test]
async fn bad_request_renders_400_with_message() {
    let (status, body) = error_parts(AppError::BadRequest("Invalid relations: nope".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid relations: nope");
}

#[tokio::test]
async fn internal_renders_500() {
    let (status, body) = error_parts(AppError::Internal("pool timed out".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "pool timed out");
}

#[tokio::test]
async fn custom_status_and_body_pass_through() {
    let custom_body = serde_json::json!({"detail": "teapot"});
    let (status, body) = error_parts(AppError::Custom {
        status: StatusCode::IM_A_TEAPOT,
        body: custom_body.clone(),
    })
    .await;
    assert_eq!(status, StatusCode::IM_A_TEAPOT);
    assert_eq!(body, custom_body);
}

#[test]
fn display_formatting() {
    assert_eq!(AppError::NotFound("x".into()).to_string(), "Not Found: x");
    assert_eq!(AppError::BadRequest("w".into()).to_string(), "Bad Request: w");
    assert_eq!(AppError::Internal("v".into()).to_string(), "Internal Error: v");
}

#[test]
fn io_error_maps_to_internal() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let app_err: AppError = io_err.into();
    match app_err {
        AppError::Internal(msg) => assert!(msg.contains("file missing")),
        other => panic!("expected Internal, got {other}"),
    }
}

#[derive(Debug)]
struct ParseFailure;

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not parse")
    }
}

tabula_core::map_error! {
    ParseFailure => BadRequest,
}

#[test]
fn map_error_macro_generates_from_impl() {
    let err: AppError = ParseFailure.into();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "Bad Request: could not parse");
}
