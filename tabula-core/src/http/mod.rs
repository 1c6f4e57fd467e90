//! HTTP types re-exported from axum so downstream crates share one version.

pub use axum::body::Body;
pub use axum::extract::{FromRequestParts, Path, Query, State};
pub use axum::http::request::Parts;
pub use axum::http::{Method, Request, StatusCode, Uri};
pub use axum::response::{IntoResponse, Response};
pub use axum::routing;
pub use axum::{serve, Json, Router};
