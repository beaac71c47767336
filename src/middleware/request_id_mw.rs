use axum::extract::Request;
use axum::middleware::Next;
use axum::response::IntoResponse;
use http::{header, HeaderMap};
use uuid::Uuid;
use crate::error::errors::Error;

/// The generating middleware runs before every handler, so the header is
/// normally present; an empty id only shows up in direct handler tests.
pub fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn generate_request_id_mw(mut req: Request, next: Next) -> Result<impl IntoResponse, Error> {
    let request_id = Uuid::new_v4().to_string();

    req.headers_mut().insert(
        header::HeaderName::from_static("x-request-id"),
        header::HeaderValue::from_str(&request_id).unwrap(),
    );

    return Ok(next.run(req).await)
}
