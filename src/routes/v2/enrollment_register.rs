use axum::extract::DefaultBodyLimit;
use axum::Router;
use axum::routing::post;
use tower_http::limit::RequestBodyLimitLayer;
use crate::handler::enrollment_handler::enrollment_register;
use crate::state::enrollment_state::EnrollmentState;

pub fn new_enrollment_register_route() -> Router<EnrollmentState> {
    let router = Router::new()
        .route("/register", post(enrollment_register))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            25 * 1024 * 1024, /* 25mb */
        ));
    router
}
