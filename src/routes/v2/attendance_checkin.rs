use axum::extract::DefaultBodyLimit;
use axum::Router;
use axum::routing::post;
use tower_http::limit::RequestBodyLimitLayer;
use crate::handler::attendance_handler::attendance_checkin;
use crate::state::attendance_state::AttendanceState;

pub fn new_attendance_checkin_route() -> Router<AttendanceState> {
    let router = Router::new()
        .route("/check-in", post(attendance_checkin))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            25 * 1024 * 1024, /* 25mb */
        ));
    router
}
