use axum::Router;
use axum::routing::get;
use crate::handler::report_handler::{attendance_report, attendance_report_download};
use crate::state::attendance_state::AttendanceState;

pub fn new_attendance_report_route() -> Router<AttendanceState> {
    Router::new()
        .route("/report", get(attendance_report))
        .route("/report/download", get(attendance_report_download))
}
