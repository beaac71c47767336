use std::sync::Arc;
use std::time::Duration;

use axum::{Json, middleware, Router};
use axum::http::header;
use axum::response::Html;
use axum::routing::{get, IntoMakeService};
use http::{HeaderMap, Method, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::propagate_header::PropagateHeaderLayer;
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_request_id::RequestIdLayer;
use crate::config::settings::SETTINGS;
use crate::error::errors::ResponseCode;
use crate::geofence::geofence::Geofence;
use crate::middleware::api_key_mw::validate_api_key_mw;
use crate::middleware::request_id_mw::{generate_request_id_mw, request_id_from_headers};
use crate::models::attendance_model::AttendanceCheckinResultOutput;
use crate::pipeline::recognition_pipeline::recognition_pipeline::RecognitionPipeline;
use crate::repository::attendance_repo::AttendanceRepository;
use crate::repository::enrollment_repo::EnrollmentRepository;
use crate::repository::face_gallery::FaceGallery;
use crate::response::common_response::{BaseResponse, GeneralResponseBuilder, GeneralResponseResult};
use crate::routes::v2::attendance_checkin::new_attendance_checkin_route;
use crate::routes::v2::attendance_report::new_attendance_report_route;
use crate::routes::v2::enrollment_register::new_enrollment_register_route;
use crate::state::attendance_state::AttendanceState;
use crate::state::enrollment_state::EnrollmentState;

#[derive(Clone, Serialize, Deserialize)]
struct FallbackResponse {
    message: String,
}

#[derive(Clone)]
pub struct RouterState {
    recognition_pipeline: Arc<RecognitionPipeline>,
    face_gallery: Arc<FaceGallery>,
    attendance_repository: Arc<AttendanceRepository>,
    enrollment_repository: Arc<EnrollmentRepository>,
}

impl RouterState {
    pub fn new(
        recognition_pipeline: Arc<RecognitionPipeline>,
        face_gallery: Arc<FaceGallery>,
        attendance_repository: Arc<AttendanceRepository>,
        enrollment_repository: Arc<EnrollmentRepository>,
    ) -> Self {
        RouterState {
            recognition_pipeline,
            face_gallery,
            attendance_repository,
            enrollment_repository,
        }
    }
}

pub fn root_routes(router_state: RouterState) -> IntoMakeService<Router> {
    let v2_router = {
        let attendance_state = AttendanceState::new(
            &router_state.recognition_pipeline,
            &router_state.face_gallery,
            &router_state.attendance_repository,
            Geofence::from_settings(),
        );
        let attendance_route = new_attendance_checkin_route()
            .merge(new_attendance_report_route())
            .with_state(attendance_state);

        let enrollment_state = EnrollmentState::new(
            &router_state.recognition_pipeline,
            &router_state.enrollment_repository,
            &router_state.face_gallery,
        );
        let enrollment_route = new_enrollment_register_route()
            .with_state(enrollment_state);

        Router::new()
            .nest(
                "/v2",
                Router::new()
                    .nest("/attendance", attendance_route)
                    .nest("/enrollment", enrollment_route),
            )
    };

    let mut request_timeout_duration: u64 = 20;
    if let Some(_request_timeout) = SETTINGS.server.request_timeout {
        request_timeout_duration = _request_timeout;
    }

    let page_router = Router::new()
        .route("/", get(index_page))
        .route("/register", get(register_page));

    let app_router = Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(Router::new().route("/health", get(healthcheck)))
                .merge(v2_router)
                .layer(CompressionLayer::new())
                .layer(middleware::from_fn(validate_api_key_mw)),
        )
        .merge(page_router)
        .layer(PropagateHeaderLayer::new(header::HeaderName::from_static("x-request-id")))
        .layer(CorsLayer::permissive().allow_methods([Method::GET, Method::POST, Method::HEAD, Method::OPTIONS]))
        .layer(RequestIdLayer)
        .layer(middleware::from_fn(generate_request_id_mw))
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout_duration)))
        .layer(SetSensitiveHeadersLayer::new(std::iter::once(header::AUTHORIZATION)))
        .fallback(fallback)
        .into_make_service();
    app_router
}

async fn fallback(uri: Uri) -> (StatusCode, Json<FallbackResponse>) {
    (StatusCode::NOT_FOUND, Json(FallbackResponse {
        message: format!("No route for {uri}"),
    }))
}

async fn index_page() -> Html<&'static str> {
    Html(include_str!("../../assets/index.html"))
}

async fn register_page() -> Html<&'static str> {
    Html(include_str!("../../assets/register.html"))
}

async fn healthcheck(headers: HeaderMap) -> GeneralResponseResult<BaseResponse<AttendanceCheckinResultOutput>> {
    let request_id = request_id_from_headers(&headers);

    Ok(GeneralResponseBuilder::new()
        .status_code(StatusCode::OK)
        .body(BaseResponse {
            data: None,
            response_message: "OK".to_string(),
            response_code: ResponseCode::response_code(ResponseCode::CodeOK),
            is_success: true,
            request_id,
        })
        .build())
}
