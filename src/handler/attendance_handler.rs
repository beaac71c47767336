use axum::debug_handler;
use axum::extract::{Multipart, State};
use bytes::Bytes;
use ecs_logger::extra_fields;
use http::{HeaderMap, StatusCode};
use log::{error, info};
use opentelemetry::global;
use opentelemetry::trace::{Span, TraceContextExt, Tracer};
use crate::config::settings::SETTINGS;
use crate::error::errors::ResponseCode;
use crate::logger::logger::LoggerExtraFields;
use crate::middleware::request_id_mw::request_id_from_headers;
use crate::models::attendance_model::{AttendanceCheckinInput, AttendanceCheckinResultOutput};
use crate::response::common_response::{BaseResponse, GeneralResponseBuilder, GeneralResponseResult};
use crate::state::attendance_state::AttendanceState;

fn checkin_error(request_id: &str, status_code: StatusCode, code: ResponseCode, message: &str) -> GeneralResponseResult<BaseResponse<AttendanceCheckinResultOutput>> {
    Ok(GeneralResponseBuilder::new()
        .status_code(status_code)
        .body(BaseResponse {
            data: None,
            response_message: message.to_string(),
            response_code: ResponseCode::response_code(code),
            is_success: false,
            request_id: request_id.to_string(),
        })
        .build())
}

#[debug_handler(state=AttendanceState)]
pub async fn attendance_checkin(headers: HeaderMap, State(state): State<AttendanceState>, mut payload: Multipart) -> GeneralResponseResult<BaseResponse<AttendanceCheckinResultOutput>> {
    let tracer = global::tracer(SETTINGS.app.name.clone());
    let parent_ctx = opentelemetry::Context::new();
    let span = tracer
        .span_builder("attendance-checkin")
        .start_with_context(&tracer, &parent_ctx);

    let request_id = request_id_from_headers(&headers);
    let mut im_bytes: Bytes = Bytes::new();
    let mut latitude: Option<f64> = None;
    let mut longitude: Option<f64> = None;
    let mut spoofing_check: Option<bool> = None;

    extra_fields::set_extra_fields(LoggerExtraFields {
        request_id: request_id.clone(),
    }).ok();

    let child_ctx = parent_ctx.with_span(span);
    let mut child = tracer.start_with_context("marshal-request", &child_ctx);
    info!("received attendance check-in request");
    loop {
        let field = match payload.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                error!("failed to read multipart field: {e}");
                return checkin_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeInput, "malformed multipart payload");
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                match field.bytes().await {
                    Ok(data) => {
                        if data.is_empty() {
                            return checkin_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeInput, "image is empty");
                        }
                        im_bytes = data;
                    }
                    Err(e) => {
                        error!("failed to retrieve image from request: {e}");
                        return checkin_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeInput, "failed to process image");
                    }
                };
            }
            "latitude" => {
                let value = field.text().await.unwrap_or_default();
                match value.parse::<f64>() {
                    Ok(val) => {
                        latitude = Some(val);
                    }
                    Err(e) => {
                        error!("failed to parse latitude value [{value}] from request: {e}");
                        return checkin_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeInput, "invalid latitude value");
                    }
                }
            }
            "longitude" => {
                let value = field.text().await.unwrap_or_default();
                match value.parse::<f64>() {
                    Ok(val) => {
                        longitude = Some(val);
                    }
                    Err(e) => {
                        error!("failed to parse longitude value [{value}] from request: {e}");
                        return checkin_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeInput, "invalid longitude value");
                    }
                }
            }
            "spoofing_check" => {
                let value = field.text().await.unwrap_or_default();
                match value.parse::<bool>() {
                    Ok(val) => {
                        spoofing_check = Some(val);
                    }
                    Err(e) => {
                        error!("failed to parse spoofing_check value [{value}] from request: {e}");
                        return checkin_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeInput, "invalid boolean value");
                    }
                }
            }
            _ => {}
        }
    }
    child.end();

    if im_bytes.is_empty() {
        return checkin_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeInput, "image is required");
    }
    let (latitude, longitude) = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => (latitude, longitude),
        _ => {
            return checkin_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeInput, "missing gps coordinates");
        }
    };

    let input = AttendanceCheckinInput {
        im_bytes,
        latitude,
        longitude,
        spoofing_check,
    };

    let mut child = tracer.start_with_context("check-in", &child_ctx);
    let result = match state.attendance_service.check_in(input).await {
        Ok(result) => {result}
        Err(e) => {
            error!("failed to process check-in: {e}");
            return checkin_error(&request_id, StatusCode::INTERNAL_SERVER_ERROR, ResponseCode::ErrorCodeServer, "internal server error");
        }
    };
    child.end();

    if !result.geofence_allowed {
        let message = format!(
            "you are {:.0}m away (max {:.0}m)",
            result.distance_m,
            state.attendance_service.allowed_radius_m(),
        );
        return checkin_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeGeofence, &message);
    }

    info!("completed attendance check-in");
    extra_fields::clear_extra_fields();

    return Ok(GeneralResponseBuilder::new()
        .status_code(StatusCode::OK)
        .body(BaseResponse {
            data: Some(result),
            response_message: "OK".to_string(),
            response_code: ResponseCode::response_code(ResponseCode::CodeOK),
            is_success: true,
            request_id: request_id.clone(),
        })
        .build()
    )
}
