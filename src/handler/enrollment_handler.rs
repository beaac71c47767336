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
use crate::models::enrollment_model::{EnrollmentRegisterInput, EnrollmentRegisterResultOutput};
use crate::response::common_response::{BaseResponse, GeneralResponseBuilder, GeneralResponseResult};
use crate::service::enrollment_service::RegisterOutcome;
use crate::state::enrollment_state::EnrollmentState;

fn register_error(request_id: &str, status_code: StatusCode, code: ResponseCode, message: &str) -> GeneralResponseResult<BaseResponse<EnrollmentRegisterResultOutput>> {
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

#[debug_handler(state=EnrollmentState)]
pub async fn enrollment_register(headers: HeaderMap, State(state): State<EnrollmentState>, mut payload: Multipart) -> GeneralResponseResult<BaseResponse<EnrollmentRegisterResultOutput>> {
    let tracer = global::tracer(SETTINGS.app.name.clone());
    let parent_ctx = opentelemetry::Context::new();
    let span = tracer
        .span_builder("enrollment-register")
        .start_with_context(&tracer, &parent_ctx);

    let request_id = request_id_from_headers(&headers);
    let mut im_bytes: Bytes = Bytes::new();
    let mut name = String::new();
    let mut usn = String::new();

    extra_fields::set_extra_fields(LoggerExtraFields {
        request_id: request_id.clone(),
    }).ok();

    let child_ctx = parent_ctx.with_span(span);
    let mut child = tracer.start_with_context("marshal-request", &child_ctx);
    info!("received enrollment request");
    loop {
        let field = match payload.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                error!("failed to read multipart field: {e}");
                return register_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeInput, "malformed multipart payload");
            }
        };

        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "image" => {
                match field.bytes().await {
                    Ok(data) => {
                        if data.is_empty() {
                            return register_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeInput, "image is empty");
                        }
                        im_bytes = data;
                    }
                    Err(e) => {
                        error!("failed to retrieve image from request: {e}");
                        return register_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeInput, "failed to process image");
                    }
                };
            }
            "name" => {
                name = field.text().await.unwrap_or_default();
            }
            "usn" => {
                usn = field.text().await.unwrap_or_default();
            }
            _ => {}
        }
    }
    child.end();

    if im_bytes.is_empty() {
        return register_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeInput, "image is required");
    }
    if name.trim().is_empty() || usn.trim().is_empty() {
        return register_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeValidation, "name and usn are required");
    }

    let input = EnrollmentRegisterInput {
        im_bytes,
        name,
        usn,
    };

    let mut child = tracer.start_with_context("register", &child_ctx);
    let outcome = match state.enrollment_service.register(input).await {
        Ok(outcome) => {outcome}
        Err(e) => {
            error!("failed to register student: {e}");
            return register_error(&request_id, StatusCode::INTERNAL_SERVER_ERROR, ResponseCode::ErrorCodeServer, "internal server error");
        }
    };
    child.end();

    let registered = match outcome {
        RegisterOutcome::Registered(registered) => registered,
        RegisterOutcome::Rejected(rejection) => {
            return register_error(&request_id, StatusCode::BAD_REQUEST, ResponseCode::ErrorCodeValidation, &rejection.reason);
        }
    };

    info!("completed enrollment");
    extra_fields::clear_extra_fields();

    return Ok(GeneralResponseBuilder::new()
        .status_code(StatusCode::OK)
        .body(BaseResponse {
            data: Some(registered),
            response_message: "OK".to_string(),
            response_code: ResponseCode::response_code(ResponseCode::CodeOK),
            is_success: true,
            request_id: request_id.clone(),
        })
        .build()
    )
}
