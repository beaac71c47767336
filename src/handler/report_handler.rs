use axum::debug_handler;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use http::{header, HeaderMap, StatusCode};
use log::error;
use serde::Deserialize;
use crate::error::errors::{Error, ResponseCode};
use crate::middleware::request_id_mw::request_id_from_headers;
use crate::repository::attendance_repo::AttendanceRecord;
use crate::response::common_response::{BaseResponse, GeneralResponseBuilder, GeneralResponseResult, ResponsePagination};
use crate::state::attendance_state::AttendanceState;

const MAX_PAGE_LIMIT: u32 = 500;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub offset: Option<u64>,
    pub limit: Option<u32>,
}

#[debug_handler(state=AttendanceState)]
pub async fn attendance_report(headers: HeaderMap, State(state): State<AttendanceState>, Query(query): Query<ReportQuery>) -> GeneralResponseResult<BaseResponse<Vec<AttendanceRecord>>> {
    let request_id = request_id_from_headers(&headers);
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(50);

    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(Error::bad_request());
    }

    let (records, total) = match state.attendance_service.list_records(offset, limit) {
        Ok((records, total)) => {(records, total)}
        Err(e) => {
            error!("failed to read attendance ledger: {e}");
            return Err(Error::server());
        }
    };

    Ok(GeneralResponseBuilder::new()
        .status_code(StatusCode::OK)
        .body(BaseResponse {
            data: Some(records),
            response_message: "OK".to_string(),
            response_code: ResponseCode::response_code(ResponseCode::CodeOK),
            is_success: true,
            request_id,
        })
        .pagination(ResponsePagination {
            count: total,
            offset,
            limit,
        })
        .build())
}

#[debug_handler(state=AttendanceState)]
pub async fn attendance_report_download(State(state): State<AttendanceState>) -> Result<impl IntoResponse, Error> {
    let csv = match state.attendance_service.export_csv() {
        Ok(csv) => {csv}
        Err(e) => {
            error!("failed to export attendance ledger: {e}");
            return Err(Error::not_found());
        }
    };

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
        (header::CONTENT_DISPOSITION, "attachment; filename=\"attendance.csv\""),
    ];

    Ok((StatusCode::OK, headers, csv))
}
