use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;
use serde_json::json;

#[derive(Copy, Clone, Serialize)]
#[repr(u16)]
pub enum ResponseCode {
    CodeOK = 0,
    ErrorCodeAuth = 1,
    ErrorCodeInput = 2,
    ErrorCodeServer = 3,
    ErrorCodeTimeout = 4,
    ErrorCodeDatabase = 5,
    ErrorCodeValidation = 6,
    ErrorCodeGeofence = 7,
}

impl ResponseCode {
    pub fn response_code(v: ResponseCode) -> u16 {
        v as u16
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Authenticate(#[from] AuthenticateError),

    #[error("{0}")]
    BadRequest(#[from] BadRequestError),

    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    #[error("{0}")]
    Server(#[from] ServerError),
}

impl Error {
    fn get_codes(&self) -> (StatusCode, u16) {
        match *self {
            // 4XX Errors
            Error::BadRequest(_) => (StatusCode::BAD_REQUEST, ResponseCode::response_code(ResponseCode::ErrorCodeInput)),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, ResponseCode::response_code(ResponseCode::ErrorCodeInput)),
            Error::Authenticate(AuthenticateError::MissingCredentials) => (StatusCode::UNAUTHORIZED, ResponseCode::response_code(ResponseCode::ErrorCodeAuth)),
            Error::Authenticate(AuthenticateError::WrongCredentials) => (StatusCode::FORBIDDEN, ResponseCode::response_code(ResponseCode::ErrorCodeAuth)),
            Error::Authenticate(AuthenticateError::InvalidToken) => (StatusCode::UNAUTHORIZED, ResponseCode::response_code(ResponseCode::ErrorCodeAuth)),

            // 5XX Errors
            Error::Server(_) => (StatusCode::INTERNAL_SERVER_ERROR, ResponseCode::response_code(ResponseCode::ErrorCodeServer)),
        }
    }

    pub fn bad_request() -> Self {
        Error::BadRequest(BadRequestError {})
    }

    pub fn not_found() -> Self {
        Error::NotFound(NotFoundError {})
    }

    pub fn server() -> Self {
        Error::Server(ServerError {})
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, code) = self.get_codes();
        let message = self.to_string();
        let body = Json(json!({ "code": code, "message": message }));

        (status_code, body).into_response()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AuthenticateError {
    #[error("Wrong authentication credentials")]
    WrongCredentials,
    #[error("Invalid authentication credentials")]
    InvalidToken,
    #[error("Missing authentication credentials")]
    MissingCredentials,
}

#[derive(thiserror::Error, Debug, Serialize)]
#[error("Bad Request")]
pub struct BadRequestError {}

#[derive(thiserror::Error, Debug, Serialize)]
#[error("Not found")]
pub struct NotFoundError {}

#[derive(thiserror::Error, Debug, Serialize)]
#[error("server error")]
pub struct ServerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let (status, code) = Error::not_found().get_codes();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, ResponseCode::response_code(ResponseCode::ErrorCodeInput));

        let (status, code) = Error::Authenticate(AuthenticateError::MissingCredentials).get_codes();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code, ResponseCode::response_code(ResponseCode::ErrorCodeAuth));
    }
}
