use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::{self, Debug, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    StorageFailure,
    Unexpected,
    Timeout,
    NotificationFailure,
    InvalidRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    AlreadyResolved,
    Conflict,
    MethodNotAllowed,
}

impl ErrorKind {
    /// Codes below 100 are internal failures and are never described to the caller.
    pub fn code(&self) -> i32 {
        match self {
            Self::Configuration => 1,
            Self::StorageFailure => 2,
            Self::Unexpected => 5,
            Self::Timeout => 6,
            Self::NotificationFailure => 7,
            Self::InvalidRequest => 101,
            Self::Unauthorized => 102,
            Self::Forbidden => 103,
            Self::NotFound => 104,
            Self::AlreadyResolved => 105,
            Self::Conflict => 106,
            Self::MethodNotAllowed => 107,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyResolved | Self::Conflict => StatusCode::CONFLICT,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_internal(&self) -> bool {
        (1..=99).contains(&self.code())
    }
}

#[derive(Clone, Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code())
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        database_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        tracing::error!(error = %err, "authorization policy error");
        unexpected_error()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.kind.status();
        let error_message = match self.kind.is_internal() {
            true => "Internal Server Error",
            false => self.message.as_str(),
        };

        let body = Json(json!({
            "success": false,
            "code": self.code(),
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn invalid_request_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidRequest, message)
}

pub fn unauthorized_error() -> Error {
    Error::new(ErrorKind::Unauthorized, "unauthorized")
}

pub fn forbidden_error() -> Error {
    Error::new(ErrorKind::Forbidden, "caller does not own this ride")
}

pub fn not_found_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::NotFound, message)
}

pub fn already_resolved_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::AlreadyResolved, message)
}

pub fn conflict_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Conflict, message)
}

pub fn method_not_allowed_error() -> Error {
    Error::new(ErrorKind::MethodNotAllowed, "method not allowed")
}

pub fn timeout_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Timeout, message)
}

pub fn notification_failure_error<T: Display>(err: T) -> Error {
    Error::new(
        ErrorKind::NotificationFailure,
        format!("notification failed: {}", err),
    )
}

pub fn configuration_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Configuration, message)
}

pub fn env_var_error(err: env::VarError) -> Error {
    configuration_error(format!("environment variable error: {}", err))
}

pub fn database_error<T: Debug>(err: T) -> Error {
    tracing::error!(error = ?err, "database error");

    Error::new(ErrorKind::StorageFailure, "database error")
}

pub fn reqwest_error(err: reqwest::Error) -> Error {
    tracing::error!(error = %err, "reqwest error");

    Error::new(ErrorKind::Unexpected, "reqwest error")
}

pub fn upstream_error() -> Error {
    Error::new(ErrorKind::Unexpected, "upstream error")
}

pub fn unexpected_error() -> Error {
    Error::new(ErrorKind::Unexpected, "unexpected error")
}
