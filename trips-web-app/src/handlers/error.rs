use crate::services::ServiceError;
use askama::Template;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Template)]
#[template(path = "session_expired.html")]
pub struct SessionExpiredTemplate {}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub message: String,
}

/// Failure of an HTML view.
#[derive(Debug)]
pub enum ViewError {
    SessionExpired,
    Failed { status: StatusCode, message: String },
}

impl ViewError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ViewError::Failed {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ViewError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthenticated(_) => ViewError::SessionExpired,
            ServiceError::Validation(message) => ViewError::bad_request(message),
            ServiceError::NotFound(message) => ViewError::Failed {
                status: StatusCode::NOT_FOUND,
                message,
            },
            other => {
                tracing::error!(error = %other, "View failed on upstream call");
                ViewError::Failed {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Failed to load data, please try again later".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        match self {
            ViewError::SessionExpired => {
                (StatusCode::UNAUTHORIZED, SessionExpiredTemplate {}).into_response()
            }
            ViewError::Failed { status, message } => (
                status,
                ErrorTemplate {
                    status: status.as_u16(),
                    message,
                },
            )
                .into_response(),
        }
    }
}
