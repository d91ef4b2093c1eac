use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("{service} request failed: {message}")]
    Upstream {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("Challenge rejected with status {status}")]
    ChallengeRejected { status: u16 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Upstream {
            service,
            status: None,
            message: message.into(),
        }
    }

    pub fn upstream_status(service: &'static str, status: u16, message: impl Into<String>) -> Self {
        ServiceError::Upstream {
            service,
            status: Some(status),
            message: message.into(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthenticated(e) => AppError::Unauthorized(anyhow::anyhow!(e)),
            ServiceError::Upstream {
                service,
                status,
                message,
            } => {
                tracing::error!(service, status, message = %message, "Upstream call failed");
                AppError::Upstream {
                    message: format!("Failed to fetch data from {}", service),
                    details: status.map(|s| format!("{} responded with status {}", service, s)),
                }
            }
            ServiceError::ChallengeRejected { status } => AppError::Upstream {
                message: "Failed to submit challenge".to_string(),
                details: Some(format!("dex responded with status {}", status)),
            },
            ServiceError::Validation(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::NotFound(e) => AppError::NotFound(anyhow::anyhow!(e)),
        }
    }
}
