use axum::{
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use validator::Validate;

/// Request body accepted either form-encoded or as JSON, then validated.
///
/// The wallet front-ends post form data while newer clients send JSON, so
/// the content type decides which decoder runs.
pub struct ValidatedPayload<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedPayload<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        let value = if is_form {
            let Form(value) = Form::<T>::from_request(req, state).await.map_err(|e| {
                AppError::BadRequest(anyhow::anyhow!("Invalid form body: {}", e)).into_response()
            })?;
            value
        } else {
            let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
                AppError::BadRequest(anyhow::anyhow!("Invalid request payload: {}", e))
                    .into_response()
            })?;
            value
        };

        value
            .validate()
            .map_err(|e| AppError::ValidationError(e).into_response())?;

        Ok(ValidatedPayload(value))
    }
}
