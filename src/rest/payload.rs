use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// Request body accepted either as JSON or as an url-encoded form.
pub struct Payload<T>(pub T);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(value) = Form::<T>::from_request(req, state).await.map_err(|rej| {
                log::warn!("Rejected form body: {}", rej.body_text());
                ApiError::new(rej.status(), rej.body_text()).into_response()
            })?;
            return Ok(Self(value));
        }

        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rej| {
            log::warn!("Rejected JSON body: {}", rej.body_text());
            ApiError::new(rej.status(), rej.body_text()).into_response()
        })?;
        Ok(Self(value))
    }
}
