pub mod assistant;
pub mod catalog;
pub mod health;
pub mod learning_paths;

use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON body extractor whose rejections render as `{"error": ...}` with status 400.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}
