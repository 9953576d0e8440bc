use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::error::Error;
use uuid::Uuid;

use crate::{error::ApiError, server::AppState};

/// An authenticated caller, resolved from a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
}

/// Session lookup is owned by the surrounding system; the handlers only
/// need token resolution.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn session_for_token(
        &self,
        token: &str,
    ) -> Result<Option<Session>, Box<dyn Error + Send + Sync>>;
}

/// Present in a handler signature means the request carried a valid session.
pub struct CurrentUser(pub Session);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let session = state
            .sessions
            .session_for_token(token)
            .await
            .map_err(ApiError::from)?
            .ok_or(ApiError::Unauthorized)?;

        Ok(CurrentUser(session))
    }
}
