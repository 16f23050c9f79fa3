//! Session extractors.
//!
//! Requests authenticate with `Authorization: Bearer <token>`. The
//! schedule stream also reads `?token=` since browser `EventSource`
//! cannot set headers.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Deserialize;
use tempo_types::{SessionToken, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated user. Rejects with 401 when the session is missing
/// or unknown.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthenticated)?;
        state
            .sessions
            .resolve_session(&token)
            .await?
            .map(Self)
            .ok_or(ApiError::Unauthenticated)
    }
}

/// The user a schedule stream belongs to. Falls back to the demo user
/// when no valid session is presented.
#[derive(Debug, Clone)]
pub struct StreamUser(pub UserId);

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl FromRequestParts<Arc<AppState>> for StreamUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).or_else(|| {
            Query::<TokenQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(q)| q.token)
                .filter(|t| !t.is_empty())
                .map(SessionToken::from)
        });
        let user = match token {
            Some(token) => state.sessions.resolve_session(&token).await?,
            None => None,
        };
        Ok(Self(user.unwrap_or_else(UserId::demo)))
    }
}

fn bearer_token(parts: &Parts) -> Option<SessionToken> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| SessionToken::from(token))
}
