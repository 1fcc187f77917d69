use std::convert::Infallible;
use std::ops::Deref;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;

use super::RequestSession;
use crate::error::AppError;
use crate::types::{User, UserSession};

fn session_of(parts: &Parts) -> Option<&UserSession> {
    parts
        .extensions
        .get::<RequestSession>()
        .and_then(|s| s.0.as_ref())
}

/// Handler で現在の user (`request.session.user`) を受け取るための extractor
///
/// guard が session を extensions に insert 済みである前提。
/// 見つからない場合は 401 を返す。public route では `Option<CurrentUser>` を使う。
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_of(parts)
            .map(|s| CurrentUser(s.user.clone()))
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(session_of(parts).map(|s| CurrentUser(s.user.clone())))
    }
}

/// Handler で session 全体 (`request.session`) を受け取るための extractor
#[derive(Debug, Clone)]
pub struct Session(pub UserSession);

impl Deref for Session {
    type Target = UserSession;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_of(parts)
            .cloned()
            .map(Session)
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> OptionalFromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(session_of(parts).cloned().map(Session))
    }
}
