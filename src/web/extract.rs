//! Request extractors.

use crate::{
    core::auth,
    entities::{session, user},
    errors::Error,
    web::{AppState, SESSION_COOKIE, error::WebError},
};
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

/// The authenticated caller of a request, resolved from the session cookie.
///
/// Handlers receive this explicitly and pass `user` on to the business functions
/// that act on behalf of someone. A missing or stale cookie redirects to `/login`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session: session::Model,
    pub user: user::Model,
}

/// Reads the session token from the request cookies.
pub(crate) fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = session_token(&jar)
            .ok_or_else(|| WebError(Error::Unauthenticated).into_response())?;

        let (session, user) = auth::resolve_session(&state.db, &token)
            .await
            .map_err(|e| WebError(e).into_response())?;

        Ok(Self { session, user })
    }
}
