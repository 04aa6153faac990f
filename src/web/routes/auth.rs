//! Login and logout.

use crate::{
    core::auth,
    web::{AppState, SESSION_COOKIE, error::WebError, extract::CurrentUser},
};
use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// GET /login
pub async fn login_page() -> Json<Value> {
    Json(json!({ "page": "login", "fields": ["username", "password"] }))
}

/// POST /login - opens a session and sets the session cookie.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let (session, _user) = auth::login(&state.db, &form.username, &form.password).await?;

    Ok((jar.add(session_cookie(session.token)), Redirect::to("/")).into_response())
}

/// POST /logout - ends the session and clears the cookie.
#[tracing::instrument(skip_all, fields(user_id = current.user.id))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    current: CurrentUser,
) -> Result<Response, WebError> {
    auth::logout(&state.db, &current.session.token).await?;

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Redirect::to("/login")).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc123".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc123");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
