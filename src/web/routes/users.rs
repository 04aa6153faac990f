//! User administration pages. Every action here is administrator-only; the role
//! check happens in the core functions, which receive the caller explicitly.

use crate::{
    core::user::{self, NewUser, UserChanges, UserFilter},
    entities::{flash_message::Level, user::Role},
    web::{
        AppState,
        error::WebError,
        extract::CurrentUser,
        flash,
    },
};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

const USER_LIST: &str = "/users";

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub search: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct EditUserForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
}

/// GET /users - filtered user list.
pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<UserQuery>,
) -> Result<Response, WebError> {
    let filter = UserFilter {
        search: query.search,
        role: query.role,
        active: query.active,
    };
    match user::list_users(&state.db, &current.user, &filter).await {
        Ok(users) => Ok(flash::page(&state.db, &current, users).await?.into_response()),
        Err(e) => flash::rejected(&state.db, &current, e, "/").await,
    }
}

/// POST /users - registers a new account.
#[tracing::instrument(skip_all, fields(actor = current.user.id))]
pub async fn register(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<RegisterForm>,
) -> Result<Response, WebError> {
    let new_user = NewUser {
        username: form.username,
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email,
        password: form.password,
        password_confirmation: form.password_confirmation,
        role: form.role,
    };
    match user::register_user(&state.db, &current.user, new_user).await {
        Ok(created) => {
            let text = format!("User {} registered", created.username);
            flash::redirect(&state.db, &current, Level::Success, text, USER_LIST).await
        }
        Err(e) => flash::rejected(&state.db, &current, e, USER_LIST).await,
    }
}

/// POST /users/{id}/edit
#[tracing::instrument(skip_all, fields(actor = current.user.id))]
pub async fn edit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<i64>,
    Form(form): Form<EditUserForm>,
) -> Result<Response, WebError> {
    let changes = UserChanges {
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email,
        role: form.role,
    };
    match user::update_user(&state.db, &current.user, user_id, changes).await {
        Ok(updated) => {
            let text = format!("User {} updated", updated.username);
            flash::redirect(&state.db, &current, Level::Success, text, USER_LIST).await
        }
        Err(e) => flash::rejected(&state.db, &current, e, USER_LIST).await,
    }
}

/// POST /users/{id}/deactivate
#[tracing::instrument(skip_all, fields(actor = current.user.id))]
pub async fn deactivate(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, WebError> {
    match user::deactivate_user(&state.db, &current.user, user_id).await {
        Ok(target) => {
            let text = format!("User {} deactivated", target.username);
            flash::redirect(&state.db, &current, Level::Success, text, USER_LIST).await
        }
        Err(e) => flash::rejected(&state.db, &current, e, USER_LIST).await,
    }
}

/// POST /users/{id}/activate
#[tracing::instrument(skip_all, fields(actor = current.user.id))]
pub async fn activate(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, WebError> {
    match user::activate_user(&state.db, &current.user, user_id).await {
        Ok(target) => {
            let text = format!("User {} activated", target.username);
            flash::redirect(&state.db, &current, Level::Success, text, USER_LIST).await
        }
        Err(e) => flash::rejected(&state.db, &current, e, USER_LIST).await,
    }
}

/// POST /users/{id}/delete
#[tracing::instrument(skip_all, fields(actor = current.user.id))]
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, WebError> {
    match user::delete_user(&state.db, &current.user, user_id).await {
        Ok(target) => {
            let text = format!("User {} deleted", target.username);
            flash::redirect(&state.db, &current, Level::Success, text, USER_LIST).await
        }
        Err(e) => flash::rejected(&state.db, &current, e, USER_LIST).await,
    }
}
