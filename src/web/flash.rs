//! One-shot user messages stored per session.
//!
//! POST handlers push a message and redirect; the next GET page drains the
//! session's messages into its JSON body.

use crate::{
    entities::{FlashMessage, flash_message, flash_message::Level},
    errors::{Error, Result},
    web::{error::WebError, extract::CurrentUser},
};
use axum::{
    Json,
    response::{IntoResponse, Redirect, Response},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;

/// A drained message as rendered to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: Level,
    pub text: String,
}

/// JSON page body: pending messages plus the page's own data.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub messages: Vec<Flash>,
    pub data: T,
}

/// Queues a message for the session's next page.
pub async fn push(
    db: &DatabaseConnection,
    session_id: i64,
    level: Level,
    text: impl Into<String>,
) -> Result<()> {
    flash_message::ActiveModel {
        session_id: Set(session_id),
        level: Set(level),
        text: Set(text.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Removes and returns the session's queued messages, oldest first.
pub async fn drain(db: &DatabaseConnection, session_id: i64) -> Result<Vec<Flash>> {
    let messages = FlashMessage::find()
        .filter(flash_message::Column::SessionId.eq(session_id))
        .order_by_asc(flash_message::Column::Id)
        .all(db)
        .await?;

    if !messages.is_empty() {
        FlashMessage::delete_many()
            .filter(flash_message::Column::SessionId.eq(session_id))
            .filter(flash_message::Column::Id.lte(messages[messages.len() - 1].id))
            .exec(db)
            .await?;
    }

    Ok(messages
        .into_iter()
        .map(|m| Flash {
            level: m.level,
            text: m.text,
        })
        .collect())
}

/// Wraps page data with the caller's pending messages.
pub async fn page<T: Serialize>(
    db: &DatabaseConnection,
    current: &CurrentUser,
    data: T,
) -> std::result::Result<Json<Page<T>>, WebError> {
    let messages = drain(db, current.session.id).await?;
    Ok(Json(Page { messages, data }))
}

/// Pushes a message and answers `303 See Other` to `to`.
pub async fn redirect(
    db: &DatabaseConnection,
    current: &CurrentUser,
    level: Level,
    text: impl Into<String>,
    to: &str,
) -> std::result::Result<Response, WebError> {
    push(db, current.session.id, level, text).await?;
    Ok(Redirect::to(to).into_response())
}

/// Turns a business-rule failure into an error message and a redirect to `to`.
///
/// Any other error (validation, missing record, infrastructure) is returned for
/// the caller to render.
pub async fn rejected(
    db: &DatabaseConnection,
    current: &CurrentUser,
    err: Error,
    to: &str,
) -> std::result::Result<Response, WebError> {
    if err.is_business_rule() {
        tracing::debug!(error = %err, to, "request rejected");
        redirect(db, current, Level::Error, err.to_string(), to).await
    } else {
        Err(err.into())
    }
}
