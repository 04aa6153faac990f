//! Till open/close pages and event history.

use crate::{
    core::till::{self, TillSummary},
    entities::{flash_message::Level, till_event},
    web::{
        AppState,
        error::WebError,
        extract::CurrentUser,
        flash::{self, Page},
    },
};
use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct OpenTillForm {
    pub starting_cash: Decimal,
    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CloseTillForm {
    pub ending_cash: Decimal,
    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OpenTillView {
    pub till_open: bool,
}

/// GET /till/open
pub async fn open_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Page<OpenTillView>>, WebError> {
    let till_open = till::is_open(&state.db, current.user.id).await?;
    flash::page(&state.db, &current, OpenTillView { till_open }).await
}

/// POST /till/open
#[tracing::instrument(skip_all, fields(operator = current.user.id))]
pub async fn open(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<OpenTillForm>,
) -> Result<Response, WebError> {
    match till::open_till(&state.db, &current.user, form.starting_cash, form.notes).await {
        Ok(event) => {
            let text = format!("Till opened with {}", event.starting_cash);
            flash::redirect(&state.db, &current, Level::Success, text, "/").await
        }
        Err(e) => flash::rejected(&state.db, &current, e, "/").await,
    }
}

/// GET /till/close - the open session with its expected cash.
pub async fn close_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, WebError> {
    match till::session_summary(&state.db, &current.user).await {
        Ok(summary) => Ok(flash::page::<TillSummary>(&state.db, &current, summary)
            .await?
            .into_response()),
        Err(e) => flash::rejected(&state.db, &current, e, "/").await,
    }
}

/// POST /till/close
#[tracing::instrument(skip_all, fields(operator = current.user.id))]
pub async fn close(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<CloseTillForm>,
) -> Result<Response, WebError> {
    match till::close_till(&state.db, &current.user, form.ending_cash, form.notes).await {
        Ok(event) => {
            let text = format!(
                "Till closed: sales {}, counted {}",
                event.sales_total, event.ending_cash
            );
            flash::redirect(&state.db, &current, Level::Success, text, "/").await
        }
        Err(e) => flash::rejected(&state.db, &current, e, "/").await,
    }
}

/// GET /till/history - all events for administrators, own events otherwise.
pub async fn history(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Page<Vec<till_event::Model>>>, WebError> {
    let events = till::history(&state.db, &current.user).await?;
    flash::page(&state.db, &current, events).await
}
