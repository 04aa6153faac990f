//! Till business logic - Opening, closing and reconciling cash register sessions.
//!
//! A till session starts with an `Open` event and ends with the `Close` event that
//! references it. An operator has at most one unclosed session at a time, whatever
//! day it was opened on. The sales total of a session is always derived from the
//! finalized sales attached to it; no running counter is kept.

use crate::{
    entities::{
        Sale, TillEvent, TillEventKind, sale, sale::SaleStatus, till_event, user, user::Role,
    },
    errors::{Error, Result, check_money},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, warn};

/// Snapshot of an operator's open session, used to prefill the close form.
#[derive(Debug, Clone, Serialize)]
pub struct TillSummary {
    /// The open event that started the session
    pub open_event: till_event::Model,
    /// Finalized sales in the session so far
    pub sales_total: Decimal,
    /// `starting_cash + sales_total`
    pub expected_cash: Decimal,
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Returns the operator's unclosed open event, if any.
///
/// Only the latest open event can be unclosed, because `open_till` refuses to
/// start a session while another one is open.
pub async fn current_session<C>(db: &C, operator_id: i64) -> Result<Option<till_event::Model>>
where
    C: ConnectionTrait,
{
    let Some(latest_open) = TillEvent::find()
        .filter(till_event::Column::OperatorId.eq(operator_id))
        .filter(till_event::Column::Kind.eq(TillEventKind::Open))
        .order_by_desc(till_event::Column::Id)
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let closed = TillEvent::find()
        .filter(till_event::Column::Kind.eq(TillEventKind::Close))
        .filter(till_event::Column::OpenEventId.eq(latest_open.id))
        .one(db)
        .await?
        .is_some();

    Ok((!closed).then_some(latest_open))
}

/// Whether the operator currently has an open till.
pub async fn is_open(db: &DatabaseConnection, operator_id: i64) -> Result<bool> {
    Ok(current_session(db, operator_id).await?.is_some())
}

/// Sum of the finalized sales attached to a session.
pub(crate) async fn session_sales_total<C>(db: &C, open_event_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let sales = Sale::find()
        .filter(sale::Column::TillSessionId.eq(open_event_id))
        .filter(sale::Column::Status.eq(SaleStatus::Finalized))
        .all(db)
        .await?;

    Ok(sales.iter().map(|s| s.total).sum::<Decimal>().round_dp(2))
}

/// Opens a till session for the operator with the counted starting cash.
///
/// # Errors
/// - `AlreadyOpen` if the operator already has an unclosed session
/// - `Validation` if the starting cash is negative or has sub-cent digits
pub async fn open_till(
    db: &DatabaseConnection,
    operator: &user::Model,
    starting_cash: Decimal,
    notes: Option<String>,
) -> Result<till_event::Model> {
    let starting_cash = check_money("starting_cash", starting_cash)?;

    let txn = db.begin().await?;

    if let Some(existing) = current_session(&txn, operator.id).await? {
        warn!(operator_id = operator.id, open_event_id = existing.id, "till already open");
        return Err(Error::AlreadyOpen);
    }

    let event = till_event::ActiveModel {
        created_at: Set(chrono::Utc::now()),
        operator_id: Set(Some(operator.id)),
        kind: Set(TillEventKind::Open),
        open_event_id: Set(None),
        starting_cash: Set(starting_cash),
        ending_cash: Set(Decimal::ZERO),
        sales_total: Set(Decimal::ZERO),
        notes: Set(clean_notes(notes)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(operator_id = operator.id, event_id = event.id, %starting_cash, "till opened");
    Ok(event)
}

/// Closes the operator's open session with the counted ending cash.
///
/// The session's sales total is computed from its finalized sales and written on
/// the close event together with the starting cash copied from the open event.
/// The open event itself is left untouched.
pub async fn close_till(
    db: &DatabaseConnection,
    operator: &user::Model,
    ending_cash: Decimal,
    notes: Option<String>,
) -> Result<till_event::Model> {
    let ending_cash = check_money("ending_cash", ending_cash)?;

    let txn = db.begin().await?;

    let Some(open_event) = current_session(&txn, operator.id).await? else {
        warn!(operator_id = operator.id, "close requested without an open till");
        return Err(Error::NoOpenTill);
    };

    let sales_total = session_sales_total(&txn, open_event.id).await?;

    let event = till_event::ActiveModel {
        created_at: Set(chrono::Utc::now()),
        operator_id: Set(Some(operator.id)),
        kind: Set(TillEventKind::Close),
        open_event_id: Set(Some(open_event.id)),
        starting_cash: Set(open_event.starting_cash),
        ending_cash: Set(ending_cash),
        sales_total: Set(sales_total),
        notes: Set(clean_notes(notes)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    let expected = open_event.starting_cash + sales_total;
    info!(
        operator_id = operator.id,
        event_id = event.id,
        %sales_total,
        %ending_cash,
        difference = %(ending_cash - expected),
        "till closed"
    );
    Ok(event)
}

/// Summarizes the operator's open session.
///
/// # Errors
/// `NoOpenTill` if the operator has no open session.
pub async fn session_summary(db: &DatabaseConnection, operator: &user::Model) -> Result<TillSummary> {
    let open_event = current_session(db, operator.id)
        .await?
        .ok_or(Error::NoOpenTill)?;
    let sales_total = session_sales_total(db, open_event.id).await?;
    let expected_cash = open_event.starting_cash + sales_total;

    Ok(TillSummary {
        open_event,
        sales_total,
        expected_cash,
    })
}

/// Till events visible to the requesting user, newest first.
///
/// Administrators see every operator's events; employees see only their own.
pub async fn history(
    db: &DatabaseConnection,
    requesting_user: &user::Model,
) -> Result<Vec<till_event::Model>> {
    let mut query = TillEvent::find();
    if requesting_user.role != Role::Administrator {
        query = query.filter(till_event::Column::OperatorId.eq(requesting_user.id));
    }

    query
        .order_by_desc(till_event::Column::CreatedAt)
        .order_by_desc(till_event::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
