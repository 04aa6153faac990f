//! Till event entity - Cash register open and close records.
//!
//! An `Open` event starts a till session for its operator. The matching `Close`
//! event points back at it through `open_event_id`; the session is open exactly
//! while no close event references it. Events are never edited after insert.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether the event opened or closed a till session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum TillEventKind {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "close")]
    Close,
}

/// Till event database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "till_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub created_at: DateTimeUtc,
    /// Operator who owns the till, None once that user is deleted
    pub operator_id: Option<i64>,
    pub kind: TillEventKind,
    /// For close events, the open event that started the session
    pub open_event_id: Option<i64>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub starting_cash: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub ending_cash: Decimal,
    /// Sum of the session's finalized sales; zero on open events
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub sales_total: Decimal,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OperatorId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Operator,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::OpenEventId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    OpenEvent,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Operator.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
