//! Sale entity - One customer checkout.
//!
//! A sale starts `Open` with a zero total, accumulates lines, and becomes
//! `Finalized` once; finalized sales accept no more lines. `total` always equals
//! the sum of the line subtotals.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a sale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "finalized")]
    Finalized,
}

/// Sale database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// When the sale was started
    pub created_at: DateTimeUtc,
    /// Operator who rang up the sale, None once that user is deleted
    pub operator_id: Option<i64>,
    /// Open till event the sale was started under
    pub till_session_id: Option<i64>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total: Decimal,
    pub status: SaleStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sale_line::Entity")]
    Lines,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OperatorId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Operator,
    #[sea_orm(
        belongs_to = "super::till_event::Entity",
        from = "Column::TillSessionId",
        to = "super::till_event::Column::Id",
        on_delete = "SetNull"
    )]
    TillSession,
}

impl Related<super::sale_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Operator.def()
    }
}

impl Related<super::till_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TillSession.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
