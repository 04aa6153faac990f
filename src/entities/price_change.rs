//! Price change entity - Append-only history of product price edits.
//!
//! A row is written exactly once per product update whose price differs from the
//! stored one. Rows are never updated; they go away only with their product.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Price change database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "price_changes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_id: i64,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub previous_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub new_price: Decimal,
    pub changed_at: DateTimeUtc,
    /// User who edited the price, None once that user is deleted
    pub user_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
