//! Product entity - Items the shop sells.
//!
//! Each product has a name, optional description, unit price, stock count and
//! timestamps. Price edits are recorded separately in `price_change`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product (e.g., "Soda", "Chocolate bar")
    pub name: String,
    pub description: Option<String>,
    /// Current unit price
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    /// Units on hand, never negative after a committed operation
    pub stock: i32,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product has many price changes
    #[sea_orm(has_many = "super::price_change::Entity")]
    PriceChanges,
    /// One product appears in many sale lines
    #[sea_orm(has_many = "super::sale_line::Entity")]
    SaleLines,
}

impl Related<super::price_change::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceChanges.def()
    }
}

impl Related<super::sale_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
