//! Session entity - A logged-in browser, identified by an opaque token.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Random token carried in the session cookie
    #[sea_orm(unique)]
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::flash_message::Entity")]
    FlashMessages,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::flash_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FlashMessages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
