//! User entity - Shop staff accounts.
//!
//! Each user has a unique handle, display name parts, an email, a role and an
//! active flag. Inactive users cannot log in, but their sales, till events and
//! price changes are kept.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The two roles a shop account can have.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages users and sees every till event
    #[sea_orm(string_value = "admin")]
    Administrator,
    /// Sells and runs their own till
    #[sea_orm(string_value = "employee")]
    Employee,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login handle, unique across all users
    #[sea_orm(unique)]
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// Soft-disable flag - inactive users cannot log in
    pub is_active: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Name to show in lists: "First Last", or the handle when both are blank.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many login sessions
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
    /// One user operates many sales
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
    /// One user records many till events
    #[sea_orm(has_many = "super::till_event::Entity")]
    TillEvents,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl Related<super::till_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TillEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
