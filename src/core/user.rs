//! User administration - registering, editing, enabling and removing staff accounts.
//!
//! Every operation here takes the acting user explicitly and requires the
//! administrator role. Operations that could lock an administrator out of their
//! own account (deactivate, delete, role change) refuse to target the actor.

use crate::{
    core::auth,
    entities::{PriceChange, Sale, TillEvent, User, price_change, sale, till_event, user, user::Role},
    errors::{Error, Result},
};
use sea_orm::{
    Condition, QueryOrder, Set, TransactionTrait, Value, prelude::*, sea_query::Expr,
};
use tracing::info;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 150;

/// Fields for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub role: Role,
}

/// Editable fields of an existing account.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

/// Criteria for the user list. Empty fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive match against handle, names and email
    pub search: Option<String>,
    pub role: Option<Role>,
    /// `Some(true)` for active only, `Some(false)` for inactive only
    pub active: Option<bool>,
}

fn validate_email(email: &str) -> Result<()> {
    if !email.is_empty() && !email.contains('@') {
        return Err(Error::validation("email", "Enter a valid email address"));
    }
    Ok(())
}

fn validate_new_user(new_user: &NewUser) -> Result<()> {
    let username = new_user.username.trim();
    if username.is_empty() {
        return Err(Error::validation("username", "Username cannot be empty"));
    }
    if username.len() > MAX_USERNAME_LEN || username.chars().any(char::is_whitespace) {
        return Err(Error::validation(
            "username",
            "Username must be at most 150 characters without spaces",
        ));
    }
    validate_email(new_user.email.trim())?;
    if new_user.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    if new_user.password != new_user.password_confirmation {
        return Err(Error::validation(
            "password_confirmation",
            "The two password fields didn't match",
        ));
    }
    Ok(())
}

/// Inserts a validated account without any role check. Used by `register_user`
/// and by startup seeding.
pub(crate) async fn insert_user(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model> {
    validate_new_user(&new_user)?;

    let username = new_user.username.trim().to_string();
    let taken = User::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(db)
        .await?
        .is_some();
    if taken {
        return Err(Error::validation(
            "username",
            "A user with that username already exists",
        ));
    }

    let password_hash = auth::hash_password(&new_user.password)?;
    let created = user::ActiveModel {
        username: Set(username),
        first_name: Set(new_user.first_name.trim().to_string()),
        last_name: Set(new_user.last_name.trim().to_string()),
        email: Set(new_user.email.trim().to_string()),
        password_hash: Set(password_hash),
        role: Set(new_user.role),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = created.id, username = %created.username, role = ?created.role, "user registered");
    Ok(created)
}

/// Registers a new account. Administrators only.
pub async fn register_user(
    db: &DatabaseConnection,
    actor: &user::Model,
    new_user: NewUser,
) -> Result<user::Model> {
    auth::require_role(actor, Role::Administrator, "register users")?;
    insert_user(db, new_user).await
}

/// Lists accounts matching the filter, ordered by handle. Administrators only.
pub async fn list_users(
    db: &DatabaseConnection,
    actor: &user::Model,
    filter: &UserFilter,
) -> Result<Vec<user::Model>> {
    auth::require_role(actor, Role::Administrator, "view the user list")?;

    let mut query = User::find();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(user::Column::Username.contains(search))
                .add(user::Column::FirstName.contains(search))
                .add(user::Column::LastName.contains(search))
                .add(user::Column::Email.contains(search)),
        );
    }
    if let Some(role) = filter.role {
        query = query.filter(user::Column::Role.eq(role));
    }
    if let Some(active) = filter.active {
        query = query.filter(user::Column::IsActive.eq(active));
    }

    query
        .order_by_asc(user::Column::Username)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn find_user<C>(db: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))
}

/// Fetches one account. Administrators only.
pub async fn get_user(
    db: &DatabaseConnection,
    actor: &user::Model,
    user_id: i64,
) -> Result<user::Model> {
    auth::require_role(actor, Role::Administrator, "view users")?;
    find_user(db, user_id).await
}

/// Edits names, email and role. Administrators only; an administrator cannot
/// change their own role.
pub async fn update_user(
    db: &DatabaseConnection,
    actor: &user::Model,
    user_id: i64,
    changes: UserChanges,
) -> Result<user::Model> {
    auth::require_role(actor, Role::Administrator, "edit users")?;
    validate_email(changes.email.trim())?;

    let existing = find_user(db, user_id).await?;
    if existing.role != changes.role {
        auth::ensure_not_self(actor, user_id, "change the role of")?;
    }

    let mut active: user::ActiveModel = existing.into();
    active.first_name = Set(changes.first_name.trim().to_string());
    active.last_name = Set(changes.last_name.trim().to_string());
    active.email = Set(changes.email.trim().to_string());
    active.role = Set(changes.role);
    let updated = active.update(db).await?;

    info!(user_id, actor_id = actor.id, "user updated");
    Ok(updated)
}

/// Disables login for an account and ends its sessions. History is kept.
pub async fn deactivate_user(
    db: &DatabaseConnection,
    actor: &user::Model,
    user_id: i64,
) -> Result<user::Model> {
    auth::require_role(actor, Role::Administrator, "deactivate users")?;
    let target = find_user(db, user_id).await?;
    auth::ensure_not_self(actor, user_id, "deactivate")?;

    let txn = db.begin().await?;
    let mut active: user::ActiveModel = target.into();
    active.is_active = Set(false);
    let updated = active.update(&txn).await?;
    auth::delete_user_sessions(&txn, user_id).await?;
    txn.commit().await?;

    info!(user_id, actor_id = actor.id, "user deactivated");
    Ok(updated)
}

/// Re-enables login for an account.
pub async fn activate_user(
    db: &DatabaseConnection,
    actor: &user::Model,
    user_id: i64,
) -> Result<user::Model> {
    auth::require_role(actor, Role::Administrator, "activate users")?;
    let target = find_user(db, user_id).await?;

    let mut active: user::ActiveModel = target.into();
    active.is_active = Set(true);
    let updated = active.update(db).await?;

    info!(user_id, actor_id = actor.id, "user activated");
    Ok(updated)
}

/// Permanently removes an account.
///
/// Sales, till events and price changes the user recorded stay, with their user
/// reference cleared.
pub async fn delete_user(
    db: &DatabaseConnection,
    actor: &user::Model,
    user_id: i64,
) -> Result<user::Model> {
    auth::require_role(actor, Role::Administrator, "delete users")?;
    let target = find_user(db, user_id).await?;
    auth::ensure_not_self(actor, user_id, "delete")?;

    let txn = db.begin().await?;

    Sale::update_many()
        .col_expr(sale::Column::OperatorId, Expr::value(Value::BigInt(None)))
        .filter(sale::Column::OperatorId.eq(user_id))
        .exec(&txn)
        .await?;
    TillEvent::update_many()
        .col_expr(till_event::Column::OperatorId, Expr::value(Value::BigInt(None)))
        .filter(till_event::Column::OperatorId.eq(user_id))
        .exec(&txn)
        .await?;
    PriceChange::update_many()
        .col_expr(price_change::Column::UserId, Expr::value(Value::BigInt(None)))
        .filter(price_change::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    auth::delete_user_sessions(&txn, user_id).await?;
    User::delete_by_id(user_id).exec(&txn).await?;

    txn.commit().await?;

    info!(user_id, username = %target.username, actor_id = actor.id, "user deleted");
    Ok(target)
}
