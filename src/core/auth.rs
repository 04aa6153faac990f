//! Identity and role checks - login, sessions, and authorization guards.
//!
//! Passwords are stored as argon2id PHC strings. A successful login creates a
//! persisted session whose random token the web layer puts in a cookie; every
//! request resolves that token back to the acting user, which is then passed
//! explicitly to the business functions that need it.

use crate::{
    entities::{FlashMessage, Session, User, flash_message, session, user, user::Role},
    errors::{Error, Result},
};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use sea_orm::{Set, prelude::*};
use tracing::{info, warn};

/// Hashes a plaintext password with argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

/// Checks a plaintext password against a stored PHC string.
///
/// A malformed stored hash never verifies.
#[must_use]
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Verifies a handle and secret, returning the matching active user.
///
/// Unknown handles, wrong passwords and inactive accounts all fail with the same
/// `InvalidCredentials` error so the caller cannot tell them apart.
pub async fn authenticate(db: &DatabaseConnection, handle: &str, secret: &str) -> Result<user::Model> {
    let found = User::find()
        .filter(user::Column::Username.eq(handle.trim()))
        .one(db)
        .await?;

    match found {
        Some(user) if user.is_active && verify_password(secret, &user.password_hash) => Ok(user),
        _ => {
            warn!(handle, "rejected login attempt");
            Err(Error::InvalidCredentials)
        }
    }
}

/// Authenticates and opens a new session for the user.
pub async fn login(
    db: &DatabaseConnection,
    handle: &str,
    secret: &str,
) -> Result<(session::Model, user::Model)> {
    let user = authenticate(db, handle, secret).await?;

    let session = session::ActiveModel {
        token: Set(::uuid::Uuid::new_v4().simple().to_string()),
        user_id: Set(user.id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok((session, user))
}

/// Ends a session. Unknown tokens are ignored.
pub async fn logout(db: &DatabaseConnection, token: &str) -> Result<()> {
    if let Some(session) = Session::find()
        .filter(session::Column::Token.eq(token))
        .one(db)
        .await?
    {
        delete_sessions(db, vec![session.id]).await?;
        info!(user_id = session.user_id, "user logged out");
    }
    Ok(())
}

/// Resolves a session token to its session and active user.
pub async fn resolve_session(
    db: &DatabaseConnection,
    token: &str,
) -> Result<(session::Model, user::Model)> {
    let (session, user) = Session::find()
        .filter(session::Column::Token.eq(token))
        .find_also_related(User)
        .one(db)
        .await?
        .ok_or(Error::Unauthenticated)?;

    match user {
        Some(user) if user.is_active => Ok((session, user)),
        _ => Err(Error::Unauthenticated),
    }
}

/// Removes sessions and their pending flash messages.
pub(crate) async fn delete_sessions<C>(db: &C, session_ids: Vec<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    if session_ids.is_empty() {
        return Ok(());
    }
    FlashMessage::delete_many()
        .filter(flash_message::Column::SessionId.is_in(session_ids.clone()))
        .exec(db)
        .await?;
    Session::delete_many()
        .filter(session::Column::Id.is_in(session_ids))
        .exec(db)
        .await?;
    Ok(())
}

/// Removes every session belonging to a user, logging them out everywhere.
pub(crate) async fn delete_user_sessions<C>(db: &C, user_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let ids = Session::find()
        .filter(session::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();
    delete_sessions(db, ids).await
}

/// Fails with `Forbidden` unless the user has the given role.
pub fn require_role(user: &user::Model, role: Role, action: &'static str) -> Result<()> {
    if user.role == role {
        Ok(())
    } else {
        warn!(user_id = user.id, action, "forbidden");
        Err(Error::Forbidden { action })
    }
}

/// Fails with `SelfModificationDenied` when the actor targets their own account.
pub fn ensure_not_self(actor: &user::Model, target_id: i64, action: &'static str) -> Result<()> {
    if actor.id == target_id {
        warn!(user_id = actor.id, action, "self-modification denied");
        Err(Error::SelfModificationDenied { action })
    } else {
        Ok(())
    }
}
