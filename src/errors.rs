//! Unified error types for the kiosco service.
//!
//! Business-rule violations (stock, till, sale state, authorization) are kept apart
//! from infrastructure failures so the web layer can turn the former into a user
//! message and redirect, and the latter into a server error.

use rust_decimal::Decimal;
use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range input; the form is redisplayed with the message.
    #[error("{field}: {message}")]
    Validation {
        /// Name of the offending form field
        field: &'static str,
        /// Human-readable explanation
        message: String,
    },

    /// A record looked up by id does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record (e.g. "product")
        entity: &'static str,
        /// The identifier that was looked up
        id: String,
    },

    /// The acting user's role does not allow the action.
    #[error("You do not have permission to {action}")]
    Forbidden {
        /// Description of the denied action
        action: &'static str,
    },

    /// The acting user tried to deactivate, delete or re-role their own account.
    #[error("You cannot {action} your own account")]
    SelfModificationDenied {
        /// Description of the denied action
        action: &'static str,
    },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Not enough stock of {product}: {available} available, {requested} requested")]
    InsufficientStock {
        /// Product name
        product: String,
        /// Units in stock
        available: i32,
        /// Units requested
        requested: i32,
    },

    #[error("Sale #{sale_id} has no products")]
    EmptySale {
        /// The sale that was empty
        sale_id: i64,
    },

    #[error("Sale #{sale_id} is already finalized")]
    SaleFinalized {
        /// The finalized sale
        sale_id: i64,
    },

    #[error("There is no open till")]
    NoOpenTill,

    #[error("You already have an open till")]
    AlreadyOpen,

    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong while loading configuration
        message: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// Underlying hasher message
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a validation failure on a form field.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a missing record.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether this error is a rule violation the user should see as a message,
    /// rather than an infrastructure failure.
    #[must_use]
    pub const fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Self::Forbidden { .. }
                | Self::SelfModificationDenied { .. }
                | Self::InvalidCredentials
                | Self::InsufficientStock { .. }
                | Self::EmptySale { .. }
                | Self::SaleFinalized { .. }
                | Self::NoOpenTill
                | Self::AlreadyOpen
        )
    }
}

/// Validates a money amount: non-negative and at most two decimal places.
pub(crate) fn check_money(field: &'static str, amount: Decimal) -> Result<Decimal> {
    if amount < Decimal::ZERO {
        return Err(Error::validation(field, "must not be negative"));
    }
    if amount.normalize().scale() > 2 {
        return Err(Error::validation(field, "must have at most two decimal places"));
    }
    // Decimal(10, 2)
    if amount >= Decimal::new(100_000_000, 0) {
        return Err(Error::validation(field, "is too large"));
    }
    Ok(amount.round_dp(2))
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
