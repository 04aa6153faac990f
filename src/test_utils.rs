//! Shared test utilities for the kiosco crate.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test users and products with sensible defaults.

use crate::{
    core::{
        product::{self, ProductInput},
        user::{self, NewUser},
    },
    entities,
    entities::user::Role,
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Password given to every test account.
pub const TEST_PASSWORD: &str = "correct-horse";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates an active account with `TEST_PASSWORD`.
///
/// # Defaults
/// * `first_name`: the handle
/// * `last_name`: "Tester"
/// * `email`: `"{name}@shop.test"`
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    role: Role,
) -> Result<entities::user::Model> {
    user::insert_user(
        db,
        NewUser {
            username: name.to_string(),
            first_name: name.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{name}@shop.test"),
            password: TEST_PASSWORD.to_string(),
            password_confirmation: TEST_PASSWORD.to_string(),
            role,
        },
    )
    .await
}

/// Creates an administrator.
pub async fn create_test_admin(db: &DatabaseConnection, name: &str) -> Result<entities::user::Model> {
    create_test_user(db, name, Role::Administrator).await
}

/// Creates an employee.
pub async fn create_test_employee(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::user::Model> {
    create_test_user(db, name, Role::Employee).await
}

/// Creates a product with the given price and stock and no description.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
    stock: i32,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        ProductInput {
            name: name.to_string(),
            description: None,
            price,
            stock,
        },
    )
    .await
}
