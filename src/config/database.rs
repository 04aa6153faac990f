//! Database configuration module for kiosco.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL. Creation is
//! idempotent, which lets the server run it on every start.

use crate::entities::{
    FlashMessage, PriceChange, Product, Sale, SaleLine, Session, TillEvent, User,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::debug;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/kiosco.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a local `SQLite` file that is created on first use.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
pub async fn create_connection() -> Result<DatabaseConnection> {
    connect(&get_database_url()).await
}

/// Connects to an explicit database URL.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    debug!(database_url, "connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables that do not exist yet, parents before children.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Session).await?;
    create_table(db, &schema, FlashMessage).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, PriceChange).await?;
    create_table(db, &schema, TillEvent).await?;
    create_table(db, &schema, Sale).await?;
    create_table(db, &schema, SaleLine).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ProductModel, SaleLineModel, TillEventModel, UserModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        let _: Vec<SaleLineModel> = SaleLine::find().limit(1).all(&db).await?;
        let _: Vec<TillEventModel> = TillEvent::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
