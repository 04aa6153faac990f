//! Startup seeding - bootstrap administrator and initial catalog.
//!
//! Seeding only touches empty tables, so restarting the server never duplicates
//! or overwrites data an administrator has since edited.

use crate::{
    config::settings::Settings,
    core::{
        product::{self, ProductInput},
        user::{self, NewUser},
    },
    entities::{Product, User, user::Role},
    errors::Result,
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use tracing::{info, warn};

/// Creates the configured administrator when no user exists yet.
///
/// Returns `true` when an account was created. Without a configured admin or a
/// password nothing is created and a warning is logged, since nobody will be able
/// to log in.
pub async fn seed_bootstrap_admin(
    db: &DatabaseConnection,
    settings: &Settings,
    password: Option<String>,
) -> Result<bool> {
    if User::find().count(db).await? > 0 {
        return Ok(false);
    }

    let (Some(admin), Some(password)) = (settings.bootstrap_admin.as_ref(), password) else {
        warn!("no users exist and no bootstrap admin is configured; nobody can log in");
        return Ok(false);
    };

    let created = user::insert_user(
        db,
        NewUser {
            username: admin.username.clone(),
            first_name: admin.first_name.clone(),
            last_name: admin.last_name.clone(),
            email: admin.email.clone(),
            password: password.clone(),
            password_confirmation: password,
            role: Role::Administrator,
        },
    )
    .await?;

    info!(username = %created.username, "bootstrap administrator created");
    Ok(true)
}

/// Creates the configured products when the catalog is empty.
///
/// Returns the number of products created.
pub async fn seed_products(db: &DatabaseConnection, settings: &Settings) -> Result<usize> {
    if settings.products.is_empty() || Product::find().count(db).await? > 0 {
        return Ok(0);
    }

    for seed in &settings.products {
        product::create_product(
            db,
            ProductInput {
                name: seed.name.clone(),
                description: seed.description.clone(),
                price: seed.price,
                stock: seed.stock,
            },
        )
        .await?;
    }

    info!(count = settings.products.len(), "initial products seeded");
    Ok(settings.products.len())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::settings::{BootstrapAdmin, ProductSeed};
    use crate::core::auth;
    use crate::test_utils::*;
    use rust_decimal::Decimal;

    fn settings() -> Settings {
        Settings {
            bootstrap_admin: Some(BootstrapAdmin {
                username: "admin".to_string(),
                first_name: "Shop".to_string(),
                last_name: "Owner".to_string(),
                email: "admin@shop.test".to_string(),
            }),
            products: vec![ProductSeed {
                name: "Soda".to_string(),
                description: None,
                price: Decimal::new(1000, 2),
                stock: 50,
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_seed_bootstrap_admin_once() -> Result<()> {
        let db = setup_test_db().await?;
        let settings = settings();

        assert!(seed_bootstrap_admin(&db, &settings, Some(TEST_PASSWORD.to_string())).await?);
        let admin = auth::authenticate(&db, "admin", TEST_PASSWORD).await?;
        assert_eq!(admin.role, Role::Administrator);

        // Second run is a no-op
        assert!(!seed_bootstrap_admin(&db, &settings, Some(TEST_PASSWORD.to_string())).await?);
        assert_eq!(User::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_bootstrap_admin_needs_password() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(!seed_bootstrap_admin(&db, &settings(), None).await?);
        assert_eq!(User::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_products_only_into_empty_catalog() -> Result<()> {
        let db = setup_test_db().await?;
        let settings = settings();

        assert_eq!(seed_products(&db, &settings).await?, 1);
        assert_eq!(seed_products(&db, &settings).await?, 0);

        let products = product::list_products(&db).await?;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].stock, 50);
        Ok(())
    }
}
