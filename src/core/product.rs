//! Product business logic - Handles the catalog and its price history.
//!
//! Products carry a unit price and a stock count. Editing a product whose price
//! actually changes appends one `price_change` row in the same transaction as the
//! product save; edits that leave the price alone never do. Sale lines keep their
//! own name and price snapshot, so deleting a product only detaches them.

use crate::{
    entities::{PriceChange, Product, SaleLine, price_change, product, sale_line, user},
    errors::{Error, Result, check_money},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, Value, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::info;

const MAX_NAME_LEN: usize = 100;

/// Submitted product fields, used for both create and update.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
}

/// Result of an update: the saved product and the history row, if the price moved.
#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub product: product::Model,
    pub price_change: Option<price_change::Model>,
}

/// A product together with its price history, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub product: product::Model,
    pub price_history: Vec<price_change::Model>,
}

/// Normalized, validated product fields.
struct ValidProduct {
    name: String,
    description: Option<String>,
    price: Decimal,
    stock: i32,
}

fn validate(input: ProductInput) -> Result<ValidProduct> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("name", "Product name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::validation(
            "name",
            "Product name must be at most 100 characters",
        ));
    }
    let price = check_money("price", input.price)?;
    if input.stock < 0 {
        return Err(Error::validation("stock", "Stock cannot be negative"));
    }
    let description = input
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Ok(ValidProduct {
        name,
        description,
        price,
        stock: input.stock,
    })
}

/// Retrieves all products, ordered alphabetically by name.
pub async fn list_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Name)
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_product_by_id`], but a missing product is a `NotFound` error.
pub async fn get_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    get_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))
}

/// Retrieves a product and its price history, newest change first.
pub async fn get_product_detail(db: &DatabaseConnection, product_id: i64) -> Result<ProductDetail> {
    let product = get_product(db, product_id).await?;
    let price_history = PriceChange::find()
        .filter(price_change::Column::ProductId.eq(product_id))
        .order_by_desc(price_change::Column::ChangedAt)
        .order_by_desc(price_change::Column::Id)
        .all(db)
        .await?;

    Ok(ProductDetail {
        product,
        price_history,
    })
}

/// Creates a new product, performing input validation.
///
/// # Errors
/// Returns a validation error if:
/// - The product name is empty or whitespace-only
/// - The price is negative or has more than two decimal places
/// - The stock is negative
pub async fn create_product(db: &DatabaseConnection, input: ProductInput) -> Result<product::Model> {
    let valid = validate(input)?;
    let now = chrono::Utc::now();

    let product = product::ActiveModel {
        name: Set(valid.name),
        description: Set(valid.description),
        price: Set(valid.price),
        stock: Set(valid.stock),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(product_id = product.id, name = %product.name, price = %product.price, "product created");
    Ok(product)
}

/// Updates every editable field of a product.
///
/// The stored price is read inside the transaction, before the new values are
/// applied. When it differs from the submitted price a `price_change` row is
/// written with the acting user, and both rows commit together.
pub async fn update_product(
    db: &DatabaseConnection,
    actor: &user::Model,
    product_id: i64,
    input: ProductInput,
) -> Result<ProductUpdate> {
    let valid = validate(input)?;
    let now = chrono::Utc::now();

    let txn = db.begin().await?;

    let existing = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))?;
    let previous_price = existing.price;

    let mut active: product::ActiveModel = existing.into();
    active.name = Set(valid.name);
    active.description = Set(valid.description);
    active.price = Set(valid.price);
    active.stock = Set(valid.stock);
    active.updated_at = Set(now);
    let product = active.update(&txn).await?;

    let price_change = if previous_price == valid.price {
        None
    } else {
        let change = price_change::ActiveModel {
            product_id: Set(product_id),
            previous_price: Set(previous_price),
            new_price: Set(valid.price),
            changed_at: Set(now),
            user_id: Set(Some(actor.id)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        Some(change)
    };

    txn.commit().await?;

    match &price_change {
        Some(change) => info!(
            product_id,
            previous_price = %change.previous_price,
            new_price = %change.new_price,
            user_id = actor.id,
            "product price changed"
        ),
        None => info!(product_id, user_id = actor.id, "product updated"),
    }

    Ok(ProductUpdate {
        product,
        price_change,
    })
}

/// Deletes a product together with its price history.
///
/// Sale lines that sold it keep their snapshot and lose only the product link.
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let txn = db.begin().await?;

    let product = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))?;

    PriceChange::delete_many()
        .filter(price_change::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    SaleLine::update_many()
        .col_expr(sale_line::Column::ProductId, Expr::value(Value::BigInt(None)))
        .filter(sale_line::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    Product::delete_by_id(product_id).exec(&txn).await?;

    txn.commit().await?;

    info!(product_id, name = %product.name, "product deleted");
    Ok(product)
}
