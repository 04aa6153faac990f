//! Catalog pages.

use crate::{
    core::product::{self, ProductDetail, ProductInput},
    entities::{flash_message::Level, product as product_entity},
    web::{
        AppState,
        error::WebError,
        extract::CurrentUser,
        flash::{self, Page},
    },
};
use axum::{
    Form, Json,
    extract::{Path, State},
    response::Response,
};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
}

impl From<ProductForm> for ProductInput {
    fn from(form: ProductForm) -> Self {
        Self {
            name: form.name,
            description: form.description,
            price: form.price,
            stock: form.stock,
        }
    }
}

/// GET /products - catalog sorted by name.
pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Page<Vec<product_entity::Model>>>, WebError> {
    let products = product::list_products(&state.db).await?;
    flash::page(&state.db, &current, products).await
}

/// GET /products/{id} - product with its price history.
pub async fn detail(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(product_id): Path<i64>,
) -> Result<Json<Page<ProductDetail>>, WebError> {
    let detail = product::get_product_detail(&state.db, product_id).await?;
    flash::page(&state.db, &current, detail).await
}

/// POST /products
#[tracing::instrument(skip_all, fields(actor = current.user.id))]
pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<ProductForm>,
) -> Result<Response, WebError> {
    let created = product::create_product(&state.db, form.into()).await?;
    let text = format!("Product {} created", created.name);
    let to = format!("/products/{}", created.id);
    flash::redirect(&state.db, &current, Level::Success, text, &to).await
}

/// POST /products/{id}/edit - saves the product, recording a price change if
/// the price moved.
#[tracing::instrument(skip_all, fields(actor = current.user.id))]
pub async fn edit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(product_id): Path<i64>,
    Form(form): Form<ProductForm>,
) -> Result<Response, WebError> {
    let update = product::update_product(&state.db, &current.user, product_id, form.into()).await?;
    let text = match &update.price_change {
        Some(change) => format!(
            "Product {} updated, price {} -> {}",
            update.product.name, change.previous_price, change.new_price
        ),
        None => format!("Product {} updated", update.product.name),
    };
    let to = format!("/products/{product_id}");
    flash::redirect(&state.db, &current, Level::Success, text, &to).await
}

/// POST /products/{id}/delete
#[tracing::instrument(skip_all, fields(actor = current.user.id))]
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(product_id): Path<i64>,
) -> Result<Response, WebError> {
    let deleted = product::delete_product(&state.db, product_id).await?;
    let text = format!("Product {} deleted", deleted.name);
    flash::redirect(&state.db, &current, Level::Success, text, "/products").await
}
