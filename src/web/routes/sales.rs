//! Checkout pages: start a sale, add lines, finalize.

use crate::{
    core::{
        product,
        sale::{self, SaleDetail},
    },
    entities::{flash_message::Level, product as product_entity, sale as sale_entity},
    errors::Error,
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
use serde::{Deserialize, Serialize};

fn lines_url(sale_id: i64) -> String {
    format!("/sales/{sale_id}/lines")
}

/// Where to send the user when a sale action is refused.
fn refusal_target(err: &Error, sale_id: i64) -> String {
    match err {
        Error::NoOpenTill => "/till/open".to_string(),
        Error::Forbidden { .. } => "/sales".to_string(),
        Error::SaleFinalized { .. } => format!("/sales/{sale_id}"),
        _ => lines_url(sale_id),
    }
}

#[derive(Debug, Deserialize)]
pub struct AddLineForm {
    pub product_id: i64,
    pub quantity: i32,
    /// Present when the user wants to keep adding lines
    pub add_another: Option<String>,
}

/// Add-line page: the sale so far and the products to pick from.
#[derive(Debug, Serialize)]
pub struct LinesView {
    #[serde(flatten)]
    pub detail: SaleDetail,
    pub products: Vec<product_entity::Model>,
}

/// GET /sales - newest first.
pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Page<Vec<sale_entity::Model>>>, WebError> {
    let sales = sale::list_sales(&state.db).await?;
    flash::page(&state.db, &current, sales).await
}

/// POST /sales - starts a sale under the caller's open till.
#[tracing::instrument(skip_all, fields(operator = current.user.id))]
pub async fn start(State(state): State<AppState>, current: CurrentUser) -> Result<Response, WebError> {
    match sale::start_sale(&state.db, &current.user).await {
        Ok(started) => {
            let text = format!("Sale #{} started", started.id);
            flash::redirect(&state.db, &current, Level::Info, text, &lines_url(started.id)).await
        }
        Err(e) => flash::rejected(&state.db, &current, e, "/till/open").await,
    }
}

/// GET /sales/{id}
pub async fn detail(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(sale_id): Path<i64>,
) -> Result<Json<Page<SaleDetail>>, WebError> {
    let detail = sale::get_sale_detail(&state.db, sale_id).await?;
    flash::page(&state.db, &current, detail).await
}

/// GET /sales/{id}/lines
pub async fn lines_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(sale_id): Path<i64>,
) -> Result<Json<Page<LinesView>>, WebError> {
    let detail = sale::get_sale_detail(&state.db, sale_id).await?;
    let products = product::list_products(&state.db).await?;
    flash::page(&state.db, &current, LinesView { detail, products }).await
}

/// POST /sales/{id}/lines - adds one line, then loops back or moves on to
/// the finalize page.
#[tracing::instrument(skip_all, fields(operator = current.user.id))]
pub async fn add_line(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(sale_id): Path<i64>,
    Form(form): Form<AddLineForm>,
) -> Result<Response, WebError> {
    match sale::add_line(&state.db, sale_id, &current.user, form.product_id, form.quantity).await {
        Ok(added) => {
            let text = format!(
                "Added {} x {} (total {})",
                added.line.quantity, added.line.product_name, added.sale.total
            );
            let to = if form.add_another.is_some() {
                lines_url(sale_id)
            } else {
                format!("/sales/{sale_id}/finalize")
            };
            flash::redirect(&state.db, &current, Level::Success, text, &to).await
        }
        Err(e) => {
            let to = refusal_target(&e, sale_id);
            flash::rejected(&state.db, &current, e, &to).await
        }
    }
}

/// GET /sales/{id}/finalize - confirmation page.
pub async fn finalize_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(sale_id): Path<i64>,
) -> Result<Json<Page<SaleDetail>>, WebError> {
    let detail = sale::get_sale_detail(&state.db, sale_id).await?;
    flash::page(&state.db, &current, detail).await
}

/// POST /sales/{id}/finalize
#[tracing::instrument(skip_all, fields(operator = current.user.id))]
pub async fn finalize(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(sale_id): Path<i64>,
) -> Result<Response, WebError> {
    match sale::finalize_sale(&state.db, sale_id, &current.user).await {
        Ok(finalized) => {
            let text = format!("Sale #{} finalized, total {}", finalized.id, finalized.total);
            flash::redirect(&state.db, &current, Level::Success, text, "/").await
        }
        Err(e) => {
            let to = refusal_target(&e, sale_id);
            flash::rejected(&state.db, &current, e, &to).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusal_targets() {
        assert_eq!(refusal_target(&Error::NoOpenTill, 4), "/till/open");
        assert_eq!(refusal_target(&Error::EmptySale { sale_id: 4 }, 4), "/sales/4/lines");
        assert_eq!(refusal_target(&Error::SaleFinalized { sale_id: 4 }, 4), "/sales/4");
        assert_eq!(
            refusal_target(&Error::Forbidden { action: "finalize another operator's sale" }, 4),
            "/sales"
        );
        assert_eq!(
            refusal_target(
                &Error::InsufficientStock {
                    product: "Soda".to_string(),
                    available: 1,
                    requested: 2
                },
                4
            ),
            "/sales/4/lines"
        );
    }
}
