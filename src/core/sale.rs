//! Sale business logic - Ringing up a checkout against live stock.
//!
//! A sale is started under the operator's open till, grows one line at a time,
//! and is finalized once it has at least one line. Adding a line snapshots the
//! product's name and price, decrements stock and recomputes the sale total from
//! all of its lines, all inside a single database transaction.

use crate::{
    core::till,
    entities::{Product, Sale, SaleLine, product, sale, sale::SaleStatus, sale_line, user},
    errors::{Error, Result, check_money},
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::{info, warn};

/// A sale with its lines in insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetail {
    pub sale: sale::Model,
    pub lines: Vec<sale_line::Model>,
}

/// Everything that changed when a line was added.
#[derive(Debug, Clone)]
pub struct LineAdded {
    pub line: sale_line::Model,
    /// The sale with its recomputed total
    pub sale: sale::Model,
    /// The product with its decremented stock
    pub product: product::Model,
}

async fn find_sale<C>(db: &C, sale_id: i64) -> Result<sale::Model>
where
    C: ConnectionTrait,
{
    Sale::find_by_id(sale_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("sale", sale_id))
}

async fn find_lines<C>(db: &C, sale_id: i64) -> Result<Vec<sale_line::Model>>
where
    C: ConnectionTrait,
{
    SaleLine::find()
        .filter(sale_line::Column::SaleId.eq(sale_id))
        .order_by_asc(sale_line::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sum of the subtotals of every line of a sale.
pub(crate) fn lines_total(lines: &[sale_line::Model]) -> Decimal {
    lines.iter().map(|l| l.subtotal).sum::<Decimal>().round_dp(2)
}

/// Starts an empty sale for the operator under their open till.
///
/// # Errors
/// `NoOpenTill` if the operator has not opened a till.
pub async fn start_sale(db: &DatabaseConnection, operator: &user::Model) -> Result<sale::Model> {
    let Some(session) = till::current_session(db, operator.id).await? else {
        warn!(operator_id = operator.id, "sale attempted without an open till");
        return Err(Error::NoOpenTill);
    };

    let sale = sale::ActiveModel {
        created_at: Set(chrono::Utc::now()),
        operator_id: Set(Some(operator.id)),
        till_session_id: Set(Some(session.id)),
        total: Set(Decimal::ZERO),
        status: Set(SaleStatus::Open),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(sale_id = sale.id, operator_id = operator.id, "sale started");
    Ok(sale)
}

/// Fails with `Forbidden` unless the sale was started by `operator`.
///
/// A sale belongs to the till session of the operator who started it, so only
/// that operator may add to it or finalize it.
fn ensure_own_sale(sale: &sale::Model, operator: &user::Model, action: &'static str) -> Result<()> {
    if sale.operator_id == Some(operator.id) {
        Ok(())
    } else {
        warn!(sale_id = sale.id, operator_id = operator.id, action, "sale belongs to another operator");
        Err(Error::Forbidden { action })
    }
}

/// Adds `quantity` units of a product to an open sale.
///
/// The line insert, stock decrement and sale total update commit together or not
/// at all. The stock decrement is conditional on enough stock still being there,
/// so two requests racing for the last units cannot both succeed.
///
/// # Errors
/// - `Validation` if `quantity` is less than one, or the line or sale total
///   would not fit in a money column
/// - `NotFound` if the sale or product does not exist
/// - `Forbidden` if the sale was started by another operator
/// - `SaleFinalized` if the sale no longer accepts lines
/// - `InsufficientStock` if the product has fewer than `quantity` units
pub async fn add_line(
    db: &DatabaseConnection,
    sale_id: i64,
    operator: &user::Model,
    product_id: i64,
    quantity: i32,
) -> Result<LineAdded> {
    if quantity < 1 {
        return Err(Error::validation("quantity", "Quantity must be at least 1"));
    }

    let txn = db.begin().await?;

    let sale = find_sale(&txn, sale_id).await?;
    ensure_own_sale(&sale, operator, "add lines to another operator's sale")?;
    if sale.status == SaleStatus::Finalized {
        return Err(Error::SaleFinalized { sale_id });
    }

    let product = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))?;

    if quantity > product.stock {
        warn!(sale_id, product_id, stock = product.stock, quantity, "insufficient stock");
        return Err(insufficient_stock(&product, quantity));
    }

    let (line, sale) = apply_line(&txn, sale, &product, quantity).await?;

    let product = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))?;

    txn.commit().await?;

    info!(
        sale_id,
        product_id,
        quantity,
        subtotal = %line.subtotal,
        total = %sale.total,
        stock_left = product.stock,
        "line added to sale"
    );

    Ok(LineAdded {
        line,
        sale,
        product,
    })
}

fn insufficient_stock(product: &product::Model, quantity: i32) -> Error {
    Error::InsufficientStock {
        product: product.name.clone(),
        available: product.stock,
        requested: quantity,
    }
}

/// Writes one line for `product` as read earlier in the transaction: inserts the
/// snapshot line, decrements stock if enough is still there, and stores the
/// recomputed sale total.
///
/// Any error leaves earlier writes in the transaction uncommitted.
async fn apply_line<C>(
    db: &C,
    sale: sale::Model,
    product: &product::Model,
    quantity: i32,
) -> Result<(sale_line::Model, sale::Model)>
where
    C: ConnectionTrait,
{
    let unit_price = product.price;
    let subtotal = check_money("quantity", (Decimal::from(quantity) * unit_price).round_dp(2))?;

    let line = sale_line::ActiveModel {
        sale_id: Set(sale.id),
        product_id: Set(Some(product.id)),
        product_name: Set(product.name.clone()),
        quantity: Set(quantity),
        unit_price: Set(unit_price),
        subtotal: Set(subtotal),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let decremented = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(product::Column::Id.eq(product.id))
        .filter(product::Column::Stock.gte(quantity))
        .exec(db)
        .await?;
    if decremented.rows_affected == 0 {
        warn!(sale_id = sale.id, product_id = product.id, quantity, "stock taken concurrently");
        return Err(insufficient_stock(product, quantity));
    }

    let lines = find_lines(db, sale.id).await?;
    let total = check_money("quantity", lines_total(&lines))?;
    let mut active: sale::ActiveModel = sale.into();
    active.total = Set(total);
    let sale = active.update(db).await?;

    Ok((line, sale))
}

/// Finalizes a sale, crediting it to the operator's open till session.
///
/// If the till the sale was started under has since been closed and a new one
/// opened, the sale is credited to the new session.
///
/// # Errors
/// - `NotFound` if the sale does not exist
/// - `Forbidden` if the sale was started by another operator
/// - `SaleFinalized` if it was already finalized
/// - `EmptySale` if it has no lines
/// - `NoOpenTill` if the operator has no open till
pub async fn finalize_sale(
    db: &DatabaseConnection,
    sale_id: i64,
    operator: &user::Model,
) -> Result<sale::Model> {
    let txn = db.begin().await?;

    let sale = find_sale(&txn, sale_id).await?;
    ensure_own_sale(&sale, operator, "finalize another operator's sale")?;
    if sale.status == SaleStatus::Finalized {
        return Err(Error::SaleFinalized { sale_id });
    }

    let line_count = SaleLine::find()
        .filter(sale_line::Column::SaleId.eq(sale_id))
        .count(&txn)
        .await?;
    if line_count == 0 {
        warn!(sale_id, "finalize attempted on empty sale");
        return Err(Error::EmptySale { sale_id });
    }

    let Some(session) = till::current_session(&txn, operator.id).await? else {
        warn!(sale_id, operator_id = operator.id, "finalize attempted without an open till");
        return Err(Error::NoOpenTill);
    };

    let mut active: sale::ActiveModel = sale.into();
    active.status = Set(SaleStatus::Finalized);
    active.till_session_id = Set(Some(session.id));
    let sale = active.update(&txn).await?;

    txn.commit().await?;

    info!(sale_id, operator_id = operator.id, total = %sale.total, till_session_id = session.id, "sale finalized");
    Ok(sale)
}

/// Retrieves a sale by ID.
pub async fn get_sale(db: &DatabaseConnection, sale_id: i64) -> Result<sale::Model> {
    find_sale(db, sale_id).await
}

/// Retrieves a sale and its lines.
pub async fn get_sale_detail(db: &DatabaseConnection, sale_id: i64) -> Result<SaleDetail> {
    let sale = find_sale(db, sale_id).await?;
    let lines = find_lines(db, sale_id).await?;
    Ok(SaleDetail { sale, lines })
}

/// Retrieves all sales, newest first.
pub async fn list_sales(db: &DatabaseConnection) -> Result<Vec<sale::Model>> {
    Sale::find()
        .order_by_desc(sale::Column::CreatedAt)
        .order_by_desc(sale::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
