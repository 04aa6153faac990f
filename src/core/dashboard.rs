//! Dashboard statistics - read-only counters for the landing page.

use crate::{
    core::till,
    entities::{Product, Sale, product, sale, sale::SaleStatus, user},
    errors::Result,
};
use chrono::{DateTime, Days, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, prelude::*};
use serde::Serialize;

/// Counters shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_products: u64,
    pub out_of_stock: u64,
    /// Finalized sales today (UTC)
    pub sales_today: u64,
    /// Sum of today's finalized sales
    pub revenue_today: Decimal,
    /// Whether the requesting user has an open till
    pub till_open: bool,
}

/// Start and end of the UTC day containing `now`.
fn day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let start = today.and_time(NaiveTime::MIN).and_utc();
    let end = today
        .checked_add_days(Days::new(1))
        .unwrap_or(today)
        .and_time(NaiveTime::MIN)
        .and_utc();
    (start, end)
}

/// Computes the dashboard counters for the given user.
pub async fn dashboard_stats(db: &DatabaseConnection, user: &user::Model) -> Result<DashboardStats> {
    let total_products = Product::find().count(db).await?;
    let out_of_stock = Product::find()
        .filter(product::Column::Stock.eq(0))
        .count(db)
        .await?;

    let (start, end) = day_bounds(Utc::now());
    let sales = Sale::find()
        .filter(sale::Column::Status.eq(SaleStatus::Finalized))
        .filter(sale::Column::CreatedAt.gte(start))
        .filter(sale::Column::CreatedAt.lt(end))
        .all(db)
        .await?;

    Ok(DashboardStats {
        total_products,
        out_of_stock,
        sales_today: sales.len() as u64,
        revenue_today: sales.iter().map(|s| s.total).sum::<Decimal>().round_dp(2),
        till_open: till::is_open(db, user.id).await?,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::sale as sales;
    use crate::test_utils::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 17, 45, 0).unwrap();
        let (start, end) = day_bounds(now);
        assert_eq!(start.to_rfc3339(), "2024-03-09T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-03-10T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_dashboard_stats() -> Result<()> {
        let db = setup_test_db().await?;
        let ana = create_test_employee(&db, "ana").await?;
        let soda = create_custom_product(&db, "Soda", Decimal::new(1000, 2), 5).await?;
        create_custom_product(&db, "Gum", Decimal::new(100, 2), 0).await?;

        let empty = dashboard_stats(&db, &ana).await?;
        assert_eq!(empty.total_products, 2);
        assert_eq!(empty.out_of_stock, 1);
        assert_eq!(empty.sales_today, 0);
        assert_eq!(empty.revenue_today, Decimal::ZERO);
        assert!(!empty.till_open);

        till::open_till(&db, &ana, Decimal::new(100, 0), None).await?;
        let sale = sales::start_sale(&db, &ana).await?;
        sales::add_line(&db, sale.id, &ana, soda.id, 5).await?;
        sales::finalize_sale(&db, sale.id, &ana).await?;
        // Open sale does not count as revenue
        sales::start_sale(&db, &ana).await?;

        let stats = dashboard_stats(&db, &ana).await?;
        assert_eq!(stats.out_of_stock, 2);
        assert_eq!(stats.sales_today, 1);
        assert_eq!(stats.revenue_today, Decimal::new(5000, 2));
        assert!(stats.till_open);
        Ok(())
    }
}
