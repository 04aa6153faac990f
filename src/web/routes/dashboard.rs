//! Landing page.

use crate::{
    core::dashboard::{self, DashboardStats},
    entities::user,
    web::{
        AppState,
        error::WebError,
        extract::CurrentUser,
        flash::{self, Page},
    },
};
use axum::{Json, extract::State};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub user: user::Model,
    pub stats: DashboardStats,
}

/// GET /
pub async fn show(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Page<DashboardView>>, WebError> {
    let stats = dashboard::dashboard_stats(&state.db, &current.user).await?;
    let view = DashboardView {
        user: current.user.clone(),
        stats,
    };
    flash::page(&state.db, &current, view).await
}
