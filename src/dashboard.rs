use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tower_sessions::Session;

use crate::app::AppState;
use crate::auth::current_user_db;
use crate::budgets::fetch_budgets;
use crate::constants::DASHBOARD_RECENT_TRANSACTIONS;
use crate::database::Db;
use crate::models::{Budget, Ledger, SavingsEntry, Transaction};
use crate::savings::fetch_savings;
use crate::stats::{DashboardStats, TrendPoint, TrendRange, derive_dashboard_stats, trend_series};
use crate::transactions::{fetch_recent_transactions, fetch_transactions};
use crate::utils::ApiError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DashboardResponse {
    pub recent_transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
    pub savings: Vec<SavingsEntry>,
    pub total_balance: f64,
    pub stats: DashboardStats,
}

#[derive(Deserialize, Debug, Default)]
pub struct TrendQuery {
    pub range: Option<TrendRange>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrendResponse {
    pub range: TrendRange,
    pub points: Vec<TrendPoint>,
}

pub async fn load_ledger(user_db: &Db) -> Result<Ledger, ApiError> {
    Ok(Ledger {
        transactions: fetch_transactions(user_db).await?,
        budgets: fetch_budgets(user_db).await?,
        savings: fetch_savings(user_db).await?,
    })
}

pub async fn build_dashboard(
    user_db: &Db,
    now: OffsetDateTime,
) -> Result<DashboardResponse, ApiError> {
    let ledger = load_ledger(user_db).await?;
    let recent_transactions =
        fetch_recent_transactions(user_db, DASHBOARD_RECENT_TRANSACTIONS).await?;
    let stats = derive_dashboard_stats(&ledger, now);

    Ok(DashboardResponse {
        recent_transactions,
        total_balance: stats.total_balance,
        budgets: ledger.budgets,
        savings: ledger.savings,
        stats,
    })
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<(StatusCode, Json<DashboardResponse>), ApiError> {
    let (_user, user_db) = current_user_db(&state, &session).await?;
    let dashboard = build_dashboard(&user_db, OffsetDateTime::now_utc()).await?;
    Ok((StatusCode::OK, Json(dashboard)))
}

pub async fn get_trend(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<TrendQuery>,
) -> Result<(StatusCode, Json<TrendResponse>), ApiError> {
    let (_user, user_db) = current_user_db(&state, &session).await?;
    let range = query.range.unwrap_or_default();
    let transactions = fetch_transactions(&user_db).await?;
    let points = trend_series(&transactions, range, OffsetDateTime::now_utc());

    Ok((StatusCode::OK, Json(TrendResponse { range, points })))
}
