use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use libsql::TransactionBehavior;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::current_user_db;
use crate::constants::MAX_CATEGORY_LENGTH;
use crate::database::Db;
use crate::models::{Budget, BudgetPeriod, CreateBudgetPayload, Ledger, UpdateBudgetPayload};
use crate::stats::{BudgetSummary, BudgetUtilization, budget_summary, budget_utilizations};
use crate::transactions::fetch_transactions;
use crate::utils::{
    ApiError, bad_request, db_error, db_error_with_context, log_db_error, not_found,
    now_timestamp, validate_amount, validate_string_length,
};

const BUDGET_COLUMNS: &str = "id, category, spending_limit, period";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BudgetsResponse {
    pub budgets: Vec<BudgetUtilization>,
    pub summary: BudgetSummary,
}

pub fn validate_budget_category(category: &str) -> Result<(), ApiError> {
    validate_string_length(category, "Budget category", MAX_CATEGORY_LENGTH)
}

pub fn validate_budget_limit(limit: f64) -> Result<(), ApiError> {
    validate_amount(limit, "Budget limit", 0.0)
}

pub fn extract_budget_from_row(row: libsql::Row) -> Result<Budget, ApiError> {
    let id: String = row
        .get(0)
        .map_err(|_| db_error_with_context("invalid budget data"))?;
    let category: String = row
        .get(1)
        .map_err(|_| db_error_with_context("invalid budget data"))?;
    let limit: f64 = row
        .get(2)
        .map_err(|_| db_error_with_context("invalid budget data"))?;
    let period: String = row
        .get(3)
        .map_err(|_| db_error_with_context("invalid budget data"))?;
    let period = period
        .parse::<BudgetPeriod>()
        .map_err(|_| db_error_with_context("invalid budget period"))?;

    Ok(Budget {
        id,
        category,
        limit,
        period,
    })
}

pub async fn fetch_budgets(user_db: &Db) -> Result<Vec<Budget>, ApiError> {
    let conn = user_db.read().await;
    let mut rows = conn
        .query(
            &format!(
                "SELECT {} FROM budgets ORDER BY created_at ASC",
                BUDGET_COLUMNS
            ),
            (),
        )
        .await
        .map_err(log_db_error("failed to query budgets"))?;

    let mut budgets = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        budgets.push(extract_budget_from_row(row)?);
    }
    Ok(budgets)
}

async fn find_budget_by_category(
    conn: &libsql::Connection,
    category: &str,
) -> Result<Option<Budget>, ApiError> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {} FROM budgets WHERE LOWER(category) = LOWER(?) LIMIT 1",
                BUDGET_COLUMNS
            ),
            [category],
        )
        .await
        .map_err(log_db_error("failed to check existing budget"))?;

    match rows.next().await.map_err(|_| db_error())? {
        Some(row) => Ok(Some(extract_budget_from_row(row)?)),
        None => Ok(None),
    }
}

/// Creates a budget, or replaces the one already set for the same category
/// (ASCII case-insensitive). The flag is true when a new row was inserted.
/// Lookup and write share one immediate transaction.
pub async fn upsert_budget(
    user_db: &Db,
    payload: &CreateBudgetPayload,
) -> Result<(Budget, bool), ApiError> {
    validate_budget_category(&payload.category)?;
    let limit = payload.limit.value();
    validate_budget_limit(limit)?;
    let category = payload.category.trim().to_string();

    let conn = user_db.write().await;
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .await
        .map_err(log_db_error("failed to begin budget transaction"))?;

    let (budget, created) = match find_budget_by_category(&tx, &category).await? {
        Some(existing) => {
            tx.execute(
                "UPDATE budgets SET category = ?, spending_limit = ?, period = ? WHERE id = ?",
                (
                    category.as_str(),
                    limit,
                    payload.period.as_str(),
                    existing.id.as_str(),
                ),
            )
            .await
            .map_err(log_db_error("budget update failed"))?;

            let budget = Budget {
                id: existing.id,
                category,
                limit,
                period: payload.period,
            };
            (budget, false)
        }
        None => {
            let budget = Budget {
                id: Uuid::new_v4().to_string(),
                category,
                limit,
                period: payload.period,
            };
            tx.execute(
                "INSERT INTO budgets (id, category, spending_limit, period, created_at) VALUES (?, ?, ?, ?, ?)",
                (
                    budget.id.as_str(),
                    budget.category.as_str(),
                    budget.limit,
                    budget.period.as_str(),
                    now_timestamp(),
                ),
            )
            .await
            .map_err(log_db_error("budget creation failed"))?;
            (budget, true)
        }
    };

    tx.commit()
        .await
        .map_err(log_db_error("failed to commit budget"))?;
    Ok((budget, created))
}

pub async fn update_budget_in_db(
    user_db: &Db,
    id: &str,
    payload: &UpdateBudgetPayload,
) -> Result<Budget, ApiError> {
    if payload.category.is_none() && payload.limit.is_none() && payload.period.is_none() {
        return Err(bad_request(
            "At least one field must be provided for update",
        ));
    }
    if let Some(category) = &payload.category {
        validate_budget_category(category)?;
    }
    let limit = payload.limit.as_ref().map(|l| l.value());
    if let Some(limit) = limit {
        validate_budget_limit(limit)?;
    }

    let conn = user_db.write().await;
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .await
        .map_err(log_db_error("failed to begin budget transaction"))?;

    let mut rows = tx
        .query(
            &format!("SELECT {} FROM budgets WHERE id = ?", BUDGET_COLUMNS),
            [id],
        )
        .await
        .map_err(log_db_error("failed to query budget"))?;
    let existing = match rows.next().await.map_err(|_| db_error())? {
        Some(row) => extract_budget_from_row(row)?,
        None => return Err(not_found("Budget")),
    };

    let category = payload
        .category
        .as_deref()
        .map(|c| c.trim().to_string())
        .unwrap_or(existing.category);

    if let Some(other) = find_budget_by_category(&tx, &category).await? {
        if other.id != existing.id {
            return Err((
                StatusCode::CONFLICT,
                "A budget for this category already exists".to_string(),
            ));
        }
    }

    let updated = Budget {
        id: existing.id,
        category,
        limit: limit.unwrap_or(existing.limit),
        period: payload.period.unwrap_or(existing.period),
    };

    tx.execute(
        "UPDATE budgets SET category = ?, spending_limit = ?, period = ? WHERE id = ?",
        (
            updated.category.as_str(),
            updated.limit,
            updated.period.as_str(),
            updated.id.as_str(),
        ),
    )
    .await
    .map_err(log_db_error("budget update failed"))?;

    tx.commit()
        .await
        .map_err(log_db_error("failed to commit budget"))?;
    Ok(updated)
}

pub async fn delete_budget_in_db(user_db: &Db, id: &str) -> Result<(), ApiError> {
    let conn = user_db.write().await;
    let affected_rows = conn
        .execute("DELETE FROM budgets WHERE id = ?", [id])
        .await
        .map_err(log_db_error("budget deletion failed"))?;

    if affected_rows == 0 {
        return Err(not_found("Budget"));
    }
    Ok(())
}

pub async fn create_budget(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateBudgetPayload>,
) -> Result<(StatusCode, Json<Budget>), ApiError> {
    let (user, user_db) = current_user_db(&state, &session).await?;
    let (budget, created) = upsert_budget(&user_db, &payload).await?;

    tracing::debug!(user_id = %user.id, budget_id = %budget.id, created, "saved budget");
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(budget)))
}

pub async fn get_budgets(
    State(state): State<AppState>,
    session: Session,
) -> Result<(StatusCode, Json<BudgetsResponse>), ApiError> {
    let (_user, user_db) = current_user_db(&state, &session).await?;

    let ledger = Ledger {
        transactions: fetch_transactions(&user_db).await?,
        budgets: fetch_budgets(&user_db).await?,
        savings: Vec::new(),
    };
    let budgets = budget_utilizations(&ledger);
    let summary = budget_summary(&budgets);

    Ok((StatusCode::OK, Json(BudgetsResponse { budgets, summary })))
}

pub async fn update_budget(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBudgetPayload>,
) -> Result<(StatusCode, Json<Budget>), ApiError> {
    let (user, user_db) = current_user_db(&state, &session).await?;
    let budget = update_budget_in_db(&user_db, &id, &payload).await?;

    tracing::debug!(user_id = %user.id, budget_id = %id, "updated budget");
    Ok((StatusCode::OK, Json(budget)))
}

pub async fn delete_budget(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (user, user_db) = current_user_db(&state, &session).await?;
    delete_budget_in_db(&user_db, &id).await?;

    tracing::debug!(user_id = %user.id, budget_id = %id, "deleted budget");
    Ok(StatusCode::NO_CONTENT)
}
