use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::current_user_db;
use crate::constants::*;
use crate::database::Db;
use crate::listing::{ListingFilter, paginate};
use crate::models::{
    CreateTransactionPayload, ListingQuery, Transaction, TransactionKind, TransactionPage,
    UpdateTransactionPayload,
};
use crate::utils::{
    ApiError, bad_request, db_error, db_error_with_context, log_db_error, normalize_optional,
    not_found, now_timestamp, validate_amount, validate_date, validate_note,
    validate_string_length, validate_time,
};

const TRANSACTION_COLUMNS: &str = "id, amount, category, date, time, note, kind";

pub fn validate_category(category: &str) -> Result<(), ApiError> {
    validate_string_length(category, "Category", MAX_CATEGORY_LENGTH)
}

pub fn validate_transaction_amount(amount: f64, min: f64) -> Result<(), ApiError> {
    validate_amount(amount, "Amount", min)
}

fn validate_optional_fields(time: Option<&str>, note: Option<&str>) -> Result<(), ApiError> {
    if let Some(time) = time.map(str::trim).filter(|t| !t.is_empty()) {
        validate_time(time)?;
    }
    if let Some(note) = note {
        validate_note(note.trim())?;
    }
    Ok(())
}

pub fn extract_transaction_from_row(row: libsql::Row) -> Result<Transaction, ApiError> {
    let invalid = |_: libsql::Error| db_error_with_context("invalid transaction data");

    let id: String = row.get(0).map_err(invalid)?;
    let amount: f64 = row.get(1).map_err(invalid)?;
    let category: String = row.get(2).map_err(invalid)?;
    let date: String = row.get(3).map_err(invalid)?;
    let time: Option<String> = row.get(4).map_err(invalid)?;
    let note: Option<String> = row.get(5).map_err(invalid)?;
    let kind: String = row.get(6).map_err(invalid)?;
    let kind = kind
        .parse::<TransactionKind>()
        .map_err(|_| db_error_with_context("invalid transaction type"))?;

    Ok(Transaction {
        id,
        amount,
        category,
        date,
        time,
        note,
        kind,
    })
}

async fn collect_transactions(mut rows: libsql::Rows) -> Result<Vec<Transaction>, ApiError> {
    let mut transactions = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        transactions.push(extract_transaction_from_row(row)?);
    }
    Ok(transactions)
}

pub async fn insert_transaction(
    user_db: &Db,
    payload: &CreateTransactionPayload,
) -> Result<Transaction, ApiError> {
    let amount = payload.amount.value();
    validate_transaction_amount(amount, MIN_TRANSACTION_AMOUNT)?;
    validate_category(&payload.category)?;
    validate_date(&payload.date)?;
    validate_optional_fields(payload.time.as_deref(), payload.note.as_deref())?;

    let transaction = Transaction {
        id: Uuid::new_v4().to_string(),
        amount,
        category: payload.category.trim().to_string(),
        date: payload.date.trim().to_string(),
        time: normalize_optional(payload.time.as_deref()),
        note: normalize_optional(payload.note.as_deref()),
        kind: payload.kind,
    };

    let conn = user_db.write().await;
    conn.execute(
        "INSERT INTO transactions (id, amount, category, date, time, note, kind, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        libsql::params![
            transaction.id.as_str(),
            transaction.amount,
            transaction.category.as_str(),
            transaction.date.as_str(),
            transaction.time.clone(),
            transaction.note.clone(),
            transaction.kind.as_str(),
            now_timestamp(),
        ],
    )
    .await
    .map_err(log_db_error("transaction creation failed"))?;

    Ok(transaction)
}

/// Every transaction of the user, latest first.
pub async fn fetch_transactions(user_db: &Db) -> Result<Vec<Transaction>, ApiError> {
    let conn = user_db.read().await;
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM transactions ORDER BY date DESC, time DESC, created_at DESC",
                TRANSACTION_COLUMNS
            ),
            (),
        )
        .await
        .map_err(log_db_error("failed to query transactions"))?;
    collect_transactions(rows).await
}

pub async fn fetch_recent_transactions(
    user_db: &Db,
    limit: usize,
) -> Result<Vec<Transaction>, ApiError> {
    let conn = user_db.read().await;
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM transactions ORDER BY created_at DESC, date DESC LIMIT ?",
                TRANSACTION_COLUMNS
            ),
            [limit as i64],
        )
        .await
        .map_err(log_db_error("failed to query recent transactions"))?;
    collect_transactions(rows).await
}

pub async fn fetch_transaction(user_db: &Db, id: &str) -> Result<Transaction, ApiError> {
    let conn = user_db.read().await;
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS),
            [id],
        )
        .await
        .map_err(log_db_error("failed to query transaction"))?;

    match rows.next().await.map_err(|_| db_error())? {
        Some(row) => extract_transaction_from_row(row),
        None => Err(not_found("Transaction")),
    }
}

/// Replaces the provided fields. An empty `time` or `note` clears it.
pub async fn update_transaction_in_db(
    user_db: &Db,
    id: &str,
    payload: &UpdateTransactionPayload,
) -> Result<Transaction, ApiError> {
    if payload.amount.is_none()
        && payload.category.is_none()
        && payload.date.is_none()
        && payload.time.is_none()
        && payload.note.is_none()
    {
        return Err(bad_request(
            "At least one field must be provided for update",
        ));
    }

    let amount = payload.amount.as_ref().map(|a| a.value());
    if let Some(amount) = amount {
        validate_transaction_amount(amount, 0.0)?;
    }
    if let Some(category) = &payload.category {
        validate_category(category)?;
    }
    if let Some(date) = &payload.date {
        validate_date(date)?;
    }
    validate_optional_fields(payload.time.as_deref(), payload.note.as_deref())?;

    let existing = fetch_transaction(user_db, id).await?;

    let updated = Transaction {
        id: existing.id,
        amount: amount.unwrap_or(existing.amount),
        category: payload
            .category
            .as_deref()
            .map(|c| c.trim().to_string())
            .unwrap_or(existing.category),
        date: payload
            .date
            .as_deref()
            .map(|d| d.trim().to_string())
            .unwrap_or(existing.date),
        time: match payload.time.as_deref() {
            Some(time) => normalize_optional(Some(time)),
            None => existing.time,
        },
        note: match payload.note.as_deref() {
            Some(note) => normalize_optional(Some(note)),
            None => existing.note,
        },
        kind: existing.kind,
    };

    let conn = user_db.write().await;
    let affected_rows = conn
        .execute(
            "UPDATE transactions SET amount = ?, category = ?, date = ?, time = ?, note = ? WHERE id = ?",
            libsql::params![
                updated.amount,
                updated.category.as_str(),
                updated.date.as_str(),
                updated.time.clone(),
                updated.note.clone(),
                updated.id.as_str(),
            ],
        )
        .await
        .map_err(log_db_error("transaction update failed"))?;

    if affected_rows == 0 {
        return Err(not_found("Transaction"));
    }

    Ok(updated)
}

pub async fn delete_transaction_in_db(user_db: &Db, id: &str) -> Result<(), ApiError> {
    let conn = user_db.write().await;
    let affected_rows = conn
        .execute("DELETE FROM transactions WHERE id = ?", [id])
        .await
        .map_err(log_db_error("transaction deletion failed"))?;

    if affected_rows == 0 {
        return Err(not_found("Transaction"));
    }
    Ok(())
}

pub async fn create_transaction(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateTransactionPayload>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let (user, user_db) = current_user_db(&state, &session).await?;
    let transaction = insert_transaction(&user_db, &payload).await?;

    tracing::debug!(user_id = %user.id, transaction_id = %transaction.id, kind = %transaction.kind, "created transaction");
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn get_transactions(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListingQuery>,
) -> Result<(StatusCode, Json<TransactionPage>), ApiError> {
    let filter = ListingFilter::from_query(&query)?;
    let (_user, user_db) = current_user_db(&state, &session).await?;

    let transactions = fetch_transactions(&user_db).await?;
    Ok((StatusCode::OK, Json(paginate(&transactions, &filter))))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let (_user, user_db) = current_user_db(&state, &session).await?;
    let transaction = fetch_transaction(&user_db, &id).await?;
    Ok((StatusCode::OK, Json(transaction)))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTransactionPayload>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let (user, user_db) = current_user_db(&state, &session).await?;
    let transaction = update_transaction_in_db(&user_db, &id, &payload).await?;

    tracing::debug!(user_id = %user.id, transaction_id = %id, "updated transaction");
    Ok((StatusCode::OK, Json(transaction)))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (user, user_db) = current_user_db(&state, &session).await?;
    delete_transaction_in_db(&user_db, &id).await?;

    tracing::debug!(user_id = %user.id, transaction_id = %id, "deleted transaction");
    Ok(StatusCode::NO_CONTENT)
}
