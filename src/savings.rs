use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use libsql::TransactionBehavior;
use time::OffsetDateTime;
use tower_sessions::Session;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::current_user_db;
use crate::database::Db;
use crate::models::{CreateSavingsPayload, SavingsEntry, SavingsResponse, SetSavingsTotalPayload};
use crate::stats::{format_date, savings_total};
use crate::utils::{
    ApiError, db_error, db_error_with_context, log_db_error, normalize_optional, not_found,
    now_timestamp, validate_amount, validate_date, validate_note,
};

pub fn validate_savings_amount(amount: f64) -> Result<(), ApiError> {
    validate_amount(amount, "Savings amount", 0.0)
}

pub fn extract_savings_from_row(row: libsql::Row) -> Result<SavingsEntry, ApiError> {
    let id: String = row
        .get(0)
        .map_err(|_| db_error_with_context("invalid savings data"))?;
    let amount: f64 = row
        .get(1)
        .map_err(|_| db_error_with_context("invalid savings data"))?;
    let date: String = row
        .get(2)
        .map_err(|_| db_error_with_context("invalid savings data"))?;
    let note: Option<String> = row
        .get(3)
        .map_err(|_| db_error_with_context("invalid savings data"))?;

    Ok(SavingsEntry {
        id,
        amount,
        date,
        note,
    })
}

pub async fn fetch_savings(user_db: &Db) -> Result<Vec<SavingsEntry>, ApiError> {
    let conn = user_db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, amount, date, note FROM savings ORDER BY date DESC, created_at DESC",
            (),
        )
        .await
        .map_err(log_db_error("failed to query savings"))?;

    let mut entries = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        entries.push(extract_savings_from_row(row)?);
    }
    Ok(entries)
}

pub async fn insert_savings(
    user_db: &Db,
    payload: &CreateSavingsPayload,
) -> Result<SavingsEntry, ApiError> {
    let amount = payload.amount.value();
    validate_savings_amount(amount)?;
    validate_date(&payload.date)?;
    if let Some(note) = &payload.note {
        validate_note(note.trim())?;
    }

    let entry = SavingsEntry {
        id: Uuid::new_v4().to_string(),
        amount,
        date: payload.date.trim().to_string(),
        note: normalize_optional(payload.note.as_deref()),
    };

    let conn = user_db.write().await;
    conn.execute(
        "INSERT INTO savings (id, amount, date, note, created_at) VALUES (?, ?, ?, ?, ?)",
        (
            entry.id.as_str(),
            entry.amount,
            entry.date.as_str(),
            entry.note.clone(),
            now_timestamp(),
        ),
    )
    .await
    .map_err(log_db_error("savings creation failed"))?;

    Ok(entry)
}

/// Collapses the savings log into a single entry holding `amount`, dated
/// `today`. Delete and insert share one SQL transaction, so readers see
/// either the old entries or the new total.
pub async fn replace_savings_total(
    user_db: &Db,
    amount: f64,
    today: &str,
) -> Result<SavingsEntry, ApiError> {
    validate_savings_amount(amount)?;
    validate_date(today)?;

    let entry = SavingsEntry {
        id: Uuid::new_v4().to_string(),
        amount,
        date: today.to_string(),
        note: None,
    };

    let conn = user_db.write().await;
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .await
        .map_err(log_db_error("failed to begin savings transaction"))?;

    tx.execute("DELETE FROM savings", ())
        .await
        .map_err(log_db_error("failed to clear savings"))?;
    tx.execute(
        "INSERT INTO savings (id, amount, date, note, created_at) VALUES (?, ?, ?, NULL, ?)",
        (
            entry.id.as_str(),
            entry.amount,
            entry.date.as_str(),
            now_timestamp(),
        ),
    )
    .await
    .map_err(log_db_error("failed to store savings total"))?;

    tx.commit()
        .await
        .map_err(log_db_error("failed to commit savings total"))?;

    Ok(entry)
}

pub async fn delete_savings_in_db(user_db: &Db, id: &str) -> Result<(), ApiError> {
    let conn = user_db.write().await;
    let affected_rows = conn
        .execute("DELETE FROM savings WHERE id = ?", [id])
        .await
        .map_err(log_db_error("savings deletion failed"))?;

    if affected_rows == 0 {
        return Err(not_found("Savings entry"));
    }
    Ok(())
}

pub async fn create_savings(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateSavingsPayload>,
) -> Result<(StatusCode, Json<SavingsEntry>), ApiError> {
    let (user, user_db) = current_user_db(&state, &session).await?;
    let entry = insert_savings(&user_db, &payload).await?;

    tracing::debug!(user_id = %user.id, savings_id = %entry.id, "recorded savings entry");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_savings(
    State(state): State<AppState>,
    session: Session,
) -> Result<(StatusCode, Json<SavingsResponse>), ApiError> {
    let (_user, user_db) = current_user_db(&state, &session).await?;
    let entries = fetch_savings(&user_db).await?;
    let total = savings_total(&entries);

    Ok((StatusCode::OK, Json(SavingsResponse { entries, total })))
}

pub async fn set_savings_total(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<SetSavingsTotalPayload>,
) -> Result<(StatusCode, Json<SavingsResponse>), ApiError> {
    let (user, user_db) = current_user_db(&state, &session).await?;
    let today = format_date(OffsetDateTime::now_utc().date());
    let entry = replace_savings_total(&user_db, payload.amount.value(), &today).await?;

    tracing::info!(user_id = %user.id, total = entry.amount, "replaced savings total");
    let total = entry.amount;
    Ok((
        StatusCode::OK,
        Json(SavingsResponse {
            entries: vec![entry],
            total,
        }),
    ))
}

pub async fn delete_savings(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (user, user_db) = current_user_db(&state, &session).await?;
    delete_savings_in_db(&user_db, &id).await?;

    tracing::debug!(user_id = %user.id, savings_id = %id, "deleted savings entry");
    Ok(StatusCode::NO_CONTENT)
}
