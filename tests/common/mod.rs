#![allow(dead_code)]

use acevia_server::database::{Db, get_user_db, init_main_db};
use acevia_server::models::{
    Budget, BudgetPeriod, CreateBudgetPayload, CreateSavingsPayload, CreateTransactionPayload,
    SavingsEntry, Transaction, TransactionKind,
};
use acevia_server::{budgets, savings, transactions};
use tempfile::{TempDir, tempdir};
use uuid::Uuid;

pub async fn setup_test_environment() -> (String, String, TempDir) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir
        .path()
        .to_str()
        .expect("Failed to convert path to string")
        .to_string();
    let user_id = Uuid::new_v4().to_string();

    init_main_db(&data_path)
        .await
        .unwrap_or_else(|e| panic!("Failed to initialize main database at {}: {}", data_path, e));

    get_user_db(&data_path, &user_id).await.unwrap_or_else(|e| {
        panic!(
            "Failed to initialize user database for user {} at {}: {}",
            user_id, data_path, e
        )
    });

    (data_path, user_id, temp_dir)
}

pub async fn open_user_db(data_path: &str, user_id: &str) -> Db {
    get_user_db(data_path, user_id)
        .await
        .unwrap_or_else(|e| panic!("Failed to get user database for {}: {}", user_id, e))
}

pub fn transaction_payload(
    amount: f64,
    kind: TransactionKind,
    category: &str,
    date: &str,
) -> CreateTransactionPayload {
    CreateTransactionPayload {
        amount: amount.into(),
        category: category.to_string(),
        date: date.to_string(),
        time: None,
        note: None,
        kind,
    }
}

pub async fn create_test_transaction(
    user_db: &Db,
    amount: f64,
    kind: TransactionKind,
    category: &str,
    date: &str,
) -> Transaction {
    transactions::insert_transaction(user_db, &transaction_payload(amount, kind, category, date))
        .await
        .unwrap_or_else(|(_, msg)| {
            panic!(
                "Failed to insert test transaction '{}' on {}: {}",
                category, date, msg
            )
        })
}

pub async fn create_test_budget(
    user_db: &Db,
    category: &str,
    limit: f64,
    period: BudgetPeriod,
) -> Budget {
    let payload = CreateBudgetPayload {
        category: category.to_string(),
        limit: limit.into(),
        period,
    };
    budgets::upsert_budget(user_db, &payload)
        .await
        .map(|(budget, _)| budget)
        .unwrap_or_else(|(_, msg)| panic!("Failed to insert test budget '{}': {}", category, msg))
}

pub async fn create_test_savings(user_db: &Db, amount: f64, date: &str) -> SavingsEntry {
    let payload = CreateSavingsPayload {
        amount: amount.into(),
        date: date.to_string(),
        note: None,
    };
    savings::insert_savings(user_db, &payload)
        .await
        .unwrap_or_else(|(_, msg)| panic!("Failed to insert test savings entry: {}", msg))
}

/// In-memory transaction for the pure derivation tests.
pub fn sample_transaction(
    amount: f64,
    kind: TransactionKind,
    category: &str,
    date: &str,
) -> Transaction {
    Transaction {
        id: Uuid::new_v4().to_string(),
        amount,
        category: category.to_string(),
        date: date.to_string(),
        time: None,
        note: None,
        kind,
    }
}

pub fn sample_budget(category: &str, limit: f64) -> Budget {
    Budget {
        id: Uuid::new_v4().to_string(),
        category: category.to_string(),
        limit,
        period: BudgetPeriod::Month,
    }
}

pub fn sample_savings(amount: f64, date: &str) -> SavingsEntry {
    SavingsEntry {
        id: Uuid::new_v4().to_string(),
        amount,
        date: date.to_string(),
        note: None,
    }
}
