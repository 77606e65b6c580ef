use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tempfile::tempdir;
use time::macros::datetime;
use tokio::runtime::Runtime;
use uuid::Uuid;

use acevia_server::dashboard::load_ledger;
use acevia_server::database::{Db, get_user_db, init_main_db};
use acevia_server::listing::{ListingFilter, paginate};
use acevia_server::models::{
    CreateTransactionPayload, Ledger, ListingQuery, Transaction, TransactionKind,
};
use acevia_server::stats::{TrendRange, derive_dashboard_stats, trend_series};
use acevia_server::transactions::insert_transaction;

const BENCH_TRANSACTION_COUNT: usize = 1000;
const CATEGORIES: [&str; 6] = ["Food", "Transport", "Entertainment", "Shopping", "Healthcare", ""];

fn bench_date(i: usize) -> String {
    format!("2024-{:02}-{:02}", 1 + (i / 28) % 12, 1 + i % 28)
}

fn bench_kind(i: usize) -> TransactionKind {
    if i % 5 == 0 {
        TransactionKind::Income
    } else {
        TransactionKind::Expense
    }
}

fn in_memory_transactions(count: usize) -> Vec<Transaction> {
    (0..count)
        .map(|i| Transaction {
            id: Uuid::new_v4().to_string(),
            amount: 10.0 + (i % 100) as f64,
            category: CATEGORIES[i % CATEGORIES.len()].to_string(),
            date: bench_date(i),
            time: None,
            note: None,
            kind: bench_kind(i),
        })
        .collect()
}

async fn setup_benchmark_db(data_path: &str, count: usize) -> Db {
    let user_id = Uuid::new_v4().to_string();
    init_main_db(data_path).await.unwrap();
    let user_db = get_user_db(data_path, &user_id).await.unwrap();

    for i in 0..count {
        let payload = CreateTransactionPayload {
            amount: (10.0 + (i % 100) as f64).into(),
            category: format!("category_{}", i % 10),
            date: bench_date(i),
            time: None,
            note: None,
            kind: bench_kind(i),
        };
        insert_transaction(&user_db, &payload).await.unwrap();
    }
    user_db
}

fn criterion_benchmark(c: &mut Criterion) {
    let now = datetime!(2024-12-31 12:00 UTC);
    let ledger = Ledger {
        transactions: in_memory_transactions(BENCH_TRANSACTION_COUNT),
        budgets: Vec::new(),
        savings: Vec::new(),
    };

    c.bench_function("derive_dashboard_stats", |b| {
        b.iter(|| black_box(derive_dashboard_stats(black_box(&ledger), now)))
    });

    c.bench_function("trend_series_year", |b| {
        b.iter(|| black_box(trend_series(&ledger.transactions, TrendRange::Year, now)))
    });

    let filter = ListingFilter::from_query(&ListingQuery {
        search: Some("food".to_string()),
        kind: Some("expense".to_string()),
        month: None,
        page: Some(2),
    })
    .unwrap();
    c.bench_function("paginate_filtered", |b| {
        b.iter(|| black_box(paginate(&ledger.transactions, &filter)))
    });

    let rt = Runtime::new().unwrap();
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir.path().to_str().unwrap().to_string();
    let user_db = rt.block_on(setup_benchmark_db(&data_path, BENCH_TRANSACTION_COUNT));

    c.bench_function("load_ledger", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(load_ledger(&user_db).await.unwrap());
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
