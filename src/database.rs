use anyhow::Result;
use libsql::{Builder, Connection, TransactionBehavior};
use std::{collections::HashMap, path::Path, sync::Arc};
use tokio::sync::{Mutex, RwLock};

/// Milliseconds a connection waits on a locked database before failing.
pub const BUSY_TIMEOUT_MS: u64 = 5_000;

// Bumped whenever the per-user schema changes.
const USER_SCHEMA_VERSION: i64 = 1;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             TEXT    PRIMARY KEY,
    name           TEXT    UNIQUE NOT NULL,
    password_hash  TEXT    NOT NULL
);
"#;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id          TEXT    PRIMARY KEY,
    amount      REAL    NOT NULL CHECK (amount >= 0),
    category    TEXT    NOT NULL,
    date        TEXT    NOT NULL,
    time        TEXT,
    note        TEXT,
    kind        TEXT    NOT NULL CHECK (kind IN ('income', 'expense')),
    created_at  INTEGER NOT NULL
);
"#;

const CREATE_TRANSACTIONS_DATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions (date DESC, time DESC);";

// No UNIQUE on category: one budget per category is kept by the create path.
const CREATE_BUDGETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS budgets (
    id              TEXT    PRIMARY KEY,
    category        TEXT    NOT NULL,
    spending_limit  REAL    NOT NULL CHECK (spending_limit >= 0),
    period          TEXT    NOT NULL CHECK (period IN ('today', 'week', 'month', 'year')),
    created_at      INTEGER NOT NULL
);
"#;

const CREATE_SAVINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS savings (
    id          TEXT    PRIMARY KEY,
    amount      REAL    NOT NULL CHECK (amount >= 0),
    date        TEXT    NOT NULL,
    note        TEXT,
    created_at  INTEGER NOT NULL
);
"#;

pub type Db = Arc<RwLock<Connection>>;

async fn run_pragma(conn: &Connection, pragma: &str) -> Result<()> {
    let mut rows = conn.query(pragma, ()).await?;
    while rows.next().await?.is_some() {}
    Ok(())
}

/// WAL lets readers proceed alongside a writer; the busy timeout makes a
/// second writer wait for the lock instead of failing with SQLITE_BUSY.
async fn configure_connection(conn: &Connection) -> Result<()> {
    run_pragma(conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS)).await?;
    run_pragma(conn, "PRAGMA journal_mode = WAL").await?;
    Ok(())
}

async fn user_schema_version(conn: &Connection) -> Result<i64> {
    let mut rows = conn.query("PRAGMA user_version", ()).await?;
    match rows.next().await? {
        Some(row) => Ok(row.get::<i64>(0)?),
        None => Ok(0),
    }
}

async fn ensure_user_schema(conn: &Connection) -> Result<()> {
    if user_schema_version(conn).await? >= USER_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .await?;
    tx.execute(CREATE_TRANSACTIONS_TABLE, ()).await?;
    tx.execute(CREATE_TRANSACTIONS_DATE_INDEX, ()).await?;
    tx.execute(CREATE_BUDGETS_TABLE, ()).await?;
    tx.execute(CREATE_SAVINGS_TABLE, ()).await?;
    tx.execute(
        &format!("PRAGMA user_version = {}", USER_SCHEMA_VERSION),
        (),
    )
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Main users registry DB (users.db)
pub async fn init_main_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join("users.db");
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;
    configure_connection(&conn).await?;

    conn.execute(CREATE_USERS_TABLE, ()).await?;
    Ok(Arc::new(RwLock::new(conn)))
}

/// Opens a fresh connection to the per-user DB (user_{id}.db). The schema is
/// only written when the file's `user_version` is behind, so later opens do
/// not take a write lock.
pub async fn get_user_db(data_dir: &str, user_id: &str) -> Result<Db> {
    if user_id.is_empty()
        || !user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        anyhow::bail!("invalid user id for database path: {:?}", user_id);
    }

    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(format!("user_{}.db", user_id));
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;
    configure_connection(&conn).await?;
    ensure_user_schema(&conn).await?;

    Ok(Arc::new(RwLock::new(conn)))
}

/// One shared handle per user for the lifetime of the server, so every
/// request for a user goes through the same `RwLock`.
pub struct UserDatabases {
    data_dir: String,
    handles: Mutex<HashMap<String, Db>>,
}

impl UserDatabases {
    pub fn new(data_dir: impl Into<String>) -> Self {
        UserDatabases {
            data_dir: data_dir.into(),
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn data_dir(&self) -> &str {
        &self.data_dir
    }

    pub async fn get(&self, user_id: &str) -> Result<Db> {
        let mut handles = self.handles.lock().await;
        if let Some(db) = handles.get(user_id) {
            return Ok(db.clone());
        }

        let db = get_user_db(&self.data_dir, user_id).await?;
        handles.insert(user_id.to_string(), db.clone());
        tracing::debug!(user_id, "opened user database");
        Ok(db)
    }

    pub async fn open_count(&self) -> usize {
        self.handles.lock().await.len()
    }
}
