use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};

use crate::config::Config;
use crate::constants::SESSION_NAME;
use crate::database::{Db, UserDatabases};
use crate::{auth, budgets, dashboard, savings, transactions};

#[derive(Clone)]
pub struct AppState {
    pub main_db: Db,
    pub user_dbs: Arc<UserDatabases>,
}

impl AppState {
    pub fn new(main_db: Db, data_path: impl Into<String>) -> Self {
        AppState {
            main_db,
            user_dbs: Arc::new(UserDatabases::new(data_path)),
        }
    }
}

fn cors_layer(origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    match origin {
        Some(origin) => Ok(layer
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_credentials(true)),
        None => Ok(layer),
    }
}

pub fn build_router(state: AppState, config: &Config) -> anyhow::Result<Router> {
    let store = MemoryStore::default();
    // TODO: move to a persistent session store; MemoryStore loses sessions on
    // restart and never evicts expired ones.

    let key = Key::try_from(config.session_secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid session secret: {}", e))?;
    let session_layer = SessionManagerLayer::new(store)
        .with_secure(false)
        .with_name(SESSION_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(
            config.session_expiry_days,
        )))
        .with_signed(key);

    let app = Router::new()
        .route("/", get(root))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route(
            "/transactions",
            post(transactions::create_transaction).get(transactions::get_transactions),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .route(
            "/budgets",
            post(budgets::create_budget).get(budgets::get_budgets),
        )
        .route(
            "/budgets/{id}",
            put(budgets::update_budget).delete(budgets::delete_budget),
        )
        .route(
            "/savings",
            post(savings::create_savings).get(savings::get_savings),
        )
        .route("/savings/total", put(savings::set_savings_total))
        .route("/savings/{id}", delete(savings::delete_savings))
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/dashboard/trend", get(dashboard::get_trend))
        .layer(session_layer)
        .layer(cors_layer(config.cors_origin.as_deref())?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

async fn root() -> &'static str {
    "Acevia server"
}
