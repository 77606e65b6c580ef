// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DEFAULT_LOG_FILTER: &str = "acevia_server=debug,tower_http=info";

// Session configuration
pub const SESSION_NAME: &str = "acevia_session";
pub const DEFAULT_SESSION_EXPIRY_DAYS: i64 = 3;
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;
pub const SESSION_USER_ID_KEY: &str = "user_id";
pub const SESSION_USERNAME_KEY: &str = "username";

// Listing and dashboard
pub const TRANSACTIONS_PER_PAGE: usize = 10;
pub const DASHBOARD_RECENT_TRANSACTIONS: usize = 10;
pub const PERIOD_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_CATEGORY: &str = "Other";
pub const CURRENCY_SYMBOL: &str = "₱";

// Validation limits
pub const MAX_CATEGORY_LENGTH: usize = 100;
pub const MAX_NOTE_LENGTH: usize = 255;
pub const MAX_SEARCH_TERM_LENGTH: usize = 100;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_USERNAME_LENGTH: usize = 4;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MIN_TRANSACTION_AMOUNT: f64 = 0.01;

// Error messages
pub const ERR_DATABASE_ACCESS: &str = "Database access error";
pub const ERR_DATABASE_OPERATION: &str = "Database operation failed";
pub const ERR_UNAUTHORIZED: &str = "Not logged in";
