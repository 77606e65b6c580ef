use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::stats::parse_amount;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
}

#[derive(Deserialize, Debug)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

/// An amount as sent by a client: either a JSON number or a numeric string.
/// Strings that don't parse become NaN and are rejected by validation.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    pub fn value(&self) -> f64 {
        match self {
            AmountInput::Number(n) => *n,
            AmountInput::Text(s) => parse_amount(s),
        }
    }
}

impl From<f64> for AmountInput {
    fn from(value: f64) -> Self {
        AmountInput::Number(value)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("Unknown transaction type: {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub amount: f64,
    pub category: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreateTransactionPayload {
    pub amount: AmountInput,
    pub category: String,
    pub date: String,
    pub time: Option<String>,
    pub note: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

/// Field replacement for an existing transaction. The type is fixed at
/// creation and deliberately absent here.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateTransactionPayload {
    pub amount: Option<AmountInput>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub note: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ListingQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub month: Option<String>,
    pub page: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total_count: usize,
    pub total_pages: usize,
    pub page: usize,
    pub available_months: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Today,
    Week,
    #[default]
    Month,
    Year,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Today => "today",
            BudgetPeriod::Week => "week",
            BudgetPeriod::Month => "month",
            BudgetPeriod::Year => "year",
        }
    }
}

impl FromStr for BudgetPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(BudgetPeriod::Today),
            "week" => Ok(BudgetPeriod::Week),
            "month" => Ok(BudgetPeriod::Month),
            "year" => Ok(BudgetPeriod::Year),
            other => Err(format!("Unknown budget period: {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: String,
    pub category: String,
    pub limit: f64,
    pub period: BudgetPeriod,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreateBudgetPayload {
    pub category: String,
    pub limit: AmountInput,
    pub period: BudgetPeriod,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateBudgetPayload {
    pub category: Option<String>,
    pub limit: Option<AmountInput>,
    pub period: Option<BudgetPeriod>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SavingsEntry {
    pub id: String,
    pub amount: f64,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreateSavingsPayload {
    pub amount: AmountInput,
    pub date: String,
    pub note: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SetSavingsTotalPayload {
    pub amount: AmountInput,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SavingsResponse {
    pub entries: Vec<SavingsEntry>,
    pub total: f64,
}

/// Snapshot of everything one user owns. Derivations in [`crate::stats`]
/// take this by reference instead of reaching into shared state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
    pub savings: Vec<SavingsEntry>,
}
