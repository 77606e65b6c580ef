//! Dashboard derivations over a [`Ledger`] snapshot.
//!
//! Everything here is pure: callers pass the records and the reference
//! instant, nothing touches the database or the clock. Non-finite amounts
//! count as zero, and every division has a fixed fallback instead of an error.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use time::{Date, Duration, OffsetDateTime, Time, macros::format_description};

use crate::constants::{CURRENCY_SYMBOL, DEFAULT_CATEGORY, PERIOD_WINDOW_DAYS};
use crate::models::{Budget, BudgetPeriod, Ledger, SavingsEntry, Transaction, TransactionKind};

/// Parses a user-supplied amount. Anything that isn't a number yields NaN,
/// which the derivations below treat as zero.
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Option<Time> {
    let raw = raw.trim();
    Time::parse(raw, format_description!("[hour]:[minute]"))
        .or_else(|_| Time::parse(raw, format_description!("[hour]:[minute]:[second]")))
        .ok()
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// Transactions are dated at midnight UTC of their calendar day.
fn transaction_instant(transaction: &Transaction) -> Option<OffsetDateTime> {
    parse_date(&transaction.date).map(|date| date.midnight().assume_utc())
}

pub fn sum_by_kind(transactions: &[Transaction], kind: TransactionKind) -> f64 {
    transactions
        .iter()
        .filter(|t| t.kind == kind)
        .map(|t| finite_or_zero(t.amount))
        .sum()
}

pub fn total_income(transactions: &[Transaction]) -> f64 {
    sum_by_kind(transactions, TransactionKind::Income)
}

pub fn total_expense(transactions: &[Transaction]) -> f64 {
    sum_by_kind(transactions, TransactionKind::Expense)
}

pub fn balance(transactions: &[Transaction]) -> f64 {
    total_income(transactions) - total_expense(transactions)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct PeriodTotals {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

impl PeriodTotals {
    fn from_transactions<'a>(transactions: impl Iterator<Item = &'a Transaction>) -> Self {
        let mut totals = PeriodTotals::default();
        for t in transactions {
            let amount = finite_or_zero(t.amount);
            match t.kind {
                TransactionKind::Income => totals.income += amount,
                TransactionKind::Expense => totals.expense += amount,
            }
        }
        totals.balance = totals.income - totals.expense;
        totals
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChangeIndicator {
    pub change: String,
    pub positive: bool,
}

/// Totals for the last 30 days against the 30 days before that.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PeriodComparison {
    pub current: PeriodTotals,
    pub previous: PeriodTotals,
}

impl PeriodComparison {
    pub fn income_change(&self) -> ChangeIndicator {
        ChangeIndicator {
            change: percentage_change(self.current.income, self.previous.income),
            positive: self.current.income >= self.previous.income,
        }
    }

    /// Spending less than before is the good direction.
    pub fn expense_change(&self) -> ChangeIndicator {
        ChangeIndicator {
            change: percentage_change(self.current.expense, self.previous.expense),
            positive: self.current.expense <= self.previous.expense,
        }
    }

    pub fn balance_change(&self) -> ChangeIndicator {
        ChangeIndicator {
            change: percentage_change(self.current.balance, self.previous.balance),
            positive: self.current.balance >= self.previous.balance,
        }
    }
}

/// Current window is `[now - 30d, now]`, previous is `[now - 60d, now - 30d)`.
/// Transactions with an unparseable date fall in neither.
pub fn period_comparison(transactions: &[Transaction], now: OffsetDateTime) -> PeriodComparison {
    let window = Duration::days(PERIOD_WINDOW_DAYS);
    let current_start = now - window;
    let previous_start = now - window * 2;

    let dated: Vec<(OffsetDateTime, &Transaction)> = transactions
        .iter()
        .filter_map(|t| transaction_instant(t).map(|at| (at, t)))
        .collect();

    let current = PeriodTotals::from_transactions(
        dated
            .iter()
            .filter(|(at, _)| *at >= current_start && *at <= now)
            .map(|(_, t)| *t),
    );
    let previous = PeriodTotals::from_transactions(
        dated
            .iter()
            .filter(|(at, _)| *at >= previous_start && *at < current_start)
            .map(|(_, t)| *t),
    );

    PeriodComparison { current, previous }
}

/// One-decimal percentage delta with an explicit `+` for non-negative values.
/// A zero baseline gives `+100.0%` when something appeared, `0.0%` otherwise.
pub fn percentage_change(current: f64, previous: f64) -> String {
    let current = finite_or_zero(current);
    let previous = finite_or_zero(previous);

    if previous == 0.0 {
        return if current > 0.0 {
            "+100.0%".to_string()
        } else {
            "0.0%".to_string()
        };
    }

    let change = (current - previous) / previous * 100.0;
    let sign = if change >= 0.0 { "+" } else { "" };
    format!("{}{:.1}%", sign, change)
}

pub fn category_key(category: &str) -> &str {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        DEFAULT_CATEGORY
    } else {
        trimmed
    }
}

/// Expense totals per category, blank categories collected under "Other".
pub fn category_spend(transactions: &[Transaction]) -> BTreeMap<String, f64> {
    let mut spend = BTreeMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
    {
        *spend
            .entry(category_key(&t.category).to_string())
            .or_insert(0.0) += finite_or_zero(t.amount);
    }
    spend
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub amount: f64,
    pub share: f64,
}

pub fn spending_shares(spend: &BTreeMap<String, f64>) -> Vec<CategoryShare> {
    let total: f64 = spend.values().sum();
    spend
        .iter()
        .map(|(category, amount)| CategoryShare {
            category: category.clone(),
            amount: *amount,
            share: if total > 0.0 { amount / total * 100.0 } else { 0.0 },
        })
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BudgetUtilization {
    pub id: String,
    pub category: String,
    pub limit: f64,
    pub period: BudgetPeriod,
    pub spent: f64,
    pub percentage: f64,
    pub over_budget: bool,
    pub invalid_limit: bool,
}

/// Exactly 100% is still within budget. A zero or non-finite limit reports
/// 0% and is flagged rather than dividing.
pub fn budget_utilization(budget: &Budget, spent: f64) -> BudgetUtilization {
    let spent = finite_or_zero(spent);
    let invalid_limit = !(budget.limit.is_finite() && budget.limit > 0.0);
    let percentage = if invalid_limit {
        0.0
    } else {
        spent / budget.limit * 100.0
    };

    BudgetUtilization {
        id: budget.id.clone(),
        category: budget.category.clone(),
        limit: finite_or_zero(budget.limit),
        period: budget.period,
        spent,
        percentage,
        over_budget: percentage > 100.0,
        invalid_limit,
    }
}

/// Spend counted against a budget. Category names match ignoring ASCII case,
/// the same rule that keeps one budget per category in the store.
pub fn category_spent(spend: &BTreeMap<String, f64>, category: &str) -> f64 {
    let key = category_key(category);
    spend
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, amount)| amount)
        .sum()
}

pub fn budget_utilizations(ledger: &Ledger) -> Vec<BudgetUtilization> {
    let spend = category_spend(&ledger.transactions);
    ledger
        .budgets
        .iter()
        .map(|budget| {
            budget_utilization(budget, category_spent(&spend, &budget.category))
        })
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct BudgetSummary {
    pub total_budgeted: f64,
    pub total_spent: f64,
}

pub fn budget_summary(utilizations: &[BudgetUtilization]) -> BudgetSummary {
    BudgetSummary {
        total_budgeted: utilizations.iter().map(|u| u.limit).sum(),
        total_spent: utilizations.iter().map(|u| u.spent).sum(),
    }
}

pub fn savings_total(savings: &[SavingsEntry]) -> f64 {
    savings.iter().map(|s| finite_or_zero(s.amount)).sum()
}

/// Savings have no history to compare against, so any balance reads as growth.
pub fn savings_change(total: f64) -> ChangeIndicator {
    ChangeIndicator {
        change: if finite_or_zero(total) > 0.0 {
            "+100.0%".to_string()
        } else {
            "0.0%".to_string()
        },
        positive: true,
    }
}

/// Renders `₱1,234.56`. Non-finite values render as `₱0.00`.
pub fn format_currency(amount: f64) -> String {
    let amount = finite_or_zero(amount);
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}{}.{}", CURRENCY_SYMBOL, sign, grouped, fraction)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SummaryCard {
    pub title: String,
    pub amount: f64,
    pub display: String,
    pub change: String,
    pub positive: bool,
}

impl SummaryCard {
    fn new(title: &str, amount: f64, indicator: ChangeIndicator) -> Self {
        SummaryCard {
            title: title.to_string(),
            amount,
            display: format_currency(amount),
            change: indicator.change,
            positive: indicator.positive,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_balance: f64,
    pub total_income: f64,
    pub total_expense: f64,
    pub savings_total: f64,
    pub period: PeriodComparison,
    pub cards: Vec<SummaryCard>,
    pub category_spend: Vec<CategoryShare>,
    pub total_spent: f64,
    pub budgets: Vec<BudgetUtilization>,
    pub budget_summary: BudgetSummary,
}

pub fn derive_dashboard_stats(ledger: &Ledger, now: OffsetDateTime) -> DashboardStats {
    let total_income = total_income(&ledger.transactions);
    let total_expense = total_expense(&ledger.transactions);
    let total_balance = total_income - total_expense;
    let savings_total = savings_total(&ledger.savings);
    let period = period_comparison(&ledger.transactions, now);

    let cards = vec![
        SummaryCard::new("Total Balance", total_balance, period.balance_change()),
        SummaryCard::new("Income", total_income, period.income_change()),
        SummaryCard::new("Expenses", total_expense, period.expense_change()),
        SummaryCard::new("Savings", savings_total, savings_change(savings_total)),
    ];

    let spend = category_spend(&ledger.transactions);
    let total_spent = spend.values().sum();
    let budgets = budget_utilizations(ledger);
    let budget_summary = budget_summary(&budgets);

    DashboardStats {
        total_balance,
        total_income,
        total_expense,
        savings_total,
        period,
        cards,
        category_spend: spending_shares(&spend),
        total_spent,
        budgets,
        budget_summary,
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendRange {
    #[serde(rename = "today")]
    Today,
    #[default]
    #[serde(rename = "7days")]
    SevenDays,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "year")]
    Year,
}

impl TrendRange {
    pub fn start(&self, now: OffsetDateTime) -> OffsetDateTime {
        let today = now.date();
        let start_date = match self {
            TrendRange::Today => today,
            TrendRange::SevenDays => return now - Duration::days(7),
            TrendRange::Month => today - Duration::days(i64::from(now.day()) - 1),
            TrendRange::Year => today - Duration::days(i64::from(now.ordinal()) - 1),
        };
        start_date.midnight().assume_offset(now.offset())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub label: String,
    pub income: f64,
    pub expense: f64,
}

fn trend_label(range: TrendRange, date: Date, time: Option<Time>) -> String {
    let formatted = match range {
        TrendRange::Today => time
            .unwrap_or(Time::MIDNIGHT)
            .format(format_description!("[hour]:[minute]")),
        TrendRange::Year => date.format(format_description!("[month repr:short]")),
        TrendRange::SevenDays | TrendRange::Month => {
            date.format(format_description!("[month repr:short] [day padding:none]"))
        }
    };
    formatted.unwrap_or_else(|_| format_date(date))
}

/// Income and expense per chart bucket since the start of `range`, oldest
/// bucket first.
pub fn trend_series(
    transactions: &[Transaction],
    range: TrendRange,
    now: OffsetDateTime,
) -> Vec<TrendPoint> {
    let start = range.start(now);

    let mut dated: Vec<(Date, Option<Time>, &Transaction)> = transactions
        .iter()
        .filter_map(|t| {
            let date = parse_date(&t.date)?;
            (date.midnight().assume_utc() >= start)
                .then(|| (date, t.time.as_deref().and_then(parse_time), t))
        })
        .collect();
    dated.sort_by_key(|(date, time, _)| (*date, time.unwrap_or(Time::MIDNIGHT)));

    let mut points: Vec<TrendPoint> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (date, time, t) in dated {
        let label = trend_label(range, date, time);
        let slot = *index.entry(label.clone()).or_insert_with(|| {
            points.push(TrendPoint {
                label,
                income: 0.0,
                expense: 0.0,
            });
            points.len() - 1
        });
        let amount = finite_or_zero(t.amount);
        match t.kind {
            TransactionKind::Income => points[slot].income += amount,
            TransactionKind::Expense => points[slot].expense += amount,
        }
    }
    points
}
