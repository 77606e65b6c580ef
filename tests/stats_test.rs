/*!
 * Dashboard Derivation Tests
 *
 * Pure tests for the stats module: balances, period windows, percentage
 * deltas, category spend, budget utilization, savings totals, currency
 * display and chart series. No database involved.
 */

mod common;

use acevia_server::models::{Ledger, TransactionKind};
use acevia_server::stats::*;
use common::*;
use time::macros::datetime;

use TransactionKind::{Expense, Income};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn balance_of_income_and_food_expense() {
    let transactions = vec![
        sample_transaction(100.0, Income, "Salary", "2024-03-10"),
        sample_transaction(40.0, Expense, "Food", "2024-03-10"),
    ];

    assert_close(balance(&transactions), 60.0);
    let spend = category_spend(&transactions);
    assert_eq!(spend.len(), 1);
    assert_close(spend["Food"], 40.0);
}

#[test]
fn balance_equals_income_minus_expense() {
    let transactions = vec![
        sample_transaction(1200.0, Income, "Salary", "2024-01-05"),
        sample_transaction(250.25, Expense, "Food", "2024-01-06"),
        sample_transaction(80.5, Expense, "Transport", "2024-02-01"),
        sample_transaction(19.75, Income, "Refund", "2024-02-03"),
        sample_transaction(400.0, Expense, "Shopping", "2024-02-10"),
    ];

    assert_close(total_income(&transactions), 1219.75);
    assert_close(total_expense(&transactions), 730.75);
    assert_close(
        balance(&transactions),
        total_income(&transactions) - total_expense(&transactions),
    );
}

#[test]
fn empty_list_has_zero_balance() {
    assert_eq!(balance(&[]), 0.0);
    assert!(category_spend(&[]).is_empty());
}

#[test]
fn category_spend_sums_to_total_expense() {
    let transactions = vec![
        sample_transaction(12.5, Expense, "Food", "2024-03-01"),
        sample_transaction(7.5, Expense, "Food", "2024-03-02"),
        sample_transaction(30.0, Expense, "Transport", "2024-03-03"),
        sample_transaction(99.0, Income, "Food", "2024-03-03"),
        sample_transaction(5.0, Expense, "", "2024-03-04"),
        sample_transaction(2.0, Expense, "   ", "2024-03-04"),
    ];

    let spend = category_spend(&transactions);
    let sum: f64 = spend.values().sum();
    assert_close(sum, total_expense(&transactions));
    assert_close(spend["Food"], 20.0);
    assert_close(spend["Transport"], 30.0);
    assert_close(spend["Other"], 7.0);
}

#[test]
fn spending_shares_split_total() {
    let transactions = vec![
        sample_transaction(25.0, Expense, "Food", "2024-03-01"),
        sample_transaction(75.0, Expense, "Shopping", "2024-03-01"),
    ];

    let shares = spending_shares(&category_spend(&transactions));
    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].category, "Food");
    assert_close(shares[0].share, 25.0);
    assert_close(shares[1].share, 75.0);

    let zero = spending_shares(&category_spend(&[sample_transaction(
        0.0, Expense, "Food", "2024-03-01",
    )]));
    assert_eq!(zero[0].share, 0.0);
}

#[test]
fn percentage_change_zero_baseline() {
    assert_eq!(percentage_change(0.0, 0.0), "0.0%");
    assert_eq!(percentage_change(50.0, 0.0), "+100.0%");
    assert_eq!(percentage_change(-20.0, 0.0), "0.0%");
}

#[test]
fn percentage_change_formats_one_decimal_with_sign() {
    assert_eq!(percentage_change(150.0, 100.0), "+50.0%");
    assert_eq!(percentage_change(50.0, 100.0), "-50.0%");
    assert_eq!(percentage_change(0.0, 100.0), "-100.0%");
    assert_eq!(percentage_change(100.0, 100.0), "+0.0%");
    assert_eq!(percentage_change(1.0, 3.0), "-66.7%");
}

#[test]
fn percentage_change_ignores_nan() {
    assert_eq!(percentage_change(f64::NAN, 0.0), "0.0%");
    assert_eq!(percentage_change(10.0, f64::NAN), "+100.0%");
}

#[test]
fn period_comparison_splits_windows() {
    let now = datetime!(2024-03-31 12:00 UTC);
    let transactions = vec![
        sample_transaction(200.0, Income, "Salary", "2024-03-20"),
        sample_transaction(50.0, Expense, "Food", "2024-03-25"),
        sample_transaction(100.0, Income, "Salary", "2024-02-15"),
        sample_transaction(100.0, Expense, "Rent", "2024-02-20"),
        sample_transaction(999.0, Income, "Bonus", "2024-01-01"),
        sample_transaction(999.0, Expense, "Future", "2024-04-05"),
        sample_transaction(999.0, Expense, "Broken", "not-a-date"),
    ];

    let comparison = period_comparison(&transactions, now);
    assert_close(comparison.current.income, 200.0);
    assert_close(comparison.current.expense, 50.0);
    assert_close(comparison.current.balance, 150.0);
    assert_close(comparison.previous.income, 100.0);
    assert_close(comparison.previous.expense, 100.0);
    assert_close(comparison.previous.balance, 0.0);

    let income = comparison.income_change();
    assert_eq!(income.change, "+100.0%");
    assert!(income.positive);

    let expense = comparison.expense_change();
    assert_eq!(expense.change, "-50.0%");
    assert!(expense.positive);

    let balance = comparison.balance_change();
    assert_eq!(balance.change, "+100.0%");
    assert!(balance.positive);
}

#[test]
fn period_window_boundaries() {
    let now = datetime!(2024-03-31 00:00 UTC);
    let transactions = vec![
        // exactly now - 30 days: start of the current window
        sample_transaction(10.0, Income, "A", "2024-03-01"),
        // exactly now - 60 days: start of the previous window
        sample_transaction(20.0, Income, "B", "2024-01-31"),
        // exactly now
        sample_transaction(5.0, Income, "C", "2024-03-31"),
        // one day before the previous window
        sample_transaction(40.0, Income, "D", "2024-01-30"),
    ];

    let comparison = period_comparison(&transactions, now);
    assert_close(comparison.current.income, 15.0);
    assert_close(comparison.previous.income, 20.0);
}

#[test]
fn rising_expenses_are_not_positive() {
    let now = datetime!(2024-03-31 12:00 UTC);
    let transactions = vec![
        sample_transaction(80.0, Expense, "Food", "2024-03-20"),
        sample_transaction(40.0, Expense, "Food", "2024-02-20"),
    ];

    let expense = period_comparison(&transactions, now).expense_change();
    assert_eq!(expense.change, "+100.0%");
    assert!(!expense.positive);
}

#[test]
fn budget_at_exactly_limit_is_not_over() {
    let budget = sample_budget("Food", 40.0);
    let utilization = budget_utilization(&budget, 40.0);

    assert_close(utilization.percentage, 100.0);
    assert!(!utilization.over_budget);
    assert!(!utilization.invalid_limit);
}

#[test]
fn budget_over_limit_is_flagged() {
    let budget = sample_budget("Food", 40.0);
    let utilization = budget_utilization(&budget, 41.0);

    assert_close(utilization.percentage, 102.5);
    assert!(utilization.over_budget);
}

#[test]
fn zero_limit_budget_falls_back() {
    let budget = sample_budget("Food", 0.0);
    let utilization = budget_utilization(&budget, 25.0);

    assert_eq!(utilization.percentage, 0.0);
    assert!(utilization.invalid_limit);
    assert!(!utilization.over_budget);
    assert_close(utilization.spent, 25.0);
}

#[test]
fn budget_utilizations_use_category_spend() {
    let ledger = Ledger {
        transactions: vec![
            sample_transaction(30.0, Expense, "Food", "2024-03-01"),
            sample_transaction(10.0, Expense, "Food", "2024-03-02"),
            sample_transaction(500.0, Income, "Food", "2024-03-02"),
            sample_transaction(60.0, Expense, "Transport", "2024-03-03"),
        ],
        budgets: vec![
            sample_budget("Food", 40.0),
            sample_budget("Transport", 50.0),
            sample_budget("Healthcare", 100.0),
        ],
        savings: Vec::new(),
    };

    let utilizations = budget_utilizations(&ledger);
    assert_eq!(utilizations.len(), 3);
    assert_close(utilizations[0].spent, 40.0);
    assert!(!utilizations[0].over_budget);
    assert_close(utilizations[1].percentage, 120.0);
    assert!(utilizations[1].over_budget);
    assert_eq!(utilizations[2].spent, 0.0);

    let summary = budget_summary(&utilizations);
    assert_close(summary.total_budgeted, 190.0);
    assert_close(summary.total_spent, 100.0);
}

#[test]
fn budget_category_matches_spend_ignoring_case() {
    let ledger = Ledger {
        transactions: vec![
            sample_transaction(25.0, Expense, "Food", "2024-03-01"),
            sample_transaction(15.0, Expense, "FOOD", "2024-03-02"),
            sample_transaction(5.0, Expense, "Foodstuff", "2024-03-02"),
        ],
        budgets: vec![sample_budget("food", 40.0)],
        savings: Vec::new(),
    };

    let utilizations = budget_utilizations(&ledger);
    assert_close(utilizations[0].spent, 40.0);
    assert_close(utilizations[0].percentage, 100.0);
    assert!(!utilizations[0].over_budget);

    let spend = category_spend(&ledger.transactions);
    assert_close(category_spent(&spend, " fOOd "), 40.0);
    assert_close(category_spent(&spend, "Rent"), 0.0);
}

#[test]
fn malformed_amounts_count_as_zero() {
    assert!(parse_amount("abc").is_nan());
    assert!(parse_amount("").is_nan());
    assert_close(parse_amount(" 12.50 "), 12.5);

    let transactions = vec![
        sample_transaction(100.0, Income, "Salary", "2024-03-01"),
        sample_transaction(parse_amount("oops"), Expense, "Food", "2024-03-01"),
    ];
    assert_close(balance(&transactions), 100.0);
    assert_close(category_spend(&transactions)["Food"], 0.0);
    assert_close(savings_total(&[sample_savings(f64::NAN, "2024-03-01")]), 0.0);
}

#[test]
fn savings_total_sums_entries() {
    let entries = vec![
        sample_savings(200.0, "2024-03-01"),
        sample_savings(300.0, "2024-03-05"),
    ];
    assert_close(savings_total(&entries), 500.0);
    assert_eq!(savings_change(500.0).change, "+100.0%");
    assert_eq!(savings_change(0.0).change, "0.0%");
    assert!(savings_change(0.0).positive);
}

#[test]
fn currency_formatting() {
    assert_eq!(format_currency(0.0), "₱0.00");
    assert_eq!(format_currency(1234.5), "₱1,234.50");
    assert_eq!(format_currency(999.999), "₱1,000.00");
    assert_eq!(format_currency(1234567.891), "₱1,234,567.89");
    assert_eq!(format_currency(-42.0), "₱-42.00");
    assert_eq!(format_currency(f64::NAN), "₱0.00");
    assert_eq!(format_currency(f64::INFINITY), "₱0.00");
}

#[test]
fn trend_series_last_seven_days() {
    let now = datetime!(2024-03-31 12:00 UTC);
    let transactions = vec![
        sample_transaction(3.0, Expense, "Food", "2024-03-30"),
        sample_transaction(10.0, Income, "Salary", "2024-03-25"),
        sample_transaction(5.0, Expense, "Food", "2024-03-25"),
        sample_transaction(99.0, Expense, "Old", "2024-03-20"),
    ];

    let points = trend_series(&transactions, TrendRange::SevenDays, now);
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].label, "Mar 25");
    assert_close(points[0].income, 10.0);
    assert_close(points[0].expense, 5.0);
    assert_eq!(points[1].label, "Mar 30");
    assert_close(points[1].expense, 3.0);
}

#[test]
fn trend_series_year_groups_by_month() {
    let now = datetime!(2024-03-31 12:00 UTC);
    let transactions = vec![
        sample_transaction(10.0, Income, "Salary", "2024-03-02"),
        sample_transaction(7.0, Expense, "Food", "2024-01-15"),
        sample_transaction(3.0, Expense, "Food", "2024-01-20"),
        sample_transaction(50.0, Expense, "Food", "2023-12-31"),
    ];

    let points = trend_series(&transactions, TrendRange::Year, now);
    let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["Jan", "Mar"]);
    assert_close(points[0].expense, 10.0);
    assert_close(points[1].income, 10.0);
}

#[test]
fn trend_series_today_uses_time_labels() {
    let now = datetime!(2024-03-31 18:00 UTC);
    let mut with_time = sample_transaction(12.0, Expense, "Food", "2024-03-31");
    with_time.time = Some("09:15".to_string());
    let transactions = vec![
        with_time,
        sample_transaction(4.0, Income, "Gift", "2024-03-31"),
        sample_transaction(1.0, Expense, "Food", "2024-03-30"),
    ];

    let points = trend_series(&transactions, TrendRange::Today, now);
    let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["00:00", "09:15"]);
    assert_close(points[0].income, 4.0);
    assert_close(points[1].expense, 12.0);
}

#[test]
fn trend_month_starts_on_first_day() {
    let now = datetime!(2024-03-31 12:00 UTC);
    assert_eq!(TrendRange::Month.start(now), datetime!(2024-03-01 00:00 UTC));
    assert_eq!(TrendRange::Year.start(now), datetime!(2024-01-01 00:00 UTC));
    assert_eq!(TrendRange::Today.start(now), datetime!(2024-03-31 00:00 UTC));
    assert_eq!(TrendRange::SevenDays.start(now), datetime!(2024-03-24 12:00 UTC));
}

#[test]
fn dashboard_stats_cards() {
    let now = datetime!(2024-03-31 12:00 UTC);
    let ledger = Ledger {
        transactions: vec![
            sample_transaction(1000.0, Income, "Salary", "2024-03-15"),
            sample_transaction(250.0, Expense, "Food", "2024-03-16"),
        ],
        budgets: vec![sample_budget("Food", 200.0)],
        savings: vec![sample_savings(300.0, "2024-03-01")],
    };

    let stats = derive_dashboard_stats(&ledger, now);
    assert_close(stats.total_balance, 750.0);
    assert_close(stats.savings_total, 300.0);
    assert_close(stats.total_spent, 250.0);

    let titles: Vec<&str> = stats.cards.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Total Balance", "Income", "Expenses", "Savings"]);
    assert_eq!(stats.cards[0].display, "₱750.00");
    assert_eq!(stats.cards[0].change, "+100.0%");
    assert_eq!(stats.cards[2].display, "₱250.00");
    assert!(!stats.cards[2].positive);
    assert_eq!(stats.cards[3].display, "₱300.00");

    assert_eq!(stats.budgets.len(), 1);
    assert!(stats.budgets[0].over_budget);
    assert_close(stats.budget_summary.total_budgeted, 200.0);
}
