use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::constants::{MAX_SEARCH_TERM_LENGTH, TRANSACTIONS_PER_PAGE};
use crate::models::{ListingQuery, Transaction, TransactionKind, TransactionPage};
use crate::stats::{parse_date, parse_time};
use crate::utils::{ApiError, bad_request};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingFilter {
    pub search: Option<String>,
    pub kind: Option<TransactionKind>,
    pub month: Option<String>,
    pub page: usize,
}

impl ListingFilter {
    pub fn from_query(query: &ListingQuery) -> Result<Self, ApiError> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        if let Some(term) = &search {
            if term.chars().count() > MAX_SEARCH_TERM_LENGTH {
                return Err(bad_request(format!(
                    "Search term must be less than {} characters",
                    MAX_SEARCH_TERM_LENGTH
                )));
            }
        }

        let kind = match query.kind.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(raw.parse::<TransactionKind>().map_err(|e| bad_request(e))?),
        };

        let month = match query.month.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(raw) => {
                if !is_month_key(raw) {
                    return Err(bad_request("Month must be in YYYY-MM format"));
                }
                Some(raw.to_string())
            }
        };

        let page = query.page.unwrap_or(1);
        if page == 0 {
            return Err(bad_request("Page must be at least 1"));
        }

        Ok(ListingFilter {
            search,
            kind,
            month,
            page,
        })
    }

    fn matches(&self, transaction: &Transaction) -> bool {
        let matches_search = self.search.as_deref().is_none_or(|term| {
            transaction.category.to_lowercase().contains(term)
                || transaction
                    .note
                    .as_deref()
                    .is_some_and(|note| note.to_lowercase().contains(term))
        });
        let matches_kind = self.kind.is_none_or(|kind| transaction.kind == kind);
        let matches_month = self
            .month
            .as_deref()
            .is_none_or(|month| month_key(&transaction.date).as_deref() == Some(month));

        matches_search && matches_kind && matches_month
    }
}

fn is_month_key(raw: &str) -> bool {
    match raw.split_once('-') {
        Some((year, month)) => {
            year.len() == 4
                && month.len() == 2
                && year.chars().all(|c| c.is_ascii_digit())
                && month.parse::<u8>().is_ok_and(|m| (1..=12).contains(&m))
        }
        None => false,
    }
}

/// `YYYY-MM` of a transaction date, `None` when the date doesn't parse.
pub fn month_key(date: &str) -> Option<String> {
    parse_date(date).map(|d| format!("{:04}-{:02}", d.year(), u8::from(d.month())))
}

/// Distinct months present in the list, newest first.
pub fn available_months(transactions: &[Transaction]) -> Vec<String> {
    let months: BTreeSet<String> = transactions
        .iter()
        .filter_map(|t| month_key(&t.date))
        .collect();
    months.into_iter().rev().collect()
}

/// Latest first by date then time; a missing time counts as midnight and
/// undated rows sink to the end.
pub fn sort_latest_first(transactions: &mut [Transaction]) {
    transactions.sort_by_key(|t| {
        Reverse((
            parse_date(&t.date),
            t.time.as_deref().and_then(parse_time).unwrap_or(time::Time::MIDNIGHT),
        ))
    });
}

pub fn paginate(transactions: &[Transaction], filter: &ListingFilter) -> TransactionPage {
    let mut filtered: Vec<Transaction> = transactions
        .iter()
        .filter(|t| filter.matches(t))
        .cloned()
        .collect();
    sort_latest_first(&mut filtered);

    let total_count = filtered.len();
    let total_pages = total_count.div_ceil(TRANSACTIONS_PER_PAGE);
    let page_items = filtered
        .into_iter()
        .skip((filter.page - 1).saturating_mul(TRANSACTIONS_PER_PAGE))
        .take(TRANSACTIONS_PER_PAGE)
        .collect();

    TransactionPage {
        transactions: page_items,
        total_count,
        total_pages,
        page: filter.page,
        available_months: available_months(transactions),
    }
}
