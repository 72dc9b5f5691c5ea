use crate::snapshot::{CustomerPage, CustomerRecord, SnapshotTime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Activity figures the listing filters on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub txn_count: u32,
    /// Whole days between the first and last dated transaction
    pub days_window: i64,
    /// Sum of the positive transaction amounts
    pub total_spend: f64,
}

impl CustomerStats {
    pub fn from_record(record: &CustomerRecord) -> Self {
        let raw = record.raw_transactions();
        let instants: Vec<DateTime<Utc>> = raw.iter().filter_map(entry_instant).collect();
        let days_window = match (instants.iter().min(), instants.iter().max()) {
            (Some(first), Some(last)) => (*last - *first).num_days(),
            _ => 0,
        };
        let total_spend = raw
            .iter()
            .filter_map(|entry| entry.get("transactionAmount").and_then(Value::as_f64))
            .filter(|amount| *amount > 0.0)
            .sum();

        Self {
            txn_count: u32::try_from(raw.len()).unwrap_or(u32::MAX),
            days_window,
            total_spend,
        }
    }
}

/// Minimums a customer must reach to be listed. Unset or zero means no limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFilter {
    pub min_transactions: Option<u32>,
    pub min_days_window: Option<i64>,
    pub min_total_spend: Option<f64>,
}

impl CustomerFilter {
    pub fn matches(&self, stats: &CustomerStats) -> bool {
        if let Some(min) = self.min_transactions.filter(|min| *min > 0) {
            if stats.txn_count < min {
                return false;
            }
        }
        if let Some(min) = self.min_days_window.filter(|min| *min > 0) {
            if stats.days_window < min {
                return false;
            }
        }
        if let Some(min) = self.min_total_spend.filter(|min| *min > 0.0) {
            if stats.total_spend < min {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    /// Query parameters for the `/customers` endpoint, set filters only
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(min) = self.min_transactions.filter(|min| *min > 0) {
            pairs.push(("minTransactions", min.to_string()));
        }
        if let Some(min) = self.min_days_window.filter(|min| *min > 0) {
            pairs.push(("minDaysWindow", min.to_string()));
        }
        if let Some(min) = self.min_total_spend.filter(|min| *min > 0.0) {
            pairs.push(("minTotalSpend", min.to_string()));
        }
        pairs
    }
}

/// A 1-based page of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size,
        }
    }

    pub fn total_pages(&self, total: usize) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        let pages = total.div_ceil(self.page_size as usize);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// `minTransactions=..&page=..&pageSize=..` as sent to the listing endpoint
pub fn query_string(filter: &CustomerFilter, page: PageRequest) -> String {
    let mut pairs = filter.query_pairs();
    pairs.push(("page", page.page.to_string()));
    pairs.push(("pageSize", page.page_size.to_string()));
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Filter, order and paginate an in-memory listing.
///
/// Each selected customer has its transactions sorted chronologically;
/// entries without a readable date keep their relative order at the end.
pub fn select_page(
    customers: Vec<CustomerRecord>,
    filter: &CustomerFilter,
    page: PageRequest,
) -> CustomerPage {
    let matching: Vec<CustomerRecord> = customers
        .into_iter()
        .filter(|record| filter.matches(&CustomerStats::from_record(record)))
        .collect();

    let total_pages = page.total_pages(matching.len());
    let start = (page.page.max(1) as usize - 1).saturating_mul(page.page_size as usize);
    let data = matching
        .into_iter()
        .skip(start)
        .take(page.page_size as usize)
        .map(sort_transactions)
        .collect();

    CustomerPage { data, total_pages }
}

fn sort_transactions(mut record: CustomerRecord) -> CustomerRecord {
    if let Value::Array(entries) = &mut record.transactions {
        entries.sort_by_cached_key(|entry| {
            let at = entry_instant(entry);
            (at.is_none(), at)
        });
    }
    record
}

fn entry_instant(entry: &Value) -> Option<DateTime<Utc>> {
    SnapshotTime::from_value(entry.get("transactionDateTime")?)?.instant()
}
