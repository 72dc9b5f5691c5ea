use crate::snapshot::{Snapshot, validate_snapshots};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A snapshot normalized against the customer's credit limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub date: String,
    pub available_money: f64,
    pub utilization: f64,
}

/// Fraction of `credit_limit` in use when `available_money` is left.
///
/// Never negative: money above the limit reads as zero load, and a
/// non-positive limit or non-finite input yields zero.
pub fn utilization(credit_limit: f64, available_money: f64) -> f64 {
    let used = credit_limit - available_money;
    let raw = if credit_limit > 0.0 {
        used / credit_limit
    } else {
        0.0
    };

    if raw.is_finite() && raw > 0.0 { raw } else { 0.0 }
}

/// Map validated snapshots onto timeline points, preserving order.
pub fn timeline(snapshots: &[Snapshot], credit_limit: f64) -> Vec<TimelinePoint> {
    snapshots
        .iter()
        .map(|snapshot| TimelinePoint {
            date: snapshot.at.to_iso_string(),
            available_money: snapshot.available_money,
            utilization: utilization(credit_limit, snapshot.available_money),
        })
        .collect()
}

/// Validate raw listing entries and map the survivors onto the timeline.
/// Malformed entries are dropped without trace.
pub fn map_snapshots(raw: Option<&[Value]>, credit_limit: f64) -> Vec<TimelinePoint> {
    timeline(&validate_snapshots(raw), credit_limit)
}
