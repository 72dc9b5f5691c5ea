use crate::buckets::{Bucket, aggregate};
use crate::severity::{Severity, classify};
use crate::snapshot::CustomerRecord;
use crate::utilization::{TimelinePoint, timeline};
use log::debug;
use serde::Serialize;

/// Everything needed to draw one customer: the balance timeline and the
/// compressed utilization strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerTimeline {
    pub customer_id: String,
    pub credit_limit: f64,
    pub acq_country: String,
    pub timeline: Vec<TimelinePoint>,
    pub buckets: Vec<Bucket>,
    dropped: usize,
}

impl CustomerTimeline {
    /// Run a customer's transactions through the mapper and the aggregator
    pub fn from_record(record: &CustomerRecord, max_buckets: usize) -> Self {
        let raw = record.raw_transactions();
        let snapshots = record.snapshots();
        let dropped = raw.len() - snapshots.len();
        if dropped > 0 {
            debug!(
                "customer {}: dropped {} of {} malformed snapshots",
                record.customer_id,
                dropped,
                raw.len()
            );
        }

        let timeline = timeline(&snapshots, record.credit_limit);
        let buckets = aggregate(&timeline, max_buckets);

        Self {
            customer_id: record.customer_id.clone(),
            credit_limit: record.credit_limit,
            acq_country: record.acq_country.clone(),
            timeline,
            buckets,
            dropped,
        }
    }

    pub fn has_data(&self) -> bool {
        !self.timeline.is_empty()
    }

    /// Number of raw entries excluded as malformed
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// The bucket with the highest utilization, earliest on ties
    pub fn peak(&self) -> Option<&Bucket> {
        self.buckets.iter().fold(None, |peak: Option<&Bucket>, bucket| match peak {
            Some(current) if bucket.utilization <= current.utilization => Some(current),
            _ => Some(bucket),
        })
    }

    /// Tier of the worst bucket, `None` for an empty timeline
    pub fn peak_severity(&self) -> Option<Severity> {
        self.peak().map(|bucket| classify(bucket.utilization))
    }
}
