use crate::severity::{Severity, classify};
use crate::utilization::TimelinePoint;
use serde::{Deserialize, Serialize};

/// Strip width used when the caller has no preference
pub const DEFAULT_MAX_BUCKETS: usize = 120;

/// The worst utilization seen in one window of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub utilization: f64,
    pub date: String,
}

impl Bucket {
    pub fn severity(&self) -> Severity {
        classify(self.utilization)
    }
}

/// Compress a timeline into at most `max_buckets` buckets.
///
/// The timeline is cut into contiguous windows of `ceil(len / n)` points,
/// `n = min(max_buckets, len)`, the last window possibly shorter. Each window
/// reports its maximum utilization along with the date of the first point that
/// reached it. Since the scan starts from a maximum of zero and later points
/// only replace the recorded one on a strict increase, a window whose points
/// are all zero reports the date of its first point, not its last. A
/// `max_buckets` of zero is read as one.
pub fn aggregate(timeline: &[TimelinePoint], max_buckets: usize) -> Vec<Bucket> {
    if timeline.is_empty() {
        return Vec::new();
    }

    let n = max_buckets.clamp(1, timeline.len());
    let size = timeline.len().div_ceil(n);

    timeline.chunks(size).filter_map(reduce_window).collect()
}

/// Max-reduce one window. Points with a non-finite utilization do not take
/// part; a window made only of those yields nothing.
fn reduce_window(window: &[TimelinePoint]) -> Option<Bucket> {
    let mut max_utilization = 0.0_f64;
    let mut peak: Option<&TimelinePoint> = None;

    for point in window.iter().filter(|point| point.utilization.is_finite()) {
        // ties keep the earlier point
        if peak.is_none() || point.utilization > max_utilization {
            max_utilization = max_utilization.max(point.utilization);
            peak = Some(point);
        }
    }

    peak.map(|point| Bucket {
        utilization: max_utilization,
        date: point.date.clone(),
    })
}
