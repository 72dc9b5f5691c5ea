//! Credit utilization timelines.
//!
//! Account snapshots are mapped onto a utilization timeline
//! ([`utilization::map_snapshots`]), compressed into a bounded strip of
//! worst-case buckets ([`buckets::aggregate`]) and classified into severity
//! tiers ([`severity::classify`]). The engine is pure; [`source`] and
//! [`dashboard`] feed it pages of customers.

pub mod buckets;
pub mod config;
pub mod dashboard;
pub mod query;
pub mod severity;
pub mod snapshot;
pub mod source;
pub mod summary;
pub mod utilization;

pub use buckets::{Bucket, DEFAULT_MAX_BUCKETS, aggregate};
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardState, LoadState, Trigger};
pub use query::{CustomerFilter, CustomerStats, PageRequest};
pub use severity::{Severity, classify};
pub use snapshot::{CustomerPage, CustomerRecord, Snapshot, SnapshotTime};
pub use source::{CustomerSource, JsonFileSource};
pub use summary::CustomerTimeline;
pub use utilization::{TimelinePoint, map_snapshots};
