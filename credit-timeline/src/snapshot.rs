use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Layouts accepted for naive (zone-less) timestamps, tried in order.
const NAIVE_LAYOUTS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// When a snapshot was observed.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotTime {
    /// A timestamp that arrived already serialized. It is passed through untouched.
    Text(String),
    Instant(DateTime<Utc>),
}

impl SnapshotTime {
    /// Read a raw `transactionDateTime`. Only strings are accepted; numbers and
    /// every other JSON type are malformed. Date-like values reach the
    /// timeline through [`SnapshotTime::Instant`] instead.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(SnapshotTime::Text(text.clone())),
            _ => None,
        }
    }

    /// ISO-8601 form placed on timeline points, e.g. `2016-01-08T19:04:50.000Z`
    pub fn to_iso_string(&self) -> String {
        match self {
            SnapshotTime::Text(text) => text.clone(),
            SnapshotTime::Instant(at) => at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Best-effort conversion to an instant, `None` when the text is not a timestamp
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            SnapshotTime::Text(text) => parse_timestamp(text),
            SnapshotTime::Instant(at) => Some(*at),
        }
    }
}

impl From<DateTime<Utc>> for SnapshotTime {
    fn from(at: DateTime<Utc>) -> Self {
        SnapshotTime::Instant(at)
    }
}

impl From<&str> for SnapshotTime {
    fn from(text: &str) -> Self {
        SnapshotTime::Text(text.to_string())
    }
}

/// One observed account state: the money still available at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub at: SnapshotTime,
    pub available_money: f64,
    pub transaction_amount: Option<f64>,
}

impl Snapshot {
    pub fn new(at: impl Into<SnapshotTime>, available_money: f64) -> Self {
        Self {
            at: at.into(),
            available_money,
            transaction_amount: None,
        }
    }

    /// Narrow one raw listing entry into a snapshot.
    ///
    /// Returns `None` unless the entry is an object with a numeric
    /// `availableMoney` and a string `transactionDateTime`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let entry = value.as_object()?;
        let available_money = entry.get("availableMoney")?.as_f64()?;
        let at = SnapshotTime::from_value(entry.get("transactionDateTime")?)?;
        let transaction_amount = entry.get("transactionAmount").and_then(Value::as_f64);

        Some(Self {
            at,
            available_money,
            transaction_amount,
        })
    }
}

/// Keep the entries that form valid snapshots, in their original order.
/// A missing listing is treated as an empty one.
pub fn validate_snapshots(raw: Option<&[Value]>) -> Vec<Snapshot> {
    raw.unwrap_or_default()
        .iter()
        .filter_map(Snapshot::from_value)
        .collect()
}

/// Parse the timestamp formats the listing is known to produce: RFC 3339,
/// `YYYY-MM-DD HH:MM:SS` (read as UTC) and bare dates.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }

    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|day| day.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// A customer as returned by the `/customers` listing.
///
/// `transactions` is kept as raw JSON so one malformed entry never rejects the
/// whole record; use [`CustomerRecord::snapshots`] for the validated view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub customer_id: String,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub credit_limit: f64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub acq_country: String,
    #[serde(default)]
    pub transactions: Value,
}

impl CustomerRecord {
    /// Raw transaction entries; anything other than a JSON array reads as empty
    pub fn raw_transactions(&self) -> &[Value] {
        self.transactions
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        validate_snapshots(Some(self.raw_transactions()))
    }
}

/// One page of the customer listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPage {
    #[serde(default)]
    pub data: Vec<CustomerRecord>,
    #[serde(default)]
    pub total_pages: u32,
}

/// `null` (how pandas writes NaN) or any non-number reads as 0
fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_f64().unwrap_or_default())
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        _ => String::new(),
    })
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "customerId must be a string or number, got {other}"
        ))),
    }
}
