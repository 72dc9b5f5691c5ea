use chrono::{DateTime, Local};
use credit_timeline::snapshot::parse_timestamp;
use credit_timeline::{Bucket, CustomerTimeline, DashboardState, LoadState, Severity};
use std::fmt::Write;

const RESET: &str = "\x1b[0m";
const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Columns available to the balance sparkline
    pub width: usize,
    pub color: bool,
    /// List every bucket's tooltip under the strip
    pub tooltips: bool,
}

/// ANSI foreground for a tier
fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "\x1b[38;5;203m",
        Severity::High => "\x1b[38;5;215m",
        Severity::Moderate => "\x1b[38;5;227m",
        Severity::Low => "\x1b[38;5;114m",
    }
}

/// Glyph for a tier, so the strip reads without colour too
fn severity_glyph(severity: Severity) -> char {
    match severity {
        Severity::Critical => '█',
        Severity::High => '▆',
        Severity::Moderate => '▃',
        Severity::Low => '▁',
    }
}

/// `"93.0% on 01/08/16"`
pub fn tooltip(bucket: &Bucket) -> String {
    format!("{:.1}% on {}", bucket.utilization * 100.0, local_date(&bucket.date))
}

/// Zoned timestamps are shown in local time, naive ones as written.
fn local_date(date: &str) -> String {
    let day = match DateTime::parse_from_rfc3339(date.trim()) {
        Ok(at) => at.with_timezone(&Local).date_naive(),
        Err(_) => match parse_timestamp(date) {
            Some(at) => at.date_naive(),
            None => return date.to_string(),
        },
    };
    day.format("%x").to_string()
}

/// Available money over time, clipped to `[0, credit_limit]`.
pub fn sparkline(customer: &CustomerTimeline, width: usize) -> String {
    let points = &customer.timeline;
    let columns = width.min(points.len());
    let top = (LEVELS.len() - 1) as f64;

    (0..columns)
        .map(|column| {
            let point = &points[column * points.len() / columns];
            let ratio = if customer.credit_limit > 0.0 {
                point.available_money.clamp(0.0, customer.credit_limit) / customer.credit_limit
            } else {
                0.0
            };
            let ratio = if ratio.is_nan() { 0.0 } else { ratio };
            LEVELS[(ratio * top).round() as usize]
        })
        .collect()
}

/// One cell per bucket.
pub fn strip(buckets: &[Bucket], color: bool) -> String {
    let mut out = String::new();
    for bucket in buckets {
        let severity = bucket.severity();
        if color {
            out.push_str(severity_color(severity));
        }
        out.push(severity_glyph(severity));
    }
    if color && !buckets.is_empty() {
        out.push_str(RESET);
    }
    out
}

pub fn render_card(customer: &CustomerTimeline, options: &RenderOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Customer {}", customer.customer_id);
    let _ = writeln!(out, "Credit Limit: ${:.2}", customer.credit_limit);
    let _ = writeln!(out, "Acquiring Country: {}", customer.acq_country);

    if !customer.has_data() {
        let _ = writeln!(out, "No data available");
        return out;
    }

    let _ = writeln!(out, "{}", sparkline(customer, options.width));
    let _ = writeln!(out, "{}", strip(&customer.buckets, options.color));
    if let Some(peak) = customer.peak() {
        let _ = writeln!(out, "peak {} ({})", tooltip(peak), peak.severity());
    }
    if options.tooltips {
        for bucket in &customer.buckets {
            let _ = writeln!(out, "  {}", tooltip(bucket));
        }
    }
    out
}

pub fn render_page(state: &DashboardState, options: &RenderOptions) -> String {
    let mut out = String::new();
    match state.load() {
        LoadState::Idle => {}
        LoadState::Loading { .. } => {
            let _ = writeln!(out, "Loading customers...");
            return out;
        }
        LoadState::Failed(message) => {
            let _ = writeln!(out, "Error fetching customers: {message}");
        }
        LoadState::Loaded(_) => {
            let customers = state.customers();
            if customers.is_empty() {
                let _ = writeln!(out, "No customers.");
            }
            for customer in &customers {
                let _ = writeln!(out, "{}", render_card(customer, options));
            }
        }
    }

    let previous = if state.can_go_previous() { "< prev" } else { "      " };
    let next = if state.can_go_next() { "next >" } else { "" };
    let _ = writeln!(out, "{previous}  {}  {next}", state.pager_label());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use credit_timeline::{CustomerRecord, Trigger};
    use serde_json::json;

    const PLAIN: RenderOptions = RenderOptions {
        width: 8,
        color: false,
        tooltips: false,
    };

    fn customer(transactions: serde_json::Value) -> CustomerTimeline {
        let record: CustomerRecord = serde_json::from_value(json!({
            "customerId": "733493772",
            "creditLimit": 5000.0,
            "acqCountry": "US",
            "transactions": transactions,
        }))
        .unwrap();
        CustomerTimeline::from_record(&record, 120)
    }

    #[test]
    fn tooltip_shows_percent_and_date() {
        let bucket = Bucket {
            utilization: 0.9304,
            date: "2016-01-08 19:04:50".to_string(),
        };
        assert_eq!(tooltip(&bucket), "93.0% on 01/08/16");
    }

    #[test]
    fn tooltip_keeps_unreadable_dates() {
        let bucket = Bucket {
            utilization: 0.5,
            date: "sometime".to_string(),
        };
        assert_eq!(tooltip(&bucket), "50.0% on sometime");
    }

    #[test]
    fn sparkline_clips_to_credit_limit() {
        let customer = customer(json!([
            { "transactionDateTime": "2016-01-01", "availableMoney": -300.0 },
            { "transactionDateTime": "2016-01-02", "availableMoney": 2500.0 },
            { "transactionDateTime": "2016-01-03", "availableMoney": 9000.0 },
        ]));
        assert_eq!(sparkline(&customer, 80), "▁▅█");
    }

    #[test]
    fn sparkline_resamples_to_width() {
        let entries: Vec<_> = (0..100)
            .map(|i| {
                json!({
                    "transactionDateTime": "2016-01-01",
                    "availableMoney": i as f64 * 50.0,
                })
            })
            .collect();
        let customer = customer(json!(entries));
        assert_eq!(sparkline(&customer, 10).chars().count(), 10);
    }

    #[test]
    fn strip_has_one_cell_per_bucket() {
        let buckets: Vec<_> = [0.1, 0.35, 0.6, 0.95]
            .into_iter()
            .map(|utilization| Bucket {
                utilization,
                date: "2016-01-01".to_string(),
            })
            .collect();

        assert_eq!(strip(&buckets, false), "▁▃▆█");

        let colored = strip(&buckets, true);
        assert!(colored.starts_with(severity_color(Severity::Low)));
        assert!(colored.ends_with(RESET));
    }

    #[test]
    fn card_without_data() {
        let card = render_card(&customer(json!([])), &PLAIN);
        assert_eq!(
            card,
            "Customer 733493772\nCredit Limit: $5000.00\nAcquiring Country: US\nNo data available\n"
        );
    }

    #[test]
    fn failed_page_shows_the_error() {
        let mut state = DashboardState::new(Default::default(), Default::default());
        let request = state.apply(Trigger::Refresh).unwrap();
        state.complete(
            request.id,
            Err(anyhow!("failed to read customer listing /nonexistent.json")),
        );

        let page = render_page(&state, &PLAIN);

        assert!(page.starts_with(
            "Error fetching customers: failed to read customer listing /nonexistent.json\n"
        ));
        assert!(!page.contains("No customers."));
        assert!(page.contains("Page 1 of 1"));
    }

    #[test]
    fn card_reports_peak() {
        let card = render_card(
            &customer(json!([
                { "transactionDateTime": "2016-01-08 19:04:50", "availableMoney": 500.0 },
                { "transactionDateTime": "2016-01-09 10:00:00", "availableMoney": 4000.0 },
            ])),
            &PLAIN,
        );
        assert!(card.contains("peak 90.0% on 01/08/16 (critical)"));
    }
}
