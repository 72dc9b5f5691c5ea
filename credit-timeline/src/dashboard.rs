//! Fetch state for the paginated customer listing.
//!
//! [`DashboardState`] is the pure state machine:
//! `Idle -> Loading -> {Loaded, Failed}`, re-entering `Loading` on every
//! trigger. [`Dashboard`] drives it against a [`CustomerSource`], keeping at
//! most one fetch in flight and aborting the previous one when a new trigger
//! arrives.

use crate::config::DashboardConfig;
use crate::query::{CustomerFilter, PageRequest, query_string};
use crate::snapshot::CustomerPage;
use crate::source::CustomerSource;
use crate::summary::CustomerTimeline;
use anyhow::{Result, anyhow};
use log::{debug, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading { request: u64 },
    Loaded(CustomerPage),
    Failed(String),
}

/// What the user did.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Fetch the current page again, e.g. on first display
    Refresh,
    /// Replace the filter set; always lands on page 1
    SubmitFilter(CustomerFilter),
    GoToPage(u32),
    NextPage,
    PreviousPage,
}

/// A fetch the state machine wants issued.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub id: u64,
    pub filter: CustomerFilter,
    pub page: PageRequest,
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    config: DashboardConfig,
    filter: CustomerFilter,
    page: u32,
    total_pages: u32,
    load: LoadState,
    last_request: u64,
}

impl DashboardState {
    pub fn new(config: DashboardConfig, filter: CustomerFilter) -> Self {
        Self {
            config,
            filter,
            page: 1,
            total_pages: 0,
            load: LoadState::Idle,
            last_request: 0,
        }
    }

    /// Apply a trigger. Returns the fetch to issue, or `None` when the
    /// trigger is a no-op (next on the last page, previous on the first).
    pub fn apply(&mut self, trigger: Trigger) -> Option<FetchRequest> {
        let page = match trigger {
            Trigger::Refresh => self.page,
            Trigger::SubmitFilter(filter) => {
                self.filter = filter;
                1
            }
            Trigger::GoToPage(page) => page.max(1),
            Trigger::NextPage if self.can_go_next() => self.page + 1,
            Trigger::PreviousPage if self.can_go_previous() => self.page - 1,
            Trigger::NextPage | Trigger::PreviousPage => return None,
        };

        self.page = page;
        self.last_request += 1;
        self.load = LoadState::Loading {
            request: self.last_request,
        };

        let request = FetchRequest {
            id: self.last_request,
            filter: self.filter.clone(),
            page: PageRequest::new(page, self.config.page_size),
        };
        debug!(
            "request {}: /customers?{}",
            request.id,
            query_string(&request.filter, request.page)
        );
        Some(request)
    }

    /// Record the outcome of a fetch. Responses to anything but the latest
    /// request are discarded and `false` is returned.
    pub fn complete(&mut self, request: u64, outcome: Result<CustomerPage>) -> bool {
        let pending = matches!(
            self.load,
            LoadState::Loading { request: current } if current == request
        );
        if !pending {
            debug!("discarding stale response to request {request}");
            return false;
        }

        match outcome {
            Ok(page) => {
                debug!(
                    "request {request}: {} customers, {} pages",
                    page.data.len(),
                    page.total_pages
                );
                self.total_pages = page.total_pages;
                self.load = LoadState::Loaded(page);
            }
            Err(err) => {
                warn!("Error fetching customers: {err:#}");
                self.total_pages = 0;
                self.load = LoadState::Failed(format!("{err:#}"));
            }
        }
        true
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn filter(&self) -> &CustomerFilter {
        &self.filter
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn load(&self) -> &LoadState {
        &self.load
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.load, LoadState::Loading { .. })
    }

    pub fn can_go_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn can_go_previous(&self) -> bool {
        self.page > 1
    }

    pub fn pager_label(&self) -> String {
        format!("Page {} of {}", self.page, self.total_pages.max(1))
    }

    /// Timelines for the loaded page; empty unless loaded
    pub fn customers(&self) -> Vec<CustomerTimeline> {
        match &self.load {
            LoadState::Loaded(page) => page
                .data
                .iter()
                .map(|record| CustomerTimeline::from_record(record, self.config.max_buckets))
                .collect(),
            _ => Vec::new(),
        }
    }
}

struct InFlight {
    request: u64,
    handle: JoinHandle<Result<CustomerPage>>,
}

/// Runs [`DashboardState`] against a source on the tokio runtime.
pub struct Dashboard<S> {
    source: Arc<S>,
    state: DashboardState,
    in_flight: Option<InFlight>,
}

impl<S: CustomerSource> Dashboard<S> {
    pub fn new(source: S, config: DashboardConfig, filter: CustomerFilter) -> Self {
        Self {
            source: Arc::new(source),
            state: DashboardState::new(config, filter),
            in_flight: None,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Apply a trigger and start its fetch, aborting any fetch still running.
    /// Returns whether a fetch was started. Must be called within a tokio
    /// runtime.
    pub fn dispatch(&mut self, trigger: Trigger) -> bool {
        let Some(FetchRequest { id, filter, page }) = self.state.apply(trigger) else {
            return false;
        };

        if let Some(previous) = self.in_flight.take() {
            debug!("request {} superseded by request {id}", previous.request);
            previous.handle.abort();
        }

        let source = Arc::clone(&self.source);
        let handle = tokio::spawn(async move { source.fetch_page(&filter, page).await });
        self.in_flight = Some(InFlight { request: id, handle });
        true
    }

    /// Wait for the running fetch, if any, and fold its outcome into the
    /// state. Cancel safe: dropping the future leaves the fetch running.
    pub async fn settle(&mut self) {
        if let Some(in_flight) = self.in_flight.as_mut() {
            let joined = (&mut in_flight.handle).await;
            let request = in_flight.request;
            self.in_flight = None;

            let outcome = joined.unwrap_or_else(|err| Err(anyhow!("fetch task failed: {err}")));
            self.state.complete(request, outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::CustomerRecord;
    use serde_json::json;
    use std::time::Duration;

    fn state() -> DashboardState {
        DashboardState::new(DashboardConfig::default(), CustomerFilter::default())
    }

    fn page_of(ids: &[&str], total_pages: u32) -> CustomerPage {
        CustomerPage {
            data: ids
                .iter()
                .map(|id| {
                    serde_json::from_value::<CustomerRecord>(json!({
                        "customerId": id,
                        "creditLimit": 1000.0,
                        "acqCountry": "US",
                        "transactions": [
                            {
                                "transactionDateTime": "2016-01-01 00:00:00",
                                "availableMoney": 100.0,
                            }
                        ],
                    }))
                    .unwrap()
                })
                .collect(),
            total_pages,
        }
    }

    #[test]
    fn starts_idle_on_page_one() {
        let state = state();
        assert_eq!(state.load(), &LoadState::Idle);
        assert_eq!(state.pager_label(), "Page 1 of 1");
        assert!(!state.can_go_next());
        assert!(!state.can_go_previous());
    }

    #[test]
    fn loads_a_page() {
        let mut state = state();
        let request = state.apply(Trigger::Refresh).unwrap();
        assert_eq!(request.page, PageRequest::new(1, 20));
        assert!(state.is_loading());

        assert!(state.complete(request.id, Ok(page_of(&["A", "B"], 4))));
        assert_eq!(state.total_pages(), 4);
        assert_eq!(state.pager_label(), "Page 1 of 4");
        assert!(state.can_go_next());

        let customers = state.customers();
        assert_eq!(customers.len(), 2);
        assert!((customers[0].timeline[0].utilization - 0.9).abs() < 1e-12);
    }

    #[test]
    fn submitting_filters_resets_to_first_page() {
        let mut state = state();
        let first = state.apply(Trigger::GoToPage(3)).unwrap();
        state.complete(first.id, Ok(page_of(&["A"], 5)));
        assert_eq!(state.page(), 3);

        let filter = CustomerFilter {
            min_transactions: Some(12),
            ..Default::default()
        };
        let request = state.apply(Trigger::SubmitFilter(filter.clone())).unwrap();

        assert_eq!(request.page.page, 1);
        assert_eq!(request.filter, filter);
        assert_eq!(state.filter(), &filter);
    }

    #[test]
    fn pager_is_clamped() {
        let mut state = state();
        assert_eq!(state.apply(Trigger::PreviousPage), None);

        let request = state.apply(Trigger::Refresh).unwrap();
        state.complete(request.id, Ok(page_of(&["A"], 2)));

        let next = state.apply(Trigger::NextPage).unwrap();
        assert_eq!(next.page.page, 2);
        state.complete(next.id, Ok(page_of(&["B"], 2)));

        assert_eq!(state.apply(Trigger::NextPage), None);
        assert_eq!(state.apply(Trigger::PreviousPage).unwrap().page.page, 1);
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut state = state();
        let old = state.apply(Trigger::GoToPage(2)).unwrap();
        let new = state.apply(Trigger::GoToPage(3)).unwrap();

        assert!(!state.complete(old.id, Ok(page_of(&["old"], 9))));
        assert!(state.is_loading());

        assert!(state.complete(new.id, Ok(page_of(&["new"], 3))));
        assert!(!state.complete(new.id, Ok(page_of(&["again"], 3))));
        assert_eq!(state.customers()[0].customer_id, "new");
    }

    #[test]
    fn failure_empties_the_page() {
        let mut state = state();
        let request = state.apply(Trigger::Refresh).unwrap();
        state.complete(request.id, Err(anyhow!("connection refused")));

        assert_eq!(state.load(), &LoadState::Failed("connection refused".to_string()));
        assert_eq!(state.total_pages(), 0);
        assert!(state.customers().is_empty());
        assert_eq!(state.pager_label(), "Page 1 of 1");
    }

    /// Answers page `n` with one customer `P{n}`; pages listed in `slow`
    /// take a minute.
    struct StubSource {
        slow: Vec<u32>,
        fail: bool,
    }

    impl CustomerSource for StubSource {
        async fn fetch_page(
            &self,
            _filter: &CustomerFilter,
            page: PageRequest,
        ) -> Result<CustomerPage> {
            if self.slow.contains(&page.page) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.fail {
                return Err(anyhow!("listing unavailable"));
            }
            Ok(page_of(&[format!("P{}", page.page).as_str()], 5))
        }
    }

    fn dashboard(source: StubSource) -> Dashboard<StubSource> {
        Dashboard::new(source, DashboardConfig::default(), CustomerFilter::default())
    }

    #[tokio::test]
    async fn settles_dispatched_fetch() {
        let source = StubSource {
            slow: vec![],
            fail: false,
        };
        let mut dashboard = dashboard(source);

        assert!(dashboard.dispatch(Trigger::GoToPage(2)));
        assert!(dashboard.is_loading());

        dashboard.settle().await;
        assert!(!dashboard.is_loading());

        let state = dashboard.state();
        assert_eq!(state.page(), 2);
        assert_eq!(state.customers()[0].customer_id, "P2");
    }

    #[tokio::test]
    async fn new_trigger_supersedes_running_fetch() {
        let source = StubSource {
            slow: vec![4],
            fail: false,
        };
        let mut dashboard = dashboard(source);

        dashboard.dispatch(Trigger::GoToPage(4));
        dashboard.dispatch(Trigger::GoToPage(2));

        dashboard.settle().await;
        let state = dashboard.state();
        assert_eq!(state.page(), 2);
        assert_eq!(state.customers()[0].customer_id, "P2");
    }

    #[tokio::test]
    async fn failed_fetch_is_recorded() {
        let source = StubSource {
            slow: vec![],
            fail: true,
        };
        let mut dashboard = dashboard(source);

        dashboard.dispatch(Trigger::Refresh);
        dashboard.settle().await;

        assert_eq!(dashboard.state().load(), &LoadState::Failed("listing unavailable".to_string()));
    }

    #[tokio::test]
    async fn noop_trigger_starts_nothing() {
        let source = StubSource {
            slow: vec![],
            fail: false,
        };
        let mut dashboard = dashboard(source);

        assert!(!dashboard.dispatch(Trigger::PreviousPage));
        assert!(!dashboard.is_loading());
        dashboard.settle().await;
        assert_eq!(dashboard.state().load(), &LoadState::Idle);
    }
}
