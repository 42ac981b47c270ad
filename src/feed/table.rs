//! Single-consumer table feed with last-request-wins semantics.
//!
//! # Responsibilities
//! - Track the table's sort and page, reset the page on sort change
//! - Run at most one logical fetch at a time, tagged with a generation
//! - Abort the superseded fetch and drop any result it still delivers
//! - Expose loading state and the rows to display
//!
//! Must be used inside a Tokio runtime: issuing a request spawns a task.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};

use crate::config::EndpointConfig;
use crate::feed::state::{FeedUpdate, LoadState, PageHook};
use crate::observability::metrics;
use crate::source::{DataSource, PageRequest, PageResult, Record, SortDirection};

struct Completion {
    generation: u64,
    request: PageRequest,
    result: PageResult,
}

enum Next {
    Received(Option<Completion>),
    Joined(Result<(), JoinError>),
}

/// Table view model for one endpoint.
pub struct TableFeed {
    source: DataSource,
    endpoint: Arc<EndpointConfig>,
    page_hook: Option<Arc<dyn PageHook>>,

    sort_field: String,
    sort_direction: SortDirection,
    page_index: u32,

    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    state_tx: watch::Sender<LoadState>,

    rows: Vec<Record>,
    results_length: u64,
    rate_limit_reached: bool,
}

impl TableFeed {
    pub fn new(source: DataSource, endpoint: EndpointConfig) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(LoadState::Idle);

        Self {
            source,
            endpoint: Arc::new(endpoint),
            page_hook: None,
            sort_field: String::new(),
            sort_direction: SortDirection::None,
            page_index: 0,
            generation: 0,
            in_flight: None,
            completions_tx,
            completions_rx,
            state_tx,
            rows: Vec::new(),
            results_length: 0,
            rate_limit_reached: false,
        }
    }

    pub fn with_page_hook(mut self, hook: impl PageHook + 'static) -> Self {
        self.page_hook = Some(Arc::new(hook));
        self
    }

    /// Start from a previously persisted page index.
    pub fn with_initial_page(mut self, page_index: u32) -> Self {
        self.page_index = page_index;
        self
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn sort(&self) -> (&str, SortDirection) {
        (self.sort_field.as_str(), self.sort_direction)
    }

    pub fn state(&self) -> LoadState {
        *self.state_tx.borrow()
    }

    /// Observe loading transitions.
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state_tx.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    /// Rows of the last delivered result. Empty after a failure.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn results_length(&self) -> u64 {
        self.results_length
    }

    pub fn is_rate_limit_reached(&self) -> bool {
        self.rate_limit_reached
    }

    /// Re-issue the current sort and page.
    pub fn refresh(&mut self) -> u64 {
        self.request(self.current_request())
    }

    pub fn go_to_page(&mut self, page_index: u32) -> u64 {
        self.page_index = page_index;
        self.refresh()
    }

    /// Change the sort order. Always goes back to the first page.
    pub fn sort_by(&mut self, field: impl Into<String>, direction: SortDirection) -> u64 {
        self.sort_field = field.into();
        self.sort_direction = direction;
        self.page_index = 0;
        self.refresh()
    }

    /// Issue `request`, superseding whatever is in flight. Returns its generation.
    pub fn request(&mut self, request: PageRequest) -> u64 {
        self.generation += 1;
        let generation = self.generation;

        if let Some(previous) = self.in_flight.take() {
            if !previous.is_finished() {
                tracing::debug!(
                    endpoint = %self.endpoint.name,
                    superseded_by = generation,
                    "Cancelling superseded fetch"
                );
            }
            previous.abort();
        }
        // Results queued by tasks that finished before being superseded.
        while let Ok(stale) = self.completions_rx.try_recv() {
            self.discard(&stale);
        }

        self.sort_field = request.sort_field.clone();
        self.sort_direction = request.sort_direction;
        self.page_index = request.page_index;
        self.state_tx.send_replace(LoadState::Loading);

        let source = self.source.clone();
        let endpoint = self.endpoint.clone();
        let tx = self.completions_tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = source.fetch_page(&endpoint, &request).await;
            // The receiver lives as long as the feed.
            let _ = tx.send(Completion {
                generation,
                request,
                result,
            });
        }));

        generation
    }

    /// Wait for the result of the current request.
    ///
    /// Results from superseded generations are discarded. Returns `None`
    /// when nothing is in flight. A fetch task that dies without reporting
    /// is delivered as [`PageResult::unavailable`].
    pub async fn next_update(&mut self) -> Option<FeedUpdate> {
        loop {
            let handle = self.in_flight.as_mut()?;
            let next = tokio::select! {
                biased;
                received = self.completions_rx.recv() => Next::Received(received),
                joined = handle => Next::Joined(joined),
            };

            match next {
                Next::Received(None) => return None,
                Next::Received(Some(completion)) if completion.generation != self.generation => {
                    self.discard(&completion);
                }
                Next::Received(Some(completion)) => {
                    self.in_flight = None;
                    return Some(self.apply(completion));
                }
                Next::Joined(Ok(())) => {
                    // The task queued its completion before finishing.
                    self.in_flight = None;
                    while let Ok(completion) = self.completions_rx.try_recv() {
                        if completion.generation == self.generation {
                            return Some(self.apply(completion));
                        }
                        self.discard(&completion);
                    }
                    return None;
                }
                Next::Joined(Err(e)) => {
                    self.in_flight = None;
                    tracing::error!(
                        endpoint = %self.endpoint.name,
                        generation = self.generation,
                        panicked = e.is_panic(),
                        error = %e,
                        "Fetch task ended without a result"
                    );
                    metrics::record_failure(&self.endpoint.name, "task_failed");
                    let completion = Completion {
                        generation: self.generation,
                        request: self.current_request(),
                        result: PageResult::unavailable(),
                    };
                    return Some(self.apply(completion));
                }
            }
        }
    }

    fn current_request(&self) -> PageRequest {
        PageRequest::new(self.sort_field.clone(), self.sort_direction, self.page_index)
    }

    fn discard(&self, completion: &Completion) {
        tracing::debug!(
            endpoint = %self.endpoint.name,
            stale = completion.generation,
            current = self.generation,
            "Discarding stale result"
        );
        metrics::record_stale_result(&self.endpoint.name);
    }

    fn apply(&mut self, completion: Completion) -> FeedUpdate {
        let Completion {
            generation,
            request,
            result,
        } = completion;

        self.rows = result.items.clone();
        self.results_length = result.total_count.value();
        self.rate_limit_reached = result.rate_limited;
        self.state_tx.send_replace(LoadState::from_result(&result));

        if result.succeeded && self.endpoint.persist_page {
            if let Some(hook) = &self.page_hook {
                hook.page_committed(&self.endpoint.name, request.page_index);
            }
        }

        tracing::debug!(
            endpoint = %self.endpoint.name,
            generation,
            page = request.page_index,
            succeeded = result.succeeded,
            "Result delivered"
        );

        FeedUpdate {
            generation,
            request,
            result,
        }
    }
}

impl Drop for TableFeed {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for TableFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableFeed")
            .field("endpoint", &self.endpoint.name)
            .field("generation", &self.generation)
            .field("page_index", &self.page_index)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::RetryPolicy;
    use crate::source::{ApiPage, FetchError, PageFetcher, TotalCount};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use url::Url;

    /// Serves one row per page, `{ "page": n }`, after a per-page latency.
    /// Pages listed in `failing` answer 429.
    #[derive(Default)]
    struct FakeApi {
        latency_ms: HashMap<u32, u64>,
        failing: Vec<u32>,
        calls: Mutex<Vec<u32>>,
    }

    impl FakeApi {
        fn calls_for(&self, page: u32) -> usize {
            self.calls.lock().unwrap().iter().filter(|p| **p == page).count()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeApi {
        async fn fetch(&self, url: &Url) -> Result<ApiPage, FetchError> {
            let page: u32 = url
                .query_pairs()
                .find(|(k, _)| k == "page")
                .and_then(|(_, v)| v.parse().ok())
                .unwrap();
            self.calls.lock().unwrap().push(page);

            let latency = self.latency_ms.get(&page).copied().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(latency)).await;

            if self.failing.contains(&page) {
                return Err(FetchError::RateLimited);
            }
            Ok(ApiPage {
                items: vec![serde_json::from_value(json!({ "page": page })).unwrap()],
                total_count: Some(40),
                status: None,
            })
        }
    }

    fn feed(api: Arc<FakeApi>, endpoint: EndpointConfig) -> TableFeed {
        TableFeed::new(DataSource::new(api, RetryPolicy::new(6, 500)), endpoint)
    }

    struct PanickingFetcher;

    #[async_trait]
    impl PageFetcher for PanickingFetcher {
        async fn fetch(&self, url: &Url) -> Result<ApiPage, FetchError> {
            panic!("fetcher blew up on {}", url);
        }
    }

    fn row_page(feed: &TableFeed) -> Option<u64> {
        feed.rows().first().and_then(|r| r.get("page")).and_then(|v| v.as_u64())
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_fetch_lifecycle() {
        let api = Arc::new(FakeApi::default());
        let mut feed = feed(api, EndpointConfig::activities());
        assert_eq!(feed.state(), LoadState::Idle);
        assert!(feed.next_update().await.is_none());

        let generation = feed.refresh();
        assert_eq!(generation, 1);
        assert!(feed.is_loading());

        let update = feed.next_update().await.unwrap();
        assert_eq!(update.generation, 1);
        assert!(update.result.succeeded);
        assert_eq!(feed.state(), LoadState::Succeeded);
        assert_eq!(feed.results_length(), 40);
        assert_eq!(row_page(&feed), Some(0));
        assert!(feed.next_update().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_requests_deliver_only_latest() {
        let api = Arc::new(FakeApi {
            latency_ms: HashMap::from([(0, 10), (1, 50)]),
            ..FakeApi::default()
        });
        let mut feed = feed(api, EndpointConfig::activities());

        feed.go_to_page(0);
        feed.go_to_page(1);

        let update = feed.next_update().await.unwrap();
        assert_eq!(update.request.page_index, 1);
        assert_eq!(update.generation, 2);
        assert_eq!(row_page(&feed), Some(1));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(feed.next_update().await.is_none());
        assert_eq!(row_page(&feed), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_completed_stale_result_is_discarded() {
        let api = Arc::new(FakeApi {
            latency_ms: HashMap::from([(1, 20)]),
            ..FakeApi::default()
        });
        let mut feed = feed(api, EndpointConfig::activities());

        feed.go_to_page(0);
        // Page 0 finishes and queues its result before page 1 is issued.
        tokio::time::sleep(Duration::from_millis(5)).await;
        feed.go_to_page(1);

        let update = feed.next_update().await.unwrap();
        assert_eq!(update.request.page_index, 1);
        assert_eq!(row_page(&feed), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseding_cancels_pending_retry() {
        let api = Arc::new(FakeApi {
            failing: vec![0],
            ..FakeApi::default()
        });
        let mut feed = feed(api.clone(), EndpointConfig::suppliers());

        feed.go_to_page(0);
        // Attempt at t=0, retry at t=500, next retry due at t=2500.
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(api.calls_for(0), 2);

        feed.go_to_page(1);
        let update = feed.next_update().await.unwrap();
        assert_eq!(update.request.page_index, 1);
        assert!(update.result.succeeded);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(api.calls_for(0), 2);
        assert_eq!(feed.state(), LoadState::Succeeded);
        assert!(feed.next_update().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_clears_rows() {
        let api = Arc::new(FakeApi {
            failing: vec![1],
            ..FakeApi::default()
        });
        let mut feed = feed(api.clone(), EndpointConfig::suppliers());

        feed.go_to_page(0);
        feed.next_update().await.unwrap();
        assert_eq!(row_page(&feed), Some(0));
        assert_eq!(feed.results_length(), 1000);

        feed.go_to_page(1);
        let update = feed.next_update().await.unwrap();
        assert_eq!(update.result, PageResult::unavailable());
        assert_eq!(update.result.total_count, TotalCount::Exact(0));
        assert_eq!(feed.state(), LoadState::Failed);
        assert!(feed.is_rate_limit_reached());
        assert!(feed.rows().is_empty());
        assert_eq!(api.calls_for(1), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_ends_once_despite_retries() {
        let api = Arc::new(FakeApi {
            failing: vec![0],
            ..FakeApi::default()
        });
        let mut feed = feed(api, EndpointConfig::suppliers());
        let mut states = feed.subscribe();

        feed.refresh();
        assert_eq!(*states.borrow_and_update(), LoadState::Loading);

        feed.next_update().await.unwrap();
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), LoadState::Failed);
        assert!(!states.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sort_change_resets_page() {
        let api = Arc::new(FakeApi::default());
        let mut feed = feed(api, EndpointConfig::activities()).with_initial_page(3);
        assert_eq!(feed.page_index(), 3);

        feed.refresh();
        let update = feed.next_update().await.unwrap();
        assert_eq!(update.request.page_index, 3);

        feed.sort_by("amount", SortDirection::Descending);
        assert_eq!(feed.page_index(), 0);
        assert_eq!(feed.sort(), ("amount", SortDirection::Descending));

        let update = feed.next_update().await.unwrap();
        assert_eq!(update.request, PageRequest::new("amount", SortDirection::Descending, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_hook_only_for_persisted_success() {
        let committed = Arc::new(Mutex::new(Vec::new()));

        let api = Arc::new(FakeApi {
            failing: vec![5],
            ..FakeApi::default()
        });
        let sink = committed.clone();
        let mut suppliers = feed(api.clone(), EndpointConfig::suppliers()).with_page_hook(
            move |name: &str, page: u32| sink.lock().unwrap().push((name.to_string(), page)),
        );

        suppliers.go_to_page(2);
        suppliers.next_update().await.unwrap();
        suppliers.go_to_page(5);
        suppliers.next_update().await.unwrap();

        let sink = committed.clone();
        let mut activities = feed(api, EndpointConfig::activities()).with_page_hook(
            move |name: &str, page: u32| sink.lock().unwrap().push((name.to_string(), page)),
        );
        activities.go_to_page(4);
        activities.next_update().await.unwrap();

        assert_eq!(*committed.lock().unwrap(), vec![("suppliers".to_string(), 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_fetch_task_fails_the_request() {
        let source = DataSource::new(Arc::new(PanickingFetcher), RetryPolicy::new(6, 500));
        let mut feed = TableFeed::new(source, EndpointConfig::suppliers()).with_initial_page(2);

        let generation = feed.refresh();
        let update = tokio::time::timeout(Duration::from_secs(2), feed.next_update())
            .await
            .expect("feed stuck in loading after the fetch task panicked")
            .unwrap();

        assert_eq!(update.generation, generation);
        assert_eq!(update.request.page_index, 2);
        assert_eq!(update.result, PageResult::unavailable());
        assert_eq!(feed.state(), LoadState::Failed);
        assert!(feed.rows().is_empty());
        assert!(feed.is_rate_limit_reached());
        assert!(feed.next_update().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseding_drains_finished_results() {
        let api = Arc::new(FakeApi::default());
        let mut feed = feed(api, EndpointConfig::activities());

        feed.go_to_page(0);
        tokio::time::sleep(Duration::from_millis(5)).await;
        feed.go_to_page(1);
        tokio::time::sleep(Duration::from_millis(5)).await;
        feed.go_to_page(2);

        assert!(matches!(
            feed.completions_rx.try_recv(),
            Err(mpsc::error::TryRecvError::Empty)
        ));

        let update = feed.next_update().await.unwrap();
        assert_eq!(update.request.page_index, 2);
        assert_eq!(row_page(&feed), Some(2));
    }
}
