//! Serializes "fetch next page" requests for a transaction feed.

use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;

use crate::{
    Error,
    feed::FeedFilters,
    transaction::{Transaction, TransactionId},
};

/// The page number requested before any page has been fetched.
const FIRST_PAGE: u64 = 1;

/// One page of transactions from the backend's paginated listing call.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// The transactions on this page, in the backend's feed order.
    pub items: Vec<Transaction>,
    /// Whether the backend has more pages after this one.
    pub has_next_page: bool,
}

/// The seam between the feed and the backend's paginated listing call.
///
/// Page numbering starts at 1. Implementations should not retry on their
/// own; the coordinator leaves its cursor unchanged on failure so the
/// caller can retry the same page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page of transactions matching `filters`.
    ///
    /// # Errors
    /// Returns [Error::FetchFailed] or another API error when the page
    /// could not be fetched. The error is propagated to whoever triggered
    /// the load so it can be reported to the user.
    async fn fetch_page(
        &self,
        page: u64,
        limit: u64,
        filters: &FeedFilters,
    ) -> Result<Page, Error>;
}

/// What a call to [FeedCoordinator::request_next_page] did.
#[derive(Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and this many new transactions were appended.
    Appended(usize),
    /// Another fetch was already in flight, the call was a no-op.
    AlreadyLoading,
    /// The feed is exhausted, the call was a no-op.
    EndOfFeed,
    /// The fetched page belonged to a feed whose filters have since
    /// changed, so it was discarded without touching the state.
    StaleDiscarded,
}

/// A snapshot of the feed state for rendering loading and end-of-list
/// indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedStatus {
    /// The last successfully fetched page, 0 before any fetch.
    pub current_page: u64,
    /// Whether the backend has more pages for this feed.
    pub has_next_page: bool,
    /// Whether a fetch is in flight right now.
    pub is_loading_more: bool,
}

/// The pagination cursor and accumulated results of one feed.
#[derive(Debug)]
struct FeedState {
    current_page: u64,
    has_next_page: bool,
    is_loading_more: bool,
    filters: FeedFilters,
    /// Bumped on every filter reset. In-flight requests carry the
    /// generation they were issued under, so a late result or guard
    /// release for a superseded feed can be recognized and discarded.
    generation: u64,
    items: Vec<Transaction>,
}

impl FeedState {
    fn new(filters: FeedFilters, generation: u64) -> Self {
        Self {
            current_page: FIRST_PAGE - 1,
            has_next_page: true,
            is_loading_more: false,
            filters,
            generation,
            items: Vec::new(),
        }
    }
}

/// Owns the pagination state of one transaction feed and serializes "load
/// more" requests against it.
///
/// At most one fetch is in flight at a time: the loading flag is set under
/// the state lock before the fetch begins, so triggers that fire
/// back-to-back (a scroll handler firing twice in one frame, a double
/// tapped button) collapse into a single request. The flag is released on
/// every exit path, including fetch failure, so a retry can always
/// proceed.
///
/// The coordinator does not watch the filters itself. Callers must invoke
/// [FeedCoordinator::reset_for_filter_change] whenever the feed's filters
/// change; a fetch still in flight for the old filters is then discarded
/// when it completes instead of being applied to the new feed.
pub struct FeedCoordinator<F> {
    fetcher: F,
    page_size: u64,
    state: Mutex<FeedState>,
}

impl<F> FeedCoordinator<F>
where
    F: PageFetcher,
{
    /// Create a coordinator for the feed identified by `filters`,
    /// fetching `page_size` transactions per page.
    pub fn new(fetcher: F, filters: FeedFilters, page_size: u64) -> Self {
        Self {
            fetcher,
            page_size,
            state: Mutex::new(FeedState::new(filters, 0)),
        }
    }

    /// Fetch the next page of the feed, unless a fetch is already in
    /// flight or the feed is exhausted.
    ///
    /// On success the cursor advances and the page's transactions are
    /// appended to the accumulated results, skipping IDs that are already
    /// present. On failure the cursor is left unchanged so a subsequent
    /// call retries the same page.
    ///
    /// # Errors
    /// Returns [Error::StateLock] if the state lock is poisoned, or the
    /// error from the fetcher when the fetch itself fails. A fetch error
    /// always releases the loading flag before it is returned.
    pub async fn request_next_page(&self) -> Result<LoadOutcome, Error> {
        let (next_page, filters, generation) = {
            let mut state = self.lock_state()?;

            if state.is_loading_more {
                return Ok(LoadOutcome::AlreadyLoading);
            }

            if !state.has_next_page {
                return Ok(LoadOutcome::EndOfFeed);
            }

            // Set before the fetch starts: a second trigger arriving while
            // the request below is still in flight must see the flag.
            state.is_loading_more = true;

            (
                state.current_page + 1,
                state.filters.clone(),
                state.generation,
            )
        };

        let _guard = LoadingGuard {
            state: &self.state,
            generation,
        };

        let page = self
            .fetcher
            .fetch_page(next_page, self.page_size, &filters)
            .await?;

        let mut state = self.lock_state()?;

        if state.generation != generation {
            tracing::debug!(
                page = next_page,
                "discarding page fetched for a superseded feed"
            );
            return Ok(LoadOutcome::StaleDiscarded);
        }

        state.current_page = next_page;
        state.has_next_page = page.has_next_page;
        let appended = append_new_items(&mut state.items, page.items);

        tracing::debug!(
            page = next_page,
            appended,
            has_next_page = state.has_next_page,
            "appended a page to the feed"
        );

        Ok(LoadOutcome::Appended(appended))
    }

    /// Replace the feed with a fresh one under `filters`.
    ///
    /// The cursor returns to its initial value, the feed is marked as
    /// having more pages regardless of whether the old feed was exhausted,
    /// and the accumulated transactions are dropped. A fetch in flight for
    /// the old filters keeps running, but its result will be discarded.
    ///
    /// # Errors
    /// Returns [Error::StateLock] if the state lock is poisoned.
    pub fn reset_for_filter_change(&self, filters: FeedFilters) -> Result<(), Error> {
        let mut state = self.lock_state()?;
        let generation = state.generation + 1;
        *state = FeedState::new(filters, generation);

        Ok(())
    }

    /// The current cursor and loading flags, for rendering indicators.
    ///
    /// # Errors
    /// Returns [Error::StateLock] if the state lock is poisoned.
    pub fn status(&self) -> Result<FeedStatus, Error> {
        let state = self.lock_state()?;

        Ok(FeedStatus {
            current_page: state.current_page,
            has_next_page: state.has_next_page,
            is_loading_more: state.is_loading_more,
        })
    }

    /// A snapshot of the transactions accumulated so far, in arrival
    /// order.
    ///
    /// # Errors
    /// Returns [Error::StateLock] if the state lock is poisoned.
    pub fn items(&self) -> Result<Vec<Transaction>, Error> {
        Ok(self.lock_state()?.items.clone())
    }

    /// The filters the feed is currently showing.
    ///
    /// # Errors
    /// Returns [Error::StateLock] if the state lock is poisoned.
    pub fn filters(&self) -> Result<FeedFilters, Error> {
        Ok(self.lock_state()?.filters.clone())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, FeedState>, Error> {
        self.state.lock().map_err(|_| Error::StateLock)
    }
}

/// Clears the loading flag when dropped, so the flag is released on every
/// exit path out of a fetch, including an error return.
///
/// The release is skipped when the feed was reset while the request was in
/// flight: the reset already cleared the flag for the new feed, and this
/// guard belongs to the old one.
struct LoadingGuard<'a> {
    state: &'a Mutex<FeedState>,
    generation: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock()
            && state.generation == self.generation
        {
            state.is_loading_more = false;
        }
    }
}

/// Append transactions to the accumulated results, skipping IDs that are
/// already present.
///
/// Returns the number of transactions actually appended. The backend is
/// not expected to return overlapping pages, but a transaction created
/// while paging can shift the page boundaries, so duplicates are dropped
/// rather than shown twice.
fn append_new_items(items: &mut Vec<Transaction>, page_items: Vec<Transaction>) -> usize {
    let mut seen: HashSet<TransactionId> = items.iter().map(|item| item.id).collect();
    let mut appended = 0;

    for item in page_items {
        if seen.insert(item.id) {
            items.push(item);
            appended += 1;
        }
    }

    appended
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Arc, Mutex,
            atomic::{AtomicU64, Ordering},
        },
    };

    use async_trait::async_trait;
    use time::macros::date;
    use tokio::sync::Notify;

    use crate::{Error, feed::FeedFilters, transaction::Transaction};

    use super::{FeedCoordinator, LoadOutcome, Page, PageFetcher};

    fn march_filters() -> FeedFilters {
        FeedFilters::new(3, 2026, "").unwrap()
    }

    fn transaction(id: i64) -> Transaction {
        Transaction {
            id,
            amount: -12.50,
            date: date!(2026 - 03 - 14),
            category: "Groceries".to_string(),
            budget_id: None,
        }
    }

    fn page(ids: &[i64], has_next_page: bool) -> Page {
        Page {
            items: ids.iter().copied().map(transaction).collect(),
            has_next_page,
        }
    }

    /// Returns scripted results in order and records the requested page
    /// numbers.
    struct ScriptedFetcher {
        results: Mutex<VecDeque<Result<Page, Error>>>,
        requested_pages: Arc<Mutex<Vec<u64>>>,
    }

    impl ScriptedFetcher {
        fn new(results: Vec<Result<Page, Error>>) -> (Self, Arc<Mutex<Vec<u64>>>) {
            let requested_pages = Arc::new(Mutex::new(Vec::new()));
            let fetcher = Self {
                results: Mutex::new(results.into()),
                requested_pages: requested_pages.clone(),
            };

            (fetcher, requested_pages)
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch_page(
            &self,
            page: u64,
            _limit: u64,
            _filters: &FeedFilters,
        ) -> Result<Page, Error> {
            self.requested_pages.lock().unwrap().push(page);

            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected fetch of page {page}"))
        }
    }

    /// Blocks each fetch until the gate is notified, so tests can hold a
    /// request in flight.
    #[derive(Clone)]
    struct GatedFetcher {
        gate: Arc<Notify>,
        calls: Arc<AtomicU64>,
        result: Page,
    }

    impl GatedFetcher {
        fn new(result: Page) -> Self {
            Self {
                gate: Arc::new(Notify::new()),
                calls: Arc::new(AtomicU64::new(0)),
                result,
            }
        }
    }

    #[async_trait]
    impl PageFetcher for GatedFetcher {
        async fn fetch_page(
            &self,
            _page: u64,
            _limit: u64,
            _filters: &FeedFilters,
        ) -> Result<Page, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;

            Ok(self.result.clone())
        }
    }

    async fn wait_until_loading(coordinator: &FeedCoordinator<GatedFetcher>) {
        while !coordinator.status().unwrap().is_loading_more {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn repeated_triggers_make_a_single_fetch() {
        let fetcher = GatedFetcher::new(page(&[1, 2], true));
        let gate = fetcher.gate.clone();
        let calls = fetcher.calls.clone();
        let coordinator = Arc::new(FeedCoordinator::new(fetcher, march_filters(), 10));

        let first_request = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.request_next_page().await }
        });
        wait_until_loading(&coordinator).await;

        for _ in 0..4 {
            let got = coordinator.request_next_page().await.unwrap();
            assert_eq!(got, LoadOutcome::AlreadyLoading);
        }

        gate.notify_one();
        let got = first_request.await.unwrap().unwrap();

        assert_eq!(got, LoadOutcome::Appended(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn successful_fetch_advances_the_cursor() {
        let (fetcher, requested_pages) = ScriptedFetcher::new(vec![
            Ok(page(&[1, 2], true)),
            Ok(page(&[3], true)),
        ]);
        let coordinator = FeedCoordinator::new(fetcher, march_filters(), 10);

        assert_eq!(
            coordinator.request_next_page().await.unwrap(),
            LoadOutcome::Appended(2)
        );
        assert_eq!(coordinator.status().unwrap().current_page, 1);

        assert_eq!(
            coordinator.request_next_page().await.unwrap(),
            LoadOutcome::Appended(1)
        );
        assert_eq!(coordinator.status().unwrap().current_page, 2);

        assert_eq!(*requested_pages.lock().unwrap(), vec![1, 2]);
        let got_ids: Vec<i64> = coordinator
            .items()
            .unwrap()
            .iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(got_ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_the_cursor_so_retry_requests_the_same_page() {
        let (fetcher, requested_pages) = ScriptedFetcher::new(vec![
            Err(Error::FetchFailed("connection reset".to_string())),
            Ok(page(&[1], true)),
        ]);
        let coordinator = FeedCoordinator::new(fetcher, march_filters(), 10);

        let got = coordinator.request_next_page().await;
        assert_eq!(
            got,
            Err(Error::FetchFailed("connection reset".to_string()))
        );

        let status = coordinator.status().unwrap();
        assert_eq!(status.current_page, 0);
        assert!(status.has_next_page);
        assert!(!status.is_loading_more, "the loading flag must be released");

        assert_eq!(
            coordinator.request_next_page().await.unwrap(),
            LoadOutcome::Appended(1)
        );
        assert_eq!(*requested_pages.lock().unwrap(), vec![1, 1]);
    }

    #[tokio::test]
    async fn exhausted_feed_never_invokes_the_fetcher() {
        let (fetcher, requested_pages) =
            ScriptedFetcher::new(vec![Ok(page(&[1], false))]);
        let coordinator = FeedCoordinator::new(fetcher, march_filters(), 10);

        coordinator.request_next_page().await.unwrap();
        assert!(!coordinator.status().unwrap().has_next_page);

        assert_eq!(
            coordinator.request_next_page().await.unwrap(),
            LoadOutcome::EndOfFeed
        );
        assert_eq!(
            coordinator.request_next_page().await.unwrap(),
            LoadOutcome::EndOfFeed
        );
        assert_eq!(*requested_pages.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn reset_restores_a_fresh_feed_after_exhaustion() {
        let (fetcher, _) = ScriptedFetcher::new(vec![Ok(page(&[1, 2], false))]);
        let coordinator = FeedCoordinator::new(fetcher, march_filters(), 10);
        coordinator.request_next_page().await.unwrap();

        let filters = FeedFilters::new(4, 2026, "").unwrap();
        coordinator.reset_for_filter_change(filters.clone()).unwrap();

        let status = coordinator.status().unwrap();
        assert_eq!(status.current_page, 0);
        assert!(status.has_next_page);
        assert!(!status.is_loading_more);
        assert!(coordinator.items().unwrap().is_empty());
        assert_eq!(coordinator.filters().unwrap(), filters);
    }

    #[tokio::test]
    async fn page_fetched_before_a_filter_change_is_discarded() {
        let fetcher = GatedFetcher::new(page(&[1, 2], false));
        let gate = fetcher.gate.clone();
        let coordinator = Arc::new(FeedCoordinator::new(fetcher, march_filters(), 10));

        let stale_request = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.request_next_page().await }
        });
        wait_until_loading(&coordinator).await;

        coordinator
            .reset_for_filter_change(FeedFilters::new(4, 2026, "").unwrap())
            .unwrap();
        gate.notify_one();

        let got = stale_request.await.unwrap().unwrap();
        assert_eq!(got, LoadOutcome::StaleDiscarded);

        let status = coordinator.status().unwrap();
        assert_eq!(status.current_page, 0);
        assert!(status.has_next_page, "the stale page must not exhaust the new feed");
        assert!(
            !status.is_loading_more,
            "the stale request must not leave the new feed guarded"
        );
        assert!(coordinator.items().unwrap().is_empty());
    }

    #[tokio::test]
    async fn overlapping_pages_are_deduplicated_by_id() {
        let (fetcher, _) = ScriptedFetcher::new(vec![
            Ok(page(&[1, 2, 3], true)),
            Ok(page(&[3, 4], false)),
        ]);
        let coordinator = FeedCoordinator::new(fetcher, march_filters(), 10);

        coordinator.request_next_page().await.unwrap();
        let got = coordinator.request_next_page().await.unwrap();

        assert_eq!(got, LoadOutcome::Appended(1));
        let got_ids: Vec<i64> = coordinator
            .items()
            .unwrap()
            .iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(got_ids, vec![1, 2, 3, 4]);
    }
}
