//! Page-level retrieval: a single listing page, or every page up to a cap.

use futures::future::try_join_all;
use insights_core::error::{InsightsError, Result};
use insights_core::{Filters, Session, SessionDataRequest, SessionDataResponse};
use tracing::{debug, info, warn};

use crate::SessionSource;

/// Sessions gathered across pages, in page order.
#[derive(Debug, Clone, Default)]
pub struct FetchedSessions {
    pub sessions: Vec<Session>,
    pub pages_fetched: u32,
    /// Page total reported by the service, if any.
    pub total_pages: Option<u32>,
    /// Session total reported by the service, if any.
    pub total_count: Option<u64>,
    /// Set when the service reported more pages than the page cap allowed.
    pub capped: bool,
}

impl FetchedSessions {
    /// Whether the page cap left pages unfetched.
    pub fn truncated(&self) -> bool {
        self.capped
    }
}

/// Fetch one page of sessions matching `filters`.
pub async fn fetch_page<S>(
    source: &S,
    filters: &Filters,
    page: u32,
    page_size: u32,
) -> Result<SessionDataResponse>
where
    S: SessionSource + ?Sized,
{
    if page_size == 0 {
        return Err(InsightsError::Config("page size must be at least 1".into()));
    }
    debug!(page, page_size, "Requesting session page");
    let request = SessionDataRequest::new(filters.clone(), page, page_size);
    source.fetch_page(&request).await
}

/// Fetch every page of sessions matching `filters`, up to `max_pages` pages.
///
/// The first page is fetched alone to learn the page total. If the service
/// reports more pages, the rest are requested concurrently and appended in
/// page order. Any failed page fails the whole retrieval.
pub async fn fetch_all_sessions<S>(
    source: &S,
    filters: &Filters,
    page_size: u32,
    max_pages: u32,
) -> Result<FetchedSessions>
where
    S: SessionSource + ?Sized,
{
    let first = fetch_page(source, filters, 1, page_size)
        .await
        .map_err(|e| InsightsError::page(1, e))?;

    let total_pages = first.pagination.total_pages;
    let total_count = first.pagination.total_count;
    let max_pages = max_pages.max(1);
    let (last_page, capped) = match (first.pagination.has_more, total_pages) {
        (Some(true), Some(total)) if total > 1 => (total.min(max_pages), total > max_pages),
        _ => (1, false),
    };

    let mut sessions = first.sessions;

    if last_page > 1 {
        let requests = (2..=last_page).map(|page| async move {
            fetch_page(source, filters, page, page_size)
                .await
                .map_err(|e| InsightsError::page(page, e))
        });
        // try_join_all keeps input order and stops at the first error.
        for response in try_join_all(requests).await? {
            sessions.extend(response.sessions);
        }
    }

    let fetched = FetchedSessions {
        sessions,
        pages_fetched: last_page,
        total_pages,
        total_count,
        capped,
    };

    if fetched.truncated() {
        warn!(
            "Fetched {} of {} pages (page cap {}); analytics cover a partial result set",
            fetched.pages_fetched,
            total_pages.unwrap_or_default(),
            max_pages
        );
    }
    info!(
        "Fetched {} sessions across {} page(s)",
        fetched.sessions.len(),
        fetched.pages_fetched
    );

    Ok(fetched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use insights_core::Pagination;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory paged source. Later pages answer faster so completion order
    /// differs from page order.
    struct PagedSource {
        total_pages: u32,
        /// `None` leaves `hasMore` out of every response.
        has_more: Option<bool>,
        sessions_per_page: u32,
        fail_page: Option<u32>,
        requests: Mutex<Vec<SessionDataRequest>>,
    }

    impl PagedSource {
        fn new(total_pages: u32) -> Self {
            Self {
                total_pages,
                has_more: Some(total_pages > 1),
                sessions_per_page: 2,
                fail_page: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requested_pages(&self) -> Vec<u32> {
            let mut pages: Vec<u32> = self
                .requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.pagination.page)
                .collect();
            pages.sort_unstable();
            pages
        }
    }

    #[async_trait]
    impl SessionSource for PagedSource {
        async fn fetch_page(&self, request: &SessionDataRequest) -> Result<SessionDataResponse> {
            self.requests.lock().unwrap().push(request.clone());
            let page = request.pagination.page;

            let delay = (self.total_pages.saturating_sub(page) as u64) * 5;
            tokio::time::sleep(Duration::from_millis(delay)).await;

            if self.fail_page == Some(page) {
                return Err(InsightsError::Status {
                    status: 500,
                    body: "boom".into(),
                });
            }

            let mut pagination = Pagination::new(page, request.pagination.page_size);
            pagination.total_pages = Some(self.total_pages);
            pagination.has_more = self.has_more.map(|more| more && page < self.total_pages);
            pagination.total_count = Some((self.total_pages * self.sessions_per_page) as u64);

            let sessions = (0..self.sessions_per_page)
                .map(|i| Session::new(format!("p{}-s{}", page, i), 1_718_000_000))
                .collect();

            Ok(SessionDataResponse {
                filters: request.filters.clone(),
                pagination,
                sessions,
            })
        }
    }

    fn ids(fetched: &FetchedSessions) -> Vec<&str> {
        fetched
            .sessions
            .iter()
            .map(|s| s.session_id.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_single_page() {
        let source = PagedSource::new(1);
        let fetched = fetch_all_sessions(&source, &Filters::default(), 1000, 10)
            .await
            .unwrap();
        assert_eq!(ids(&fetched), vec!["p1-s0", "p1-s1"]);
        assert_eq!(fetched.pages_fetched, 1);
        assert!(!fetched.truncated());
        assert_eq!(source.requested_pages(), vec![1]);
    }

    #[tokio::test]
    async fn test_pages_concatenated_in_page_order() {
        let source = PagedSource::new(3);
        let fetched = fetch_all_sessions(&source, &Filters::default(), 1000, 10)
            .await
            .unwrap();
        assert_eq!(
            ids(&fetched),
            vec!["p1-s0", "p1-s1", "p2-s0", "p2-s1", "p3-s0", "p3-s1"]
        );
        assert_eq!(fetched.pages_fetched, 3);
        assert_eq!(fetched.total_count, Some(6));
        assert_eq!(source.requested_pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_page_cap() {
        let source = PagedSource::new(15);
        let fetched = fetch_all_sessions(&source, &Filters::default(), 1000, 10)
            .await
            .unwrap();
        assert_eq!(fetched.pages_fetched, 10);
        assert_eq!(fetched.sessions.len(), 20);
        assert_eq!(fetched.total_pages, Some(15));
        assert!(fetched.truncated());
        assert_eq!(source.requested_pages(), (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_no_more_flag_stops_after_first_page() {
        let mut source = PagedSource::new(3);
        source.has_more = Some(false);
        let fetched = fetch_all_sessions(&source, &Filters::default(), 1000, 10)
            .await
            .unwrap();
        assert_eq!(fetched.pages_fetched, 1);
        assert_eq!(fetched.total_pages, Some(3));
        assert!(!fetched.truncated());
        assert_eq!(source.requested_pages(), vec![1]);
    }

    #[tokio::test]
    async fn test_missing_more_flag_is_not_truncation() {
        let mut source = PagedSource::new(3);
        source.has_more = None;
        let fetched = fetch_all_sessions(&source, &Filters::default(), 1000, 10)
            .await
            .unwrap();
        assert_eq!(fetched.pages_fetched, 1);
        assert_eq!(fetched.sessions.len(), 2);
        assert!(!fetched.truncated());
        assert_eq!(source.requested_pages(), vec![1]);
    }

    #[tokio::test]
    async fn test_cap_equal_to_total_is_not_truncation() {
        let source = PagedSource::new(4);
        let fetched = fetch_all_sessions(&source, &Filters::default(), 1000, 4)
            .await
            .unwrap();
        assert_eq!(fetched.pages_fetched, 4);
        assert!(!fetched.truncated());
    }

    #[tokio::test]
    async fn test_failed_page_fails_everything() {
        let mut source = PagedSource::new(4);
        source.fail_page = Some(3);
        let err = fetch_all_sessions(&source, &Filters::default(), 1000, 10)
            .await
            .unwrap_err();
        match err {
            InsightsError::Page { page, source } => {
                assert_eq!(page, 3);
                assert!(matches!(*source, InsightsError::Status { status: 500, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_failed_first_page() {
        let mut source = PagedSource::new(2);
        source.fail_page = Some(1);
        let err = fetch_all_sessions(&source, &Filters::default(), 1000, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, InsightsError::Page { page: 1, .. }));
        assert_eq!(source.requested_pages(), vec![1]);
    }

    #[tokio::test]
    async fn test_filters_and_page_size_forwarded() {
        let source = PagedSource::new(2);
        let filters = Filters::from_search("", "s-1, s-2", "").with_flags(false, true, true);
        fetch_all_sessions(&source, &filters, 250, 10).await.unwrap();

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        for request in requests.iter() {
            assert_eq!(request.filters, filters);
            assert_eq!(request.pagination.page_size, 250);
        }
    }

    #[tokio::test]
    async fn test_zero_page_size_is_rejected() {
        let source = PagedSource::new(2);
        let err = fetch_page(&source, &Filters::default(), 1, 0).await.unwrap_err();
        assert!(matches!(err, InsightsError::Config(_)));

        let err = fetch_all_sessions(&source, &Filters::default(), 0, 10)
            .await
            .unwrap_err();
        match err {
            InsightsError::Page { page, source } => {
                assert_eq!(page, 1);
                assert!(matches!(*source, InsightsError::Config(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(source.requested_pages().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_single_listing_page() {
        let source = PagedSource::new(5);
        let response = fetch_page(&source, &Filters::default(), 4, 20).await.unwrap();
        assert_eq!(response.pagination.page, 4);
        assert_eq!(response.pagination.next_page(), Some(5));
        assert_eq!(source.requested_pages(), vec![4]);
    }
}
