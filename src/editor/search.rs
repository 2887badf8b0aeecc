use crate::error::ServiceError;
use crate::models::{Keyed, SearchPage};
use crate::service::LookupService;
use indexmap::IndexMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 最新请求优先的搜索
/// 新请求会取消上一个未完成的请求；会话关闭时取消全部
pub struct LatestSearch<T> {
    lookup: Arc<dyn LookupService<T>>,
    debounce: Duration,
    page_size: i64,
    session: CancellationToken,
    inflight: Mutex<Option<CancellationToken>>,
}

impl<T: Keyed + Send + 'static> LatestSearch<T> {
    pub fn new(
        lookup: Arc<dyn LookupService<T>>,
        debounce: Duration,
        page_size: i64,
        session: CancellationToken,
    ) -> Self {
        Self {
            lookup,
            debounce,
            page_size,
            session,
            inflight: Mutex::new(None),
        }
    }

    /// 返回 None 表示该请求已被更新的请求或会话关闭取代
    pub async fn search(
        &self,
        term: &str,
        page: i64,
    ) -> Result<Option<SearchPage<T>>, ServiceError> {
        if self.is_closed() {
            return Ok(None);
        }

        let token = self.supersede();
        let term = term.trim();
        if term.is_empty() {
            return Ok(Some(SearchPage::empty()));
        }

        tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!("search '{}' superseded during debounce", term);
                return Ok(None);
            }
            _ = tokio::time::sleep(self.debounce) => {}
        }

        let result = tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!("search '{}' superseded while in flight", term);
                return Ok(None);
            }
            r = self.lookup.search(term, page, self.page_size) => r?,
        };

        if token.is_cancelled() {
            return Ok(None);
        }

        Ok(Some(dedup(result)))
    }

    /// 关闭会话：之后到达的结果全部丢弃
    pub fn close(&self) {
        self.session.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_cancelled()
    }

    fn supersede(&self) -> CancellationToken {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = inflight.take() {
            previous.cancel();
        }
        let token = self.session.child_token();
        *inflight = Some(token.clone());
        token
    }
}

/// 按编码去重，保持后端返回顺序
fn dedup<T: Keyed>(page: SearchPage<T>) -> SearchPage<T> {
    let mut seen: IndexMap<String, T> = IndexMap::with_capacity(page.items.len());
    for item in page.items {
        seen.entry(item.key().to_string()).or_insert(item);
    }
    SearchPage {
        items: seen.into_values().collect(),
        total_count: page.total_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductItem;
    use async_trait::async_trait;
    use bigdecimal::BigDecimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeLookup {
        calls: AtomicUsize,
        latency: Duration,
    }

    impl FakeLookup {
        fn new(latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                latency,
            })
        }
    }

    fn product(code: &str) -> ProductItem {
        ProductItem {
            code: code.to_string(),
            description: format!("desc {}", code),
            unit: "UND".to_string(),
            unit_price: BigDecimal::from(10),
            tax_percent: BigDecimal::from(18),
        }
    }

    #[async_trait]
    impl LookupService<ProductItem> for FakeLookup {
        async fn search(
            &self,
            term: &str,
            _page: i64,
            _page_size: i64,
        ) -> Result<SearchPage<ProductItem>, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            Ok(SearchPage {
                items: vec![product(term), product(term), product("OTHER")],
                total_count: 3,
            })
        }
    }

    fn searcher(lookup: Arc<FakeLookup>) -> LatestSearch<ProductItem> {
        LatestSearch::new(lookup, Duration::from_millis(300), 20, CancellationToken::new())
    }

    #[tokio::test(start_paused = true)]
    async fn latest_request_wins() {
        let lookup = FakeLookup::new(Duration::from_millis(50));
        let search = searcher(lookup.clone());

        let (first, second) = tokio::join!(search.search("cem", 1), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            search.search("cemento", 1).await
        });

        assert!(first.unwrap().is_none());
        let page = second.unwrap().unwrap();
        assert_eq!(page.items[0].code, "cemento");
        // 第一个请求在防抖期间被取消，未访问后端
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_request_is_discarded_when_superseded() {
        let lookup = FakeLookup::new(Duration::from_millis(500));
        let search = searcher(lookup.clone());

        let (first, second) = tokio::join!(search.search("cem", 1), async {
            tokio::time::sleep(Duration::from_millis(400)).await;
            search.search("varilla", 1).await
        });

        assert!(first.unwrap().is_none());
        assert!(second.unwrap().is_some());
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_session_makes_results_inert() {
        let lookup = FakeLookup::new(Duration::from_millis(50));
        let search = searcher(lookup);

        let (result, _) = tokio::join!(search.search("cem", 1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            search.close();
        });

        assert!(result.unwrap().is_none());
        assert!(search.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn search_after_close_skips_backend() {
        let lookup = FakeLookup::new(Duration::from_millis(50));
        let search = searcher(lookup.clone());
        search.close();

        assert!(search.search("cem", 1).await.unwrap().is_none());
        assert!(search.search("", 1).await.unwrap().is_none());
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_term_skips_backend() {
        let lookup = FakeLookup::new(Duration::from_millis(50));
        let search = searcher(lookup.clone());

        let page = search.search("   ", 1).await.unwrap().unwrap();
        assert!(page.items.is_empty());
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn results_are_deduplicated_in_order() {
        let lookup = FakeLookup::new(Duration::from_millis(1));
        let search = searcher(lookup);

        let page = search.search("P-1", 1).await.unwrap().unwrap();
        let codes: Vec<_> = page.items.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["P-1", "OTHER"]);
        assert_eq!(page.total_count, 3);
    }
}
