use crate::config::SearchConfig;
use crate::editor::{EditorSession, LatestSearch};
use crate::models::{CustomerItem, ProductItem};
use crate::service::LookupService;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 单个会话：编辑状态 + 会话级搜索
pub struct SessionHandle {
    pub editor: EditorSession,
    pub products: Arc<LatestSearch<ProductItem>>,
    pub customers: Arc<LatestSearch<CustomerItem>>,
}

/// 编辑会话表 - 会话之间互不共享状态
pub struct SessionRegistry {
    sessions: DashMap<u64, SessionHandle>,
    next_id: AtomicU64,
    products: Arc<dyn LookupService<ProductItem>>,
    customers: Arc<dyn LookupService<CustomerItem>>,
    search: SearchConfig,
}

impl SessionRegistry {
    pub fn new(
        products: Arc<dyn LookupService<ProductItem>>,
        customers: Arc<dyn LookupService<CustomerItem>>,
        search: SearchConfig,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            next_id: AtomicU64::new(1),
            products,
            customers,
            search,
        }
    }

    /// 打开会话，返回会话ID
    pub fn open(&self, editor: EditorSession) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let handle = SessionHandle {
            editor,
            products: Arc::new(LatestSearch::new(
                self.products.clone(),
                self.search.debounce(),
                self.search.page_size,
                token.clone(),
            )),
            customers: Arc::new(LatestSearch::new(
                self.customers.clone(),
                self.search.debounce(),
                self.search.page_size,
                token,
            )),
        };

        self.sessions.insert(id, handle);
        tracing::info!("Session {} opened, {} active", id, self.sessions.len());
        id
    }

    /// 关闭会话，丢弃未提交的明细并取消进行中的搜索
    pub fn close(&self, id: u64) -> bool {
        match self.sessions.remove(&id) {
            Some((_, handle)) => {
                handle.products.close();
                handle.customers.close();
                tracing::info!(
                    "Session {} closed, {} lines discarded",
                    id,
                    handle.editor.lines().len()
                );
                true
            }
            None => false,
        }
    }

    /// 在会话上执行同步操作 (持有分片锁，闭包内不可 await)
    pub fn with_session<R>(
        &self,
        id: u64,
        f: impl FnOnce(&mut EditorSession) -> R,
    ) -> Option<R> {
        self.sessions.get_mut(&id).map(|mut handle| f(&mut handle.editor))
    }

    /// 只读访问，只取分片读锁
    pub fn view<R>(&self, id: u64, f: impl FnOnce(&EditorSession) -> R) -> Option<R> {
        self.sessions.get(&id).map(|handle| f(&handle.editor))
    }

    pub fn product_search(&self, id: u64) -> Option<Arc<LatestSearch<ProductItem>>> {
        self.sessions.get(&id).map(|handle| handle.products.clone())
    }

    pub fn customer_search(&self, id: u64) -> Option<Arc<LatestSearch<CustomerItem>>> {
        self.sessions.get(&id).map(|handle| handle.customers.clone())
    }
}
