use crate::db::queries;
use crate::error::ServiceError;
use crate::models::{CustomerItem, ProductItem, SearchPage};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use std::marker::PhantomData;

/// 商品/客户查询服务 search(term, page) -> {items, totalCount}
#[async_trait]
pub trait LookupService<T>: Send + Sync {
    async fn search(
        &self,
        term: &str,
        page: i64,
        page_size: i64,
    ) -> Result<SearchPage<T>, ServiceError>;
}

/// 直接查询 Postgres 商品表
pub struct PgProductLookup {
    pool: PgPool,
}

impl PgProductLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LookupService<ProductItem> for PgProductLookup {
    async fn search(
        &self,
        term: &str,
        page: i64,
        page_size: i64,
    ) -> Result<SearchPage<ProductItem>, ServiceError> {
        let page = queries::search_products(&self.pool, term, page, page_size).await?;
        Ok(page)
    }
}

/// 直接查询 Postgres 客户表
pub struct PgCustomerLookup {
    pool: PgPool,
}

impl PgCustomerLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LookupService<CustomerItem> for PgCustomerLookup {
    async fn search(
        &self,
        term: &str,
        page: i64,
        page_size: i64,
    ) -> Result<SearchPage<CustomerItem>, ServiceError> {
        let page = queries::search_customers(&self.pool, term, page, page_size).await?;
        Ok(page)
    }
}

/// REST 后端查询: GET {base}/{resource}?term=&page=&page_size=
pub struct RestLookup<T> {
    client: reqwest::Client,
    url: String,
    _item: PhantomData<fn() -> T>,
}

impl<T> RestLookup<T> {
    /// 与单据保存共用同一个 HTTP 客户端
    pub fn with_client(client: reqwest::Client, base_url: &str, resource: &str) -> Self {
        Self {
            client,
            url: format!("{}/{}", base_url.trim_end_matches('/'), resource),
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<T> LookupService<T> for RestLookup<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn search(
        &self,
        term: &str,
        page: i64,
        page_size: i64,
    ) -> Result<SearchPage<T>, ServiceError> {
        let page = self
            .client
            .get(&self.url)
            .query(&[
                ("term", term.to_string()),
                ("page", page.to_string()),
                ("page_size", page_size.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<SearchPage<T>>()
            .await?;
        Ok(page)
    }
}
