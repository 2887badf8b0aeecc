use crate::db::queries;
use crate::error::ServiceError;
use crate::models::{BackendReply, DocumentId, DocumentPayload, SubmitOutcome};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

/// 持久化适配器 - 不重试、不排队、不缓存，失败直接返回给调用方
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn create_document(
        &self,
        payload: &DocumentPayload,
    ) -> Result<SubmitOutcome, ServiceError>;

    async fn update_document(
        &self,
        id: DocumentId,
        payload: &DocumentPayload,
    ) -> Result<SubmitOutcome, ServiceError>;

    /// 未保存过的单据新建，否则更新
    async fn submit(
        &self,
        document_id: Option<DocumentId>,
        payload: &DocumentPayload,
    ) -> Result<SubmitOutcome, ServiceError> {
        match document_id {
            Some(id) => self.update_document(id, payload).await,
            None => self.create_document(payload).await,
        }
    }
}

/// REST 后端: POST {base}/documents, PUT {base}/documents/{id}
pub struct RestPersistence {
    client: reqwest::Client,
    base_url: String,
}

impl RestPersistence {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn client(&self) -> reqwest::Client {
        self.client.clone()
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<BackendReply, ServiceError> {
        let response = request.send().await?;
        let status = response.status();
        let reply = response.json::<BackendReply>().await?;

        if !status.is_success() || !reply.success {
            let message = reply
                .message
                .unwrap_or_else(|| format!("backend responded with {}", status));
            return Err(ServiceError::Rejected(message));
        }
        Ok(reply)
    }
}

#[async_trait]
impl PersistenceAdapter for RestPersistence {
    async fn create_document(
        &self,
        payload: &DocumentPayload,
    ) -> Result<SubmitOutcome, ServiceError> {
        let url = format!("{}/documents", self.base_url);
        let reply = self.send(self.client.post(url).json(payload)).await?;

        let id = reply
            .id
            .ok_or_else(|| {
                ServiceError::Rejected("backend returned no document id".to_string())
            })?;
        Ok(SubmitOutcome {
            id,
            message: reply.message,
        })
    }

    async fn update_document(
        &self,
        id: DocumentId,
        payload: &DocumentPayload,
    ) -> Result<SubmitOutcome, ServiceError> {
        let url = format!("{}/documents/{}", self.base_url, id);
        let reply = self.send(self.client.put(url).json(payload)).await?;
        Ok(SubmitOutcome {
            id,
            message: reply.message,
        })
    }
}

/// 直接写入 Postgres
pub struct PgPersistence {
    pool: PgPool,
    timeout: Duration,
}

impl PgPersistence {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl PersistenceAdapter for PgPersistence {
    async fn create_document(
        &self,
        payload: &DocumentPayload,
    ) -> Result<SubmitOutcome, ServiceError> {
        let start = std::time::Instant::now();
        let id = tokio::time::timeout(self.timeout, queries::insert_document(&self.pool, payload))
            .await
            .map_err(|_| ServiceError::Timeout(self.timeout))??;

        tracing::info!(
            "Document {} created with {} lines, 耗时: {:?}",
            id,
            payload.lines.len(),
            start.elapsed()
        );
        Ok(SubmitOutcome { id, message: None })
    }

    async fn update_document(
        &self,
        id: DocumentId,
        payload: &DocumentPayload,
    ) -> Result<SubmitOutcome, ServiceError> {
        let start = std::time::Instant::now();
        let update = queries::update_document(&self.pool, id, payload);
        let found = tokio::time::timeout(self.timeout, update)
            .await
            .map_err(|_| ServiceError::Timeout(self.timeout))??;

        if !found {
            return Err(ServiceError::Rejected(format!("document {} not found", id)));
        }

        tracing::info!(
            "Document {} updated with {} lines, 耗时: {:?}",
            id,
            payload.lines.len(),
            start.elapsed()
        );
        Ok(SubmitOutcome { id, message: None })
    }
}
