use crate::editor::{EditMode, EditorSession, SessionRegistry};
use crate::error::{ApiError, EditorError};
use crate::models::{
    CollectionLine, CustomerItem, DetailLine, DocumentHeader, DocumentId, LineCandidate,
    OrderAggregate, ProductItem, ReceiptFooter, SearchPage, StatusStyle,
};
use crate::service::{export_lines_csv, PersistenceAdapter};
use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 共享状态：会话表 + 持久化适配器
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub persistence: Arc<dyn PersistenceAdapter>,
}

/// 请求体: 打开会话 (可带已保存的单据)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpenSessionRequest {
    pub document_id: Option<DocumentId>,
    pub header: DocumentHeader,
    pub lines: Vec<DetailLine>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub term: String,
    #[serde(default = "first_page")]
    pub page: i64,
}

fn first_page() -> i64 {
    1
}

/// 会话视图：界面重绘所需的全部状态
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: u64,
    pub document_id: Option<DocumentId>,
    pub header: DocumentHeader,
    pub document_type_label: &'static str,
    /// 是否需要向税务端报送 (ECF)
    pub fiscal: bool,
    pub status: StatusStyle,
    pub mode: EditMode,
    pub form: LineCandidate,
    pub lines: Vec<DetailLine>,
    pub aggregate: OrderAggregate,
}

impl SessionView {
    fn new(session_id: u64, session: &EditorSession) -> Self {
        let header = session.header().clone();
        Self {
            session_id,
            document_id: session.document_id(),
            document_type_label: header.document_type.label(),
            fiscal: header.document_type.is_fiscal(),
            status: header.status.style(),
            header,
            mode: session.mode(),
            form: session.form().clone(),
            lines: session.lines().to_vec(),
            aggregate: session.aggregate().rounded(2),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse<T> {
    /// 已被更新的搜索取代，结果应忽略
    pub superseded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<SearchPage<T>>,
}

/// 提交响应 {success, id, message}
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub id: DocumentId,
    pub message: String,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 对会话执行一次修改并返回最新视图
fn mutate<R>(
    state: &AppState,
    id: u64,
    action: &str,
    f: impl FnOnce(&mut EditorSession) -> Result<R, EditorError>,
) -> Result<Json<SessionView>, ApiError> {
    let result = state
        .sessions
        .with_session(id, |session| f(session).map(|_| SessionView::new(id, session)))
        .ok_or(ApiError::SessionNotFound(id))?;

    match result {
        Ok(view) => Ok(Json(view)),
        Err(e) => {
            tracing::warn!("Session {}: {} rejected: {}", id, action, e);
            Err(e.into())
        }
    }
}

pub async fn open_session(
    State(state): State<AppState>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let editor = match req.document_id {
        Some(document_id) => EditorSession::load_document(document_id, req.header, req.lines)
            .map_err(|e| {
                tracing::warn!("Document {} rejected on open: {}", document_id, e);
                e
            })?,
        None => {
            let mut editor = EditorSession::new();
            editor.set_header(req.header);
            editor
        }
    };

    let id = state.sessions.open(editor);
    let view = state
        .sessions
        .view(id, |session| SessionView::new(id, session))
        .ok_or(ApiError::SessionNotFound(id))?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.close(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SessionView>, ApiError> {
    state
        .sessions
        .view(id, |session| Json(SessionView::new(id, session)))
        .ok_or(ApiError::SessionNotFound(id))
}

/// 新建单据：清空本会话，会话ID不变
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SessionView>, ApiError> {
    state
        .sessions
        .with_session(id, |session| {
            if session.is_submitting() {
                return Err(ApiError::SubmitInProgress(id));
            }
            session.reset();
            Ok(Json(SessionView::new(id, session)))
        })
        .ok_or(ApiError::SessionNotFound(id))?
}

pub async fn set_header(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(header): Json<DocumentHeader>,
) -> Result<Json<SessionView>, ApiError> {
    mutate(&state, id, "set header", |s| {
        s.set_header(header);
        Ok(())
    })
}

pub async fn set_form(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(form): Json<LineCandidate>,
) -> Result<Json<SessionView>, ApiError> {
    mutate(&state, id, "set form", |s| s.set_form(form))
}

pub async fn add_line(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(candidate): Json<LineCandidate>,
) -> Result<Json<SessionView>, ApiError> {
    mutate(&state, id, "add line", |s| s.add_line(candidate))
}

pub async fn update_line(
    State(state): State<AppState>,
    Path((id, index)): Path<(u64, usize)>,
    Json(candidate): Json<LineCandidate>,
) -> Result<Json<SessionView>, ApiError> {
    mutate(&state, id, "update line", |s| s.update_line(index, candidate))
}

pub async fn delete_line(
    State(state): State<AppState>,
    Path((id, index)): Path<(u64, usize)>,
) -> Result<Json<SessionView>, ApiError> {
    mutate(&state, id, "delete line", |s| s.delete_line(index))
}

pub async fn begin_edit(
    State(state): State<AppState>,
    Path((id, index)): Path<(u64, usize)>,
) -> Result<Json<SessionView>, ApiError> {
    mutate(&state, id, "begin edit", |s| s.begin_edit(index).map(|_| ()))
}

pub async fn cancel_edit(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SessionView>, ApiError> {
    mutate(&state, id, "cancel edit", |s| {
        s.cancel_edit();
        Ok(())
    })
}

/// 保存按钮：编辑模式下更新，否则追加
pub async fn save_line(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(candidate): Json<LineCandidate>,
) -> Result<Json<SessionView>, ApiError> {
    mutate(&state, id, "save line", |s| s.save(candidate))
}

pub async fn export_lines(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    let lines = state
        .sessions
        .with_session(id, |s| s.lines().to_vec())
        .ok_or(ApiError::SessionNotFound(id))?;

    let body = export_lines_csv(&lines).map_err(|e| ApiError::Export(e.to_string()))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        body,
    )
        .into_response())
}

/// 商品搜索 (最新请求优先)
pub async fn search_products(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<SearchResponse<ProductItem>>, ApiError> {
    let search = state
        .sessions
        .product_search(id)
        .ok_or(ApiError::SessionNotFound(id))?;

    let page = search.search(&q.term, q.page).await?;
    Ok(Json(SearchResponse {
        superseded: page.is_none(),
        page,
    }))
}

/// 客户搜索 (最新请求优先)
pub async fn search_customers(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<SearchResponse<CustomerItem>>, ApiError> {
    let search = state
        .sessions
        .customer_search(id)
        .ok_or(ApiError::SessionNotFound(id))?;

    let page = search.search(&q.term, q.page).await?;
    Ok(Json(SearchResponse {
        superseded: page.is_none(),
        page,
    }))
}

/// 提交期间占用会话，结束时释放 (包括请求中途被丢弃)
struct SubmitSlot<'a> {
    sessions: &'a SessionRegistry,
    id: u64,
}

impl Drop for SubmitSlot<'_> {
    fn drop(&mut self) {
        self.sessions.with_session(self.id, |s| s.end_submit());
    }
}

/// 提交单据：失败时会话保持不变，可手动重试
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let (document_id, payload) = state
        .sessions
        .with_session(id, |s| {
            let payload = s.payload();
            if payload.header.status.is_locked() {
                return Err(ApiError::Locked(payload.header.status));
            }
            if payload.lines.is_empty() {
                return Err(ApiError::EmptyDocument);
            }
            if !s.begin_submit() {
                return Err(ApiError::SubmitInProgress(id));
            }
            Ok((s.document_id(), payload))
        })
        .ok_or(ApiError::SessionNotFound(id))??;
    let _slot = SubmitSlot {
        sessions: &state.sessions,
        id,
    };

    let outcome = match state.persistence.submit(document_id, &payload).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Session {}: submit failed: {}", id, e);
            return Err(e.into());
        }
    };

    if state
        .sessions
        .with_session(id, |s| s.mark_saved(outcome.id))
        .is_none()
    {
        tracing::warn!(
            "Session {} closed before document {} was recorded",
            id,
            outcome.id
        );
    }

    tracing::info!(
        "Session {}: document {} saved, {} lines, total {}",
        id,
        outcome.id,
        payload.aggregate.item_count,
        payload.aggregate.total
    );

    let message = outcome.message.unwrap_or_else(|| match document_id {
        Some(_) => format!("Document {} updated", outcome.id),
        None => format!("Document {} created", outcome.id),
    });
    Ok(Json(SubmitResponse {
        success: true,
        id: outcome.id,
        message,
    }))
}

/// 收款单页脚合计
pub async fn collection_footer(
    Json(lines): Json<Vec<CollectionLine>>,
) -> Result<Json<ReceiptFooter>, ApiError> {
    for (index, line) in lines.iter().enumerate() {
        line.check_bounds()
            .map_err(|source| EditorError::InvalidLine { index, source })?;
    }
    Ok(Json(ReceiptFooter::from_lines(&lines)))
}
