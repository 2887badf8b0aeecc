use crate::models::EcfStatus;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// 明细行校验错误 - 只阻止本地修改，提示在对应字段旁
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("product code is required")]
    EmptyProductCode,

    #[error("quantity must be greater than zero")]
    NonPositiveQuantity,

    #[error("unit price cannot be negative")]
    NegativeUnitPrice,

    #[error("discount must be between 0 and 100")]
    DiscountOutOfRange,

    #[error("tax cannot be negative")]
    NegativeTax,

    #[error("{0} has more than 14 integer digits")]
    TooLarge(&'static str),

    #[error("{0} has more than 6 decimal places")]
    TooManyDecimals(&'static str),
}

impl ValidationError {
    /// 出错的表单字段名
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyProductCode => "product_code",
            ValidationError::NonPositiveQuantity => "quantity",
            ValidationError::NegativeUnitPrice => "unit_price",
            ValidationError::DiscountOutOfRange => "discount_percent",
            ValidationError::NegativeTax => "tax_percent",
            ValidationError::TooLarge(field) | ValidationError::TooManyDecimals(field) => field,
        }
    }
}

/// 编辑会话操作错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("line {index} does not exist (document has {len} lines)")]
    IndexOutOfRange { index: usize, len: usize },

    /// 批量载入的明细中第 index 行不合法
    #[error("line {index}: {source}")]
    InvalidLine {
        index: usize,
        source: ValidationError,
    },
}

/// 持久化/查询服务错误 - 以通知形式提示，会话状态保持不变
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Rejected by backend: {0}")]
    Rejected(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// HTTP 接口错误
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Session {0} not found")]
    SessionNotFound(u64),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Document is {} and can no longer be modified", .0.style().label)]
    Locked(EcfStatus),

    #[error("Document has no lines")]
    EmptyDocument,

    #[error("Session {0} is already being submitted")]
    SubmitInProgress(u64),

    #[error("Export failed: {0}")]
    Export(String),
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, field) = match &self {
            ApiError::SessionNotFound(_) => (StatusCode::NOT_FOUND, None),
            ApiError::Editor(EditorError::Validation(v)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Some(v.field()))
            }
            ApiError::Editor(EditorError::InvalidLine { source, .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Some(source.field()))
            }
            ApiError::Editor(EditorError::IndexOutOfRange { .. }) => (StatusCode::NOT_FOUND, None),
            ApiError::Service(_) => (StatusCode::BAD_GATEWAY, None),
            ApiError::Locked(_) | ApiError::SubmitInProgress(_) => (StatusCode::CONFLICT, None),
            ApiError::EmptyDocument => (StatusCode::UNPROCESSABLE_ENTITY, Some("lines")),
            ApiError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        let body = ErrorResponse {
            success: false,
            message: format!("Error: {}", self),
            field,
        };
        (status, Json(body)).into_response()
    }
}
