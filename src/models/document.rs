use crate::models::{DetailLine, DocumentType, EcfStatus, OrderAggregate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type DocumentId = i64;

/// 单据表头
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentHeader {
    pub document_type: DocumentType,
    pub customer_code: String,
    pub customer_name: String,
    pub issue_date: Option<NaiveDate>,
    pub currency: String,
    pub notes: String,
    pub status: EcfStatus,
}

/// 提交给持久化适配器的单据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPayload {
    pub header: DocumentHeader,
    pub lines: Vec<DetailLine>,
    pub aggregate: OrderAggregate,
}

/// 后端返回 {success, id?, message?}
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendReply {
    pub success: bool,
    #[serde(default)]
    pub id: Option<DocumentId>,
    #[serde(default)]
    pub message: Option<String>,
}

/// 提交成功的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitOutcome {
    pub id: DocumentId,
    pub message: Option<String>,
}
