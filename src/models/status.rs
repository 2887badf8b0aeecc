use serde::{Deserialize, Serialize};

/// 状态展示样式 (标签 + 颜色)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusStyle {
    pub label: &'static str,
    pub color: &'static str,
}

/// 电子发票 (ECF) 审核状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EcfStatus {
    #[default]
    Pending,
    InProcess,
    Accepted,
    ConditionallyAccepted,
    Rejected,
    Cancelled,
}

impl EcfStatus {
    pub const ALL: [EcfStatus; 6] = [
        EcfStatus::Pending,
        EcfStatus::InProcess,
        EcfStatus::Accepted,
        EcfStatus::ConditionallyAccepted,
        EcfStatus::Rejected,
        EcfStatus::Cancelled,
    ];

    pub fn style(self) -> StatusStyle {
        match self {
            EcfStatus::Pending => StatusStyle { label: "Pendiente", color: "default" },
            EcfStatus::InProcess => StatusStyle { label: "En proceso", color: "info" },
            EcfStatus::Accepted => StatusStyle { label: "Aceptado", color: "success" },
            EcfStatus::ConditionallyAccepted => StatusStyle {
                label: "Aceptado condicional",
                color: "warning",
            },
            EcfStatus::Rejected => StatusStyle { label: "Rechazado", color: "error" },
            EcfStatus::Cancelled => StatusStyle { label: "Anulado", color: "secondary" },
        }
    }

    /// 数据库/后端使用的编码
    pub fn code(self) -> &'static str {
        match self {
            EcfStatus::Pending => "pending",
            EcfStatus::InProcess => "in_process",
            EcfStatus::Accepted => "accepted",
            EcfStatus::ConditionallyAccepted => "conditionally_accepted",
            EcfStatus::Rejected => "rejected",
            EcfStatus::Cancelled => "cancelled",
        }
    }

    /// 已被税务端接收的单据不允许再修改明细
    pub fn is_locked(self) -> bool {
        matches!(
            self,
            EcfStatus::InProcess | EcfStatus::Accepted | EcfStatus::ConditionallyAccepted
        )
    }
}

/// 单据类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[default]
    Invoice,
    CreditNote,
    DebitNote,
    Quote,
    Order,
}

impl DocumentType {
    pub fn label(self) -> &'static str {
        match self {
            DocumentType::Invoice => "Factura",
            DocumentType::CreditNote => "Nota de crédito",
            DocumentType::DebitNote => "Nota de débito",
            DocumentType::Quote => "Cotización",
            DocumentType::Order => "Pedido",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::CreditNote => "credit_note",
            DocumentType::DebitNote => "debit_note",
            DocumentType::Quote => "quote",
            DocumentType::Order => "order",
        }
    }

    /// 是否需要向税务端报送
    pub fn is_fiscal(self) -> bool {
        match self {
            DocumentType::Invoice | DocumentType::CreditNote | DocumentType::DebitNote => true,
            DocumentType::Quote | DocumentType::Order => false,
        }
    }
}
