use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 商品搜索结果项
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ProductItem {
    pub code: String,
    pub description: String,
    pub unit: String,
    pub unit_price: BigDecimal,
    pub tax_percent: BigDecimal,
}

/// 客户搜索结果项
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CustomerItem {
    pub code: String,
    pub name: String,
    pub tax_id: Option<String>,
}

/// 分页搜索结果 {items, totalCount}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    #[serde(rename = "totalCount", alias = "total_count")]
    pub total_count: i64,
}

impl<T> SearchPage<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }
}

/// 可去重的搜索结果
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for ProductItem {
    fn key(&self) -> &str {
        &self.code
    }
}

impl Keyed for CustomerItem {
    fn key(&self) -> &str {
        &self.code
    }
}
