use crate::error::ValidationError;
use crate::models::line::check_numeric;
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

/// 收款单中的单据行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionLine {
    pub document_number: String,
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub tax: BigDecimal,
    /// 本次收款金额
    pub collected: BigDecimal,
}

impl CollectionLine {
    pub fn check_bounds(&self) -> Result<(), ValidationError> {
        check_numeric(&self.subtotal, "subtotal")?;
        check_numeric(&self.discount, "discount")?;
        check_numeric(&self.tax, "tax")?;
        check_numeric(&self.collected, "collected")
    }
}

/// 收款单页脚合计，每项只累加各自字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptFooter {
    pub document_count: usize,
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub tax: BigDecimal,
    pub collected: BigDecimal,
}

impl ReceiptFooter {
    pub fn from_lines(lines: &[CollectionLine]) -> Self {
        let mut footer = Self {
            document_count: lines.len(),
            subtotal: BigDecimal::zero(),
            discount: BigDecimal::zero(),
            tax: BigDecimal::zero(),
            collected: BigDecimal::zero(),
        };

        for line in lines {
            footer.subtotal += &line.subtotal;
            footer.discount += &line.discount;
            footer.tax += &line.tax;
            footer.collected += &line.collected;
        }

        footer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn each_total_sums_its_own_field() {
        let lines = vec![
            CollectionLine {
                document_number: "E310000000001".to_string(),
                subtotal: dec("100"),
                discount: dec("10"),
                tax: dec("16.2"),
                collected: dec("50"),
            },
            CollectionLine {
                document_number: "E310000000002".to_string(),
                subtotal: dec("200"),
                discount: dec("0"),
                tax: dec("36"),
                collected: dec("236"),
            },
        ];

        let footer = ReceiptFooter::from_lines(&lines);
        assert_eq!(footer.document_count, 2);
        assert_eq!(footer.subtotal, dec("300"));
        assert_eq!(footer.discount, dec("10"));
        assert_eq!(footer.tax, dec("52.2"));
        assert_eq!(footer.collected, dec("286"));
    }

    #[test]
    fn oversized_amount_is_rejected() {
        let line = CollectionLine {
            document_number: "E310000000003".to_string(),
            subtotal: dec("100"),
            discount: dec("0"),
            tax: dec("0"),
            collected: dec("1e20000000"),
        };
        assert_eq!(
            line.check_bounds(),
            Err(ValidationError::TooLarge("collected"))
        );
    }

    #[test]
    fn empty_receipt() {
        let footer = ReceiptFooter::from_lines(&[]);
        assert_eq!(footer.document_count, 0);
        assert!(footer.collected.is_zero());
    }
}
