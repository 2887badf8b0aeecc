use crate::models::DetailLine;
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

/// 单据汇总 - 由明细行推导，不单独存储
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAggregate {
    pub item_count: usize,
    pub subtotal: BigDecimal,
    pub discount_total: BigDecimal,
    pub tax_total: BigDecimal,
    pub total: BigDecimal,
}

impl OrderAggregate {
    /// 根据当前明细重新计算汇总
    /// total = subtotal - discount_total + tax_total
    pub fn from_lines(lines: &[DetailLine]) -> Self {
        let mut subtotal = BigDecimal::zero();
        let mut discount_total = BigDecimal::zero();
        let mut tax_total = BigDecimal::zero();

        for line in lines {
            subtotal += &line.line_subtotal;
            discount_total += line.discount_amount();
            tax_total += line.tax_amount();
        }

        let total = &subtotal - &discount_total + &tax_total;

        Self {
            item_count: lines.len(),
            subtotal,
            discount_total,
            tax_total,
            total,
        }
    }

    /// 展示用的舍入副本，total 由舍入后的分量重新推导
    pub fn rounded(&self, scale: i64) -> Self {
        let subtotal = self.subtotal.round(scale);
        let discount_total = self.discount_total.round(scale);
        let tax_total = self.tax_total.round(scale);
        let total = &subtotal - &discount_total + &tax_total;
        Self {
            item_count: self.item_count,
            subtotal,
            discount_total,
            tax_total,
            total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}

impl Default for OrderAggregate {
    fn default() -> Self {
        Self::from_lines(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineCandidate;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn line(qty: &str, price: &str, discount: &str, tax: &str) -> DetailLine {
        DetailLine::from_candidate(
            None,
            LineCandidate {
                product_code: "P-001".to_string(),
                quantity: dec(qty),
                unit_price: dec(price),
                discount_percent: dec(discount),
                tax_percent: dec(tax),
                ..Default::default()
            },
        )
    }

    #[test]
    fn empty_sequence_is_all_zero() {
        let agg = OrderAggregate::from_lines(&[]);
        assert_eq!(agg.item_count, 0);
        assert!(agg.subtotal.is_zero());
        assert!(agg.discount_total.is_zero());
        assert!(agg.tax_total.is_zero());
        assert!(agg.total.is_zero());
        assert!(agg.is_empty());
    }

    #[test]
    fn plain_line_without_discount_or_tax() {
        let agg = OrderAggregate::from_lines(&[line("2", "10", "0", "0")]);
        assert_eq!(agg.item_count, 1);
        assert_eq!(agg.subtotal, dec("20"));
        assert_eq!(agg.discount_total, dec("0"));
        assert_eq!(agg.tax_total, dec("0"));
        assert_eq!(agg.total, dec("20"));
    }

    #[test]
    fn tax_applies_after_discount() {
        let agg = OrderAggregate::from_lines(&[line("1", "100", "10", "18")]);
        assert_eq!(agg.subtotal, dec("100"));
        assert_eq!(agg.discount_total, dec("10"));
        assert_eq!(agg.tax_total, dec("16.2"));
        assert_eq!(agg.total, dec("106.2"));
    }

    #[test]
    fn totals_hold_across_mixed_lines() {
        let lines = vec![
            line("3", "19.99", "5", "18"),
            line("0.5", "1200", "0", "16"),
            line("12", "0.75", "100", "18"),
        ];
        let agg = OrderAggregate::from_lines(&lines);

        let sum: BigDecimal = lines.iter().map(|l| l.line_subtotal.clone()).sum();
        assert_eq!(agg.subtotal, sum);
        assert_eq!(
            agg.total,
            &agg.subtotal - &agg.discount_total + &agg.tax_total
        );
        // 第三行全额折扣，不产生税
        assert_eq!(lines[2].tax_amount(), dec("0"));
    }

    #[test]
    fn rounded_keeps_invariant() {
        let agg = OrderAggregate::from_lines(&[line("3", "3.333", "7", "18")]);
        let r = agg.rounded(2);
        assert_eq!(r.subtotal, dec("10.00"));
        assert_eq!(r.total, &r.subtotal - &r.discount_total + &r.tax_total);
    }
}
