use crate::error::ValidationError;
use bigdecimal::{BigDecimal, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

/// 与 NUMERIC(20,6) 列一致：整数部分最多 14 位，小数最多 6 位
const MAX_INTEGER_DIGITS: i64 = 14;
const MAX_SCALE: i64 = 6;

/// 明细录入表单 (商品选定、数量确认后提交)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineCandidate {
    pub product_code: String,
    pub description: String,
    pub quantity: BigDecimal,
    pub unit_price: BigDecimal,
    pub discount_percent: BigDecimal,
    pub tax_percent: BigDecimal,
    pub unit: String,
}

impl LineCandidate {
    /// 校验录入值，顺序与表单字段一致
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.product_code.trim().is_empty() {
            return Err(ValidationError::EmptyProductCode);
        }
        // 先查范围，后续比较才不会对超大指数做对齐
        self.check_bounds()?;
        if self.quantity <= BigDecimal::zero() {
            return Err(ValidationError::NonPositiveQuantity);
        }
        if self.unit_price < BigDecimal::zero() {
            return Err(ValidationError::NegativeUnitPrice);
        }
        if self.discount_percent < BigDecimal::zero()
            || self.discount_percent > BigDecimal::from(100)
        {
            return Err(ValidationError::DiscountOutOfRange);
        }
        if self.tax_percent < BigDecimal::zero() {
            return Err(ValidationError::NegativeTax);
        }
        Ok(())
    }

    /// 只检查数值是否落在列范围内，录入中的表单也适用
    pub fn check_bounds(&self) -> Result<(), ValidationError> {
        check_numeric(&self.quantity, "quantity")?;
        check_numeric(&self.unit_price, "unit_price")?;
        check_numeric(&self.discount_percent, "discount_percent")?;
        check_numeric(&self.tax_percent, "tax_percent")
    }
}

/// 按 (整数, 指数) 判断位数，不展开数值本身
pub(crate) fn check_numeric(
    value: &BigDecimal,
    field: &'static str,
) -> Result<(), ValidationError> {
    let (digits, scale) = value.as_bigint_and_exponent();
    if digits.is_zero() {
        return Ok(());
    }
    if scale > MAX_SCALE {
        return Err(ValidationError::TooManyDecimals(field));
    }

    // scale <= 6，因此 limit 最多 20，10^20 仍在 u128 范围内
    let limit = MAX_INTEGER_DIGITS + scale;
    let within = limit > 0
        && digits
            .abs()
            .to_u128()
            .map_or(false, |d| d < 10u128.pow(limit as u32));
    if !within {
        return Err(ValidationError::TooLarge(field));
    }
    Ok(())
}

/// 单据明细行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailLine {
    /// 持久化后的明细ID，未保存时为 None
    pub id: Option<i64>,
    pub product_code: String,
    pub description: String,
    pub quantity: BigDecimal,
    pub unit_price: BigDecimal,
    pub discount_percent: BigDecimal,
    pub tax_percent: BigDecimal,
    pub unit: String,
    /// quantity × unit_price，始终由本地计算，不接受外部传入
    #[serde(skip_deserializing)]
    pub line_subtotal: BigDecimal,
}

impl DetailLine {
    /// 从已校验的表单构建明细行
    pub fn from_candidate(id: Option<i64>, candidate: LineCandidate) -> Self {
        let line_subtotal = &candidate.quantity * &candidate.unit_price;
        Self {
            id,
            product_code: candidate.product_code.trim().to_string(),
            description: candidate.description,
            quantity: candidate.quantity,
            unit_price: candidate.unit_price,
            discount_percent: candidate.discount_percent,
            tax_percent: candidate.tax_percent,
            unit: candidate.unit,
            line_subtotal,
        }
    }

    /// 行折扣金额
    pub fn discount_amount(&self) -> BigDecimal {
        percent_of(&self.line_subtotal, &self.discount_percent)
    }

    /// 行税额 (折后金额计税)
    pub fn tax_amount(&self) -> BigDecimal {
        let taxable = &self.line_subtotal - &self.discount_amount();
        percent_of(&taxable, &self.tax_percent)
    }

    /// 重新校验外部载入的行并重算小计
    pub fn revalidated(self) -> Result<Self, ValidationError> {
        let candidate = self.to_candidate();
        candidate.validate()?;
        Ok(Self::from_candidate(self.id, candidate))
    }

    /// 回填到录入表单 (进入编辑模式时使用)
    pub fn to_candidate(&self) -> LineCandidate {
        LineCandidate {
            product_code: self.product_code.clone(),
            description: self.description.clone(),
            quantity: self.quantity.clone(),
            unit_price: self.unit_price.clone(),
            discount_percent: self.discount_percent.clone(),
            tax_percent: self.tax_percent.clone(),
            unit: self.unit.clone(),
        }
    }
}

pub(crate) fn percent_of(amount: &BigDecimal, percent: &BigDecimal) -> BigDecimal {
    (amount * percent) / BigDecimal::from(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn candidate(code: &str, qty: &str, price: &str) -> LineCandidate {
        LineCandidate {
            product_code: code.to_string(),
            description: "Cemento gris 42.5kg".to_string(),
            quantity: dec(qty),
            unit_price: dec(price),
            unit: "UND".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn validate_rejects_blank_product_code() {
        let c = candidate("   ", "1", "10");
        assert_eq!(c.validate(), Err(ValidationError::EmptyProductCode));
    }

    #[test]
    fn validate_rejects_zero_and_negative_quantity() {
        assert_eq!(
            candidate("P-001", "0", "10").validate(),
            Err(ValidationError::NonPositiveQuantity)
        );
        assert_eq!(
            candidate("P-001", "-2", "10").validate(),
            Err(ValidationError::NonPositiveQuantity)
        );
    }

    #[test]
    fn validate_rejects_negative_price_and_percentages() {
        assert_eq!(
            candidate("P-001", "1", "-0.01").validate(),
            Err(ValidationError::NegativeUnitPrice)
        );

        let mut c = candidate("P-001", "1", "10");
        c.discount_percent = dec("100.5");
        assert_eq!(c.validate(), Err(ValidationError::DiscountOutOfRange));

        c.discount_percent = dec("-1");
        assert_eq!(c.validate(), Err(ValidationError::DiscountOutOfRange));

        c.discount_percent = dec("100");
        c.tax_percent = dec("-18");
        assert_eq!(c.validate(), Err(ValidationError::NegativeTax));
    }

    #[test]
    fn validate_rejects_values_outside_column_range() {
        let mut c = candidate("P-001", "1e20000000", "10");
        assert_eq!(c.validate(), Err(ValidationError::TooLarge("quantity")));

        c.quantity = dec("100000000000000");
        assert_eq!(c.validate(), Err(ValidationError::TooLarge("quantity")));
        c.quantity = dec("99999999999999.999999");
        assert!(c.validate().is_ok());

        c.unit_price = dec("0.0000001");
        assert_eq!(c.validate(), Err(ValidationError::TooManyDecimals("unit_price")));
        c.unit_price = dec("10");

        c.discount_percent = dec("1e-30");
        assert_eq!(
            c.validate(),
            Err(ValidationError::TooManyDecimals("discount_percent"))
        );
        c.discount_percent = dec("0");

        c.tax_percent = dec("-1E+40");
        assert_eq!(c.validate(), Err(ValidationError::TooLarge("tax_percent")));
        assert_eq!(ValidationError::TooLarge("tax_percent").field(), "tax_percent");
    }

    #[test]
    fn bounds_ignore_form_rules() {
        let mut c = LineCandidate::default();
        assert!(c.check_bounds().is_ok());
        c.quantity = dec("5E+15");
        assert_eq!(c.check_bounds(), Err(ValidationError::TooLarge("quantity")));
    }

    #[test]
    fn revalidated_recomputes_subtotal() {
        let mut line = DetailLine::from_candidate(Some(3), candidate("P-001", "2", "5"));
        line.line_subtotal = dec("999");
        let line = line.revalidated().unwrap();
        assert_eq!(line.id, Some(3));
        assert_eq!(line.line_subtotal, dec("10"));

        let mut bad = DetailLine::from_candidate(None, candidate("P-001", "1", "1"));
        bad.discount_percent = dec("500");
        assert_eq!(bad.revalidated(), Err(ValidationError::DiscountOutOfRange));
    }

    #[test]
    fn line_subtotal_is_not_read_from_input() {
        let json = r#"{"id":1,"product_code":"P-001","description":"","quantity":"2",
            "unit_price":"3","discount_percent":"0","tax_percent":"0","unit":"UND",
            "line_subtotal":"999"}"#;
        let line: DetailLine = serde_json::from_str(json).unwrap();
        assert!(line.line_subtotal.is_zero());
        assert_eq!(line.revalidated().unwrap().line_subtotal, dec("6"));
    }

    #[test]
    fn zero_price_is_allowed() {
        assert!(candidate("P-GIFT", "1", "0").validate().is_ok());
    }

    #[test]
    fn line_amounts() {
        let mut c = candidate(" P-001 ", "1", "100");
        c.discount_percent = dec("10");
        c.tax_percent = dec("18");
        let line = DetailLine::from_candidate(None, c);

        assert_eq!(line.product_code, "P-001");
        assert_eq!(line.line_subtotal, dec("100"));
        assert_eq!(line.discount_amount(), dec("10"));
        assert_eq!(line.tax_amount(), dec("16.2"));
    }

    #[test]
    fn to_candidate_restores_form_values() {
        let c = candidate("P-002", "3", "7.50");
        let line = DetailLine::from_candidate(Some(44), c.clone());
        assert_eq!(line.line_subtotal, dec("22.5"));
        assert_eq!(line.to_candidate(), c);
    }
}
