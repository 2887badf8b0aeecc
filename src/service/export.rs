use crate::models::DetailLine;

/// 将 Option<i64> 转换为 CSV 字符串
fn option_to_csv(val: Option<i64>) -> String {
    val.map(|v| v.to_string()).unwrap_or_default()
}

/// 导出单据明细为 CSV (含表头行)，供打印/报表使用
pub fn export_lines_csv(lines: &[DetailLine]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record([
        "id",
        "product_code",
        "description",
        "unit",
        "quantity",
        "unit_price",
        "discount_percent",
        "tax_percent",
        "line_subtotal",
    ])?;

    for line in lines {
        writer.write_record(&[
            option_to_csv(line.id),
            line.product_code.clone(),
            line.description.clone(),
            line.unit.clone(),
            line.quantity.to_string(),
            line.unit_price.to_string(),
            line.discount_percent.to_string(),
            line.tax_percent.to_string(),
            line.line_subtotal.to_string(),
        ])?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineCandidate;
    use bigdecimal::BigDecimal;

    #[test]
    fn writes_header_and_rows() {
        let line = DetailLine::from_candidate(
            Some(3),
            LineCandidate {
                product_code: "P-001".to_string(),
                description: "Tubo PVC 1/2\", 6m".to_string(),
                quantity: BigDecimal::from(2),
                unit_price: BigDecimal::from(15),
                unit: "UND".to_string(),
                ..Default::default()
            },
        );

        let bytes = export_lines_csv(&[line]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut rows = text.lines();

        assert!(rows.next().unwrap().starts_with("id,product_code,description"));
        let row = rows.next().unwrap();
        assert!(row.starts_with("3,P-001,\"Tubo PVC 1/2\"\", 6m\",UND,2,15,"));
        assert!(row.ends_with(",30"));
        assert!(rows.next().is_none());
    }

    #[test]
    fn empty_lines_still_have_header() {
        let text = String::from_utf8(export_lines_csv(&[]).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
