use crate::models::{
    CustomerItem, DetailLine, DocumentId, DocumentPayload, ProductItem, SearchPage,
};
use futures::TryStreamExt;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

/// 新建单据 (表头 + 明细在同一事务中)
pub async fn insert_document(
    pool: &PgPool,
    payload: &DocumentPayload,
) -> Result<DocumentId, sqlx::Error> {
    let header = &payload.header;
    let agg = &payload.aggregate;
    let mut tx = pool.begin().await?;

    let id: DocumentId = sqlx::query_scalar(
        r#"
        INSERT INTO documents (
            document_type, customer_code, customer_name, issue_date,
            currency, notes, status,
            item_count, subtotal, discount_total, tax_total, total,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now(), now())
        RETURNING id
        "#,
    )
    .bind(header.document_type.code())
    .bind(&header.customer_code)
    .bind(&header.customer_name)
    .bind(header.issue_date)
    .bind(&header.currency)
    .bind(&header.notes)
    .bind(header.status.code())
    .bind(agg.item_count as i32)
    .bind(agg.subtotal.clone())
    .bind(agg.discount_total.clone())
    .bind(agg.tax_total.clone())
    .bind(agg.total.clone())
    .fetch_one(&mut *tx)
    .await?;

    let lines: Vec<(usize, &DetailLine)> = payload.lines.iter().enumerate().collect();
    insert_lines(&mut tx, id, &lines).await?;

    tx.commit().await?;
    Ok(id)
}

/// 更新单据，返回 false 表示单据不存在
/// 已有ID的明细原位更新，新明细插入，被删除的明细移除
pub async fn update_document(
    pool: &PgPool,
    id: DocumentId,
    payload: &DocumentPayload,
) -> Result<bool, sqlx::Error> {
    let header = &payload.header;
    let agg = &payload.aggregate;
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE documents
        SET document_type = $2, customer_code = $3, customer_name = $4, issue_date = $5,
            currency = $6, notes = $7, status = $8,
            item_count = $9, subtotal = $10, discount_total = $11, tax_total = $12, total = $13,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(header.document_type.code())
    .bind(&header.customer_code)
    .bind(&header.customer_name)
    .bind(header.issue_date)
    .bind(&header.currency)
    .bind(&header.notes)
    .bind(header.status.code())
    .bind(agg.item_count as i32)
    .bind(agg.subtotal.clone())
    .bind(agg.discount_total.clone())
    .bind(agg.tax_total.clone())
    .bind(agg.total.clone())
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    let kept_ids: Vec<i64> = payload.lines.iter().filter_map(|l| l.id).collect();
    let removed = sqlx::query(
        r#"
        DELETE FROM document_lines
        WHERE document_id = $1 AND NOT (id = ANY($2))
        "#,
    )
    .bind(id)
    .bind(&kept_ids)
    .execute(&mut *tx)
    .await?;
    tracing::debug!("Document {}: removed {} lines", id, removed.rows_affected());

    let mut new_lines = Vec::new();
    for (line_no, line) in payload.lines.iter().enumerate() {
        match line.id {
            Some(line_id) => update_line(&mut tx, id, line_id, line_no, line).await?,
            None => new_lines.push((line_no, line)),
        }
    }
    insert_lines(&mut tx, id, &new_lines).await?;

    tx.commit().await?;
    Ok(true)
}

async fn update_line(
    conn: &mut PgConnection,
    document_id: DocumentId,
    line_id: i64,
    line_no: usize,
    line: &DetailLine,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE document_lines
        SET line_no = $3, product_code = $4, description = $5, unit = $6,
            quantity = $7, unit_price = $8, discount_percent = $9, tax_percent = $10,
            line_subtotal = $11
        WHERE id = $1 AND document_id = $2
        "#,
    )
    .bind(line_id)
    .bind(document_id)
    .bind(line_no as i32)
    .bind(&line.product_code)
    .bind(&line.description)
    .bind(&line.unit)
    .bind(line.quantity.clone())
    .bind(line.unit_price.clone())
    .bind(line.discount_percent.clone())
    .bind(line.tax_percent.clone())
    .bind(line.line_subtotal.clone())
    .execute(conn)
    .await?;
    Ok(())
}

/// 批量插入明细
async fn insert_lines(
    conn: &mut PgConnection,
    document_id: DocumentId,
    lines: &[(usize, &DetailLine)],
) -> Result<(), sqlx::Error> {
    if lines.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO document_lines (
            document_id, line_no, product_code, description, unit,
            quantity, unit_price, discount_percent, tax_percent, line_subtotal
        ) ",
    );

    query_builder.push_values(lines, |mut b, (line_no, line)| {
        b.push_bind(document_id)
            .push_bind(*line_no as i32)
            .push_bind(line.product_code.clone())
            .push_bind(line.description.clone())
            .push_bind(line.unit.clone())
            .push_bind(line.quantity.clone())
            .push_bind(line.unit_price.clone())
            .push_bind(line.discount_percent.clone())
            .push_bind(line.tax_percent.clone())
            .push_bind(line.line_subtotal.clone());
    });

    let result = query_builder.build().execute(conn).await?;
    tracing::debug!("Document {}: inserted {} lines", document_id, result.rows_affected());
    Ok(())
}

/// 商品模糊查询 (编码或描述)，page 从 1 开始
pub async fn search_products(
    pool: &PgPool,
    term: &str,
    page: i64,
    page_size: i64,
) -> Result<SearchPage<ProductItem>, sqlx::Error> {
    let pattern = like_pattern(term);

    let total_count: i64 = sqlx::query_scalar(
        r#"
        SELECT count(*)
        FROM products
        WHERE code ILIKE $1 OR description ILIKE $1
        "#,
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let mut rows = sqlx::query_as::<_, ProductItem>(
        r#"
        SELECT code, description, unit, unit_price, tax_percent
        FROM products
        WHERE code ILIKE $1 OR description ILIKE $1
        ORDER BY code
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&pattern)
    .bind(page_size)
    .bind(page_offset(page, page_size))
    .fetch(pool);

    let mut items = Vec::new();
    while let Some(item) = rows.try_next().await? {
        items.push(item);
    }

    Ok(SearchPage { items, total_count })
}

/// 客户模糊查询 (编码、名称或税号)
pub async fn search_customers(
    pool: &PgPool,
    term: &str,
    page: i64,
    page_size: i64,
) -> Result<SearchPage<CustomerItem>, sqlx::Error> {
    let pattern = like_pattern(term);

    let total_count: i64 = sqlx::query_scalar(
        r#"
        SELECT count(*)
        FROM customers
        WHERE code ILIKE $1 OR name ILIKE $1 OR tax_id ILIKE $1
        "#,
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let mut rows = sqlx::query_as::<_, CustomerItem>(
        r#"
        SELECT code, name, tax_id
        FROM customers
        WHERE code ILIKE $1 OR name ILIKE $1 OR tax_id ILIKE $1
        ORDER BY name
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&pattern)
    .bind(page_size)
    .bind(page_offset(page, page_size))
    .fetch(pool);

    let mut items = Vec::new();
    while let Some(item) = rows.try_next().await? {
        items.push(item);
    }

    Ok(SearchPage { items, total_count })
}

/// 转义 LIKE 通配符后包成 %term%
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// 页码从 1 开始，超大页码饱和而不是溢出
fn page_offset(page: i64, page_size: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("cem"), "%cem%");
        assert_eq!(like_pattern(" 50%_off "), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn page_offset_is_one_based() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
        assert_eq!(page_offset(0, 20), 0);
        assert_eq!(page_offset(-5, 20), 0);
        assert_eq!(page_offset(i64::MAX, 20), i64::MAX);
    }
}
