// ==========================================
// 加气混凝土质量分析 - SQL 构建工具
// ==========================================
// 职责: 可选过滤条件 → WHERE 子句 + 位置参数
// 约束: 条件文本只来自代码常量, 外部输入一律走参数绑定
// ==========================================

/// SQL 查询构建器（流式 API）
///
/// # 示例
/// ```
/// use aac_quality_analytics::repository::sql_builder::SqlQueryBuilder;
///
/// let builder = SqlQueryBuilder::new("SELECT doc_json FROM batch_record")
///     .and_if_some("batch_date >= ?", Some("2024-01-01"))
///     .and_if_some("mould_id = ?", None::<&str>)
///     .order_by("batch_date ASC");
///
/// assert_eq!(
///     builder.build(),
///     "SELECT doc_json FROM batch_record WHERE batch_date >= ? ORDER BY batch_date ASC"
/// );
/// assert_eq!(builder.params(), &["2024-01-01".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct SqlQueryBuilder {
    select_clause: String,
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_by_clause: Option<String>,
}

impl SqlQueryBuilder {
    pub fn new(select: &str) -> Self {
        Self {
            select_clause: select.to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_by_clause: None,
        }
    }

    /// 值存在时添加带单个 `?` 占位符的条件
    pub fn and_if_some<V: ToString>(mut self, condition: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.where_clauses.push(condition.to_string());
            self.params.push(value.to_string());
        }
        self
    }

    pub fn order_by(mut self, order: &str) -> Self {
        self.order_by_clause = Some(order.to_string());
        self
    }

    /// 按条件添加顺序排列的绑定参数
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// 构建最终的 SQL 语句
    pub fn build(&self) -> String {
        let mut sql = self.select_clause.clone();

        if !self.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(order) = &self.order_by_clause {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_conditions() {
        let builder = SqlQueryBuilder::new("SELECT * FROM batch_record").order_by("rowid");
        assert_eq!(builder.build(), "SELECT * FROM batch_record ORDER BY rowid");
        assert!(builder.params().is_empty());
    }

    #[test]
    fn test_params_follow_condition_order() {
        let builder = SqlQueryBuilder::new("SELECT * FROM batch_record")
            .and_if_some("batch_date >= ?", Some("2024-01-01"))
            .and_if_some("batch_date <= ?", None::<String>)
            .and_if_some("mould_id = ?", Some(12));

        assert_eq!(
            builder.build(),
            "SELECT * FROM batch_record WHERE batch_date >= ? AND mould_id = ?"
        );
        assert_eq!(builder.params(), &["2024-01-01".to_string(), "12".to_string()]);
    }
}
