// ==========================================
// 加气混凝土质量分析 - 蒸压釜记录仓储
// ==========================================
// 表: autoclave_record(record_id PK, autoclave_id, record_date, doc_json, imported_at)
// 记录按釜次写入, 不参与批次统计
// ==========================================

use crate::domain::batch::{identifier_text, parse_date_text, DATE_FORMAT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_builder::SqlQueryBuilder;
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::instrument;

/// 记录主键: autoclave_{YYYYMMDD}_{序号}
pub fn record_id(process_date: NaiveDate, row_number: usize) -> String {
    format!("autoclave_{}_{:03}", process_date.format("%Y%m%d"), row_number)
}

pub struct AutoclaveRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AutoclaveRecordRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入蒸压釜记录（单事务, 同 record_id 覆盖）
    ///
    /// 记录必须带 `_id`, 否则整体回滚
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub fn insert_documents(&self, documents: &[Value]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO autoclave_record
                    (record_id, autoclave_id, record_date, doc_json, imported_at)
                VALUES (?1, ?2, ?3, ?4, datetime('now'))
                "#,
            )?;

            for doc in documents {
                let record_id = doc
                    .get("_id")
                    .and_then(Value::as_str)
                    .filter(|id| !id.trim().is_empty())
                    .ok_or_else(|| {
                        RepositoryError::ValidationError("蒸压釜记录缺少 _id".to_string())
                    })?;
                let autoclave_id = doc.get("autoclaveId").and_then(identifier_text);
                let record_date = doc
                    .get("date")
                    .and_then(Value::as_str)
                    .and_then(parse_date_text)
                    .map(|d| d.format(DATE_FORMAT).to_string());

                stmt.execute(params![
                    record_id,
                    autoclave_id,
                    record_date,
                    serde_json::to_string(doc)?,
                ])?;
                written += 1;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::debug!(written, "蒸压釜记录写入完成");
        Ok(written)
    }

    /// 按日期区间（闭区间）查询; 按日期升序, 同日按写入顺序
    #[instrument(skip(self))]
    pub fn find(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<Value>> {
        let builder = SqlQueryBuilder::new("SELECT doc_json FROM autoclave_record")
            .and_if_some("record_date >= ?", start_date.map(|d| d.format(DATE_FORMAT)))
            .and_if_some("record_date <= ?", end_date.map(|d| d.format(DATE_FORMAT)))
            .order_by("record_date ASC, rowid ASC");

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&builder.build())?;
        let rows = stmt.query_map(params_from_iter(builder.params().iter()), |row| {
            row.get::<_, String>(0)
        })?;

        let mut records = Vec::new();
        for raw in rows {
            records.push(serde_json::from_str(&raw?)?);
        }
        Ok(records)
    }

    pub fn count(&self) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let n: i64 =
            conn.query_row("SELECT COUNT(*) FROM autoclave_record", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }
}
