// ==========================================
// 加气混凝土质量分析 - 批次文档仓储
// ==========================================
// 红线: Repository 不含统计逻辑, 只负责存取与过滤下推
// ==========================================
// 表: batch_record(doc_id PK, batch_id, mould_id, batch_date, doc_json, imported_at)
// batch_date 为 'YYYY-MM-DD' 文本, 字典序即日期序
// ==========================================

use crate::domain::batch::{BatchRecord, DATE_FORMAT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_builder::SqlQueryBuilder;
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::instrument;

// ==========================================
// BatchQuery - 查询条件
// ==========================================
/// 日期两端均为闭区间; mould_id 为精确匹配
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub mould_id: Option<String>,
}

impl BatchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn between(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
            mould_id: None,
        }
    }

    pub fn with_mould(mut self, mould_id: Option<String>) -> Self {
        self.mould_id = mould_id.filter(|m| !m.trim().is_empty());
        self
    }
}

/// 文档主键: batch_{batchId}_{YYYYMMDD}
///
/// 无日期的文档以 `nodate` 代替日期段
pub fn document_id(batch_id: &str, date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => format!("batch_{}_{}", batch_id, d.format("%Y%m%d")),
        None => format!("batch_{}_nodate", batch_id),
    }
}

// ==========================================
// BatchRecordRepository - 批次文档仓储
// ==========================================
pub struct BatchRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BatchRecordRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 按路径打开（统一 PRAGMA）并建表
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        crate::db::init_schema(&conn)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入批次文档（单事务, 同 doc_id 覆盖）
    ///
    /// # 返回
    /// - Ok(usize): 写入的文档数
    /// - Err: 文档缺少 batchId 或数据库错误（事务整体回滚）
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
                INSERT OR REPLACE INTO batch_record
                    (doc_id, batch_id, mould_id, batch_date, doc_json, imported_at)
                VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
                "#,
            )?;

            for doc in documents {
                let record = BatchRecord::new(doc.clone());
                let batch_id = record.batch_id().ok_or_else(|| {
                    RepositoryError::ValidationError("批次文档缺少 batchId".to_string())
                })?;
                let date = record.date();
                let doc_id = match doc.get("_id").and_then(Value::as_str) {
                    Some(id) if !id.trim().is_empty() => id.to_string(),
                    _ => document_id(&batch_id, date),
                };

                stmt.execute(params![
                    doc_id,
                    batch_id,
                    record.mould_id(),
                    date.map(|d| d.format(DATE_FORMAT).to_string()),
                    serde_json::to_string(doc)?,
                ])?;
                written += 1;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::debug!(written, "批次文档写入完成");
        Ok(written)
    }

    /// 按条件查询批次; 按日期升序, 同日按写入顺序
    ///
    /// 指定日期范围时, 无日期的文档不会返回
    #[instrument(skip(self))]
    pub fn find(&self, query: &BatchQuery) -> RepositoryResult<Vec<BatchRecord>> {
        let builder = SqlQueryBuilder::new("SELECT doc_json FROM batch_record")
            .and_if_some(
                "batch_date >= ?",
                query.start_date.map(|d| d.format(DATE_FORMAT)),
            )
            .and_if_some(
                "batch_date <= ?",
                query.end_date.map(|d| d.format(DATE_FORMAT)),
            )
            .and_if_some("mould_id = ?", query.mould_id.as_deref())
            .order_by("batch_date ASC, rowid ASC");

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&builder.build())?;
        let rows = stmt.query_map(params_from_iter(builder.params().iter()), |row| {
            row.get::<_, String>(0)
        })?;

        let mut batches = Vec::new();
        for raw in rows {
            let doc: Value = serde_json::from_str(&raw?)?;
            batches.push(BatchRecord::new(doc));
        }

        tracing::debug!(found = batches.len(), "批次查询完成");
        Ok(batches)
    }

    pub fn count(&self) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM batch_record", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }
}
