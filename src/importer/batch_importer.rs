// ==========================================
// 加气混凝土质量分析 - 日报导入器
// ==========================================
// 流程: 读取日报 → 按 (Batch No., Mould No.) 连接各工序表
//       → 构建批次文档 → 单事务写入仓储
//       → 蒸压釜工作表逐行构建记录 → 写入蒸压釜仓储
// 红线: 配料表驱动批次列表; 其余工序缺行时对应工序省略
// ==========================================

use crate::importer::document_builder::{join_key, DocumentBuilder, StepRows, BATCH_NO_COLUMN};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{PlantReport, RawRow, BATCHING_SHEET};
use crate::repository::autoclave_repo::AutoclaveRecordRepository;
use crate::repository::batch_repo::BatchRecordRepository;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

// ==========================================
// ImportSummary - 导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub import_id: String,
    pub rows_read: usize,
    pub documents_written: usize,
    pub skipped_rows: usize,
    pub autoclave_records_written: usize,
}

/// (Batch No., Mould No.) → 首个匹配行
fn index_rows(rows: &[RawRow]) -> HashMap<(String, String), &RawRow> {
    let mut index = HashMap::new();
    for row in rows {
        if let Some(key) = join_key(row) {
            index.entry(key).or_insert(row);
        }
    }
    index
}

// ==========================================
// PlantReportImporter - 日报导入器
// ==========================================
pub struct PlantReportImporter {
    repo: Arc<BatchRecordRepository>,
    autoclave_repo: Option<Arc<AutoclaveRecordRepository>>,
    created_by: Option<String>,
}

impl PlantReportImporter {
    pub fn new(repo: Arc<BatchRecordRepository>) -> Self {
        Self {
            repo,
            autoclave_repo: None,
            created_by: None,
        }
    }

    /// 未设置时蒸压釜工作表不写入
    pub fn with_autoclave_repo(mut self, autoclave_repo: Arc<AutoclaveRecordRepository>) -> Self {
        self.autoclave_repo = Some(autoclave_repo);
        self
    }

    pub fn with_created_by(mut self, created_by: &str) -> Self {
        self.created_by = Some(created_by.to_string());
        self
    }

    /// 导入日报文件
    ///
    /// # 参数
    /// - file_path: .xlsx/.xls/.csv
    /// - process_date: 写入每个批次文档的生产日期
    #[instrument(skip(self, file_path), fields(path = %file_path.as_ref().display()))]
    pub fn import_file<P: AsRef<Path>>(
        &self,
        file_path: P,
        process_date: NaiveDate,
    ) -> ImportResult<ImportSummary> {
        let report = PlantReport::read(file_path.as_ref())?;
        self.import_report(&report, process_date)
    }

    /// 导入已解析的日报
    pub fn import_report(
        &self,
        report: &PlantReport,
        process_date: NaiveDate,
    ) -> ImportResult<ImportSummary> {
        let import_id = Uuid::new_v4().to_string();

        if !report.batching.is_empty()
            && !report.batching.iter().any(|row| row.contains_key(BATCH_NO_COLUMN))
        {
            return Err(ImportError::MissingColumn {
                sheet: BATCHING_SHEET.to_string(),
                column: BATCH_NO_COLUMN.to_string(),
            });
        }

        let mut builder = DocumentBuilder::new(process_date);
        if let Some(created_by) = &self.created_by {
            builder = builder.with_created_by(created_by);
        }

        let ferry_carts = index_rows(&report.ferry_carts);
        let tilting_crane = index_rows(&report.tilting_crane);
        let cutting = index_rows(&report.cutting);
        let segregation = index_rows(&report.segregation);

        let mut documents = Vec::with_capacity(report.batching.len());
        let mut skipped_rows = 0;
        for row in &report.batching {
            let Some(key) = join_key(row) else {
                skipped_rows += 1;
                continue;
            };

            let steps = StepRows {
                ferry_cart: ferry_carts.get(&key).copied(),
                tilting_crane: tilting_crane.get(&key).copied(),
                cutting: cutting.get(&key).copied(),
                segregation: segregation.get(&key).copied(),
            };
            match builder.build(row, steps) {
                Some(doc) => documents.push(doc),
                None => skipped_rows += 1,
            }
        }

        let documents_written = self.repo.insert_documents(&documents)?;
        let autoclave_records_written = self.import_autoclave(report, &builder)?;

        tracing::info!(
            import_id = %import_id,
            rows_read = report.batching.len(),
            documents_written,
            skipped_rows,
            autoclave_records_written,
            "日报导入完成"
        );

        Ok(ImportSummary {
            import_id,
            rows_read: report.batching.len(),
            documents_written,
            skipped_rows,
            autoclave_records_written,
        })
    }

    fn import_autoclave(&self, report: &PlantReport, builder: &DocumentBuilder) -> ImportResult<usize> {
        if report.autoclave.is_empty() {
            return Ok(0);
        }
        let Some(autoclave_repo) = &self.autoclave_repo else {
            tracing::debug!(rows = report.autoclave.len(), "未配置蒸压釜仓储, 跳过蒸压釜记录");
            return Ok(0);
        };

        let records: Vec<_> = report
            .autoclave
            .iter()
            .enumerate()
            .map(|(idx, row)| builder.build_autoclave(idx + 1, row))
            .collect();
        Ok(autoclave_repo.insert_documents(&records)?)
    }
}
