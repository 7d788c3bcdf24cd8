// ==========================================
// 加气混凝土质量分析 - 质量分析 API
// ==========================================
// 职责: 请求参数校验 → 仓储过滤查询 → 引擎计算 → NoData 映射为 NotFound
// 红线: 参数校验先于查询; 引擎只看到已过滤的批次序列
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::AnalysisConfig;
use crate::domain::report::{
    BatchQualityStats, MouldPerformanceRow, RejectionTrendRow, SegregationReport,
};
use crate::domain::types::Granularity;
use crate::engine::error::{AnalysisOutcome, AnalysisResult};
use crate::engine::period::{parse_granularity, parse_query_date};
use crate::engine::report_assembler::ReportAssembler;
use crate::engine::segregation::SegregationAnalyzer;
use crate::repository::batch_repo::{BatchQuery, BatchRecordRepository};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::instrument;

fn optional_date(param: &str, value: Option<&str>) -> AnalysisResult<Option<NaiveDate>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_query_date(param, v))
        .transpose()
}

fn require_data<T>(outcome: AnalysisOutcome<T>) -> ApiResult<T> {
    outcome.into_option().ok_or_else(ApiError::no_batches)
}

// ==========================================
// AnalysisApi - 质量分析 API
// ==========================================
pub struct AnalysisApi {
    batch_repo: Arc<BatchRecordRepository>,
    assembler: ReportAssembler,
    default_group_by: Granularity,
}

impl AnalysisApi {
    pub fn new(batch_repo: Arc<BatchRecordRepository>) -> Self {
        Self::with_config(batch_repo, AnalysisConfig::default())
    }

    pub fn with_config(batch_repo: Arc<BatchRecordRepository>, config: AnalysisConfig) -> Self {
        let analyzer =
            SegregationAnalyzer::with_limits(config.top_mould_limit, config.worst_batch_limit);
        Self {
            batch_repo,
            assembler: ReportAssembler::with_segregation_analyzer(analyzer),
            default_group_by: config.default_group_by,
        }
    }

    fn build_query(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
        mould_id: Option<&str>,
    ) -> ApiResult<BatchQuery> {
        let start = optional_date("start_date", start_date)?;
        let end = optional_date("end_date", end_date)?;
        Ok(BatchQuery::between(start, end).with_mould(mould_id.map(str::to_string)))
    }

    /// 批次质量汇总
    #[instrument(skip(self))]
    pub fn get_batch_quality(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
        mould_id: Option<&str>,
    ) -> ApiResult<BatchQualityStats> {
        let query = self.build_query(start_date, end_date, mould_id)?;
        let batches = self.batch_repo.find(&query)?;
        require_data(self.assembler.batch_quality(&batches))
    }

    /// 剔除趋势; group_by 缺省时取配置默认粒度
    #[instrument(skip(self))]
    pub fn get_rejection_trends(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
        group_by: Option<&str>,
    ) -> ApiResult<Vec<RejectionTrendRow>> {
        let granularity = match group_by {
            None => self.default_group_by,
            Some(_) => parse_granularity(group_by)?,
        };
        let query = self.build_query(start_date, end_date, None)?;
        let batches = self.batch_repo.find(&query)?;
        require_data(self.assembler.rejection_trends(&batches, granularity))
    }

    /// 模具表现
    #[instrument(skip(self))]
    pub fn get_mould_performance(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> ApiResult<Vec<MouldPerformanceRow>> {
        let query = self.build_query(start_date, end_date, None)?;
        let batches = self.batch_repo.find(&query)?;
        require_data(self.assembler.mould_performance(&batches))
    }

    /// 分拣缺陷分析
    #[instrument(skip(self))]
    pub fn get_segregation_analysis(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
        mould_id: Option<&str>,
    ) -> ApiResult<SegregationReport> {
        let query = self.build_query(start_date, end_date, mould_id)?;
        let batches = self.batch_repo.find(&query)?;
        require_data(self.assembler.segregation_analysis(&batches))
    }
}
